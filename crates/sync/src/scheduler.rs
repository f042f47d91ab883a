use kagami_core::config::SyncConfig;
use kagami_core::sync::port::{FrameCallback, FrameScheduler};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

type FrameQueue = Arc<Mutex<Vec<FrameCallback>>>;

// 取出当前排队的回调并依次执行；执行期间新请求的回调留到下一帧
fn run_queue(queue: &FrameQueue) -> usize {
    let callbacks = std::mem::take(&mut *queue.lock().unwrap_or_else(PoisonError::into_inner));
    let count = callbacks.len();
    for callback in callbacks {
        callback();
    }
    count
}

/// # Summary
/// 手动驱动的帧调度器，由调用方显式推进帧。
///
/// # Invariants
/// - `run_frame` 只执行调用前已排队的回调。
/// - 帧计数单调递增。
#[derive(Default)]
pub struct ManualFrameScheduler {
    queue: FrameQueue,
    frames: AtomicU64,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Summary
    /// 推进一帧。
    ///
    /// # Returns
    /// 本帧执行的回调数量。
    pub fn run_frame(&self) -> usize {
        self.frames.fetch_add(1, Ordering::SeqCst);
        run_queue(&self.queue)
    }

    /// 已推进的帧数。
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    /// 等待下一帧的回调数量。
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }
}

/// # Summary
/// 基于 tokio 定时器的帧调度器，以固定间隔刷新回调队列。
///
/// # Invariants
/// - 必须在 tokio 运行时内创建。
/// - 落后的 tick 直接跳过，不做补帧。
/// - 实例销毁时停止后台任务，未执行的回调被丢弃。
pub struct IntervalFrameScheduler {
    queue: FrameQueue,
    task: JoinHandle<()>,
}

impl IntervalFrameScheduler {
    /// # Summary
    /// 启动后台帧循环。
    ///
    /// # Arguments
    /// * `period`: 帧间隔，0 按 1ms 处理。
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let queue: FrameQueue = Arc::default();
        let task_queue = queue.clone();
        let task = tokio::spawn(async move {
            info!("Frame loop started, period {period:?}");
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let count = run_queue(&task_queue);
                if count > 0 {
                    debug!("Frame ran {count} callbacks");
                }
            }
        });
        Self { queue, task }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(Duration::from_millis(config.frame_interval_ms))
    }
}

impl FrameScheduler for IntervalFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }
}

impl Drop for IntervalFrameScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}
