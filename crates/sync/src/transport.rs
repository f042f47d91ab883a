use kagami_core::sync::entity::{SubscriptionId, SyncEnvelope};
use kagami_core::sync::error::SyncError;
use kagami_core::sync::port::{SyncTransport, TransportListener};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// # Summary
/// 进程内的跨上下文同步通道，消息以 JSON 文本经 tokio broadcast 分发。
///
/// # Invariants
/// - 每个订阅对应一个后台任务，退订或实例销毁时任务被中止。
/// - 发布方自身的订阅同样会收到消息，由接收方按 origin 过滤。
/// - 无法解析的消息只记录告警并跳过。
pub struct BroadcastTransport {
    sender: broadcast::Sender<String>,
    tasks: Mutex<HashMap<u64, JoinHandle<()>>>,
    next_subscription: AtomicU64,
}

impl BroadcastTransport {
    /// # Summary
    /// 创建通道。
    ///
    /// # Arguments
    /// * `capacity`: 每个订阅方可积压的消息数，超出后最旧的消息被丢弃。
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            tasks: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// 直接投递原始文本，绕过编码。
    pub fn publish_raw(&self, text: impl Into<String>) {
        if self.sender.send(text.into()).is_err() {
            debug!("No transport subscribers, message dropped");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for BroadcastTransport {
    fn default() -> Self {
        Self::new(256)
    }
}

impl SyncTransport for BroadcastTransport {
    fn publish(&self, envelope: &SyncEnvelope) -> Result<(), SyncError> {
        let text = serde_json::to_string(envelope).map_err(|e| SyncError::Codec(e.to_string()))?;
        self.publish_raw(text);
        Ok(())
    }

    /// # Summary
    /// 订阅消息。
    ///
    /// # Logic
    /// 1. 创建新的 broadcast 接收端，只接收订阅之后发布的消息。
    /// 2. 启动后台任务循环接收、解码并回调；积压溢出时记录丢失条数后继续。
    ///
    /// # Returns
    /// 订阅句柄。必须在 tokio 运行时内调用。
    fn subscribe(&self, listener: TransportListener) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        let mut receiver = self.sender.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(text) => match serde_json::from_str::<SyncEnvelope>(&text) {
                        Ok(envelope) => listener(envelope),
                        Err(e) => warn!("Dropping malformed sync message: {e}"),
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Transport subscriber {id} lagged, {skipped} messages lost");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, task);
        SubscriptionId(id)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        if let Some(task) = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&subscription.0)
        {
            task.abort();
        }
    }
}

impl Drop for BroadcastTransport {
    fn drop(&mut self) {
        for (_, task) in self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
        {
            task.abort();
        }
    }
}
