use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use kagami_core::config::SyncConfig;
use kagami_core::sync::entity::{
    ChartEvent, ChartId, EventKind, GroupId, SubscriptionId, SyncEnvelope,
};
use kagami_core::sync::error::SyncError;
use kagami_core::sync::port::{ChartHandle, FrameScheduler, SyncTransport};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

// 同一帧内多个种类的应用顺序：先范围后光标，光标落在新范围上
const FLUSH_ORDER: [EventKind; 2] = [EventKind::VisibleRange, EventKind::Crosshair];

/// 已注册图表的登记信息。
struct Registration {
    group: GroupId,
    handle: Arc<dyn ChartHandle>,
    // 引擎正在向该图表应用外部更新
    applying: Arc<AtomicBool>,
    subscription: SubscriptionId,
}

/// 某一种类在当前帧内最后收到的事件。
struct Pending {
    // None 表示来自跨上下文通道
    source: Option<ChartId>,
    event: ChartEvent,
}

#[derive(Default)]
struct GroupState {
    pending: HashMap<EventKind, Pending>,
    // 是否已向调度器请求过帧
    scheduled: bool,
}

struct SyncShared {
    origin: String,
    enabled: AtomicBool,
    charts: DashMap<ChartId, Registration>,
    groups: Mutex<HashMap<GroupId, GroupState>>,
    scheduler: Arc<dyn FrameScheduler>,
    transport: Option<Arc<dyn SyncTransport>>,
    transport_subscription: Mutex<Option<SubscriptionId>>,
}

/// # Summary
/// 跨图表同步引擎。
///
/// # Invariants
/// - 同组内任意图表的指针移动或可见范围变化，会在下一帧传播到同组其余图表。
/// - 每组每种事件每帧至多传播一次，且传播的是该帧内最后收到的事件。
/// - 事件不会回传给源图表；引擎应用更新时目标图表回抛的事件被丢弃。
/// - 单个目标应用失败只记录告警，其余目标照常同步。
/// - 引擎销毁时退订所有图表，已排队的帧回调变为空操作。
pub struct SyncEngine {
    shared: Arc<SyncShared>,
}

impl SyncEngine {
    /// # Summary
    /// 创建不带跨上下文通道的引擎。
    ///
    /// # Arguments
    /// * `scheduler`: 显示帧调度器。
    pub fn new(scheduler: Arc<dyn FrameScheduler>) -> Self {
        Self::build(scheduler, None)
    }

    /// # Summary
    /// 创建挂接跨上下文通道的引擎。
    ///
    /// # Logic
    /// 1. 生成本实例的 origin ID。
    /// 2. 订阅通道：丢弃 origin 等于自身的消息，其余消息作为无源事件进入本地合并队列。
    /// 3. 本地图表产生的事件在帧内应用后再发布到通道；来自通道的事件不再转发。
    ///
    /// # Arguments
    /// * `scheduler`: 显示帧调度器。
    /// * `transport`: 跨上下文广播通道。
    pub fn with_transport(
        scheduler: Arc<dyn FrameScheduler>,
        transport: Arc<dyn SyncTransport>,
    ) -> Self {
        Self::build(scheduler, Some(transport))
    }

    /// 按配置创建引擎，`enabled` 决定初始开关状态。
    pub fn from_config(config: &SyncConfig, scheduler: Arc<dyn FrameScheduler>) -> Self {
        let engine = Self::new(scheduler);
        engine.set_enabled(config.enabled);
        engine
    }

    fn build(scheduler: Arc<dyn FrameScheduler>, transport: Option<Arc<dyn SyncTransport>>) -> Self {
        let shared = Arc::new(SyncShared {
            origin: Uuid::new_v4().to_string(),
            enabled: AtomicBool::new(true),
            charts: DashMap::new(),
            groups: Mutex::new(HashMap::new()),
            scheduler,
            transport,
            transport_subscription: Mutex::new(None),
        });

        if let Some(transport) = &shared.transport {
            let weak = Arc::downgrade(&shared);
            let subscription = transport.subscribe(Arc::new(move |envelope: SyncEnvelope| {
                if let Some(shared) = weak.upgrade() {
                    shared.receive_remote(envelope);
                }
            }));
            *shared
                .transport_subscription
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(subscription);
            info!("Sync engine {} attached to transport", shared.origin);
        }

        Self { shared }
    }

    /// 本实例在跨上下文通道中的 origin ID。
    pub fn origin(&self) -> &str {
        &self.shared.origin
    }

    /// # Summary
    /// 将图表登记到同步组。
    ///
    /// # Logic
    /// 1. 检查 ID 未被占用。
    /// 2. 订阅图表事件；监听器先检查"应用中"标记以过滤回声，再把事件送入组的合并队列。
    /// 3. 保存登记信息。
    ///
    /// # Arguments
    /// * `handle`: 宿主图表句柄。
    /// * `id`: 图表 ID，引擎内唯一。
    /// * `group`: 同步组。
    ///
    /// # Returns
    /// ID 已存在时返回 `SyncError::AlreadyRegistered`。
    pub fn add_chart(
        &self,
        handle: Arc<dyn ChartHandle>,
        id: ChartId,
        group: GroupId,
    ) -> Result<(), SyncError> {
        match self.shared.charts.entry(id.clone()) {
            Entry::Occupied(_) => Err(SyncError::AlreadyRegistered(id)),
            Entry::Vacant(slot) => {
                let applying = Arc::new(AtomicBool::new(false));
                let weak = Arc::downgrade(&self.shared);
                let listener = {
                    let applying = applying.clone();
                    let id = id.clone();
                    Arc::new(move |event: ChartEvent| {
                        if applying.load(Ordering::SeqCst) {
                            trace!("Dropping echo from chart {id}");
                            return;
                        }
                        if let Some(shared) = weak.upgrade() {
                            shared.receive(Some(id.clone()), group, event);
                        }
                    })
                };
                let subscription = handle.subscribe(listener);
                slot.insert(Registration {
                    group,
                    handle,
                    applying,
                    subscription,
                });
                info!("Chart {id} joined sync group {group}");
                Ok(())
            }
        }
    }

    /// # Summary
    /// 注销图表。
    ///
    /// # Logic
    /// 1. 移除登记信息并退订。
    /// 2. 已排队的帧在应用前会重新确认目标仍处于登记状态，因此不会再触达该图表。
    /// 3. 组内已无图表且无排队帧时清理组状态。
    ///
    /// # Returns
    /// 未登记时返回 `SyncError::ChartNotFound`。
    pub fn remove_chart(&self, id: &ChartId) -> Result<(), SyncError> {
        let (_, registration) = self
            .shared
            .charts
            .remove(id)
            .ok_or_else(|| SyncError::ChartNotFound(id.clone()))?;
        registration.handle.unsubscribe(registration.subscription);

        let group = registration.group;
        if !self.shared.charts.iter().any(|e| e.group == group) {
            let mut groups = self.shared.lock_groups();
            if groups.get(&group).is_some_and(|s| !s.scheduled) {
                groups.remove(&group);
            }
        }
        info!("Chart {id} left sync group {group}");
        Ok(())
    }

    /// 打开或关闭同步。关闭期间收到的事件以及尚未刷新的事件都被丢弃。
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::SeqCst);
        info!("Sync engine {} enabled = {enabled}", self.shared.origin);
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    /// 组内已登记的图表，按 ID 排序。
    pub fn charts_in_group(&self, group: GroupId) -> Vec<ChartId> {
        let mut ids: Vec<ChartId> = self
            .shared
            .charts
            .iter()
            .filter(|e| e.group == group)
            .map(|e| e.key().clone())
            .collect();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids
    }

    pub fn group_of(&self, id: &ChartId) -> Option<GroupId> {
        self.shared.charts.get(id).map(|e| e.group)
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        let ids: Vec<ChartId> = self.shared.charts.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            if let Some((_, registration)) = self.shared.charts.remove(&id) {
                registration.handle.unsubscribe(registration.subscription);
            }
        }
        if let Some(transport) = &self.shared.transport
            && let Some(subscription) = self
                .shared
                .transport_subscription
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
        {
            transport.unsubscribe(subscription);
        }
        debug!("Sync engine {} disposed", self.shared.origin);
    }
}

impl SyncShared {
    fn lock_groups(&self) -> std::sync::MutexGuard<'_, HashMap<GroupId, GroupState>> {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn receive_remote(self: &Arc<Self>, envelope: SyncEnvelope) {
        if envelope.origin == self.origin {
            return;
        }
        trace!("Remote event from {} for group {}", envelope.origin, envelope.group);
        self.receive(None, envelope.group, envelope.event);
    }

    /// # Summary
    /// 把事件放入组的合并队列。
    ///
    /// # Logic
    /// 1. 同步关闭时直接丢弃。
    /// 2. 覆盖该组同种类的待发事件，只保留最新一个。
    /// 3. 该组尚未请求帧时请求一次；帧回调只持有弱引用。
    fn receive(self: &Arc<Self>, source: Option<ChartId>, group: GroupId, event: ChartEvent) {
        if !self.enabled.load(Ordering::SeqCst) {
            return;
        }
        let schedule = {
            let mut groups = self.lock_groups();
            let state = groups.entry(group).or_default();
            state.pending.insert(event.kind(), Pending { source, event });
            !std::mem::replace(&mut state.scheduled, true)
        };
        if schedule {
            let weak: Weak<SyncShared> = Arc::downgrade(self);
            self.scheduler.request_frame(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.flush(group);
                }
            }));
        }
    }

    /// # Summary
    /// 帧回调：把组内各种类的最新事件应用到同组其余图表。
    ///
    /// # Logic
    /// 1. 取出并清空待发事件，复位帧请求标记。
    /// 2. 先复制出目标列表再逐个应用，应用期间不持有任何注册表锁。
    /// 3. 对每个目标：跳过源图表；确认仍已登记；置"应用中"标记后应用，再清除标记。
    /// 4. 本地事件应用完后发布到跨上下文通道。
    fn flush(&self, group: GroupId) {
        let mut pending = {
            let mut groups = self.lock_groups();
            let Some(state) = groups.get_mut(&group) else {
                return;
            };
            state.scheduled = false;
            std::mem::take(&mut state.pending)
        };
        if !self.enabled.load(Ordering::SeqCst) {
            return;
        }

        let targets: Vec<(ChartId, Arc<dyn ChartHandle>, Arc<AtomicBool>)> = self
            .charts
            .iter()
            .filter(|e| e.group == group)
            .map(|e| (e.key().clone(), e.handle.clone(), e.applying.clone()))
            .collect();

        for kind in FLUSH_ORDER {
            let Some(Pending { source, event }) = pending.remove(&kind) else {
                continue;
            };
            for (id, handle, applying) in &targets {
                if source.as_ref() == Some(id) {
                    continue;
                }
                if !self.charts.contains_key(id) {
                    debug!("Chart {id} was removed before frame, skipping");
                    continue;
                }
                applying.store(true, Ordering::SeqCst);
                let result = apply(handle.as_ref(), event);
                applying.store(false, Ordering::SeqCst);
                if let Err(e) = result {
                    warn!("Failed to sync {kind:?} to chart {id}: {e}");
                }
            }
            if source.is_some() {
                self.publish(group, event);
            }
        }
    }

    fn publish(&self, group: GroupId, event: ChartEvent) {
        let Some(transport) = &self.transport else {
            return;
        };
        let envelope = SyncEnvelope {
            origin: self.origin.clone(),
            group,
            event,
        };
        if let Err(e) = transport.publish(&envelope) {
            warn!("Failed to publish sync event for group {group}: {e}");
        }
    }
}

fn apply(handle: &dyn ChartHandle, event: ChartEvent) -> Result<(), SyncError> {
    match event {
        ChartEvent::CrosshairMove(position) if position.time.is_some() => {
            handle.apply_crosshair(position)
        }
        ChartEvent::CrosshairMove(_) => handle.clear_crosshair(),
        ChartEvent::VisibleRangeChange(range) => handle.apply_visible_range(range),
    }
}
