use std::sync::Arc;

use bytes::Bytes;
use leasehold_error::{
    bail, GenericError, LeaseResult, StackError, StatusCode, SubscriptionError, TaskError,
    ValidationError,
};
use parking_lot::Mutex;
use tokio::{
    sync::{broadcast, watch},
    task::{JoinHandle, JoinSet},
};
use tracing::{debug, error, info, trace, warn};

use super::{AcquisitionMetrics, EngineConfig, EngineEvent, MetricsSnapshot};
use crate::{
    broker::{BrokerClient, BrokerGateway, CreateSubscriptionRequest},
    clock::{Clock, SystemClock},
    codec::{MsgPackCodec, PayloadCodec, Value},
    registry::SubscriptionRegistry,
    subscription::{
        HandlerError, HandlerResult, LeaseOutcome, Reclaimed, Subscription, SubscriptionMode,
        SubscriptionSpec, TaskHandler,
    },
    task::{LockedTask, SubscriptionId, Task},
};

/// Итог одного цикла захвата.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Push-подписки, обойдённые в цикле
    pub subscriptions_visited: usize,
    /// Задачи, переданные обработчикам
    pub dispatched: usize,
    pub discarded: usize,
    pub transient_failures: usize,
    pub reclaimed: usize,
}

/// Отчёт по задаче, уже закодированный для брокера.
enum Report {
    Complete(Option<Bytes>),
    Fail(String),
}

impl Report {
    fn action(&self) -> &'static str {
        match self {
            Self::Complete(_) => "complete",
            Self::Fail(_) => "fail",
        }
    }
}

/// Движок захвата задач.
///
/// Открывает и закрывает подписки, ведёт их кредиты и аренды, в фоне
/// забирает задачи для push-подписок и по запросу для pull-подписок.
/// Клонирование дешёвое: все клоны разделяют одно состояние.
#[derive(Clone)]
pub struct AcquisitionEngine {
    shared: Arc<EngineShared>,
}

struct EngineShared {
    broker: BrokerClient,
    registry: SubscriptionRegistry,
    codec: Arc<dyn PayloadCodec>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    metrics: AcquisitionMetrics,
    events: broadcast::Sender<EngineEvent>,
    /// Запущенные обработчики push-задач
    handlers: Mutex<JoinSet<()>>,
    shutdown: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl AcquisitionEngine {
    /// Движок с MessagePack-кодеком и системными часами.
    pub fn new(
        gateway: Arc<dyn BrokerGateway>,
        config: EngineConfig,
    ) -> Self {
        Self::with_components(
            gateway,
            Arc::new(MsgPackCodec),
            Arc::new(SystemClock),
            config,
        )
    }

    pub fn with_components(
        gateway: Arc<dyn BrokerGateway>,
        codec: Arc<dyn PayloadCodec>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        let (shutdown, _) = watch::channel(false);
        Self {
            shared: Arc::new(EngineShared {
                broker: BrokerClient::new(gateway, config.rpc_timeout),
                registry: SubscriptionRegistry::new(),
                codec,
                clock,
                config,
                metrics: AcquisitionMetrics::new(),
                events,
                handlers: Mutex::new(JoinSet::new()),
                shutdown,
                worker: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.shared.registry
    }

    /// Открытая подписка по id.
    pub fn subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> LeaseResult<Arc<Subscription>> {
        self.shared
            .registry
            .get(subscription_id)
            .ok_or_else(|| SubscriptionError::UnknownSubscription { subscription_id }.into())
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.shared.clock
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Поток событий движка. Получатель видит только события после
    /// подписки.
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.shared.events.subscribe()
    }

    /// Запущен ли фоновый цикл.
    pub fn is_running(&self) -> bool {
        self.shared
            .worker
            .lock()
            .as_ref()
            .is_some_and(|w| !w.is_finished())
    }

    fn emit(
        &self,
        event: EngineEvent,
    ) {
        // Нет получателей: не ошибка.
        let _ = self.shared.events.send(event);
    }

    ////////////////////////////////////////////////////////////////////////////
    // Жизненный цикл подписок
    ////////////////////////////////////////////////////////////////////////////

    /// Открывает подписку у брокера и регистрирует её.
    ///
    /// В реестр попадает только подписка, чей RPC открытия прошёл. Ошибка
    /// RPC возвращается как [`SubscriptionError::OpenFailed`] с исходной
    /// причиной.
    pub async fn open_subscription(
        &self,
        spec: SubscriptionSpec,
        handler: Option<Arc<dyn TaskHandler>>,
    ) -> LeaseResult<Arc<Subscription>> {
        if spec.mode() == SubscriptionMode::Push && handler.is_none() {
            bail!(ValidationError::MissingTaskHandler);
        }
        let handler = match spec.mode() {
            SubscriptionMode::Push => handler,
            SubscriptionMode::Pull => None,
        };

        let subscription = Subscription::new(spec, handler);
        let request = CreateSubscriptionRequest::from(subscription.spec());

        let created = match self.shared.broker.create_subscription(&request).await {
            Ok(created) => created,
            Err(cause) => {
                warn!(
                    task_type = %request.task_type,
                    error = %cause,
                    "Failed to open subscription"
                );
                return Err(SubscriptionError::OpenFailed {
                    task_type: request.task_type,
                    cause,
                }
                .into());
            }
        };

        if created.credits_granted != request.capacity {
            debug!(
                subscription_id = created.subscription_id,
                requested = request.capacity,
                granted = created.credits_granted,
                "Broker granted a different credit count; using requested capacity"
            );
        }

        subscription.mark_open(created.subscription_id);
        let subscription = Arc::new(subscription);
        self.shared.registry.add(subscription.clone());

        info!(
            subscription_id = created.subscription_id,
            task_type = %request.task_type,
            mode = ?subscription.mode(),
            capacity = request.capacity,
            lock_time_ms = request.lock_duration_ms,
            "Subscription opened"
        );
        self.emit(EngineEvent::SubscriptionOpened {
            subscription_id: created.subscription_id,
            task_type: request.task_type,
            mode: subscription.mode(),
        });

        Ok(subscription)
    }

    /// Закрывает подписку. Повторный вызов ничего не делает.
    ///
    /// Ошибка RPC закрытия только логируется: подписка снимается с учёта в
    /// любом случае. Задачи, которые уже у обработчиков, дорабатываются и
    /// отчитываются; пачки, пришедшие после закрытия, отбрасываются.
    pub async fn close_subscription(
        &self,
        subscription: &Subscription,
    ) {
        if !subscription.begin_close() {
            trace!(subscription_id = ?subscription.id(), "Subscription already closing");
            return;
        }
        let Some(subscription_id) = subscription.id() else {
            subscription.mark_closed();
            return;
        };

        if let Err(error) = self.shared.broker.close_subscription(subscription_id).await {
            warn!(subscription_id, error = %error, "Close RPC failed; dropping subscription locally");
            self.emit(EngineEvent::CloseFailed {
                subscription_id,
                error,
            });
        }

        subscription.mark_closed();
        self.shared.registry.remove(subscription);

        info!(
            subscription_id,
            leases = subscription.leases_outstanding(),
            "Subscription closed"
        );
        self.emit(EngineEvent::SubscriptionClosed { subscription_id });
    }

    ////////////////////////////////////////////////////////////////////////////
    // Push: фоновый цикл
    ////////////////////////////////////////////////////////////////////////////

    /// Один цикл захвата по всем push-подпискам.
    ///
    /// Для каждой открытой подписки с кредитами запрашивает до
    /// `credits_available` задач и раздаёт их обработчикам. Ошибка брокера
    /// не прерывает цикл: подписка ждёт следующего.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        AcquisitionMetrics::incr(&self.shared.metrics.cycles);

        self.reap_finished_handlers();

        for subscription in self.shared.registry.push_managed() {
            report.subscriptions_visited += 1;
            report.reclaimed += self.reclaim(&subscription);

            if !subscription.is_open() {
                continue;
            }
            let Some(subscription_id) = subscription.id() else {
                continue;
            };

            let _guard = subscription.lock_acquisition().await;
            let credits = subscription.credits_available();
            if credits == 0 {
                trace!(subscription_id, "No credits left, skipping");
                continue;
            }

            let tasks = match self
                .shared
                .broker
                .acquire_tasks(subscription_id, credits)
                .await
            {
                Ok(tasks) => tasks,
                Err(error) => {
                    report.transient_failures += 1;
                    self.record_transient(subscription_id, error);
                    continue;
                }
            };

            for task in self.lease_batch(&subscription, tasks, &mut report.discarded) {
                self.dispatch(subscription.clone(), task);
                report.dispatched += 1;
            }
        }

        report
    }

    /// Запускает фоновый цикл на текущем tokio runtime. Повторный вызов
    /// ничего не делает.
    pub fn start(&self) -> LeaseResult<()> {
        let mut worker = self.shared.worker.lock();
        if worker.as_ref().is_some_and(|w| !w.is_finished()) {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            GenericError::new(
                StatusCode::Internal,
                format!("acquisition loop needs a tokio runtime: {e}"),
            )
        })?;

        self.shared.shutdown.send_replace(false);
        let engine = self.clone();
        let shutdown = self.shared.shutdown.subscribe();
        *worker = Some(runtime.spawn(engine.run_loop(shutdown)));

        info!(
            interval_ms = self.shared.config.acquisition_interval.as_millis() as u64,
            "Acquisition loop started"
        );
        Ok(())
    }

    async fn run_loop(
        self,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let interval = self.shared.config.acquisition_interval;
        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.run_cycle().await;
            if report.dispatched > 0 {
                tokio::task::yield_now().await;
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("Acquisition loop stopped");
    }

    /// Останавливает фоновый цикл, дожидается обработчиков и закрывает
    /// все подписки.
    pub async fn shutdown(&self) {
        self.shared.shutdown.send_replace(true);

        let worker = self.shared.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(error = %e, "Acquisition loop terminated abnormally");
            }
        }

        self.drain_in_flight().await;

        for subscription in self.shared.registry.all() {
            self.close_subscription(&subscription).await;
        }
        info!("Acquisition engine shut down");
    }

    /// Ждёт завершения всех уже запущенных обработчиков.
    pub async fn drain_in_flight(&self) {
        loop {
            let mut handlers = std::mem::take(&mut *self.shared.handlers.lock());
            if handlers.is_empty() {
                break;
            }
            while let Some(joined) = handlers.join_next().await {
                if let Err(e) = joined {
                    error!(error = %e, "Task processing aborted");
                }
            }
        }
    }

    fn reap_finished_handlers(&self) {
        let mut handlers = self.shared.handlers.lock();
        while let Some(joined) = handlers.try_join_next() {
            if let Err(e) = joined {
                error!(error = %e, "Task processing aborted");
            }
        }
    }

    fn dispatch(
        &self,
        subscription: Arc<Subscription>,
        task: Task,
    ) {
        let engine = self.clone();
        self.shared
            .handlers
            .lock()
            .spawn(async move { engine.process(subscription, task).await });
    }

    /// Декодирует payload, вызывает обработчик и отчитывается брокеру.
    async fn process(
        &self,
        subscription: Arc<Subscription>,
        task: Task,
    ) {
        let locked = match self.decode(&task) {
            Ok(locked) => locked,
            Err(reason) => {
                let _ = self
                    .resolve(&subscription, &task, Report::Fail(reason))
                    .await;
                return;
            }
        };

        let Some(handler) = subscription.handler().cloned() else {
            error!(task_id = task.task_id, "Push subscription without handler");
            return;
        };

        let outcome = invoke(handler, locked).await;
        let _ = self.report_outcome(&subscription, &task, outcome).await;
    }

    ////////////////////////////////////////////////////////////////////////////
    // Pull: захват по запросу
    ////////////////////////////////////////////////////////////////////////////

    /// Забирает до `min(credits_available, max_tasks)` задач для
    /// pull-подписки.
    ///
    /// Ошибка брокера возвращается вызывающему. Задачи остаются в аренде,
    /// пока вызывающий не вызовет [`complete`](Self::complete) или
    /// [`fail`](Self::fail) либо пока не истечёт блокировка.
    pub async fn poll(
        &self,
        subscription: &Subscription,
        max_tasks: Option<u32>,
    ) -> LeaseResult<Vec<LockedTask>> {
        if subscription.mode() != SubscriptionMode::Pull {
            bail!(
                StatusCode::InvalidArgs,
                "poll is only available on pollable subscriptions"
            );
        }
        let subscription_id = self.require_open(subscription)?;

        self.reclaim(subscription);

        let _guard = subscription.lock_acquisition().await;
        let credits = subscription
            .credits_available()
            .min(max_tasks.unwrap_or(u32::MAX));
        if credits == 0 {
            return Ok(Vec::new());
        }

        let tasks = match self
            .shared
            .broker
            .acquire_tasks(subscription_id, credits)
            .await
        {
            Ok(tasks) => tasks,
            Err(error) => {
                self.record_transient(subscription_id, error.clone());
                return Err(error);
            }
        };

        let mut discarded = 0;
        let mut locked = Vec::new();
        for task in self.lease_batch(subscription, tasks, &mut discarded) {
            match self.decode(&task) {
                Ok(decoded) => locked.push(decoded),
                Err(reason) => {
                    let _ = self.resolve(subscription, &task, Report::Fail(reason)).await;
                }
            }
        }
        Ok(locked)
    }

    /// `poll()` с обработчиком: каждая задача обрабатывается и сразу
    /// отчитывается. Возвращает количество обработанных задач.
    pub async fn poll_with(
        &self,
        subscription: &Subscription,
        handler: Arc<dyn TaskHandler>,
    ) -> LeaseResult<usize> {
        let tasks = self.poll(subscription, None).await?;
        let handled = tasks.len();

        for locked in tasks {
            let task = locked.task().clone();
            let outcome = invoke(handler.clone(), locked).await;
            let _ = self.report_outcome(subscription, &task, outcome).await;
        }
        Ok(handled)
    }

    /// Завершает задачу pull-подписки.
    pub async fn complete(
        &self,
        subscription: &Subscription,
        task: &LockedTask,
        payload: Option<Value>,
    ) -> LeaseResult<()> {
        let payload = payload
            .map(|value| self.shared.codec.encode(&value))
            .transpose()?;
        self.resolve(subscription, task.task(), Report::Complete(payload))
            .await
    }

    /// Отклоняет задачу pull-подписки.
    pub async fn fail(
        &self,
        subscription: &Subscription,
        task: &LockedTask,
        reason: impl Into<String>,
    ) -> LeaseResult<()> {
        self.resolve(subscription, task.task(), Report::Fail(reason.into()))
            .await
    }

    ////////////////////////////////////////////////////////////////////////////
    // Аренды и отчёты
    ////////////////////////////////////////////////////////////////////////////

    fn require_open(
        &self,
        subscription: &Subscription,
    ) -> LeaseResult<u64> {
        match subscription.id() {
            Some(subscription_id) if subscription.is_open() => Ok(subscription_id),
            id => Err(SubscriptionError::NotOpen {
                subscription_id: id.unwrap_or_default(),
            }
            .into()),
        }
    }

    /// Берёт задачи пачки в аренду. Возвращает те, что можно выдавать.
    fn lease_batch(
        &self,
        subscription: &Subscription,
        tasks: Vec<Task>,
        discarded: &mut usize,
    ) -> Vec<Task> {
        let subscription_id = subscription.id().unwrap_or_default();
        if tasks.is_empty() {
            return tasks;
        }

        // Подписку закрыли, пока шёл RPC: блокировки истекут у брокера.
        if !subscription.is_open() {
            self.discard(subscription_id, tasks.len(), discarded);
            return Vec::new();
        }

        let total = tasks.len();
        let mut leased = Vec::with_capacity(total);
        for task in tasks {
            match subscription.take_lease(&task) {
                LeaseOutcome::Leased => leased.push(task),
                LeaseOutcome::Duplicate => {
                    debug!(
                        subscription_id,
                        task_id = task.task_id,
                        "Task already leased, skipping"
                    );
                }
                LeaseOutcome::NoCredit => {
                    warn!(
                        subscription_id,
                        task_id = task.task_id,
                        "Broker returned more tasks than credits"
                    );
                }
            }
        }

        if leased.len() < total {
            self.discard(subscription_id, total - leased.len(), discarded);
        }
        if !leased.is_empty() {
            AcquisitionMetrics::add(&self.shared.metrics.acquired, leased.len() as u64);
            trace!(
                subscription_id,
                count = leased.len(),
                credits = subscription.credits_available(),
                "Tasks leased"
            );
            self.emit(EngineEvent::TasksAcquired {
                subscription_id,
                count: leased.len(),
            });
        }
        leased
    }

    fn discard(
        &self,
        subscription_id: u64,
        count: usize,
        discarded: &mut usize,
    ) {
        *discarded += count;
        AcquisitionMetrics::add(&self.shared.metrics.discarded, count as u64);
        debug!(subscription_id, count, "Tasks discarded");
        self.emit(EngineEvent::BatchDiscarded {
            subscription_id,
            count,
        });
    }

    fn reclaim(
        &self,
        subscription: &Subscription,
    ) -> usize {
        let Reclaimed { task_ids, overflow } =
            subscription.reclaim_expired(self.shared.clock.now());
        let subscription_id = subscription.id().unwrap_or_default();
        if let Some(overflow) = overflow {
            self.credit_overflow(subscription_id, overflow);
        }
        if task_ids.is_empty() {
            return 0;
        }

        let count = task_ids.len();
        AcquisitionMetrics::add(&self.shared.metrics.reclaimed, count as u64);
        debug!(
            subscription_id,
            count,
            credits = subscription.credits_available(),
            "Expired leases reclaimed"
        );
        self.emit(EngineEvent::LeasesReclaimed {
            subscription_id,
            task_ids,
        });
        count
    }

    /// Кредит вернулся сверх ёмкости: учёт сломан. Логируется и
    /// публикуется, работа продолжается.
    fn credit_overflow(
        &self,
        subscription_id: u64,
        overflow: TaskError,
    ) -> StackError {
        let error = StackError::new(overflow);
        error!(subscription_id, error = %error, "Credit accounting broken");
        self.emit(EngineEvent::CreditOverflow {
            subscription_id,
            error: error.clone(),
        });
        error
    }

    fn record_transient(
        &self,
        subscription_id: u64,
        error: StackError,
    ) {
        AcquisitionMetrics::incr(&self.shared.metrics.transient_failures);
        warn!(subscription_id, error = %error, "Task acquisition failed, retrying next cycle");
        self.emit(EngineEvent::TransientAcquisitionFailure {
            subscription_id,
            error,
        });
    }

    fn decode(
        &self,
        task: &Task,
    ) -> Result<LockedTask, String> {
        match self.shared.codec.decode(&task.payload) {
            Ok(payload) => Ok(LockedTask::new(task.clone(), payload)),
            Err(e) => {
                warn!(task_id = task.task_id, error = %e, "Failing task with undecodable payload");
                Err(e.to_string())
            }
        }
    }

    async fn report_outcome(
        &self,
        subscription: &Subscription,
        task: &Task,
        outcome: HandlerResult,
    ) -> LeaseResult<()> {
        let report = match outcome {
            Ok(None) => Report::Complete(None),
            Ok(Some(value)) => match self.shared.codec.encode(&value) {
                Ok(bytes) => Report::Complete(Some(bytes)),
                Err(e) => Report::Fail(e.to_string()),
            },
            Err(e) => Report::Fail(e.to_string()),
        };
        self.resolve(subscription, task, report).await
    }

    /// Отчитывается брокеру по задаче и обновляет аренду.
    ///
    /// - Блокировка истекла: отчёт не отправляется, кредит возвращается,
    ///   ошибка `StaleCompletion`.
    /// - RPC прошёл: аренда снимается, кредит возвращается.
    /// - RPC не прошёл: аренда становится `Unconfirmed`, кредит удержан до
    ///   истечения блокировки.
    async fn resolve(
        &self,
        subscription: &Subscription,
        task: &Task,
        report: Report,
    ) -> LeaseResult<()> {
        let subscription_id = subscription.id().unwrap_or_default();
        let task_id = task.task_id;

        if task.is_lock_expired(self.shared.clock.now()) {
            // Аренда могла уже перейти к повторной выдаче той же задачи:
            // снимается только аренда с этим сроком блокировки.
            if let Err(overflow @ TaskError::CreditOverflow { .. }) =
                subscription.settle(task_id, task.lock_expiration_time)
            {
                self.credit_overflow(subscription_id, overflow);
            }
            AcquisitionMetrics::incr(&self.shared.metrics.stale_completions);
            warn!(
                subscription_id,
                task_id,
                lock_expiration = %task.lock_expiration_time,
                "Lock expired before {}; report not sent",
                report.action()
            );
            self.emit(EngineEvent::StaleCompletion {
                subscription_id,
                task_id,
                lock_expiration: task.lock_expiration_time,
            });
            bail!(TaskError::StaleCompletion {
                task_id,
                lock_expiration: task.lock_expiration_time.to_rfc3339(),
            });
        }

        subscription.begin_report(task_id, task.lock_expiration_time)?;

        let action = report.action();
        let (rpc, reason) = match report {
            Report::Complete(payload) => (
                self.shared.broker.complete_task(task_id, payload).await,
                None,
            ),
            Report::Fail(reason) => {
                let rpc = self.shared.broker.fail_task(task_id, &reason).await;
                (rpc, Some(reason))
            }
        };

        if let Err(error) = rpc {
            subscription.mark_unconfirmed(task_id);
            AcquisitionMetrics::incr(&self.shared.metrics.report_failures);
            warn!(
                subscription_id,
                task_id,
                action,
                error = %error,
                "Task report failed; credit withheld until lock expiry"
            );
            self.emit(EngineEvent::ReportFailed {
                subscription_id,
                task_id,
                error: error.clone(),
            });
            bail!(TaskError::ReportFailed {
                task_id,
                action,
                reason: error.to_string(),
            });
        }

        if let Err(overflow) = subscription.settle(task_id, task.lock_expiration_time) {
            return Err(self.credit_overflow(subscription_id, overflow));
        }

        match reason {
            None => {
                AcquisitionMetrics::incr(&self.shared.metrics.completed);
                trace!(subscription_id, task_id, "Task completed");
                self.emit(EngineEvent::TaskCompleted {
                    subscription_id,
                    task_id,
                });
            }
            Some(reason) => {
                AcquisitionMetrics::incr(&self.shared.metrics.failed);
                debug!(subscription_id, task_id, reason = %reason, "Task failed");
                self.emit(EngineEvent::TaskFailed {
                    subscription_id,
                    task_id,
                    reason,
                });
            }
        }
        Ok(())
    }
}

/// Вызывает обработчик в отдельной задаче tokio: паника обработчика
/// становится отказом задачи, а не падением движка.
async fn invoke(
    handler: Arc<dyn TaskHandler>,
    task: LockedTask,
) -> HandlerResult {
    let task_id = task.id();
    match tokio::spawn(async move { handler.handle(task).await }).await {
        Ok(outcome) => outcome,
        Err(join_error) => {
            let reason = if join_error.is_panic() {
                panic_message(join_error.into_panic())
            } else {
                "handler cancelled".to_string()
            };
            error!(task_id, reason = %reason, "Task handler panicked");
            Err(HandlerError::Panicked(reason))
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl std::fmt::Debug for AcquisitionEngine {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("AcquisitionEngine")
            .field("subscriptions", &self.shared.registry.len())
            .field("running", &self.is_running())
            .field("config", &self.shared.config)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
