use std::sync::Arc;

use leasehold_error::LeaseResult;
use tracing::info;

use crate::{
    broker::BrokerGateway,
    clock::{Clock, SystemClock},
    codec::{MsgPackCodec, PayloadCodec},
    config::Settings,
    engine::{AcquisitionEngine, EngineConfig, EngineEvent, MetricsSnapshot},
    subscription::{PollableTaskSubscriptionBuilder, Subscription, TaskSubscriptionBuilder},
    task::SubscriptionId,
};

/// Конфигурация клиента.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Параметры движка захвата
    pub engine: EngineConfig,
    /// Запускать ли фоновый цикл сразу при создании клиента
    pub start_acquisition: bool,
}

/// Клиент задач.
///
/// Владеет движком захвата и выдаёт builder-ы подписок. Закрытие
/// клиента останавливает фоновый цикл и закрывает все подписки.
#[derive(Debug)]
pub struct TaskClient {
    engine: AcquisitionEngine,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            start_acquisition: true,
        }
    }
}

impl From<&Settings> for ClientConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            engine: EngineConfig::from(settings),
            start_acquisition: true,
        }
    }
}

impl TaskClient {
    /// Клиент с MessagePack-кодеком и системными часами.
    ///
    /// При `start_acquisition` требует запущенного tokio runtime.
    pub fn new(
        gateway: Arc<dyn BrokerGateway>,
        config: ClientConfig,
    ) -> LeaseResult<Self> {
        Self::with_components(gateway, Arc::new(MsgPackCodec), Arc::new(SystemClock), config)
    }

    /// Клиент с параметрами из окружения (`LEASEHOLD_*`).
    pub fn from_settings(
        gateway: Arc<dyn BrokerGateway>,
        settings: &Settings,
    ) -> LeaseResult<Self> {
        Self::new(gateway, ClientConfig::from(settings))
    }

    pub fn with_components(
        gateway: Arc<dyn BrokerGateway>,
        codec: Arc<dyn PayloadCodec>,
        clock: Arc<dyn Clock>,
        config: ClientConfig,
    ) -> LeaseResult<Self> {
        let engine = AcquisitionEngine::with_components(gateway, codec, clock, config.engine);
        if config.start_acquisition {
            engine.start()?;
        }
        info!(running = engine.is_running(), "Task client created");
        Ok(Self { engine })
    }

    /// Builder push-подписки.
    pub fn new_subscription(&self) -> TaskSubscriptionBuilder {
        TaskSubscriptionBuilder::new(self.engine.clone())
    }

    /// Builder pull-подписки.
    pub fn new_pollable_subscription(&self) -> PollableTaskSubscriptionBuilder {
        PollableTaskSubscriptionBuilder::new(self.engine.clone())
    }

    /// Снимок открытых подписок.
    pub fn subscriptions(&self) -> Vec<Arc<Subscription>> {
        self.engine.registry().all()
    }

    /// Открытая подписка по id; закрытая или чужая даёт
    /// `SubscriptionError::UnknownSubscription`.
    pub fn subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> LeaseResult<Arc<Subscription>> {
        self.engine.subscription(subscription_id)
    }

    pub fn engine(&self) -> &AcquisitionEngine {
        &self.engine
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.engine.metrics()
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.engine.subscribe_events()
    }

    /// Останавливает фоновый цикл, дожидается обработчиков и закрывает
    /// все подписки.
    pub async fn close(&self) {
        self.engine.shutdown().await;
        info!("Task client closed");
    }
}
