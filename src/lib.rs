//! Client-side acquisition of locked tasks from a task broker.
//!
//! A worker opens subscriptions for a task type, each bounded by a credit
//! budget. Push subscriptions get tasks delivered to a handler by a
//! background loop; pull subscriptions hand them out on explicit `poll()`.
//! Every task is reported back as completed or failed, or left to expire.

/// Broker RPC surface, client-side adapter and the in-memory broker.
pub mod broker;
/// Task client facade.
pub mod client;
/// Time source used for lock expiry checks.
pub mod clock;
/// Payload encoding between broker bytes and structured values.
pub mod codec;
/// Settings loaded from defaults and `LEASEHOLD_*` environment variables.
pub mod config;
/// Acquisition engine: background loop, polling, reporting, metrics, events.
pub mod engine;
/// Flexible logging (formatting, filters, sinks).
pub mod logging;
/// Concurrency-safe registry of open subscriptions.
pub mod registry;
/// Subscription entity, credits, leases, builders and handles.
pub mod subscription;
/// Tasks leased from the broker.
pub mod task;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

pub use broker::{
    BrokerCall, BrokerClient, BrokerGateway, BrokerOperation, CreateSubscriptionRequest,
    InMemoryBroker, SubscriptionCreated,
};
pub use client::{ClientConfig, TaskClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{JsonCodec, MsgPackCodec, PayloadCodec, Value};
pub use self::config::Settings;
pub use engine::{
    AcquisitionEngine, AcquisitionMetrics, CycleReport, EngineConfig, EngineEvent,
    MetricsSnapshot, DEFAULT_TASK_FETCH_SIZE,
};
pub use leasehold_error::{
    BrokerError, CodecError, ErrorExt, LeaseResult, StackError, StatusCode, SubscriptionError,
    TaskError, ValidationError,
};
pub use logging::{init_logging, LoggingConfig, LoggingHandle};
pub use registry::SubscriptionRegistry;
pub use subscription::{
    handler_fn, HandlerError, HandlerResult, IntoLockTime, PollableTaskSubscription,
    PollableTaskSubscriptionBuilder, Subscription, SubscriptionMode, SubscriptionSpec,
    SubscriptionState, TaskHandler, TaskSubscription, TaskSubscriptionBuilder,
};
pub use task::{LockedTask, SubscriptionId, Task, TaskId};
