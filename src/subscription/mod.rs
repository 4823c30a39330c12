//! Подписки на задачи: параметры, учёт кредитов и аренд, builder-ы и
//! пользовательские handle.

mod builder;
mod credits;
mod entity;
mod handle;
mod handler;
mod lock_time;
mod spec;

pub use builder::{PollableTaskSubscriptionBuilder, TaskSubscriptionBuilder};
pub use credits::{CreditOverflow, Credits};
pub(crate) use entity::{LeaseOutcome, Reclaimed};
pub use entity::{Lease, LeaseStatus, Subscription, SubscriptionState};
pub use handle::{PollableTaskSubscription, TaskSubscription};
pub use handler::{handler_fn, FnHandler, HandlerError, HandlerResult, TaskHandler};
pub use lock_time::IntoLockTime;
pub use spec::{SubscriptionMode, SubscriptionSpec};
