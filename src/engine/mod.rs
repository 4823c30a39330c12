pub mod acquisition;
pub mod config;
pub mod events;
pub mod metrics;

pub use acquisition::*;
pub use config::*;
pub use events::*;
pub use metrics::*;
