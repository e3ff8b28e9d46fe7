/// Host configuration loading.
pub mod config;
/// Common error types: channel subscription, scheduler registration.
pub mod error;
/// Flexible logging (filter, console sink, JSON format).
pub mod logging;
/// Pub/Sub: typed broadcast Channel, SubscriptionHandle.
pub mod pubsub;
/// Periodic-task scheduler driven by one external per-frame tick.
pub mod scheduler;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// config
pub use config::Settings;
/// Operation errors.
pub use error::{ChannelError, SchedulerError};
/// Logging init and configuration.
pub use logging::{init_logging, LoggingConfig};
/// Pub/Sub API.
pub use pubsub::{Channel, MessageHandler, SubscriptionHandle};
/// Scheduler API.
pub use scheduler::{PeriodicScheduler, TickCallback};
