pub mod pubsub;
pub mod scheduler;

pub use pubsub::ChannelError;
pub use scheduler::SchedulerError;
