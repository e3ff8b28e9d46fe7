//! Подсистема Publish–Subscribe (pub/sub).
//!
//! Лёгкая типизированная система внутрипроцессного вещания сообщений
//! с безопасной модификацией подписок прямо во время доставки:
//!
//! - `channel`: broadcast-канал [`Channel`] с FIFO-очередью отложенных
//!   операций, применяемой в начале каждого `publish`.
//! - `subscription`: [`SubscriptionHandle`] — идемпотентно отменяемый
//!   токен одной подписки.
//!
//! Публичный API переэкспортирует:
//! - `channel::*`
//! - `subscription::*`

pub mod channel;
pub mod subscription;

pub use channel::{Channel, MessageHandler};
pub use subscription::SubscriptionHandle;
