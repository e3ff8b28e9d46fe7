//! Планировщик периодических задач на внешнем покадровом тике.
//!
//! Части объектов нужен более редкий цикл обновления, чем у кадра, и
//! без точного таймирования — например, периодическое обновление
//! данных от внешних сервисов. Вместо таймера или потока на каждого
//! потребителя один [`PeriodicScheduler`] раскладывает единственный
//! покадровый `tick` хоста на произвольное число независимых
//! периодических callback'ов.
//!
//! - `runner`: [`PeriodicScheduler`] и учёт подписчиков.
//!
//! Публичный API переэкспортирует:
//! - `runner::*`

pub mod runner;

pub use runner::{PeriodicScheduler, TickCallback};
