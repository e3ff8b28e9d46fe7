use thiserror::Error;

/// Ошибки регистрации периодического callback'а.
///
/// Ни один из вариантов не всплывает из `subscribe`: отклонённая
/// регистрация даёт один структурированный warn-диагностик и
/// отбрасывается, остальные подписчики и хост не затрагиваются.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    #[error(
        "callback has no retained reference and could never be unsubscribed; \
         keep a clone of the Rc as the cancellation token"
    )]
    UnreferenceableCallback,

    #[error("period must be a finite value >= 0, got {0}")]
    InvalidPeriod(f32),
}
