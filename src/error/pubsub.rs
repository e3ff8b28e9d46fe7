use thiserror::Error;

/// Ошибки канала pub/sub.
///
/// Единственная жёсткая ошибка в этом ядре: всё остальное (операции на
/// утилизированном канале, отписка неизвестной identity) по контракту
/// деградирует до безопасного no-op и типа ошибки не имеет.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("attempting to subscribe with the same handler more than once")]
    DuplicateSubscription,
}
