use std::{cell::RefCell, rc::Weak};

use super::channel::{ChannelState, MessageHandler};

/// Владеемый токен одной подписки на [`Channel`](super::Channel).
///
/// Отмена (dispose) ставит в очередь владеющего канала ровно одну
/// операцию отписки; повторная отмена — no-op, поскольку и сама
/// отписка идемпотентна. Handle держит канал через `Weak` и потому не
/// продлевает ему жизнь: если канал уже уничтожен или утилизирован,
/// отмена тихо ничего не делает.
///
/// `Drop` выполняет отмену автоматически (RAII). Если подписка должна
/// пережить handle, вызовите [`detach`](Self::detach).
pub struct SubscriptionHandle<T> {
    channel: Weak<RefCell<ChannelState<T>>>,
    handler: Option<MessageHandler<T>>,
}

impl<T> SubscriptionHandle<T> {
    pub(super) fn new(
        channel: Weak<RefCell<ChannelState<T>>>,
        handler: MessageHandler<T>,
    ) -> Self {
        Self {
            channel,
            handler: Some(handler),
        }
    }

    /// Уже «погашенный» handle: возвращается подпиской на
    /// disposed-канал, отменять нечего.
    pub(super) fn spent() -> Self {
        Self {
            channel: Weak::new(),
            handler: None,
        }
    }

    /// Отменяет подписку: ставит отписку в очередь владеющего канала.
    ///
    /// Идемпотентна; безопасна и после dispose канала, и после его
    /// уничтожения.
    pub fn dispose(&mut self) {
        let Some(handler) = self.handler.take() else {
            return;
        };
        if let Some(inner) = self.channel.upgrade() {
            super::channel::enqueue_unsubscribe(&inner, handler);
        }
    }

    /// Отпускает handle, оставляя подписку действующей. После этого
    /// отписаться можно только через `Channel::unsubscribe` с
    /// сохранённым `Rc` обработчика.
    pub fn detach(mut self) {
        self.handler = None;
    }

    /// Проверяет, погашен ли handle (отмена уже выполнена либо была
    /// невозможна изначально).
    pub fn is_disposed(&self) -> bool {
        self.handler.is_none()
    }
}

impl<T> std::fmt::Debug for SubscriptionHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl<T> Drop for SubscriptionHandle<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}
