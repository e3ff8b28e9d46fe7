use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::Rc,
};

use crate::ChannelError;

use super::SubscriptionHandle;

/// Обработчик сообщений канала.
///
/// Identity обработчика — это сама аллокация `Rc` (сравнение через
/// [`Rc::ptr_eq`]). Клон `Rc`, который остаётся у вызывающего кода,
/// одновременно служит токеном для последующей отписки.
pub type MessageHandler<T> = Rc<dyn Fn(&T)>;

/// Отложенная структурная операция над списком подписчиков.
///
/// Операции накапливаются в FIFO-очереди и применяются только в точке
/// drain — в начале очередного `publish`.
enum PendingOp<T> {
    Subscribe(MessageHandler<T>),
    Unsubscribe(MessageHandler<T>),
}

pub(super) struct ChannelState<T> {
    /// Зафиксированные подписчики в порядке подписки, без дубликатов.
    subscribers: Vec<MessageHandler<T>>,
    /// FIFO-очередь отложенных add/remove операций.
    pending: VecDeque<PendingOp<T>>,
    /// Монотонный флаг: после dispose канал навсегда пуст.
    disposed: bool,
}

/// Ставит отписку в очередь канала, минуя публичный handle `Channel`.
/// Используется [`SubscriptionHandle`], который держит состояние
/// канала через `Weak`.
pub(super) fn enqueue_unsubscribe<T>(
    state: &RefCell<ChannelState<T>>,
    handler: MessageHandler<T>,
) {
    let mut state = state.borrow_mut();
    if state.disposed {
        return;
    }
    state.pending.push_back(PendingOp::Unsubscribe(handler));
}

impl<T> ChannelState<T> {
    fn contains(
        &self,
        handler: &MessageHandler<T>,
    ) -> bool {
        self.subscribers.iter().any(|s| Rc::ptr_eq(s, handler))
    }

    fn pending_add_contains(
        &self,
        handler: &MessageHandler<T>,
    ) -> bool {
        self.pending.iter().any(|op| match op {
            PendingOp::Subscribe(h) => Rc::ptr_eq(h, handler),
            PendingOp::Unsubscribe(_) => false,
        })
    }

    /// Применяет все накопленные операции в порядке постановки.
    ///
    /// Единственная точка, в которой `subscribers` структурно меняется.
    fn drain_pending(&mut self) {
        while let Some(op) = self.pending.pop_front() {
            match op {
                PendingOp::Subscribe(handler) => {
                    if !self.contains(&handler) {
                        self.subscribers.push(handler);
                    }
                }
                PendingOp::Unsubscribe(handler) => {
                    if let Some(idx) =
                        self.subscribers.iter().position(|s| Rc::ptr_eq(s, &handler))
                    {
                        self.subscribers.remove(idx);
                    }
                }
            }
        }
    }
}

/// Типизированный внутрипроцессный broadcast-канал.
///
/// Публикация синхронно доставляет сообщение всем зафиксированным
/// подписчикам в порядке подписки. Подписка и отписка лишь ставят
/// намерение в очередь; очередь применяется в начале следующего
/// `publish`. Благодаря этому обработчик может свободно подписываться
/// и отписываться прямо во время доставки — список, по которому идёт
/// итерация, в этот момент гарантированно не меняется.
///
/// Канал рассчитан на один логический поток управления и не содержит
/// блокировок. Вложенный `publish` из обработчика того же канала
/// контрактом не поддерживается.
///
/// `Channel` — дешёвый клонируемый handle: все клоны разделяют одно
/// внутреннее состояние.
pub struct Channel<T> {
    inner: Rc<RefCell<ChannelState<T>>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Channel<T> {
    /// Создаёт пустой канал.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ChannelState {
                subscribers: Vec::new(),
                pending: VecDeque::new(),
                disposed: false,
            })),
        }
    }

    /// Подписывает обработчик на канал.
    ///
    /// Регистрация становится видимой доставке начиная со следующей
    /// точки drain (то есть со следующего вызова `publish`).
    ///
    /// Возвращает [`SubscriptionHandle`], отмена через который
    /// идемпотентна. На disposed-канале — безопасный no-op: обработчик
    /// не сохраняется, возвращается уже «погашенный» handle.
    ///
    /// # Ошибки
    ///
    /// [`ChannelError::DuplicateSubscription`], если та же identity уже
    /// зафиксирована или уже стоит в очереди на добавление. Это guard
    /// от ошибки программиста, а не восстановимое состояние.
    pub fn subscribe(
        &self,
        handler: MessageHandler<T>,
    ) -> Result<SubscriptionHandle<T>, ChannelError> {
        let mut inner = self.inner.borrow_mut();
        if inner.disposed {
            return Ok(SubscriptionHandle::spent());
        }
        if inner.contains(&handler) || inner.pending_add_contains(&handler) {
            return Err(ChannelError::DuplicateSubscription);
        }
        inner.pending.push_back(PendingOp::Subscribe(Rc::clone(&handler)));
        Ok(SubscriptionHandle::new(Rc::downgrade(&self.inner), handler))
    }

    /// Ставит в очередь отписку обработчика.
    ///
    /// Всегда успешна: неизвестная identity и disposed-канал — no-op.
    /// Повторные вызовы безопасны.
    pub fn unsubscribe(
        &self,
        handler: &MessageHandler<T>,
    ) {
        let mut inner = self.inner.borrow_mut();
        if inner.disposed {
            return;
        }
        inner
            .pending
            .push_back(PendingOp::Unsubscribe(Rc::clone(handler)));
    }

    /// Публикует сообщение всем зафиксированным подписчикам.
    ///
    /// Сначала полностью применяется очередь отложенных операций, затем
    /// сообщение синхронно доставляется каждому подписчику в порядке
    /// подписки. Подписки и отписки, сделанные обработчиками во время
    /// доставки, попадут только в следующий `publish`.
    pub fn publish(
        &self,
        message: &T,
    ) {
        // Snapshot зафиксированного списка: borrow не удерживается во
        // время вызова обработчиков, клоны Rc дёшевы.
        let handlers: Vec<MessageHandler<T>> = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return;
            }
            inner.drain_pending();
            inner.subscribers.clone()
        };

        for handler in handlers {
            handler(message);
        }
    }

    /// Утилизирует канал: очищает подписчиков и очередь операций,
    /// отпуская все ссылки на обработчики.
    ///
    /// Идемпотентна. После вызова `subscribe`/`publish`/`unsubscribe`
    /// становятся безопасными no-op.
    pub fn dispose(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.disposed {
            return;
        }
        inner.disposed = true;
        inner.subscribers.clear();
        inner.pending.clear();
    }

    /// Проверяет, был ли канал утилизирован.
    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }

    /// Количество зафиксированных подписчиков (ожидающие в очереди не
    /// учитываются до ближайшего drain).
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn counting_handler(hits: &Rc<Cell<u32>>) -> MessageHandler<u32> {
        let hits = Rc::clone(hits);
        Rc::new(move |_msg: &u32| hits.set(hits.get() + 1))
    }

    /// Тест проверяет, что первый `publish` после подписки применяет
    /// очередь и доставляет сообщение подписчику ровно один раз.
    #[test]
    fn test_subscribe_then_publish_delivers_once() {
        let ch: Channel<u32> = Channel::new();
        let hits = Rc::new(Cell::new(0));
        let _sub = ch.subscribe(counting_handler(&hits)).unwrap();

        // до drain подписчик ещё не зафиксирован
        assert_eq!(ch.subscriber_count(), 0);

        ch.publish(&7);
        assert_eq!(hits.get(), 1);
        assert_eq!(ch.subscriber_count(), 1);
    }

    /// Тест проверяет, что доставленное значение совпадает с
    /// опубликованным.
    #[test]
    fn test_publish_passes_message_by_reference() {
        let ch: Channel<String> = Channel::new();
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let handler: MessageHandler<String> = {
            let seen = Rc::clone(&seen);
            Rc::new(move |msg: &String| seen.borrow_mut().push(msg.clone()))
        };
        let _sub = ch.subscribe(handler).unwrap();

        ch.publish(&"status: online".to_string());
        ch.publish(&"status: offline".to_string());

        assert_eq!(
            &*seen.borrow(),
            &["status: online".to_string(), "status: offline".to_string()]
        );
    }

    /// Тест проверяет, что доставка идёт в порядке подписки.
    #[test]
    fn test_dispatch_in_subscription_order() {
        let ch: Channel<()> = Channel::new();
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let first: MessageHandler<()> = {
            let order = Rc::clone(&order);
            Rc::new(move |_| order.borrow_mut().push("first"))
        };
        let second: MessageHandler<()> = {
            let order = Rc::clone(&order);
            Rc::new(move |_| order.borrow_mut().push("second"))
        };

        let _a = ch.subscribe(first).unwrap();
        let _b = ch.subscribe(second).unwrap();
        ch.publish(&());

        assert_eq!(&*order.borrow(), &["first", "second"]);
    }

    /// Тест проверяет, что повторная подписка той же identity до
    /// промежуточного drain отклоняется, а после drain зафиксирован
    /// ровно один подписчик.
    #[test]
    fn test_duplicate_subscription_rejected() {
        let ch: Channel<u32> = Channel::new();
        let hits = Rc::new(Cell::new(0));
        let handler = counting_handler(&hits);

        let _sub = ch.subscribe(Rc::clone(&handler)).unwrap();
        let err = ch.subscribe(Rc::clone(&handler)).unwrap_err();
        assert!(matches!(err, ChannelError::DuplicateSubscription));

        ch.publish(&0);
        assert_eq!(ch.subscriber_count(), 1);
        assert_eq!(hits.get(), 1);
    }

    /// Тест проверяет, что повторная подписка уже зафиксированной
    /// identity тоже отклоняется.
    #[test]
    fn test_duplicate_against_committed_set_rejected() {
        let ch: Channel<u32> = Channel::new();
        let hits = Rc::new(Cell::new(0));
        let handler = counting_handler(&hits);

        let _sub = ch.subscribe(Rc::clone(&handler)).unwrap();
        ch.publish(&0); // фиксируем
        assert!(ch.subscribe(Rc::clone(&handler)).is_err());
    }

    /// Тест проверяет, что два разных замыкания с одинаковым телом —
    /// это разные identity, и обе подписки проходят.
    #[test]
    fn test_distinct_allocations_are_distinct_identities() {
        let ch: Channel<u32> = Channel::new();
        let hits = Rc::new(Cell::new(0));
        let _a = ch.subscribe(counting_handler(&hits)).unwrap();
        let _b = ch.subscribe(counting_handler(&hits)).unwrap();

        ch.publish(&1);
        assert_eq!(hits.get(), 2);
    }

    /// Тест проверяет, что обработчик, отписавший сам себя во время
    /// publish(m1), ещё получает m1, но уже не получает m2.
    #[test]
    fn test_self_unsubscribe_during_dispatch() {
        let ch: Channel<u32> = Channel::new();
        let hits = Rc::new(Cell::new(0));
        let self_slot: Rc<RefCell<Option<MessageHandler<u32>>>> =
            Rc::new(RefCell::new(None));

        let handler: MessageHandler<u32> = {
            let ch = ch.clone();
            let hits = Rc::clone(&hits);
            let slot = Rc::clone(&self_slot);
            Rc::new(move |_msg: &u32| {
                hits.set(hits.get() + 1);
                if let Some(me) = slot.borrow().as_ref() {
                    ch.unsubscribe(me);
                }
            })
        };
        *self_slot.borrow_mut() = Some(Rc::clone(&handler));

        let _sub = ch.subscribe(handler).unwrap();
        ch.publish(&1); // доставка + постановка отписки в очередь
        ch.publish(&2); // drain применил отписку до доставки

        assert_eq!(hits.get(), 1);
        assert_eq!(ch.subscriber_count(), 0);
    }

    /// Тест проверяет, что подписка из обработчика во время publish
    /// начинает действовать только со следующего publish.
    #[test]
    fn test_subscribe_during_dispatch_deferred() {
        let ch: Channel<u32> = Channel::new();
        let late_hits = Rc::new(Cell::new(0));
        let late = counting_handler(&late_hits);

        let trigger: MessageHandler<u32> = {
            let ch = ch.clone();
            let late = Rc::clone(&late);
            let armed = Cell::new(false);
            Rc::new(move |_msg: &u32| {
                if !armed.get() {
                    armed.set(true);
                    ch.subscribe(Rc::clone(&late)).unwrap().detach();
                }
            })
        };

        let _sub = ch.subscribe(trigger).unwrap();
        ch.publish(&1); // late только поставлен в очередь
        assert_eq!(late_hits.get(), 0);

        ch.publish(&2);
        assert_eq!(late_hits.get(), 1);
    }

    /// Тест проверяет, что отписка неизвестной identity — no-op без
    /// ошибок, в том числе повторная.
    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let ch: Channel<u32> = Channel::new();
        let hits = Rc::new(Cell::new(0));
        let stranger = counting_handler(&hits);

        ch.unsubscribe(&stranger);
        ch.unsubscribe(&stranger);
        ch.publish(&0);
        assert_eq!(ch.subscriber_count(), 0);
    }

    /// Тест проверяет, что после dispose publish никого не вызывает и
    /// не паникует, а повторный dispose — no-op.
    #[test]
    fn test_dispose_makes_operations_noops() {
        let ch: Channel<u32> = Channel::new();
        let hits = Rc::new(Cell::new(0));
        let handler = counting_handler(&hits);
        let _sub = ch.subscribe(Rc::clone(&handler)).unwrap();
        ch.publish(&0);
        assert_eq!(ch.subscriber_count(), 1);

        ch.dispose();
        ch.dispose();
        assert!(ch.is_disposed());
        assert_eq!(ch.subscriber_count(), 0);

        ch.publish(&1);
        assert_eq!(hits.get(), 1); // только доставка до dispose

        // подписка на disposed-канал — no-op с погашенным handle
        let spent = ch.subscribe(handler).unwrap();
        assert!(spent.is_disposed());
        ch.publish(&2);
        assert_eq!(hits.get(), 1);
    }

    /// Тест проверяет FIFO-семантику очереди: отписка, поставленная
    /// после подписки в том же кадре, нетто-эффектом убирает
    /// подписчика.
    #[test]
    fn test_fifo_netting_subscribe_then_unsubscribe() {
        let ch: Channel<u32> = Channel::new();
        let hits = Rc::new(Cell::new(0));
        let handler = counting_handler(&hits);

        let _sub = ch.subscribe(Rc::clone(&handler)).unwrap();
        ch.unsubscribe(&handler);

        ch.publish(&0);
        assert_eq!(hits.get(), 0);
        assert_eq!(ch.subscriber_count(), 0);
    }
}
