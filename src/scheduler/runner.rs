use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use tracing::warn;

use crate::SchedulerError;

/// Периодический callback планировщика. Аргумент — накопленное время
/// (в секундах) с момента прошлого срабатывания.
///
/// Identity callback'а — аллокация `Rc`; клон, который остаётся у
/// вызывающего кода, служит токеном отмены для `unsubscribe`.
pub type TickCallback = Rc<dyn Fn(f32)>;

/// Ключ identity callback'а: адрес данных его `Rc`-аллокации.
/// Стабилен, пока планировщик держит сильную ссылку на callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CallbackKey(usize);

fn key_of(callback: &TickCallback) -> CallbackKey {
    CallbackKey(Rc::as_ptr(callback).cast::<()>() as usize)
}

/// Учёт одного периодического подписчика.
struct TickRecord {
    callback: TickCallback,
    /// Желаемый период срабатывания, секунды; 0 — «каждый кадр».
    period: f32,
    /// Накоплено с прошлого срабатывания; сбрасывается в 0 сразу
    /// после вызова callback'а.
    elapsed: f32,
}

/// Отложенная операция над набором активных подписчиков; применяется
/// только при drain в начале очередного `tick`.
enum PendingOp {
    Subscribe { callback: TickCallback, period: f32 },
    Unsubscribe(CallbackKey),
}

struct RunnerState {
    /// Активные подписчики по identity. Порядок итерации не
    /// специфицирован — это осознанная часть контракта.
    active: HashMap<CallbackKey, TickRecord>,
    /// FIFO-очередь отложенных add/remove операций.
    pending: VecDeque<PendingOp>,
}

impl RunnerState {
    fn pending_add_contains(
        &self,
        key: CallbackKey,
    ) -> bool {
        self.pending.iter().any(|op| match op {
            PendingOp::Subscribe { callback, .. } => key_of(callback) == key,
            PendingOp::Unsubscribe(_) => false,
        })
    }

    fn drain_pending(&mut self) {
        while let Some(op) = self.pending.pop_front() {
            match op {
                PendingOp::Subscribe { callback, period } => {
                    let key = key_of(&callback);
                    self.active.entry(key).or_insert(TickRecord {
                        callback,
                        period,
                        elapsed: 0.0,
                    });
                }
                PendingOp::Unsubscribe(key) => {
                    self.active.remove(&key);
                }
            }
        }
    }
}

/// Планировщик периодических callback'ов, приводимый в движение одним
/// внешним покадровым сигналом.
///
/// Вместо отдельного таймера или потока на каждого потребителя цикл
/// хоста раз в кадр вызывает [`tick`](Self::tick), а планировщик
/// накапливает для каждого подписчика прошедшее время и вызывает тех,
/// кто дошёл до своего периода. Упорядоченность между независимыми
/// подписчиками не гарантируется.
///
/// Подписка и отписка лишь ставят намерение в FIFO-очередь; очередь
/// применяется в начале следующего `tick` — поэтому callback может
/// безопасно отписывать себя (или других) прямо во время срабатывания.
/// Вложенный `tick` из callback'а того же планировщика контрактом не
/// поддерживается.
///
/// Все операции однопоточные, без блокировок; `PeriodicScheduler` —
/// дешёвый клонируемый handle над общим состоянием.
pub struct PeriodicScheduler {
    inner: Rc<RefCell<RunnerState>>,
}

impl Clone for PeriodicScheduler {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Default for PeriodicScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodicScheduler {
    /// Создаёт пустой планировщик.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(RunnerState {
                active: HashMap::new(),
                pending: VecDeque::new(),
            })),
        }
    }

    /// Регистрирует периодический callback: вызывается примерно каждые
    /// `period` секунд (или каждый кадр при `period == 0`), начиная со
    /// следующего drain.
    ///
    /// Сохранённый у вызывающего кода клон `Rc` — токен отмены.
    /// Регистрация callback'а, на который вызывающий код не оставил
    /// себе ни одной ссылки (`Rc::strong_count < 2`), отклоняется:
    /// такую подписку никогда не получится отменить. Отклонение — не
    /// ошибка вызова: один структурированный warn-диагностик,
    /// регистрация отбрасывается, хост продолжает работать. Так же
    /// деградирует отрицательный или нечисловой период.
    ///
    /// Повторная регистрация той же identity — тихий no-op.
    pub fn subscribe(
        &self,
        callback: TickCallback,
        period: f32,
    ) {
        if Rc::strong_count(&callback) < 2 {
            let error = SchedulerError::UnreferenceableCallback;
            warn!(%error, "periodic subscription rejected");
            return;
        }
        if !period.is_finite() || period < 0.0 {
            let error = SchedulerError::InvalidPeriod(period);
            warn!(%error, "periodic subscription rejected");
            return;
        }

        let key = key_of(&callback);
        let mut state = self.inner.borrow_mut();
        if state.active.contains_key(&key) || state.pending_add_contains(key) {
            return;
        }
        state
            .pending
            .push_back(PendingOp::Subscribe { callback, period });
    }

    /// Ставит в очередь отписку callback'а.
    ///
    /// Всегда успешна; неизвестная identity — no-op. Если для одной
    /// identity в очереди стоят и добавление, и удаление, нетто-эффект
    /// определяется порядком постановки (FIFO drain).
    pub fn unsubscribe(
        &self,
        callback: &TickCallback,
    ) {
        self.inner
            .borrow_mut()
            .pending
            .push_back(PendingOp::Unsubscribe(key_of(callback)));
    }

    /// Продвигает всех подписчиков на `delta_time` секунд.
    ///
    /// Сначала полностью применяется очередь отложенных операций
    /// (единственная точка структурных изменений: отписка, поставленная
    /// на прошлом tick'е, срабатывает здесь — до продвижения времени).
    /// Затем каждому активному подписчику добавляется `delta_time`;
    /// дошедшие до периода вызываются синхронно со своим накопленным
    /// временем, и их счётчик сбрасывается в 0.
    ///
    /// Вызывается циклом хоста один раз за кадр.
    pub fn tick(
        &self,
        delta_time: f32,
    ) {
        // Due-список собирается под borrow, вызовы идут после его
        // снятия: callback'и могут свободно ставить в очередь
        // subscribe/unsubscribe.
        let due: Vec<(TickCallback, f32)> = {
            let mut state = self.inner.borrow_mut();
            state.drain_pending();

            let mut due = Vec::new();
            for record in state.active.values_mut() {
                record.elapsed += delta_time;
                if record.elapsed > record.period {
                    due.push((Rc::clone(&record.callback), record.elapsed));
                    record.elapsed = 0.0;
                }
            }
            due
        };

        for (callback, elapsed) in due {
            callback(elapsed);
        }
    }

    /// Останавливает планировщик: сбрасывает активных подписчиков и
    /// очередь операций, не вызывая ни одного callback'а. Используется
    /// при завершении цикла хоста.
    pub fn teardown(&self) {
        let mut state = self.inner.borrow_mut();
        state.active.clear();
        state.pending.clear();
    }

    /// Количество активных (зафиксированных) подписчиков; ожидающие в
    /// очереди не учитываются до ближайшего drain.
    pub fn active_count(&self) -> usize {
        self.inner.borrow().active.len()
    }
}
