use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt,
    rc::Rc,
};

use tracing::trace;

use super::entry::{Listener, ListenerEntry};

/// Синхронный event emitter.
///
/// Поддерживает:
/// - Регистрацию слушателей по имени события (`on` / `add_listener`)
/// - Одноразовые слушатели (`once`) с удалением по исходному хэндлу
/// - Доставку в порядке регистрации по снапшоту (`emit`)
/// - Автоматическое удаление пустых событий из реестра
///
/// Все операции возвращают `&Self` для чейнинга. Тип однопоточный по
/// контракту: `Rc`/`RefCell` делают его `!Send`/`!Sync`.
pub struct Emitter<T> {
    /// События → упорядоченные записи слушателей.
    registry: RefCell<HashMap<String, Vec<ListenerEntry<T>>>>,
    /// Счётчик id регистраций.
    next_id: Cell<u64>,
}

impl<T> Emitter<T> {
    /// Создаёт новый `Emitter` с пустым реестром.
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        }
    }

    /// Регистрирует слушатель на событие.
    ///
    /// Слушатель дописывается в конец последовательности; порядок
    /// регистрации — это порядок доставки. Повторная регистрация того
    /// же хэндла допустима и даёт по одному вызову на регистрацию.
    pub fn on(&self, event: impl Into<String>, handle: Listener<T>) -> &Self {
        let event = event.into();
        trace!(event = %event, "listener registered");
        let id = self.allocate_id();
        self.insert(event, ListenerEntry::direct(id, handle));
        self
    }

    /// Алиас для [`Emitter::on`].
    pub fn add_listener(&self, event: impl Into<String>, handle: Listener<T>) -> &Self {
        self.on(event, handle)
    }

    /// Регистрирует одноразовый слушатель.
    ///
    /// В реестр попадает обёртка: при первом вызове она снимает свою
    /// регистрацию (до вызова исходного слушателя) и передаёт исходному
    /// тот же эмиттер и тот же срез аргументов. Запись хранит ссылку на
    /// исходный хэндл, поэтому `off(event, &handle)` по исходному
    /// хэндлу находит и удаляет обёртку.
    ///
    /// Реентерабельный `emit` из самого слушателя обёртку уже не
    /// увидит; копии, снапшотнутые до срабатывания, ещё доставляются.
    pub fn once(&self, event: impl Into<String>, handle: Listener<T>) -> &Self
    where
        T: 'static,
    {
        let event = event.into();
        trace!(event = %event, "one-shot listener registered");
        let id = self.allocate_id();
        let origin = Rc::clone(&handle);
        let wrapper: Listener<T> = {
            let event = event.clone();
            Rc::new(move |emitter: &Emitter<T>, args: &[T]| {
                // Снимаем ровно эту регистрацию, не трогая соседние
                // регистрации того же исходного слушателя.
                emitter.detach(&event, id);
                handle(emitter, args);
            })
        };
        self.insert(event, ListenerEntry::wrapped(id, wrapper, origin));
        self
    }

    /// Удаляет все регистрации данного хэндла на событие.
    ///
    /// Совпадением считается сам handler записи либо её origin — так
    /// `once`-регистрация удаляется по исходному хэндлу, хотя в реестре
    /// лежит обёртка. Удаляются все совпадения за один вызов. Для
    /// неизвестного события — no-op.
    pub fn off(&self, event: &str, handle: &Listener<T>) -> &Self {
        let mut registry = self.registry.borrow_mut();
        if let Some(entries) = registry.get_mut(event) {
            let before = entries.len();
            entries.retain(|entry| !entry.matches(handle));
            let removed = before - entries.len();
            if removed > 0 {
                trace!(event = %event, removed, "listeners removed");
            }
            if entries.is_empty() {
                registry.remove(event);
            }
        }
        self
    }

    /// Снимает все регистрации: для `Some(event)` — одного события,
    /// для `None` — всего реестра. Пустых ключей после вызова не
    /// остаётся.
    pub fn off_all(&self, event: Option<&str>) -> &Self {
        let mut registry = self.registry.borrow_mut();
        match event {
            Some(name) => {
                if registry.remove(name).is_some() {
                    trace!(event = %name, "event cleared");
                }
            }
            None => {
                registry.clear();
                trace!("registry cleared");
            }
        }
        self
    }

    /// Возвращает копию последовательности хэндлов события.
    ///
    /// Для неизвестного события — пустой `Vec`. Мутация возвращённого
    /// `Vec` на реестр не влияет; `emit` в любом случае работает по
    /// собственному снапшоту.
    pub fn listeners(&self, event: &str) -> Vec<Listener<T>> {
        self.registry
            .borrow()
            .get(event)
            .map(|entries| entries.iter().map(|entry| Rc::clone(&entry.handler)).collect())
            .unwrap_or_default()
    }

    /// Имена событий, на которые сейчас есть хотя бы один слушатель.
    pub fn event_names(&self) -> Vec<String> {
        self.registry.borrow().keys().cloned().collect()
    }

    /// Количество слушателей события (0 для неизвестного).
    pub fn listener_count(&self, event: &str) -> usize {
        self.registry
            .borrow()
            .get(event)
            .map_or(0, |entries| entries.len())
    }

    /// Есть ли хотя бы один слушатель события.
    pub fn has_listeners(&self, event: &str) -> bool {
        self.registry.borrow().contains_key(event)
    }

    /// Пуст ли весь реестр.
    pub fn is_empty(&self) -> bool {
        self.registry.borrow().is_empty()
    }

    /// Синхронно доставляет событие всем слушателям в порядке
    /// регистрации.
    ///
    /// Перед первым вызовом снимается снапшот последовательности, и
    /// вся доставка идёт по нему: слушатель, который во время своего
    /// выполнения вызывает `on` / `off` / `once`, влияет только на
    /// будущие `emit`; слушатель, удалённый соседом в этом же проходе,
    /// всё равно получает вызов, если попал в снапшот.
    ///
    /// Паники слушателей не перехватываются: раскрутка прерывает
    /// остаток прохода и уходит к вызывающему `emit`.
    pub fn emit(&self, event: &str, args: &[T]) -> &Self {
        let snapshot: Option<Vec<Listener<T>>> = self
            .registry
            .borrow()
            .get(event)
            .map(|entries| entries.iter().map(|entry| Rc::clone(&entry.handler)).collect());
        let Some(snapshot) = snapshot else {
            return self;
        };
        trace!(event = %event, listeners = snapshot.len(), "dispatching");
        for handler in &snapshot {
            handler(self, args);
        }
        self
    }

    /// Снимает одну регистрацию по её id. Используется обёрткой `once`;
    /// повторный вызов — no-op.
    pub(crate) fn detach(&self, event: &str, id: u64) {
        let mut registry = self.registry.borrow_mut();
        if let Some(entries) = registry.get_mut(event) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                registry.remove(event);
            }
        }
    }

    fn insert(&self, event: String, entry: ListenerEntry<T>) {
        let mut registry = self.registry.borrow_mut();
        registry.entry(event).or_default().push(entry);
    }

    fn allocate_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Сами хэндлы непечатаемы; показываем имена и количества.
        let registry = self.registry.borrow();
        f.debug_map()
            .entries(registry.iter().map(|(event, entries)| (event, entries.len())))
            .finish()
    }
}
