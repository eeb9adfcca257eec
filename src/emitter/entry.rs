use std::rc::Rc;

use super::Emitter;

/// Слушатель события.
///
/// Получает эмиттер, через который идёт доставка (receiver-контекст),
/// и срез позиционных аргументов, переданных в `emit`. `Rc` даёт
/// стабильную идентичность: удаление по хэндлу сравнивает аллокации,
/// а не значения замыканий.
pub type Listener<T> = Rc<dyn Fn(&Emitter<T>, &[T])>;

/// Оборачивает замыкание в [`Listener`].
///
/// Сохранённый клон возвращаемого `Rc` — это хэндл для последующего
/// `off`.
pub fn listener<T, F>(f: F) -> Listener<T>
where
    F: Fn(&Emitter<T>, &[T]) + 'static,
{
    Rc::new(f)
}

/// Одна регистрация в реестре.
///
/// `origin` заполняется только путём `once`: это исходный слушатель,
/// который оборачивает `handler`, чтобы `off` по исходному хэндлу
/// находил обёртку. `id` уникален для каждой регистрации — по нему
/// обёртка `once` снимает ровно себя при срабатывании.
pub(crate) struct ListenerEntry<T> {
    pub(crate) id: u64,
    pub(crate) handler: Listener<T>,
    pub(crate) origin: Option<Listener<T>>,
}

impl<T> ListenerEntry<T> {
    /// Обычная регистрация через `on` / `add_listener`.
    pub(crate) fn direct(id: u64, handler: Listener<T>) -> Self {
        Self {
            id,
            handler,
            origin: None,
        }
    }

    /// Регистрация обёртки `once` с ссылкой на исходный слушатель.
    pub(crate) fn wrapped(id: u64, handler: Listener<T>, origin: Listener<T>) -> Self {
        Self {
            id,
            handler,
            origin: Some(origin),
        }
    }

    /// Подпадает ли запись под удаление по данному хэндлу:
    /// совпадает сам `handler` ИЛИ записанный `origin`.
    pub(crate) fn matches(&self, handle: &Listener<T>) -> bool {
        same_listener(&self.handler, handle)
            || self
                .origin
                .as_ref()
                .is_some_and(|origin| same_listener(origin, handle))
    }
}

/// Сравнение идентичности двух хэндлов слушателей.
///
/// Сравнивается только data-половина fat pointer'а: vtable может
/// дублироваться между единицами кодогенерации, и её учёт давал бы
/// ложные несовпадения.
pub(crate) fn same_listener<T>(a: &Listener<T>, b: &Listener<T>) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Проверяет, что клоны одного `Rc` считаются одним слушателем.
    #[test]
    fn test_same_listener_for_clones() {
        let a: Listener<i32> = listener(|_, _| {});
        let b = Rc::clone(&a);
        assert!(same_listener(&a, &b));
    }

    /// Проверяет, что два отдельных `Rc` с одинаковыми замыканиями —
    /// разные слушатели.
    #[test]
    fn test_distinct_allocations_differ() {
        let a: Listener<i32> = listener(|_, _| {});
        let b: Listener<i32> = listener(|_, _| {});
        assert!(!same_listener(&a, &b));
    }

    /// Проверяет, что запись совпадает по самому handler'у.
    #[test]
    fn test_entry_matches_by_handler() {
        let handle: Listener<i32> = listener(|_, _| {});
        let entry = ListenerEntry::direct(0, Rc::clone(&handle));
        assert!(entry.matches(&handle));
    }

    /// Проверяет, что обёрнутая запись совпадает по origin, но не
    /// по постороннему хэндлу.
    #[test]
    fn test_entry_matches_by_origin() {
        let origin: Listener<i32> = listener(|_, _| {});
        let wrapper: Listener<i32> = listener(|_, _| {});
        let entry = ListenerEntry::wrapped(1, wrapper, Rc::clone(&origin));
        assert!(entry.matches(&origin));

        let other: Listener<i32> = listener(|_, _| {});
        assert!(!entry.matches(&other));
    }

    /// Проверяет, что прямая запись без origin не совпадает по
    /// чужому хэндлу.
    #[test]
    fn test_direct_entry_has_no_origin() {
        let handle: Listener<i32> = listener(|_, _| {});
        let entry = ListenerEntry::direct(2, handle);
        assert!(entry.origin.is_none());
    }
}
