//! Подсистема событий (emitter).
//!
//! Этот модуль реализует синхронный внутрипроцессный event emitter:
//! регистрация слушателей по имени события, упорядоченная доставка
//! и управление подписками:
//!
//! - `entry`: тип слушателя, запись реестра и сравнение идентичности.
//! - `registry`: сам `Emitter` — регистрация, удаление, интроспекция
//!   и синхронная доставка по снапшоту.
//!
//! Публичный API переэкспортирует:
//! - `entry::{listener, Listener}`
//! - `registry::Emitter`

pub mod entry;
pub mod registry;

pub use entry::{listener, Listener};
pub use registry::Emitter;
