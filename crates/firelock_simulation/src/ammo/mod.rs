//! Ammunition bookkeeping.
//!
//! - `store` — per-entity счётчики ammo-type → count с capacity bounds
//! - `source` — routing: где живут патроны (Local / Container / Infinite)
//!
//! Все мутации идут через `set_ammo`/`do_ammo` и возвращают ФАКТИЧЕСКИ
//! применённую величину — clamping к `[0, capacity]` происходит внутри,
//! caller обязан смотреть на возврат, а не на запрошенную дельту.

pub mod source;
pub mod store;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod source_tests;

pub use source::{routed_do, routed_get, routed_set, AmmoContainerLink, AmmoSource, AmmoSourceConfig};
pub use store::{AmmoId, AmmoStore, AMMO_INFINITE};
