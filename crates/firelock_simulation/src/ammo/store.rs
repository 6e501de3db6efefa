//! AmmoStore — keyed ammo counters with capacity bounds.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel для «неограниченной» capacity. Не настоящая бесконечность,
/// чтобы арифметика оставалась определённой.
pub const AMMO_INFINITE: i32 = i32::MAX / 2;

/// Идентификатор типа боеприпаса ("Bullets", "Shells", ...).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Reflect)]
pub struct AmmoId(pub String);

impl AmmoId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for AmmoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Счётчики боеприпасов entity (оружия или контейнера).
///
/// Инвариант: `0 <= count <= capacity` после каждой мутации. Записи
/// создаются лениво при первом обращении; отсутствующая capacity = sentinel.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct AmmoStore {
    counts: HashMap<AmmoId, i32>,
    capacities: HashMap<AmmoId, i32>,
}

impl AmmoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store с одним предзаполненным типом (удобно для спавна оружия).
    pub fn with(ammo: AmmoId, count: i32, capacity: i32) -> Self {
        let mut store = Self::new();
        store.set_capacity(ammo.clone(), capacity);
        store.set_ammo(&ammo, count);
        store
    }

    pub fn get_ammo(&self, ammo: &AmmoId) -> i32 {
        self.counts.get(ammo).copied().unwrap_or(0)
    }

    pub fn capacity(&self, ammo: &AmmoId) -> i32 {
        self.capacities.get(ammo).copied().unwrap_or(AMMO_INFINITE)
    }

    /// Выставить capacity. Отрицательная capacity — ошибка контракта.
    /// Существующий count поджимается под новую границу.
    pub fn set_capacity(&mut self, ammo: AmmoId, capacity: i32) {
        assert!(
            capacity >= 0,
            "negative ammo capacity requested for {}",
            ammo
        );
        let clamped = self.get_ammo(&ammo).min(capacity);
        self.counts.insert(ammo.clone(), clamped);
        self.capacities.insert(ammo, capacity);
    }

    /// Записать значение, clamped к `[0, capacity]`. Возвращает то, что
    /// реально записано.
    pub fn set_ammo(&mut self, ammo: &AmmoId, value: i32) -> i32 {
        let clamped = value.clamp(0, self.capacity(ammo));
        self.counts.insert(ammo.clone(), clamped);
        clamped
    }

    /// Применить дельту. Возвращает ФАКТИЧЕСКУЮ дельту:
    /// `set(get() + delta) - get_before`. Частичное применение — не ошибка,
    /// сигнал только в возврате.
    pub fn do_ammo(&mut self, ammo: &AmmoId, delta: i32) -> i32 {
        let before = self.get_ammo(ammo);
        let after = self.set_ammo(ammo, before.saturating_add(delta));
        after - before
    }

    /// Полный сброс (уничтожение владельца, очистка инвентаря).
    pub fn clear(&mut self) {
        self.counts.clear();
        self.capacities.clear();
    }

    pub fn is_full(&self, ammo: &AmmoId) -> bool {
        self.get_ammo(ammo) >= self.capacity(ammo)
    }
}
