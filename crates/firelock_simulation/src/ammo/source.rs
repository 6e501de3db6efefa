//! AmmoSourceRouter — откуда оружие берёт патроны.
//!
//! Routing резолвится ЗАНОВО на каждый вызов: оружие может сменить
//! container link между вызовами (подобрали/выбросили магазин).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ammo::store::{AmmoId, AmmoStore, AMMO_INFINITE};

/// Где живут счётчики для данного типа боеприпаса.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum AmmoSource {
    /// Собственный store оружия (заряженный магазин).
    #[default]
    Local,
    /// Store привязанного container entity (носитель, ящик).
    /// Отсутствие линка при этом routing'е — ошибка контракта.
    Container,
    /// Патроны не считаются: чтение всегда «есть хотя бы одна единица»,
    /// запись принимается и клампится, нигде не сохраняется.
    Infinite,
}

/// Per-ammo-type routing config оружия. Отсутствующая запись = Local.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct AmmoSourceConfig {
    sources: HashMap<AmmoId, AmmoSource>,
}

impl AmmoSourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ammo: AmmoId, source: AmmoSource) -> Self {
        self.sources.insert(ammo, source);
        self
    }

    pub fn set_source(&mut self, ammo: AmmoId, source: AmmoSource) {
        self.sources.insert(ammo, source);
    }

    pub fn source_for(&self, ammo: &AmmoId) -> AmmoSource {
        self.sources.get(ammo).copied().unwrap_or_default()
    }
}

/// Линк на container entity, которому делегируются Container-routed вызовы.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct AmmoContainerLink(pub Option<Entity>);

/// Какой entity держит store для вызова. `None` = Infinite (store нет).
fn resolve_store_entity(
    weapon: Entity,
    config: &AmmoSourceConfig,
    link: Option<&AmmoContainerLink>,
    ammo: &AmmoId,
) -> Option<Entity> {
    match config.source_for(ammo) {
        AmmoSource::Local => Some(weapon),
        AmmoSource::Container => {
            let container = link.and_then(|l| l.0);
            match container {
                Some(entity) => Some(entity),
                None => panic!(
                    "ammo source for {} routed to container, but no container is linked",
                    ammo
                ),
            }
        }
        AmmoSource::Infinite => None,
    }
}

/// Routed `getAmmo`.
pub fn routed_get(
    stores: &mut Query<&mut AmmoStore>,
    weapon: Entity,
    config: &AmmoSourceConfig,
    link: Option<&AmmoContainerLink>,
    ammo: &AmmoId,
) -> i32 {
    match resolve_store_entity(weapon, config, link, ammo) {
        Some(holder) => stores
            .get_mut(holder)
            .map(|store| store.get_ammo(ammo))
            .unwrap_or(0),
        None => AMMO_INFINITE,
    }
}

/// Routed `setAmmo`. Возвращает реально записанное значение.
pub fn routed_set(
    stores: &mut Query<&mut AmmoStore>,
    weapon: Entity,
    config: &AmmoSourceConfig,
    link: Option<&AmmoContainerLink>,
    ammo: &AmmoId,
    value: i32,
) -> i32 {
    match resolve_store_entity(weapon, config, link, ammo) {
        Some(holder) => match stores.get_mut(holder) {
            Ok(mut store) => store.set_ammo(ammo, value),
            Err(_) => 0,
        },
        None => value.clamp(0, AMMO_INFINITE),
    }
}

/// Routed `doAmmo`. Возвращает фактическую дельту.
pub fn routed_do(
    stores: &mut Query<&mut AmmoStore>,
    weapon: Entity,
    config: &AmmoSourceConfig,
    link: Option<&AmmoContainerLink>,
    ammo: &AmmoId,
    delta: i32,
) -> i32 {
    match resolve_store_entity(weapon, config, link, ammo) {
        Some(holder) => match stores.get_mut(holder) {
            Ok(mut store) => store.do_ammo(ammo, delta),
            Err(_) => 0,
        },
        None => {
            // Infinite: считаем от sentinel, ничего не сохраняем
            let before = AMMO_INFINITE;
            before.saturating_add(delta).clamp(0, AMMO_INFINITE) - before
        }
    }
}
