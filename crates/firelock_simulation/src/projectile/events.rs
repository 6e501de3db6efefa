//! Projectile resolution events — хост применяет урон и эффекты сам.

use bevy::prelude::*;

use crate::firemode::DamageKind;

/// Снаряд поразил цель. Урон НЕ применяется библиотекой: хост владеет
/// здоровьем и решает, что значит попадание.
#[derive(Event, Debug, Clone)]
pub struct ProjectileHitTarget {
    /// Entity снаряда; `None` для hitscan.
    pub projectile: Option<Entity>,
    pub weapon: Entity,
    pub shooter: Option<Entity>,
    pub target: Entity,
    pub damage: i32,
    pub damage_kind: DamageKind,
    /// Точка попадания (пиксели).
    pub at: Vec2,
    /// Пройденная снарядом дистанция до попадания.
    pub distance: f32,
}

/// Снаряд упёрся в terrain.
#[derive(Event, Debug, Clone)]
pub struct ProjectileHitTerrain {
    pub projectile: Option<Entity>,
    pub weapon: Entity,
    pub at: Vec2,
}

/// Снаряд исчерпал дальность/время жизни без попадания.
#[derive(Event, Debug, Clone)]
pub struct ProjectileMissed {
    pub projectile: Option<Entity>,
    pub weapon: Entity,
    pub at: Vec2,
}
