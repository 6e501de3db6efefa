//! Ballistic projectile entity.

use bevy::prelude::*;

use crate::firemode::{DamageKind, FireMode};
use crate::host::WorldPos;

/// Летящий снаряд. Движется на `velocity` пикселей за тик, hit-check —
/// непрерывный по пройденному за тик отрезку (быстрые снаряды не
/// туннелируют сквозь цели).
#[derive(Component, Debug, Clone)]
pub struct BallisticProjectile {
    pub shooter: Option<Entity>,
    pub weapon: Entity,
    pub damage: i32,
    pub damage_kind: DamageKind,
    /// Пиксели за тик.
    pub velocity: Vec2,
    /// Оставшиеся тики жизни (`range / speed` при спавне).
    pub lifetime: u32,
    /// Пройдено с момента спавна (пиксели) — arming distance.
    pub travelled: f32,
    pub never_hit_shooter: bool,
    /// Дополнительное исключение из hit-check (крепление оружия и т.п.).
    pub exclude: Option<Entity>,
    /// Footprint стрелка на момент выстрела.
    pub shooter_radius: f32,
}

/// Спавн снаряда для выстрела данного fire mode.
pub fn spawn_ballistic(
    commands: &mut Commands,
    origin: Vec2,
    direction: Vec2,
    mode: &FireMode,
    weapon: Entity,
    shooter: Option<Entity>,
    shooter_radius: f32,
) -> Entity {
    let speed = mode.projectile_speed.max(1.0);
    let lifetime = (mode.projectile_range / speed).round().max(1.0) as u32;
    commands
        .spawn((
            BallisticProjectile {
                shooter,
                weapon,
                damage: mode.damage,
                damage_kind: mode.damage_kind,
                velocity: direction * speed,
                lifetime,
                travelled: 0.0,
                never_hit_shooter: mode.never_hit_shooter,
                exclude: None,
                shooter_radius,
            },
            WorldPos(origin),
        ))
        .id()
}
