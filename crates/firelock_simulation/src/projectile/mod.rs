//! Projectile resolution — hitscan и ballistic снаряды.
//!
//! - `resolver` — segment-геометрия: bounds clip, terrain march, target scan
//! - `components` — ballistic projectile entity
//! - `systems` — полёт снарядов
//! - `events` — hit/miss события для хоста

pub mod components;
pub mod events;
pub mod resolver;
pub mod systems;

#[cfg(test)]
mod resolver_tests;

pub use components::{spawn_ballistic, BallisticProjectile};
pub use events::{ProjectileHitTarget, ProjectileHitTerrain, ProjectileMissed};
pub use resolver::{
    clip_to_bounds, resolve_hitscan, resolve_segment, segment_end, SegmentHit, TargetQuery,
    TrajectorySegment,
};
pub use systems::{advance_ballistic_projectiles, HitWriters};
