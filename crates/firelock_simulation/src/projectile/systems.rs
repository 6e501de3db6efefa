//! Движение ballistic снарядов.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::host::{HostTerrain, WorldPos};
use crate::projectile::components::BallisticProjectile;
use crate::projectile::events::{ProjectileHitTarget, ProjectileHitTerrain, ProjectileMissed};
use crate::projectile::resolver::{resolve_segment, SegmentHit, TargetQuery, TrajectorySegment};

/// Hit event writers (общие для hitscan-пути fire cycle и ballistic системы).
#[derive(SystemParam)]
pub struct HitWriters<'w> {
    pub target: EventWriter<'w, ProjectileHitTarget>,
    pub terrain: EventWriter<'w, ProjectileHitTerrain>,
    pub missed: EventWriter<'w, ProjectileMissed>,
}

/// System: один тик полёта каждого снаряда с непрерывным hit-check'ом по
/// пройденному отрезку.
pub fn advance_ballistic_projectiles(
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut BallisticProjectile, &mut WorldPos)>,
    targets: TargetQuery,
    terrain: Res<HostTerrain>,
    mut hits: HitWriters,
) {
    for (entity, mut projectile, mut pos) in projectiles.iter_mut() {
        let start = pos.0;
        let step = projectile.velocity;
        let segment = TrajectorySegment {
            start,
            dir: step.normalize_or_zero(),
            len: step.length(),
            shooter: projectile.shooter,
            shooter_radius: projectile.shooter_radius,
            never_hit_shooter: projectile.never_hit_shooter,
            exclude: projectile.exclude,
            travelled_before: projectile.travelled,
        };

        match resolve_segment(&segment, terrain.0.as_ref(), &targets) {
            SegmentHit::Target { target, at, t } => {
                hits.target.write(ProjectileHitTarget {
                    projectile: Some(entity),
                    weapon: projectile.weapon,
                    shooter: projectile.shooter,
                    target,
                    damage: projectile.damage,
                    damage_kind: projectile.damage_kind,
                    at,
                    distance: projectile.travelled + t,
                });
                commands.entity(entity).despawn();
            }
            SegmentHit::Terrain { at, .. } => {
                hits.terrain.write(ProjectileHitTerrain {
                    projectile: Some(entity),
                    weapon: projectile.weapon,
                    at,
                });
                commands.entity(entity).despawn();
            }
            SegmentHit::Clear => {
                let end = start + step;
                pos.0 = end;
                projectile.travelled += segment.len;
                projectile.lifetime = projectile.lifetime.saturating_sub(1);

                let out_of_bounds = !terrain.0.bounds().contains(end);
                if out_of_bounds || projectile.lifetime == 0 {
                    hits.missed.write(ProjectileMissed {
                        projectile: Some(entity),
                        weapon: projectile.weapon,
                        at: end,
                    });
                    commands.entity(entity).despawn();
                }
            }
        }
    }
}
