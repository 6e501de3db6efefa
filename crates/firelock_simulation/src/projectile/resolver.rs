//! Trajectory resolution — общее ядро для hitscan и ballistic снарядов.
//!
//! Геометрия на ОТРЕЗКАХ, не на дискретных точках: отрезок клипится к
//! границам мира, маршируется по terrain попиксельно, цели проверяются
//! segment-circle пересечением с выбором БЛИЖАЙШЕЙ (не первой найденной).

use bevy::prelude::*;

use crate::host::{Alive, BodyRadius, ShootableTarget, TerrainQuery, WorldPos};
use crate::projectile::components::BallisticProjectile;

/// Запрос по целям, которые может поразить снаряд. Снаряды сами по себе
/// целями не являются.
pub type TargetQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static WorldPos,
        Option<&'static BodyRadius>,
        Has<Alive>,
        Has<ShootableTarget>,
    ),
    Without<BallisticProjectile>,
>;

/// Один проверяемый отрезок траектории.
#[derive(Clone, Copy, Debug)]
pub struct TrajectorySegment {
    pub start: Vec2,
    /// Единичное направление.
    pub dir: Vec2,
    /// Длина отрезка (пиксели).
    pub len: f32,
    pub shooter: Option<Entity>,
    /// Footprint стрелка — arming distance: стрелок не может быть поражён
    /// пока снаряд не прошёл больше этого расстояния.
    pub shooter_radius: f32,
    pub never_hit_shooter: bool,
    pub exclude: Option<Entity>,
    /// Дистанция, пройденная ДО начала отрезка (0 для hitscan).
    pub travelled_before: f32,
}

/// Результат проверки отрезка.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SegmentHit {
    Target {
        target: Entity,
        at: Vec2,
        /// Дистанция попадания от начала отрезка.
        t: f32,
    },
    Terrain {
        at: Vec2,
        t: f32,
    },
    /// Отрезок пройден целиком без контакта.
    Clear,
}

/// Укоротить отрезок до границ мира. Линейное поджатие по пикселю — те же
/// шаги, что у terrain march, конец отрезка всегда внутри bounds.
pub fn clip_to_bounds(start: Vec2, dir: Vec2, len: f32, bounds: Rect) -> f32 {
    let mut len = len;
    while len > 0.0 && !bounds.contains(start + dir * len) {
        len -= 1.0;
    }
    len.max(0.0)
}

/// Первый solid пиксель вдоль отрезка: дистанция от его начала, если есть.
fn march_to_terrain(
    start: Vec2,
    dir: Vec2,
    len: f32,
    terrain: &dyn TerrainQuery,
) -> Option<f32> {
    let steps = len.ceil() as i32;
    for step in 1..=steps {
        let t = (step as f32).min(len);
        let point = start + dir * t;
        if terrain.is_solid_at(point.as_ivec2()) {
            return Some(t);
        }
    }
    None
}

/// Ближайшая поражаемая цель на отрезке длиной `limit`.
fn nearest_target(
    segment: &TrajectorySegment,
    limit: f32,
    targets: &TargetQuery,
) -> Option<(Entity, f32)> {
    let mut nearest: Option<(Entity, f32)> = None;

    for (entity, pos, radius, alive, shootable) in targets.iter() {
        if !alive && !shootable {
            continue;
        }
        if Some(entity) == segment.exclude {
            continue;
        }
        if Some(entity) == segment.shooter && segment.never_hit_shooter {
            continue;
        }

        let radius = radius.map_or(BodyRadius::default().0, |r| r.0);
        let to_center = pos.0 - segment.start;
        let along = to_center.dot(segment.dir);
        let perp_sq = to_center.length_squared() - along * along;
        let radius_sq = radius * radius;
        if perp_sq > radius_sq {
            continue;
        }

        // Точка входа в окружность цели; отрезок мог начаться уже внутри
        let enter = (along - (radius_sq - perp_sq).sqrt()).max(0.0);
        if enter > limit {
            continue;
        }

        // Arming distance: стрелок поражаем только когда снаряд вылетел
        // за его собственный footprint
        if Some(entity) == segment.shooter
            && segment.travelled_before + enter <= segment.shooter_radius
        {
            continue;
        }

        if nearest.map_or(true, |(_, best)| enter < best) {
            nearest = Some((entity, enter));
        }
    }

    nearest
}

/// Полная проверка отрезка: цели в порядке дистанции, затем terrain.
pub fn resolve_segment(
    segment: &TrajectorySegment,
    terrain: &dyn TerrainQuery,
    targets: &TargetQuery,
) -> SegmentHit {
    let terrain_t = march_to_terrain(segment.start, segment.dir, segment.len, terrain);
    let limit = terrain_t.unwrap_or(segment.len);

    if let Some((target, t)) = nearest_target(segment, limit, targets) {
        return SegmentHit::Target {
            target,
            at: segment.start + segment.dir * t,
            t,
        };
    }
    if let Some(t) = terrain_t {
        return SegmentHit::Terrain {
            at: segment.start + segment.dir * t,
            t,
        };
    }
    SegmentHit::Clear
}

/// Hitscan выстрел: отрезок `origin → origin + dir × range`, клипнутый к
/// границам мира, резолвится синхронно.
#[allow(clippy::too_many_arguments)]
pub fn resolve_hitscan(
    origin: Vec2,
    dir: Vec2,
    range: f32,
    shooter: Option<Entity>,
    shooter_radius: f32,
    never_hit_shooter: bool,
    exclude: Option<Entity>,
    terrain: &dyn TerrainQuery,
    targets: &TargetQuery,
) -> SegmentHit {
    let len = clip_to_bounds(origin, dir, range, terrain.bounds());
    let segment = TrajectorySegment {
        start: origin,
        dir,
        len,
        shooter,
        shooter_radius,
        never_hit_shooter,
        exclude,
        travelled_before: 0.0,
    };
    resolve_segment(&segment, terrain, targets)
}

/// Конец отрезка (точка промаха для `Clear`).
pub fn segment_end(start: Vec2, dir: Vec2, len: f32) -> Vec2 {
    start + dir * len
}
