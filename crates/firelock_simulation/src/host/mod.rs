//! Host engine boundary.
//!
//! Библиотека — scripting layer внутри host engine. Хост владеет physics,
//! rendering, input hardware и object lifetime; здесь только узкие контракты:
//! - `TerrainQuery` — terrain collision query + world bounds (resource)
//! - Позиционные компоненты (`WorldPos`, `BodyRadius`, `MuzzleOffset`)
//! - Capability markers (`Alive`, `ShootableTarget`)
//!
//! Координаты: пиксели, y вниз. Angle 0 = вверх, поэтому выстрел под углом θ
//! летит по `(sin θ, -cos θ)`.

use bevy::prelude::*;

/// Terrain collision contract хоста.
///
/// Резолвится заново на каждый запрос — terrain может меняться между тиками
/// (дырки от взрывов и т.д.), библиотека ничего не кэширует.
pub trait TerrainQuery: Send + Sync {
    /// Solid материал в пиксельной точке?
    fn is_solid_at(&self, pos: IVec2) -> bool;

    /// Границы мира (пиксели). Выстрелы клипятся к этим границам.
    fn bounds(&self) -> Rect;
}

/// Resource-обёртка над host terrain query.
#[derive(Resource)]
pub struct HostTerrain(pub Box<dyn TerrainQuery>);

impl HostTerrain {
    pub fn new(query: impl TerrainQuery + 'static) -> Self {
        Self(Box::new(query))
    }
}

/// Открытое поле без препятствий — default для headless тестов.
pub struct OpenField {
    pub width: f32,
    pub height: f32,
}

impl OpenField {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for OpenField {
    fn default() -> Self {
        // Достаточно большое поле чтобы дальнобойные тесты не упирались в края
        Self::new(10_000.0, 10_000.0)
    }
}

impl TerrainQuery for OpenField {
    fn is_solid_at(&self, _pos: IVec2) -> bool {
        false
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Позиция entity в мире (пиксели).
///
/// Хост синхронизирует её со своим физическим представлением объекта;
/// библиотека читает для стрельбы и двигает только свои ballistic projectiles.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct WorldPos(pub Vec2);

/// Радиус footprint'а entity (пиксели) для segment hit-checks
/// и arming distance правила (снаряд не бьёт стрелка пока не вылетел
/// за его собственный footprint).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct BodyRadius(pub f32);

impl Default for BodyRadius {
    fn default() -> Self {
        Self(4.0)
    }
}

/// Capability flag хоста: entity живое (попадает под hit-scan по умолчанию).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Alive;

/// Явный target-predicate marker: entity выбрано целью даже без `Alive`
/// (тренировочные мишени, разрушаемые объекты).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ShootableTarget;

/// Смещение дула относительно позиции оружия (пиксели).
///
/// Применяется как position translation, НЕ запекается в угол выстрела —
/// запекание Y-offset'а в угол ухудшает точность.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct MuzzleOffset(pub Vec2);
