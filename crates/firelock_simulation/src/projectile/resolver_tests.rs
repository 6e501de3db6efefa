//! Tests for trajectory resolution.

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;
    use bevy::prelude::*;

    use crate::firemode::FireMode;
    use crate::host::{
        Alive, BodyRadius, HostTerrain, OpenField, ShootableTarget, TerrainQuery, WorldPos,
    };
    use crate::projectile::components::{spawn_ballistic, BallisticProjectile};
    use crate::projectile::events::{
        ProjectileHitTarget, ProjectileHitTerrain, ProjectileMissed,
    };
    use crate::projectile::resolver::{clip_to_bounds, resolve_hitscan, SegmentHit, TargetQuery};
    use crate::projectile::systems::{advance_ballistic_projectiles, HitWriters};

    /// Сплошная стена правее x.
    struct WallAt {
        x: i32,
    }

    impl TerrainQuery for WallAt {
        fn is_solid_at(&self, pos: IVec2) -> bool {
            pos.x >= self.x
        }

        fn bounds(&self) -> Rect {
            Rect::new(0.0, 0.0, 1000.0, 1000.0)
        }
    }

    fn hitscan(
        world: &mut World,
        terrain: impl TerrainQuery + 'static,
        origin: Vec2,
        dir: Vec2,
        range: f32,
        shooter: Option<Entity>,
        never_hit_shooter: bool,
    ) -> SegmentHit {
        world
            .run_system_once(move |targets: TargetQuery| {
                resolve_hitscan(
                    origin,
                    dir,
                    range,
                    shooter,
                    8.0,
                    never_hit_shooter,
                    None,
                    &terrain,
                    &targets,
                )
            })
            .unwrap()
    }

    #[test]
    fn test_hitscan_hits_nearest_target_not_first_found() {
        let mut world = World::new();
        // Дальняя цель заспавнена раньше ближней
        let far = world
            .spawn((WorldPos(Vec2::new(300.0, 500.0)), BodyRadius(10.0), Alive))
            .id();
        let near = world
            .spawn((WorldPos(Vec2::new(200.0, 500.0)), BodyRadius(10.0), Alive))
            .id();

        let outcome = hitscan(
            &mut world,
            OpenField::default(),
            Vec2::new(100.0, 500.0),
            Vec2::X,
            600.0,
            None,
            false,
        );

        match outcome {
            SegmentHit::Target { target, t, .. } => {
                assert_eq!(target, near);
                assert_ne!(target, far);
                // Вход в окружность цели: 100 - радиус
                assert!((t - 90.0).abs() < 0.01);
            }
            other => panic!("expected target hit, got {:?}", other),
        }
    }

    #[test]
    fn test_hitscan_stops_at_terrain_before_target() {
        let mut world = World::new();
        world.spawn((WorldPos(Vec2::new(300.0, 500.0)), BodyRadius(10.0), Alive));

        let outcome = hitscan(
            &mut world,
            WallAt { x: 150 },
            Vec2::new(100.0, 500.0),
            Vec2::X,
            600.0,
            None,
            false,
        );

        match outcome {
            SegmentHit::Terrain { at, .. } => {
                assert!((at.x - 150.0).abs() <= 1.0);
            }
            other => panic!("expected terrain hit, got {:?}", other),
        }
    }

    #[test]
    fn test_hitscan_misses_when_nothing_on_line() {
        let mut world = World::new();
        // Цель в стороне от линии выстрела
        world.spawn((WorldPos(Vec2::new(200.0, 530.0)), BodyRadius(10.0), Alive));

        let outcome = hitscan(
            &mut world,
            OpenField::default(),
            Vec2::new(100.0, 500.0),
            Vec2::X,
            600.0,
            None,
            false,
        );
        assert_eq!(outcome, SegmentHit::Clear);
    }

    #[test]
    fn test_range_clipped_to_world_bounds() {
        let bounds = Rect::new(0.0, 0.0, 1000.0, 1000.0);
        let len = clip_to_bounds(Vec2::new(900.0, 500.0), Vec2::X, 500.0, bounds);
        assert!((99.0..=100.0).contains(&len));

        // Внутри границ — длина не меняется
        let len = clip_to_bounds(Vec2::new(100.0, 500.0), Vec2::X, 200.0, bounds);
        assert_eq!(len, 200.0);
    }

    #[test]
    fn test_shooter_protected_inside_arming_distance() {
        let mut world = World::new();
        let shooter = world
            .spawn((WorldPos(Vec2::new(100.0, 500.0)), BodyRadius(8.0), Alive))
            .id();

        // Выстрел из центра собственного footprint'а — себя не задевает
        let outcome = hitscan(
            &mut world,
            OpenField::default(),
            Vec2::new(100.0, 500.0),
            Vec2::X,
            600.0,
            Some(shooter),
            false,
        );
        assert_eq!(outcome, SegmentHit::Clear);
    }

    #[test]
    fn test_shooter_hittable_beyond_arming_distance() {
        let mut world = World::new();
        // Стрелок down-range от точки выстрела (рикошетный сценарий)
        let shooter = world
            .spawn((WorldPos(Vec2::new(200.0, 500.0)), BodyRadius(8.0), Alive))
            .id();

        let outcome = hitscan(
            &mut world,
            OpenField::default(),
            Vec2::new(100.0, 500.0),
            Vec2::X,
            600.0,
            Some(shooter),
            false,
        );
        assert!(matches!(outcome, SegmentHit::Target { target, .. } if target == shooter));

        // never_hit_shooter исключает стрелка безусловно
        let outcome = hitscan(
            &mut world,
            OpenField::default(),
            Vec2::new(100.0, 500.0),
            Vec2::X,
            600.0,
            Some(shooter),
            true,
        );
        assert_eq!(outcome, SegmentHit::Clear);
    }

    #[test]
    fn test_only_alive_or_shootable_entities_are_targets() {
        let mut world = World::new();
        // Просто позиция, без capability markers
        world.spawn((WorldPos(Vec2::new(200.0, 500.0)), BodyRadius(10.0)));

        let outcome = hitscan(
            &mut world,
            OpenField::default(),
            Vec2::new(100.0, 500.0),
            Vec2::X,
            600.0,
            None,
            false,
        );
        assert_eq!(outcome, SegmentHit::Clear);

        // ShootableTarget без Alive — поражаем (мишень)
        let dummy = world
            .spawn((
                WorldPos(Vec2::new(200.0, 500.0)),
                BodyRadius(10.0),
                ShootableTarget,
            ))
            .id();
        let outcome = hitscan(
            &mut world,
            OpenField::default(),
            Vec2::new(100.0, 500.0),
            Vec2::X,
            600.0,
            None,
            false,
        );
        assert!(matches!(outcome, SegmentHit::Target { target, .. } if target == dummy));
    }

    fn ballistic_world() -> World {
        let mut world = World::new();
        world.insert_resource(HostTerrain::new(OpenField::default()));
        world.init_resource::<Events<ProjectileHitTarget>>();
        world.init_resource::<Events<ProjectileHitTerrain>>();
        world.init_resource::<Events<ProjectileMissed>>();
        world
    }

    fn musket_mode() -> FireMode {
        FireMode {
            projectile_speed: 30.0,
            projectile_range: 900.0,
            ..FireMode::musket_single()
        }
    }

    #[test]
    fn test_ballistic_projectile_reaches_target_over_ticks() {
        let mut world = ballistic_world();
        let weapon = world.spawn_empty().id();
        let target = world
            .spawn((WorldPos(Vec2::new(600.0, 500.0)), BodyRadius(10.0), Alive))
            .id();

        let projectile = world
            .run_system_once(move |mut commands: Commands| {
                spawn_ballistic(
                    &mut commands,
                    Vec2::new(100.0, 500.0),
                    Vec2::X,
                    &musket_mode(),
                    weapon,
                    None,
                    0.0,
                )
            })
            .unwrap();

        // 490px до окружности цели при 30px/тик — попадание на 17-м тике
        for _ in 0..16 {
            world.run_system_once(advance_ballistic_projectiles).unwrap();
            assert!(world.get_entity(projectile).is_ok());
        }
        world.run_system_once(advance_ballistic_projectiles).unwrap();

        let hits: Vec<ProjectileHitTarget> = world
            .resource_mut::<Events<ProjectileHitTarget>>()
            .drain()
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, target);
        assert_eq!(hits[0].projectile, Some(projectile));
        assert!((hits[0].distance - 490.0).abs() < 0.01);
        assert!(world.get_entity(projectile).is_err());
    }

    #[test]
    fn test_ballistic_projectile_expires_as_miss() {
        let mut world = ballistic_world();
        let weapon = world.spawn_empty().id();

        let projectile = world
            .run_system_once(move |mut commands: Commands| {
                spawn_ballistic(
                    &mut commands,
                    Vec2::new(100.0, 500.0),
                    Vec2::X,
                    &musket_mode(),
                    weapon,
                    None,
                    0.0,
                )
            })
            .unwrap();

        // lifetime = 900 / 30 = 30 тиков
        for _ in 0..30 {
            world.run_system_once(advance_ballistic_projectiles).unwrap();
        }

        let missed = world
            .resource_mut::<Events<ProjectileMissed>>()
            .drain()
            .count();
        assert_eq!(missed, 1);
        assert!(world.get_entity(projectile).is_err());
        // Снаряд не задел того, чего нет
        assert_eq!(
            world
                .resource_mut::<Events<ProjectileHitTarget>>()
                .drain()
                .count(),
            0
        );
    }

    #[test]
    fn test_ballistic_projectile_stops_at_terrain() {
        let mut world = ballistic_world();
        world.insert_resource(HostTerrain::new(WallAt { x: 250 }));
        let weapon = world.spawn_empty().id();

        world
            .run_system_once(move |mut commands: Commands| {
                spawn_ballistic(
                    &mut commands,
                    Vec2::new(100.0, 500.0),
                    Vec2::X,
                    &musket_mode(),
                    weapon,
                    None,
                    0.0,
                );
            })
            .unwrap();

        for _ in 0..6 {
            world.run_system_once(advance_ballistic_projectiles).unwrap();
        }

        let hits: Vec<ProjectileHitTerrain> = world
            .resource_mut::<Events<ProjectileHitTerrain>>()
            .drain()
            .collect();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].at.x - 250.0).abs() <= 1.0);
    }
}
