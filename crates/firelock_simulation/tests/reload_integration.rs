//! Staged reload integration tests
//!
//! Сценарий «магазинная перезарядка с контейнером»: стадии, ammo totals,
//! resumability после отмены.

use bevy::prelude::*;
use firelock_simulation::reload::plans;
use firelock_simulation::*;

fn test_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(FirelockPlugin);
    app
}

fn tick(app: &mut App, n: u32) {
    for _ in 0..n {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

fn bullets() -> AmmoId {
    AmmoId::new("Bullets")
}

fn drain_stage_starts(app: &mut App) -> Vec<&'static str> {
    app.world_mut()
        .resource_mut::<Events<ReloadStageEvent>>()
        .drain()
        .filter(|e| e.phase == StagePhase::Start)
        .map(|e| e.stage)
        .collect()
}

fn ammo_of(app: &App, entity: Entity) -> i32 {
    app.world()
        .get::<AmmoStore>(entity)
        .unwrap()
        .get_ammo(&bullets())
}

struct Setup {
    user: Entity,
    container: Entity,
    weapon: Entity,
}

/// Оружие с магазином 5/10, контейнер с 14 патронами, камора дослана.
fn magazine_setup(app: &mut App) -> Setup {
    let container = app
        .world_mut()
        .spawn(AmmoStore::with(bullets(), 14, 50))
        .id();
    let user = app
        .world_mut()
        .spawn((WorldPos(Vec2::new(500.0, 500.0)), BodyRadius(8.0), Alive))
        .id();
    let weapon = app
        .world_mut()
        .spawn((
            FireCycleState::default(),
            FireModeCatalog::new().with(FireMode::rifle_auto()),
            AmmoStore::with(bullets(), 5, 10),
            ReloadState::default(),
            plans::magazine(),
            AmmoChamber {
                enabled: true,
                loaded: true,
            },
            AmmoContainerLink(Some(container)),
            WorldPos(Vec2::new(500.0, 500.0)),
        ))
        .id();
    Setup {
        user,
        container,
        weapon,
    }
}

#[test]
fn test_magazine_reload_stage_sequence_and_totals() {
    let mut app = test_app(42);
    let setup = magazine_setup(&mut app);

    app.world_mut().send_event(ReloadRequest {
        weapon: setup.weapon,
        user: setup.user,
    });
    // Полный план: 5+8+6+6+10+5+4 тиков
    tick(&mut app, 45);

    assert_eq!(
        drain_stage_starts(&mut app),
        vec![
            "Prepare",
            "EjectAmmo",
            "StashStart",
            "StashFinish",
            "InsertAmmo",
            "Close",
            "ReadyWeapon",
        ]
    );
    let finished: Vec<ReloadFinished> = app
        .world_mut()
        .resource_mut::<Events<ReloadFinished>>()
        .drain()
        .collect();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].weapon, setup.weapon);

    // Старый магазин (5) высыпан в контейнер, полный (10) набран из него
    assert_eq!(ammo_of(&app, setup.weapon), 10);
    assert_eq!(ammo_of(&app, setup.container), 9);
}

#[test]
fn test_cancelled_reload_restarts_from_derived_stage() {
    let mut app = test_app(42);
    let setup = magazine_setup(&mut app);

    app.world_mut().send_event(ReloadRequest {
        weapon: setup.weapon,
        user: setup.user,
    });
    // Prepare(5) + EjectAmmo(8) полностью + кусок StashStart
    tick(&mut app, 16);
    assert_eq!(ammo_of(&app, setup.weapon), 0);
    assert_eq!(ammo_of(&app, setup.container), 19);

    app.world_mut()
        .get_mut::<ReloadState>(setup.weapon)
        .unwrap()
        .request_cancel(&bullets(), true);
    tick(&mut app, 1);
    let cancelled = app
        .world_mut()
        .resource_mut::<Events<ReloadCancelled>>()
        .drain()
        .count();
    assert_eq!(cancelled, 1);
    drain_stage_starts(&mut app);

    // Повторный запрос: магазин уже пуст, стадия извлечения пропускается
    app.world_mut().send_event(ReloadRequest {
        weapon: setup.weapon,
        user: setup.user,
    });
    tick(&mut app, 25);

    assert_eq!(
        drain_stage_starts(&mut app),
        vec!["Prepare", "InsertAmmo", "Close", "ReadyWeapon"]
    );
    assert_eq!(ammo_of(&app, setup.weapon), 10);
    assert_eq!(ammo_of(&app, setup.container), 9);
}

#[test]
fn test_concurrent_reload_channels_per_ammo_type() {
    let mut app = test_app(42);
    let shells = AmmoId::new("Shells");

    let mut reservoir_store = AmmoStore::new();
    reservoir_store.set_capacity(bullets(), 100);
    reservoir_store.set_ammo(&bullets(), 30);
    reservoir_store.set_capacity(shells.clone(), 100);
    reservoir_store.set_ammo(&shells, 12);
    let user = app
        .world_mut()
        .spawn((
            WorldPos(Vec2::new(500.0, 500.0)),
            BodyRadius(8.0),
            Alive,
            reservoir_store,
        ))
        .id();

    let mut weapon_store = AmmoStore::new();
    weapon_store.set_capacity(bullets(), 20);
    weapon_store.set_capacity(shells.clone(), 6);
    let underbarrel = FireMode {
        name: "Underbarrel".into(),
        ammo_id: shells.clone(),
        ..FireMode::default()
    };
    let weapon = app
        .world_mut()
        .spawn((
            FireCycleState::default(),
            FireModeCatalog::new()
                .with(FireMode::rifle_auto())
                .with(underbarrel),
            weapon_store,
            ReloadState::default(),
            plans::flat(),
            WorldPos(Vec2::new(500.0, 500.0)),
        ))
        .id();

    // Канал по основному типу
    app.world_mut().send_event(ReloadRequest { weapon, user });
    tick(&mut app, 5);
    // Переключаемся и стартуем второй канал — первый продолжает идти
    {
        let flags = ModeFlags::default();
        let mut catalog = app.world_mut().get_mut::<FireModeCatalog>(weapon).unwrap();
        assert!(catalog.schedule_selected(1, true, &flags));
    }
    app.world_mut().send_event(ReloadRequest { weapon, user });
    tick(&mut app, 70);

    let finished = app
        .world_mut()
        .resource_mut::<Events<ReloadFinished>>()
        .drain()
        .count();
    assert_eq!(finished, 2);

    let store = app.world().get::<AmmoStore>(weapon).unwrap();
    assert_eq!(store.get_ammo(&bullets()), 20);
    assert_eq!(store.get_ammo(&shells), 6);
    let reservoir = app.world().get::<AmmoStore>(user).unwrap();
    assert_eq!(reservoir.get_ammo(&bullets()), 10);
    assert_eq!(reservoir.get_ammo(&shells), 6);
}
