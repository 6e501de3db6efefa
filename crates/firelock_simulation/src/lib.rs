//! FIRELOCK Simulation Core
//!
//! Firearm gameplay scripting library на Bevy 0.16 (headless ECS).
//!
//! HYBRID ARCHITECTURE:
//! - ECS = gameplay layer (fire cycle, reload, ammo, траектории)
//! - Host engine = physics, rendering, input, object lifetime
//!
//! Хост диспатчит `ControlEvent`, шагает FixedUpdate и читает hook events;
//! библиотека не рисует и не применяет урон сама.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ammo;
pub mod cycle;
pub mod deviation;
pub mod firemode;
pub mod host;
pub mod logger;
pub mod projectile;
pub mod reload;

// Re-export основных типов для удобства
pub use ammo::{
    routed_do, routed_get, routed_set, AmmoContainerLink, AmmoId, AmmoSource, AmmoSourceConfig,
    AmmoStore, AMMO_INFINITE,
};
pub use cycle::{
    ActiveProcesses, ChargeCancelled, ChargeFinished, ChargeStarted, ControlAction, ControlEvent,
    CooldownCancelled, CooldownFinished, CooldownSkipped, CooldownStarted, FireCycleState,
    FireModeChanged, NoAmmo, ShotFired, WeaponUnlocked,
};
pub use deviation::{compose, rescale, to_direction, Deviation, DEFAULT_ANGLE_PRECISION};
pub use firemode::{
    DamageKind, FireMode, FireModeCatalog, FiringStyle, ModeCondition, ModeFlags, ProjectileKind,
};
pub use host::{
    Alive, BodyRadius, HostTerrain, MuzzleOffset, OpenField, ShootableTarget, TerrainQuery,
    WorldPos,
};
pub use logger::{init_logger, set_log_level, set_logger, LogLevel, LogPrinter};
pub use projectile::{
    BallisticProjectile, ProjectileHitTarget, ProjectileHitTerrain, ProjectileMissed,
};
pub use reload::{
    AmmoChamber, ReloadCancelled, ReloadFinished, ReloadPlan, ReloadRequest, ReloadStageEvent,
    ReloadStarted, ReloadState, StagePhase,
};

/// Номер текущего simulation tick (инкремент в начале каждого FixedUpdate).
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimTick(pub u64);

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

fn advance_sim_tick(mut tick: ResMut<SimTick>) {
    tick.0 += 1;
}

/// Главный plugin: fixed timestep 60Hz, все события и системы.
pub struct FirelockPlugin;

impl Plugin for FirelockPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(60.0))
            .init_resource::<SimTick>();

        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
        // Хост подставляет свой terrain query; без него — открытое поле
        if !app.world().contains_resource::<HostTerrain>() {
            app.insert_resource(HostTerrain::new(OpenField::default()));
        }

        app.add_event::<ControlEvent>()
            .add_event::<ShotFired>()
            .add_event::<NoAmmo>()
            .add_event::<ChargeStarted>()
            .add_event::<ChargeFinished>()
            .add_event::<ChargeCancelled>()
            .add_event::<CooldownStarted>()
            .add_event::<CooldownCancelled>()
            .add_event::<CooldownFinished>()
            .add_event::<CooldownSkipped>()
            .add_event::<FireModeChanged>()
            .add_event::<WeaponUnlocked>()
            .add_event::<reload::ReloadRequest>()
            .add_event::<ReloadStageEvent>()
            .add_event::<ReloadStarted>()
            .add_event::<ReloadFinished>()
            .add_event::<ReloadCancelled>()
            .add_event::<ProjectileHitTarget>()
            .add_event::<ProjectileHitTerrain>()
            .add_event::<ProjectileMissed>();

        // Порядок фиксирован: input до цикла, reload до выстрела (выстрел
        // отменяет канал в том же тике), снаряды после спавна
        app.add_systems(
            FixedUpdate,
            (
                advance_sim_tick,
                cycle::tick_weapon_locks,
                cycle::process_control_events,
                reload::process_reload_requests,
                reload::tick_reload,
                cycle::tick_fire_cycle,
                cycle::apply_scheduled_mode_change,
                cycle::decay_dynamic_spread,
                projectile::advance_ballistic_projectiles,
            )
                .chain(),
        );
    }
}

/// Minimal headless App для тестов и симуляций без хоста.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0));

    app
}
