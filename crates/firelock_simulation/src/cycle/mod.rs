//! Fire cycle — charge → fire → recovery → cooldown.
//!
//! - `components` — типизированные слоты конкурентных процессов
//! - `events` — control input + cosmetic hooks
//! - `ammo_usage` — spare shot credit bookkeeping
//! - `systems` — state machine цикла

pub mod ammo_usage;
pub mod components;
pub mod events;
pub mod systems;


pub use ammo_usage::{handle_ammo_usage, has_ammo};
pub use components::{ActiveProcesses, FireCycleState, LockProcess, StageProcess};
pub use events::{
    ChargeCancelled, ChargeFinished, ChargeStarted, ControlAction, ControlEvent, CooldownCancelled,
    CooldownFinished, CooldownSkipped, CooldownStarted, FireModeChanged, NoAmmo, ShotFired,
    WeaponUnlocked,
};
pub use systems::{
    apply_scheduled_mode_change, can_change_firemode, decay_dynamic_spread, process_control_events,
    tick_fire_cycle, tick_weapon_locks, FireHookWriters,
};
