//! Control entry points + cosmetic hook events.
//!
//! Хост диспатчит input как `ControlEvent`; всё «наружу» (звук, партиклы,
//! анимации) уходит fire-and-forget событиями — библиотека не рендерит.

use bevy::prelude::*;

/// Действие пользователя над оружием.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    /// Триггер нажат (press edge).
    Press,
    /// Триггер удерживается (раз в тик, обновляет прицел).
    Hold,
    /// Триггер отпущен.
    Release,
    /// Использование отменено (сброс charge И reload).
    Cancel,
}

/// Input event от хоста.
#[derive(Event, Debug, Clone)]
pub struct ControlEvent {
    pub weapon: Entity,
    pub user: Entity,
    pub action: ControlAction,
    /// Угол прицеливания, градусы × aim_precision оружия.
    pub aim_angle: i32,
}

/// Выстрел произведён (хук для muzzle flash / звука / отдачи).
#[derive(Event, Debug, Clone)]
pub struct ShotFired {
    pub weapon: Entity,
    pub user: Entity,
    pub mode: usize,
    /// Итоговый угол первого снаряда, в масштабе `precision`.
    pub angle_scaled: i32,
    pub precision: i32,
    /// Снарядов выпущено этим выстрелом.
    pub projectiles: u32,
}

/// Попытка выстрела без патронов (OnNoAmmo).
#[derive(Event, Debug, Clone)]
pub struct NoAmmo {
    pub weapon: Entity,
    pub user: Entity,
    pub mode: usize,
}

#[derive(Event, Debug, Clone)]
pub struct ChargeStarted {
    pub weapon: Entity,
    pub mode: usize,
}

#[derive(Event, Debug, Clone)]
pub struct ChargeFinished {
    pub weapon: Entity,
    pub mode: usize,
}

#[derive(Event, Debug, Clone)]
pub struct ChargeCancelled {
    pub weapon: Entity,
    pub mode: usize,
}

#[derive(Event, Debug, Clone)]
pub struct CooldownStarted {
    pub weapon: Entity,
    pub mode: usize,
}

#[derive(Event, Debug, Clone)]
pub struct CooldownFinished {
    pub weapon: Entity,
    pub mode: usize,
}

/// Cooldown пропущен (OnSkipCooldown): delay == 0 или full-auto с зажатым
/// триггером.
#[derive(Event, Debug, Clone)]
pub struct CooldownSkipped {
    pub weapon: Entity,
    pub mode: usize,
}

/// Cooldown снят досрочно по `ControlAction::Cancel`.
#[derive(Event, Debug, Clone)]
pub struct CooldownCancelled {
    pub weapon: Entity,
    pub mode: usize,
}

/// Выбранный fire mode сменился (сразу или отложенно).
#[derive(Event, Debug, Clone)]
pub struct FireModeChanged {
    pub weapon: Entity,
    pub index: usize,
}

/// Истёк таймер weapon lock.
#[derive(Event, Debug, Clone)]
pub struct WeaponUnlocked {
    pub weapon: Entity,
}
