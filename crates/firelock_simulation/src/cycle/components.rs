//! Fire cycle state components.
//!
//! Вместо «effect с таким-то string tag» каждого конкурентного процесса —
//! явные типизированные слоты на одном компоненте (`ActiveProcesses`):
//! charge, recovery, cooldown, lock. Конструкция/teardown слота определены,
//! поиска по тегу нет.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::ammo::{AmmoSourceConfig, AmmoStore};
use crate::deviation::DEFAULT_ANGLE_PRECISION;
use crate::firemode::ModeFlags;
use crate::host::WorldPos;

/// Таймер одной стадии цикла (charge / recovery / cooldown).
#[derive(Clone, Debug, Reflect)]
pub struct StageProcess {
    /// Индекс fire mode, запустившего стадию.
    pub mode: usize,
    /// Прошедшие тики.
    pub elapsed: u32,
    /// Полная длительность (тики), всегда > 0.
    pub delay: u32,
}

impl StageProcess {
    pub fn new(mode: usize, delay: u32) -> Self {
        assert!(delay > 0, "stage delay must be positive");
        Self {
            mode,
            elapsed: 0,
            delay,
        }
    }

    /// Один тик. true когда стадия завершена.
    pub fn tick(&mut self) -> bool {
        self.elapsed += 1;
        self.elapsed >= self.delay
    }

    /// Прогресс в процентах [0, 100].
    pub fn percent(&self) -> i32 {
        ((self.elapsed as u64 * 100) / self.delay as u64).min(100) as i32
    }
}

/// Weapon lock: блокирует стрельбу, reload и смену режима.
#[derive(Clone, Debug, Default, Reflect)]
pub struct LockProcess {
    /// Оставшиеся тики; `None` = до явного unlock.
    pub remaining: Option<u32>,
}

/// Активные конкурентные процессы оружия — по одному слоту на процесс.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct ActiveProcesses {
    pub charge: Option<StageProcess>,
    pub recovery: Option<StageProcess>,
    pub cooldown: Option<StageProcess>,
    pub lock: Option<LockProcess>,
}

impl ActiveProcesses {
    pub fn is_charging(&self) -> bool {
        self.charge.is_some()
    }

    pub fn is_recovering(&self) -> bool {
        self.recovery.is_some()
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown.is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// Готовность к выстрелу: не recovery, не cooldown, не lock.
    pub fn is_ready_to_fire(&self) -> bool {
        !self.is_recovering() && !self.is_cooling_down() && !self.is_locked()
    }

    pub fn charge_progress(&self) -> i32 {
        self.charge.as_ref().map_or(-1, StageProcess::percent)
    }

    pub fn recovery_progress(&self) -> i32 {
        self.recovery.as_ref().map_or(-1, StageProcess::percent)
    }

    pub fn cooldown_progress(&self) -> i32 {
        self.cooldown.as_ref().map_or(-1, StageProcess::percent)
    }

    /// Поставить/обновить lock. `duration == 0` — до явного unlock.
    pub fn lock_weapon(&mut self, duration: u32) {
        self.lock = Some(LockProcess {
            remaining: (duration > 0).then_some(duration),
        });
    }

    /// Снять lock. Идемпотентно.
    pub fn unlock_weapon(&mut self) {
        self.lock = None;
    }

    /// Отменить charge. Идемпотентно; true если что-то было отменено.
    pub fn cancel_charge(&mut self) -> bool {
        self.charge.take().is_some()
    }

    /// Отменить cooldown. Идемпотентно. Recovery не отменяется:
    /// начатый после выстрела откат всегда доигрывается.
    pub fn cancel_cooldown(&mut self) -> bool {
        self.cooldown.take().is_some()
    }
}

/// Per-weapon состояние fire cycle.
///
/// Reload здесь НЕ стадия: он живёт ортогонально в `ReloadState`, потому что
/// reload может быть прерван выстрелом уже досланного патрона.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(ActiveProcesses, AmmoStore, AmmoSourceConfig, ModeFlags, WorldPos)]
pub struct FireCycleState {
    /// Триггер зажат.
    pub is_using: bool,
    /// Свежий press edge, ещё не израсходованный на начало цикла.
    pub trigger_pressed: bool,
    /// Текущий пользователь оружия.
    pub user: Option<Entity>,
    /// Угол прицеливания, градусы × `aim_precision`.
    pub aim_angle: i32,
    pub aim_precision: i32,
    /// Charge завершён, выстрел ещё не произведён.
    pub charged: bool,
    /// OnNoAmmo уже отправлен для текущего нажатия (защита от спама).
    pub no_ammo_latched: bool,

    /// Выстрелов в текущем цикле, по fire mode.
    pub shots_fired_in_burst: HashMap<usize, u32>,
    /// Банк «бесплатных» выстрелов по fire mode (ammo rate banking).
    /// Строго per-mode: смена режима кредит не переносит и не сбрасывает.
    pub spare_shot_credit: HashMap<usize, i32>,

    /// Накопленный динамический разброс (масштаб `DEFAULT_ANGLE_PRECISION`).
    pub dynamic_spread: i32,
    /// Линейное восстановление разброса за тик; 0 = не восстанавливается.
    pub spread_recovery_per_tick: i32,
}

impl Default for FireCycleState {
    fn default() -> Self {
        Self {
            is_using: false,
            trigger_pressed: false,
            user: None,
            aim_angle: 0,
            aim_precision: DEFAULT_ANGLE_PRECISION,
            charged: false,
            no_ammo_latched: false,
            shots_fired_in_burst: HashMap::new(),
            spare_shot_credit: HashMap::new(),
            dynamic_spread: 0,
            spread_recovery_per_tick: 0,
        }
    }
}

impl FireCycleState {
    pub fn shots_in_burst(&self, mode: usize) -> u32 {
        self.shots_fired_in_burst.get(&mode).copied().unwrap_or(0)
    }

    pub fn credit(&self, mode: usize) -> i32 {
        self.spare_shot_credit.get(&mode).copied().unwrap_or(0)
    }

    pub fn set_credit(&mut self, mode: usize, credit: i32) {
        self.spare_shot_credit.insert(mode, credit);
    }

    /// Сброс счётчика очереди при завершении цикла.
    pub fn reset_burst(&mut self, mode: usize) {
        self.shots_fired_in_burst.remove(&mode);
    }
}
