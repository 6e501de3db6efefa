//! Fire modes — набор параметров стрельбы, выбираемых на оружии.
//!
//! `FireMode` — описатель (immutable-by-default, клонируется для записи),
//! `FireModeCatalog` — упорядоченная коллекция с выбором, фильтрацией по
//! condition'ам и отложенным (scheduled) переключением.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ammo::AmmoId;
use crate::deviation::{Deviation, DEFAULT_ANGLE_PRECISION};


/// Стиль стрельбы.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Reflect)]
pub enum FiringStyle {
    /// Один выстрел на нажатие.
    Single,
    /// `burst_count` выстрелов на нажатие, с recovery между ними.
    Burst,
    /// Стреляет пока зажат триггер.
    Auto,
}

/// Как резолвится траектория снаряда.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Reflect)]
pub enum ProjectileKind {
    /// Мгновенная линия (resolved синхронно при выстреле).
    Hitscan,
    /// Entity с velocity, живёт `range/speed` тиков.
    Ballistic,
}

/// Тип урона (прокидывается хосту в hit events).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum DamageKind {
    #[default]
    Projectile,
    Blast,
    Energy,
}

/// Предикат доступности fire mode.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum ModeCondition {
    #[default]
    Always,
    /// Доступен только когда флаг выставлен на оружии (`ModeFlags`).
    Flag(String),
}

/// Флаги оружия, проверяемые `ModeCondition::Flag` (выставляет хост/скрипты).
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct ModeFlags(pub HashSet<String>);

impl ModeFlags {
    pub fn set(&mut self, flag: impl Into<String>) {
        self.0.insert(flag.into());
    }

    pub fn unset(&mut self, flag: &str) {
        self.0.remove(flag);
    }

    pub fn has(&self, flag: &str) -> bool {
        self.0.contains(flag)
    }
}

/// Описатель fire mode.
///
/// Тайминги в тиках (0 = стадия пропускается). `ammo_usage`/`ammo_rate`:
/// `ammo_rate` выстрелов на `ammo_usage` списанных единиц (см. spare shot
/// credit в `cycle::ammo_usage`).
#[derive(Clone, Debug, Serialize, Deserialize, Reflect)]
pub struct FireMode {
    pub name: String,
    pub style: FiringStyle,

    // === Тайминги (тики) ===
    pub charge_delay: u32,
    pub recovery_delay: u32,
    pub cooldown_delay: u32,
    pub reload_delay: u32,

    // === Боеприпасы ===
    pub ammo_id: AmmoId,
    pub ammo_usage: i32,
    pub ammo_rate: i32,
    pub auto_reload: bool,

    // === Баллистика ===
    pub damage: i32,
    pub damage_kind: DamageKind,
    pub projectile_kind: ProjectileKind,
    /// Пиксели за тик.
    pub projectile_speed: f32,
    /// Пиксели.
    pub projectile_range: f32,
    pub projectile_count: u32,
    /// Статический разброс снаряда.
    pub projectile_spread: Deviation,
    /// Статический разброс оружия.
    pub weapon_spread: Deviation,
    /// Прибавка к динамическому разбросу стрелка за выстрел
    /// (масштаб `DEFAULT_ANGLE_PRECISION`).
    pub spread_added_per_shot: i32,
    pub burst_count: u32,
    /// Снаряд никогда не бьёт стрелка (даже за пределами arming distance).
    pub never_hit_shooter: bool,

    pub condition: ModeCondition,
}

impl Default for FireMode {
    fn default() -> Self {
        Self {
            name: "Standard".into(),
            style: FiringStyle::Auto,
            charge_delay: 0,
            recovery_delay: 7,
            cooldown_delay: 0,
            reload_delay: 60,
            ammo_id: AmmoId::new("Bullets"),
            ammo_usage: 1,
            ammo_rate: 1,
            auto_reload: false,
            damage: 10,
            damage_kind: DamageKind::Projectile,
            projectile_kind: ProjectileKind::Hitscan,
            projectile_speed: 100.0,
            projectile_range: 600.0,
            projectile_count: 1,
            projectile_spread: Deviation::none(),
            weapon_spread: Deviation::new(100, DEFAULT_ANGLE_PRECISION),
            spread_added_per_shot: 25,
            burst_count: 0,
            never_hit_shooter: false,
            condition: ModeCondition::Always,
        }
    }
}

impl FireMode {
    /// Автоматическая винтовка (hitscan).
    pub fn rifle_auto() -> Self {
        Self {
            name: "Full Auto".into(),
            ..Self::default()
        }
    }

    /// Burst-винтовка: 3 выстрела на нажатие, cooldown после очереди.
    pub fn rifle_burst() -> Self {
        Self {
            name: "Burst".into(),
            style: FiringStyle::Burst,
            burst_count: 3,
            cooldown_delay: 30,
            ..Self::default()
        }
    }

    /// Однозарядный мушкет: charge перед выстрелом, ballistic снаряд.
    pub fn musket_single() -> Self {
        Self {
            name: "Musket Shot".into(),
            style: FiringStyle::Single,
            charge_delay: 20,
            recovery_delay: 10,
            cooldown_delay: 15,
            projectile_kind: ProjectileKind::Ballistic,
            projectile_speed: 30.0,
            projectile_range: 900.0,
            damage: 40,
            ..Self::default()
        }
    }
}

/// Отложенное переключение fire mode: последний запрос побеждает,
/// применяется РОВНО один раз когда `can_change_firemode` станет true.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct FireModeCatalog {
    modes: Vec<FireMode>,
    selected: usize,
    scheduled: Option<usize>,
}

impl FireModeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, mode: FireMode) -> Self {
        self.add(mode);
        self
    }

    /// Регистрация mode; индекс присваивается последовательно.
    pub fn add(&mut self, mode: FireMode) -> usize {
        self.modes.push(mode);
        self.modes.len() - 1
    }

    pub fn clear(&mut self) {
        self.modes.clear();
        self.selected = 0;
        self.scheduled = None;
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// `None` = текущий выбранный. Индекс за границами — ошибка контракта.
    pub fn get(&self, index: Option<usize>) -> &FireMode {
        let index = index.unwrap_or(self.selected);
        match self.modes.get(index) {
            Some(mode) => mode,
            None => panic!(
                "fire mode index {} out of bounds (catalog has {} modes)",
                index,
                self.modes.len()
            ),
        }
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn scheduled_index(&self) -> Option<usize> {
        self.scheduled
    }

    pub fn is_available(&self, index: usize, flags: &ModeFlags) -> bool {
        match &self.get(Some(index)).condition {
            ModeCondition::Always => true,
            ModeCondition::Flag(flag) => flags.has(flag),
        }
    }

    /// Индексы доступных (condition == true) режимов.
    pub fn available_indices(&self, flags: &ModeFlags) -> Vec<usize> {
        (0..self.modes.len())
            .filter(|i| self.is_available(*i, flags))
            .collect()
    }

    /// Сменить выбранный режим. Успех если `force`, либо смена сейчас
    /// разрешена (`can_change`) и целевой режим доступен. Иначе — false без
    /// побочных эффектов.
    pub fn set_selected(
        &mut self,
        index: usize,
        force: bool,
        can_change: bool,
        flags: &ModeFlags,
    ) -> bool {
        assert!(
            index < self.modes.len(),
            "fire mode index {} out of bounds (catalog has {} modes)",
            index,
            self.modes.len()
        );
        if force || (can_change && self.is_available(index, flags)) {
            self.selected = index;
            true
        } else {
            false
        }
    }

    /// Запросить переключение. Если смена разрешена сейчас — применяется
    /// сразу, иначе запоминается (last-write-wins) до безопасной точки.
    pub fn schedule_selected(
        &mut self,
        index: usize,
        can_change: bool,
        flags: &ModeFlags,
    ) -> bool {
        assert!(
            index < self.modes.len(),
            "fire mode index {} out of bounds (catalog has {} modes)",
            index,
            self.modes.len()
        );
        if can_change && self.set_selected(index, false, true, flags) {
            self.scheduled = None;
            true
        } else {
            self.scheduled = Some(index);
            false
        }
    }

    /// Снять pending запрос (вызывается системой после применения).
    pub fn clear_scheduled(&mut self) {
        self.scheduled = None;
    }
}
