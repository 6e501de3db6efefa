//! Reload plan — таблица именованных стадий.
//!
//! «Следующая стадия» — tagged variant, не string-sniffing: branching
//! (`Dynamic`) — это обычный fn pointer от `ReloadContext`, который машина
//! вычисляет явно. Стартовая стадия тоже ВСЕГДА выводится из текущего
//! состояния патронов/каморы, а не захардкожена — отменённый и
//! перезапущенный reload продолжается с правильного места.

use bevy::prelude::*;

/// Имя стадии в плане.
pub type StageName = &'static str;

/// Снимок состояния боеприпасов для branching-решений плана.
#[derive(Clone, Copy, Debug)]
pub struct ReloadContext {
    /// Патронов в собственном store оружия (магазин).
    pub weapon_ammo: i32,
    pub weapon_capacity: i32,
    /// Доступно в источнике перезарядки (носитель/контейнер).
    pub source_ammo: i32,
    pub chamber_enabled: bool,
    pub chamber_loaded: bool,
}

/// Куда идти после стадии.
#[derive(Clone)]
pub enum NextStage {
    /// Конкретная следующая стадия.
    Literal(StageName),
    /// Остаться в стадии не повторяя Start/End, ждать внешнего перехода.
    Hold,
    /// Reload завершён.
    Idle,
    /// Branching: callback решает по текущему состоянию. `None` = завершён.
    Dynamic(fn(&ReloadContext) -> Option<StageName>),
}

/// Типизированный эффект стадии, применяется на её End.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageAction {
    /// Высыпать магазин обратно в источник.
    EjectToSource,
    /// Забрать из источника до полного магазина.
    InsertFromSource,
    /// Забрать из источника один патрон.
    InsertSingleRound,
    /// Дослать патрон из магазина в камору.
    LoadChamber,
}

/// Описание одной стадии.
#[derive(Clone)]
pub struct ReloadStageDef {
    pub name: StageName,
    /// Тики; 0 = взять `reload_delay` текущего fire mode (flat-вариант).
    pub delay: u32,
    /// Однократный Event callback на этом тике стадии.
    pub event_at: Option<u32>,
    pub action: Option<StageAction>,
    pub next: NextStage,
    /// Куда переходить при abort (доигрываем закрытие затвора и т.п.);
    /// `None` = канал снимается сразу.
    pub abort_to: Option<StageName>,
}

impl ReloadStageDef {
    pub fn new(name: StageName, delay: u32, next: NextStage) -> Self {
        Self {
            name,
            delay,
            event_at: None,
            action: None,
            next,
            abort_to: None,
        }
    }

    pub fn with_action(mut self, action: StageAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_event_at(mut self, tick: u32) -> Self {
        self.event_at = Some(tick);
        self
    }

    pub fn with_abort_to(mut self, stage: StageName) -> Self {
        self.abort_to = Some(stage);
        self
    }
}

/// План перезарядки оружия: таблица стадий + вывод стартовой стадии.
#[derive(Component, Clone)]
pub struct ReloadPlan {
    stages: Vec<ReloadStageDef>,
    entry: fn(&ReloadContext) -> Option<StageName>,
}

impl ReloadPlan {
    pub fn new(stages: Vec<ReloadStageDef>, entry: fn(&ReloadContext) -> Option<StageName>) -> Self {
        Self { stages, entry }
    }

    pub fn stage(&self, name: StageName) -> Option<&ReloadStageDef> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Правильная стартовая стадия для текущего состояния; `None` =
    /// перезаряжать нечего.
    pub fn entry_stage(&self, ctx: &ReloadContext) -> Option<StageName> {
        (self.entry)(ctx)
    }
}

/// Камора — буфер на один патрон отдельно от магазина.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct AmmoChamber {
    pub enabled: bool,
    pub loaded: bool,
}

impl Default for AmmoChamber {
    fn default() -> Self {
        Self {
            enabled: true,
            loaded: false,
        }
    }
}
