//! Reload hook events (хост вешает на них анимации/звук).

use bevy::prelude::*;

use crate::ammo::AmmoId;
use crate::reload::plan::StageName;

/// Запрос хоста начать перезарядку выбранного режима.
#[derive(Event, Debug, Clone)]
pub struct ReloadRequest {
    pub weapon: Entity,
    pub user: Entity,
}

/// Callback-точка стадии.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StagePhase {
    /// Однократно при входе в стадию.
    Start,
    /// Однократно на `event_at` тике стадии.
    Event,
    /// Однократно когда delay стадии прошёл.
    End,
    /// Стадия прервана.
    Abort,
}

#[derive(Event, Debug, Clone)]
pub struct ReloadStageEvent {
    pub weapon: Entity,
    pub user: Entity,
    pub stage: StageName,
    pub phase: StagePhase,
}

#[derive(Event, Debug, Clone)]
pub struct ReloadStarted {
    pub weapon: Entity,
    pub user: Entity,
    pub ammo: AmmoId,
    pub stage: StageName,
}

#[derive(Event, Debug, Clone)]
pub struct ReloadFinished {
    pub weapon: Entity,
    pub ammo: AmmoId,
}

#[derive(Event, Debug, Clone)]
pub struct ReloadCancelled {
    pub weapon: Entity,
    pub ammo: AmmoId,
    /// Отмена запрошена пользователем (Cancel), а не выстрелом/машиной.
    pub requested_by_user: bool,
}
