//! Reload state machine — per-weapon × ammo-type каналы.
//!
//! Канал идёт по стадиям плана (`ReloadPlan`), на каждую стадию три
//! callback-точки (Start / Event / End) + Abort при отмене. Машина работает
//! конкурентно с fire cycle и может быть прервана выстрелом досланного
//! патрона; отмена идемпотентна.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use std::collections::HashMap;

use crate::ammo::{AmmoContainerLink, AmmoId, AmmoStore};
use crate::cycle::components::ActiveProcesses;
use crate::firemode::{FireMode, FireModeCatalog};
use crate::logger;
use crate::reload::events::{
    ReloadCancelled, ReloadFinished, ReloadRequest, ReloadStageEvent, ReloadStarted, StagePhase,
};
use crate::reload::plan::{
    AmmoChamber, NextStage, ReloadContext, ReloadPlan, StageAction, StageName,
};

/// Один активный reload-канал.
#[derive(Clone, Debug)]
pub struct ReloadChannel {
    pub user: Entity,
    /// Индекс fire mode, запросившего перезарядку.
    pub mode: usize,
    pub stage: StageName,
    pub elapsed: u32,
    pub event_fired: bool,
    /// `NextStage::Hold` достигнут: ждём внешнего перехода.
    pub held: bool,
    pub cancel_requested: bool,
    pub cancel_by_user: bool,
    /// Канал доигрывает abort-переход; по завершении — Cancelled, не Finished.
    pub winding_down: bool,
}

/// Reload-состояние оружия. Инвариант: максимум один канал на ammo type.
#[derive(Component, Debug, Default)]
pub struct ReloadState {
    channels: HashMap<AmmoId, ReloadChannel>,
}

impl ReloadState {
    pub fn is_active(&self) -> bool {
        !self.channels.is_empty()
    }

    pub fn channel(&self, ammo: &AmmoId) -> Option<&ReloadChannel> {
        self.channels.get(ammo)
    }

    /// Прогресс текущей стадии в процентах, -1 если канала нет.
    pub fn progress(&self, ammo: &AmmoId, plan: &ReloadPlan, mode: &FireMode) -> i32 {
        let Some(channel) = self.channels.get(ammo) else {
            return -1;
        };
        let Some(stage) = plan.stage(channel.stage) else {
            return -1;
        };
        let delay = effective_delay(stage.delay, mode);
        ((channel.elapsed as u64 * 100) / delay as u64).min(100) as i32
    }

    /// Запросить отмену; обрабатывается машиной на следующем тике.
    /// Идемпотентно: повторный запрос — no-op.
    pub fn request_cancel(&mut self, ammo: &AmmoId, by_user: bool) -> bool {
        match self.channels.get_mut(ammo) {
            Some(channel) if !channel.cancel_requested => {
                channel.cancel_requested = true;
                channel.cancel_by_user = by_user;
                true
            }
            _ => false,
        }
    }

    /// Внешний переход (выводит канал из `Hold`). Start event за хостом.
    pub fn force_stage(&mut self, ammo: &AmmoId, stage: StageName) -> bool {
        match self.channels.get_mut(ammo) {
            Some(channel) => {
                channel.stage = stage;
                channel.elapsed = 0;
                channel.event_fired = false;
                channel.held = false;
                true
            }
            None => false,
        }
    }
}

/// Hook writers машины (bundle, чтобы не раздувать сигнатуры систем).
#[derive(SystemParam)]
pub struct ReloadHookWriters<'w> {
    pub stage: EventWriter<'w, ReloadStageEvent>,
    pub started: EventWriter<'w, ReloadStarted>,
    pub finished: EventWriter<'w, ReloadFinished>,
    pub cancelled: EventWriter<'w, ReloadCancelled>,
}

fn effective_delay(stage_delay: u32, mode: &FireMode) -> u32 {
    if stage_delay > 0 {
        stage_delay
    } else {
        mode.reload_delay.max(1)
    }
}

/// Entity, с которым reload обменивается патронами: привязанный контейнер
/// или сам пользователь.
pub fn reload_reservoir(link: Option<&AmmoContainerLink>, user: Entity) -> Entity {
    link.and_then(|l| l.0).unwrap_or(user)
}

/// Снимок состояния патронов для branching-решений плана.
pub fn build_context(
    stores: &mut Query<&mut AmmoStore>,
    weapon: Entity,
    reservoir: Entity,
    ammo: &AmmoId,
    chamber: Option<&AmmoChamber>,
) -> ReloadContext {
    let (weapon_ammo, weapon_capacity) = stores
        .get_mut(weapon)
        .map(|store| (store.get_ammo(ammo), store.capacity(ammo)))
        .unwrap_or((0, 0));
    let source_ammo = stores
        .get_mut(reservoir)
        .map(|store| store.get_ammo(ammo))
        .unwrap_or(0);

    ReloadContext {
        weapon_ammo,
        weapon_capacity,
        source_ammo,
        chamber_enabled: chamber.is_some_and(|c| c.enabled),
        chamber_loaded: chamber.is_some_and(|c| c.loaded),
    }
}

/// Начать перезарядку. Стартовая стадия выводится из текущего состояния.
/// Канал для того же user/mode уже активен — no-op (true); канал другого
/// user/mode отменяется перед стартом нового.
pub fn start_reload(
    state: &mut ReloadState,
    plan: &ReloadPlan,
    ctx: &ReloadContext,
    weapon: Entity,
    user: Entity,
    ammo: &AmmoId,
    mode_index: usize,
    hooks: &mut ReloadHookWriters,
) -> bool {
    if let Some(channel) = state.channels.get(ammo) {
        if channel.user == user && channel.mode == mode_index && !channel.winding_down {
            return true;
        }
        cancel_now(state, weapon, ammo, false, hooks);
    }

    let Some(entry) = plan.entry_stage(ctx) else {
        return false;
    };
    if plan.stage(entry).is_none() {
        logger::log_warning(&format!(
            "reload plan entry resolved to unknown stage {:?}",
            entry
        ));
        return false;
    }

    state.channels.insert(
        ammo.clone(),
        ReloadChannel {
            user,
            mode: mode_index,
            stage: entry,
            elapsed: 0,
            event_fired: false,
            held: false,
            cancel_requested: false,
            cancel_by_user: false,
            winding_down: false,
        },
    );
    hooks.started.write(ReloadStarted {
        weapon,
        user,
        ammo: ammo.clone(),
        stage: entry,
    });
    hooks.stage.write(ReloadStageEvent {
        weapon,
        user,
        stage: entry,
        phase: StagePhase::Start,
    });
    logger::log(&format!(
        "Weapon {:?} reload started at stage {:?}",
        weapon, entry
    ));
    true
}

/// Немедленная отмена (путь «выстрел прерывает reload»). Идемпотентна.
pub fn cancel_now(
    state: &mut ReloadState,
    weapon: Entity,
    ammo: &AmmoId,
    by_user: bool,
    hooks: &mut ReloadHookWriters,
) -> bool {
    let Some(channel) = state.channels.remove(ammo) else {
        return false;
    };
    hooks.stage.write(ReloadStageEvent {
        weapon,
        user: channel.user,
        stage: channel.stage,
        phase: StagePhase::Abort,
    });
    hooks.cancelled.write(ReloadCancelled {
        weapon,
        ammo: ammo.clone(),
        requested_by_user: by_user,
    });
    true
}

/// Типизированный эффект стадии (вместо строковых override-хуков оригинала).
fn apply_stage_action(
    action: StageAction,
    stores: &mut Query<&mut AmmoStore>,
    weapon: Entity,
    reservoir: Entity,
    ammo: &AmmoId,
    chamber: Option<&mut AmmoChamber>,
) {
    match action {
        StageAction::EjectToSource => {
            let ejected = match stores.get_mut(weapon) {
                Ok(mut store) => {
                    let n = store.get_ammo(ammo);
                    store.set_ammo(ammo, 0);
                    n
                }
                Err(_) => 0,
            };
            if ejected > 0 {
                if let Ok(mut store) = stores.get_mut(reservoir) {
                    // Переполнение источника — излишек теряется
                    store.do_ammo(ammo, ejected);
                }
            }
        }
        StageAction::InsertFromSource => {
            let need = match stores.get_mut(weapon) {
                Ok(store) => store.capacity(ammo) - store.get_ammo(ammo),
                Err(_) => 0,
            };
            if need <= 0 {
                return;
            }
            let taken = match stores.get_mut(reservoir) {
                Ok(mut store) => -store.do_ammo(ammo, -need),
                Err(_) => 0,
            };
            if taken > 0 {
                if let Ok(mut store) = stores.get_mut(weapon) {
                    store.do_ammo(ammo, taken);
                }
            }
        }
        StageAction::InsertSingleRound => {
            let taken = match stores.get_mut(reservoir) {
                Ok(mut store) => -store.do_ammo(ammo, -1),
                Err(_) => 0,
            };
            if taken > 0 {
                if let Ok(mut store) = stores.get_mut(weapon) {
                    store.do_ammo(ammo, 1);
                }
            }
        }
        StageAction::LoadChamber => {
            if let Some(chamber) = chamber {
                if chamber.enabled && !chamber.loaded {
                    let taken = match stores.get_mut(weapon) {
                        Ok(mut store) => store.do_ammo(ammo, -1),
                        Err(_) => 0,
                    };
                    if taken == -1 {
                        chamber.loaded = true;
                    }
                }
            }
        }
    }
}

/// System: host-запросы на перезарядку (стартуют канал выбранного режима).
pub fn process_reload_requests(
    mut events: EventReader<ReloadRequest>,
    mut weapons: Query<(
        &FireModeCatalog,
        &mut ReloadState,
        &ReloadPlan,
        &ActiveProcesses,
        Option<&AmmoContainerLink>,
        Option<&AmmoChamber>,
    )>,
    mut stores: Query<&mut AmmoStore>,
    mut hooks: ReloadHookWriters,
) {
    for event in events.read() {
        let Ok((catalog, mut state, plan, processes, link, chamber)) =
            weapons.get_mut(event.weapon)
        else {
            logger::log_warning(&format!(
                "reload request for entity {:?} without reload plan",
                event.weapon
            ));
            continue;
        };
        if catalog.is_empty() || processes.is_locked() {
            continue;
        }
        let mode_index = catalog.selected_index();
        let ammo = catalog.get(None).ammo_id.clone();
        let reservoir = reload_reservoir(link, event.user);
        let ctx = build_context(&mut stores, event.weapon, reservoir, &ammo, chamber);
        start_reload(
            &mut state,
            plan,
            &ctx,
            event.weapon,
            event.user,
            &ammo,
            mode_index,
            &mut hooks,
        );
    }
}

enum Resolution {
    Goto(StageName),
    Stay,
    Done,
}

/// System: продвижение всех reload-каналов на один тик.
pub fn tick_reload(
    mut weapons: Query<(
        Entity,
        &FireModeCatalog,
        &mut ReloadState,
        &ReloadPlan,
        &ActiveProcesses,
        Option<&AmmoContainerLink>,
        Option<&mut AmmoChamber>,
    )>,
    mut stores: Query<&mut AmmoStore>,
    liveness: Query<()>,
    mut hooks: ReloadHookWriters,
) {
    for (weapon, catalog, mut state, plan, processes, link, mut chamber) in weapons.iter_mut() {
        if !state.is_active() {
            continue;
        }
        // Порядок обхода каналов фиксирован (ammo id), иначе порядок hook
        // событий зависел бы от hash-раскладки
        let mut ammo_types: Vec<AmmoId> = state.channels.keys().cloned().collect();
        ammo_types.sort_unstable();

        for ammo in ammo_types {
            let Some(channel) = state.channels.get_mut(&ammo) else {
                continue;
            };
            let user = channel.user;
            let mode_index = channel.mode;
            let reservoir = reload_reservoir(link, user);

            // User пропал или оружие заблокировано — reload дальше невозможен
            if !channel.cancel_requested
                && (liveness.get(user).is_err() || processes.is_locked())
            {
                channel.cancel_requested = true;
                channel.cancel_by_user = false;
            }

            let Some(stage) = plan.stage(channel.stage).cloned() else {
                // Стадия разрешилась в неизвестное имя — abort
                let stage_name = channel.stage;
                state.channels.remove(&ammo);
                hooks.stage.write(ReloadStageEvent {
                    weapon,
                    user,
                    stage: stage_name,
                    phase: StagePhase::Abort,
                });
                hooks.cancelled.write(ReloadCancelled {
                    weapon,
                    ammo: ammo.clone(),
                    requested_by_user: false,
                });
                continue;
            };

            if channel.cancel_requested {
                hooks.stage.write(ReloadStageEvent {
                    weapon,
                    user,
                    stage: stage.name,
                    phase: StagePhase::Abort,
                });
                if let Some(target) = stage.abort_to {
                    // Доигрываем закрывающий переход
                    channel.stage = target;
                    channel.elapsed = 0;
                    channel.event_fired = false;
                    channel.held = false;
                    channel.cancel_requested = false;
                    channel.winding_down = true;
                    hooks.stage.write(ReloadStageEvent {
                        weapon,
                        user,
                        stage: target,
                        phase: StagePhase::Start,
                    });
                } else {
                    let by_user = channel.cancel_by_user;
                    state.channels.remove(&ammo);
                    hooks.cancelled.write(ReloadCancelled {
                        weapon,
                        ammo: ammo.clone(),
                        requested_by_user: by_user,
                    });
                }
                continue;
            }

            if channel.held {
                continue;
            }

            let mode = catalog.get(Some(mode_index)).clone();
            let delay = effective_delay(stage.delay, &mode);

            channel.elapsed += 1;
            let elapsed = channel.elapsed;

            if let Some(at) = stage.event_at {
                if elapsed == at && !channel.event_fired {
                    channel.event_fired = true;
                    hooks.stage.write(ReloadStageEvent {
                        weapon,
                        user,
                        stage: stage.name,
                        phase: StagePhase::Event,
                    });
                }
            }

            if elapsed < delay {
                continue;
            }

            // End стадии: эффект + callback, затем решаем куда дальше
            if let Some(action) = stage.action {
                apply_stage_action(
                    action,
                    &mut stores,
                    weapon,
                    reservoir,
                    &ammo,
                    chamber.as_deref_mut(),
                );
            }
            hooks.stage.write(ReloadStageEvent {
                weapon,
                user,
                stage: stage.name,
                phase: StagePhase::End,
            });

            let ctx = build_context(&mut stores, weapon, reservoir, &ammo, chamber.as_deref());
            let resolution = match &stage.next {
                NextStage::Literal(name) => Resolution::Goto(*name),
                NextStage::Hold => Resolution::Stay,
                NextStage::Idle => Resolution::Done,
                NextStage::Dynamic(decide) => match decide(&ctx) {
                    Some(name) => Resolution::Goto(name),
                    None => Resolution::Done,
                },
            };

            let channel = state.channels.get_mut(&ammo).expect("channel vanished");
            match resolution {
                Resolution::Goto(name) => {
                    if plan.stage(name).is_none() {
                        // Nil/неизвестная стадия — abort-путь
                        let winding = channel.winding_down;
                        state.channels.remove(&ammo);
                        hooks.stage.write(ReloadStageEvent {
                            weapon,
                            user,
                            stage: name,
                            phase: StagePhase::Abort,
                        });
                        hooks.cancelled.write(ReloadCancelled {
                            weapon,
                            ammo: ammo.clone(),
                            requested_by_user: winding,
                        });
                        continue;
                    }
                    channel.stage = name;
                    channel.elapsed = 0;
                    channel.event_fired = false;
                    hooks.stage.write(ReloadStageEvent {
                        weapon,
                        user,
                        stage: name,
                        phase: StagePhase::Start,
                    });
                }
                Resolution::Stay => {
                    channel.held = true;
                }
                Resolution::Done => {
                    let winding = channel.winding_down;
                    let by_user = channel.cancel_by_user;
                    state.channels.remove(&ammo);
                    if winding {
                        hooks.cancelled.write(ReloadCancelled {
                            weapon,
                            ammo: ammo.clone(),
                            requested_by_user: by_user,
                        });
                    } else {
                        hooks.finished.write(ReloadFinished {
                            weapon,
                            ammo: ammo.clone(),
                        });
                        logger::log(&format!("Weapon {:?} reload finished", weapon));
                    }
                }
            }
        }
    }
}
