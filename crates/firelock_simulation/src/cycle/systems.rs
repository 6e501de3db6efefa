//! Fire cycle systems — control input, стадии цикла, выстрел.
//!
//! Порядок в FixedUpdate: locks → control events → reload → fire cycle →
//! scheduled mode change → spread decay. Выстрел резолвится В ТОМ ЖЕ тике,
//! в котором завершилась его charge стадия.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::ammo::{AmmoContainerLink, AmmoSourceConfig, AmmoStore};
use crate::cycle::ammo_usage::{handle_ammo_usage, has_ammo};
use crate::cycle::components::{ActiveProcesses, FireCycleState, StageProcess};
use crate::cycle::events::{
    ChargeCancelled, ChargeFinished, ChargeStarted, ControlAction, ControlEvent, CooldownCancelled,
    CooldownFinished, CooldownSkipped, CooldownStarted, FireModeChanged, NoAmmo, ShotFired,
    WeaponUnlocked,
};
use crate::deviation::{compose, rescale, to_direction, Deviation, DEFAULT_ANGLE_PRECISION};
use crate::firemode::{FireMode, FireModeCatalog, FiringStyle, ModeFlags, ProjectileKind};
use crate::host::{BodyRadius, HostTerrain, MuzzleOffset, TerrainQuery, WorldPos};
use crate::logger;
use crate::projectile::components::spawn_ballistic;
use crate::projectile::events::{ProjectileHitTarget, ProjectileHitTerrain, ProjectileMissed};
use crate::projectile::resolver::{
    clip_to_bounds, resolve_hitscan, segment_end, SegmentHit, TargetQuery,
};
use crate::projectile::systems::HitWriters;
use crate::reload::machine::{
    build_context, cancel_now, reload_reservoir, start_reload, ReloadHookWriters, ReloadState,
};
use crate::reload::plan::{AmmoChamber, ReloadPlan};
use crate::DeterministicRng;

/// Hook writers fire cycle.
#[derive(SystemParam)]
pub struct FireHookWriters<'w> {
    pub shot: EventWriter<'w, ShotFired>,
    pub no_ammo: EventWriter<'w, NoAmmo>,
    pub charge_started: EventWriter<'w, ChargeStarted>,
    pub charge_finished: EventWriter<'w, ChargeFinished>,
    pub charge_cancelled: EventWriter<'w, ChargeCancelled>,
    pub cooldown_started: EventWriter<'w, CooldownStarted>,
    pub cooldown_finished: EventWriter<'w, CooldownFinished>,
    pub cooldown_skipped: EventWriter<'w, CooldownSkipped>,
}

/// Смена fire mode разрешена вне charge/recovery/reload/lock.
pub fn can_change_firemode(processes: &ActiveProcesses, reload: Option<&ReloadState>) -> bool {
    !processes.is_charging()
        && !processes.is_recovering()
        && !processes.is_locked()
        && reload.map_or(true, |r| !r.is_active())
}

/// System: таймеры weapon lock.
pub fn tick_weapon_locks(
    mut weapons: Query<(Entity, &mut ActiveProcesses)>,
    mut unlocked: EventWriter<WeaponUnlocked>,
) {
    for (weapon, mut processes) in weapons.iter_mut() {
        let Some(lock) = &mut processes.lock else {
            continue;
        };
        // remaining == None — до явного unlock, таймер не тикает
        let Some(remaining) = &mut lock.remaining else {
            continue;
        };
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            processes.lock = None;
            unlocked.write(WeaponUnlocked { weapon });
        }
    }
}

/// System: применение input events хоста к состоянию оружия.
pub fn process_control_events(
    mut events: EventReader<ControlEvent>,
    mut weapons: Query<(
        &mut FireCycleState,
        &mut ActiveProcesses,
        &FireModeCatalog,
        Option<&mut ReloadState>,
    )>,
    mut charge_cancelled: EventWriter<ChargeCancelled>,
    mut cooldown_cancelled: EventWriter<CooldownCancelled>,
) {
    for event in events.read() {
        let Ok((mut cycle, mut processes, catalog, mut reload)) = weapons.get_mut(event.weapon)
        else {
            logger::log_warning(&format!(
                "control event for entity {:?} without fire cycle state",
                event.weapon
            ));
            continue;
        };

        cycle.aim_angle = event.aim_angle;
        match event.action {
            ControlAction::Press | ControlAction::Hold => {
                // Смена пользователя посреди charge отменяет старый charge
                // до того, как новый цикл сможет начаться
                if cycle.user != Some(event.user)
                    && (processes.cancel_charge() || cycle.charged)
                {
                    cycle.charged = false;
                    charge_cancelled.write(ChargeCancelled {
                        weapon: event.weapon,
                        mode: catalog.selected_index(),
                    });
                }
                cycle.is_using = true;
                if event.action == ControlAction::Press {
                    cycle.trigger_pressed = true;
                    cycle.no_ammo_latched = false;
                }
                cycle.user = Some(event.user);
            }
            ControlAction::Release | ControlAction::Cancel => {
                cycle.is_using = false;
                cycle.trigger_pressed = false;
                cycle.charged = false;
                if processes.cancel_charge() {
                    charge_cancelled.write(ChargeCancelled {
                        weapon: event.weapon,
                        mode: catalog.selected_index(),
                    });
                }
                if event.action == ControlAction::Cancel && !catalog.is_empty() {
                    if processes.cancel_cooldown() {
                        cooldown_cancelled.write(CooldownCancelled {
                            weapon: event.weapon,
                            mode: catalog.selected_index(),
                        });
                    }
                    if let Some(reload) = reload.as_deref_mut() {
                        reload.request_cancel(&catalog.get(None).ammo_id, true);
                    }
                }
            }
        }
    }
}

fn finish_cycle(
    cycle: &mut FireCycleState,
    processes: &mut ActiveProcesses,
    weapon: Entity,
    mode_index: usize,
    mode: &FireMode,
    hooks: &mut FireHookWriters,
) {
    cycle.reset_burst(mode_index);
    cycle.charged = false;
    // Full-auto с зажатым триггером не коол-даунится: цикл оборвался по
    // патронам и не должен задерживать перезарядку
    let skip = mode.cooldown_delay == 0 || (mode.style == FiringStyle::Auto && cycle.is_using);
    if skip {
        hooks.cooldown_skipped.write(CooldownSkipped {
            weapon,
            mode: mode_index,
        });
    } else {
        processes.cooldown = Some(StageProcess::new(mode_index, mode.cooldown_delay));
        hooks.cooldown_started.write(CooldownStarted {
            weapon,
            mode: mode_index,
        });
    }
}

#[allow(clippy::too_many_arguments)]
fn fire_shot(
    commands: &mut Commands,
    cycle: &mut FireCycleState,
    weapon: Entity,
    mode_index: usize,
    mode: &FireMode,
    origin: Vec2,
    shooter_radius: f32,
    rng: &mut DeterministicRng,
    terrain: &dyn TerrainQuery,
    targets: &TargetQuery,
    hooks: &mut FireHookWriters,
    hits: &mut HitWriters,
) {
    let shooter = cycle.user;

    // Все источники разброса композируются в ОДИН deviation до сэмплирования;
    // сэмпл — независимый на каждый снаряд (дробовой сноп)
    let composed = compose(&[
        mode.weapon_spread.clone(),
        mode.projectile_spread.clone(),
        Deviation::new(cycle.dynamic_spread, DEFAULT_ANGLE_PRECISION),
    ]);
    let base = rescale(cycle.aim_angle, cycle.aim_precision, composed.precision);
    let count = mode.projectile_count.max(1);
    let mut first_angle = base;

    for index in 0..count {
        let angle = composed.sample(base, &mut rng.rng);
        if index == 0 {
            first_angle = angle;
        }
        let dir = to_direction(angle, composed.precision);

        match mode.projectile_kind {
            ProjectileKind::Hitscan => {
                let outcome = resolve_hitscan(
                    origin,
                    dir,
                    mode.projectile_range,
                    shooter,
                    shooter_radius,
                    mode.never_hit_shooter,
                    None,
                    terrain,
                    targets,
                );
                match outcome {
                    SegmentHit::Target { target, at, t } => {
                        hits.target.write(ProjectileHitTarget {
                            projectile: None,
                            weapon,
                            shooter,
                            target,
                            damage: mode.damage,
                            damage_kind: mode.damage_kind,
                            at,
                            distance: t,
                        });
                    }
                    SegmentHit::Terrain { at, .. } => {
                        hits.terrain.write(ProjectileHitTerrain {
                            projectile: None,
                            weapon,
                            at,
                        });
                    }
                    SegmentHit::Clear => {
                        let len =
                            clip_to_bounds(origin, dir, mode.projectile_range, terrain.bounds());
                        hits.missed.write(ProjectileMissed {
                            projectile: None,
                            weapon,
                            at: segment_end(origin, dir, len),
                        });
                    }
                }
            }
            ProjectileKind::Ballistic => {
                spawn_ballistic(commands, origin, dir, mode, weapon, shooter, shooter_radius);
            }
        }
    }

    cycle.dynamic_spread += mode.spread_added_per_shot;
    hooks.shot.write(ShotFired {
        weapon,
        // Оружие без пользователя стреляет от собственного имени
        user: shooter.unwrap_or(weapon),
        mode: mode_index,
        angle_scaled: first_angle,
        precision: composed.precision,
        projectiles: count,
    });
}

/// System: один тик fire cycle каждого оружия.
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn tick_fire_cycle(
    mut commands: Commands,
    mut weapons: Query<(
        Entity,
        &mut FireCycleState,
        &mut ActiveProcesses,
        &FireModeCatalog,
        &ModeFlags,
        &AmmoSourceConfig,
        Option<&AmmoContainerLink>,
        Option<&mut ReloadState>,
        Option<&ReloadPlan>,
        Option<&mut AmmoChamber>,
        &WorldPos,
        Option<&MuzzleOffset>,
    )>,
    mut stores: Query<&mut AmmoStore>,
    body_radii: Query<&BodyRadius>,
    targets: TargetQuery,
    terrain: Res<HostTerrain>,
    mut rng: ResMut<DeterministicRng>,
    mut hooks: FireHookWriters,
    mut hits: HitWriters,
    mut reload_hooks: ReloadHookWriters,
) {
    for (
        weapon,
        mut cycle,
        mut processes,
        catalog,
        flags,
        config,
        link,
        mut reload_state,
        plan,
        mut chamber,
        pos,
        muzzle,
    ) in weapons.iter_mut()
    {
        if catalog.is_empty() {
            continue;
        }
        let mode_index = catalog.selected_index();
        let mode = catalog.get(None).clone();

        // === Cooldown ===
        if let Some(cooldown) = &mut processes.cooldown {
            if cooldown.tick() {
                let finished_mode = cooldown.mode;
                processes.cooldown = None;
                hooks.cooldown_finished.write(CooldownFinished {
                    weapon,
                    mode: finished_mode,
                });
            }
        }

        // === Recovery: завершение → продолжение очереди или конец цикла ===
        let mut continuation = false;
        let recovery_done = match &mut processes.recovery {
            Some(recovery) => {
                if recovery.tick() {
                    processes.recovery = None;
                    true
                } else {
                    false
                }
            }
            None => false,
        };
        if recovery_done {
            let fired = cycle.shots_in_burst(mode_index);
            let keep_going = match mode.style {
                FiringStyle::Burst => cycle.is_using && fired < mode.burst_count.max(1),
                FiringStyle::Auto => cycle.is_using,
                FiringStyle::Single => false,
            };
            if keep_going {
                continuation = true;
            } else {
                finish_cycle(&mut cycle, &mut processes, weapon, mode_index, &mode, &mut hooks);
            }
        }

        // === Charge ===
        // Принудительная смена режима посреди charge обрывает старый charge
        if let Some(stale_mode) = processes.charge.as_ref().map(|c| c.mode) {
            if stale_mode != mode_index {
                processes.cancel_charge();
                cycle.charged = false;
                hooks.charge_cancelled.write(ChargeCancelled {
                    weapon,
                    mode: stale_mode,
                });
            }
        }
        if let Some(charge) = &mut processes.charge {
            if charge.tick() {
                let charged_mode = charge.mode;
                processes.charge = None;
                cycle.charged = true;
                hooks.charge_finished.write(ChargeFinished {
                    weapon,
                    mode: charged_mode,
                });
            }
        }

        // === Решение о выстреле ===
        let attempt = if continuation {
            // Lock, поставленный посреди очереди, обрывает её
            !processes.is_locked()
        } else if !processes.is_ready_to_fire() || processes.is_charging() {
            false
        } else if cycle.charged {
            true
        } else if !catalog.is_available(mode_index, flags) {
            false
        } else {
            match mode.style {
                FiringStyle::Single | FiringStyle::Burst => cycle.trigger_pressed,
                FiringStyle::Auto => cycle.is_using,
            }
        };
        if !attempt {
            continue;
        }

        // Патроны проверяются в момент попытки, не в момент нажатия
        if !has_ammo(&cycle, mode_index, &mode, &mut stores, weapon, config, link) {
            cycle.trigger_pressed = false;
            cycle.charged = false;
            if !cycle.no_ammo_latched {
                cycle.no_ammo_latched = true;
                hooks.no_ammo.write(NoAmmo {
                    weapon,
                    user: cycle.user.unwrap_or(weapon),
                    mode: mode_index,
                });
            }
            if cycle.shots_in_burst(mode_index) > 0 {
                finish_cycle(&mut cycle, &mut processes, weapon, mode_index, &mode, &mut hooks);
            }
            if mode.auto_reload {
                if let (Some(state), Some(plan), Some(user)) =
                    (reload_state.as_deref_mut(), plan, cycle.user)
                {
                    let reservoir = reload_reservoir(link, user);
                    let ctx =
                        build_context(&mut stores, weapon, reservoir, &mode.ammo_id, chamber.as_deref());
                    start_reload(
                        state,
                        plan,
                        &ctx,
                        weapon,
                        user,
                        &mode.ammo_id,
                        mode_index,
                        &mut reload_hooks,
                    );
                }
            }
            continue;
        }

        // Charge стадия перед первым выстрелом цикла
        if mode.charge_delay > 0 && !cycle.charged && !continuation {
            cycle.trigger_pressed = false;
            processes.charge = Some(StageProcess::new(mode_index, mode.charge_delay));
            hooks.charge_started.write(ChargeStarted {
                weapon,
                mode: mode_index,
            });
            continue;
        }

        // === Выстрел ===
        cycle.trigger_pressed = false;
        cycle.charged = false;

        if !handle_ammo_usage(&mut cycle, mode_index, &mode, &mut stores, weapon, config, link) {
            // Источник выдал меньше ammo_usage — осечка
            if !cycle.no_ammo_latched {
                cycle.no_ammo_latched = true;
                hooks.no_ammo.write(NoAmmo {
                    weapon,
                    user: cycle.user.unwrap_or(weapon),
                    mode: mode_index,
                });
            }
            if cycle.shots_in_burst(mode_index) > 0 {
                finish_cycle(&mut cycle, &mut processes, weapon, mode_index, &mode, &mut hooks);
            }
            continue;
        }

        // Выстрел досланным патроном прерывает перезарядку этого типа
        if let Some(state) = reload_state.as_deref_mut() {
            cancel_now(state, weapon, &mode.ammo_id, false, &mut reload_hooks);
        }

        let origin = pos.0 + muzzle.map_or(Vec2::ZERO, |m| m.0);
        let shooter_radius = cycle
            .user
            .and_then(|user| body_radii.get(user).ok())
            .map_or(BodyRadius::default().0, |r| r.0);

        fire_shot(
            &mut commands,
            &mut cycle,
            weapon,
            mode_index,
            &mode,
            origin,
            shooter_radius,
            &mut rng,
            terrain.0.as_ref(),
            &targets,
            &mut hooks,
            &mut hits,
        );

        let fired = cycle.shots_in_burst(mode_index) + 1;
        cycle.shots_fired_in_burst.insert(mode_index, fired);

        // Авто-цикл каморы: следующий патрон досылается сам, пока есть откуда
        if let Some(chamber) = chamber.as_deref_mut() {
            if chamber.enabled {
                chamber.loaded =
                    has_ammo(&cycle, mode_index, &mode, &mut stores, weapon, config, link);
            }
        }

        // Recovery всегда минимум 1 тик — кадровая частота ограничивает
        // скорострельность сверху
        processes.recovery = Some(StageProcess::new(mode_index, mode.recovery_delay.max(1)));
    }
}

/// System: применение отложенной смены fire mode в безопасной точке.
pub fn apply_scheduled_mode_change(
    mut weapons: Query<(
        Entity,
        &mut FireModeCatalog,
        &ModeFlags,
        &ActiveProcesses,
        Option<&ReloadState>,
    )>,
    mut changed: EventWriter<FireModeChanged>,
) {
    for (weapon, mut catalog, flags, processes, reload) in weapons.iter_mut() {
        let Some(index) = catalog.scheduled_index() else {
            continue;
        };
        if !can_change_firemode(processes, reload) {
            continue;
        }
        // Pending запрос снимается в любом случае: применение происходит
        // ровно один раз, даже если режим к этому моменту стал недоступен
        let applied = catalog.set_selected(index, false, true, flags);
        catalog.clear_scheduled();
        if applied {
            changed.write(FireModeChanged { weapon, index });
            logger::log(&format!("Weapon {:?} switched to fire mode {}", weapon, index));
        }
    }
}

/// System: линейное восстановление динамического разброса.
pub fn decay_dynamic_spread(mut weapons: Query<&mut FireCycleState>) {
    for mut cycle in weapons.iter_mut() {
        if cycle.dynamic_spread > 0 && cycle.spread_recovery_per_tick > 0 {
            cycle.dynamic_spread = (cycle.dynamic_spread - cycle.spread_recovery_per_tick).max(0);
        }
    }
}
