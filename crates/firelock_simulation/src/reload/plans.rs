//! Готовые reload-планы.

use crate::reload::plan::{
    NextStage, ReloadContext, ReloadPlan, ReloadStageDef, StageAction, StageName,
};

fn magazine_entry(ctx: &ReloadContext) -> Option<StageName> {
    if ctx.source_ammo <= 0 {
        return None;
    }
    let magazine_full = ctx.weapon_ammo >= ctx.weapon_capacity;
    let chamber_ok = !ctx.chamber_enabled || ctx.chamber_loaded;
    if magazine_full && chamber_ok {
        return None;
    }
    Some("Prepare")
}

fn after_prepare(ctx: &ReloadContext) -> Option<StageName> {
    // Непустой магазин сперва извлекается; пустой — сразу вставка нового
    if ctx.weapon_ammo > 0 {
        Some("EjectAmmo")
    } else {
        Some("InsertAmmo")
    }
}

fn after_close(ctx: &ReloadContext) -> Option<StageName> {
    if ctx.chamber_enabled && !ctx.chamber_loaded {
        Some("LoadChamber")
    } else {
        Some("ReadyWeapon")
    }
}

/// Магазинная перезарядка:
/// `Prepare → (EjectAmmo → StashStart → StashFinish)? → InsertAmmo → Close
/// → (LoadChamber)? → ReadyWeapon`.
pub fn magazine() -> ReloadPlan {
    ReloadPlan::new(
        vec![
            ReloadStageDef::new("Prepare", 5, NextStage::Dynamic(after_prepare)),
            ReloadStageDef::new("EjectAmmo", 8, NextStage::Literal("StashStart"))
                .with_action(StageAction::EjectToSource),
            ReloadStageDef::new("StashStart", 6, NextStage::Literal("StashFinish")),
            ReloadStageDef::new("StashFinish", 6, NextStage::Literal("InsertAmmo")),
            ReloadStageDef::new("InsertAmmo", 10, NextStage::Literal("Close"))
                .with_action(StageAction::InsertFromSource)
                .with_event_at(5),
            ReloadStageDef::new("Close", 5, NextStage::Dynamic(after_close)),
            ReloadStageDef::new("LoadChamber", 8, NextStage::Literal("ReadyWeapon"))
                .with_action(StageAction::LoadChamber),
            ReloadStageDef::new("ReadyWeapon", 4, NextStage::Idle),
        ],
        magazine_entry,
    )
}

fn single_round_entry(ctx: &ReloadContext) -> Option<StageName> {
    if ctx.source_ammo <= 0 || ctx.weapon_ammo >= ctx.weapon_capacity {
        return None;
    }
    Some("OpenBolt")
}

fn after_insert_round(ctx: &ReloadContext) -> Option<StageName> {
    // Петля: по одному патрону пока магазин не полон и источник не пуст
    if ctx.weapon_ammo < ctx.weapon_capacity && ctx.source_ammo > 0 {
        Some("InsertRound")
    } else {
        Some("CloseBolt")
    }
}

/// Поштучная перезарядка (дробовик): петля `InsertRound` с branching
/// re-check'ом после каждого патрона. Abort доигрывает закрытие затвора.
pub fn single_round() -> ReloadPlan {
    ReloadPlan::new(
        vec![
            ReloadStageDef::new("OpenBolt", 6, NextStage::Literal("InsertRound")),
            ReloadStageDef::new("InsertRound", 9, NextStage::Dynamic(after_insert_round))
                .with_action(StageAction::InsertSingleRound)
                .with_abort_to("CloseBolt"),
            ReloadStageDef::new("CloseBolt", 6, NextStage::Literal("ReadyWeapon")),
            ReloadStageDef::new("ReadyWeapon", 3, NextStage::Idle),
        ],
        single_round_entry,
    )
}

fn flat_entry(ctx: &ReloadContext) -> Option<StageName> {
    if ctx.source_ammo <= 0 || ctx.weapon_ammo >= ctx.weapon_capacity {
        return None;
    }
    Some("Reload")
}

/// Плоская перезарядка без стадий: один таймер (delay из fire mode),
/// один финиш-callback.
pub fn flat() -> ReloadPlan {
    ReloadPlan::new(
        vec![ReloadStageDef::new("Reload", 0, NextStage::Idle)
            .with_action(StageAction::InsertFromSource)],
        flat_entry,
    )
}
