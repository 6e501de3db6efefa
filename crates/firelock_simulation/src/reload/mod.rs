//! Staged reload — конкурентная перезарядка по типам боеприпасов.
//!
//! - `plan` — декларативная таблица стадий (branching — fn pointers)
//! - `plans` — готовые планы: магазинный, поштучный, плоский
//! - `machine` — исполнение каналов + hook events
//!
//! Канал на пару (оружие, ammo type); разные типы перезаряжаются
//! параллельно, повторный старт того же reload — no-op.

pub mod events;
pub mod machine;
pub mod plan;
pub mod plans;


pub use events::{
    ReloadCancelled, ReloadFinished, ReloadRequest, ReloadStageEvent, ReloadStarted, StagePhase,
};
pub use machine::{
    build_context, cancel_now, process_reload_requests, reload_reservoir, start_reload,
    tick_reload, ReloadChannel, ReloadHookWriters, ReloadState,
};
pub use plan::{
    AmmoChamber, NextStage, ReloadContext, ReloadPlan, ReloadStageDef, StageAction, StageName,
};
