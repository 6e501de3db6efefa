//! Ammo usage bookkeeping — spare shot credit.
//!
//! Модель «магазин выдаёт `ammo_rate` выстрелов за `ammo_usage` списанных
//! единиц»: списание происходит только когда кредит исчерпан. Если источник
//! выдал меньше запрошенного — возвращаем взятое и сообщаем о нехватке, НЕ
//! занося новый кредит.

use bevy::prelude::*;

use crate::ammo::{routed_do, routed_get, AmmoContainerLink, AmmoSourceConfig, AmmoStore};
use crate::cycle::components::FireCycleState;
use crate::firemode::FireMode;

/// Есть ли чем стрелять в данном режиме (кредит или источник).
pub fn has_ammo(
    cycle: &FireCycleState,
    mode_index: usize,
    mode: &FireMode,
    stores: &mut Query<&mut AmmoStore>,
    weapon: Entity,
    config: &AmmoSourceConfig,
    link: Option<&AmmoContainerLink>,
) -> bool {
    if cycle.credit(mode_index) > 0 {
        return true;
    }
    routed_get(stores, weapon, config, link, &mode.ammo_id) >= mode.ammo_usage
}

/// Списание за один выстрел. false = патронов не хватило, выстрела нет.
pub fn handle_ammo_usage(
    cycle: &mut FireCycleState,
    mode_index: usize,
    mode: &FireMode,
    stores: &mut Query<&mut AmmoStore>,
    weapon: Entity,
    config: &AmmoSourceConfig,
    link: Option<&AmmoContainerLink>,
) -> bool {
    let credit = cycle.credit(mode_index);
    if credit > 0 {
        cycle.set_credit(mode_index, credit - 1);
        return true;
    }

    // Кредит пуст: снимаем ammo_usage единиц за ammo_rate будущих выстрелов
    let taken = -routed_do(stores, weapon, config, link, &mode.ammo_id, -mode.ammo_usage);
    if taken < mode.ammo_usage {
        // Источник выдал меньше запрошенного — возвращаем и не банкуем
        if taken > 0 {
            routed_do(stores, weapon, config, link, &mode.ammo_id, taken);
        }
        return false;
    }

    // Этот выстрел оплачен, остаток уходит в кредит
    cycle.set_credit(mode_index, mode.ammo_rate.max(1) - 1);
    true
}
