//! Deviation math — precision-scaled randomized angular spread.
//!
//! Углы хранятся как целые «градусы × precision» (fixed-point). Несколько
//! независимых deviation'ов (разброс оружия, разброс снаряда, накопленный
//! динамический разброс стрелка) композируются в ОДИН deviation до
//! сэмплирования: сумма независимых сэмплов дала бы другую форму
//! распределения, чем сэмпл композиции.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};


/// Базовый precision для углов прицеливания (сотые доли градуса).
pub const DEFAULT_ANGLE_PRECISION: i32 = 100;

/// Angular deviation: набор независимых компонент разброса + их общий
/// fixed-point precision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Reflect)]
pub struct Deviation {
    /// Компоненты разброса, градусы × precision. Каждая сэмплируется
    /// равномерно из `[-a, a]` независимо от остальных.
    pub angles: Vec<i32>,
    /// Fixed-point масштаб всех компонент. Всегда > 0.
    pub precision: i32,
}

impl Deviation {
    /// Один компонент разброса.
    pub fn new(angle: i32, precision: i32) -> Self {
        assert!(precision > 0, "deviation precision must be positive");
        Self {
            angles: vec![angle],
            precision,
        }
    }

    /// Несколько компонент на общем precision.
    pub fn many(angles: Vec<i32>, precision: i32) -> Self {
        assert!(precision > 0, "deviation precision must be positive");
        Self { angles, precision }
    }

    /// Пустой deviation (сэмпл всегда равен базовому углу).
    pub fn none() -> Self {
        Self {
            angles: Vec::new(),
            precision: 1,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.angles.iter().all(|a| *a == 0)
    }

    /// Перемасштабировать все компоненты к другому precision.
    pub fn rescaled(&self, precision: i32) -> Deviation {
        assert!(precision > 0, "deviation precision must be positive");
        let angles = self
            .angles
            .iter()
            .map(|a| rescale(*a, self.precision, precision))
            .collect();
        Deviation {
            angles,
            precision,
        }
    }

    /// Сэмпл: базовый угол (уже в масштабе `self.precision`) плюс
    /// независимый равномерный offset на каждую компоненту.
    pub fn sample(&self, base_scaled: i32, rng: &mut impl Rng) -> i32 {
        let mut angle = base_scaled;
        for component in &self.angles {
            let bound = component.abs();
            if bound > 0 {
                angle += rng.gen_range(-bound..=bound);
            }
        }
        angle
    }
}

/// Перемасштабирование значения между fixed-point precision'ами.
/// i64 промежуточно — произведения больших углов на precision 1000
/// не влезают в i32 без запаса.
pub fn rescale(value: i32, from: i32, to: i32) -> i32 {
    assert!(from > 0 && to > 0, "precision must be positive");
    ((value as i64 * to as i64) / from as i64) as i32
}

/// Композиция независимых deviation'ов: всё перемасштабируется к
/// максимальному precision среди операндов, компоненты конкатенируются.
/// Коммутативна с точностью до порядка компонент.
pub fn compose(deviations: &[Deviation]) -> Deviation {
    let max_precision = deviations
        .iter()
        .map(|d| d.precision)
        .max()
        .unwrap_or(1);

    let mut angles = Vec::new();
    for deviation in deviations {
        angles.extend(deviation.rescaled(max_precision).angles);
    }

    Deviation {
        angles,
        precision: max_precision,
    }
}

/// Направление выстрела из scaled-угла: angle 0 = вверх, y вниз.
pub fn to_direction(angle_scaled: i32, precision: i32) -> Vec2 {
    assert!(precision > 0, "precision must be positive");
    let radians = (angle_scaled as f32 / precision as f32).to_radians();
    Vec2::new(radians.sin(), -radians.cos())
}
