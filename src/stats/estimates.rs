use std::time::Duration;

use serde::Serialize;

const CALORIES_PER_STEP: f32 = 0.04;
const STEPS_PER_MINUTE: u64 = 130;
const REMAINDER_STEPS_PER_SEC: f64 = 2.2;

/// Rough kcal estimate for the home screen tiles.
pub fn estimated_calories(steps: u64) -> f32 {
    steps as f32 * CALORIES_PER_STEP
}

/// Rough walking time for a step count: whole minutes at a 130 steps/min
/// cadence, the remainder at 2.2 steps/sec.
pub fn estimated_active_duration(steps: u64) -> Duration {
    let minutes = steps / STEPS_PER_MINUTE;
    let remainder_secs = (steps % STEPS_PER_MINUTE) as f64 / REMAINDER_STEPS_PER_SEC;
    Duration::from_secs(minutes * 60) + Duration::from_secs_f64(remainder_secs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

/// Body mass index from weight in kilograms and height in centimeters.
/// `None` for non-positive inputs.
pub fn bmi(weight_kg: f32, height_cm: f32) -> Option<f32> {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

pub fn bmi_category(bmi: f32) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}
