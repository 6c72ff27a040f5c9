use std::env;

/// Home-field correction added in log-odds space; the base model does not see venue.
pub const HOME_FIELD_ADJUSTMENT: f64 = 0.33;
/// Single-game outcomes are never reported outside this band.
pub const CLIP_BAND: (f64, f64) = (0.05, 0.95);
/// Keeps the logit finite when the classifier saturates.
pub const PROBABILITY_EPSILON: f64 = 1e-6;
pub const RECENCY_WEIGHTS: [f64; 2] = [0.7, 0.3];
pub const TARGET_SEASONS: [i32; 2] = [2024, 2025];
/// Roughly a league-average FIP; used when a starter has no pitching record.
pub const DEFAULT_RUN_PREVENTION: f64 = 4.2;
/// Stand-in innings for pitchers with zero IP when deriving ERA and WHIP.
pub const INNINGS_GUARD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunValueConstants {
    pub steal_success: f64,
    /// Caught stealing costs `caught_outs_multiplier * runs_per_out + caught_base_cost`.
    pub caught_outs_multiplier: f64,
    pub caught_base_cost: f64,
}

impl Default for RunValueConstants {
    fn default() -> Self {
        Self {
            steal_success: 0.2,
            caught_outs_multiplier: 2.0,
            caught_base_cost: 0.075,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub home_field_adjustment: f64,
    pub clip_band: (f64, f64),
    pub probability_epsilon: f64,
    pub recency_weights: Vec<f64>,
    pub target_seasons: Vec<i32>,
    pub default_run_prevention: f64,
    pub innings_guard: f64,
    pub run_values: RunValueConstants,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            home_field_adjustment: HOME_FIELD_ADJUSTMENT,
            clip_band: CLIP_BAND,
            probability_epsilon: PROBABILITY_EPSILON,
            recency_weights: RECENCY_WEIGHTS.to_vec(),
            target_seasons: TARGET_SEASONS.to_vec(),
            default_run_prevention: DEFAULT_RUN_PREVENTION,
            innings_guard: INNINGS_GUARD,
            run_values: RunValueConstants::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        let clip_lo = env_f64("CPBL_CLIP_LOW").unwrap_or(d.clip_band.0);
        let clip_hi = env_f64("CPBL_CLIP_HIGH").unwrap_or(d.clip_band.1);
        let clip_band = if clip_lo > 0.0 && clip_lo < clip_hi && clip_hi < 1.0 {
            (clip_lo, clip_hi)
        } else {
            d.clip_band
        };

        Self {
            home_field_adjustment: env_f64("CPBL_HOME_FIELD_ADJUSTMENT")
                .unwrap_or(d.home_field_adjustment),
            clip_band,
            probability_epsilon: env_f64("CPBL_PROBABILITY_EPSILON")
                .filter(|v| *v > 0.0 && *v < 0.5)
                .unwrap_or(d.probability_epsilon),
            recency_weights: env_list::<f64>("CPBL_RECENCY_WEIGHTS")
                .filter(|w| !w.is_empty() && w.iter().all(|v| *v >= 0.0))
                .unwrap_or(d.recency_weights),
            target_seasons: env_list::<i32>("CPBL_TARGET_SEASONS")
                .filter(|s| !s.is_empty())
                .unwrap_or(d.target_seasons),
            default_run_prevention: env_f64("CPBL_DEFAULT_RUN_PREVENTION")
                .unwrap_or(d.default_run_prevention),
            innings_guard: env_f64("CPBL_INNINGS_GUARD")
                .filter(|v| *v > 0.0)
                .unwrap_or(d.innings_guard),
            run_values: RunValueConstants {
                steal_success: env_f64("CPBL_RUN_VALUE_SB").unwrap_or(d.run_values.steal_success),
                ..d.run_values
            },
        }
    }
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn env_list<T: std::str::FromStr>(key: &str) -> Option<Vec<T>> {
    let raw = env::var(key).ok()?;
    raw.split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<T>().ok())
        .collect()
}
