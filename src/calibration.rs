use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::Diagnostic;
use crate::model::{FeatureScaler, ProbabilityClassifier};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogitShift {
    pub adjustment: f64,
    pub epsilon: f64,
    pub clip_low: f64,
    pub clip_high: f64,
}

impl LogitShift {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            adjustment: cfg.home_field_adjustment,
            epsilon: cfg.probability_epsilon,
            clip_low: cfg.clip_band.0,
            clip_high: cfg.clip_band.1,
        }
    }
}

impl Default for LogitShift {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Every intermediate of one calibration, kept for the audit panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibratedProbability {
    pub scaled: Vec<f64>,
    pub p_raw: f64,
    pub p_clamped: f64,
    pub logit_raw: f64,
    pub adjustment: f64,
    pub logit_final: f64,
    pub p_unclipped: f64,
    pub p_final: f64,
    pub diagnostic: Option<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    HomeFavoured,
    Balanced,
    AwayFavoured,
}

impl Verdict {
    pub fn from_probability(p_home: f64) -> Self {
        if p_home > 0.55 {
            Verdict::HomeFavoured
        } else if p_home < 0.45 {
            Verdict::AwayFavoured
        } else {
            Verdict::Balanced
        }
    }
}

pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

pub fn calibrate<S, C>(
    differential: &[f64],
    scaler: &S,
    classifier: &C,
    shift: LogitShift,
) -> CalibratedProbability
where
    S: FeatureScaler + ?Sized,
    C: ProbabilityClassifier + ?Sized,
{
    let scaled = scaler.transform(differential);
    let p_raw = classifier.predict_proba(&scaled)[1];

    // NaN from a broken classifier lands on the midpoint instead of poisoning the logit.
    let p_safe = if p_raw.is_nan() { 0.5 } else { p_raw };
    let p_clamped = p_safe.clamp(shift.epsilon, 1.0 - shift.epsilon);
    let diagnostic = (p_clamped != p_raw).then(|| Diagnostic::ModelOutputDegenerate {
        raw: p_raw,
        clamped: p_clamped,
    });
    if let Some(d) = &diagnostic {
        d.log();
    }

    let logit_raw = logit(p_clamped);
    let logit_final = logit_raw + shift.adjustment;
    let p_unclipped = sigmoid(logit_final);
    let p_final = p_unclipped.clamp(shift.clip_low, shift.clip_high);

    CalibratedProbability {
        scaled,
        p_raw,
        p_clamped,
        logit_raw,
        adjustment: shift.adjustment,
        logit_final,
        p_unclipped,
        p_final,
        diagnostic,
    }
}
