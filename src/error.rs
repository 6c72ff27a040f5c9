use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Failures that abort a single request. Everything recoverable is reported
/// through [`Diagnostic`] instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("invalid model artifact: {0}")]
    Artifact(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Diagnostic {
    MissingBatter { name: String },
    MissingPitcher { name: String, fallback: f64 },
    DegenerateDenominator { quantity: &'static str, substituted: f64 },
    ModelOutputDegenerate { raw: f64, clamped: f64 },
}

impl Diagnostic {
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::MissingBatter { .. } => "missing_batter",
            Diagnostic::MissingPitcher { .. } => "missing_pitcher",
            Diagnostic::DegenerateDenominator { .. } => "degenerate_denominator",
            Diagnostic::ModelOutputDegenerate { .. } => "model_output_degenerate",
        }
    }

    pub fn log(&self) {
        match self {
            Diagnostic::MissingBatter { name } => {
                tracing::warn!(code = self.code(), batter = %name, "no qualifying season, omitted from team total");
            }
            Diagnostic::MissingPitcher { name, fallback } => {
                tracing::warn!(code = self.code(), pitcher = %name, fallback, "no pitching record, using fallback");
            }
            Diagnostic::DegenerateDenominator {
                quantity,
                substituted,
            } => {
                tracing::warn!(code = self.code(), quantity, substituted, "zero denominator replaced");
            }
            Diagnostic::ModelOutputDegenerate { raw, clamped } => {
                tracing::warn!(code = self.code(), raw, clamped, "classifier probability clamped before logit");
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingBatter { name } => write!(f, "{name}: no qualifying batting season"),
            Diagnostic::MissingPitcher { name, fallback } => {
                write!(f, "{name}: no pitching record, used {fallback:.2}")
            }
            Diagnostic::DegenerateDenominator {
                quantity,
                substituted,
            } => write!(f, "{quantity} was zero, substituted {substituted}"),
            Diagnostic::ModelOutputDegenerate { raw, clamped } => {
                write!(f, "classifier returned {raw}, clamped to {clamped}")
            }
        }
    }
}
