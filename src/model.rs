use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Width of the matchup differential vector: offense, pitching, park.
pub const DIFFERENTIAL_WIDTH: usize = 3;

const BUNDLE_FILE: &str = "model_bundle_v1.json";
const CACHE_DIR: &str = "cpbl_predictor";

/// Fitted per-player regression. `feature_names` is the column order the
/// model was trained with.
pub trait ContributionPredictor: Send + Sync {
    fn feature_names(&self) -> &[String];
    fn predict(&self, features: &[f64]) -> f64;
}

pub trait FeatureScaler: Send + Sync {
    fn transform(&self, raw: &[f64]) -> Vec<f64>;
}

/// Fitted binary classifier; index 1 is the home-win class.
pub trait ProbabilityClassifier: Send + Sync {
    fn predict_proba(&self, features: &[f64]) -> [f64; 2];
}

impl<F> FeatureScaler for F
where
    F: Fn(&[f64]) -> Vec<f64> + Send + Sync,
{
    fn transform(&self, raw: &[f64]) -> Vec<f64> {
        self(raw)
    }
}

impl<F> ProbabilityClassifier for F
where
    F: Fn(&[f64]) -> [f64; 2] + Send + Sync,
{
    fn predict_proba(&self, features: &[f64]) -> [f64; 2] {
        self(features)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityScaler;

impl FeatureScaler for IdentityScaler {
    fn transform(&self, raw: &[f64]) -> Vec<f64> {
        raw.to_vec()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearContributionModel {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub intercept: f64,
    pub coeffs: Vec<f64>,
}

impl ContributionPredictor for LinearContributionModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: &[f64]) -> f64 {
        self.intercept + dot(&self.coeffs, features)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScalerArtifact {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl FeatureScaler for StandardScalerArtifact {
    fn transform(&self, raw: &[f64]) -> Vec<f64> {
        raw.iter()
            .enumerate()
            .map(|(idx, x)| {
                let mean = self.means.get(idx).copied().unwrap_or(0.0);
                let std = self.stds.get(idx).copied().unwrap_or(1.0);
                // Zero-variance columns are left unscaled.
                let std = if std > 0.0 { std } else { 1.0 };
                (x - mean) / std
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticMetaClassifier {
    #[serde(default)]
    pub intercept: f64,
    pub coeffs: Vec<f64>,
}

impl ProbabilityClassifier for LogisticMetaClassifier {
    fn predict_proba(&self, features: &[f64]) -> [f64; 2] {
        let z = self.intercept + dot(&self.coeffs, features);
        let p = 1.0 / (1.0 + (-z).exp());
        [1.0 - p, p]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub version: u32,
    pub generated_at: String,
    #[serde(default)]
    pub source: Option<String>,
    pub contribution: LinearContributionModel,
    pub scaler: StandardScalerArtifact,
    pub meta: LogisticMetaClassifier,
}

impl ModelBundle {
    pub fn from_json(raw: &str) -> EngineResult<Self> {
        let bundle = serde_json::from_str::<ModelBundle>(raw)?;
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let c = &self.contribution;
        if c.feature_names.is_empty() || c.feature_names.len() != c.coeffs.len() {
            return Err(EngineError::Artifact(format!(
                "contribution model has {} feature names but {} coefficients",
                c.feature_names.len(),
                c.coeffs.len()
            )));
        }
        if self.scaler.means.len() != DIFFERENTIAL_WIDTH
            || self.scaler.stds.len() != DIFFERENTIAL_WIDTH
        {
            return Err(EngineError::Artifact(format!(
                "scaler must cover {DIFFERENTIAL_WIDTH} columns"
            )));
        }
        if self.meta.coeffs.len() != DIFFERENTIAL_WIDTH {
            return Err(EngineError::Artifact(format!(
                "meta classifier expects {} inputs, differential has {DIFFERENTIAL_WIDTH}",
                self.meta.coeffs.len()
            )));
        }
        Ok(())
    }
}

/// Resolve the bundle: env override, then the user cache, then the copy
/// compiled into the binary.
pub fn load_model_bundle() -> Result<ModelBundle> {
    for path in [bundle_path_override(), default_bundle_cache_path()]
        .into_iter()
        .flatten()
    {
        if !path.exists() {
            continue;
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read model bundle {}", path.display()))?;
        let bundle = ModelBundle::from_json(&raw)
            .with_context(|| format!("parse model bundle {}", path.display()))?;
        tracing::info!(path = %path.display(), version = bundle.version, "model bundle loaded");
        return Ok(bundle);
    }

    let raw = include_str!("../assets/model_bundle_v1.json");
    let bundle = ModelBundle::from_json(raw).context("parse bundled model_bundle_v1")?;
    tracing::info!(version = bundle.version, "bundled model loaded");
    Ok(bundle)
}

pub fn global_bundle() -> Option<&'static ModelBundle> {
    static BUNDLE: OnceLock<Option<ModelBundle>> = OnceLock::new();
    BUNDLE
        .get_or_init(|| match load_model_bundle() {
            Ok(bundle) => Some(bundle),
            Err(err) => {
                tracing::error!(error = %err, "model bundle unavailable");
                None
            }
        })
        .as_ref()
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn bundle_path_override() -> Option<PathBuf> {
    env::var("CPBL_MODEL_BUNDLE_PATH")
        .ok()
        .map(|s| PathBuf::from(s.trim()))
}

fn default_bundle_cache_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(BUNDLE_FILE))
}

fn dot(coeffs: &[f64], xs: &[f64]) -> f64 {
    coeffs.iter().zip(xs).map(|(c, x)| c * x).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_artifact_is_valid() {
        let raw = include_str!("../assets/model_bundle_v1.json");
        let bundle = ModelBundle::from_json(raw).expect("bundled artifact");
        assert_eq!(bundle.meta.coeffs.len(), DIFFERENTIAL_WIDTH);
        assert!(!bundle.contribution.feature_names.is_empty());
    }

    #[test]
    fn validate_rejects_mismatched_coefficients() {
        let mut bundle =
            ModelBundle::from_json(include_str!("../assets/model_bundle_v1.json")).unwrap();
        bundle.contribution.coeffs.pop();
        assert!(matches!(bundle.validate(), Err(EngineError::Artifact(_))));
    }

    #[test]
    fn logistic_probabilities_sum_to_one() {
        let clf = LogisticMetaClassifier {
            intercept: 0.1,
            coeffs: vec![0.5, -0.2, 0.0],
        };
        let [p0, p1] = clf.predict_proba(&[1.0, 2.0, 3.0]);
        assert!((p0 + p1 - 1.0).abs() < 1e-12);
        assert!((p1 - 1.0 / (1.0 + (-0.2_f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn scaler_guards_zero_std() {
        let sc = StandardScalerArtifact {
            means: vec![1.0, 0.0, 1.0],
            stds: vec![2.0, 0.0, 0.5],
        };
        assert_eq!(sc.transform(&[3.0, 4.0, 2.0]), vec![1.0, 4.0, 2.0]);
    }

    #[test]
    fn closures_act_as_collaborators() {
        let clf = |_: &[f64]| [0.4, 0.6];
        assert_eq!(clf.predict_proba(&[0.0; 3])[1], 0.6);
        let sc = |x: &[f64]| x.iter().map(|v| v * 2.0).collect::<Vec<_>>();
        assert_eq!(sc.transform(&[1.0]), vec![2.0]);
    }
}
