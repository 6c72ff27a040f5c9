use serde::Serialize;

use crate::calibration::{CalibratedProbability, LogitShift, Verdict, calibrate};
use crate::config::EngineConfig;
use crate::dataset::{BattingTable, PitchingTable};
use crate::error::{Diagnostic, EngineResult};
use crate::model::{ContributionPredictor, FeatureScaler, ModelBundle, ProbabilityClassifier};
use crate::park::{ParkContext, ParkTable};
use crate::team::{TeamLineup, TeamStrength, aggregate_team};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifferentialFeatures {
    /// Home offense minus away offense.
    pub offense_diff: f64,
    /// Away run prevention minus home run prevention; positive favours the home starter.
    pub pitching_diff: f64,
    pub park_multiplier: f64,
}

impl DifferentialFeatures {
    pub fn build(
        home_offense: f64,
        away_offense: f64,
        home_run_prevention: f64,
        away_run_prevention: f64,
        park_multiplier: f64,
    ) -> Self {
        Self {
            offense_diff: home_offense - away_offense,
            pitching_diff: away_run_prevention - home_run_prevention,
            park_multiplier,
        }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.offense_diff, self.pitching_diff, self.park_multiplier]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinProbabilityResult {
    pub home: TeamStrength,
    pub away: TeamStrength,
    pub park: ParkContext,
    pub differential: DifferentialFeatures,
    pub calibration: CalibratedProbability,
    pub verdict: Verdict,
    pub diagnostics: Vec<Diagnostic>,
}

impl WinProbabilityResult {
    pub fn p_raw(&self) -> f64 {
        self.calibration.p_raw
    }

    pub fn p_final(&self) -> f64 {
        self.calibration.p_final
    }
}

pub struct MatchupEngine<'a> {
    pub batting: &'a BattingTable,
    pub pitching: &'a PitchingTable,
    pub predictor: &'a dyn ContributionPredictor,
    pub scaler: &'a dyn FeatureScaler,
    pub classifier: &'a dyn ProbabilityClassifier,
    pub config: EngineConfig,
}

impl<'a> MatchupEngine<'a> {
    pub fn from_bundle(
        bundle: &'a ModelBundle,
        batting: &'a BattingTable,
        pitching: &'a PitchingTable,
        config: EngineConfig,
    ) -> Self {
        Self {
            batting,
            pitching,
            predictor: &bundle.contribution,
            scaler: &bundle.scaler,
            classifier: &bundle.meta,
            config,
        }
    }

    pub fn evaluate_matchup(
        &self,
        home_lineup: &[String],
        home_pitcher: &str,
        away_lineup: &[String],
        away_pitcher: &str,
        park: &ParkContext,
    ) -> EngineResult<WinProbabilityResult> {
        let home = TeamLineup::new(home_lineup.iter().cloned(), home_pitcher);
        let away = TeamLineup::new(away_lineup.iter().cloned(), away_pitcher);
        self.evaluate(&home, &away, park)
    }

    /// Both lineups are validated before any evaluation work starts.
    pub fn evaluate(
        &self,
        home: &TeamLineup,
        away: &TeamLineup,
        park: &ParkContext,
    ) -> EngineResult<WinProbabilityResult> {
        home.validate("home")?;
        away.validate("away")?;

        let cfg = &self.config;
        let home = aggregate_team("home", home, self.batting, self.pitching, self.predictor, cfg)?;
        let away = aggregate_team("away", away, self.batting, self.pitching, self.predictor, cfg)?;

        let differential = DifferentialFeatures::build(
            home.offense,
            away.offense,
            home.starter.run_prevention,
            away.starter.run_prevention,
            park.run_multiplier,
        );
        let calibration = calibrate(
            &differential.to_array(),
            self.scaler,
            self.classifier,
            LogitShift::from_config(cfg),
        );

        let mut diagnostics = home.diagnostics();
        diagnostics.extend(away.diagnostics());
        for d in &diagnostics {
            d.log();
        }
        diagnostics.extend(calibration.diagnostic.clone());

        tracing::info!(
            offense_diff = differential.offense_diff,
            pitching_diff = differential.pitching_diff,
            park = %park.stadium,
            p_raw = calibration.p_raw,
            p_final = calibration.p_final,
            "matchup evaluated"
        );

        Ok(WinProbabilityResult {
            verdict: Verdict::from_probability(calibration.p_final),
            home,
            away,
            park: park.clone(),
            differential,
            calibration,
            diagnostics,
        })
    }

    pub fn evaluate_at(
        &self,
        home: &TeamLineup,
        away: &TeamLineup,
        parks: &ParkTable,
        stadium: &str,
    ) -> EngineResult<WinProbabilityResult> {
        home.validate("home")?;
        away.validate("away")?;
        let park = parks.resolve(stadium)?;
        self.evaluate(home, away, &park)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differential_sign_conventions() {
        let d = DifferentialFeatures::build(30.0, 10.0, 3.0, 4.5, 1.19);
        assert_eq!(d.offense_diff, 20.0);
        assert_eq!(d.pitching_diff, 1.5);
        assert_eq!(d.to_array(), [20.0, 1.5, 1.19]);
    }

    #[test]
    fn weaker_home_side_gives_negative_differentials() {
        let d = DifferentialFeatures::build(5.0, 12.0, 4.8, 3.2, 0.84);
        assert!(d.offense_diff < 0.0);
        assert!(d.pitching_diff < 0.0);
    }
}
