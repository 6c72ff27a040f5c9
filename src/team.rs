use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::dataset::{BattingTable, PitchingTable, normalize_name};
use crate::error::{Diagnostic, EngineError, EngineResult};
use crate::evaluator::{PlayerContribution, evaluate_player};
use crate::model::ContributionPredictor;

pub const LINEUP_SIZE: usize = 9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLineup {
    pub batters: Vec<String>,
    pub starter: String,
}

impl TeamLineup {
    pub fn new<I, S>(batters: I, starter: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            batters: batters.into_iter().map(Into::into).collect(),
            starter: starter.into(),
        }
    }

    pub fn validate(&self, side: &str) -> EngineResult<()> {
        if self.batters.len() != LINEUP_SIZE {
            return Err(EngineError::Precondition(format!(
                "{side} lineup has {} batters, expected {LINEUP_SIZE}",
                self.batters.len()
            )));
        }
        let mut seen = HashSet::with_capacity(LINEUP_SIZE);
        for name in &self.batters {
            let key = normalize_name(name);
            if key.is_empty() {
                return Err(EngineError::Precondition(format!(
                    "{side} lineup contains a blank batter name"
                )));
            }
            if !seen.insert(key) {
                return Err(EngineError::Precondition(format!(
                    "{side} lineup lists {name} more than once"
                )));
            }
        }
        if normalize_name(&self.starter).is_empty() {
            return Err(EngineError::Precondition(format!(
                "{side} starting pitcher is blank"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StarterValue {
    pub name: String,
    pub run_prevention: f64,
    pub from_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStrength {
    pub offense: f64,
    pub contributions: Vec<PlayerContribution>,
    pub missing_batters: Vec<String>,
    pub starter: StarterValue,
}

impl TeamStrength {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out: Vec<Diagnostic> = self
            .missing_batters
            .iter()
            .map(|name| Diagnostic::MissingBatter { name: name.clone() })
            .collect();
        if self.starter.from_fallback {
            out.push(Diagnostic::MissingPitcher {
                name: self.starter.name.clone(),
                fallback: self.starter.run_prevention,
            });
        }
        out
    }
}

/// Sum of blended contributions over the batters that have a qualifying
/// season. Batters without one are reported, not counted as zero.
pub fn team_offense<P>(
    batters: &[String],
    table: &BattingTable,
    predictor: &P,
    cfg: &EngineConfig,
) -> (f64, Vec<PlayerContribution>, Vec<String>)
where
    P: ContributionPredictor + ?Sized,
{
    let limit = cfg.recency_weights.len();
    let evaluated: Vec<(String, Option<PlayerContribution>)> = batters
        .par_iter()
        .map(|name| {
            let history = table.recent_seasons(name, &cfg.target_seasons, limit);
            let contribution = evaluate_player(name, &history, predictor, &cfg.recency_weights);
            (name.clone(), contribution)
        })
        .collect();

    let mut total = 0.0;
    let mut contributions = Vec::with_capacity(evaluated.len());
    let mut missing = Vec::new();
    for (name, contribution) in evaluated {
        match contribution {
            Some(c) => {
                total += c.value;
                contributions.push(c);
            }
            None => missing.push(name),
        }
    }
    (total, contributions, missing)
}

pub fn starter_run_prevention(name: &str, table: &PitchingTable, fallback: f64) -> StarterValue {
    match table.latest_run_prevention(name) {
        Some(value) => StarterValue {
            name: name.to_string(),
            run_prevention: value,
            from_fallback: false,
        },
        None => StarterValue {
            name: name.to_string(),
            run_prevention: fallback,
            from_fallback: true,
        },
    }
}

pub fn aggregate_team<P>(
    side: &str,
    lineup: &TeamLineup,
    batting: &BattingTable,
    pitching: &PitchingTable,
    predictor: &P,
    cfg: &EngineConfig,
) -> EngineResult<TeamStrength>
where
    P: ContributionPredictor + ?Sized,
{
    lineup.validate(side)?;
    let (offense, contributions, missing_batters) =
        team_offense(&lineup.batters, batting, predictor, cfg);
    let starter = starter_run_prevention(&lineup.starter, pitching, cfg.default_run_prevention);
    Ok(TeamStrength {
        offense,
        contributions,
        missing_batters,
        starter,
    })
}
