use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::RunValueConstants;
use crate::dataset::normalize_name;
use crate::error::Diagnostic;
use crate::stats::PlayerSeasonRecord;

/// League run environment derived from one slice of player-seasons. Built
/// fresh for every slice; a context from another year/team selection carries
/// different coefficients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SabermetricContext {
    pub sample_players: usize,
    pub league_runs: f64,
    /// AB - H + CS + SF. An estimate; double plays and other outs are not counted.
    pub league_outs: f64,
    pub runs_per_out: f64,
    pub run_value_steal: f64,
    pub run_value_caught: f64,
    pub league_steals: f64,
    pub league_caught: f64,
    pub league_opportunities: f64,
    pub league_wsb_rate: f64,
    pub diagnostics: Vec<Diagnostic>,
}

impl SabermetricContext {
    pub fn from_slice(records: &[PlayerSeasonRecord], run_values: RunValueConstants) -> Self {
        let mut runs = 0.0;
        let mut at_bats = 0.0;
        let mut hits = 0.0;
        let mut steals = 0.0;
        let mut caught = 0.0;
        let mut sac_flies = 0.0;
        let mut opportunities = 0.0;
        for r in records {
            runs += r.runs;
            at_bats += r.at_bats;
            hits += r.hits;
            steals += r.stolen_bases;
            caught += r.caught_stealing;
            sac_flies += r.sac_flies;
            opportunities += r.steal_opportunities();
        }

        let mut diagnostics = Vec::new();
        let league_outs = guard_zero(
            "league_outs",
            (at_bats - hits) + caught + sac_flies,
            &mut diagnostics,
        );
        let league_opportunities =
            guard_zero("league_opportunities", opportunities, &mut diagnostics);

        let runs_per_out = runs / league_outs;
        let run_value_steal = run_values.steal_success;
        let run_value_caught =
            -(run_values.caught_outs_multiplier * runs_per_out + run_values.caught_base_cost);
        let league_wsb_rate =
            (steals * run_value_steal + caught * run_value_caught) / league_opportunities;

        tracing::debug!(
            players = records.len(),
            runs_per_out,
            run_value_caught,
            league_wsb_rate,
            "league context computed"
        );

        Self {
            sample_players: records.len(),
            league_runs: runs,
            league_outs,
            runs_per_out,
            run_value_steal,
            run_value_caught,
            league_steals: steals,
            league_caught: caught,
            league_opportunities,
            league_wsb_rate,
            diagnostics,
        }
    }

    pub fn wsb(&self, steals: f64, caught: f64, opportunities: f64) -> f64 {
        steals * self.run_value_steal + caught * self.run_value_caught
            - self.league_wsb_rate * opportunities
    }

    pub fn player_wsb(&self, rec: &PlayerSeasonRecord) -> PlayerWsb {
        let opportunities = rec.steal_opportunities();
        let attempts = rec.steal_attempts();
        PlayerWsb {
            name: rec.name.clone(),
            team: rec.team.clone(),
            year: rec.year,
            steals: rec.stolen_bases,
            caught: rec.caught_stealing,
            attempts,
            success_rate: if attempts > 0.0 {
                rec.stolen_bases / attempts * 100.0
            } else {
                0.0
            },
            opportunities,
            wsb: self.wsb(rec.stolen_bases, rec.caught_stealing, opportunities),
        }
    }
}

fn guard_zero(quantity: &'static str, value: f64, diagnostics: &mut Vec<Diagnostic>) -> f64 {
    if value != 0.0 {
        return value;
    }
    let d = Diagnostic::DegenerateDenominator {
        quantity,
        substituted: 1.0,
    };
    d.log();
    diagnostics.push(d);
    1.0
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PlayerKey {
    pub name: String,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerWsb {
    pub name: String,
    pub team: String,
    pub year: i32,
    pub steals: f64,
    pub caught: f64,
    pub attempts: f64,
    pub success_rate: f64,
    pub opportunities: f64,
    pub wsb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WsbTable {
    pub context: SabermetricContext,
    pub players: BTreeMap<PlayerKey, PlayerWsb>,
}

pub fn compute_wsb_table(records: &[PlayerSeasonRecord]) -> WsbTable {
    compute_wsb_table_with(records, RunValueConstants::default())
}

/// One row per (name, year): the context and the table see the same
/// player-seasons. Split seasons keep the row with the most plate appearances.
pub fn compute_wsb_table_with(
    records: &[PlayerSeasonRecord],
    run_values: RunValueConstants,
) -> WsbTable {
    let records = one_row_per_season(records);
    let context = SabermetricContext::from_slice(&records, run_values);
    let players = records
        .iter()
        .map(|rec| {
            (
                PlayerKey {
                    name: normalize_name(&rec.name),
                    year: rec.year,
                },
                context.player_wsb(rec),
            )
        })
        .collect();
    WsbTable { context, players }
}

fn one_row_per_season(records: &[PlayerSeasonRecord]) -> Vec<PlayerSeasonRecord> {
    let mut slot: HashMap<(String, i32), usize> = HashMap::new();
    let mut out: Vec<PlayerSeasonRecord> = Vec::with_capacity(records.len());
    for rec in records {
        let key = (normalize_name(&rec.name), rec.year);
        match slot.get(&key).copied() {
            Some(idx) => {
                if rec.plate_appearances > out[idx].plate_appearances {
                    out[idx] = rec.clone();
                }
            }
            None => {
                slot.insert(key, out.len());
                out.push(rec.clone());
            }
        }
    }
    if out.len() < records.len() {
        tracing::debug!(
            dropped = records.len() - out.len(),
            "split player-seasons collapsed"
        );
    }
    out
}

/// Best `top_n` and worst `bottom_n` runners with at least `min_attempts`,
/// without repeats, ascending by wSB.
pub fn wsb_leaderboard(
    table: &WsbTable,
    min_attempts: f64,
    top_n: usize,
    bottom_n: usize,
) -> Vec<PlayerWsb> {
    let mut eligible: Vec<&PlayerWsb> = table
        .players
        .values()
        .filter(|p| p.attempts >= min_attempts)
        .collect();
    eligible.sort_by(|a, b| by_wsb(a, b));

    let n = eligible.len();
    let mut picked: Vec<&PlayerWsb> = eligible.iter().take(bottom_n).copied().collect();
    for p in eligible.iter().skip(n.saturating_sub(top_n)) {
        if !picked.iter().any(|q| std::ptr::eq(*q, *p)) {
            picked.push(*p);
        }
    }
    picked.sort_by(|a, b| by_wsb(a, b));
    picked.into_iter().cloned().collect()
}

fn by_wsb(a: &PlayerWsb, b: &PlayerWsb) -> Ordering {
    a.wsb
        .partial_cmp(&b.wsb)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.name.cmp(&b.name))
        .then(a.year.cmp(&b.year))
}
