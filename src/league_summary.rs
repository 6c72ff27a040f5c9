use std::collections::BTreeMap;

use serde::Serialize;

use crate::stats::{PitcherSeasonRecord, PlayerSeasonRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherBetter,
    LowerBetter,
}

pub fn weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / total
}

pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mx = xs.iter().sum::<f64>() / n as f64;
    let my = ys.iter().sum::<f64>() / n as f64;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some(sxy / (sxx.sqrt() * syy.sqrt()))
}

pub fn percentile_scores(values: &[f64], direction: Direction) -> Vec<f64> {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() || hi == lo {
        return vec![50.0; values.len()];
    }
    values
        .iter()
        .map(|v| match direction {
            Direction::HigherBetter => (v - lo) / (hi - lo) * 100.0,
            Direction::LowerBetter => (hi - v) / (hi - lo) * 100.0,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSeasonLine {
    pub team: String,
    pub year: i32,
    pub ops: f64,
    pub era: Option<f64>,
}

pub fn team_season_lines(
    batting: &[PlayerSeasonRecord],
    pitching: &[PitcherSeasonRecord],
) -> Vec<TeamSeasonLine> {
    let mut bat: BTreeMap<(i32, String), (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for r in batting {
        let e = bat.entry((r.year, r.team.clone())).or_default();
        e.0.push(r.ops);
        e.1.push(r.plate_appearances);
    }
    let mut pit: BTreeMap<(i32, String), (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for r in pitching {
        let e = pit.entry((r.year, r.team.clone())).or_default();
        e.0.push(r.era);
        e.1.push(r.innings_pitched);
    }

    bat.into_iter()
        .map(|((year, team), (ops, pa))| {
            let era = pit
                .get(&(year, team.clone()))
                .map(|(era, ip)| weighted_average(era, ip));
            TeamSeasonLine {
                team,
                year,
                ops: weighted_average(&ops, &pa),
                era,
            }
        })
        .collect()
}

pub fn avg_ops_correlation(records: &[PlayerSeasonRecord]) -> Option<f64> {
    let avg: Vec<f64> = records.iter().map(|r| r.batting_average).collect();
    let ops: Vec<f64> = records.iter().map(|r| r.ops).collect();
    pearson_correlation(&avg, &ops)
}
