use serde::Serialize;

use crate::model::ContributionPredictor;
use crate::stats::BattingRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerContribution {
    pub name: String,
    pub value: f64,
    pub seasons: Vec<i32>,
    pub season_values: Vec<f64>,
    pub weights: Vec<f64>,
}

pub fn normalized_weights(base: &[f64], n: usize) -> Option<Vec<f64>> {
    let used = &base[..n.min(base.len())];
    let total: f64 = used.iter().sum();
    if used.is_empty() || total <= 0.0 {
        return None;
    }
    Some(used.iter().map(|w| w / total).collect())
}

/// Blend the predictor output over `history` (most recent first). Only as many
/// seasons as there are base weights are used. Returns `None` when there is
/// nothing to evaluate.
pub fn evaluate_player<P>(
    name: &str,
    history: &[&BattingRow],
    predictor: &P,
    base_weights: &[f64],
) -> Option<PlayerContribution>
where
    P: ContributionPredictor + ?Sized,
{
    let take = history.len().min(base_weights.len());
    let weights = normalized_weights(base_weights, take)?;
    let rows = &history[..take];

    let order = predictor.feature_names();
    let season_values: Vec<f64> = rows
        .iter()
        .map(|row| predictor.predict(&row.aligned(order)))
        .collect();
    let value: f64 = season_values
        .iter()
        .zip(&weights)
        .map(|(v, w)| v * w)
        .sum();

    tracing::debug!(player = name, value, seasons = rows.len(), "player evaluated");

    Some(PlayerContribution {
        name: name.to_string(),
        value,
        seasons: rows.iter().map(|r| r.year).collect(),
        season_values,
        weights,
    })
}
