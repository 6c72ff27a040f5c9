use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::dataset::{canonical_team, normalize_name};
use crate::error::{EngineError, EngineResult};

/// Run-scoring multipliers per stadium (1.0 = neutral).
pub const PARK_FACTORS: [(&str, f64); 7] = [
    ("Taichung Intercontinental", 1.19),
    ("Chengcing Lake", 1.03),
    ("Tianmu", 0.96),
    ("Xinzhuang", 0.90),
    ("Rakuten Taoyuan", 1.18),
    ("Tainan", 0.91),
    ("Taipei Dome", 0.84),
];

pub const HOME_STADIUMS: [(&str, &[&str]); 6] = [
    ("Uni-President Lions", &["Tainan"]),
    ("CTBC Brothers", &["Taichung Intercontinental"]),
    ("Rakuten Monkeys", &["Rakuten Taoyuan"]),
    ("Wei Chuan Dragons", &["Tianmu", "Taipei Dome"]),
    ("Fubon Guardians", &["Xinzhuang"]),
    ("TSG Hawks", &["Chengcing Lake"]),
];

pub const STADIUM_ALIASES: [(&str, &[&str]); 7] = [
    ("Taichung Intercontinental", &["洲際", "台中洲際棒球場", "臺中洲際棒球場"]),
    ("Chengcing Lake", &["澄清湖", "澄清湖棒球場"]),
    ("Tianmu", &["天母", "天母棒球場"]),
    ("Xinzhuang", &["新莊", "新莊棒球場"]),
    ("Rakuten Taoyuan", &["樂天桃園", "桃園", "樂天桃園棒球場"]),
    ("Tainan", &["台南", "臺南", "台南棒球場"]),
    ("Taipei Dome", &["台北大巨蛋", "臺北大巨蛋", "大巨蛋"]),
];

static DEFAULT_TABLE: Lazy<ParkTable> = Lazy::new(|| {
    ParkTable::new(
        PARK_FACTORS
            .iter()
            .map(|(name, runs)| (name.to_string(), *runs)),
    )
    .with_aliases(
        STADIUM_ALIASES
            .iter()
            .flat_map(|(park, names)| names.iter().map(move |alias| (*alias, *park))),
    )
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkContext {
    pub stadium: String,
    pub run_multiplier: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ParkTable {
    factors: HashMap<String, ParkContext>,
}

impl ParkTable {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let factors = entries
            .into_iter()
            .map(|(stadium, run_multiplier)| {
                (
                    park_key(&stadium),
                    ParkContext {
                        stadium,
                        run_multiplier,
                    },
                )
            })
            .collect();
        Self { factors }
    }

    pub fn with_aliases<'a, I>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (alias, stadium) in aliases {
            if let Some(ctx) = self.factors.get(&park_key(stadium)).cloned() {
                self.factors.insert(park_key(alias), ctx);
            }
        }
        self
    }

    pub fn builtin() -> &'static ParkTable {
        &DEFAULT_TABLE
    }

    pub fn resolve(&self, stadium: &str) -> EngineResult<ParkContext> {
        self.factors
            .get(&park_key(stadium))
            .cloned()
            .ok_or_else(|| EngineError::Precondition(format!("unknown park: {stadium}")))
    }
}

pub fn home_stadiums(team: &str) -> &'static [&'static str] {
    let Some(club) = canonical_team(team) else {
        return &[];
    };
    HOME_STADIUMS
        .iter()
        .find(|(name, _)| *name == club)
        .map(|(_, parks)| *parks)
        .unwrap_or(&[])
}

fn park_key(name: &str) -> String {
    normalize_name(name).to_lowercase()
}
