use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::error::Diagnostic;
use crate::stats::{BattingRow, PitcherSeasonRecord, PlayerSeasonRecord};

pub const CLUBS: [(&str, &[&str]); 6] = [
    (
        "Uni-President Lions",
        &["統一7-ELEVEn獅", "統一獅", "統一", "Uni-Lions"],
    ),
    (
        "Rakuten Monkeys",
        &["樂天桃猿", "桃猿", "Lamigo", "Rakuten", "樂天"],
    ),
    ("CTBC Brothers", &["中信兄弟", "兄弟", "兄弟象", "Brothers"]),
    (
        "Fubon Guardians",
        &["富邦悍將", "富邦", "悍將", "義大", "義大犀牛"],
    ),
    ("Wei Chuan Dragons", &["味全龍", "味全", "Dragons"]),
    ("TSG Hawks", &["台鋼雄鷹", "台鋼", "TSG"]),
];

/// Trim and collapse inner whitespace. Case is kept: the source names are
/// mostly CJK and case folding would only matter for import spellings.
pub fn normalize_name(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn canonical_team(raw: &str) -> Option<&'static str> {
    let name = normalize_name(raw);
    CLUBS.iter().find_map(|(canonical, aliases)| {
        if canonical.eq_ignore_ascii_case(&name)
            || aliases.iter().any(|a| a.eq_ignore_ascii_case(&name))
        {
            Some(*canonical)
        } else {
            None
        }
    })
}

#[derive(Debug, Clone, Default)]
pub struct BattingTable {
    by_name: HashMap<String, Vec<BattingRow>>,
}

impl BattingTable {
    /// Duplicate (name, year) rows collapse to the one with most plate appearances.
    pub fn from_rows(rows: Vec<BattingRow>) -> Self {
        let mut by_name: HashMap<String, Vec<BattingRow>> = HashMap::new();
        for row in rows {
            let key = normalize_name(&row.name);
            if key.is_empty() {
                continue;
            }
            let seasons = by_name.entry(key).or_default();
            match seasons.iter_mut().find(|r| r.year == row.year) {
                Some(existing) => {
                    if row.numeric("PA") > existing.numeric("PA") {
                        *existing = row;
                    }
                }
                None => seasons.push(row),
            }
        }
        for seasons in by_name.values_mut() {
            seasons.sort_by(|a, b| b.year.cmp(&a.year));
        }
        Self { by_name }
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn recent_seasons(&self, name: &str, seasons: &[i32], limit: usize) -> Vec<&BattingRow> {
        self.by_name
            .get(&normalize_name(name))
            .map(|rows| {
                rows.iter()
                    .filter(|r| seasons.is_empty() || seasons.contains(&r.year))
                    .take(limit)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PitchingTable {
    by_name: HashMap<String, Vec<PitcherSeasonRecord>>,
    diagnostics: Vec<Diagnostic>,
}

impl PitchingTable {
    /// Derives ERA/WHIP and keeps the heaviest-workload row per (name, year).
    pub fn from_records(records: Vec<PitcherSeasonRecord>, innings_guard: f64) -> Self {
        let mut by_name: HashMap<String, Vec<PitcherSeasonRecord>> = HashMap::new();
        let mut diagnostics = Vec::new();
        for mut rec in records {
            let key = normalize_name(&rec.name);
            if key.is_empty() {
                continue;
            }
            diagnostics.extend(rec.derive_rates(innings_guard));
            let seasons = by_name.entry(key).or_default();
            match seasons.iter_mut().find(|r| r.year == rec.year) {
                Some(existing) => {
                    if rec.innings_pitched > existing.innings_pitched {
                        *existing = rec;
                    }
                }
                None => seasons.push(rec),
            }
        }
        for seasons in by_name.values_mut() {
            seasons.sort_by(|a, b| b.year.cmp(&a.year));
        }
        Self {
            by_name,
            diagnostics,
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn seasons(&self, name: &str) -> &[PitcherSeasonRecord] {
        self.by_name
            .get(&normalize_name(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn latest_run_prevention(&self, name: &str) -> Option<f64> {
        self.seasons(name).iter().find_map(|r| r.run_prevention)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SliceFilter {
    pub years: Vec<i32>,
    pub teams: Vec<String>,
    pub min_plate_appearances: f64,
}

impl SliceFilter {
    pub fn years(years: &[i32]) -> Self {
        Self {
            years: years.to_vec(),
            ..Default::default()
        }
    }

    pub fn matches(&self, rec: &PlayerSeasonRecord) -> bool {
        if !self.years.is_empty() && !self.years.contains(&rec.year) {
            return false;
        }
        if !self.teams.is_empty() {
            let team = canonical_team(&rec.team).unwrap_or(rec.team.as_str());
            let wanted = self
                .teams
                .iter()
                .any(|t| canonical_team(t).unwrap_or(t.as_str()) == team);
            if !wanted {
                return false;
            }
        }
        rec.plate_appearances >= self.min_plate_appearances
    }

    pub fn apply(&self, records: &[PlayerSeasonRecord]) -> Vec<PlayerSeasonRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Dashboard preparation: canonical club names, current clubs only, at least
/// one plate appearance, one row per (name, year) with the most PA.
pub fn prepare_player_records(records: Vec<PlayerSeasonRecord>) -> Vec<PlayerSeasonRecord> {
    let mut best: HashMap<(String, i32), PlayerSeasonRecord> = HashMap::new();
    for mut rec in records {
        let Some(team) = canonical_team(&rec.team) else {
            continue;
        };
        if rec.plate_appearances <= 0.0 {
            continue;
        }
        rec.team = team.to_string();
        rec.name = normalize_name(&rec.name);
        let key = (rec.name.clone(), rec.year);
        let keep_existing = best
            .get(&key)
            .is_some_and(|existing| existing.plate_appearances >= rec.plate_appearances);
        if !keep_existing {
            best.insert(key, rec);
        }
    }
    let mut out: Vec<_> = best.into_values().collect();
    out.sort_by(|a, b| {
        b.year
            .cmp(&a.year)
            .then(
                b.plate_appearances
                    .partial_cmp(&a.plate_appearances)
                    .unwrap_or(Ordering::Equal),
            )
            .then(a.name.cmp(&b.name))
    });
    out
}

pub fn load_batting_rows(path: &Path) -> Result<Vec<BattingRow>> {
    load_json_rows(path)
}

pub fn load_player_records(path: &Path) -> Result<Vec<PlayerSeasonRecord>> {
    load_json_rows(path)
}

pub fn load_pitcher_records(path: &Path) -> Result<Vec<PitcherSeasonRecord>> {
    load_json_rows(path)
}

fn load_json_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let rows = serde_json::from_str::<Vec<T>>(&raw)
        .with_context(|| format!("parse {}", path.display()))?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "table loaded");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batting(name: &str, year: i32, pa: f64) -> BattingRow {
        serde_json::from_value(json!({"Name_Display": name, "Year_Display": year, "PA": pa}))
            .unwrap()
    }

    #[test]
    fn canonical_team_maps_aliases() {
        assert_eq!(canonical_team("Lamigo"), Some("Rakuten Monkeys"));
        assert_eq!(canonical_team(" 兄弟象 "), Some("CTBC Brothers"));
        assert_eq!(canonical_team("tsg hawks"), Some("TSG Hawks"));
        assert_eq!(canonical_team("Unknown"), None);
    }

    #[test]
    fn batting_table_sorts_and_dedupes() {
        let table = BattingTable::from_rows(vec![
            batting("A", 2023, 300.0),
            batting("A", 2025, 120.0),
            batting(" A ", 2025, 410.0),
            batting("A", 2024, 500.0),
        ]);
        assert_eq!(table.len(), 3);
        let recent = table.recent_seasons("A", &[2024, 2025], 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].year, 2025);
        assert_eq!(recent[0].numeric("PA"), 410.0);
        assert_eq!(recent[1].year, 2024);
        assert!(table.recent_seasons("Nobody", &[2025], 2).is_empty());
    }

    #[test]
    fn pitching_lookup_skips_seasons_without_value() {
        let table = PitchingTable::from_records(
            vec![
                PitcherSeasonRecord {
                    name: "P".into(),
                    year: 2025,
                    run_prevention: None,
                    ..Default::default()
                },
                PitcherSeasonRecord {
                    name: "P".into(),
                    year: 2024,
                    innings_pitched: 100.0,
                    run_prevention: Some(3.1),
                    ..Default::default()
                },
            ],
            0.1,
        );
        assert_eq!(table.latest_run_prevention("P"), Some(3.1));
        assert_eq!(table.latest_run_prevention("Q"), None);
        assert_eq!(
            table.diagnostics(),
            &[Diagnostic::DegenerateDenominator {
                quantity: "innings_pitched",
                substituted: 0.1,
            }]
        );
    }

    #[test]
    fn prepare_drops_unknown_clubs_and_empty_lines() {
        let recs = vec![
            PlayerSeasonRecord {
                name: "A".into(),
                team: "義大".into(),
                year: 2016,
                plate_appearances: 10.0,
                ..Default::default()
            },
            PlayerSeasonRecord {
                name: "A".into(),
                team: "Fubon Guardians".into(),
                year: 2016,
                plate_appearances: 40.0,
                ..Default::default()
            },
            PlayerSeasonRecord {
                name: "B".into(),
                team: "Nowhere".into(),
                year: 2016,
                plate_appearances: 40.0,
                ..Default::default()
            },
            PlayerSeasonRecord {
                name: "C".into(),
                team: "TSG".into(),
                year: 2024,
                plate_appearances: 0.0,
                ..Default::default()
            },
        ];
        let out = prepare_player_records(recs);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].team, "Fubon Guardians");
        assert_eq!(out[0].plate_appearances, 40.0);
    }

    #[test]
    fn slice_filter_matches_years_and_club_aliases() {
        let rec = PlayerSeasonRecord {
            name: "A".into(),
            team: "Uni-Lions".into(),
            year: 2024,
            plate_appearances: 50.0,
            ..Default::default()
        };
        let mut filter = SliceFilter::years(&[2024]);
        assert!(filter.matches(&rec));
        filter.teams = vec!["統一7-ELEVEn獅".into()];
        assert!(filter.matches(&rec));
        filter.min_plate_appearances = 100.0;
        assert!(!filter.matches(&rec));
        assert!(!SliceFilter::years(&[2025]).matches(&rec));
    }
}
