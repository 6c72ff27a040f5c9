use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Diagnostic;
use crate::features::coerce_numeric;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattingRow {
    #[serde(alias = "Name_Display", alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Team_Display", alias = "Team")]
    pub team: String,
    #[serde(alias = "Year_Display", alias = "Year", deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(flatten)]
    pub columns: BTreeMap<String, Value>,
}

impl BattingRow {
    pub fn numeric(&self, column: &str) -> f64 {
        self.columns.get(column).map(coerce_numeric).unwrap_or(0.0)
    }
}

/// Raw offensive line for a player-season. Missing or unparseable numbers are zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonRecord {
    #[serde(alias = "Name", alias = "Name_clean")]
    pub name: String,
    #[serde(default, alias = "Team", alias = "Team Name_x")]
    pub team: String,
    #[serde(alias = "Year", deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(default, alias = "PA", alias = "bat_PA", deserialize_with = "lenient_f64")]
    pub plate_appearances: f64,
    #[serde(default, alias = "AB", alias = "bat_AB", deserialize_with = "lenient_f64")]
    pub at_bats: f64,
    #[serde(default, alias = "R", alias = "bat_R", deserialize_with = "lenient_f64")]
    pub runs: f64,
    #[serde(default, alias = "H", alias = "bat_H", deserialize_with = "lenient_f64")]
    pub hits: f64,
    #[serde(default, alias = "1B", alias = "bat_1B", deserialize_with = "lenient_opt_f64")]
    pub singles: Option<f64>,
    #[serde(default, alias = "2B", alias = "bat_2B", deserialize_with = "lenient_f64")]
    pub doubles: f64,
    #[serde(default, alias = "3B", alias = "bat_3B", deserialize_with = "lenient_f64")]
    pub triples: f64,
    #[serde(default, alias = "HR", alias = "bat_HR", deserialize_with = "lenient_f64")]
    pub home_runs: f64,
    #[serde(default, alias = "BB", alias = "bat_BB", deserialize_with = "lenient_f64")]
    pub walks: f64,
    #[serde(default, alias = "IBB", alias = "bat_IBB", deserialize_with = "lenient_f64")]
    pub intentional_walks: f64,
    #[serde(default, alias = "HBP", alias = "bat_HBP", deserialize_with = "lenient_f64")]
    pub hit_by_pitch: f64,
    #[serde(default, alias = "SB", alias = "bat_SB", deserialize_with = "lenient_f64")]
    pub stolen_bases: f64,
    #[serde(default, alias = "CS", alias = "bat_CS", deserialize_with = "lenient_f64")]
    pub caught_stealing: f64,
    #[serde(default, alias = "SF", alias = "bat_SF", deserialize_with = "lenient_f64")]
    pub sac_flies: f64,
    #[serde(default, alias = "AVG", alias = "bat_AVG", deserialize_with = "lenient_f64")]
    pub batting_average: f64,
    #[serde(default, alias = "OPS", alias = "bat_OPS", deserialize_with = "lenient_f64")]
    pub ops: f64,
}

impl PlayerSeasonRecord {
    /// Singles as recorded, or hits minus extra-base hits.
    pub fn singles(&self) -> f64 {
        self.singles
            .unwrap_or(self.hits - self.doubles - self.triples - self.home_runs)
            .max(0.0)
    }

    /// Times on first base with a chance to run: 1B + BB + HBP - IBB.
    pub fn steal_opportunities(&self) -> f64 {
        self.singles() + self.walks + self.hit_by_pitch - self.intentional_walks
    }

    pub fn steal_attempts(&self) -> f64 {
        self.stolen_bases + self.caught_stealing
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PitcherSeasonRecord {
    #[serde(alias = "Name", alias = "Name_Display", alias = "Name_clean")]
    pub name: String,
    #[serde(default, alias = "Team", alias = "Team Name_y")]
    pub team: String,
    #[serde(alias = "Year", deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(default, alias = "IP", alias = "pit_IP", deserialize_with = "lenient_f64")]
    pub innings_pitched: f64,
    #[serde(default, alias = "ER", alias = "pit_ER", deserialize_with = "lenient_f64")]
    pub earned_runs: f64,
    #[serde(default, alias = "SO", alias = "pit_SO", deserialize_with = "lenient_f64")]
    pub strikeouts: f64,
    #[serde(default, alias = "BB", alias = "pit_BB", deserialize_with = "lenient_f64")]
    pub walks: f64,
    #[serde(default, alias = "H", alias = "pit_H", deserialize_with = "lenient_f64")]
    pub hits_allowed: f64,
    #[serde(default, alias = "FIP", deserialize_with = "lenient_opt_f64")]
    pub run_prevention: Option<f64>,
    #[serde(skip)]
    pub era: f64,
    #[serde(skip)]
    pub whip: f64,
}

impl PitcherSeasonRecord {
    pub fn derive_rates(&mut self, innings_guard: f64) -> Option<Diagnostic> {
        let (ip, diagnostic) = if self.innings_pitched == 0.0 {
            let d = Diagnostic::DegenerateDenominator {
                quantity: "innings_pitched",
                substituted: innings_guard,
            };
            d.log();
            (innings_guard, Some(d))
        } else {
            (self.innings_pitched, None)
        };
        self.era = self.earned_runs * 9.0 / ip;
        self.whip = (self.walks + self.hits_allowed) / ip;
        diagnostic
    }
}

pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce_numeric(&raw).max(0.0))
}

pub(crate) fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let parsed = match &raw {
        Value::Null => None,
        Value::String(s) => s.trim().parse::<f64>().ok(),
        other => Some(coerce_numeric(other)),
    };
    // "NaN" and "inf" parse as floats but mean the value is missing.
    Ok(parsed.filter(|v| v.is_finite()).map(|v| v.max(0.0)))
}

fn lenient_year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce_numeric(&raw).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_parses_dashboard_columns_leniently() {
        let raw = r#"{"Name":"A","Team":"T","Year":"2024","bat_H":"30","bat_2B":5,
            "bat_3B":null,"bat_HR":"x","bat_BB":10,"bat_HBP":2,"bat_IBB":1,"bat_SB":"7"}"#;
        let rec: PlayerSeasonRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.year, 2024);
        assert_eq!(rec.hits, 30.0);
        assert_eq!(rec.triples, 0.0);
        assert_eq!(rec.home_runs, 0.0);
        assert_eq!(rec.singles(), 25.0);
        assert_eq!(rec.steal_opportunities(), 36.0);
        assert_eq!(rec.stolen_bases, 7.0);
        assert_eq!(rec.caught_stealing, 0.0);
    }

    #[test]
    fn explicit_singles_column_wins() {
        let raw = r#"{"Name":"A","Year":2025,"1B":12,"H":40,"2B":3}"#;
        let rec: PlayerSeasonRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.singles(), 12.0);
    }

    #[test]
    fn zero_innings_uses_guard() {
        let mut p = PitcherSeasonRecord {
            name: "P".into(),
            earned_runs: 2.0,
            walks: 1.0,
            hits_allowed: 3.0,
            ..Default::default()
        };
        let d = p.derive_rates(0.1);
        assert!((p.era - 180.0).abs() < 1e-9);
        assert!((p.whip - 40.0).abs() < 1e-9);
        assert_eq!(
            d,
            Some(Diagnostic::DegenerateDenominator {
                quantity: "innings_pitched",
                substituted: 0.1,
            })
        );

        p.innings_pitched = 9.0;
        assert!(p.derive_rates(0.1).is_none());
        assert!((p.era - 2.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_run_prevention_is_missing() {
        for fip in [r#""NaN""#, r#""nan""#, r#""inf""#, r#""-""#, "null"] {
            let raw = format!(r#"{{"Name":"P","Year":2025,"IP":50,"FIP":{fip}}}"#);
            let rec: PitcherSeasonRecord = serde_json::from_str(&raw).unwrap();
            assert_eq!(rec.run_prevention, None, "FIP {fip}");
        }
        let rec: PitcherSeasonRecord =
            serde_json::from_str(r#"{"Name":"P","Year":2025,"FIP":" 3.25 "}"#).unwrap();
        assert_eq!(rec.run_prevention, Some(3.25));
    }

    #[test]
    fn batting_row_keeps_feature_columns() {
        let raw = r#"{"Name_Display":"B","Team_Display":"T","Year_Display":2024,"OBP":"0.350","HR":12}"#;
        let row: BattingRow = serde_json::from_str(raw).unwrap();
        assert_eq!(row.name, "B");
        assert_eq!(row.numeric("OBP"), 0.35);
        assert_eq!(row.numeric("HR"), 12.0);
        assert_eq!(row.numeric("SLG"), 0.0);
    }
}
