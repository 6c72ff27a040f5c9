use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use cpbl_predictor::config::EngineConfig;
use cpbl_predictor::dataset::{self, BattingTable, PitchingTable};
use cpbl_predictor::model;
use cpbl_predictor::park::{ParkTable, home_stadiums};
use cpbl_predictor::team::TeamLineup;
use cpbl_predictor::telemetry;
use cpbl_predictor::win_prob::{MatchupEngine, WinProbabilityResult};

#[derive(Debug, Deserialize)]
struct MatchupCase {
    batting_path: PathBuf,
    pitching_path: PathBuf,
    #[serde(default)]
    home_team: Option<String>,
    home: TeamLineup,
    away: TeamLineup,
    #[serde(default)]
    park: Option<String>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    telemetry::init_tracing();

    let mut case_path: Option<PathBuf> = None;
    let mut as_json = false;
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            as_json = true;
        } else {
            case_path = Some(PathBuf::from(arg));
        }
    }
    let case_path =
        case_path.unwrap_or_else(|| PathBuf::from("tests/fixtures/matchup_case.json"));

    let raw = fs::read_to_string(&case_path)
        .with_context(|| format!("read case {}", case_path.display()))?;
    let case: MatchupCase = serde_json::from_str(&raw)
        .with_context(|| format!("parse case {}", case_path.display()))?;
    let base = case_path.parent().unwrap_or(Path::new("."));

    let config = EngineConfig::from_env();
    let batting = BattingTable::from_rows(dataset::load_batting_rows(
        &base.join(&case.batting_path),
    )?);
    let pitching = PitchingTable::from_records(
        dataset::load_pitcher_records(&base.join(&case.pitching_path))?,
        config.innings_guard,
    );
    let bundle = model::global_bundle().ok_or_else(|| anyhow!("no model bundle available"))?;

    let stadium = match (&case.park, &case.home_team) {
        (Some(park), _) => park.clone(),
        (None, Some(team)) => home_stadiums(team)
            .first()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("no home stadium known for {team}"))?,
        (None, None) => return Err(anyhow!("case needs a park or a home_team")),
    };

    let engine = MatchupEngine::from_bundle(bundle, &batting, &pitching, config);
    let result = engine.evaluate_at(&case.home, &case.away, ParkTable::builtin(), &stadium)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }
    Ok(())
}

fn print_report(r: &WinProbabilityResult) {
    println!("Evaluated: {}", chrono::Utc::now().to_rfc3339());
    println!("Park: {} (runs x{:.2})", r.park.stadium, r.park.run_multiplier);
    println!(
        "Home offense: {:.2} ({} batters rated)",
        r.home.offense,
        r.home.contributions.len()
    );
    println!(
        "Away offense: {:.2} ({} batters rated)",
        r.away.offense,
        r.away.contributions.len()
    );
    println!(
        "Starters: {} {:.2} vs {} {:.2}",
        r.home.starter.name,
        r.home.starter.run_prevention,
        r.away.starter.name,
        r.away.starter.run_prevention
    );
    println!(
        "Differential: offense {:.2}, pitching {:.2}, park {:.2}",
        r.differential.offense_diff, r.differential.pitching_diff, r.differential.park_multiplier
    );
    println!("Model raw: {:.2}%", r.p_raw() * 100.0);
    println!(
        "Logit: {:.3} + {:.2} = {:.3}",
        r.calibration.logit_raw, r.calibration.adjustment, r.calibration.logit_final
    );
    println!("Home win: {:.2}%", r.p_final() * 100.0);
    println!("Verdict: {:?}", r.verdict);
    for d in &r.diagnostics {
        println!("note: {d}");
    }
}
