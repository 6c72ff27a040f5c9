use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use cpbl_predictor::config::EngineConfig;
use cpbl_predictor::dataset::{self, SliceFilter};
use cpbl_predictor::league_params::{compute_wsb_table_with, wsb_leaderboard};
use cpbl_predictor::league_summary::{avg_ops_correlation, team_season_lines};
use cpbl_predictor::telemetry;

const DEFAULT_MIN_ATTEMPTS: f64 = 5.0;
const DEFAULT_TOP_N: usize = 10;
const BOTTOM_N: usize = 5;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env");
    telemetry::init_tracing();

    let path = std::env::args()
        .nth(1)
        .filter(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: wsb_table <records.json> [--years 2024,2025] [--teams A,B] [--min-pa N] [--min-attempts N] [--top N] [--json]"))?;

    let mut filter = SliceFilter {
        years: parse_list_arg::<i32>("--years")?.unwrap_or_else(|| EngineConfig::default().target_seasons),
        teams: parse_list_arg::<String>("--teams")?.unwrap_or_default(),
        min_plate_appearances: 0.0,
    };
    if let Some(pa) = parse_arg::<f64>("--min-pa")? {
        filter.min_plate_appearances = pa;
    }
    let min_attempts = parse_arg::<f64>("--min-attempts")?.unwrap_or(DEFAULT_MIN_ATTEMPTS);
    let top_n = parse_arg::<usize>("--top")?.unwrap_or(DEFAULT_TOP_N);
    let as_json = std::env::args().any(|a| a == "--json");

    let records = dataset::prepare_player_records(dataset::load_player_records(&path)?);
    let slice = filter.apply(&records);
    let config = EngineConfig::from_env();
    let table = compute_wsb_table_with(&slice, config.run_values);
    let board = wsb_leaderboard(&table, min_attempts, top_n, BOTTOM_N);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&board)?);
        return Ok(());
    }

    let ctx = &table.context;
    println!(
        "Slice: {} player-seasons, runs/out {:.3}",
        ctx.sample_players, ctx.runs_per_out
    );
    println!(
        "runCS = {:.3} ({:.1}x the value of a steal), lgwSB = {:.5}",
        ctx.run_value_caught,
        (ctx.run_value_caught / ctx.run_value_steal).abs(),
        ctx.league_wsb_rate
    );
    if let Some(r) = avg_ops_correlation(&slice) {
        println!("AVG vs OPS correlation: {r:.3}");
    }
    for line in team_season_lines(&slice, &[]) {
        println!("{} {:<20} OPS {:.3}", line.year, line.team, line.ops);
    }
    for p in board.iter().rev() {
        println!(
            "{:<16} {:<20} {} SB {:>3} CS {:>3} ({:>5.1}%)  wSB {:>6.2}",
            p.name, p.team, p.year, p.steals, p.caught, p.success_rate, p.wsb
        );
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(flag: &str) -> Result<Option<T>> {
    let args: Vec<String> = std::env::args().collect();
    let Some(idx) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    let raw = args
        .get(idx + 1)
        .ok_or_else(|| anyhow!("{flag} needs a value"))?;
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| anyhow!("invalid value for {flag}: {raw}"))
}

fn parse_list_arg<T: std::str::FromStr>(flag: &str) -> Result<Option<Vec<T>>> {
    let Some(raw) = parse_arg::<String>(flag)? else {
        return Ok(None);
    };
    raw.split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<T>()
                .map_err(|_| anyhow!("invalid entry in {flag}: {part}"))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
        .context("parse list argument")
}
