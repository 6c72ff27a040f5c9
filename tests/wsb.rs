use std::path::PathBuf;

use cpbl_predictor::config::RunValueConstants;
use cpbl_predictor::dataset::{self, CLUBS, SliceFilter};
use cpbl_predictor::error::Diagnostic;
use cpbl_predictor::league_params::{
    PlayerKey, SabermetricContext, compute_wsb_table, compute_wsb_table_with, wsb_leaderboard,
};
use cpbl_predictor::stats::PlayerSeasonRecord;

fn fixture_records() -> Vec<PlayerSeasonRecord> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/player_seasons.json");
    dataset::prepare_player_records(dataset::load_player_records(&path).unwrap())
}

fn season(name: &str, sb: f64, cs: f64, singles: f64, at_bats: f64, runs: f64) -> PlayerSeasonRecord {
    PlayerSeasonRecord {
        name: name.to_string(),
        team: "CTBC Brothers".to_string(),
        year: 2025,
        plate_appearances: at_bats + 10.0,
        at_bats,
        runs,
        singles: Some(singles),
        stolen_bases: sb,
        caught_stealing: cs,
        ..Default::default()
    }
}

/// 100 steals, 40 caught, 0.15 runs per out, 2000 opportunities.
fn reference_slice() -> Vec<PlayerSeasonRecord> {
    vec![
        season("Runner", 10.0, 2.0, 150.0, 0.0, 0.0),
        season("Everyone else", 90.0, 38.0, 1850.0, 400.0, 66.0),
    ]
}

#[test]
fn reference_slice_matches_hand_calculation() {
    let table = compute_wsb_table(&reference_slice());
    let ctx = &table.context;
    assert!((ctx.runs_per_out - 0.15).abs() < 1e-12);
    assert!((ctx.run_value_caught + 0.375).abs() < 1e-12);
    assert!((ctx.league_opportunities - 2000.0).abs() < 1e-12);
    assert!((ctx.league_wsb_rate - 0.0025).abs() < 1e-12);
    assert!(ctx.diagnostics.is_empty());

    let runner = &table.players[&PlayerKey {
        name: "Runner".to_string(),
        year: 2025,
    }];
    assert!((runner.wsb - 0.875).abs() < 1e-12);
    assert_eq!(runner.attempts, 12.0);
    assert!((runner.success_rate - 10.0 / 12.0 * 100.0).abs() < 1e-12);
}

#[test]
fn wsb_sums_to_zero_over_its_own_slice() {
    let table = compute_wsb_table(&fixture_records());
    let total: f64 = table.players.values().map(|p| p.wsb).sum();
    assert!(total.abs() < 1e-9);
}

#[test]
fn recomputing_a_slice_is_idempotent() {
    let records = fixture_records();
    assert_eq!(compute_wsb_table(&records), compute_wsb_table(&records));
}

#[test]
fn context_depends_on_the_slice() {
    let records = fixture_records();
    let y24 = compute_wsb_table(&SliceFilter::years(&[2024]).apply(&records));
    let y25 = compute_wsb_table(&SliceFilter::years(&[2025]).apply(&records));
    assert_ne!(y24.context, y25.context);
    assert!(y24.players.keys().all(|k| k.year == 2024));
}

#[test]
fn slice_with_no_opportunities_is_guarded() {
    let records = vec![season("Ghost", 0.0, 0.0, 0.0, 0.0, 0.0)];
    let table = compute_wsb_table(&records);
    assert_eq!(table.context.league_opportunities, 1.0);
    assert_eq!(table.context.league_outs, 1.0);
    assert!(table.context.diagnostics.contains(&Diagnostic::DegenerateDenominator {
        quantity: "league_opportunities",
        substituted: 1.0,
    }));
    assert!(table.players.values().all(|p| p.wsb == 0.0 && p.wsb.is_finite()));
}

#[test]
fn steals_without_opportunities_stay_finite() {
    let records = vec![season("Pinch runner", 5.0, 1.0, 0.0, 0.0, 0.0)];
    let table = compute_wsb_table(&records);
    let ctx = &table.context;
    assert_eq!(ctx.league_opportunities, 1.0);
    assert!((ctx.run_value_caught + 0.075).abs() < 1e-12);

    let runner = table.players.values().next().unwrap();
    assert_eq!(runner.opportunities, 0.0);
    assert!(runner.wsb.is_finite());
    assert!((runner.wsb - 0.925).abs() < 1e-12);
}

#[test]
fn traded_player_appears_once_and_slice_stays_balanced() {
    let mut with_lions = season("Traded", 3.0, 2.0, 20.0, 60.0, 8.0);
    with_lions.team = "Uni-President Lions".to_string();
    with_lions.plate_appearances = 70.0;
    let with_brothers = season("Traded", 11.0, 1.0, 45.0, 220.0, 30.0);
    let slice = vec![
        with_lions,
        with_brothers,
        season("Regular", 7.0, 4.0, 80.0, 400.0, 55.0),
    ];

    let table = compute_wsb_table(&slice);
    assert_eq!(table.players.len(), 2);
    assert_eq!(table.context.sample_players, table.players.len());
    assert_eq!(table.context.league_steals, 18.0);
    let traded = &table.players[&PlayerKey {
        name: "Traded".to_string(),
        year: 2025,
    }];
    assert_eq!(traded.team, "CTBC Brothers");
    let total: f64 = table.players.values().map(|p| p.wsb).sum();
    assert!(total.abs() < 1e-9);
}

#[test]
fn custom_steal_value_changes_the_rate() {
    let slice = reference_slice();
    let base = SabermetricContext::from_slice(&slice, RunValueConstants::default());
    let richer = compute_wsb_table_with(
        &slice,
        RunValueConstants {
            steal_success: 0.3,
            ..RunValueConstants::default()
        },
    );
    assert!(richer.context.league_wsb_rate > base.league_wsb_rate);
}

#[test]
fn dashboard_preparation_drops_unknown_clubs_and_empty_rows() {
    let records = fixture_records();
    assert_eq!(records.len(), 24);
    assert!(records.iter().all(|r| r.plate_appearances > 0.0));
    assert!(
        records
            .iter()
            .all(|r| CLUBS.iter().any(|(club, _)| *club == r.team))
    );
    assert!(records.iter().any(|r| r.team == "Rakuten Monkeys"));
}

#[test]
fn team_filter_accepts_aliases() {
    let records = fixture_records();
    let filter = SliceFilter {
        teams: vec!["統一".to_string()],
        ..SliceFilter::years(&[2025])
    };
    let slice = filter.apply(&records);
    assert_eq!(slice.len(), 2);
    assert!(slice.iter().all(|r| r.team == "Uni-President Lions"));
}

#[test]
fn leaderboard_is_sorted_and_respects_attempt_floor() {
    let table = compute_wsb_table(&fixture_records());
    let board = wsb_leaderboard(&table, 5.0, 3, 3);
    assert!(board.len() <= 6);
    assert!(board.iter().all(|p| p.attempts >= 5.0));
    assert!(board.windows(2).all(|w| w[0].wsb <= w[1].wsb));
}
