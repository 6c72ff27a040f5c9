pub mod calibration;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod league_params;
pub mod league_summary;
pub mod model;
pub mod park;
pub mod stats;
pub mod team;
pub mod telemetry;
pub mod win_prob;

pub use error::{Diagnostic, EngineError, EngineResult};
pub use league_params::{PlayerWsb, SabermetricContext, WsbTable, compute_wsb_table};
pub use win_prob::{MatchupEngine, WinProbabilityResult};
