mod engine;
mod error;
mod solver;
mod types;

pub use engine::{optimize, preview, terminal_capital, validate_parameters};
pub use error::EngineError;
pub use solver::{SolverConfig, solve_initial_consumption};
pub use types::{Money, OptimizationResult, Parameters, PeriodData, PreviewResult, Rate};
