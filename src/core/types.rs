use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Household inputs for one consumption-path optimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub initial_capital: Money,
    pub annual_return: Rate,
    pub discount_rate: Rate,
    /// CRRA coefficient; 1 selects log utility.
    pub risk_aversion: Rate,
    pub current_age: u32,
    pub life_expectancy: u32,
    pub inheritance_target: Money,
}

impl Parameters {
    /// Baseline parameters used when a caller supplies nothing.
    pub fn defaults() -> Self {
        Parameters {
            initial_capital: dec!(1_000_000),
            annual_return: dec!(0.05),
            discount_rate: dec!(0.03),
            risk_aversion: dec!(2.0),
            current_age: 35,
            life_expectancy: 85,
            inheritance_target: dec!(200_000),
        }
    }
}

/// One period of the solved consumption path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodData {
    pub period: u32,
    pub age: u32,
    /// Capital at the start of the period.
    pub capital: Money,
    pub consumption: Money,
    pub utility: f64,
    /// Capital minus consumption. Display only, never used in the solve.
    pub savings: Money,
}

/// Full solve output: the optimal path plus summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub initial_consumption: Money,
    pub total_utility: f64,
    pub final_capital: Money,
    pub horizon: u32,
    pub beta: f64,
    pub growth_rate: f64,
    pub series: Vec<PeriodData>,
    pub avg_consumption: Money,
    pub max_consumption: Money,
    pub min_consumption: Money,
}

/// Partial solve output for interactive parameter changes; skips the series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub initial_consumption: Money,
    pub beta: f64,
    pub growth_rate: f64,
    pub horizon: u32,
}
