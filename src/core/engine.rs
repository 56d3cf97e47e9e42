use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal_macros::dec;

use super::error::EngineError;
use super::solver::{SolverConfig, solve_initial_consumption};
use super::types::{Money, OptimizationResult, Parameters, PeriodData, PreviewResult, Rate};

/// Risk aversion within this distance of 1 selects log utility.
const LOG_UTILITY_EPS: f64 = 1e-9;

// Decimal -> f64 is total: every Decimal fits in f64 range.
fn as_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Per-period discount factor: 1 / (1 + discount_rate).
pub fn discount_factor(discount_rate: Rate) -> f64 {
    1.0 / (1.0 + as_f64(discount_rate))
}

/// Euler-equation consumption growth per period: (beta * (1 + r)) ^ (1 / sigma).
pub fn consumption_growth(annual_return: Rate, discount_rate: Rate, risk_aversion: Rate) -> f64 {
    let beta = discount_factor(discount_rate);
    (beta * (1.0 + as_f64(annual_return))).powf(1.0 / as_f64(risk_aversion))
}

struct EulerTerms {
    beta: f64,
    growth: f64,
    /// Growth as Decimal, applied by iterative multiplication along the path.
    growth_factor: Decimal,
}

fn euler_terms(params: &Parameters) -> Result<EulerTerms, EngineError> {
    let beta = discount_factor(params.discount_rate);
    let growth = consumption_growth(
        params.annual_return,
        params.discount_rate,
        params.risk_aversion,
    );
    let growth_factor = Decimal::from_f64(growth)
        .filter(|g| g.is_sign_positive() && !g.is_zero())
        .ok_or_else(|| {
            EngineError::invalid(
                "risk_aversion",
                "consumption growth rate is not representable for these inputs",
            )
        })?;
    Ok(EulerTerms {
        beta,
        growth,
        growth_factor,
    })
}

/// Checks domain constraints and returns the horizon in periods.
pub fn validate_parameters(params: &Parameters) -> Result<u32, EngineError> {
    if params.initial_capital < Decimal::ZERO {
        return Err(EngineError::invalid("initial_capital", "must be >= 0"));
    }
    if params.inheritance_target < Decimal::ZERO {
        return Err(EngineError::invalid("inheritance_target", "must be >= 0"));
    }
    if params.life_expectancy <= params.current_age {
        return Err(EngineError::invalid(
            "life_expectancy",
            "must be greater than current_age",
        ));
    }
    if params.risk_aversion <= Decimal::ZERO {
        return Err(EngineError::invalid("risk_aversion", "must be > 0"));
    }
    if params.annual_return <= dec!(-1) {
        return Err(EngineError::invalid("annual_return", "must be > -1"));
    }
    if params.discount_rate <= dec!(-1) {
        return Err(EngineError::invalid("discount_rate", "must be > -1"));
    }
    Ok(params.life_expectancy - params.current_age)
}

fn crra_utility(consumption: f64, risk_aversion: f64) -> f64 {
    if (risk_aversion - 1.0).abs() < LOG_UTILITY_EPS {
        consumption.ln()
    } else {
        consumption.powf(1.0 - risk_aversion) / (1.0 - risk_aversion)
    }
}

/// Forward-simulates the capital trajectory for a candidate initial
/// consumption and returns the capital left after `horizon` transitions.
///
/// Capital is not clamped at zero mid-path: the solver relies on terminal
/// capital being strictly decreasing in initial consumption, and clamping
/// would flatten that relationship.
pub fn terminal_capital(
    params: &Parameters,
    horizon: u32,
    growth_factor: Decimal,
    initial_consumption: Money,
) -> Money {
    let return_factor = Decimal::ONE + params.annual_return;
    let mut capital = params.initial_capital;
    let mut consumption = initial_consumption;
    for _ in 0..horizon {
        capital = (capital - consumption) * return_factor;
        consumption *= growth_factor;
    }
    capital
}

fn build_series(
    params: &Parameters,
    horizon: u32,
    growth_factor: Decimal,
    initial_consumption: Money,
) -> Result<(Vec<PeriodData>, Money), EngineError> {
    let sigma = as_f64(params.risk_aversion);
    let return_factor = Decimal::ONE + params.annual_return;
    let mut series = Vec::with_capacity(horizon as usize + 1);
    let mut capital = params.initial_capital;
    let mut consumption = initial_consumption;

    for period in 0..=horizon {
        if consumption <= Decimal::ZERO {
            return Err(EngineError::NonPositiveConsumption { period });
        }
        let capital_2dp = capital.round_dp(2);
        let consumption_2dp = consumption.round_dp(2);
        series.push(PeriodData {
            period,
            age: params.current_age + period,
            capital: capital_2dp,
            consumption: consumption_2dp,
            utility: crra_utility(as_f64(consumption), sigma),
            savings: capital_2dp - consumption_2dp,
        });
        // The last period is the bequest state: its consumption continues the
        // Euler path for reporting, but the capital is left untouched.
        if period < horizon {
            capital = (capital - consumption) * return_factor;
        }
        consumption *= growth_factor;
    }

    Ok((series, capital))
}

/// Full solve: validate, derive the Euler terms, search for the initial
/// consumption whose terminal capital hits the bequest target, then rebuild
/// the path with per-period utility and summary statistics.
pub fn optimize(
    params: &Parameters,
    config: &SolverConfig,
) -> Result<OptimizationResult, EngineError> {
    let horizon = validate_parameters(params)?;
    let terms = euler_terms(params)?;
    let initial_consumption =
        solve_initial_consumption(params, horizon, terms.growth_factor, config)?;
    let (series, final_capital) =
        build_series(params, horizon, terms.growth_factor, initial_consumption)?;

    let mut total_utility = 0.0;
    let mut discount = 1.0;
    let mut consumption_sum = Decimal::ZERO;
    let mut max_consumption = series[0].consumption;
    let mut min_consumption = series[0].consumption;
    for row in &series {
        total_utility += discount * row.utility;
        discount *= terms.beta;
        consumption_sum += row.consumption;
        max_consumption = max_consumption.max(row.consumption);
        min_consumption = min_consumption.min(row.consumption);
    }
    let avg_consumption = (consumption_sum / Decimal::from(series.len() as u64)).round_dp(2);

    Ok(OptimizationResult {
        initial_consumption: initial_consumption.round_dp(2),
        total_utility,
        final_capital: final_capital.round_dp(2),
        horizon,
        beta: terms.beta,
        growth_rate: terms.growth,
        series,
        avg_consumption,
        max_consumption,
        min_consumption,
    })
}

/// Partial solve for interactive previews: runs validation and the root
/// search but skips the series and summary statistics.
pub fn preview(params: &Parameters, config: &SolverConfig) -> Result<PreviewResult, EngineError> {
    let horizon = validate_parameters(params)?;
    let terms = euler_terms(params)?;
    let initial_consumption =
        solve_initial_consumption(params, horizon, terms.growth_factor, config)?;

    Ok(PreviewResult {
        initial_consumption: initial_consumption.round_dp(2),
        beta: terms.beta,
        growth_rate: terms.growth,
        horizon,
    })
}
