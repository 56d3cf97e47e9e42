use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{EngineError, Money, Parameters, terminal_capital};

/// Search configuration for the initial-consumption bisection. Bracket
/// fractions and budgets are deployment configuration, not model constants.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// Initial bracket bounds as fractions of starting capital.
    pub bracket_low_frac: Decimal,
    pub bracket_high_frac: Decimal,
    /// Geometric widenings allowed per bracket side before giving up.
    pub max_widenings: u32,
    pub max_iterations: u32,
    /// Absolute tolerance on the terminal-capital residual.
    pub tolerance: Money,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            bracket_low_frac: dec!(0.01),
            bracket_high_frac: dec!(0.15),
            max_widenings: 24,
            max_iterations: 50,
            tolerance: dec!(0.01),
        }
    }
}

/// Finds the initial consumption whose terminal capital matches the bequest
/// target. Terminal capital is strictly decreasing in initial consumption,
/// so a bracketing search is robust and needs no derivative; the fixed
/// iteration budget keeps results bit-for-bit reproducible.
pub fn solve_initial_consumption(
    params: &Parameters,
    horizon: u32,
    growth_factor: Decimal,
    config: &SolverConfig,
) -> Result<Money, EngineError> {
    let target = params.inheritance_target;
    let simulate = |c1: Money| terminal_capital(params, horizon, growth_factor, c1);

    let mut low = params.initial_capital * config.bracket_low_frac;
    let mut high = params.initial_capital * config.bracket_high_frac;

    // A valid bracket satisfies simulate(low) >= target >= simulate(high):
    // consuming little must leave at least the target, consuming a lot must
    // leave at most the target.
    let mut widenings = 0;
    while simulate(low) < target {
        if widenings >= config.max_widenings {
            return Err(EngineError::InfeasibleTarget { target });
        }
        low /= Decimal::TWO;
        widenings += 1;
    }
    let mut widenings = 0;
    while simulate(high) > target {
        if widenings >= config.max_widenings {
            return Err(EngineError::InfeasibleTarget { target });
        }
        high *= Decimal::TWO;
        widenings += 1;
    }

    for iteration in 0..config.max_iterations {
        let mid = (low + high) / Decimal::TWO;
        let terminal = simulate(mid);
        if (terminal - target).abs() <= config.tolerance {
            tracing::debug!(iteration, "terminal capital within tolerance");
            return Ok(mid);
        }
        if terminal > target {
            // Too much left over: consume more.
            low = mid;
        } else {
            high = mid;
        }
    }

    Ok((low + high) / Decimal::TWO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::core::engine::{consumption_growth, validate_parameters};
    use rust_decimal::prelude::FromPrimitive;

    fn growth_factor_for(params: &Parameters) -> Decimal {
        let growth = consumption_growth(
            params.annual_return,
            params.discount_rate,
            params.risk_aversion,
        );
        Decimal::from_f64(growth).expect("finite growth factor")
    }

    #[test]
    fn default_config_carries_documented_values() {
        let config = SolverConfig::default();
        assert_eq!(config.bracket_low_frac, dec!(0.01));
        assert_eq!(config.bracket_high_frac, dec!(0.15));
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.tolerance, dec!(0.01));
    }

    #[test]
    fn solves_inside_the_default_bracket() {
        let params = Parameters::defaults();
        let horizon = validate_parameters(&params).expect("valid");
        let growth = growth_factor_for(&params);

        let c1 = solve_initial_consumption(&params, horizon, growth, &SolverConfig::default())
            .expect("must solve");
        assert!(c1 > params.initial_capital * dec!(0.01));
        assert!(c1 < params.initial_capital * dec!(0.15));

        let terminal = terminal_capital(&params, horizon, growth, c1);
        assert!((terminal - params.inheritance_target).abs() <= dec!(0.01));
    }

    #[test]
    fn solve_is_deterministic() {
        let params = Parameters::defaults();
        let horizon = validate_parameters(&params).expect("valid");
        let growth = growth_factor_for(&params);
        let config = SolverConfig::default();

        let first = solve_initial_consumption(&params, horizon, growth, &config);
        let second = solve_initial_consumption(&params, horizon, growth, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn widens_the_high_bound_when_the_root_is_above_the_bracket() {
        // One period, zero return, zero bequest: the whole starting capital
        // must be consumed, far above the 15% default upper bound.
        let params = Parameters {
            initial_capital: dec!(1_000),
            annual_return: Decimal::ZERO,
            discount_rate: dec!(0.03),
            risk_aversion: dec!(2.0),
            current_age: 84,
            life_expectancy: 85,
            inheritance_target: Decimal::ZERO,
        };
        let growth = growth_factor_for(&params);

        let c1 = solve_initial_consumption(&params, 1, growth, &SolverConfig::default())
            .expect("must solve");
        assert!((c1 - dec!(1_000)).abs() <= dec!(0.01));
    }

    #[test]
    fn widens_the_low_bound_when_the_root_is_below_the_bracket() {
        // A target just under the fully-invested terminal wealth leaves room
        // for only a sliver of consumption, below the 1% default lower bound.
        let params = Parameters {
            initial_capital: dec!(100_000),
            annual_return: dec!(0.05),
            discount_rate: dec!(0.03),
            risk_aversion: dec!(2.0),
            current_age: 55,
            life_expectancy: 65,
            inheritance_target: dec!(160_000),
        };
        let growth = growth_factor_for(&params);

        let c1 = solve_initial_consumption(&params, 10, growth, &SolverConfig::default())
            .expect("must solve");
        assert!(c1 > Decimal::ZERO);
        assert!(c1 < params.initial_capital * dec!(0.01));

        let terminal = terminal_capital(&params, 10, growth, c1);
        assert!((terminal - params.inheritance_target).abs() <= dec!(0.01));
    }

    #[test]
    fn reports_infeasible_when_widening_budget_runs_out() {
        let params = Parameters {
            initial_capital: dec!(10_000),
            inheritance_target: dec!(9_000_000),
            ..Parameters::defaults()
        };
        let horizon = validate_parameters(&params).expect("valid");
        let growth = growth_factor_for(&params);

        let err = solve_initial_consumption(&params, horizon, growth, &SolverConfig::default())
            .expect_err("must be infeasible");
        assert_eq!(
            err,
            EngineError::InfeasibleTarget {
                target: dec!(9_000_000)
            }
        );
    }
}
