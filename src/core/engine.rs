use super::error::ProjectionError;
use super::types::{SipInputs, SipResult, SwpInputs, SwpResult};

const MONTHS_PER_YEAR: u32 = 12;

/// Longest horizon the projectors accept; keeps the monthly series allocation bounded.
pub const MAX_PROJECTION_YEARS: u32 = 500;

pub fn project_sip(inputs: &SipInputs) -> Result<SipResult, ProjectionError> {
    require_positive("monthly_investment", inputs.monthly_investment)?;
    require_non_negative("annual_return_percent", inputs.annual_return_percent)?;
    require_finite("tax_rate_percent", inputs.tax_rate_percent)?;
    if !(0.0..=100.0).contains(&inputs.tax_rate_percent) {
        return Err(ProjectionError::OutOfRange {
            field: "tax_rate_percent",
            min: 0.0,
            max: 100.0,
        });
    }
    let months = horizon_months(inputs.years)?;

    let rate = monthly_rate(inputs.annual_return_percent);
    let total_investment = inputs.monthly_investment * months as f64;
    let future_value = sip_future_value(inputs.monthly_investment, rate, months);
    let returns = future_value - total_investment;
    let tax_amount = returns * inputs.tax_rate_percent / 100.0;

    Ok(SipResult {
        total_investment,
        future_value,
        returns,
        tax_amount,
        final_amount: future_value - tax_amount,
        monthly_values: sip_monthly_values(inputs.monthly_investment, rate, months),
    })
}

pub fn project_swp(inputs: &SwpInputs) -> Result<SwpResult, ProjectionError> {
    require_positive("initial_investment", inputs.initial_investment)?;
    require_non_negative("annual_return_percent", inputs.annual_return_percent)?;
    require_positive("monthly_withdrawal", inputs.monthly_withdrawal)?;
    let months = horizon_months(inputs.years)?;

    let rate = monthly_rate(inputs.annual_return_percent);
    let total_withdrawals = inputs.monthly_withdrawal * months as f64;

    let mut balance = inputs.initial_investment;
    let mut monthly_values = Vec::with_capacity(months as usize + 1);
    monthly_values.push(balance);
    for _ in 0..months {
        // Only the recorded point is floored; the running balance keeps compounding as-is.
        balance = balance * (1.0 + rate) - inputs.monthly_withdrawal;
        monthly_values.push(balance.max(0.0));
    }

    let final_balance = balance.max(0.0);
    Ok(SwpResult {
        total_withdrawals,
        final_balance,
        returns: final_balance - (inputs.initial_investment - total_withdrawals),
        monthly_values,
    })
}

fn monthly_rate(annual_return_percent: f64) -> f64 {
    annual_return_percent / (MONTHS_PER_YEAR as f64 * 100.0)
}

fn horizon_months(years: u32) -> Result<u32, ProjectionError> {
    if years == 0 {
        return Err(ProjectionError::ZeroYears);
    }
    if years > MAX_PROJECTION_YEARS {
        return Err(ProjectionError::HorizonTooLong {
            years,
            max: MAX_PROJECTION_YEARS,
        });
    }
    Ok(years * MONTHS_PER_YEAR)
}

/// Annuity-due future value: every contribution compounds for the month it is made in.
fn sip_future_value(monthly_investment: f64, rate: f64, months: u32) -> f64 {
    if rate == 0.0 {
        return monthly_investment * months as f64;
    }
    let growth = (1.0 + rate).powf(months as f64);
    monthly_investment * ((growth - 1.0) / rate) * (1.0 + rate)
}

fn sip_monthly_values(monthly_investment: f64, rate: f64, months: u32) -> Vec<f64> {
    let mut balance = 0.0;
    (0..months)
        .map(|_| {
            balance = (balance + monthly_investment) * (1.0 + rate);
            balance.round()
        })
        .collect()
}

fn require_finite(field: &'static str, value: f64) -> Result<(), ProjectionError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProjectionError::NonFinite { field })
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ProjectionError> {
    require_finite(field, value)?;
    if value <= 0.0 {
        return Err(ProjectionError::NotPositive { field });
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ProjectionError> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(ProjectionError::Negative { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_sip() -> SipInputs {
        SipInputs {
            monthly_investment: 1_000.0,
            annual_return_percent: 12.0,
            years: 1,
            tax_rate_percent: 0.0,
        }
    }

    fn sample_swp() -> SwpInputs {
        SwpInputs {
            initial_investment: 100_000.0,
            annual_return_percent: 0.0,
            years: 1,
            monthly_withdrawal: 10_000.0,
        }
    }

    #[test]
    fn sip_zero_rate_future_value_is_sum_of_contributions() {
        let mut inputs = sample_sip();
        inputs.annual_return_percent = 0.0;
        inputs.years = 10;

        let result = project_sip(&inputs).expect("valid inputs");
        assert_eq!(result.future_value, 120_000.0);
        assert_eq!(result.total_investment, 120_000.0);
        assert_eq!(result.returns, 0.0);
        assert_eq!(result.final_amount, 120_000.0);
        assert_eq!(result.monthly_values.last().copied(), Some(120_000.0));
    }

    #[test]
    fn sip_one_year_at_twelve_percent_grows_past_contributions() {
        let result = project_sip(&sample_sip()).expect("valid inputs");

        assert_approx(result.total_investment, 12_000.0);
        assert!(result.final_amount > result.total_investment);
        // 1000 * ((1.01^12 - 1) / 0.01) * 1.01
        assert_approx(result.future_value, 12_809.328_043_328_947);
        assert_approx(result.returns, 809.328_043_328_947);
        assert_approx(result.tax_amount, 0.0);
    }

    #[test]
    fn sip_monthly_values_start_after_first_contribution() {
        let result = project_sip(&sample_sip()).expect("valid inputs");

        assert_eq!(result.monthly_values.len(), 12);
        assert_eq!(result.monthly_values[0], 1_010.0);
        assert_eq!(result.monthly_values[1], 2_030.0);
        assert_eq!(result.monthly_values[2], 3_060.0);
        assert_eq!(result.monthly_values[11], 12_809.0);
    }

    #[test]
    fn sip_tax_applies_to_gains_only() {
        let mut inputs = sample_sip();
        inputs.tax_rate_percent = 10.0;

        let result = project_sip(&inputs).expect("valid inputs");
        assert_approx(result.tax_amount, result.returns * 0.10);
        assert_approx(result.final_amount, result.future_value - result.tax_amount);
        assert!(result.final_amount > result.total_investment);
    }

    #[test]
    fn sip_rejects_precondition_violations() {
        let mut inputs = sample_sip();
        inputs.years = 0;
        assert_eq!(project_sip(&inputs), Err(ProjectionError::ZeroYears));

        let mut inputs = sample_sip();
        inputs.monthly_investment = 0.0;
        assert_eq!(
            project_sip(&inputs),
            Err(ProjectionError::NotPositive {
                field: "monthly_investment"
            })
        );

        let mut inputs = sample_sip();
        inputs.annual_return_percent = -1.0;
        assert_eq!(
            project_sip(&inputs),
            Err(ProjectionError::Negative {
                field: "annual_return_percent"
            })
        );

        let mut inputs = sample_sip();
        inputs.tax_rate_percent = 100.5;
        assert!(matches!(
            project_sip(&inputs),
            Err(ProjectionError::OutOfRange {
                field: "tax_rate_percent",
                ..
            })
        ));

        let mut inputs = sample_sip();
        inputs.monthly_investment = f64::NAN;
        assert_eq!(
            project_sip(&inputs),
            Err(ProjectionError::NonFinite {
                field: "monthly_investment"
            })
        );

        let mut inputs = sample_sip();
        inputs.years = u32::MAX;
        assert_eq!(
            project_sip(&inputs),
            Err(ProjectionError::HorizonTooLong {
                years: u32::MAX,
                max: MAX_PROJECTION_YEARS,
            })
        );
    }

    #[test]
    fn horizon_above_cap_is_rejected_before_allocating() {
        let mut sip = sample_sip();
        sip.years = u32::MAX / 12;
        assert_eq!(
            project_sip(&sip),
            Err(ProjectionError::HorizonTooLong {
                years: u32::MAX / 12,
                max: MAX_PROJECTION_YEARS,
            })
        );

        let mut swp = sample_swp();
        swp.years = u32::MAX / 12;
        assert_eq!(
            project_swp(&swp),
            Err(ProjectionError::HorizonTooLong {
                years: u32::MAX / 12,
                max: MAX_PROJECTION_YEARS,
            })
        );

        swp.years = MAX_PROJECTION_YEARS + 1;
        assert!(matches!(
            project_swp(&swp),
            Err(ProjectionError::HorizonTooLong { .. })
        ));
    }

    #[test]
    fn horizon_at_cap_is_projected() {
        let mut swp = sample_swp();
        swp.years = MAX_PROJECTION_YEARS;
        swp.monthly_withdrawal = 1.0;

        let result = project_swp(&swp).expect("valid inputs");
        assert_eq!(
            result.monthly_values.len(),
            MAX_PROJECTION_YEARS as usize * 12 + 1
        );
    }

    #[test]
    fn swp_zero_rate_depletes_and_floors_recorded_balance() {
        let result = project_swp(&sample_swp()).expect("valid inputs");

        assert_eq!(result.total_withdrawals, 120_000.0);
        assert_eq!(result.final_balance, 0.0);
        assert_eq!(result.returns, 20_000.0);
        assert_eq!(result.monthly_values.len(), 13);
        assert_eq!(result.monthly_values[0], 100_000.0);
        assert_eq!(result.monthly_values[1], 90_000.0);
        assert_eq!(result.monthly_values[10], 0.0);
        assert_eq!(result.monthly_values[11], 0.0);
        assert_eq!(result.monthly_values[12], 0.0);
    }

    #[test]
    fn swp_withdrawing_exactly_the_monthly_growth_keeps_balance_flat() {
        let inputs = SwpInputs {
            initial_investment: 100_000.0,
            annual_return_percent: 12.0,
            years: 1,
            monthly_withdrawal: 1_000.0,
        };

        let result = project_swp(&inputs).expect("valid inputs");
        for value in &result.monthly_values {
            assert_approx(*value, 100_000.0);
        }
        assert_approx(result.final_balance, 100_000.0);
        assert_approx(result.returns, 12_000.0);
    }

    #[test]
    fn swp_series_length_includes_initial_balance() {
        let mut inputs = sample_swp();
        inputs.years = 7;
        inputs.monthly_withdrawal = 100.0;

        let result = project_swp(&inputs).expect("valid inputs");
        assert_eq!(result.monthly_values.len(), 7 * 12 + 1);
    }

    #[test]
    fn swp_rejects_precondition_violations() {
        let mut inputs = sample_swp();
        inputs.monthly_withdrawal = -5.0;
        assert_eq!(
            project_swp(&inputs),
            Err(ProjectionError::NotPositive {
                field: "monthly_withdrawal"
            })
        );

        let mut inputs = sample_swp();
        inputs.initial_investment = f64::INFINITY;
        assert_eq!(
            project_swp(&inputs),
            Err(ProjectionError::NonFinite {
                field: "initial_investment"
            })
        );

        let mut inputs = sample_swp();
        inputs.years = 0;
        assert_eq!(project_swp(&inputs), Err(ProjectionError::ZeroYears));
    }

    #[test]
    fn repeated_projections_are_identical() {
        let sip = SipInputs {
            monthly_investment: 7_500.0,
            annual_return_percent: 11.5,
            years: 25,
            tax_rate_percent: 12.5,
        };
        let swp = SwpInputs {
            initial_investment: 2_500_000.0,
            annual_return_percent: 7.25,
            years: 30,
            monthly_withdrawal: 18_000.0,
        };

        let sip_a = project_sip(&sip).expect("valid inputs");
        let sip_b = project_sip(&sip).expect("valid inputs");
        assert_eq!(sip_a.future_value.to_bits(), sip_b.future_value.to_bits());
        assert_eq!(sip_a, sip_b);

        let swp_a = project_swp(&swp).expect("valid inputs");
        let swp_b = project_swp(&swp).expect("valid inputs");
        assert_eq!(swp_a.final_balance.to_bits(), swp_b.final_balance.to_bits());
        assert_eq!(swp_a, swp_b);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_sip_future_value_increases_with_return(
            monthly_investment in 500u32..100_000,
            years in 1u32..41,
            low_bp in 0u32..3_000,
            delta_bp in 1u32..1_000
        ) {
            let mut inputs = SipInputs {
                monthly_investment: monthly_investment as f64,
                annual_return_percent: low_bp as f64 / 100.0,
                years,
                tax_rate_percent: 0.0,
            };
            let low = project_sip(&inputs).expect("valid inputs");
            inputs.annual_return_percent = (low_bp + delta_bp) as f64 / 100.0;
            let high = project_sip(&inputs).expect("valid inputs");

            prop_assert!(high.future_value > low.future_value);
        }

        #[test]
        fn prop_sip_series_ends_at_rounded_future_value(
            monthly_investment in 500u32..100_000,
            years in 1u32..41,
            rate_bp in 0u32..3_000,
            tax_bp in 0u32..4_000
        ) {
            let inputs = SipInputs {
                monthly_investment: monthly_investment as f64,
                annual_return_percent: rate_bp as f64 / 100.0,
                years,
                tax_rate_percent: tax_bp as f64 / 100.0,
            };
            let result = project_sip(&inputs).expect("valid inputs");

            prop_assert_eq!(result.monthly_values.len(), years as usize * 12);
            let last = result.monthly_values[result.monthly_values.len() - 1];
            let tolerance = 0.5 + result.future_value.abs() * 1e-9;
            prop_assert!((last - result.future_value).abs() <= tolerance);
            prop_assert!(result.final_amount <= result.future_value);
            prop_assert!(result.final_amount >= result.total_investment - EPS);
        }

        #[test]
        fn prop_swp_series_is_non_negative_and_sized(
            initial in 1u32..5_000_000,
            years in 1u32..41,
            rate_bp in 0u32..3_000,
            withdrawal in 1u32..200_000
        ) {
            let inputs = SwpInputs {
                initial_investment: initial as f64,
                annual_return_percent: rate_bp as f64 / 100.0,
                years,
                monthly_withdrawal: withdrawal as f64,
            };
            let result = project_swp(&inputs).expect("valid inputs");

            prop_assert_eq!(result.monthly_values.len(), years as usize * 12 + 1);
            prop_assert!(result.monthly_values.iter().all(|v| *v >= 0.0));
            prop_assert_eq!(result.final_balance, result.monthly_values[result.monthly_values.len() - 1]);
            prop_assert_eq!(result.total_withdrawals, withdrawal as f64 * (years * 12) as f64);
        }

        #[test]
        fn prop_swp_balance_never_rises_when_withdrawal_exceeds_growth(
            initial in 1_000u32..5_000_000,
            years in 1u32..41,
            rate_bp in 0u32..3_000,
            extra in 1u32..50_000
        ) {
            let rate_percent = rate_bp as f64 / 100.0;
            let growth = initial as f64 * rate_percent / 1200.0;
            let inputs = SwpInputs {
                initial_investment: initial as f64,
                annual_return_percent: rate_percent,
                years,
                monthly_withdrawal: growth.ceil() + extra as f64,
            };
            let result = project_swp(&inputs).expect("valid inputs");

            for pair in result.monthly_values.windows(2) {
                prop_assert!(pair[1] <= pair[0]);
            }
        }
    }
}
