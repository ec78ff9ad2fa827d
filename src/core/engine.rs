use super::types::{ProjectionInput, ProjectionPoint, ProjectionSeries, ProjectionSummary};

const MONTHS_PER_YEAR: u32 = 12;

/// Runs the monthly compounding loop and emits one point per completed year.
///
/// Balance and contributions are carried at full precision; rounding (half
/// away from zero) only happens when a point is emitted.
pub fn project(input: &ProjectionInput) -> ProjectionSeries {
    let monthly_rate = input.monthly_rate();
    let monthly = input.monthly_contribution();

    let mut points = Vec::with_capacity(input.horizon_years() as usize + 1);
    let mut balance = input.initial_balance();
    let mut contributions = input.initial_balance();
    points.push(ProjectionPoint {
        year_index: 0,
        balance: balance.round(),
        contributions: contributions.round(),
        earnings: 0.0,
    });

    for month in 1..=input.months() {
        balance = balance * (1.0 + monthly_rate) + monthly;
        contributions += monthly;

        if month % MONTHS_PER_YEAR == 0 {
            points.push(emit_point(month / MONTHS_PER_YEAR, balance, contributions));
        }
    }

    ProjectionSeries::from_points(points)
}

fn emit_point(year_index: u32, balance: f64, contributions: f64) -> ProjectionPoint {
    ProjectionPoint {
        year_index,
        balance: balance.round(),
        contributions: contributions.round(),
        earnings: (balance - contributions).round(),
    }
}

pub fn summarize(series: &ProjectionSeries) -> ProjectionSummary {
    let last = series.final_point();
    let return_on_contributions_percent = if last.contributions > 0.0 {
        Some(last.earnings / last.contributions * 100.0)
    } else {
        None
    };

    ProjectionSummary {
        final_balance: last.balance,
        total_contributions: last.contributions,
        total_earnings: last.earnings,
        return_on_contributions_percent,
    }
}

/// Closed-form future value of the same monthly annuity, unrounded.
///
/// `FV = P(1+r)^n + PMT((1+r)^n - 1)/r`, with the zero-rate limit `P + PMT*n`.
pub fn future_value(input: &ProjectionInput) -> f64 {
    let r = input.monthly_rate();
    let n = input.months() as i32;
    let p = input.initial_balance();
    let pmt = input.monthly_contribution();

    if r == 0.0 {
        return p + pmt * n as f64;
    }
    let growth = (1.0 + r).powi(n);
    p * growth + pmt * ((growth - 1.0) / r)
}
