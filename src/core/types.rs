use serde::{Deserialize, Serialize};

/// Longest horizon the engine accepts, in years.
pub const MAX_HORIZON_YEARS: u32 = 100;

/// Annual return at or below this makes the monthly growth factor non-positive.
pub const MIN_ANNUAL_RETURN_PERCENT: f64 = -1200.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("{field} {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

impl ProjectionError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawProjectionInput")]
pub struct ProjectionInput {
    initial_balance: f64,
    monthly_contribution: f64,
    annual_return_percent: f64,
    horizon_years: u32,
}

/// Unvalidated wire shape. The horizon is kept as a number so negative or
/// fractional years surface as validation errors instead of parse errors.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProjectionInput {
    pub initial_balance: f64,
    pub monthly_contribution: f64,
    pub annual_return_percent: f64,
    pub horizon_years: f64,
}

impl TryFrom<RawProjectionInput> for ProjectionInput {
    type Error = ProjectionError;

    fn try_from(raw: RawProjectionInput) -> Result<Self, Self::Error> {
        let horizon_years = horizon_from_number(raw.horizon_years)?;
        Self::new(
            raw.initial_balance,
            raw.monthly_contribution,
            raw.annual_return_percent,
            horizon_years,
        )
    }
}

fn horizon_from_number(years: f64) -> Result<u32, ProjectionError> {
    if !years.is_finite() {
        return Err(ProjectionError::invalid("horizonYears", "must be finite"));
    }
    if years < 0.0 {
        return Err(ProjectionError::invalid("horizonYears", "must be >= 0"));
    }
    if years.fract() != 0.0 {
        return Err(ProjectionError::invalid(
            "horizonYears",
            "must be a whole number of years",
        ));
    }
    if years > f64::from(MAX_HORIZON_YEARS) {
        return Err(ProjectionError::invalid(
            "horizonYears",
            format!("must be <= {MAX_HORIZON_YEARS}"),
        ));
    }
    Ok(years as u32)
}

impl ProjectionInput {
    pub fn new(
        initial_balance: f64,
        monthly_contribution: f64,
        annual_return_percent: f64,
        horizon_years: u32,
    ) -> Result<Self, ProjectionError> {
        for (field, value) in [
            ("initialBalance", initial_balance),
            ("monthlyContribution", monthly_contribution),
            ("annualReturnPercent", annual_return_percent),
        ] {
            if !value.is_finite() {
                return Err(ProjectionError::invalid(field, "must be finite"));
            }
        }

        if initial_balance < 0.0 {
            return Err(ProjectionError::invalid("initialBalance", "must be >= 0"));
        }
        if monthly_contribution < 0.0 {
            return Err(ProjectionError::invalid(
                "monthlyContribution",
                "must be >= 0",
            ));
        }
        if annual_return_percent <= MIN_ANNUAL_RETURN_PERCENT {
            return Err(ProjectionError::invalid(
                "annualReturnPercent",
                format!("must be > {MIN_ANNUAL_RETURN_PERCENT}"),
            ));
        }
        if horizon_years > MAX_HORIZON_YEARS {
            return Err(ProjectionError::invalid(
                "horizonYears",
                format!("must be <= {MAX_HORIZON_YEARS}"),
            ));
        }

        let input = Self {
            initial_balance,
            monthly_contribution,
            annual_return_percent,
            horizon_years,
        };
        // Balance and contributions move monotonically, so a finite final
        // point bounds every earlier one.
        if !super::engine::project(&input).final_point().is_finite() {
            return Err(ProjectionError::invalid(
                "annualReturnPercent",
                "projection exceeds the numeric range",
            ));
        }
        Ok(input)
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn monthly_contribution(&self) -> f64 {
        self.monthly_contribution
    }

    pub fn annual_return_percent(&self) -> f64 {
        self.annual_return_percent
    }

    pub fn horizon_years(&self) -> u32 {
        self.horizon_years
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_return_percent / 100.0 / 12.0
    }

    pub fn months(&self) -> u32 {
        self.horizon_years * 12
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub year_index: u32,
    pub balance: f64,
    pub contributions: f64,
    pub earnings: f64,
}

impl ProjectionPoint {
    pub fn is_finite(&self) -> bool {
        self.balance.is_finite() && self.contributions.is_finite() && self.earnings.is_finite()
    }
}

/// Year-end snapshots from year 0 through the horizon, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProjectionSeries {
    points: Vec<ProjectionPoint>,
}

impl ProjectionSeries {
    pub(crate) fn from_points(points: Vec<ProjectionPoint>) -> Self {
        debug_assert!(!points.is_empty());
        Self { points }
    }

    pub fn points(&self) -> &[ProjectionPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn final_point(&self) -> ProjectionPoint {
        // A series always carries the year-0 point.
        self.points[self.points.len() - 1]
    }

    pub fn into_points(self) -> Vec<ProjectionPoint> {
        self.points
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub final_balance: f64,
    pub total_contributions: f64,
    pub total_earnings: f64,
    pub return_on_contributions_percent: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_values() {
        let err = ProjectionInput::new(f64::NAN, 0.0, 5.0, 10).expect_err("nan balance");
        assert!(err.to_string().contains("initialBalance"));

        let err = ProjectionInput::new(0.0, 0.0, f64::INFINITY, 10).expect_err("inf rate");
        assert!(err.to_string().contains("annualReturnPercent"));
    }

    #[test]
    fn rejects_negative_amounts_and_collapsing_rate() {
        assert!(ProjectionInput::new(-1.0, 0.0, 5.0, 1).is_err());
        assert!(ProjectionInput::new(0.0, -1.0, 5.0, 1).is_err());
        assert!(ProjectionInput::new(0.0, 0.0, -1200.0, 1).is_err());
        assert!(ProjectionInput::new(0.0, 0.0, -1199.0, 1).is_ok());
    }

    #[test]
    fn rejects_horizon_beyond_limit() {
        assert!(ProjectionInput::new(0.0, 0.0, 5.0, MAX_HORIZON_YEARS).is_ok());
        assert!(ProjectionInput::new(0.0, 0.0, 5.0, MAX_HORIZON_YEARS + 1).is_err());
    }

    #[test]
    fn rejects_inputs_whose_projection_overflows() {
        let err = ProjectionInput::new(1e300, 0.0, 100_000.0, MAX_HORIZON_YEARS)
            .expect_err("balance overflows f64");
        assert_eq!(
            err,
            ProjectionError::InvalidInput {
                field: "annualReturnPercent",
                reason: "projection exceeds the numeric range".to_string(),
            }
        );

        let huge_but_finite = ProjectionInput::new(1e300, 0.0, 0.0, MAX_HORIZON_YEARS);
        assert!(huge_but_finite.is_ok());
    }

    #[test]
    fn deserialize_validates_horizon() {
        let negative = serde_json::from_str::<ProjectionInput>(
            r#"{"initialBalance":1,"monthlyContribution":1,"annualReturnPercent":5,"horizonYears":-1}"#,
        )
        .expect_err("negative horizon");
        assert!(negative.to_string().contains("horizonYears must be >= 0"));

        let fractional = serde_json::from_str::<ProjectionInput>(
            r#"{"initialBalance":1,"monthlyContribution":1,"annualReturnPercent":5,"horizonYears":2.5}"#,
        )
        .expect_err("fractional horizon");
        assert!(fractional.to_string().contains("whole number"));
    }

    #[test]
    fn serializes_camel_case_with_integer_horizon() {
        let input = ProjectionInput::new(10_000.0, 500.0, 8.0, 20).expect("valid");
        let json = serde_json::to_value(input).expect("serialize");
        assert_eq!(json["initialBalance"], 10_000.0);
        assert_eq!(json["monthlyContribution"], 500.0);
        assert_eq!(json["annualReturnPercent"], 8.0);
        assert_eq!(json["horizonYears"], 20);

        let back: ProjectionInput = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, input);
    }
}
