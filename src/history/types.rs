use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{ProjectionInput, ProjectionPoint};

/// Account identifier supplied by the identity provider. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerKey(String);

impl OwnerKey {
    /// Returns `None` for empty or whitespace-only keys.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is calling a history operation. Passed explicitly on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Authenticated(OwnerKey),
    Anonymous,
}

impl Caller {
    pub fn from_header_value(raw: Option<&str>) -> Self {
        raw.and_then(OwnerKey::parse)
            .map_or(Self::Anonymous, Self::Authenticated)
    }

    pub fn owner(&self) -> Option<&OwnerKey> {
        match self {
            Self::Authenticated(key) => Some(key),
            Self::Anonymous => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalculationId(i64);

impl CalculationId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CalculationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationKind {
    #[serde(alias = "stocks")]
    Stock,
    Retirement,
}

impl CalculationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Retirement => "retirement",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "stock" | "stocks" => Some(Self::Stock),
            "retirement" => Some(Self::Retirement),
            _ => None,
        }
    }
}

/// Parameters of a saved calculation, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum CalculationParams {
    #[serde(alias = "stocks")]
    Stock { input: ProjectionInput },
    Retirement {
        input: ProjectionInput,
        current_age: u32,
    },
}

impl CalculationParams {
    pub const fn kind(&self) -> CalculationKind {
        match self {
            Self::Stock { .. } => CalculationKind::Stock,
            Self::Retirement { .. } => CalculationKind::Retirement,
        }
    }

    pub const fn input(&self) -> &ProjectionInput {
        match self {
            Self::Stock { input } | Self::Retirement { input, .. } => input,
        }
    }

    pub fn retirement_age(&self) -> Option<u32> {
        match self {
            Self::Stock { .. } => None,
            Self::Retirement { input, current_age } => {
                Some(current_age.saturating_add(input.horizon_years()))
            }
        }
    }
}

/// A record about to be appended; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCalculation {
    pub owner_key: OwnerKey,
    pub params: CalculationParams,
    pub final_point: ProjectionPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCalculation {
    pub id: CalculationId,
    pub owner_key: Option<OwnerKey>,
    pub params: CalculationParams,
    pub final_point: ProjectionPoint,
    pub created_at: DateTime<Utc>,
}

impl SavedCalculation {
    pub const fn kind(&self) -> CalculationKind {
        self.params.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_key_trims_and_rejects_blank() {
        assert_eq!(OwnerKey::parse("  "), None);
        assert_eq!(
            OwnerKey::parse(" ada@example.com ").map(|k| k.to_string()),
            Some("ada@example.com".to_string())
        );
    }

    #[test]
    fn caller_from_missing_or_blank_header_is_anonymous() {
        assert_eq!(Caller::from_header_value(None), Caller::Anonymous);
        assert_eq!(Caller::from_header_value(Some("")), Caller::Anonymous);
        assert!(matches!(
            Caller::from_header_value(Some("a@b.c")),
            Caller::Authenticated(_)
        ));
    }

    #[test]
    fn params_are_tagged_by_kind() {
        let input = ProjectionInput::new(50_000.0, 1_000.0, 7.0, 30).expect("valid");
        let params = CalculationParams::Retirement {
            input,
            current_age: 35,
        };
        let json = serde_json::to_value(params).expect("serialize");

        assert_eq!(json["kind"], "retirement");
        assert_eq!(json["currentAge"], 35);
        assert_eq!(json["input"]["horizonYears"], 30);
        assert_eq!(params.retirement_age(), Some(65));
        assert_eq!(params.kind(), CalculationKind::Retirement);
    }

    #[test]
    fn legacy_stocks_tag_is_accepted() {
        let json = r#"{"kind":"stocks","input":{"initialBalance":10000,"monthlyContribution":500,"annualReturnPercent":8,"horizonYears":20}}"#;
        let params: CalculationParams = serde_json::from_str(json).expect("legacy tag");
        assert_eq!(params.kind(), CalculationKind::Stock);
        assert_eq!(params.retirement_age(), None);
        assert_eq!(CalculationKind::parse("stocks"), Some(CalculationKind::Stock));
    }

    #[test]
    fn retirement_without_age_is_rejected() {
        let json = r#"{"kind":"retirement","input":{"initialBalance":1,"monthlyContribution":1,"annualReturnPercent":1,"horizonYears":1}}"#;
        assert!(serde_json::from_str::<CalculationParams>(json).is_err());
    }
}
