//! Domain models for Pare
//!
//! Wire types mirror the finance backend's JSON. Arrays the backend may omit
//! deserialize as empty so callers never have to special-case them.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Status the backend reports when there are too few transactions to analyze
pub const STATUS_INSUFFICIENT_DATA: &str = "insufficient_data";

/// Per-category expense analysis with cut suggestions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub summary: Option<AnalysisSummary>,
    #[serde(default)]
    pub suggestions: Vec<CategorySuggestion>,
    #[serde(default)]
    pub general_recommendations: Vec<String>,
}

impl ExpenseAnalysis {
    /// Average monthly expenses, if the backend had enough data to compute one
    pub fn total_monthly_expenses(&self) -> Option<f64> {
        self.summary
            .as_ref()
            .map(|s| s.total_monthly_expenses)
            .filter(|total| total.is_finite() && *total > 0.0)
    }

    pub fn has_insufficient_data(&self) -> bool {
        self.status.as_deref() == Some(STATUS_INSUFFICIENT_DATA)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(default)]
    pub total_monthly_expenses: f64,
    #[serde(default)]
    pub potential_savings: f64,
    #[serde(default)]
    pub potential_savings_percent: f64,
}

/// A category the backend thinks can be trimmed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category: String,
    #[serde(default)]
    pub monthly_avg: f64,
    #[serde(default)]
    pub percent_of_total: f64,
    /// Suggested cut, 0-100
    #[serde(default)]
    pub suggested_cut: f64,
    #[serde(default)]
    pub savings: f64,
    #[serde(default)]
    pub reason: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Realization of a savings target into category-level budget cuts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CutPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub target_savings: f64,
    /// The backend sends 0/1 here; booleans are accepted too
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub achievable: bool,
    #[serde(default)]
    pub estimated_savings: f64,
    #[serde(default)]
    pub percent_of_expenses: f64,
    #[serde(default)]
    pub general_recommendations: Vec<String>,
    #[serde(default)]
    pub spending_plan: Vec<PlanItem>,
}

impl CutPlan {
    pub fn has_insufficient_data(&self) -> bool {
        self.status.as_deref() == Some(STATUS_INSUFFICIENT_DATA)
    }

    /// First general recommendation, shown as the plan headline
    pub fn headline(&self) -> Option<&str> {
        self.general_recommendations.first().map(String::as_str)
    }
}

/// One category's line in a cut plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub category: String,
    #[serde(default)]
    pub current_spending: f64,
    #[serde(default)]
    pub suggested_cut_percent: f64,
    #[serde(default)]
    pub new_budget: f64,
    #[serde(default)]
    pub monthly_savings: f64,
    #[serde(default)]
    pub actions: Vec<String>,
}

/// Quick wins response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickWins {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub quick_wins: Vec<QuickWin>,
}

/// A small, immediately actionable saving
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickWin {
    /// frequent_small_expense, subscription, high_expense
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_monthly_savings: Option<f64>,
    /// Free-form, sometimes a number and sometimes a word like "variável"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_saving: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub suggestion: String,
}

/// A validated monthly savings target
///
/// Always positive and finite. Construct with [`SavingsTarget::new`] or parse
/// user input with `str::parse`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SavingsTarget(f64);

impl SavingsTarget {
    pub fn new(amount: f64) -> Result<Self> {
        if amount.is_nan() || amount.is_infinite() {
            return Err(Error::InvalidInput(format!(
                "savings target must be a number, got {}",
                amount
            )));
        }
        if amount <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "savings target must be positive, got {}",
                amount
            )));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> f64 {
        self.0
    }
}

impl std::str::FromStr for SavingsTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("savings target is required".into()));
        }
        let amount: f64 = trimmed.parse().map_err(|_| {
            Error::InvalidInput(format!("savings target must be a number, got {:?}", trimmed))
        })?;
        Self::new(amount)
    }
}

impl std::fmt::Display for SavingsTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl<'de> Deserialize<'de> for SavingsTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

/// Suggested targets as a share of monthly expenses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPreset {
    /// 10%
    Economical,
    /// 15%, the target pre-filled after an analysis loads
    Default,
    /// 20%
    Moderate,
    /// 30%
    Ambitious,
}

impl TargetPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Economical => "economical",
            Self::Default => "default",
            Self::Moderate => "moderate",
            Self::Ambitious => "ambitious",
        }
    }

    /// Fraction of monthly expenses this preset aims to save
    pub fn ratio(&self) -> f64 {
        match self {
            Self::Economical => 0.10,
            Self::Default => 0.15,
            Self::Moderate => 0.20,
            Self::Ambitious => 0.30,
        }
    }

    pub fn all() -> &'static [TargetPreset] {
        &[
            Self::Economical,
            Self::Default,
            Self::Moderate,
            Self::Ambitious,
        ]
    }
}

impl std::str::FromStr for TargetPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "economical" | "10" => Ok(Self::Economical),
            "default" | "15" => Ok(Self::Default),
            "moderate" | "20" => Ok(Self::Moderate),
            "ambitious" | "30" => Ok(Self::Ambitious),
            _ => Err(format!(
                "Unknown preset: {}. Available: economical, default, moderate, ambitious",
                s
            )),
        }
    }
}

impl std::fmt::Display for TargetPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireFlag {
    Bool(bool),
    Int(i64),
    Float(f64),
}

fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(match WireFlag::deserialize(deserializer)? {
        WireFlag::Bool(b) => b,
        WireFlag::Int(i) => i != 0,
        WireFlag::Float(f) => f != 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_accepts_decimal() {
        let target: SavingsTarget = "600.50".parse().unwrap();
        assert_eq!(target.amount(), 600.5);
        assert_eq!(target.to_string(), "600.50");
    }

    #[test]
    fn test_parse_target_rejects_bad_input() {
        for input in ["-5", "abc", "0", "", "   ", "NaN", "inf"] {
            let result = input.parse::<SavingsTarget>();
            assert!(
                matches!(result, Err(Error::InvalidInput(_))),
                "expected InvalidInput for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_target_deserialize_validates() {
        assert!(serde_json::from_str::<SavingsTarget>("250.0").is_ok());
        assert!(serde_json::from_str::<SavingsTarget>("-1").is_err());
    }

    #[test]
    fn test_cut_plan_accepts_integer_achievable() {
        let plan: CutPlan = serde_json::from_str(
            r#"{"status":"success","target_savings":600,"achievable":1,
                "estimated_savings":600,"percent_of_expenses":15,
                "spending_plan":[],"general_recommendations":[]}"#,
        )
        .unwrap();
        assert!(plan.achievable);

        let plan: CutPlan = serde_json::from_str(r#"{"achievable":0}"#).unwrap();
        assert!(!plan.achievable);

        let plan: CutPlan = serde_json::from_str(r#"{"achievable":true}"#).unwrap();
        assert!(plan.achievable);
    }

    #[test]
    fn test_insufficient_data_analysis() {
        let analysis: ExpenseAnalysis = serde_json::from_str(
            r#"{"status":"insufficient_data","message":"Not enough data","suggestions":[]}"#,
        )
        .unwrap();
        assert!(analysis.has_insufficient_data());
        assert!(analysis.summary.is_none());
        assert_eq!(analysis.total_monthly_expenses(), None);
        assert!(analysis.general_recommendations.is_empty());
    }

    #[test]
    fn test_quick_win_with_textual_saving() {
        let wins: QuickWins = serde_json::from_str(
            r#"{"status":"success","quick_wins":[
                {"type":"high_expense","description":"TV","category":"Lazer",
                 "amount":3200.0,"date":"2024-05-02","potential_saving":"variável",
                 "suggestion":"Review TV"},
                {"type":"subscription","description":"Netflix","amount":39.9,
                 "potential_monthly_savings":39.9,"suggestion":"Review Netflix"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(wins.quick_wins.len(), 2);
        assert_eq!(wins.quick_wins[0].kind, "high_expense");
        assert_eq!(
            wins.quick_wins[0].potential_saving,
            Some(serde_json::Value::String("variável".into()))
        );
        assert_eq!(wins.quick_wins[1].potential_monthly_savings, Some(39.9));
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("Moderate".parse::<TargetPreset>(), Ok(TargetPreset::Moderate));
        assert_eq!("30".parse::<TargetPreset>(), Ok(TargetPreset::Ambitious));
        assert!("lavish".parse::<TargetPreset>().is_err());
    }
}
