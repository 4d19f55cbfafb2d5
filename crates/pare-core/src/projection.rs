//! Pure projections over analyses and cut plans
//!
//! Everything here is deterministic and side-effect free apart from logging.
//! The planner calls [`reconcile_plan`] on every plan it accepts, so the
//! numeric fields of a plan held by the planner always agree with each other.

use serde::Serialize;
use tracing::warn;

use crate::models::{CutPlan, ExpenseAnalysis, SavingsTarget, TargetPreset};

/// Rounding tolerance for currency comparisons
pub const CENT_TOLERANCE: f64 = 0.01;

/// Number of categories shown in the pie projection by default
pub const DEFAULT_PIE_LIMIT: usize = 5;

/// Round to two decimal places
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Default savings target: 15% of monthly expenses, rounded to cents
///
/// Returns 0 when the analysis has no positive monthly total.
pub fn compute_default_target(analysis: &ExpenseAnalysis) -> f64 {
    analysis
        .total_monthly_expenses()
        .map(|total| round_cents(total * TargetPreset::Default.ratio()))
        .unwrap_or(0.0)
}

/// A preset resolved against a concrete analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PresetTarget {
    pub preset: TargetPreset,
    pub target: SavingsTarget,
}

/// Resolve one preset, or `None` if the analysis has no positive total
pub fn preset_target(analysis: &ExpenseAnalysis, preset: TargetPreset) -> Option<SavingsTarget> {
    let total = analysis.total_monthly_expenses()?;
    SavingsTarget::new(round_cents(total * preset.ratio())).ok()
}

/// All presets for an analysis, smallest first
pub fn target_presets(analysis: &ExpenseAnalysis) -> Vec<PresetTarget> {
    TargetPreset::all()
        .iter()
        .filter_map(|&preset| {
            preset_target(analysis, preset).map(|target| PresetTarget { preset, target })
        })
        .collect()
}

/// Restore the numeric invariants of a plan
///
/// - each item's `new_budget` follows from its spending and cut percent
/// - each item's `monthly_savings` is spending minus new budget
/// - `estimated_savings` is the sum of item savings
/// - `achievable` is derived from estimated vs target savings
/// - `percent_of_expenses` is relative to `total_monthly_expenses`; without
///   one, the total implied by the reported estimate and percent is used
pub fn reconcile_plan(mut plan: CutPlan, total_monthly_expenses: Option<f64>) -> CutPlan {
    let total = total_monthly_expenses
        .filter(|t| t.is_finite() && *t > 0.0)
        .or_else(|| implied_total(&plan));

    for item in &mut plan.spending_plan {
        let expected_budget = item.current_spending * (1.0 - item.suggested_cut_percent / 100.0);
        if (item.new_budget - expected_budget).abs() > CENT_TOLERANCE {
            warn!(
                category = %item.category,
                reported = item.new_budget,
                expected = expected_budget,
                "Repairing inconsistent new budget"
            );
            item.new_budget = expected_budget;
        }

        let expected_savings = item.current_spending - item.new_budget;
        if (item.monthly_savings - expected_savings).abs() > CENT_TOLERANCE {
            warn!(
                category = %item.category,
                reported = item.monthly_savings,
                expected = expected_savings,
                "Repairing inconsistent monthly savings"
            );
            item.monthly_savings = expected_savings;
        }
    }

    let estimated: f64 = plan.spending_plan.iter().map(|i| i.monthly_savings).sum();
    if (plan.estimated_savings - estimated).abs() > CENT_TOLERANCE {
        warn!(
            reported = plan.estimated_savings,
            summed = estimated,
            "Estimated savings disagree with plan items, using item sum"
        );
    }
    plan.estimated_savings = estimated;

    let achievable = plan.estimated_savings >= plan.target_savings - CENT_TOLERANCE;
    if achievable != plan.achievable {
        warn!(
            reported = plan.achievable,
            derived = achievable,
            "Achievable flag contradicts plan totals, using derived value"
        );
    }
    plan.achievable = achievable;

    if let Some(total) = total {
        plan.percent_of_expenses = plan.estimated_savings / total * 100.0;
    }

    plan
}

/// Monthly total behind the backend's own estimate and percent
///
/// Both come from the same (possibly capped) estimate, so their ratio still
/// recovers the total the backend used.
fn implied_total(plan: &CutPlan) -> Option<f64> {
    let (estimated, percent) = (plan.estimated_savings, plan.percent_of_expenses);
    if estimated > 0.0 && percent > 0.0 {
        Some(estimated / percent * 100.0).filter(|t| t.is_finite())
    } else {
        None
    }
}

/// Bar chart point: one category before and after the cut
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub name: String,
    pub current_spending: f64,
    pub after_cut: f64,
    pub savings: f64,
}

/// Project a plan into chart points, in plan order
pub fn project_chart_series(plan: Option<&CutPlan>) -> Vec<ChartPoint> {
    let Some(plan) = plan else {
        return Vec::new();
    };

    plan.spending_plan
        .iter()
        .map(|item| ChartPoint {
            name: item.category.clone(),
            current_spending: item.current_spending,
            after_cut: item.new_budget,
            savings: item.monthly_savings,
        })
        .collect()
}

/// Pie slice: a category's share of spending and its potential saving
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    pub savings: f64,
}

/// First `limit` suggestions as pie slices, in the order received
pub fn project_pie_series(analysis: Option<&ExpenseAnalysis>, limit: usize) -> Vec<PieSlice> {
    let Some(analysis) = analysis else {
        return Vec::new();
    };

    analysis
        .suggestions
        .iter()
        .take(limit)
        .map(|s| PieSlice {
            name: s.category.clone(),
            value: s.monthly_avg,
            savings: s.savings,
        })
        .collect()
}

/// Budget change for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDelta {
    pub category: String,
    pub before: f64,
    pub after: f64,
    /// after - before; negative for a cut
    pub delta: f64,
    pub delta_percent: f64,
}

pub fn category_deltas(plan: &CutPlan) -> Vec<CategoryDelta> {
    plan.spending_plan
        .iter()
        .map(|item| {
            let delta = item.new_budget - item.current_spending;
            let delta_percent = if item.current_spending > 0.0 {
                delta / item.current_spending * 100.0
            } else {
                0.0
            };
            CategoryDelta {
                category: item.category.clone(),
                before: item.current_spending,
                after: item.new_budget,
                delta,
                delta_percent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisSummary, CategorySuggestion, PlanItem};

    fn analysis_with_total(total: f64) -> ExpenseAnalysis {
        ExpenseAnalysis {
            summary: Some(AnalysisSummary {
                total_monthly_expenses: total,
                potential_savings: 0.0,
                potential_savings_percent: 0.0,
            }),
            ..Default::default()
        }
    }

    fn item(category: &str, spending: f64, cut: f64) -> PlanItem {
        let new_budget = spending * (1.0 - cut / 100.0);
        PlanItem {
            category: category.to_string(),
            current_spending: spending,
            suggested_cut_percent: cut,
            new_budget,
            monthly_savings: spending - new_budget,
            actions: vec![],
        }
    }

    #[test]
    fn test_default_target_is_fifteen_percent() {
        assert_eq!(compute_default_target(&analysis_with_total(4000.0)), 600.0);
        assert_eq!(compute_default_target(&analysis_with_total(1234.56)), 185.18);
    }

    #[test]
    fn test_default_target_without_total() {
        assert_eq!(compute_default_target(&ExpenseAnalysis::default()), 0.0);
        assert_eq!(compute_default_target(&analysis_with_total(0.0)), 0.0);
        assert_eq!(compute_default_target(&analysis_with_total(-10.0)), 0.0);
    }

    #[test]
    fn test_target_presets() {
        let presets = target_presets(&analysis_with_total(4000.0));
        let amounts: Vec<f64> = presets.iter().map(|p| p.target.amount()).collect();
        assert_eq!(amounts, vec![400.0, 600.0, 800.0, 1200.0]);
        assert_eq!(presets[2].preset, TargetPreset::Moderate);

        assert!(target_presets(&ExpenseAnalysis::default()).is_empty());
    }

    #[test]
    fn test_reconcile_short_plan_is_not_achievable() {
        let plan = CutPlan {
            target_savings: 600.0,
            achievable: true,
            estimated_savings: 600.0,
            spending_plan: vec![item("Food", 1500.0, 20.0), item("Leisure", 500.0, 30.0)],
            ..Default::default()
        };

        let plan = reconcile_plan(plan, Some(4000.0));
        assert!((plan.estimated_savings - 450.0).abs() < CENT_TOLERANCE);
        assert!(!plan.achievable);
        assert!((plan.percent_of_expenses - 11.25).abs() < 1e-9);
    }

    #[test]
    fn test_reconcile_capped_estimate_uses_item_sum() {
        // Backend caps estimated savings at the target and sends 0/1 flags
        let plan = CutPlan {
            target_savings: 600.0,
            achievable: false,
            estimated_savings: 600.0,
            spending_plan: vec![item("Food", 2000.0, 20.0), item("Leisure", 1000.0, 30.0)],
            ..Default::default()
        };

        let plan = reconcile_plan(plan, Some(4000.0));
        assert!((plan.estimated_savings - 700.0).abs() < CENT_TOLERANCE);
        assert!(plan.achievable);
        assert!((plan.percent_of_expenses - 17.5).abs() < 1e-9);
    }

    #[test]
    fn test_reconcile_repairs_item_fields() {
        let mut bad = item("Transport", 800.0, 25.0);
        bad.new_budget = 700.0;
        bad.monthly_savings = 10.0;

        let plan = reconcile_plan(
            CutPlan {
                target_savings: 100.0,
                spending_plan: vec![bad],
                ..Default::default()
            },
            None,
        );

        let item = &plan.spending_plan[0];
        assert!((item.new_budget - 600.0).abs() < CENT_TOLERANCE);
        assert!((item.monthly_savings - 200.0).abs() < CENT_TOLERANCE);
        let sum: f64 = plan.spending_plan.iter().map(|i| i.monthly_savings).sum();
        assert!((sum - plan.estimated_savings).abs() < CENT_TOLERANCE);
        assert!(plan.achievable);
    }

    #[test]
    fn test_reconcile_capped_estimate_without_total() {
        // 50 target capped by the backend; items save 156 of a 4000 total
        let plan = reconcile_plan(
            CutPlan {
                target_savings: 50.0,
                achievable: true,
                estimated_savings: 50.0,
                percent_of_expenses: 1.25,
                spending_plan: vec![item("Food", 1200.0, 8.0), item("Leisure", 600.0, 10.0)],
                ..Default::default()
            },
            None,
        );

        assert!((plan.estimated_savings - 156.0).abs() < CENT_TOLERANCE);
        assert!((plan.percent_of_expenses - 3.9).abs() < 1e-9);
        assert!(
            (plan.percent_of_expenses - plan.estimated_savings / 4000.0 * 100.0).abs() < 1e-9
        );
    }

    #[test]
    fn test_reconcile_keeps_server_percent_without_total() {
        let plan = reconcile_plan(
            CutPlan {
                target_savings: 50.0,
                percent_of_expenses: 7.5,
                spending_plan: vec![item("Food", 100.0, 50.0)],
                ..Default::default()
            },
            None,
        );
        assert_eq!(plan.percent_of_expenses, 7.5);
    }

    #[test]
    fn test_reconcile_empty_plan() {
        let plan = reconcile_plan(
            CutPlan {
                target_savings: 100.0,
                achievable: true,
                ..Default::default()
            },
            Some(1000.0),
        );
        assert_eq!(plan.estimated_savings, 0.0);
        assert!(!plan.achievable);
        assert_eq!(plan.percent_of_expenses, 0.0);
    }

    #[test]
    fn test_chart_series_empty_cases() {
        assert!(project_chart_series(None).is_empty());
        assert!(project_chart_series(Some(&CutPlan::default())).is_empty());
    }

    #[test]
    fn test_chart_series_maps_in_order() {
        let plan = CutPlan {
            spending_plan: vec![item("Leisure", 500.0, 30.0), item("Food", 1500.0, 20.0)],
            ..Default::default()
        };

        let series = project_chart_series(Some(&plan));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "Leisure");
        assert_eq!(series[0].current_spending, 500.0);
        assert!((series[0].after_cut - 350.0).abs() < 1e-9);
        assert!((series[0].savings - 150.0).abs() < 1e-9);
        assert_eq!(series[1].name, "Food");

        let json = serde_json::to_value(&series[0]).unwrap();
        assert!(json.get("currentSpending").is_some());
        assert!(json.get("afterCut").is_some());
    }

    #[test]
    fn test_pie_series_takes_first_entries_unsorted() {
        let analysis = ExpenseAnalysis {
            suggestions: (1..=7)
                .map(|i| CategorySuggestion {
                    category: format!("Cat{}", i),
                    monthly_avg: 100.0 * i as f64,
                    savings: 10.0 * i as f64,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let slices = project_pie_series(Some(&analysis), DEFAULT_PIE_LIMIT);
        assert_eq!(slices.len(), 5);
        assert_eq!(slices[0].name, "Cat1");
        assert_eq!(slices[4].name, "Cat5");
        assert_eq!(slices[4].value, 500.0);

        assert_eq!(project_pie_series(Some(&analysis), 10).len(), 7);
        assert!(project_pie_series(None, DEFAULT_PIE_LIMIT).is_empty());
        assert!(project_pie_series(Some(&ExpenseAnalysis::default()), 5).is_empty());
    }

    #[test]
    fn test_category_deltas() {
        let plan = CutPlan {
            spending_plan: vec![item("Food", 1000.0, 10.0), item("Zero", 0.0, 10.0)],
            ..Default::default()
        };
        let deltas = category_deltas(&plan);
        assert!((deltas[0].delta + 100.0).abs() < 1e-9);
        assert!((deltas[0].delta_percent + 10.0).abs() < 1e-9);
        assert_eq!(deltas[1].delta_percent, 0.0);
    }
}
