//! Mock service for testing and offline demos
//!
//! Serves a fixed household budget and builds cut plans the way the finance
//! backend does: scale the suggested cuts toward the target, order categories
//! by savings, and stop once the target is covered by at least three
//! categories.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{
    AnalysisSummary, CategorySuggestion, CutPlan, ExpenseAnalysis, PlanItem, QuickWin, QuickWins,
    SavingsTarget,
};

use super::ExpenseService;

/// Upper bound when scaling cuts up toward a large target
const MAX_SCALE_UP: f64 = 1.5;
/// Lower bound when scaling cuts down toward a small target
const MIN_SCALE_DOWN: f64 = 0.3;
const MAX_CUT_PERCENT: f64 = 50.0;
const MIN_CUT_PERCENT: f64 = 5.0;
/// Plans keep at least this many categories even once the target is met
const MIN_PLAN_CATEGORIES: usize = 3;

/// Mock expense service
///
/// Clones share state, so a test can keep a handle, flip failures on and off,
/// and count how many requests reached the "backend".
#[derive(Clone)]
pub struct MockExpenseService {
    analysis: Arc<RwLock<ExpenseAnalysis>>,
    failure: Arc<RwLock<Option<String>>>,
    analysis_calls: Arc<AtomicUsize>,
    plan_calls: Arc<AtomicUsize>,
}

impl Default for MockExpenseService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExpenseService {
    /// Mock serving [`sample_analysis`]
    pub fn new() -> Self {
        Self::with_analysis(sample_analysis())
    }

    pub fn with_analysis(analysis: ExpenseAnalysis) -> Self {
        Self {
            analysis: Arc::new(RwLock::new(analysis)),
            failure: Arc::new(RwLock::new(None)),
            analysis_calls: Arc::new(AtomicUsize::new(0)),
            plan_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every request fail with a 503 carrying `message` (None to recover)
    pub fn fail_with(&self, message: Option<&str>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = message.map(str::to_string);
        }
    }

    pub fn analysis_calls(&self) -> usize {
        self.analysis_calls.load(Ordering::SeqCst)
    }

    pub fn plan_calls(&self) -> usize {
        self.plan_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<()> {
        let failure = self
            .failure
            .read()
            .map_err(|_| Error::Config("mock failure lock poisoned".into()))?;
        match failure.as_ref() {
            Some(message) => Err(Error::Api {
                status: 503,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn current_analysis(&self) -> Result<ExpenseAnalysis> {
        self.analysis
            .read()
            .map(|a| a.clone())
            .map_err(|_| Error::Config("mock analysis lock poisoned".into()))
    }
}

#[async_trait]
impl ExpenseService for MockExpenseService {
    async fn expense_analysis(&self, _months: u32) -> Result<ExpenseAnalysis> {
        self.analysis_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.current_analysis()
    }

    async fn expense_cuts(&self, target: SavingsTarget) -> Result<CutPlan> {
        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let analysis = self.current_analysis()?;
        if analysis.has_insufficient_data() {
            return Err(Error::InsufficientData(
                analysis
                    .message
                    .unwrap_or_else(|| "Not enough transactions to build a plan".into()),
            ));
        }
        Ok(simulate_cut_plan(&analysis, target.amount()))
    }

    async fn quick_wins(&self) -> Result<QuickWins> {
        self.check_failure()?;
        Ok(sample_quick_wins())
    }

    fn host(&self) -> &str {
        "mock"
    }
}

/// Household spending 4000/month across six categories
pub fn sample_analysis() -> ExpenseAnalysis {
    let suggestion = |category: &str, monthly_avg: f64, cut: f64, tips: &[&str]| {
        CategorySuggestion {
            category: category.to_string(),
            monthly_avg,
            percent_of_total: monthly_avg / 4000.0 * 100.0,
            suggested_cut: cut,
            savings: monthly_avg * cut / 100.0,
            reason: vec![format!("{} is {:.1}% of spending", category, monthly_avg / 40.0)],
            suggestions: tips.iter().map(|s| s.to_string()).collect(),
        }
    };

    let suggestions = vec![
        suggestion(
            "Food",
            1200.0,
            20.0,
            &["Plan weekly meals", "Buy staples in bulk"],
        ),
        suggestion("Leisure", 600.0, 30.0, &["Look for free events"]),
        suggestion(
            "Transport",
            500.0,
            15.0,
            &["Share rides", "Use public transport twice a week"],
        ),
        suggestion("Shopping", 400.0, 25.0, &["Wait 48 hours before buying"]),
        suggestion("Dining", 350.0, 20.0, &["Cook on weekends"]),
        suggestion("Subscriptions", 150.0, 40.0, &["Cancel unused services"]),
    ];
    let potential: f64 = suggestions.iter().map(|s| s.savings).sum();

    ExpenseAnalysis {
        status: Some("success".into()),
        message: None,
        summary: Some(AnalysisSummary {
            total_monthly_expenses: 4000.0,
            potential_savings: potential,
            potential_savings_percent: potential / 4000.0 * 100.0,
        }),
        suggestions,
        general_recommendations: vec![
            "Applying the suggested cuts saves about 725.00 per month".to_string(),
        ],
    }
}

fn sample_quick_wins() -> QuickWins {
    QuickWins {
        status: Some("success".into()),
        quick_wins: vec![
            QuickWin {
                kind: "frequent_small_expense".into(),
                description: "Coffee shop".into(),
                frequency: Some(12),
                total_amount: Some(96.0),
                potential_monthly_savings: Some(72.0),
                suggestion: "Cut back on Coffee shop (96.00 over 12 visits)".into(),
                ..Default::default()
            },
            QuickWin {
                kind: "subscription".into(),
                description: "Streaming Plus".into(),
                amount: Some(39.9),
                potential_monthly_savings: Some(39.9),
                suggestion: "Reconsider the Streaming Plus subscription (39.90/month)".into(),
                ..Default::default()
            },
            QuickWin {
                kind: "high_expense".into(),
                description: "Electronics store".into(),
                category: Some("Shopping".into()),
                amount: Some(1899.0),
                potential_saving: Some(serde_json::Value::String("variable".into())),
                suggestion: "Review large expense: Electronics store (1899.00)".into(),
                ..Default::default()
            },
        ],
    }
}

/// Build a cut plan from an analysis the way the finance backend does
///
/// Reproduces the backend's wire quirks on purpose: `estimated_savings` is
/// capped at the target and the plan may stop before every category is
/// listed, so the client has to reconcile what it receives.
pub fn simulate_cut_plan(analysis: &ExpenseAnalysis, target: f64) -> CutPlan {
    let monthly_expenses = analysis.total_monthly_expenses().unwrap_or(0.0);
    let mut suggestions = analysis.suggestions.clone();
    let potential: f64 = suggestions.iter().map(|s| s.savings).sum();

    if potential > 0.0 && potential < target {
        let factor = (target / potential).min(MAX_SCALE_UP);
        for s in &mut suggestions {
            s.suggested_cut = (s.suggested_cut * factor).min(MAX_CUT_PERCENT);
            s.savings = s.monthly_avg * s.suggested_cut / 100.0;
        }
    } else if potential > target {
        let factor = (target / potential).max(MIN_SCALE_DOWN);
        for s in &mut suggestions {
            s.suggested_cut = (s.suggested_cut * factor).max(MIN_CUT_PERCENT);
            s.savings = s.monthly_avg * s.suggested_cut / 100.0;
        }
    }

    suggestions.sort_by(|a, b| b.savings.total_cmp(&a.savings));
    let adjusted: f64 = suggestions.iter().map(|s| s.savings).sum();
    let achievable = adjusted >= target;

    let mut spending_plan = Vec::new();
    let mut running = 0.0;
    for s in &suggestions {
        spending_plan.push(PlanItem {
            category: s.category.clone(),
            current_spending: s.monthly_avg,
            suggested_cut_percent: s.suggested_cut,
            new_budget: s.monthly_avg * (1.0 - s.suggested_cut / 100.0),
            monthly_savings: s.savings,
            actions: s.suggestions.clone(),
        });
        running += s.savings;
        if running >= target && spending_plan.len() >= MIN_PLAN_CATEGORIES {
            break;
        }
    }

    let mut general_recommendations = vec![if achievable {
        format!(
            "A savings goal of {:.2} per month is achievable with the suggested cuts.",
            target
        )
    } else {
        format!(
            "A goal of {:.2} is challenging. We found potential savings of {:.2} per month.",
            target, adjusted
        )
    }];
    general_recommendations.extend(analysis.general_recommendations.iter().cloned());

    let estimated = adjusted.min(target);
    CutPlan {
        status: Some("success".into()),
        message: None,
        target_savings: target,
        achievable,
        estimated_savings: estimated,
        percent_of_expenses: if monthly_expenses > 0.0 {
            estimated / monthly_expenses * 100.0
        } else {
            0.0
        },
        general_recommendations,
        spending_plan,
    }
}
