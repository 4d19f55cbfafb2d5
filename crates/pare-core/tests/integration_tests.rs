//! Integration tests for pare-core
//!
//! These tests exercise the full analysis → target → plan workflow through
//! the public API.

use pare_core::{
    category_deltas, compute_default_target, project_chart_series, target_presets, Error,
    ExpenseService, MockExpenseService, Phase, Resolution, SavingsPlanner, ServiceClient, Stage,
    TargetPreset,
};

const TOLERANCE: f64 = 0.01;

#[tokio::test]
async fn test_full_planning_workflow() {
    let planner = SavingsPlanner::new(ServiceClient::mock(), 6);

    // Load analysis and read the default target
    let analysis = planner
        .load_analysis(6)
        .await
        .expect("analysis should load")
        .applied()
        .expect("first load is never superseded");
    assert_eq!(compute_default_target(&analysis), 600.0);
    assert_eq!(planner.snapshot().target.map(|t| t.amount()), Some(600.0));

    // Submit the default target
    let plan = planner
        .submit_target("600.00")
        .await
        .expect("plan request should succeed")
        .applied()
        .unwrap();

    let summed: f64 = plan.spending_plan.iter().map(|i| i.monthly_savings).sum();
    assert!((summed - plan.estimated_savings).abs() < TOLERANCE);
    assert_eq!(
        plan.achievable,
        plan.estimated_savings >= plan.target_savings - TOLERANCE
    );
    assert!(plan.achievable);
    assert!((plan.percent_of_expenses - 15.0).abs() < 0.1);

    for item in &plan.spending_plan {
        let expected = item.current_spending * (1.0 - item.suggested_cut_percent / 100.0);
        assert!((item.new_budget - expected).abs() < TOLERANCE);
        assert!((item.monthly_savings - (item.current_spending - item.new_budget)).abs() < TOLERANCE);
    }

    // Projections follow the plan
    let chart = project_chart_series(Some(&*plan));
    assert_eq!(chart.len(), plan.spending_plan.len());
    let deltas = category_deltas(&plan);
    assert!(deltas.iter().all(|d| d.delta <= 0.0));
}

#[tokio::test]
async fn test_new_plan_replaces_old_plan() {
    let planner = SavingsPlanner::new(ServiceClient::mock(), 6);
    planner.load_analysis(6).await.unwrap();

    planner.submit_target("50").await.unwrap();
    let small = planner.snapshot().plan.unwrap();
    assert_eq!(small.spending_plan.len(), 3);

    planner.submit_preset(TargetPreset::Ambitious).await.unwrap();
    let snap = planner.snapshot();
    let big = snap.plan.unwrap();
    assert_eq!(big.target_savings, 1200.0);
    assert_eq!(big.spending_plan.len(), 6);
    assert!(!big.achievable);
    assert_eq!(snap.phase, Phase::Ready(Stage::Plan));
}

#[tokio::test]
async fn test_invalid_targets_never_reach_backend() {
    let mock = MockExpenseService::new();
    let planner = SavingsPlanner::new(mock.clone(), 6);
    planner.load_analysis(6).await.unwrap();

    for input in ["-5", "abc", "0", "   ", "1e400"] {
        match planner.submit_target(input).await {
            Err(Error::InvalidInput(_)) => {}
            other => panic!("expected InvalidInput for {:?}, got {:?}", input, other),
        }
    }
    assert_eq!(mock.plan_calls(), 0);
}

#[tokio::test]
async fn test_presets_match_analysis() {
    let mock = MockExpenseService::new();
    let analysis = mock.expense_analysis(6).await.unwrap();
    let presets = target_presets(&analysis);
    assert_eq!(presets.len(), 4);
    assert_eq!(presets[0].preset, TargetPreset::Economical);
    assert_eq!(presets[0].target.amount(), 400.0);
    assert_eq!(presets[3].target.amount(), 1200.0);
}

#[tokio::test]
async fn test_error_then_manual_retry() {
    let mock = MockExpenseService::new();
    let planner = SavingsPlanner::new(mock.clone(), 6);

    mock.fail_with(Some("service unavailable"));
    let err = planner.load_analysis(6).await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(planner.snapshot().error_message(), Some("service unavailable"));

    mock.fail_with(None);
    let outcome = planner.retry().await.unwrap();
    assert!(matches!(
        outcome,
        pare_core::RetryOutcome::Analysis(Resolution::Applied(_))
    ));
    assert_eq!(planner.snapshot().phase, Phase::Ready(Stage::Analysis));
}
