//! Pare Core Library
//!
//! Client-side savings planning against a personal finance backend:
//! - Wire models for expense analyses, cut plans and quick wins
//! - Pure projections (default targets, presets, chart and pie series)
//! - Pluggable expense service (REST backend or mock)
//! - Savings planner state machine with last-request-wins ordering
//! - Layered configuration

pub mod config;
pub mod error;
pub mod models;
pub mod planner;
pub mod projection;
pub mod service;

/// Test utilities including mock finance server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{BackendKind, Config};
pub use error::{Error, Result};
pub use models::{
    AnalysisSummary, CategorySuggestion, CutPlan, ExpenseAnalysis, PlanItem, QuickWin, QuickWins,
    SavingsTarget, TargetPreset,
};
pub use planner::{
    AnalysisTicket, Phase, PlanTicket, Request, Resolution, RetryOutcome, RetryTicket,
    SavingsPlanner, Snapshot, Stage,
};
pub use projection::{
    category_deltas, compute_default_target, project_chart_series, project_pie_series,
    reconcile_plan, target_presets, CategoryDelta, ChartPoint, PieSlice, PresetTarget,
};
pub use service::{ExpenseService, HttpExpenseService, MockExpenseService, ServiceClient};
