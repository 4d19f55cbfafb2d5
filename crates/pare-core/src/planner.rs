//! Savings-plan projector
//!
//! `SavingsPlanner` owns the session state for one user: the analysis for the
//! selected period, the current savings target and the current cut plan.
//! Every transition publishes an immutable [`Snapshot`] on a watch channel.
//!
//! ```text
//! Idle -> Loading(Analysis) -> Ready(Analysis) -> Loading(Plan) -> Ready(Plan)
//!            |                                       |
//!            +----------------> Error <--------------+
//!                                 |
//!                                 +-- retry --> Loading(same request)
//! ```
//!
//! Requests of each kind carry a sequence number. A response is applied only
//! if its sequence number is still the latest issued when it resolves, so a
//! slow response can never overwrite the result of a newer submission.
//! Numbers are issued by the synchronous `begin_*` methods; callers that
//! spawn requests should call them before spawning and hand the ticket to
//! the matching `resolve_*` method.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{CutPlan, ExpenseAnalysis, QuickWins, SavingsTarget, TargetPreset};
use crate::projection::{
    compute_default_target, preset_target, project_chart_series, project_pie_series,
    reconcile_plan, ChartPoint, PieSlice,
};
use crate::service::ExpenseService;

/// A request the planner can issue (and re-issue on retry)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    Analysis { months: u32 },
    Plan { target: SavingsTarget },
}

/// What a `Ready` phase has just finished loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Analysis,
    Plan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Loading(Request),
    Ready(Stage),
    Error { request: Request, message: String },
}

impl Phase {
    pub fn is_loading(&self) -> bool {
        matches!(self, Phase::Loading(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loading(Request::Analysis { .. }) => "loading_analysis",
            Phase::Loading(Request::Plan { .. }) => "loading_plan",
            Phase::Ready(Stage::Analysis) => "analysis_ready",
            Phase::Ready(Stage::Plan) => "plan_ready",
            Phase::Error { .. } => "error",
        }
    }
}

/// Immutable view of the planner after a transition
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub phase: Phase,
    /// Analysis period in months
    pub months: u32,
    pub analysis: Option<Arc<ExpenseAnalysis>>,
    pub plan: Option<Arc<CutPlan>>,
    /// Last submitted target, or the default derived from the analysis
    pub target: Option<SavingsTarget>,
    /// Incremented on every transition
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl Snapshot {
    fn initial(months: u32) -> Self {
        Self {
            phase: Phase::Idle,
            months,
            analysis: None,
            plan: None,
            target: None,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// 15% of monthly expenses, or 0 without an analysis
    pub fn default_target(&self) -> f64 {
        self.analysis
            .as_deref()
            .map(compute_default_target)
            .unwrap_or(0.0)
    }

    pub fn chart_series(&self) -> Vec<ChartPoint> {
        project_chart_series(self.plan.as_deref())
    }

    pub fn pie_series(&self, limit: usize) -> Vec<PieSlice> {
        project_pie_series(self.analysis.as_deref(), limit)
    }
}

/// Outcome of a request that completed
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// The response was the latest of its kind and is now in the snapshot
    Applied(T),
    /// A newer request was issued meanwhile; the response was discarded
    Superseded,
}

impl<T> Resolution<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Resolution::Applied(v) => Some(v),
            Resolution::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Resolution::Superseded)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    /// The planner was not in the error state
    NothingToRetry,
    Analysis(Resolution<Arc<ExpenseAnalysis>>),
    Plan(Resolution<Arc<CutPlan>>),
}

/// An analysis request numbered at submission time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisTicket {
    seq: u64,
    months: u32,
}

impl AnalysisTicket {
    pub fn months(&self) -> u32 {
        self.months
    }
}

/// A plan request numbered at submission time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanTicket {
    seq: u64,
    target: SavingsTarget,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryTicket {
    Analysis(AnalysisTicket),
    Plan(PlanTicket),
}

/// Session state container for analyses and cut plans
pub struct SavingsPlanner<S> {
    service: S,
    state: watch::Sender<Snapshot>,
    cache: RwLock<HashMap<u32, Arc<ExpenseAnalysis>>>,
    analysis_seq: AtomicU64,
    plan_seq: AtomicU64,
}

impl<S: ExpenseService> SavingsPlanner<S> {
    /// Create an idle planner for the given analysis period
    pub fn new(service: S, months: u32) -> Self {
        Self {
            service,
            state: watch::Sender::new(Snapshot::initial(months)),
            cache: RwLock::new(HashMap::new()),
            analysis_seq: AtomicU64::new(0),
            plan_seq: AtomicU64::new(0),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    /// Receive a snapshot after every transition
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    /// Load the analysis for `months`, served from cache when already fetched
    pub async fn load_analysis(&self, months: u32) -> Result<Resolution<Arc<ExpenseAnalysis>>> {
        if let Some(cached) = self.cached(months) {
            debug!(months, "Using cached analysis");
            let seq = self.analysis_seq.fetch_add(1, Ordering::SeqCst) + 1;
            return Ok(self.apply_analysis(seq, months, cached));
        }
        let ticket = self.begin_analysis(months);
        self.fetch_analysis(ticket).await
    }

    /// Fetch the analysis for `months` again, replacing any cached copy
    pub async fn reload_analysis(&self, months: u32) -> Result<Resolution<Arc<ExpenseAnalysis>>> {
        let ticket = self.begin_analysis(months);
        self.fetch_analysis(ticket).await
    }

    /// Issue the sequence number for an analysis request and enter `Loading`
    ///
    /// Ordering between requests is fixed here, not when the ticket is
    /// resolved, so callers that spawn the resolution keep submission order.
    pub fn begin_analysis(&self, months: u32) -> AnalysisTicket {
        let seq = self.analysis_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, months, host = self.service.host(), "Requesting expense analysis");
        self.transition(|s| s.phase = Phase::Loading(Request::Analysis { months }));
        AnalysisTicket { seq, months }
    }

    /// Complete an analysis request, from cache when the period was fetched before
    pub async fn resolve_analysis(
        &self,
        ticket: AnalysisTicket,
    ) -> Result<Resolution<Arc<ExpenseAnalysis>>> {
        if let Some(cached) = self.cached(ticket.months) {
            debug!(months = ticket.months, "Using cached analysis");
            return Ok(self.apply_analysis(ticket.seq, ticket.months, cached));
        }
        self.fetch_analysis(ticket).await
    }

    /// Parse user input and request a plan for it
    ///
    /// Invalid input is rejected before any request is made and leaves the
    /// snapshot untouched.
    pub async fn submit_target(&self, input: &str) -> Result<Resolution<Arc<CutPlan>>> {
        let target: SavingsTarget = input.parse()?;
        self.request_plan(target).await
    }

    /// Request a plan for one of the percentage presets
    pub async fn submit_preset(&self, preset: TargetPreset) -> Result<Resolution<Arc<CutPlan>>> {
        let target = self.target_for_preset(preset)?;
        self.request_plan(target).await
    }

    /// Resolve a preset against the current analysis
    pub fn target_for_preset(&self, preset: TargetPreset) -> Result<SavingsTarget> {
        let snapshot = self.snapshot();
        let analysis = snapshot.analysis.as_deref().ok_or_else(|| {
            Error::InvalidInput("load an analysis before choosing a preset".into())
        })?;
        preset_target(analysis, preset).ok_or_else(|| {
            Error::InvalidInput("the analysis has no monthly expenses to base a preset on".into())
        })
    }

    /// Request a cut plan; the plan replaces the current one when it arrives
    pub async fn request_plan(&self, target: SavingsTarget) -> Result<Resolution<Arc<CutPlan>>> {
        let ticket = self.begin_plan(target);
        self.resolve_plan(ticket).await
    }

    /// Issue the sequence number for a plan request and enter `Loading`
    pub fn begin_plan(&self, target: SavingsTarget) -> PlanTicket {
        let seq = self.plan_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, target = target.amount(), host = self.service.host(), "Requesting cut plan");

        self.transition(|s| {
            s.phase = Phase::Loading(Request::Plan { target });
            s.target = Some(target);
        });
        PlanTicket { seq, target }
    }

    /// Send a plan request; a newer ticket issued meanwhile wins
    pub async fn resolve_plan(&self, ticket: PlanTicket) -> Result<Resolution<Arc<CutPlan>>> {
        let PlanTicket { seq, target } = ticket;

        match self.service.expense_cuts(target).await {
            Ok(plan) => {
                let mut applied = None;
                self.state.send_if_modified(|s| {
                    if !self.is_latest_plan(seq) {
                        return false;
                    }
                    let total = s.analysis.as_ref().and_then(|a| a.total_monthly_expenses());
                    let plan = Arc::new(reconcile_plan(plan, total));
                    s.plan = Some(plan.clone());
                    s.phase = Phase::Ready(Stage::Plan);
                    touch(s);
                    applied = Some(plan);
                    true
                });

                match applied {
                    Some(plan) => {
                        info!(
                            target = target.amount(),
                            estimated = plan.estimated_savings,
                            achievable = plan.achievable,
                            "Cut plan ready"
                        );
                        Ok(Resolution::Applied(plan))
                    }
                    None => {
                        debug!(seq, "Discarding stale cut plan");
                        Ok(Resolution::Superseded)
                    }
                }
            }
            Err(e) => {
                let request = Request::Plan { target };
                if self.fail(request, &e, |p| p.is_latest_plan(seq)) {
                    Err(e)
                } else {
                    debug!(seq, error = %e, "Discarding stale cut plan failure");
                    Ok(Resolution::Superseded)
                }
            }
        }
    }

    /// Re-issue the request that put the planner into the error state
    pub async fn retry(&self) -> Result<RetryOutcome> {
        match self.begin_retry() {
            None => Ok(RetryOutcome::NothingToRetry),
            Some(RetryTicket::Analysis(ticket)) => {
                Ok(RetryOutcome::Analysis(self.fetch_analysis(ticket).await?))
            }
            Some(RetryTicket::Plan(ticket)) => {
                Ok(RetryOutcome::Plan(self.resolve_plan(ticket).await?))
            }
        }
    }

    /// Issue a ticket for the failed request, or `None` outside the error state
    pub fn begin_retry(&self) -> Option<RetryTicket> {
        let request = match &self.state.borrow().phase {
            Phase::Error { request, .. } => *request,
            _ => return None,
        };

        info!(?request, "Retrying");
        Some(match request {
            Request::Analysis { months } => RetryTicket::Analysis(self.begin_analysis(months)),
            Request::Plan { target } => RetryTicket::Plan(self.begin_plan(target)),
        })
    }

    /// Quick wins are fetched on demand and are not part of the session state
    pub async fn quick_wins(&self) -> Result<QuickWins> {
        self.service.quick_wins().await
    }

    async fn fetch_analysis(
        &self,
        ticket: AnalysisTicket,
    ) -> Result<Resolution<Arc<ExpenseAnalysis>>> {
        let AnalysisTicket { seq, months } = ticket;

        match self.service.expense_analysis(months).await {
            Ok(analysis) => {
                let analysis = Arc::new(analysis);
                if let Ok(mut cache) = self.cache.write() {
                    cache.insert(months, analysis.clone());
                }
                Ok(self.apply_analysis(seq, months, analysis))
            }
            Err(e) => {
                let request = Request::Analysis { months };
                if self.fail(request, &e, |p| p.is_latest_analysis(seq)) {
                    Err(e)
                } else {
                    debug!(seq, error = %e, "Discarding stale analysis failure");
                    Ok(Resolution::Superseded)
                }
            }
        }
    }

    fn apply_analysis(
        &self,
        seq: u64,
        months: u32,
        analysis: Arc<ExpenseAnalysis>,
    ) -> Resolution<Arc<ExpenseAnalysis>> {
        let applied = self.state.send_if_modified(|s| {
            if !self.is_latest_analysis(seq) {
                return false;
            }
            if s.months != months {
                // Plan percentages are relative to the old period's expenses
                self.plan_seq.fetch_add(1, Ordering::SeqCst);
                s.plan = None;
            }
            s.months = months;
            s.target = SavingsTarget::new(compute_default_target(&analysis)).ok();
            s.analysis = Some(analysis.clone());
            s.phase = Phase::Ready(Stage::Analysis);
            touch(s);
            true
        });

        if applied {
            if analysis.has_insufficient_data() {
                warn!(months, "Backend has insufficient data for an analysis");
            }
            Resolution::Applied(analysis)
        } else {
            debug!(seq, months, "Discarding stale analysis");
            Resolution::Superseded
        }
    }

    /// Move to the error state if `is_current` still holds; prior data stays
    fn fail<F>(&self, request: Request, error: &Error, is_current: F) -> bool
    where
        F: Fn(&Self) -> bool,
    {
        self.state.send_if_modified(|s| {
            if !is_current(self) {
                return false;
            }
            warn!(?request, error = %error, "Request failed");
            s.phase = Phase::Error {
                request,
                message: error.user_message(),
            };
            touch(s);
            true
        })
    }

    fn transition<F: FnOnce(&mut Snapshot)>(&self, f: F) {
        self.state.send_modify(|s| {
            f(s);
            touch(s);
        });
    }

    fn cached(&self, months: u32) -> Option<Arc<ExpenseAnalysis>> {
        self.cache
            .read()
            .ok()
            .and_then(|cache| cache.get(&months).cloned())
    }

    fn is_latest_plan(&self, seq: u64) -> bool {
        self.plan_seq.load(Ordering::SeqCst) == seq
    }

    fn is_latest_analysis(&self, seq: u64) -> bool {
        self.analysis_seq.load(Ordering::SeqCst) == seq
    }
}

fn touch(s: &mut Snapshot) {
    s.version += 1;
    s.updated_at = Utc::now();
}
