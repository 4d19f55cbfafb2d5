//! Finance backend abstraction
//!
//! The planner never talks HTTP directly; it goes through `ExpenseService`.
//!
//! # Architecture
//!
//! - `ExpenseService` trait: the recommendation endpoints the client consumes
//! - `ServiceClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Implementations: `HttpExpenseService` (REST backend), `MockExpenseService`
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = Config::load(None)?;
//! let service = ServiceClient::from_config(&config)?;
//! let analysis = service.expense_analysis(6).await?;
//! ```

mod http;
mod mock;

pub use http::HttpExpenseService;
pub use mock::{sample_analysis, simulate_cut_plan, MockExpenseService};

use async_trait::async_trait;

use crate::config::{BackendKind, Config};
use crate::error::Result;
use crate::models::{CutPlan, ExpenseAnalysis, QuickWins, SavingsTarget};

/// The recommendation endpoints of the finance backend
///
/// Implementations should be Send + Sync so a planner can be shared across tasks.
#[async_trait]
pub trait ExpenseService: Send + Sync {
    /// Per-category analysis over the last `months` months
    async fn expense_analysis(&self, months: u32) -> Result<ExpenseAnalysis>;

    /// Cut plan that realizes `target` as category budget cuts
    ///
    /// Only accepts a validated target, so non-positive or non-numeric input
    /// can never reach the backend.
    async fn expense_cuts(&self, target: SavingsTarget) -> Result<CutPlan>;

    /// Small immediately actionable savings
    async fn quick_wins(&self) -> Result<QuickWins>;

    /// Where requests go (for logging)
    fn host(&self) -> &str;
}

/// Concrete service client enum
#[derive(Clone)]
pub enum ServiceClient {
    Http(HttpExpenseService),
    Mock(MockExpenseService),
}

impl ServiceClient {
    /// Build the client the configuration asks for
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.backend {
            BackendKind::Http => Ok(ServiceClient::Http(HttpExpenseService::new(
                &config.base_url,
                config.timeout,
            )?)),
            BackendKind::Mock => Ok(ServiceClient::Mock(MockExpenseService::new())),
        }
    }

    pub fn mock() -> Self {
        ServiceClient::Mock(MockExpenseService::new())
    }
}

#[async_trait]
impl ExpenseService for ServiceClient {
    async fn expense_analysis(&self, months: u32) -> Result<ExpenseAnalysis> {
        match self {
            ServiceClient::Http(s) => s.expense_analysis(months).await,
            ServiceClient::Mock(s) => s.expense_analysis(months).await,
        }
    }

    async fn expense_cuts(&self, target: SavingsTarget) -> Result<CutPlan> {
        match self {
            ServiceClient::Http(s) => s.expense_cuts(target).await,
            ServiceClient::Mock(s) => s.expense_cuts(target).await,
        }
    }

    async fn quick_wins(&self) -> Result<QuickWins> {
        match self {
            ServiceClient::Http(s) => s.quick_wins().await,
            ServiceClient::Mock(s) => s.quick_wins().await,
        }
    }

    fn host(&self) -> &str {
        match self {
            ServiceClient::Http(s) => s.host(),
            ServiceClient::Mock(s) => s.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_picks_backend() {
        let config = Config {
            backend: BackendKind::Mock,
            ..Default::default()
        };
        let client = ServiceClient::from_config(&config).unwrap();
        assert!(matches!(client, ServiceClient::Mock(_)));
        assert_eq!(client.host(), "mock");

        let config = Config {
            base_url: "http://finance.local/api".into(),
            ..Default::default()
        };
        let client = ServiceClient::from_config(&config).unwrap();
        assert!(matches!(client, ServiceClient::Http(_)));
        assert_eq!(client.host(), "http://finance.local/api");
    }
}
