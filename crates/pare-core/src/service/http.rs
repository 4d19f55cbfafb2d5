//! REST backend implementation
//!
//! HTTP client for the finance backend's analysis endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::normalize_base_url;
use crate::error::{Error, Result};
use crate::models::{CutPlan, ExpenseAnalysis, QuickWins, SavingsTarget};

use super::ExpenseService;

/// Client for the finance backend REST API
#[derive(Clone)]
pub struct HttpExpenseService {
    http_client: Client,
    base_url: String,
}

impl HttpExpenseService {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:5000/api`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: normalize_base_url(base_url),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, ?query, "GET");

        let response = self.http_client.get(&url).query(query).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

/// Error body the backend sends with non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Turn a non-2xx response into `Error::Api`, preferring the body's message
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    debug!(status = status.as_u16(), message = %message, "Backend returned error");
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ExpenseService for HttpExpenseService {
    async fn expense_analysis(&self, months: u32) -> Result<ExpenseAnalysis> {
        self.get_json("/expense-analysis", &[("months", months.to_string())])
            .await
    }

    async fn expense_cuts(&self, target: SavingsTarget) -> Result<CutPlan> {
        let plan: CutPlan = self
            .get_json("/expense-cuts", &[("target", target.amount().to_string())])
            .await?;

        if plan.has_insufficient_data() {
            return Err(Error::InsufficientData(plan.message.unwrap_or_else(|| {
                "Not enough transactions to build a plan".to_string()
            })));
        }
        Ok(plan)
    }

    async fn quick_wins(&self) -> Result<QuickWins> {
        self.get_json("/quick-wins", &[]).await
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
