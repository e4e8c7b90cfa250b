//! Dispatch notify relay client

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use fuelops_core::ports::{DispatchMessage, IDispatchNotifier};

use crate::client::BackendClient;

/// Posts [`DispatchMessage`]s as JSON to the configured relay URL
pub struct HttpDispatchNotifier {
    client: Arc<BackendClient>,
    url: String,
}

impl HttpDispatchNotifier {
    pub fn new(client: Arc<BackendClient>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl IDispatchNotifier for HttpDispatchNotifier {
    async fn notify(&self, message: &DispatchMessage) -> Result<()> {
        let request = self.client.request_url(Method::POST, &self.url).json(message);
        self.client
            .execute_with_retry(request)
            .await
            .with_context(|| format!("Dispatch relay rejected message for task {}", message.task_id))?;
        debug!(task_id = %message.task_id, "Dispatch notified");
        Ok(())
    }
}
