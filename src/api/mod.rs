//! HTTP surface for uploading jobs, running summaries and downloading results

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::pipeline::SummaryPipeline;
use crate::storage::JobStorage;

pub mod handlers;
pub mod models;
pub mod server;

pub use server::AppState;

/// API server wrapping a shared [`SummaryPipeline`]
pub struct ApiServer {
    state: AppState,
    port: u16,
}

impl ApiServer {
    pub fn new(pipeline: Arc<SummaryPipeline>, config: Arc<Config>, port: u16) -> Self {
        let storage = Arc::new(JobStorage::from_config(&config.storage));
        Self {
            state: AppState {
                pipeline,
                storage,
                config,
            },
            port,
        }
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        info!("🚀 Starting API server on port {}", self.port);
        server::start_http_server(self.state, self.port).await
    }
}
