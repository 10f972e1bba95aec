use anyhow::Result;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::workflow::DispatchEngine;

/// Graceful shutdown coordinator for the dispatch engine
pub struct ShutdownCoordinator {
    grace_period: Duration,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            grace_period: Duration::from_secs(10),
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Close the engine's store, giving up after the grace period
    pub async fn shutdown(&self, engine: &DispatchEngine) -> Result<()> {
        info!("Initiating graceful shutdown of the dispatch engine...");

        match timeout(self.grace_period, engine.shutdown()).await {
            Ok(Ok(())) => {
                info!("Graceful shutdown completed successfully");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("Asset store did not close cleanly: {}", e);
                Err(e.into())
            }
            Err(_) => {
                warn!(
                    grace_ms = self.grace_period.as_millis() as u64,
                    "Timeout waiting for asset store to close"
                );
                Err(anyhow::anyhow!("Timeout waiting for asset store to close"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAssetStore;
    use crate::workflow::EngineConfig;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_shutdown_closes_store() {
        let engine =
            DispatchEngine::new(Arc::new(MemoryAssetStore::new()), EngineConfig::default());
        ShutdownCoordinator::new()
            .with_grace_period(Duration::from_secs(1))
            .shutdown(&engine)
            .await
            .unwrap();
        assert!(engine.create_asset("Jack", "J-1").await.is_err());
    }
}
