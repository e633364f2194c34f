use crate::error::ActionResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Hook invoked when an action reports [`FailureCode::Unauthorized`](crate::FailureCode::Unauthorized).
#[async_trait]
pub trait Reauthorize: Send + Sync {
    async fn reauthorize(&self) -> ActionResult<()>;
}

/// Collapses concurrent reauthorization requests into one.
///
/// Every completed reauthorization bumps a generation counter. An action
/// notes the generation before each attempt; if the counter has moved by the
/// time it asks to reauthorize, someone else already refreshed the
/// credentials after its attempt began and the request is skipped. Requests
/// arriving while a refresh is running queue on the lock and are skipped the
/// same way once it finishes.
pub struct ReauthGate {
    hook: Arc<dyn Reauthorize>,
    generation: AtomicU64,
    lock: Mutex<()>,
}

impl ReauthGate {
    pub fn new(hook: Arc<dyn Reauthorize>) -> Self {
        Self {
            hook,
            generation: AtomicU64::new(0),
            lock: Mutex::new(()),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub async fn reauthorize(&self, observed: u64) {
        let _guard = self.lock.lock().await;
        if self.generation() != observed {
            debug!("credentials already refreshed");
            return;
        }
        match self.hook.reauthorize().await {
            Ok(()) => info!("reauthorized"),
            Err(err) => warn!(error = ?err, "reauthorization failed"),
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct Counting(AtomicUsize);

    #[async_trait]
    impl Reauthorize for Counting {
        async fn reauthorize(&self) -> ActionResult<()> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_share_one_refresh() {
        let hook = Arc::new(Counting(AtomicUsize::new(0)));
        let gate = ReauthGate::new(hook.clone());
        let observed = gate.generation();
        futures::future::join_all((0..5).map(|_| gate.reauthorize(observed))).await;
        assert_eq!(hook.0.load(Ordering::SeqCst), 1);
        assert_eq!(gate.generation(), 1);

        // A later failure observed the new generation and refreshes again.
        gate.reauthorize(gate.generation()).await;
        assert_eq!(hook.0.load(Ordering::SeqCst), 2);
    }
}
