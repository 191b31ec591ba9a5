//! # View Scope
//!
//! Liveness token for a mounted screen. Fetches started on behalf of a
//! screen run through [`ViewScope::run`]; once the screen unmounts their
//! results are discarded instead of being applied to state that no longer
//! exists.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable handle shared by a screen and the tasks it spawns.
#[derive(Clone, Debug)]
pub struct ViewScope {
    mounted: Arc<watch::Sender<bool>>,
}

impl ViewScope {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self {
            mounted: Arc::new(tx),
        }
    }

    pub fn is_mounted(&self) -> bool {
        *self.mounted.borrow()
    }

    /// Marks the screen as gone. Idempotent.
    pub fn unmount(&self) {
        self.mounted.send_replace(false);
    }

    /// Drives `fut` while the scope is mounted.
    ///
    /// Returns `None` if the scope was already unmounted, or unmounts
    /// before `fut` completes; the future is dropped at that point.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut rx = self.mounted.subscribe();
        tokio::select! {
            biased;
            _ = rx.wait_for(|mounted| !*mounted) => None,
            value = fut => Some(value),
        }
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    #[tokio::test]
    async fn test_mounted_scope_yields_result() {
        let scope = ViewScope::new();
        assert_eq!(scope.run(async { 7 }).await, Some(7));
    }

    #[tokio::test]
    async fn test_unmounted_scope_discards_ready_result() {
        let scope = ViewScope::new();
        scope.unmount();
        assert!(!scope.is_mounted());
        assert_eq!(scope.run(async { "profile" }).await, None);
    }

    #[test]
    fn test_unmount_while_in_flight_discards_result() {
        let scope = ViewScope::new();
        let (tx, rx) = oneshot::channel::<u32>();

        let mut fetch = task::spawn(scope.run(rx));
        assert_pending!(fetch.poll());

        scope.unmount();
        assert!(fetch.is_woken());
        assert_ready_eq!(fetch.poll(), None);

        // The fetch future was dropped with the scope's select.
        assert!(tx.send(1).is_err());
    }

    #[tokio::test]
    async fn test_clones_share_liveness() {
        let scope = ViewScope::new();
        let worker = scope.clone();
        scope.unmount();
        assert!(!worker.is_mounted());
        assert_eq!(worker.run(async {}).await, None);
    }
}
