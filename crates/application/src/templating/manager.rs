//! Render environment manager
//!
//! Owns the three per-mode environment slots. Each slot is a single-flight
//! cell: concurrent first callers await the same build instead of starting
//! their own. Invalidation swaps every slot for a fresh, empty cell.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tessera_domain::RenderMode;
use tokio::sync::OnceCell;

use super::environment::RenderEnvironment;
use crate::error::ApplicationResult;

type Slot = Arc<OnceCell<Arc<RenderEnvironment>>>;

/// Per-mode cache of compiled render environments.
#[derive(Debug, Default)]
pub struct EnvironmentManager {
    slots: RwLock<[Slot; 3]>,
    builds: AtomicUsize,
}

impl EnvironmentManager {
    /// Creates a manager with every slot uninitialized.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    const fn index(mode: RenderMode) -> usize {
        match mode {
            RenderMode::All => 0,
            RenderMode::Variables => 1,
            RenderMode::Tags => 2,
        }
    }

    fn slot(&self, mode: RenderMode) -> Slot {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&slots[Self::index(mode)])
    }

    /// Returns the environment for `mode`, building it on first use.
    ///
    /// A failed build leaves the slot uninitialized so the next call retries.
    ///
    /// # Errors
    /// Returns the error produced by `build`.
    pub async fn get_or_build<F, Fut>(
        &self,
        mode: RenderMode,
        build: F,
    ) -> ApplicationResult<Arc<RenderEnvironment>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApplicationResult<RenderEnvironment>>,
    {
        let slot = self.slot(mode);
        let environment = slot
            .get_or_try_init(move || async move {
                self.builds.fetch_add(1, Ordering::SeqCst);
                build().await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(environment))
    }

    /// Whether the slot for `mode` holds a built environment.
    #[must_use]
    pub fn is_ready(&self, mode: RenderMode) -> bool {
        self.slot(mode).initialized()
    }

    /// Resets every slot to uninitialized.
    ///
    /// Builds already in flight finish into the discarded cells.
    pub fn invalidate_all(&self) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        *slots = Default::default();
    }

    /// Number of builds started since creation.
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::ApplicationError;
    use crate::ports::PluginError;
    use crate::templating::environment::EnvironmentFactory;
    use std::time::Duration;
    use tessera_domain::TemplatingConfig;

    fn factory() -> EnvironmentFactory {
        EnvironmentFactory {
            config: TemplatingConfig::default(),
            plugins: None,
            default_filters: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_cached_after_first_build() {
        let manager = EnvironmentManager::new();
        let factory = factory();
        assert!(!manager.is_ready(RenderMode::All));

        let first = manager.get_or_build(RenderMode::All, || factory.build(RenderMode::All)).await.unwrap();
        let second = manager.get_or_build(RenderMode::All, || factory.build(RenderMode::All)).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.build_count(), 1);
        assert!(manager.is_ready(RenderMode::All));
        assert!(!manager.is_ready(RenderMode::Tags));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_build() {
        let manager = EnvironmentManager::new();
        let factory = factory();
        let slow_build = || async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            factory.build(RenderMode::Variables).await
        };

        let (a, b, c) = tokio::join!(
            manager.get_or_build(RenderMode::Variables, slow_build),
            manager.get_or_build(RenderMode::Variables, slow_build),
            manager.get_or_build(RenderMode::Variables, slow_build),
        );

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert!(c.is_ok());
        assert_eq!(manager.build_count(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_all_rebuilds_every_mode() {
        let manager = EnvironmentManager::new();
        let factory = factory();
        for mode in RenderMode::ALL_MODES {
            manager.get_or_build(mode, || factory.build(mode)).await.unwrap();
        }
        assert_eq!(manager.build_count(), 3);

        manager.invalidate_all();
        assert!(!manager.is_ready(RenderMode::All));

        manager.get_or_build(RenderMode::All, || factory.build(RenderMode::All)).await.unwrap();
        assert_eq!(manager.build_count(), 4);
    }

    #[tokio::test]
    async fn test_failed_build_is_retried() {
        let manager = EnvironmentManager::new();
        let failed = manager
            .get_or_build(RenderMode::Tags, || async {
                Err(ApplicationError::Plugin(PluginError::Unavailable("down".to_string())))
            })
            .await;
        assert!(failed.is_err());
        assert!(!manager.is_ready(RenderMode::Tags));

        let factory = factory();
        assert!(manager.get_or_build(RenderMode::Tags, || factory.build(RenderMode::Tags)).await.is_ok());
        assert_eq!(manager.build_count(), 2);
    }
}
