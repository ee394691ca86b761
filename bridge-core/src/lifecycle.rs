//! Application lifecycle abstraction.
//!
//! This module provides a [`Lifecycle`] trait for controlling application
//! lifecycle operations like restart and shutdown. Different implementations
//! handle these operations appropriately for their environment (standalone
//! server vs an embedding host).

/// Trait for application lifecycle operations.
///
/// Services that need to trigger application-level actions (like restarting
/// after a configuration change) use this trait rather than directly calling
/// platform-specific APIs.
///
/// # Example
///
/// ```ignore
/// struct ConfigService {
///     lifecycle: Arc<dyn Lifecycle>,
/// }
///
/// impl ConfigService {
///     fn apply_config_requiring_restart(&self, config: Config) {
///         // Save config...
///         self.lifecycle.request_restart();
///     }
/// }
/// ```
pub trait Lifecycle: Send + Sync {
    /// Requests an application restart.
    ///
    /// The implementation determines how the restart is performed:
    /// - Tauri app: Uses Tauri's restart API
    /// - Standalone server: May log and exit (requiring orchestrator restart)
    fn request_restart(&self);

    /// Requests a graceful shutdown.
    ///
    /// The application should clean up resources and exit cleanly.
    fn request_shutdown(&self);
}

/// Server lifecycle implementation for standalone deployment.
///
/// For the standalone server, restart is not directly supported (the server
/// logs and expects an external orchestrator to handle restart). Shutdown
/// triggers a clean process exit.
pub struct ServerLifecycle;

impl Lifecycle for ServerLifecycle {
    fn request_restart(&self) {
        tracing::info!("Restart requested - server requires manual restart or orchestrator");
        // In a containerized environment, exiting with a specific code
        // could signal the orchestrator to restart. For now, just log.
    }

    fn request_shutdown(&self) {
        tracing::info!("Shutdown requested");
        std::process::exit(0);
    }
}

/// No-op lifecycle for testing or embedded use.
///
/// Does nothing on restart/shutdown requests. Useful in tests or when
/// embedding the core library in an application that manages its own lifecycle.
pub struct NoopLifecycle;

impl Lifecycle for NoopLifecycle {
    fn request_restart(&self) {
        tracing::debug!("Restart requested (no-op)");
    }

    fn request_shutdown(&self) {
        tracing::debug!("Shutdown requested (no-op)");
    }
}

use parking_lot::Mutex;

/// Single-owner process-wide lock.
///
/// Guards start/stop/reload transitions so only one caller drives the
/// pipeline at a time. `unlock` with the wrong owner is a no-op and returns
/// `false`; `force_unlock` is for administrative recovery only.
pub struct Lock {
    state: Mutex<Option<LockState>>,
}

struct LockState {
    owner: String,
    acquired_at_ms: u64,
}

impl Default for Lock {
    fn default() -> Self {
        Self::new()
    }
}

impl Lock {
    /// Creates a new, unlocked lock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    /// Attempts to acquire the lock for `owner`. Returns `true` if this call
    /// acquired it, `false` if another owner already holds it, and `true`
    /// if `owner` already held it (re-entrant for the current owner).
    pub fn lock(&self, owner: &str) -> bool {
        let mut guard = self.state.lock();
        match guard.as_ref() {
            Some(existing) if existing.owner == owner => true,
            Some(_) => false,
            None => {
                *guard = Some(LockState {
                    owner: owner.to_string(),
                    acquired_at_ms: crate::utils::now_millis(),
                });
                true
            }
        }
    }

    /// Releases the lock if `owner` matches the current holder.
    ///
    /// Returns `false` (a no-op) if `owner` does not match, including when
    /// the lock is already free.
    pub fn unlock(&self, owner: &str) -> bool {
        let mut guard = self.state.lock();
        match guard.as_ref() {
            Some(existing) if existing.owner == owner => {
                *guard = None;
                true
            }
            _ => false,
        }
    }

    /// Releases the lock regardless of the current owner. Administrative use only.
    pub fn force_unlock(&self) {
        *self.state.lock() = None;
    }

    /// Returns `true` if the lock is currently held by anyone.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Returns `true` if the lock is currently held by `owner`.
    #[must_use]
    pub fn is_locked_by(&self, owner: &str) -> bool {
        self.state
            .lock()
            .as_ref()
            .is_some_and(|s| s.owner == owner)
    }

    /// Returns the current owner and acquisition timestamp, if locked.
    #[must_use]
    pub fn owner(&self) -> Option<(String, u64)> {
        self.state
            .lock()
            .as_ref()
            .map(|s| (s.owner.clone(), s.acquired_at_ms))
    }
}

#[cfg(test)]
mod lock_tests {
    use super::*;

    #[test]
    fn second_owner_is_rejected() {
        let lock = Lock::new();
        assert!(lock.lock("engine"));
        assert!(!lock.lock("other"));
        assert!(lock.is_locked_by("engine"));
    }

    #[test]
    fn unlock_wrong_owner_is_noop() {
        let lock = Lock::new();
        assert!(lock.lock("engine"));
        assert!(!lock.unlock("other"));
        assert!(lock.is_locked());
    }

    #[test]
    fn unlock_matching_owner_releases() {
        let lock = Lock::new();
        lock.lock("engine");
        assert!(lock.unlock("engine"));
        assert!(!lock.is_locked());
    }

    #[test]
    fn force_unlock_always_releases() {
        let lock = Lock::new();
        lock.lock("engine");
        lock.force_unlock();
        assert!(!lock.is_locked());
    }

    #[test]
    fn reentrant_lock_by_same_owner() {
        let lock = Lock::new();
        assert!(lock.lock("engine"));
        assert!(lock.lock("engine"));
    }
}
