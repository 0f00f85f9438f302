// src/core/run_once.rs

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::core::error::DiscoverError;

/// Admits exactly one execution for the lifetime of the guard.
///
/// The state is a single `OnceCell` holding the time of the admitted run:
/// empty means not run yet. `OnceCell::set` is atomic, so of any number of
/// concurrent callers exactly one is admitted.
#[derive(Debug, Default)]
pub struct RunOnceGuard {
    ran_at: OnceCell<DateTime<Utc>>,
}

impl RunOnceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&self) -> Result<(), DiscoverError> {
        match self.ran_at.set(Utc::now()) {
            Ok(()) => Ok(()),
            Err(_) => {
                debug!(ran_at = ?self.ran_at.get(), "Run-once guard rejected a repeated call.");
                Err(DiscoverError::AlreadyRan)
            }
        }
    }

    pub fn ran_at(&self) -> Option<DateTime<Utc>> {
        self.ran_at.get().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn first_call_admitted_then_rejected() {
        let guard = RunOnceGuard::new();
        assert!(guard.ran_at().is_none());
        assert!(guard.admit().is_ok());
        assert!(guard.ran_at().is_some());

        for _ in 0..5 {
            let err = guard.admit().unwrap_err();
            assert!(err.is_run_once());
        }
    }

    #[test]
    fn fresh_guards_are_independent() {
        let a = RunOnceGuard::new();
        let b = RunOnceGuard::new();
        assert!(a.admit().is_ok());
        assert!(b.admit().is_ok());
    }

    #[test]
    fn concurrent_callers_admit_once() {
        let guard = Arc::new(RunOnceGuard::new());
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    if guard.admit().is_ok() {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(admitted.load(Ordering::SeqCst), 1);
    }
}
