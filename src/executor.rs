//! Execution strategy for batch work.
//!
//! Proximity chunks and tiles are independent work items, so the engines
//! stay agnostic about how they run: callers pick an [`Executor`] and the
//! same code path serves single-threaded runs and the rayon pool. The
//! default is sequential; parallel runs produce identical results because
//! both arms preserve input order.

use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag checked at chunk and tile boundaries.
///
/// Cancelling never interrupts an individual geometric operation. Engines
/// observe the flag between work items and bail out with
/// [`crate::EngineError::Cancelled`]. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; honored at the next chunk or tile boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// How batch work is dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Executor {
    /// Process items on the calling thread, in order.
    #[default]
    Sequential,
    /// Fan items out across the rayon worker pool.
    Parallel,
}

impl Executor {
    /// Map `op` over `items`, failing on the first error.
    ///
    /// Output order matches input order in both modes.
    pub fn map<T, R, E, F>(&self, items: Vec<T>, op: F) -> Result<Vec<R>, E>
    where
        T: Send,
        R: Send,
        E: Send,
        F: Fn(T) -> Result<R, E> + Send + Sync,
    {
        match self {
            Executor::Sequential => items.into_iter().map(op).collect(),
            Executor::Parallel => items.into_par_iter().map(op).collect(),
        }
    }

    /// Map `op` over `items`, keeping every per-item outcome.
    ///
    /// Unlike [`Executor::map`] this never short-circuits; callers decide
    /// what to do with individual failures.
    pub fn map_outcomes<T, R, E, F>(&self, items: Vec<T>, op: F) -> Vec<Result<R, E>>
    where
        T: Send,
        R: Send,
        E: Send,
        F: Fn(T) -> Result<R, E> + Send + Sync,
    {
        match self {
            Executor::Sequential => items.into_iter().map(op).collect(),
            Executor::Parallel => items.into_par_iter().map(op).collect(),
        }
    }

    /// Items a streaming caller should keep in flight per dispatch round.
    ///
    /// Sequential work needs no lookahead. Parallel rounds hold a few items
    /// per worker, enough to keep the pool busy while bounding how much of a
    /// lazy source gets materialized at once.
    pub fn batch_size(&self) -> usize {
        match self {
            Executor::Sequential => 1,
            Executor::Parallel => rayon::current_num_threads().max(1) * 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_map_preserves_order() {
        let result: Result<Vec<i32>, ()> =
            Executor::Sequential.map(vec![1, 2, 3], |x| Ok(x * 10));
        assert_eq!(result.unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn test_parallel_map_preserves_order() {
        let items: Vec<i64> = (0..1000).collect();
        let result: Result<Vec<i64>, ()> = Executor::Parallel.map(items, |x| Ok(x * 2));
        let doubled = result.unwrap();
        assert_eq!(doubled.len(), 1000);
        assert!(doubled.iter().enumerate().all(|(i, v)| *v == 2 * i as i64));
    }

    #[test]
    fn test_map_fails_on_first_error() {
        let result: Result<Vec<i32>, String> = Executor::Sequential.map(vec![1, 2, 3], |x| {
            if x == 2 { Err("boom".to_string()) } else { Ok(x) }
        });
        assert_eq!(result.unwrap_err(), "boom");
    }

    #[test]
    fn test_map_outcomes_keeps_failures() {
        for executor in [Executor::Sequential, Executor::Parallel] {
            let outcomes: Vec<Result<i32, String>> =
                executor.map_outcomes(vec![1, 2, 3], |x| {
                    if x == 2 { Err("boom".to_string()) } else { Ok(x) }
                });
            assert_eq!(outcomes.len(), 3);
            assert_eq!(outcomes[0], Ok(1));
            assert_eq!(outcomes[1], Err("boom".to_string()));
            assert_eq!(outcomes[2], Ok(3));
        }
    }

    #[test]
    fn test_cancel_token_shared_across_clones() {
        let token = CancelToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_default_executor_is_sequential() {
        assert_eq!(Executor::default(), Executor::Sequential);
    }

    #[test]
    fn test_batch_sizes() {
        assert_eq!(Executor::Sequential.batch_size(), 1);
        assert!(Executor::Parallel.batch_size() >= 4);
    }
}
