//! Scatter/gather over per-node work.
//!
//! Every top-level operation fans out one unit of work per node and waits
//! for all of them before assembling the result. Results are gathered by
//! input position, never by completion order, and the first failure aborts
//! the whole batch.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::sync::Arc;

use crate::config::SerializerConfig;

/// Runs per-node closures sequentially or on a rayon pool.
#[derive(Debug, Clone)]
pub struct Executor {
    pool: Option<Arc<ThreadPool>>,
    parallel_threshold: usize,
}

impl Default for Executor {
    fn default() -> Self {
        Self::global(SerializerConfig::default().parallel_threshold)
    }
}

impl Executor {
    /// Executor on rayon's global pool.
    pub fn global(parallel_threshold: usize) -> Self {
        Self {
            pool: None,
            parallel_threshold,
        }
    }

    /// Executor for `config`, building a dedicated pool if it asks for one.
    pub fn from_config(config: &SerializerConfig) -> Result<Self, ThreadPoolBuildError> {
        let pool = match config.threads {
            Some(threads) => Some(Arc::new(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("list-codec-{i}"))
                    .build()?,
            )),
            None => None,
        };
        Ok(Self {
            pool,
            parallel_threshold: config.parallel_threshold,
        })
    }

    /// Apply `f` to every item and collect the results in input order.
    pub fn run<T, R, E, F>(&self, items: Vec<T>, f: F) -> Result<Vec<R>, E>
    where
        T: Send,
        R: Send,
        E: Send,
        F: Fn(T) -> Result<R, E> + Sync + Send,
    {
        if items.len() < self.parallel_threshold {
            return items.into_iter().map(f).collect();
        }

        let fan_out = || items.into_par_iter().map(&f).collect::<Result<Vec<R>, E>>();
        match &self.pool {
            Some(pool) => pool.install(fan_out),
            None => fan_out(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_preserved_in_parallel() {
        let executor = Executor::global(0);
        let out: Result<Vec<usize>, ()> = executor.run((0..1000).collect(), |i| Ok(i * 2));
        assert_eq!(out.unwrap(), (0..1000).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_first_error_aborts() {
        let executor = Executor::global(0);
        let out: Result<Vec<usize>, String> = executor.run((0..100).collect(), |i| {
            if i == 42 {
                Err(format!("failed at {i}"))
            } else {
                Ok(i)
            }
        });
        assert_eq!(out.unwrap_err(), "failed at 42");
    }

    #[test]
    fn test_dedicated_pool() {
        let config = SerializerConfig::default()
            .with_threads(2)
            .with_parallel_threshold(1);
        let executor = Executor::from_config(&config).unwrap();
        let out: Result<Vec<String>, ()> =
            executor.run(vec!["a", "b", "c"], |s| Ok(s.to_uppercase()));
        assert_eq!(out.unwrap(), vec!["A", "B", "C"]);
    }
}
