//! Serializer configuration.
//!
//! Defaults suit most callers; deployments can override them through
//! environment variables:
//!
//! - `LIST_CODEC_PARALLEL_THRESHOLD`: minimum node count before per-node work
//!   fans out to worker threads (default: 64)
//! - `LIST_CODEC_THREADS`: size of a dedicated worker pool (default: rayon's
//!   global pool)
//! - `LIST_CODEC_VERIFY_REFERENCES`: reject buffers that reference undefined
//!   nodes (default: true)

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Environment variable for [`SerializerConfig::parallel_threshold`].
pub const ENV_PARALLEL_THRESHOLD: &str = "LIST_CODEC_PARALLEL_THRESHOLD";
/// Environment variable for [`SerializerConfig::threads`].
pub const ENV_THREADS: &str = "LIST_CODEC_THREADS";
/// Environment variable for [`SerializerConfig::verify_references`].
pub const ENV_VERIFY_REFERENCES: &str = "LIST_CODEC_VERIFY_REFERENCES";

/// Tuning and validation knobs for [`ListSerializer`](crate::ListSerializer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializerConfig {
    /// Lists shorter than this are processed on the calling thread.
    pub parallel_threshold: usize,
    /// Worker count for a dedicated pool; `None` uses rayon's global pool.
    pub threads: Option<usize>,
    /// Reject inputs whose records reference nodes that are never defined.
    pub verify_references: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 64,
            threads: None,
            verify_references: true,
        }
    }
}

impl SerializerConfig {
    /// Defaults overridden by any `LIST_CODEC_*` variables that are set.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(threshold) = parse_var(&lookup, ENV_PARALLEL_THRESHOLD) {
            config.parallel_threshold = threshold;
        }
        if let Some(threads) = parse_var::<usize, _>(&lookup, ENV_THREADS) {
            config.threads = (threads > 0).then_some(threads);
        }
        if let Some(verify) = parse_var(&lookup, ENV_VERIFY_REFERENCES) {
            config.verify_references = verify;
        }
        config
    }

    /// Builder-style override of the parallel threshold.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Builder-style override of the dedicated pool size.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Builder-style override of reference verification.
    pub fn with_verify_references(mut self, verify: bool) -> Self {
        self.verify_references = verify;
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = key, value = %raw, "Ignoring unparseable configuration value");
            None
        }
    }
}
