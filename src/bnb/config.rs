//! Branch-and-bound configuration.

use crate::dispatching::DispatchRuleKind;
use crate::error::ConfigError;

/// Deepest branching level that may be enumerated up front for parallel
/// subtree search. `2^16` subtrees is far beyond any useful split.
pub const MAX_SPLIT_DEPTH: usize = 16;

/// Configuration parameters for the branch-and-bound search.
///
/// # Examples
///
/// ```
/// use u_jobshop::bnb::BnbConfig;
///
/// let config = BnbConfig::default()
///     .with_time_limit_ms(500)
///     .with_warm_start(false);
/// assert_eq!(config.time_limit_ms, Some(500));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct BnbConfig {
    /// Wall-clock budget in milliseconds (`None` = search to completion).
    pub time_limit_ms: Option<u64>,

    /// Seed the incumbent with a dispatching schedule before searching.
    pub warm_start: bool,

    /// Rules tried by the warm start; each one is the primary rule once.
    pub dispatch_rules: Vec<DispatchRuleKind>,

    /// Solve subtrees on the rayon thread pool.
    ///
    /// Has no effect unless the crate is built with the `parallel` feature.
    pub parallel: bool,

    /// Branching levels enumerated before subtrees are handed to workers.
    pub split_depth: usize,

    /// Nodes between two polls of the deadline and the cancel flag.
    pub node_check_interval: u64,

    /// Interval of progress lines at `debug` level (`None` = off).
    pub log_interval_ms: Option<u64>,
}

impl Default for BnbConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: None,
            warm_start: true,
            dispatch_rules: vec![
                DispatchRuleKind::MostWorkRemaining,
                DispatchRuleKind::ShortestProcessingTime,
            ],
            parallel: false,
            split_depth: 4,
            node_check_interval: 1,
            log_interval_ms: None,
        }
    }
}

impl BnbConfig {
    /// Sets the wall-clock budget.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Enables or disables the dispatching warm start.
    pub fn with_warm_start(mut self, enabled: bool) -> Self {
        self.warm_start = enabled;
        self
    }

    /// Replaces the warm-start rule set.
    pub fn with_dispatch_rules(mut self, rules: Vec<DispatchRuleKind>) -> Self {
        self.dispatch_rules = rules;
        self
    }

    /// Enables or disables parallel subtree search.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_split_depth(mut self, depth: usize) -> Self {
        self.split_depth = depth;
        self
    }

    pub fn with_node_check_interval(mut self, nodes: u64) -> Self {
        self.node_check_interval = nodes;
        self
    }

    pub fn with_log_interval_ms(mut self, ms: u64) -> Self {
        self.log_interval_ms = Some(ms);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_check_interval == 0 {
            return Err(ConfigError::ZeroCheckInterval);
        }
        if self.split_depth > MAX_SPLIT_DEPTH {
            return Err(ConfigError::SplitDepthTooLarge {
                depth: self.split_depth,
                max: MAX_SPLIT_DEPTH,
            });
        }
        if self.warm_start && self.dispatch_rules.is_empty() {
            return Err(ConfigError::NoDispatchRules);
        }
        Ok(())
    }
}
