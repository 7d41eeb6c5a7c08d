use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Process wide defaults used when building reactions and checking balance
pub struct Configuration {
    /// Lower flux bound given to reversible reactions
    pub lower_bound: f64,
    /// Upper flux bound given to reactions
    pub upper_bound: f64,
    /// Absolute tolerance below which an imbalance is treated as zero
    pub tolerance: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
        }
    }
}

/// Read the default lower bound, falling back to the built in value if the lock is poisoned
pub(crate) fn default_lower_bound() -> f64 {
    CONFIGURATION
        .read()
        .map(|c| c.lower_bound)
        .unwrap_or_else(|_| Configuration::default().lower_bound)
}

/// Read the default upper bound, falling back to the built in value if the lock is poisoned
pub(crate) fn default_upper_bound() -> f64 {
    CONFIGURATION
        .read()
        .map(|c| c.upper_bound)
        .unwrap_or_else(|_| Configuration::default().upper_bound)
}

/// Read the balance tolerance, falling back to the built in value if the lock is poisoned
pub(crate) fn tolerance() -> f64 {
    CONFIGURATION
        .read()
        .map(|c| c.tolerance)
        .unwrap_or_else(|_| Configuration::default().tolerance)
}
