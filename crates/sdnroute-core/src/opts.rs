//! This module defines the [`ControllerOpts`] configuration which fills in link parameters
//! that a command leaves out.

use crate::constants::{DEFAULT_CAPACITY, DEFAULT_WEIGHT};
use crate::units::{Volume, Weight};

/// Controller options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, typed_builder::TypedBuilder, serde::Deserialize)]
pub struct ControllerOpts {
    /// Weight of links added without one.
    #[builder(default = DEFAULT_WEIGHT)]
    #[serde(default = "default_weight")]
    pub default_weight: Weight,
    /// Capacity of links added without one.
    #[builder(default = DEFAULT_CAPACITY)]
    #[serde(default = "default_capacity")]
    pub default_capacity: Volume,
}

impl Default for ControllerOpts {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_weight() -> Weight {
    DEFAULT_WEIGHT
}

fn default_capacity() -> Volume {
    DEFAULT_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_constants() {
        let opts = ControllerOpts::default();
        assert_eq!(opts.default_weight, Weight::ONE);
        assert_eq!(opts.default_capacity, Volume::new(100));
    }

    #[test]
    fn builder_overrides_capacity() {
        let opts = ControllerOpts::builder()
            .default_capacity(Volume::new(10))
            .build();
        assert_eq!(opts.default_capacity, Volume::new(10));
        assert_eq!(opts.default_weight, DEFAULT_WEIGHT);
    }
}
