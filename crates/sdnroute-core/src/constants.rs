//! Controller constants.

use crate::units::{Volume, Weight};

/// Weight given to a link when none is specified.
pub const DEFAULT_WEIGHT: Weight = Weight::new(1);

/// Capacity given to a link when none is specified.
pub const DEFAULT_CAPACITY: Volume = Volume::new(100);

/// Relative tolerance under which two path costs are considered equal.
pub(crate) const COST_TOLERANCE: f64 = 1e-9;
