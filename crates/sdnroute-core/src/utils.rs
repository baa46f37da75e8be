use std::cmp::Ordering;

use ordered_float::OrderedFloat;

use crate::constants::COST_TOLERANCE;

/// Compares two path costs, treating values within a relative tolerance as equal so that
/// rounding noise does not defeat the hop-count and node-sequence tie-breaks.
pub(crate) fn cmp_costs(a: f64, b: f64) -> Ordering {
    let scale = a.abs().max(b.abs()).max(1.0);
    if (a - b).abs() <= COST_TOLERANCE * scale {
        Ordering::Equal
    } else {
        OrderedFloat(a).cmp(&OrderedFloat(b))
    }
}
