//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Limit a value to lie within `[min, max]`.
///
/// `NAN` is passed through unchanged.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    if *value > *max {
        *max
    }
    else if *value < *min {
        *min
    }
    else {
        *value
    }
}

/// Single step of an exponential smoothing filter.
///
/// `weight` is the weight given to the previous value, so the new sample contributes
/// `1 - weight`.
pub fn exp_smooth<T>(previous: T, sample: T, weight: T) -> T
where
    T: Float
{
    weight * previous + (T::one() - weight) * sample
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
