//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Limit a value to the inclusive range `[min, max]`.
///
/// NaN values are passed through unchanged.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

/// Sum the elements of a slice, in order from first to last.
pub fn sum<T>(values: &[T]) -> T
where
    T: Float
{
    values.iter().fold(T::zero(), |acc, &v| acc + v)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((-1f64, 1f64), (-0.5f64, 0.5f64), 1.0), 0.5);
        assert_eq!(lin_map((-1f64, 1f64), (-0.5f64, 0.5f64), -0.5), -0.25);
        assert_eq!(lin_map((0f64, 10f64), (0f64, 1f64), 5.0), 0.5);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(2f64, -1f64, 1f64), 1f64);
        assert_eq!(clamp(-2f64, -1f64, 1f64), -1f64);
        assert_eq!(clamp(0.25f64, -1f64, 1f64), 0.25f64);
        assert!(clamp(f64::NAN, -1f64, 1f64).is_nan());
    }

    #[test]
    fn test_sum() {
        assert_eq!(sum(&[0.2f64, 0.004, 3.0]), 0.2 + 0.004 + 3.0);
        assert_eq!(sum::<f64>(&[]), 0.0);
    }
}
