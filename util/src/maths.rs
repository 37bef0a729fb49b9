//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit a value to the closed range `[min, max]`.
///
/// NaN is passed through untouched so that callers performing range checks still see it.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Returns true if `value` lies within the closed range `[min, max]`. NaN is never in range.
pub fn in_range<T>(value: T, min: T, max: T) -> bool
where
    T: PartialOrd
{
    value >= min && value <= max
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&1.5f64, &-1.0, &1.0), 1.0);
        assert_eq!(clamp(&-3.0f64, &-1.0, &1.0), -1.0);
        assert_eq!(clamp(&0.25f64, &-1.0, &1.0), 0.25);
        assert!(clamp(&f64::NAN, &-1.0, &1.0).is_nan());
    }

    #[test]
    fn test_in_range() {
        assert!(in_range(1.0, -1.0, 1.0));
        assert!(in_range(-1.0, -1.0, 1.0));
        assert!(!in_range(1.0001, -1.0, 1.0));
        assert!(!in_range(f64::NAN, -1.0, 1.0));
        assert!(in_range(18, 1, 18));
        assert!(!in_range(0, 1, 18));
    }
}
