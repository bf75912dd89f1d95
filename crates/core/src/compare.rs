//! Comparators for range indexes
//!
//! A [`Comparator`] orders individual scalars. Composite keys are ordered
//! lexicographically with the comparator applied per element, then by length.

use crate::value::{natural_order, KeyValue, Scalar};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Signature of a user-supplied scalar comparator
pub type CompareFn = dyn Fn(&Scalar, &Scalar) -> Ordering + Send + Sync;

/// Scalar ordering used by a range index
///
/// Defaults to [`natural_order`]. Cloning is cheap; custom comparators are
/// shared behind an `Arc`.
#[derive(Clone, Default)]
pub struct Comparator {
    custom: Option<Arc<CompareFn>>,
}

impl Comparator {
    /// The natural scalar ordering
    pub fn natural() -> Self {
        Self { custom: None }
    }

    /// Wrap a custom comparison function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Scalar, &Scalar) -> Ordering + Send + Sync + 'static,
    {
        Self {
            custom: Some(Arc::new(f)),
        }
    }

    /// Check if this is the natural ordering
    pub fn is_natural(&self) -> bool {
        self.custom.is_none()
    }

    /// Compare two scalars
    pub fn compare(&self, a: &Scalar, b: &Scalar) -> Ordering {
        match &self.custom {
            Some(f) => f(a, b),
            None => natural_order(a, b),
        }
    }

    /// Compare two keys element-wise; on a shared-prefix tie the shorter key
    /// sorts first
    pub fn compare_keys(&self, a: &KeyValue, b: &KeyValue) -> Ordering {
        let (left, right) = (a.elements(), b.elements());
        for (x, y) in left.iter().zip(right) {
            match self.compare(x, y) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        left.len().cmp(&right.len())
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.custom {
            Some(_) => write!(f, "Comparator(custom)"),
            None => write!(f, "Comparator(natural)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_natural_default() {
        let cmp = Comparator::default();
        assert!(cmp.is_natural());
        assert_eq!(
            cmp.compare(&Scalar::Int(1), &Scalar::Int(2)),
            Ordering::Less
        );
    }

    #[test]
    fn test_custom_comparator() {
        let reverse = Comparator::new(|a, b| natural_order(b, a));
        assert!(!reverse.is_natural());
        assert_eq!(
            reverse.compare(&Scalar::Int(1), &Scalar::Int(2)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_composite_lexicographic() {
        let cmp = Comparator::natural();
        let a = KeyValue::from(json!(["Ankara", 28]));
        let b = KeyValue::from(json!(["Ankara", 31]));
        let c = KeyValue::from(json!(["Bursa", 1]));
        assert_eq!(cmp.compare_keys(&a, &b), Ordering::Less);
        assert_eq!(cmp.compare_keys(&b, &c), Ordering::Less);
        assert_eq!(cmp.compare_keys(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_composite_shorter_first() {
        let cmp = Comparator::natural();
        let short = KeyValue::from(json!(["Ankara"]));
        let long = KeyValue::from(json!(["Ankara", 1]));
        assert_eq!(cmp.compare_keys(&short, &long), Ordering::Less);
        assert_eq!(cmp.compare_keys(&long, &short), Ordering::Greater);
    }

    #[test]
    fn test_scalar_compares_like_single_element() {
        let cmp = Comparator::natural();
        let scalar = KeyValue::from(5);
        let single = KeyValue::from(json!([5]));
        assert_eq!(cmp.compare_keys(&scalar, &single), Ordering::Equal);
    }
}
