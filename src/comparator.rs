//! # Comparators
//!
//! A comparator decides whether a live value matches its canonical value.
//! It returns `Ok(())` on equality and an assertion-style [`Mismatch`]
//! describing the difference otherwise.
//!
//! - [`EqComparator`]: structural `PartialEq`, the default.
//! - [`ApproxComparator`]: numeric tolerance for floats and JSON numbers.
//! - [`UnorderedComparator`]: ordering-insensitive comparison of vectors.
//! - [`FnComparator`]: any closure.

use serde_json::Value as JsonValue;
use std::fmt::{self, Debug, Display};

/// An assertion-style comparison failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub message: String,
}

impl Mismatch {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Mismatch {}

/// Decides equality between a live value and its canonical value.
pub trait Comparator<T: ?Sized> {
    fn compare(&self, live: &T, canonical: &T) -> Result<(), Mismatch>;
}

/// Structural equality via `PartialEq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqComparator;

impl<T: PartialEq + Debug + ?Sized> Comparator<T> for EqComparator {
    fn compare(&self, live: &T, canonical: &T) -> Result<(), Mismatch> {
        if live == canonical {
            return Ok(());
        }
        Err(Mismatch::new(format!(
            "assertion failed: live == canonical\n  live:      {:?}\n  canonical: {:?}",
            live, canonical
        )))
    }
}

/// Wraps a predicate closure. The description names the relation in
/// failure messages.
pub struct FnComparator<F> {
    description: String,
    predicate: F,
}

impl<F> FnComparator<F> {
    pub fn new(description: impl Into<String>, predicate: F) -> Self {
        Self {
            description: description.into(),
            predicate,
        }
    }
}

impl<T, F> Comparator<T> for FnComparator<F>
where
    T: Debug + ?Sized,
    F: Fn(&T, &T) -> bool,
{
    fn compare(&self, live: &T, canonical: &T) -> Result<(), Mismatch> {
        if (self.predicate)(live, canonical) {
            return Ok(());
        }
        Err(Mismatch::new(format!(
            "{} does not hold\n  live:      {:?}\n  canonical: {:?}",
            self.description, live, canonical
        )))
    }
}

// ============================================================================
// APPROXIMATE NUMERIC COMPARISON
// ============================================================================

/// Numeric comparison with absolute and relative tolerance.
///
/// Two numbers are close when `|a - b| <= max(abs_tol, rel_tol * max(|a|, |b|))`.
/// NaN equals NaN so that a canonical NaN stays stable across runs.
/// Infinities are only close to the same infinity.
#[derive(Debug, Clone, Copy)]
pub struct ApproxComparator {
    pub abs_tol: f64,
    pub rel_tol: f64,
}

impl Default for ApproxComparator {
    fn default() -> Self {
        Self {
            abs_tol: 1e-12,
            rel_tol: 1e-6,
        }
    }
}

impl ApproxComparator {
    pub fn new(abs_tol: f64, rel_tol: f64) -> Self {
        Self { abs_tol, rel_tol }
    }

    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return a.is_nan() && b.is_nan();
        }
        if a.is_infinite() || b.is_infinite() {
            return a == b;
        }
        if a == b {
            return true;
        }
        let tolerance = self.abs_tol.max(self.rel_tol * a.abs().max(b.abs()));
        (a - b).abs() <= tolerance
    }

    fn mismatch(&self, path: &str, live: impl Debug, canonical: impl Debug) -> Mismatch {
        Mismatch::new(format!(
            "values at {} are not approximately equal (abs_tol={}, rel_tol={})\n  live:      {:?}\n  canonical: {:?}",
            if path.is_empty() { "$" } else { path },
            self.abs_tol,
            self.rel_tol,
            live,
            canonical
        ))
    }

    fn compare_slices(&self, live: &[f64], canonical: &[f64]) -> Result<(), Mismatch> {
        if live.len() != canonical.len() {
            return Err(Mismatch::new(format!(
                "length differs: live has {}, canonical has {}",
                live.len(),
                canonical.len()
            )));
        }
        for (i, (a, b)) in live.iter().zip(canonical).enumerate() {
            if !self.is_close(*a, *b) {
                return Err(self.mismatch(&format!("[{}]", i), a, b));
            }
        }
        Ok(())
    }

    fn compare_json(&self, path: &str, live: &JsonValue, canonical: &JsonValue) -> Result<(), Mismatch> {
        match (live, canonical) {
            (JsonValue::Number(a), JsonValue::Number(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) if self.is_close(x, y) => Ok(()),
                _ => Err(self.mismatch(path, a, b)),
            },
            (JsonValue::Array(a), JsonValue::Array(b)) => {
                if a.len() != b.len() {
                    return Err(self.mismatch(path, live, canonical));
                }
                for (i, (x, y)) in a.iter().zip(b).enumerate() {
                    self.compare_json(&format!("{}[{}]", path, i), x, y)?;
                }
                Ok(())
            }
            (JsonValue::Object(a), JsonValue::Object(b)) => {
                if a.len() != b.len() || a.keys().any(|k| !b.contains_key(k)) {
                    return Err(self.mismatch(path, live, canonical));
                }
                for (key, x) in a {
                    self.compare_json(&format!("{}.{}", path, key), x, &b[key])?;
                }
                Ok(())
            }
            _ if live == canonical => Ok(()),
            _ => Err(self.mismatch(path, live, canonical)),
        }
    }
}

impl Comparator<f64> for ApproxComparator {
    fn compare(&self, live: &f64, canonical: &f64) -> Result<(), Mismatch> {
        if self.is_close(*live, *canonical) {
            return Ok(());
        }
        Err(self.mismatch("", live, canonical))
    }
}

impl Comparator<[f64]> for ApproxComparator {
    fn compare(&self, live: &[f64], canonical: &[f64]) -> Result<(), Mismatch> {
        self.compare_slices(live, canonical)
    }
}

impl Comparator<Vec<f64>> for ApproxComparator {
    fn compare(&self, live: &Vec<f64>, canonical: &Vec<f64>) -> Result<(), Mismatch> {
        self.compare_slices(live, canonical)
    }
}

impl Comparator<JsonValue> for ApproxComparator {
    fn compare(&self, live: &JsonValue, canonical: &JsonValue) -> Result<(), Mismatch> {
        self.compare_json("", live, canonical)
    }
}

// ============================================================================
// ORDER-INSENSITIVE COMPARISON
// ============================================================================

/// Compares vectors as multisets: same elements, any order.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnorderedComparator;

impl<T: Ord + Clone + Debug> Comparator<Vec<T>> for UnorderedComparator {
    fn compare(&self, live: &Vec<T>, canonical: &Vec<T>) -> Result<(), Mismatch> {
        let mut a = live.clone();
        let mut b = canonical.clone();
        a.sort();
        b.sort();
        if a == b {
            return Ok(());
        }
        Err(Mismatch::new(format!(
            "collections differ regardless of order\n  live (sorted):      {:?}\n  canonical (sorted): {:?}",
            a, b
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eq_comparator_reports_both_values() {
        assert!(EqComparator.compare(&1, &1).is_ok());
        let err = EqComparator.compare(&"new", &"old").unwrap_err();
        assert!(err.message.contains("\"new\""));
        assert!(err.message.contains("\"old\""));
    }

    #[test]
    fn eq_comparator_handles_unsized_values() {
        assert!(EqComparator.compare("abc", "abc").is_ok());
        assert!(EqComparator.compare(&[1, 2][..], &[1, 3][..]).is_err());
    }

    #[test]
    fn approx_within_tolerance() {
        let cmp = ApproxComparator::new(1e-9, 1e-3);
        assert!(cmp.compare(&1000.0_f64, &1000.5).is_ok());
        assert!(cmp.compare(&1000.0_f64, &1002.0).is_err());
        assert!(cmp.compare(&f64::NAN, &f64::NAN).is_ok());
        assert!(cmp.compare(&f64::NAN, &0.0_f64).is_err());
    }

    #[test]
    fn approx_infinity_is_not_close_to_finite() {
        let cmp = ApproxComparator::default();
        assert!(cmp.compare(&f64::INFINITY, &1.0_f64).is_err());
        assert!(cmp.compare(&1.0_f64, &f64::NEG_INFINITY).is_err());
        assert!(cmp.compare(&f64::INFINITY, &f64::NEG_INFINITY).is_err());
        assert!(cmp.compare(&f64::INFINITY, &f64::INFINITY).is_ok());
    }

    #[test]
    fn approx_vectors_report_index() {
        let cmp = ApproxComparator::new(0.01, 0.0);
        assert!(cmp.compare(&vec![1.0, 2.0], &vec![1.001, 2.005]).is_ok());
        let err = cmp.compare(&vec![1.0, 2.0], &vec![1.0, 2.5]).unwrap_err();
        assert!(err.message.contains("[1]"));
        assert!(cmp.compare(&vec![1.0], &vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn approx_json_recurses() {
        let cmp = ApproxComparator::new(1e-6, 0.0);
        let live = json!({"a": [1.0000001, {"b": 2}], "c": "x"});
        let canon = json!({"a": [1.0, {"b": 2.0}], "c": "x"});
        assert!(cmp.compare(&live, &canon).is_ok());

        let err = cmp
            .compare(&json!({"a": [1.0, {"b": 3}]}), &json!({"a": [1.0, {"b": 2}]}))
            .unwrap_err();
        assert!(err.message.contains(".a[1].b"));
        assert!(cmp.compare(&json!({"a": 1}), &json!({"b": 1})).is_err());
    }

    #[test]
    fn unordered_ignores_order_but_not_multiplicity() {
        let cmp = UnorderedComparator;
        assert!(cmp.compare(&vec![3, 1, 2], &vec![1, 2, 3]).is_ok());
        assert!(cmp.compare(&vec![1, 1, 2], &vec![1, 2, 2]).is_err());
    }

    #[test]
    fn fn_comparator_uses_description() {
        let cmp = FnComparator::new("same length", |a: &String, b: &String| a.len() == b.len());
        assert!(cmp.compare(&"abc".to_string(), &"xyz".to_string()).is_ok());
        let err = cmp.compare(&"ab".to_string(), &"xyz".to_string()).unwrap_err();
        assert!(err.message.starts_with("same length does not hold"));
    }
}
