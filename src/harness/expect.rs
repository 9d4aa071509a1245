//! Assertion vocabulary used inside test bodies
//!
//! Every matcher returns a [`TestResult`], so a body propagates the first
//! failed assertion with `?`.

use regex::Regex;
use std::fmt::{Debug, Display};

use super::error::{TestFailure, TestResult};

/// Values with a notion of truthiness
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for &str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for serde_json::Value {
    fn is_truthy(&self) -> bool {
        match self {
            serde_json::Value::Null => false,
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
            serde_json::Value::String(s) => !s.is_empty(),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
        }
    }
}

/// Numbers that can be compared approximately
pub trait Numeric: Copy + Debug {
    fn as_f64(self) -> f64;
}

macro_rules! impl_numeric {
    ($($t:ty),*) => {
        $(impl Numeric for $t {
            fn as_f64(self) -> f64 {
                self as f64
            }
        })*
    };
}

impl_numeric!(i32, i64, u32, u64, usize, f32, f64);

/// Start an assertion about `actual`
pub fn expect<T>(actual: T) -> Expectation<T> {
    Expectation {
        actual,
        negated: false,
    }
}

/// Record an explicit failure
pub fn fail(message: impl Into<String>) -> TestResult {
    Err(TestFailure::assertion(message))
}

/// Require an operation to have failed and hand back its error
pub fn expect_err<T: Debug, E>(result: Result<T, E>) -> Result<E, TestFailure> {
    match result {
        Ok(value) => Err(TestFailure::assertion(format!(
            "Expected operation to fail, but it succeeded with {value:?}"
        ))),
        Err(error) => Ok(error),
    }
}

/// Require an operation to have succeeded and hand back its value
pub fn expect_ok<T, E: Display>(result: Result<T, E>) -> Result<T, TestFailure> {
    result.map_err(|error| {
        TestFailure::assertion(format!("Expected operation to succeed, but it failed: {error}"))
    })
}

pub struct Expectation<T> {
    actual: T,
    negated: bool,
}

impl<T: Debug> Expectation<T> {
    /// Invert the next matcher
    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    fn check(&self, passed: bool, matcher: &str, expected: Option<String>) -> TestResult {
        if passed != self.negated {
            return Ok(());
        }
        let not = if self.negated { "not " } else { "" };
        let message = match expected {
            Some(expected) => format!("Expected {:?} {not}{matcher} {expected}", self.actual),
            None => format!("Expected {:?} {not}{matcher}", self.actual),
        };
        Err(TestFailure::Assertion { message })
    }

    pub fn to_be<E>(self, expected: E) -> TestResult
    where
        T: PartialEq<E>,
        E: Debug,
    {
        self.check(self.actual == expected, "to be", Some(format!("{expected:?}")))
    }

    pub fn to_equal<E>(self, expected: E) -> TestResult
    where
        T: PartialEq<E>,
        E: Debug,
    {
        self.check(
            self.actual == expected,
            "to equal",
            Some(format!("{expected:?}")),
        )
    }

    pub fn to_be_truthy(self) -> TestResult
    where
        T: Truthy,
    {
        self.check(self.actual.is_truthy(), "to be truthy", None)
    }

    pub fn to_be_falsy(self) -> TestResult
    where
        T: Truthy,
    {
        self.check(!self.actual.is_truthy(), "to be falsy", None)
    }

    pub fn to_be_less_than<E>(self, bound: E) -> TestResult
    where
        T: PartialOrd<E>,
        E: Debug,
    {
        self.check(
            self.actual < bound,
            "to be less than",
            Some(format!("{bound:?}")),
        )
    }

    pub fn to_be_greater_than<E>(self, bound: E) -> TestResult
    where
        T: PartialOrd<E>,
        E: Debug,
    {
        self.check(
            self.actual > bound,
            "to be greater than",
            Some(format!("{bound:?}")),
        )
    }

    /// Passes when `|actual - expected| < 10^-digits / 2`
    pub fn to_be_close_to<E: Numeric>(self, expected: E, digits: i32) -> TestResult
    where
        T: Numeric,
    {
        let delta = (self.actual.as_f64() - expected.as_f64()).abs();
        let limit = 10f64.powi(-digits) / 2.0;
        self.check(
            delta < limit,
            "to be close to",
            Some(format!("{expected:?} ({digits} digits)")),
        )
    }
}

impl<T: AsRef<str> + Debug> Expectation<T> {
    /// Regex search anywhere in the string
    pub fn to_match(self, pattern: &str) -> TestResult {
        let regex = Regex::new(pattern).map_err(|e| {
            TestFailure::assertion(format!("Invalid pattern /{pattern}/: {e}"))
        })?;
        self.check(
            regex.is_match(self.actual.as_ref()),
            "to match",
            Some(format!("/{pattern}/")),
        )
    }

    pub fn to_contain(self, needle: &str) -> TestResult {
        self.check(
            self.actual.as_ref().contains(needle),
            "to contain",
            Some(format!("{needle:?}")),
        )
    }
}

impl<V: Debug> Expectation<Option<V>> {
    pub fn to_be_none(self) -> TestResult {
        self.check(self.actual.is_none(), "to be none", None)
    }

    pub fn to_be_some(self) -> TestResult {
        self.check(self.actual.is_some(), "to be some", None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(result: TestResult) -> String {
        match result {
            Err(TestFailure::Assertion { message }) => message,
            other => panic!("Expected assertion failure, got {other:?}"),
        }
    }

    #[test]
    fn test_to_be_reports_actual_and_expected() {
        assert!(expect(3).to_be(3).is_ok());
        assert_eq!(message(expect(3).to_be(4)), "Expected 3 to be 4");
        assert_eq!(message(expect(3).not().to_be(3)), "Expected 3 not to be 3");
    }

    #[test]
    fn test_string_comparisons() {
        let contents = String::from("hello, world");
        assert!(expect(&contents).to_be(&String::from("hello, world")).is_ok());
        assert!(expect(contents.clone()).to_equal("hello, world").is_ok());
        assert!(expect(contents.as_str()).to_contain("world").is_ok());
    }

    #[test]
    fn test_truthiness() {
        assert!(expect(true).to_be_truthy().is_ok());
        assert!(expect(Some(1)).to_be_truthy().is_ok());
        assert!(expect(None::<i32>).not().to_be_truthy().is_ok());
        assert!(expect(String::new()).to_be_falsy().is_ok());
        assert!(expect(json!(0)).to_be_falsy().is_ok());
        assert!(expect(json!({})).to_be_truthy().is_ok());
    }

    #[test]
    fn test_to_match_searches() {
        let error = "File 'willDelete.png' could not be deleted because it could not be found";
        assert!(expect(error).to_match("not.*found").is_ok());
        assert!(expect(error).not().to_match("^found").is_ok());
        assert!(message(expect("abc").to_match("x+")).contains("/x+/"));
    }

    #[test]
    fn test_invalid_pattern_is_a_failure() {
        assert!(message(expect("abc").to_match("(")).starts_with("Invalid pattern"));
    }

    #[test]
    fn test_close_to_uses_digits() {
        assert!(expect(0.9001).to_be_close_to(0.9, 2).is_ok());
        assert!(expect(0.91).to_be_close_to(0.9, 2).is_err());
        assert!(expect(1.5f32).to_be_close_to(1.5, 2).is_ok());
    }

    #[test]
    fn test_ordering() {
        assert!(expect(10).to_be_less_than(3600).is_ok());
        assert!(expect(4000.0).to_be_less_than(3600.0).is_err());
        assert!(expect(6usize).to_be_greater_than(5).is_ok());
    }

    #[test]
    fn test_options() {
        assert!(expect(Some("md5")).to_be_some().is_ok());
        assert!(expect(None::<String>).to_be_none().is_ok());
        assert!(expect(Some(1)).to_be_none().is_err());
    }

    #[test]
    fn test_expect_err_and_ok() {
        let failed: Result<(), String> = Err("boom".to_string());
        assert_eq!(expect_err(failed).unwrap(), "boom");

        let succeeded: Result<u32, String> = Ok(7);
        assert!(expect_err(succeeded).is_err());
        assert_eq!(expect_ok(Ok::<u32, String>(7)).unwrap(), 7);
        assert!(expect_ok(Err::<u32, String>("nope".into())).is_err());
    }

    #[test]
    fn test_fail() {
        assert_eq!(message(fail("explicit")), "explicit");
    }
}
