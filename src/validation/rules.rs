//! Built-in validation rules.
//!
//! # Responsibilities
//! - Define the `Rule` contract (pure predicate + failure message)
//! - Provide the stock rules registered by `RuleEngine::with_builtins`
//! - Check rule arguments once, when a form is built

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;

/// A named, parameterizable validation predicate.
pub trait Rule: Send + Sync + fmt::Debug {
    /// Registry key, e.g. `"MinLength"`.
    fn name(&self) -> &str;

    /// Validate the declared arguments. Called at form build time.
    fn check_args(&self, _args: &[Value]) -> Result<(), String> {
        Ok(())
    }

    /// Check the arguments and optionally return a rule specialized to them,
    /// used in place of `self` by the bound rule.
    fn prepare(&self, args: &[Value]) -> Result<Option<Arc<dyn Rule>>, String> {
        self.check_args(args).map(|()| None)
    }

    /// Returns true if `value` satisfies the rule.
    fn evaluate(&self, value: &Value, args: &[Value]) -> bool;

    /// Failure message recorded against the field.
    fn message(&self, args: &[Value]) -> String;
}

/// Returns true for `null`, blank strings, and empty collections.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Character count for strings, element count for arrays.
fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn single_count(args: &[Value]) -> Result<usize, String> {
    match args {
        [n] => n
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| format!("expected a non-negative integer, got {}", n)),
        _ => Err(format!("expected exactly one argument, got {}", args.len())),
    }
}

fn single_number(args: &[Value]) -> Result<f64, String> {
    match args {
        [n] => n
            .as_f64()
            .ok_or_else(|| format!("expected a number, got {}", n)),
        _ => Err(format!("expected exactly one argument, got {}", args.len())),
    }
}

/// Display a numeric bound without a trailing `.0` for whole numbers.
fn display_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Fails iff the value is empty or absent.
#[derive(Debug, Default)]
pub struct Required;

impl Rule for Required {
    fn name(&self) -> &str {
        "Required"
    }

    fn check_args(&self, args: &[Value]) -> Result<(), String> {
        if args.is_empty() {
            Ok(())
        } else {
            Err("takes no arguments".to_string())
        }
    }

    fn evaluate(&self, value: &Value, _args: &[Value]) -> bool {
        !is_empty(value)
    }

    fn message(&self, _args: &[Value]) -> String {
        "is required".to_string()
    }
}

/// Fails iff the string/array length is below `n`.
#[derive(Debug, Default)]
pub struct MinLength;

impl Rule for MinLength {
    fn name(&self) -> &str {
        "MinLength"
    }

    fn check_args(&self, args: &[Value]) -> Result<(), String> {
        single_count(args).map(|_| ())
    }

    fn evaluate(&self, value: &Value, args: &[Value]) -> bool {
        if value.is_null() {
            return true;
        }
        let Ok(min) = single_count(args) else {
            return false;
        };
        length_of(value).is_some_and(|len| len >= min)
    }

    fn message(&self, args: &[Value]) -> String {
        format!(
            "must be at least {} characters",
            single_count(args).unwrap_or_default()
        )
    }
}

/// Fails iff the string/array length is above `n`.
#[derive(Debug, Default)]
pub struct MaxLength;

impl Rule for MaxLength {
    fn name(&self) -> &str {
        "MaxLength"
    }

    fn check_args(&self, args: &[Value]) -> Result<(), String> {
        single_count(args).map(|_| ())
    }

    fn evaluate(&self, value: &Value, args: &[Value]) -> bool {
        if value.is_null() {
            return true;
        }
        let Ok(max) = single_count(args) else {
            return false;
        };
        length_of(value).is_some_and(|len| len <= max)
    }

    fn message(&self, args: &[Value]) -> String {
        format!(
            "must be at most {} characters",
            single_count(args).unwrap_or_default()
        )
    }
}

/// Fails iff the numeric value is below `n`.
#[derive(Debug, Default)]
pub struct Min;

impl Rule for Min {
    fn name(&self) -> &str {
        "Min"
    }

    fn check_args(&self, args: &[Value]) -> Result<(), String> {
        single_number(args).map(|_| ())
    }

    fn evaluate(&self, value: &Value, args: &[Value]) -> bool {
        if value.is_null() {
            return true;
        }
        match (value.as_f64(), single_number(args)) {
            (Some(n), Ok(min)) => n >= min,
            _ => false,
        }
    }

    fn message(&self, args: &[Value]) -> String {
        format!(
            "must be at least {}",
            display_number(single_number(args).unwrap_or_default())
        )
    }
}

/// Fails iff the numeric value is above `n`.
#[derive(Debug, Default)]
pub struct Max;

impl Rule for Max {
    fn name(&self) -> &str {
        "Max"
    }

    fn check_args(&self, args: &[Value]) -> Result<(), String> {
        single_number(args).map(|_| ())
    }

    fn evaluate(&self, value: &Value, args: &[Value]) -> bool {
        if value.is_null() {
            return true;
        }
        match (value.as_f64(), single_number(args)) {
            (Some(n), Ok(max)) => n <= max,
            _ => false,
        }
    }

    fn message(&self, args: &[Value]) -> String {
        format!(
            "must be at most {}",
            display_number(single_number(args).unwrap_or_default())
        )
    }
}

/// Simple address shape check, not RFC 5322.
#[derive(Debug, Default)]
pub struct Email;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is a valid regex")
    })
}

impl Rule for Email {
    fn name(&self) -> &str {
        "Email"
    }

    fn check_args(&self, args: &[Value]) -> Result<(), String> {
        if args.is_empty() {
            Ok(())
        } else {
            Err("takes no arguments".to_string())
        }
    }

    fn evaluate(&self, value: &Value, _args: &[Value]) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => email_regex().is_match(s),
            _ => false,
        }
    }

    fn message(&self, _args: &[Value]) -> String {
        "must be a valid email".to_string()
    }
}

/// Regex match on string values.
///
/// The registered instance is unbound; binding compiles the pattern into
/// a new instance owned by that `BoundRule`.
#[derive(Debug, Default)]
pub struct Pattern {
    compiled: Option<Regex>,
}

impl Pattern {
    fn pattern_arg(args: &[Value]) -> Result<&str, String> {
        match args {
            [Value::String(p)] => Ok(p.as_str()),
            [other] => Err(format!("expected a pattern string, got {}", other)),
            _ => Err(format!("expected exactly one argument, got {}", args.len())),
        }
    }

    fn compile(args: &[Value]) -> Result<Regex, String> {
        let pattern = Self::pattern_arg(args)?;
        Regex::new(pattern).map_err(|e| format!("invalid regex: {}", e))
    }

    fn is_match(&self, args: &[Value], text: &str) -> bool {
        match &self.compiled {
            Some(re) => re.is_match(text),
            None => Self::compile(args).is_ok_and(|re| re.is_match(text)),
        }
    }
}

impl Rule for Pattern {
    fn name(&self) -> &str {
        "Pattern"
    }

    fn check_args(&self, args: &[Value]) -> Result<(), String> {
        Self::compile(args).map(|_| ())
    }

    fn prepare(&self, args: &[Value]) -> Result<Option<Arc<dyn Rule>>, String> {
        let compiled = Self::compile(args)?;
        Ok(Some(Arc::new(Pattern {
            compiled: Some(compiled),
        })))
    }

    fn evaluate(&self, value: &Value, args: &[Value]) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => self.is_match(args, s),
            _ => false,
        }
    }

    fn message(&self, args: &[Value]) -> String {
        format!(
            "must match pattern {}",
            Self::pattern_arg(args).unwrap_or_default()
        )
    }
}

/// Fails unless the value equals one of the arguments.
#[derive(Debug, Default)]
pub struct OneOf;

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

impl Rule for OneOf {
    fn name(&self) -> &str {
        "OneOf"
    }

    fn check_args(&self, args: &[Value]) -> Result<(), String> {
        if args.is_empty() {
            Err("expected at least one allowed value".to_string())
        } else {
            Ok(())
        }
    }

    fn evaluate(&self, value: &Value, args: &[Value]) -> bool {
        value.is_null() || args.iter().any(|allowed| same_value(value, allowed))
    }

    fn message(&self, args: &[Value]) -> String {
        let allowed: Vec<String> = args.iter().map(|v| v.to_string()).collect();
        format!("must be one of {}", allowed.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required() {
        let rule = Required;
        assert!(!rule.evaluate(&Value::Null, &[]));
        assert!(!rule.evaluate(&json!(""), &[]));
        assert!(!rule.evaluate(&json!("   "), &[]));
        assert!(!rule.evaluate(&json!([]), &[]));
        assert!(rule.evaluate(&json!("x"), &[]));
        assert!(rule.evaluate(&json!(0), &[]));
        assert!(rule.evaluate(&json!(false), &[]));
    }

    #[test]
    fn test_min_length_counts_chars() {
        let rule = MinLength;
        let args = [json!(5)];
        assert!(!rule.evaluate(&json!("Hi"), &args));
        assert!(rule.evaluate(&json!("Hello"), &args));
        // Multi-byte characters count once.
        assert!(rule.evaluate(&json!("héllo"), &args));
        assert!(rule.evaluate(&json!([1, 2, 3, 4, 5]), &args));
        assert!(!rule.evaluate(&json!(12345), &args));
        assert_eq!(rule.message(&args), "must be at least 5 characters");
    }

    #[test]
    fn test_empty_value_only_fails_required() {
        assert!(MinLength.evaluate(&Value::Null, &[json!(3)]));
        assert!(MaxLength.evaluate(&Value::Null, &[json!(3)]));
        assert!(Min.evaluate(&Value::Null, &[json!(1)]));
        assert!(Email.evaluate(&Value::Null, &[]));
        assert!(OneOf.evaluate(&Value::Null, &[json!("a")]));
    }

    #[test]
    fn test_min_max_numeric() {
        assert!(Min.evaluate(&json!(3), &[json!(3)]));
        assert!(!Min.evaluate(&json!(2.5), &[json!(3)]));
        assert!(!Min.evaluate(&json!("10"), &[json!(3)]));
        assert!(Max.evaluate(&json!(3), &[json!(3.5)]));
        assert!(!Max.evaluate(&json!(4), &[json!(3.5)]));
        assert_eq!(Min.message(&[json!(3.0)]), "must be at least 3");
        assert_eq!(Max.message(&[json!(3.5)]), "must be at most 3.5");
    }

    #[test]
    fn test_argument_checks() {
        assert!(MinLength.check_args(&[json!(5)]).is_ok());
        assert!(MinLength.check_args(&[]).is_err());
        assert!(MinLength.check_args(&[json!(-1)]).is_err());
        assert!(MinLength.check_args(&[json!("5")]).is_err());
        assert!(Required.check_args(&[json!(1)]).is_err());
        assert!(Pattern::default().check_args(&[json!("^[a-z]+$")]).is_ok());
        assert!(Pattern::default().check_args(&[json!("([a-z")]).is_err());
        assert!(OneOf.check_args(&[]).is_err());
    }

    #[test]
    fn test_email_and_pattern() {
        assert!(Email.evaluate(&json!("a@example.com"), &[]));
        assert!(!Email.evaluate(&json!("not-an-email"), &[]));

        let rule = Pattern::default();
        let args = [json!("^[a-z-]+$")];
        assert!(rule.evaluate(&json!("hello-world"), &args));
        assert!(!rule.evaluate(&json!("Hello World"), &args));
    }

    #[test]
    fn test_pattern_prepare_compiles_once() {
        let args = [json!("^[a-z-]+$")];
        let prepared = Pattern::default().prepare(&args).unwrap().unwrap();
        assert_eq!(prepared.name(), "Pattern");
        assert!(prepared.evaluate(&json!("hello-world"), &args));
        assert!(!prepared.evaluate(&json!("Hello World"), &args));
        assert_eq!(prepared.message(&args), "must match pattern ^[a-z-]+$");

        assert!(Pattern::default().prepare(&[json!("([a-z")]).is_err());
        assert!(MinLength.prepare(&[json!(5)]).unwrap().is_none());
    }

    #[test]
    fn test_one_of_compares_numbers_by_value() {
        let args = [json!(1), json!("draft")];
        assert!(OneOf.evaluate(&json!(1.0), &args));
        assert!(OneOf.evaluate(&json!("draft"), &args));
        assert!(!OneOf.evaluate(&json!("published"), &args));
        assert_eq!(OneOf.message(&args), "must be one of 1, \"draft\"");
    }

    #[test]
    fn test_rules_are_idempotent() {
        let rule = MinLength;
        let args = [json!(5)];
        let value = json!("Hi");
        let first = rule.evaluate(&value, &args);
        for _ in 0..10 {
            assert_eq!(rule.evaluate(&value, &args), first);
        }
    }
}
