//! Rule registry and evaluation.
//!
//! # Responsibilities
//! - Hold rules by name (built-ins plus application rules)
//! - Bind `RuleRef`s into `BoundRule`s at form build time
//! - Evaluate a named rule against a value
//!
//! # Design Decisions
//! - Registry is frozen into an `Arc` once the application is built
//! - Binding rejects unknown names and bad arguments so typos never reach a request

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::validation::rules::{
    Email, Max, MaxLength, Min, MinLength, OneOf, Pattern, Required, Rule,
};
use crate::validation::{RuleError, RuleRef};

/// A rule resolved against the registry, with arguments already checked.
#[derive(Debug, Clone)]
pub struct BoundRule {
    rule: Arc<dyn Rule>,
    args: Vec<Value>,
}

impl BoundRule {
    pub fn name(&self) -> &str {
        self.rule.name()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Evaluate against a value; `Err(message)` on failure.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if self.rule.evaluate(value, &self.args) {
            Ok(())
        } else {
            Err(self.rule.message(&self.args))
        }
    }
}

/// Registry of named rules.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: HashMap<String, Arc<dyn Rule>>,
}

impl RuleEngine {
    /// An engine with no rules at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An engine with the stock rules registered.
    pub fn with_builtins() -> Self {
        let builtins: [Arc<dyn Rule>; 8] = [
            Arc::new(Required),
            Arc::new(MinLength),
            Arc::new(MaxLength),
            Arc::new(Min),
            Arc::new(Max),
            Arc::new(Email),
            Arc::new(Pattern::default()),
            Arc::new(OneOf),
        ];

        let mut engine = Self::empty();
        for rule in builtins {
            engine.rules.insert(rule.name().to_string(), rule);
        }
        engine
    }

    /// Register an application rule under its own name.
    pub fn register(&mut self, rule: impl Rule + 'static) -> Result<(), RuleError> {
        let name = rule.name().to_string();
        if self.rules.contains_key(&name) {
            return Err(RuleError::DuplicateRule(name));
        }
        tracing::debug!(rule = %name, "Registered validation rule");
        self.rules.insert(name, Arc::new(rule));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Resolve a rule reference, checking the name and its arguments.
    pub fn bind(&self, rule_ref: &RuleRef) -> Result<BoundRule, RuleError> {
        let rule = self
            .rules
            .get(&rule_ref.name)
            .cloned()
            .ok_or_else(|| RuleError::UnknownRule(rule_ref.name.clone()))?;

        let prepared = rule
            .prepare(&rule_ref.args)
            .map_err(|reason| RuleError::InvalidRuleArguments {
                rule: rule_ref.name.clone(),
                reason,
            })?;

        Ok(BoundRule {
            rule: prepared.unwrap_or(rule),
            args: rule_ref.args.clone(),
        })
    }

    /// Evaluate a rule by name.
    pub fn evaluate(&self, name: &str, value: &Value, args: &[Value]) -> Result<bool, RuleError> {
        let rule = self
            .rules
            .get(name)
            .ok_or_else(|| RuleError::UnknownRule(name.to_string()))?;
        Ok(rule.evaluate(value, args))
    }
}
