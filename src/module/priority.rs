//! Naming-convention priority policy
//!
//! Maps module symbolic names to start priorities through an ordered rule
//! table. The built-in rule pins command-handling modules to a fixed elevated
//! priority so they initialize after general-purpose modules.

/// Symbolic-name prefix reserved for command-handling modules.
pub const COMMAND_MODULE_PREFIX: &str = "modhost-command";

/// Fixed priority assigned to command-handling modules.
pub const COMMAND_MODULE_PRIORITY: i32 = 10;

/// One predicate-to-priority rule.
pub struct PriorityRule {
    predicate: Box<dyn Fn(&str) -> bool + Send + Sync>,
    priority: i32,
}

impl PriorityRule {
    pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static, priority: i32) -> Self {
        Self {
            predicate: Box::new(predicate),
            priority,
        }
    }

    pub fn matches(&self, symbolic_name: &str) -> bool {
        (self.predicate)(symbolic_name)
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

/// Ordered rule table; the first matching rule wins.
pub struct PriorityPolicy {
    rules: Vec<PriorityRule>,
}

impl PriorityPolicy {
    /// A policy with no rules; every module gets the fallback priority.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule.
    pub fn with_rule(
        mut self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
        priority: i32,
    ) -> Self {
        self.rules.push(PriorityRule::new(predicate, priority));
        self
    }

    /// Resolve the priority for `symbolic_name`, falling back to `fallback`
    /// when no rule matches.
    pub fn resolve(&self, symbolic_name: &str, fallback: i32) -> i32 {
        self.rules
            .iter()
            .find(|rule| rule.matches(symbolic_name))
            .map(PriorityRule::priority)
            .unwrap_or(fallback)
    }
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self::empty().with_rule(
            |name| name.starts_with(COMMAND_MODULE_PREFIX),
            COMMAND_MODULE_PRIORITY,
        )
    }
}
