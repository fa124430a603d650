//! Operator dispatch table.
//!
//! Predicates never name code directly: an operator name is looked up in an
//! [`OperatorSet`], which yields its arity, its scheduling flags and the
//! function that evaluates it. Scheduling is derived from flags rather than
//! from a list of names, so a future containment-style operator only needs
//! the [`OpFlags::STRUCTURAL`] bit to run in the first tier.

use super::evaluate::{Call, Check};
use crate::error::Result;
use once_cell::sync::Lazy;

bitflags::bitflags! {
    /// Scheduling traits of an operator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpFlags: u8 {
        /// Pins down which widget instance a clause is about; runs before
        /// predicates that interrogate widget state or text.
        const STRUCTURAL = 1 << 0;
    }
}

pub(crate) type EvalFn = fn(&Call<'_>) -> Result<Check>;

/// One registered operator.
#[derive(Clone)]
pub struct Operator {
    pub(crate) name: &'static str,
    pub(crate) min_args: usize,
    pub(crate) max_args: usize,
    pub(crate) flags: OpFlags,
    pub(crate) eval: EvalFn,
}

impl Operator {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn flags(&self) -> OpFlags {
        self.flags
    }

    /// Execution tier: 1 for structural operators, 2 for the rest.
    pub fn tier(&self) -> u8 {
        if self.flags.contains(OpFlags::STRUCTURAL) { 1 } else { 2 }
    }

    pub(crate) fn accepts(&self, count: usize) -> bool {
        (self.min_args..=self.max_args).contains(&count)
    }

    pub(crate) fn arity(&self) -> String {
        if self.min_args == self.max_args {
            format!("{}", self.min_args)
        } else {
            format!("{} to {}", self.min_args, self.max_args)
        }
    }
}

impl std::fmt::Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("flags", &self.flags)
            .finish()
    }
}

/// Built-in operators, shared by every run that does not restrict them.
pub(crate) static DEFAULT_OPERATORS: Lazy<OperatorSet> =
    Lazy::new(|| OperatorSet { operators: crate::operators::builtin() });

/// A named collection of operators.
#[derive(Debug, Clone)]
pub struct OperatorSet {
    operators: Vec<Operator>,
}

impl Default for OperatorSet {
    fn default() -> Self {
        DEFAULT_OPERATORS.clone()
    }
}

impl OperatorSet {
    pub fn get(&self, name: &str) -> Option<&Operator> {
        self.operators.iter().find(|op| op.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operators.iter().map(|op| op.name)
    }

    /// Tier of `name`, or `None` for an unregistered operator.
    pub fn tier(&self, name: &str) -> Option<u8> {
        self.get(name).map(Operator::tier)
    }

    /// Keep only the operators accepted by `keep`.
    pub fn restrict(mut self, keep: impl Fn(&Operator) -> bool) -> Self {
        self.operators.retain(|op| keep(op));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_is_the_only_structural_builtin() {
        let set = OperatorSet::default();
        let structural: Vec<_> = set.names().filter(|n| set.tier(n) == Some(1)).collect();
        assert_eq!(structural, vec!["in_screen"]);
        assert_eq!(set.tier("less_than"), Some(2));
        assert_eq!(set.tier("in_widget"), None);
    }

    #[test]
    fn arity_ranges() {
        let set = OperatorSet::default();
        let similar = set.get("text_similar").unwrap();
        assert!(!similar.accepts(1));
        assert!(similar.accepts(2));
        assert!(similar.accepts(3));
        assert_eq!(similar.arity(), "2 to 3");
        assert_eq!(set.get("keyboard_on").unwrap().arity(), "1");
    }

    #[test]
    fn operator_macro_builds_entries() {
        fn never(_: &crate::engine::Call<'_>) -> crate::Result<crate::engine::Check> {
            Ok(crate::engine::Check::fail("never"))
        }
        let plain = operator! { name: "never", arity: 1, eval: never };
        assert_eq!((plain.name(), plain.tier(), plain.arity()), ("never", 2, "1".to_string()));
        let ranged = operator! { name: "never_in", arity: 1..=2, flags: OpFlags::STRUCTURAL, eval: never };
        assert_eq!((ranged.tier(), ranged.arity()), (1, "1 to 2".to_string()));
    }

    #[test]
    fn names_are_unique() {
        let set = OperatorSet::default();
        let mut names: Vec<_> = set.names().collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn restricted_sets_drop_operators() {
        let set = OperatorSet::default().restrict(|op| op.name() != "log_matches");
        assert!(!set.contains("log_matches"));
        assert!(set.contains("log_contains"));
    }
}
