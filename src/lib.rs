extern crate self as repro_recognizer;

#[macro_use]
mod macros;
mod api;
mod engine;
mod operators;

pub mod entity;
pub mod error;
pub mod layout;
pub mod similarity;
pub mod snapshot;

#[cfg(test)]
mod scenarios;

pub use api::{
    ClauseKind, Context, Diagnostic, Options, Outcome, RunReport, parse_assertion, parse_assertion_with, verify,
    verify_with,
};
pub use engine::{OpFlags, Operator, OperatorSet, RunMetrics};
pub use entity::{Device, Entity, EntityKind, Orientation, Screen, Widget};
pub use error::{Error, ParseError, Result};
pub use similarity::{LexicalSimilarity, SimilarityService};
pub use snapshot::{DirectorySource, MemorySource, RetryPolicy, Retrying, SnapshotSource};

use std::fmt;

// --- Assertion AST ----------------------------------------------------------

/// A literal value written in DSL text.
///
/// The grammar is deliberately flat: strings, booleans, integers and
/// decimals. Lists, maps and calls are rejected by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Str(_) => "string",
            Literal::Bool(_) => "boolean",
            Literal::Int(_) => "integer",
            Literal::Float(_) => "number",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(i) => write!(f, "{i}"),
            // Plain decimal with a point: `1.0`, `0.00001`, never `1e-5`.
            Literal::Float(x) => {
                let plain = x.to_string();
                if plain.contains('.') { f.write_str(&plain) } else { write!(f, "{plain}.0") }
            }
        }
    }
}

/// `key=value` inside a constructor call.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub key: String,
    pub value: Literal,
}

/// One argument of a predicate call.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A bound entity, e.g. `w`.
    Variable(String),
    /// A field of a bound entity, e.g. `d.volume`.
    Field { var: String, field: String },
    Literal(Literal),
}

impl Operand {
    /// Name of the variable this operand reads, if any.
    pub fn variable(&self) -> Option<&str> {
        match self {
            Operand::Variable(name) | Operand::Field { var: name, .. } => Some(name),
            Operand::Literal(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Variable(name) => f.write_str(name),
            Operand::Field { var, field } => write!(f, "{var}.{field}"),
            Operand::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

/// `name = Kind(key=value, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub kind: EntityKind,
    pub args: Vec<Argument>,
}

impl Definition {
    /// Names ending in `1` (`s1`, `d1`) bind the snapshot before the current one.
    pub fn previous(&self) -> bool {
        self.name.ends_with('1')
    }

    pub fn arg(&self, key: &str) -> Option<&Literal> {
        self.args.iter().find(|a| a.key == key).map(|a| &a.value)
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}(", self.name, self.kind)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", arg.key, arg.value)?;
        }
        f.write_str(")")
    }
}

/// `operator(operand, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub operator: String,
    pub operands: Vec<Operand>,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.operator)?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{operand}")?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Definition(Definition),
    Predicate(Predicate),
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Definition(d) => write!(f, "{d}"),
            Clause::Predicate(p) => write!(f, "{p}"),
        }
    }
}

/// A parsed DSL expression: clauses in their original textual order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assertion {
    clauses: Vec<Clause>,
}

impl Assertion {
    pub(crate) fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Variable definitions in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.clauses.iter().filter_map(|c| match c {
            Clause::Definition(d) => Some(d),
            Clause::Predicate(_) => None,
        })
    }

    /// Predicates in textual order.
    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.clauses.iter().filter_map(|c| match c {
            Clause::Predicate(p) => Some(p),
            Clause::Definition(_) => None,
        })
    }

    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions().find(|d| d.name == name)
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}
