//! Assertion engine.
//!
//! This module is the internal entry point used by [`crate::verify_with`]. It
//! is split into focused submodules under `src/engine/` while keeping the
//! public paths (`crate::engine::OperatorSet`, `crate::engine::RunMetrics`)
//! stable.
//!
//! ## How the parts work together
//!
//! A run is a two-phase pipeline:
//!
//! ```text
//! DSL text ── split_clauses / tokenize         (lexer.rs)
//!                    │
//!                    v
//!             parse + check                   (parser.rs, registry.rs)
//!               - classify definitions / predicates
//!               - entity kinds, keys, literal types
//!               - operators, arity, variables, fields
//!                    │
//!                    v
//!   Phase 1:  populate each definition          (populate.rs)
//!               - one snapshot request each
//!               - validate; first invalid one ends the run
//!                    │
//!                    v
//!   Phase 2:  schedule + evaluate predicates    (evaluate.rs)
//!               - stable tier sort (STRUCTURAL first)
//!               - no short-circuit
//!                    │
//!                    v
//!             verdict + diagnostics + RunMetrics (metrics.rs)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `lexer.rs`: clause splitting on `AND` and the restricted literal grammar.
//! - `parser.rs`: clause classification and every check that does not need a
//!   device.
//! - `registry.rs`: the operator dispatch table (`OperatorSet`) and the flags
//!   that drive scheduling.
//! - `populate.rs`: turns definitions into entities and keeps them alive for
//!   the run (`Bindings`).
//! - `evaluate.rs`: operand resolution, tier ordering and operator calls.
//! - `metrics.rs`: per-run timings and counters.
//!
//! ## Adding operators
//!
//! Implement the operator under `src/operators/` and list it in
//! `operators::builtin` with the `operator!` macro. Give it
//! `OpFlags::STRUCTURAL` if it decides which view a clause is about.

#[path = "engine/evaluate.rs"]
mod evaluate;
#[path = "engine/lexer.rs"]
mod lexer;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/populate.rs"]
mod populate;
#[path = "engine/registry.rs"]
mod registry;

pub(crate) use evaluate::{Call, Check, Value, evaluate, schedule};
pub use metrics::RunMetrics;
pub(crate) use parser::parse;
pub(crate) use populate::{Bindings, populate, summarize};
pub use registry::{OpFlags, Operator, OperatorSet};
