use crate::engine::{self, Bindings, OperatorSet, RunMetrics};
use crate::error::Result;
use crate::layout::INSTALLER_PACKAGES;
use crate::similarity::{LexicalSimilarity, SimilarityService};
use crate::snapshot::SnapshotSource;
use crate::{Assertion, Definition, Predicate};
use chrono::Local;
use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

/// Run context.
///
/// This holds the environment a verification run is performed in.
#[derive(Debug, Clone)]
pub struct Context {
    /// Package of the app under test. Screens compare only this package's
    /// leaves (plus installer overlays); `None` compares every leaf.
    pub app_package: Option<String>,
    /// Label prefixed to every log line of the run, e.g. a bug report id.
    pub label: String,
}

impl Default for Context {
    fn default() -> Self {
        Self { app_package: None, label: "run".to_string() }
    }
}

/// Options that affect parsing and evaluation.
#[derive(Clone)]
pub struct Options {
    /// Threshold used by `text_similar` when the predicate does not pass one.
    pub similarity_threshold: f64,
    /// Resource ids whose presence means a soft keyboard is shown.
    pub keyboard_ids: Vec<String>,
    /// Packages whose leaves count toward every screen fingerprint.
    pub installer_packages: Vec<String>,
    /// Operators available to assertions.
    pub operators: OperatorSet,
    pub similarity: Rc<dyn SimilarityService>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            keyboard_ids: vec![
                "com.google.android.inputmethod.latin:id/keyboard_holder".to_string(),
                "com.android.inputmethod.latin:id/keyboard_view".to_string(),
            ],
            installer_packages: INSTALLER_PACKAGES.iter().map(|s| s.to_string()).collect(),
            operators: OperatorSet::default(),
            similarity: Rc::new(LexicalSimilarity),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("similarity_threshold", &self.similarity_threshold)
            .field("keyboard_ids", &self.keyboard_ids)
            .field("installer_packages", &self.installer_packages)
            .field("operators", &self.operators.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

// --- Report -----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClauseKind {
    Definition,
    Predicate,
}

/// What happened to one clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Definition bound to a well-formed entity.
    Valid,
    /// Definition could not be satisfied; the run stops here.
    Invalid,
    True,
    False,
    /// Not reached because an earlier definition was invalid.
    Skipped,
}

impl Outcome {
    pub fn is_failure(self) -> bool {
        matches!(self, Outcome::Invalid | Outcome::False)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Valid => "valid",
            Outcome::Invalid => "invalid",
            Outcome::True => "true",
            Outcome::False => "false",
            Outcome::Skipped => "skipped",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Normalized clause text.
    pub clause: String,
    pub kind: ClauseKind,
    pub outcome: Outcome,
    pub reason: String,
}

impl Diagnostic {
    fn definition(def: &Definition, outcome: Outcome, reason: impl Into<String>) -> Self {
        Self { clause: def.to_string(), kind: ClauseKind::Definition, outcome, reason: reason.into() }
    }

    fn predicate(pred: &Predicate, outcome: Outcome, reason: impl Into<String>) -> Self {
        Self { clause: pred.to_string(), kind: ClauseKind::Predicate, outcome, reason: reason.into() }
    }
}

/// Result from [`verify`] and [`verify_with`].
///
/// Definitions are listed in declaration order, followed by predicates in
/// the order they were evaluated.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub label: String,
    /// The assertion as parsed, in normalized form.
    pub assertion: String,
    pub verdict: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub metrics: RunMetrics,
    /// RFC 3339 local time the run finished.
    pub finished_at: String,
}

impl RunReport {
    /// Diagnostics that made the verdict false.
    pub fn failures(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.outcome.is_failure())
    }
}

// --- Entry points -----------------------------------------------------------

/// Parse `text` against the default operator registry.
///
/// # Example
/// ```
/// use repro_recognizer::parse_assertion;
///
/// let assertion = parse_assertion("d = Device() AND audio_on(d)").unwrap();
/// assert_eq!(assertion.to_string(), "d = Device() AND audio_on(d)");
/// ```
pub fn parse_assertion(text: &str) -> Result<Assertion> {
    parse_assertion_with(text, &Options::default())
}

/// Parse `text` against the operators in `options`.
pub fn parse_assertion_with(text: &str, options: &Options) -> Result<Assertion> {
    engine::parse(text, &options.operators)
}

/// Verify `text` against `source` with a default [`Context`] and [`Options`].
pub fn verify(text: &str, source: &dyn SnapshotSource) -> Result<RunReport> {
    verify_with(text, source, &Context::default(), &Options::default())
}

/// Parse, populate, validate and evaluate one assertion.
///
/// Errors abort the run: malformed text, unknown names, missing snapshot
/// history, operand type mismatches. An unsatisfiable definition or a false
/// predicate is an ordinary `false` verdict.
pub fn verify_with(
    text: &str,
    source: &dyn SnapshotSource,
    context: &Context,
    options: &Options,
) -> Result<RunReport> {
    let started = Instant::now();
    let label = context.label.as_str();
    let mut metrics = RunMetrics::default();

    let assertion = parse_assertion_with(text, options)?;
    metrics.parse = started.elapsed();

    let mut diagnostics = Vec::new();
    let populate_started = Instant::now();
    let satisfiable = populate_all(&assertion, source, context, &mut diagnostics, &mut metrics)?;
    metrics.populate = populate_started.elapsed();

    let verdict = match satisfiable {
        Some(bindings) => {
            let evaluate_started = Instant::now();
            let all_true = evaluate_all(&assertion, &bindings, context, options, &mut diagnostics, &mut metrics)?;
            metrics.evaluate = evaluate_started.elapsed();
            all_true
        }
        None => {
            diagnostics.extend(assertion.predicates().map(|p| Diagnostic::predicate(p, Outcome::Skipped, "")));
            false
        }
    };

    metrics.total = started.elapsed();
    info!("[{label}] verdict {verdict} in {:?} ({} snapshot requests)", metrics.total, metrics.snapshot_requests);
    Ok(RunReport {
        label: context.label.clone(),
        assertion: assertion.to_string(),
        verdict,
        diagnostics,
        metrics,
        finished_at: Local::now().to_rfc3339(),
    })
}

/// Bind every definition in declaration order. Stops at the first invalid
/// one and returns `None`; the rest are reported as skipped.
fn populate_all(
    assertion: &Assertion,
    source: &dyn SnapshotSource,
    context: &Context,
    diagnostics: &mut Vec<Diagnostic>,
    metrics: &mut RunMetrics,
) -> Result<Option<Bindings>> {
    let label = context.label.as_str();
    let mut bindings = Bindings::default();
    let mut definitions = assertion.definitions();
    while let Some(def) = definitions.next() {
        metrics.snapshot_requests += 1;
        let populated = engine::populate(def, source, context)?;
        if let Some(reason) = populated.entity.invalid_reason() {
            info!("[{label}] not satisfiable: `{def}`: {reason}");
            diagnostics.push(Diagnostic::definition(def, Outcome::Invalid, format!("not satisfiable: {reason}")));
            diagnostics.extend(definitions.map(|d| Diagnostic::definition(d, Outcome::Skipped, "")));
            return Ok(None);
        }
        let summary = engine::summarize(def, &populated.entity);
        debug!("[{label}] bound `{def}`: {summary}");
        diagnostics.push(Diagnostic::definition(def, Outcome::Valid, summary));
        bindings.bind(def.name.clone(), populated);
    }
    Ok(Some(bindings))
}

/// Run every predicate in tier order; the result is their conjunction.
fn evaluate_all(
    assertion: &Assertion,
    bindings: &Bindings,
    context: &Context,
    options: &Options,
    diagnostics: &mut Vec<Diagnostic>,
    metrics: &mut RunMetrics,
) -> Result<bool> {
    let label = context.label.as_str();
    let mut all_true = true;
    for pred in engine::schedule(assertion.predicates(), &options.operators) {
        let check = engine::evaluate(pred, bindings, &options.operators, options, options.similarity.as_ref())?;
        metrics.predicates_evaluated += 1;
        debug!("[{label}] `{pred}` is {}: {}", check.holds, check.reason);
        all_true &= check.holds;
        let outcome = if check.holds { Outcome::True } else { Outcome::False };
        diagnostics.push(Diagnostic::predicate(pred, outcome, check.reason));
    }
    Ok(all_true)
}
