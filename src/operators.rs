//! Built-in predicate operators.
//!
//! Operators are grouped by what they inspect:
//!
//! - `relational.rs`: typed comparisons on literals and entity fields.
//! - `device.rs`: device facts (log, audio, crash markers).
//! - `screen.rs`: containment, keyboard presence, screen identity, widget state.
//! - `text.rs`: fuzzy text similarity through the configured
//!   [`crate::SimilarityService`].
//!
//! Every operator has the same shape: it receives a [`Call`] with already
//! resolved operand values and returns a [`Check`] (truth value plus a reason
//! for the report). Operand combinations an operator cannot interpret are a
//! [`crate::Error::TypeMismatch`]; facts a snapshot did not capture make the
//! check false instead.

mod device;
mod relational;
mod screen;
mod text;

use crate::engine::{Call, Check, OpFlags, Operator, Value};
use crate::entity::{Device, Entity, Screen, Widget};
use crate::error::Result;

/// The default registry contents.
pub(crate) fn builtin() -> Vec<Operator> {
    vec![
        operator! { name: "in_screen", arity: 2, flags: OpFlags::STRUCTURAL, eval: screen::in_screen },
        operator! { name: "equal", arity: 2, eval: relational::equal },
        operator! { name: "not_equal", arity: 2, eval: relational::not_equal },
        operator! { name: "less_than", arity: 2, eval: relational::less_than },
        operator! { name: "greater_than", arity: 2, eval: relational::greater_than },
        operator! { name: "less_equal", arity: 2, eval: relational::less_equal },
        operator! { name: "greater_equal", arity: 2, eval: relational::greater_equal },
        operator! { name: "contains", arity: 2, eval: relational::contains },
        operator! { name: "log_contains", arity: 2, eval: device::log_contains },
        operator! { name: "log_matches", arity: 2, eval: device::log_matches },
        operator! { name: "audio_on", arity: 1, eval: device::audio_on },
        operator! { name: "has_crash", arity: 1, eval: device::has_crash },
        operator! { name: "keyboard_on", arity: 1, eval: screen::keyboard_on },
        operator! { name: "same_screen", arity: 2, eval: screen::same_screen },
        operator! { name: "different_screen", arity: 2, eval: screen::different_screen },
        operator! { name: "is_checked", arity: 1, eval: screen::is_checked },
        operator! { name: "is_enabled", arity: 1, eval: screen::is_enabled },
        operator! { name: "text_similar", arity: 2..=3, eval: text::text_similar },
    ]
}

// --- Operand helpers ---------------------------------------------------------

fn device<'a>(call: &Call<'a>, i: usize) -> Result<&'a Device> {
    match call.args[i] {
        Value::Entity(Entity::Device(device)) => Ok(device),
        ref other => Err(call.mismatch(format!("{} is {}, expected a Device", call.label(i), other.type_name()))),
    }
}

fn screen<'a>(call: &Call<'a>, i: usize) -> Result<&'a Screen> {
    match call.args[i] {
        Value::Entity(Entity::Screen(screen)) => Ok(screen.as_ref()),
        ref other => Err(call.mismatch(format!("{} is {}, expected a Screen", call.label(i), other.type_name()))),
    }
}

fn widget<'a>(call: &Call<'a>, i: usize) -> Result<&'a Widget> {
    match call.args[i] {
        Value::Entity(Entity::Widget(widget)) => Ok(widget),
        ref other => Err(call.mismatch(format!("{} is {}, expected a Widget", call.label(i), other.type_name()))),
    }
}

/// `d.volume (3)` for operands read from entities, `3` for literals.
fn shown(call: &Call<'_>, i: usize) -> String {
    match call.operands.get(i) {
        Some(crate::Operand::Literal(_)) | None => call.args[i].to_string(),
        Some(operand) => format!("{operand} ({})", call.args[i]),
    }
}

/// The first operand that reads an uncaptured fact, as a failing check.
fn missing(call: &Call<'_>) -> Option<Check> {
    call.args.iter().find_map(|arg| match arg {
        Value::Missing(what) => Some(Check::fail(what.clone())),
        _ => None,
    })
}

/// A string operand; `Ok(None)` when it reads a fact that was not captured.
fn text<'c>(call: &'c Call<'_>, i: usize) -> Result<Option<&'c str>> {
    match &call.args[i] {
        Value::Str(s) => Ok(Some(s.as_ref())),
        Value::Missing(_) => Ok(None),
        other => Err(call.mismatch(format!("{} is {}, expected a string", call.label(i), other.type_name()))),
    }
}
