//! Typed comparisons.
//!
//! Numbers compare across integer and decimal forms; strings and booleans
//! only compare with their own type. Comparing, say, a boolean with a number
//! is a mistake in the assertion and aborts the run.

use super::{missing, shown, text};
use crate::engine::{Call, Check, Value};
use crate::error::Result;
use std::cmp::Ordering;

pub(super) fn equal(call: &Call<'_>) -> Result<Check> {
    equality(call, true)
}

pub(super) fn not_equal(call: &Call<'_>) -> Result<Check> {
    equality(call, false)
}

pub(super) fn less_than(call: &Call<'_>) -> Result<Check> {
    ordering(call, "<", Ordering::is_lt)
}

pub(super) fn greater_than(call: &Call<'_>) -> Result<Check> {
    ordering(call, ">", Ordering::is_gt)
}

pub(super) fn less_equal(call: &Call<'_>) -> Result<Check> {
    ordering(call, "<=", Ordering::is_le)
}

pub(super) fn greater_equal(call: &Call<'_>) -> Result<Check> {
    ordering(call, ">=", Ordering::is_ge)
}

/// Substring containment.
pub(super) fn contains(call: &Call<'_>) -> Result<Check> {
    let (Some(haystack), Some(needle)) = (text(call, 0)?, text(call, 1)?) else {
        return Ok(missing(call).unwrap_or_else(|| Check::fail("operand was not captured")));
    };
    let holds = haystack.contains(needle);
    let verb = if holds { "contains" } else { "does not contain" };
    Ok(Check::new(holds, format!("{} {verb} {}", shown(call, 0), shown(call, 1))))
}

fn mismatch_detail(call: &Call<'_>) -> String {
    format!(
        "{} ({}) with {} ({})",
        call.label(0),
        call.args[0].type_name(),
        call.label(1),
        call.args[1].type_name()
    )
}

fn equality(call: &Call<'_>, want_equal: bool) -> Result<Check> {
    if let Some(check) = missing(call) {
        return Ok(check);
    }
    let same = match (&call.args[0], &call.args[1]) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (a, b) => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => return Err(call.mismatch(mismatch_detail(call))),
        },
    };
    let relation = if same { "==" } else { "!=" };
    Ok(Check::new(same == want_equal, format!("{} {relation} {}", shown(call, 0), shown(call, 1))))
}

fn ordering(call: &Call<'_>, symbol: &str, accept: fn(Ordering) -> bool) -> Result<Check> {
    if let Some(check) = missing(call) {
        return Ok(check);
    }
    let (Some(x), Some(y)) = (call.args[0].as_number(), call.args[1].as_number()) else {
        return Err(call.mismatch(mismatch_detail(call)));
    };
    let holds = x.partial_cmp(&y).is_some_and(accept);
    let relation = if holds { symbol.to_string() } else { format!("is not {symbol}") };
    Ok(Check::new(holds, format!("{} {relation} {}", shown(call, 0), shown(call, 1))))
}

#[cfg(test)]
mod tests {
    use crate::entity::{Device, Orientation};
    use crate::error::Error;
    use crate::operators::testing::{check, with_devices};

    fn devices() -> crate::snapshot::MemorySource {
        with_devices(&[
            Device { id: "before".into(), volume: Some(7), ..Device::default() },
            Device {
                id: "after".into(),
                volume: Some(3),
                orientation: Some(Orientation::Left),
                log: "I/App: saved draft".into(),
                ..Device::default()
            },
        ])
    }

    #[test]
    fn numeric_ordering_across_snapshots() {
        let source = devices();
        let lt = check("d1 = Device() AND d = Device() AND less_than(d.volume, d1.volume)", &source).unwrap();
        assert!(lt.holds);
        assert_eq!(lt.reason, "d.volume (3) < d1.volume (7)");

        let ge = check("d = Device() AND greater_equal(d.volume, 3.5)", &source).unwrap();
        assert!(!ge.holds);
        assert_eq!(ge.reason, "d.volume (3) is not >= 3.5");

        assert!(check("d = Device() AND less_equal(d.volume, 3)", &source).unwrap().holds);
        assert!(check("d = Device() AND greater_than(7, d.volume)", &source).unwrap().holds);
    }

    #[test]
    fn equality_is_typed() {
        let source = devices();
        assert!(check(r#"d = Device() AND equal(d.orientation, "left")"#, &source).unwrap().holds);
        assert!(check(r#"d = Device() AND not_equal(d.orientation, "natural")"#, &source).unwrap().holds);
        assert!(check("d = Device() AND equal(d.volume, 3.0)", &source).unwrap().holds);
        assert!(check("d = Device() AND equal(d.crash, false)", &source).unwrap().holds);

        let err = check(r#"d = Device() AND equal(d.volume, "3")"#, &source).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { ref operator, .. } if operator == "equal"));
        assert!(check(r#"d = Device() AND less_than(d.orientation, 3)"#, &source).is_err());
    }

    #[test]
    fn uncaptured_facts_make_comparisons_false() {
        let source = devices();
        let result = check("d = Device() AND equal(d.audio, true)", &source).unwrap();
        assert!(!result.holds);
        assert_eq!(result.reason, "d.audio was not captured");
        assert!(!check("d = Device() AND not_equal(d.audio, true)", &source).unwrap().holds);
    }

    #[test]
    fn substring_containment() {
        let source = devices();
        let result = check(r#"d = Device() AND contains(d.log, "saved")"#, &source).unwrap();
        assert!(result.holds);
        assert!(!check(r#"d = Device() AND contains(d.log, "deleted")"#, &source).unwrap().holds);
        assert!(check(r#"d = Device() AND contains(d.volume, "3")"#, &source).is_err());
    }
}
