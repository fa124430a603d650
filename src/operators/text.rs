//! Fuzzy text comparison.

use crate::engine::{Call, Check, Value};
use crate::entity::Entity;
use crate::error::Result;

/// Texts an operand stands for: a widget's textual representation, every
/// leaf text of a screen, or a single string.
fn sources(call: &Call<'_>, i: usize) -> Result<Vec<String>> {
    match &call.args[i] {
        Value::Entity(Entity::Widget(w)) => Ok(w.view().map(|v| v.texts.clone()).unwrap_or_default()),
        Value::Entity(Entity::Screen(s)) => Ok(s
            .hierarchy()
            .map(|h| h.leaves().map(|(_, n)| n.text().trim().to_string()).filter(|t| !t.is_empty()).collect())
            .unwrap_or_default()),
        Value::Str(text) => Ok(vec![text.to_string()]),
        Value::Missing(_) => Ok(Vec::new()),
        other => Err(call.mismatch(format!("{} is {}, expected text", call.label(i), other.type_name()))),
    }
}

fn threshold(call: &Call<'_>) -> Result<f64> {
    let Some(arg) = call.args.get(2) else {
        return Ok(call.options.similarity_threshold);
    };
    match arg.as_number() {
        Some(t) if (0.0..=1.0).contains(&t) => Ok(t),
        _ => Err(call.mismatch(format!("threshold {arg}, expected a number between 0 and 1"))),
    }
}

/// Best similarity between any text of operand 0 and any text of operand 1.
pub(super) fn text_similar(call: &Call<'_>) -> Result<Check> {
    let threshold = threshold(call)?;
    let (left, right) = (sources(call, 0)?, sources(call, 1)?);
    let best = left
        .iter()
        .flat_map(|a| right.iter().map(move |b| (a, b)))
        .map(|(a, b)| (call.similarity.similarity(a, b), a, b))
        .max_by(|x, y| x.0.total_cmp(&y.0));
    let Some((score, a, b)) = best else {
        return Ok(Check::fail(format!("{} or {} has no text", call.label(0), call.label(1))));
    };
    let holds = score >= threshold;
    let relation = if holds { ">=" } else { "<" };
    Ok(Check::new(holds, format!("{a:?} ~ {b:?} scored {score:.2} {relation} {threshold:.2}")))
}
