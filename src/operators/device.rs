//! Device-fact operators.

use super::{device, text};
use crate::engine::{Call, Check, Value};
use crate::entity::Entity;
use crate::error::Result;
use regex::Regex;

/// Log text of operand 0: a Device or a string such as `d.log`.
fn log<'c>(call: &'c Call<'_>) -> Result<Option<&'c str>> {
    match &call.args[0] {
        Value::Entity(Entity::Device(d)) => Ok(Some(d.log.as_str())),
        _ => text(call, 0),
    }
}

pub(super) fn log_contains(call: &Call<'_>) -> Result<Check> {
    let (Some(log), Some(needle)) = (log(call)?, text(call, 1)?) else {
        return Ok(Check::fail(format!("{} was not captured", call.label(0))));
    };
    Ok(match log.find(needle) {
        Some(at) => Check::new(true, format!("log line matches: {}", line_at(log, at))),
        None => Check::fail(format!("log does not contain {needle:?}")),
    })
}

/// Regex search over the log. A pattern that does not compile is a false
/// check with the compiler's message, not a run error.
pub(super) fn log_matches(call: &Call<'_>) -> Result<Check> {
    let (Some(log), Some(pattern)) = (log(call)?, text(call, 1)?) else {
        return Ok(Check::fail(format!("{} was not captured", call.label(0))));
    };
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => return Ok(Check::fail(format!("pattern {pattern:?} does not compile: {err}"))),
    };
    Ok(match re.find(log) {
        Some(m) => Check::new(true, format!("log line matches: {}", line_at(log, m.start()))),
        None => Check::fail(format!("log does not match /{pattern}/")),
    })
}

/// The trimmed log line holding byte `at`.
fn line_at(log: &str, at: usize) -> &str {
    let start = log[..at].rfind('\n').map_or(0, |i| i + 1);
    let end = log[at..].find('\n').map_or(log.len(), |i| at + i);
    log[start..end].trim()
}

pub(super) fn audio_on(call: &Call<'_>) -> Result<Check> {
    let d = device(call, 0)?;
    Ok(match d.audio {
        Some(true) => Check::new(true, "audio is on"),
        Some(false) => Check::fail("audio is off"),
        None => Check::fail("audio state was not captured"),
    })
}

pub(super) fn has_crash(call: &Call<'_>) -> Result<Check> {
    let d = device(call, 0)?;
    Ok(if d.crashed() {
        Check::new(true, "log shows a fatal exception or ANR")
    } else {
        Check::fail("log shows no fatal exception or ANR")
    })
}
