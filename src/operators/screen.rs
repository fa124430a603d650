//! Screen and widget operators.

use super::{screen, widget};
use crate::engine::{Call, Check};
use crate::error::Result;

/// Strict containment of the widget's bounds in the screen's bounds, and the
/// widget's node must be part of that screen's hierarchy.
pub(super) fn in_screen(call: &Call<'_>) -> Result<Check> {
    let (w, s) = (widget(call, 0)?, screen(call, 1)?);
    let (Some(view), Some(hierarchy)) = (w.view(), s.hierarchy()) else {
        return Ok(Check::fail("widget or screen is not resolved"));
    };
    let Some(inner) = view.bounds else {
        return Ok(Check::fail(format!("{} has malformed bounds `{}`", call.label(0), view.node.attr("bounds"))));
    };
    let outer = match hierarchy.screen_bounds() {
        Ok(outer) => outer,
        Err(err) => return Ok(Check::fail(format!("screen {} has no usable bounds: {err}", s.id))),
    };
    if !outer.contains(&inner) {
        return Ok(Check::fail(format!("{inner} is not strictly inside {outer}")));
    }
    if !hierarchy.contains_node(&view.node) {
        return Ok(Check::fail(format!("{} is not part of screen {}", view.path, s.id)));
    }
    Ok(Check::new(true, format!("{inner} lies inside {outer}")))
}

pub(super) fn keyboard_on(call: &Call<'_>) -> Result<Check> {
    let s = screen(call, 0)?;
    Ok(if s.keyboard_on(&call.options.keyboard_ids) {
        Check::new(true, format!("keyboard is shown on screen {}", s.id))
    } else {
        Check::fail(format!("no keyboard on screen {}", s.id))
    })
}

pub(super) fn same_screen(call: &Call<'_>) -> Result<Check> {
    screen_identity(call, true)
}

pub(super) fn different_screen(call: &Call<'_>) -> Result<Check> {
    screen_identity(call, false)
}

fn screen_identity(call: &Call<'_>, want_same: bool) -> Result<Check> {
    let (a, b) = (screen(call, 0)?, screen(call, 1)?);
    let overlays = &call.options.installer_packages;
    let (Some(fa), Some(fb)) = (a.fingerprint(overlays), b.fingerprint(overlays)) else {
        return Ok(Check::fail("an unreadable screen has no fingerprint"));
    };
    let same = fa == fb;
    let short = |f: &crate::layout::Fingerprint| f.as_str().chars().take(12).collect::<String>();
    let reason = if same {
        format!("{} and {} share fingerprint {}", a.id, b.id, short(&fa))
    } else {
        format!("{} ({}) differs from {} ({})", a.id, short(&fa), b.id, short(&fb))
    };
    Ok(Check::new(same == want_same, reason))
}

pub(super) fn is_checked(call: &Call<'_>) -> Result<Check> {
    widget_flag(call, "checked")
}

pub(super) fn is_enabled(call: &Call<'_>) -> Result<Check> {
    widget_flag(call, "enabled")
}

fn widget_flag(call: &Call<'_>, flag: &str) -> Result<Check> {
    let w = widget(call, 0)?;
    let Some(view) = w.view() else {
        return Ok(Check::fail("widget is not resolved"));
    };
    let on = view.node.flag(flag);
    let state = if on { flag.to_string() } else { format!("not {flag}") };
    Ok(Check::new(on, format!("{} is {state}", view.description)))
}
