//! Canonical screen fingerprints.
//!
//! Two captures of the "same" screen rarely serialize identically: clocks
//! tick, input fields hold whatever was typed, toggles flip, focus moves and
//! system bars overlap differently. The canonical form keeps only what
//! identifies the screen:
//!
//! 1. leaf nodes of the app package (plus installer/permission overlays),
//! 2. with text blanked for inputs, toggles and clock-like strings,
//! 3. without `checked`, `selected`, `focused` and `bounds`,
//! 4. each serialized with sorted attribute keys, then sorted and joined.
//!
//! The joined string is hashed with SHA-256. Sorting in step 4 makes the
//! fingerprint independent of document order.

use super::classify::{is_editable, is_switch};
use super::hierarchy::{Hierarchy, ViewNode};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// System packages whose dialogs count as part of the app's screen.
pub const INSTALLER_PACKAGES: &[&str] = &[
    "com.google.android.packageinstaller",
    "com.android.packageinstaller",
    "com.google.android.permissioncontroller",
];

const VOLATILE_ATTRIBUTES: &[&str] = &["checked", "selected", "focused", "bounds"];

/// Hex SHA-256 of a screen's canonical string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text that changes on its own, like `9:41`, `12:05 PM` or `3:07am`.
fn displays_time_of_day(text: &str) -> bool {
    regex!(r"^(1[0-2]|0?[1-9]):[0-5][0-9] ?([AaPp][Mm])?").is_match(text)
}

fn clean_node(node: &ViewNode) -> String {
    let blank_text = is_editable(node) || is_switch(node) || displays_time_of_day(node.text());
    let fields: Vec<String> = node
        .attrs
        .iter()
        .filter(|(key, _)| !VOLATILE_ATTRIBUTES.contains(&key.as_str()))
        .map(|(key, value)| {
            let value = if key == "text" && blank_text { "" } else { value.as_str() };
            format!("{key:?}: {value:?}")
        })
        .collect();
    format!("{{{}}}", fields.join(", "))
}

/// Joined, sorted serialization of the participating leaves.
///
/// With `package = None` every leaf participates; otherwise only leaves of
/// `package` or one of `overlays`.
pub fn canonical_string(hierarchy: &Hierarchy, package: Option<&str>, overlays: &[String]) -> String {
    let participates = |node: &ViewNode| match package {
        None => true,
        Some(pkg) => node.package() == pkg || overlays.iter().any(|o| node.package() == o),
    };
    let mut views: Vec<String> =
        hierarchy.leaves().map(|(_, n)| n).filter(|n| participates(n)).map(clean_node).collect();
    views.sort();
    views.join(" ")
}

pub fn fingerprint(hierarchy: &Hierarchy, package: Option<&str>, overlays: &[String]) -> Fingerprint {
    let canonical = canonical_string(hierarchy, package, overlays);
    Fingerprint(format!("{:x}", Sha256::digest(canonical.as_bytes())))
}
