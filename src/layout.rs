//! UI-hierarchy handling: tree, geometry, canonical hashing, text extraction
//! and node classification.
//!
//! Everything here is pure and works on an owned [`Hierarchy`]; entities and
//! operators build on these helpers rather than on raw XML.

pub mod canonical;
pub mod classify;
pub mod geometry;
pub mod hierarchy;
pub mod text;

pub use canonical::{Fingerprint, INSTALLER_PACKAGES, fingerprint};
pub use classify::{NodeTraits, WidgetKind};
pub use geometry::Bounds;
pub use hierarchy::{Hierarchy, NodeId, ViewNode};
