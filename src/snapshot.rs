//! Snapshot sources.
//!
//! A source hands out the current or the previous capture of two streams,
//! UI layouts and device facts. Each request is independent: asking twice
//! yields two equal but separately owned values.
//!
//! ```text
//!             layout(previous)       device_info(previous)
//!                   │                         │
//!   ┌───────────────┼─────────────────────────┼──────────────┐
//!   │ MemorySource  │ in-process lists, last = current       │
//!   │ DirectorySource  view_hierarchy/*.xml, device_info/*.json
//!   │ Retrying<S>   │ re-asks S on transient failures        │
//!   └────────────────────────────────────────────────────────┘
//! ```

use crate::entity::{Device, Screen};
use crate::error::{Error, Result, SnapshotKind};

#[path = "snapshot/directory.rs"]
mod directory;
#[path = "snapshot/memory.rs"]
mod memory;
#[path = "snapshot/retry.rs"]
mod retry;

pub use directory::DirectorySource;
pub use memory::MemorySource;
pub use retry::{RetryPolicy, Retrying};

/// Provider of layout and device-info snapshots.
///
/// `previous == false` asks for the latest capture, `true` for the one
/// before it. A source without enough history answers
/// [`Error::InsufficientHistory`].
pub trait SnapshotSource {
    fn layout(&self, previous: bool) -> Result<Screen>;
    fn device_info(&self, previous: bool) -> Result<Device>;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for &S {
    fn layout(&self, previous: bool) -> Result<Screen> {
        (**self).layout(previous)
    }

    fn device_info(&self, previous: bool) -> Result<Device> {
        (**self).device_info(previous)
    }
}

/// Index of the requested snapshot in a list of `available` captures,
/// oldest first.
fn pick(kind: SnapshotKind, available: usize, previous: bool) -> Result<usize> {
    let requested = if previous { 2 } else { 1 };
    if available < requested {
        return Err(Error::InsufficientHistory { kind, requested, available });
    }
    Ok(available - requested)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_counts_back_from_the_newest() {
        assert_eq!(pick(SnapshotKind::Layout, 3, false).unwrap(), 2);
        assert_eq!(pick(SnapshotKind::Layout, 3, true).unwrap(), 1);
        let err = pick(SnapshotKind::DeviceInfo, 1, true).unwrap_err();
        assert_eq!(err.to_string(), "not enough device info snapshots: 2 requested, 1 available");
    }
}
