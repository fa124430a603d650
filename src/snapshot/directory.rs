//! Snapshots stored on disk by a capture tool.
//!
//! ```text
//! <root>/
//!   view_hierarchy/20261018T101112123.xml
//!   view_hierarchy/20261018T101530004.xml   <- current layout
//!   device_info/20261018T101112125.json
//!   device_info/20261018T101530010.json     <- current device facts
//! ```
//!
//! Files are ordered by name; the file stem is the snapshot id.

use super::{SnapshotSource, pick};
use crate::entity::{Device, Screen};
use crate::error::{Result, SnapshotKind};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

const LAYOUT_DIR: &str = "view_hierarchy";
const DEVICE_DIR: &str = "device_info";

#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a layout dump as the new current layout.
    pub fn record_layout(&self, xml: &str) -> Result<PathBuf> {
        self.record(LAYOUT_DIR, "xml", xml)
    }

    /// Store device facts as the new current device info.
    pub fn record_device_info(&self, device: &Device) -> Result<PathBuf> {
        self.record(DEVICE_DIR, "json", &device.to_json()?)
    }

    fn record(&self, dir: &str, extension: &str, contents: &str) -> Result<PathBuf> {
        let dir = self.root.join(dir);
        fs::create_dir_all(&dir)?;
        let stamp = Local::now().format("%Y%m%dT%H%M%S%3f").to_string();
        let mut path = dir.join(format!("{stamp}.{extension}"));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{stamp}_{n:03}.{extension}"));
            n += 1;
        }
        fs::write(&path, contents)?;
        log::debug!("recorded snapshot {}", path.display());
        Ok(path)
    }

    /// Snapshot files of one stream, oldest first. A missing directory holds
    /// no snapshots.
    fn listing(&self, dir: &str, extension: &str) -> Result<Vec<PathBuf>> {
        let dir = self.root.join(dir);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == extension) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

impl SnapshotSource for DirectorySource {
    fn layout(&self, previous: bool) -> Result<Screen> {
        let files = self.listing(LAYOUT_DIR, "xml")?;
        let path = &files[pick(SnapshotKind::Layout, files.len(), previous)?];
        let xml = fs::read_to_string(path)?;
        Ok(Screen::from_xml(stem(path), &xml))
    }

    fn device_info(&self, previous: bool) -> Result<Device> {
        let files = self.listing(DEVICE_DIR, "json")?;
        let path = &files[pick(SnapshotKind::DeviceInfo, files.len(), previous)?];
        let json = fs::read_to_string(path)?;
        Device::from_json(stem(path), &json)
    }
}
