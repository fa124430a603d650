//! View bounds as reported by uiautomator: `[x1,y1][x2,y2]`.

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Axis-aligned rectangle, top-left `(x1, y1)` to bottom-right `(x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl Bounds {
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Strict point-in-rectangle test; points on an edge are outside.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        (self.x1 as f64) < x && x < (self.x2 as f64) && (self.y1 as f64) < y && y < (self.y2 as f64)
    }

    /// Strict containment: `inner` must not touch any edge of `self`.
    pub fn contains(&self, inner: &Bounds) -> bool {
        inner.x1 > self.x1 && inner.y1 > self.y1 && inner.x2 < self.x2 && inner.y2 < self.y2
    }

    /// Integer midpoint, truncated toward negative infinity like floor division.
    pub fn center(&self) -> (i64, i64) {
        ((self.x1 + self.x2).div_euclid(2), (self.y1 + self.y2).div_euclid(2))
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }
}

impl FromStr for Bounds {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = regex!(r"^\s*\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]\s*$");
        let malformed = || Error::AmbiguousGeometry { input: s.to_string() };
        let caps = re.captures(s).ok_or_else(malformed)?;
        let mut coords = [0i64; 4];
        for (slot, idx) in coords.iter_mut().zip(1..=4) {
            *slot = caps[idx].parse().map_err(|_| malformed())?;
        }
        let [x1, y1, x2, y2] = coords;
        Ok(Bounds { x1, y1, x2, y2 })
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}][{},{}]", self.x1, self.y1, self.x2, self.y2)
    }
}
