//! Database boundary
//!
//! The shim never parses a database itself. It only needs the address
//! ranges ("segments") to fall back to a default current address.

use super::Address;

/// An address range `[start, end)` in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start: Address,
    pub end: Address,
    pub name: Option<String>,
}

impl Segment {
    pub fn new(
        start: Address,
        end: Address,
    ) -> Self {
        Self {
            start,
            end,
            name: None,
        }
    }

    pub fn named(
        start: Address,
        end: Address,
        name: &str,
    ) -> Self {
        Self {
            start,
            end,
            name: Some(name.to_string()),
        }
    }

    pub fn contains(
        &self,
        ea: Address,
    ) -> bool {
        self.start <= ea && ea < self.end
    }
}

/// An opened database
pub trait Database {
    /// All segments, in no particular order
    fn segments(&self) -> Vec<Segment>;
}

/// In-memory segment list
#[derive(Debug, Clone, Default)]
pub struct SegmentTable {
    segments: Vec<Segment>,
}

impl SegmentTable {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn push(
        &mut self,
        segment: Segment,
    ) {
        self.segments.push(segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl Database for SegmentTable {
    fn segments(&self) -> Vec<Segment> {
        self.segments.clone()
    }
}

impl FromIterator<Segment> for SegmentTable {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
