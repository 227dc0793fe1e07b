//! Typed addresses into a document tree.
//!
//! A path is a sequence of object keys and list indices. The dot-delimited
//! string form (`items.0.title`) only exists at serialization boundaries;
//! everything inside the crate works with [`PathSegment`]s so a numeric
//! object key and a list index can never be confused.

use crate::Document;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member name
    Key(String),
    /// Zero-based list position
    Index(usize),
}

impl PathSegment {
    /// Parse a single segment of the string form.
    ///
    /// All-digit segments become indices, everything else is a key.
    fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = raw.parse() {
                return PathSegment::Index(index);
            }
        }
        PathSegment::Key(raw.to_string())
    }

    /// The object key this segment addresses when applied to an object.
    ///
    /// An index used against an object addresses the member named by its
    /// decimal form.
    pub fn to_key(&self) -> String {
        match self {
            PathSegment::Key(key) => key.clone(),
            PathSegment::Index(index) => index.to_string(),
        }
    }

    fn step<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match (value, self) {
            (Value::Object(map), PathSegment::Key(key)) => map.get(key),
            (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
            (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
            _ => None,
        }
    }

    fn step_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        match (value, self) {
            (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key),
            (Value::Object(map), PathSegment::Index(index)) => map.get_mut(&index.to_string()),
            (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
            _ => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Ordered sequence of segments locating a value inside a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path (addresses the tree it is resolved against).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A new path extended by an object key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.0.push(PathSegment::Key(key.into()));
        next
    }

    /// A new path extended by a list index.
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.0.push(PathSegment::Index(index));
        next
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// Follow this path from `value`. `None` if any segment is missing.
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(value, |current, segment| segment.step(current))
    }

    pub fn resolve_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        self.0
            .iter()
            .try_fold(value, |current, segment| segment.step_mut(current))
    }

    /// Follow this path from the top level of a document.
    pub fn lookup_mut<'a>(&self, document: &'a mut Document) -> Option<&'a mut Value> {
        let (first, rest) = self.0.split_first()?;
        let start = document.get_mut(&first.to_key())?;
        rest.iter()
            .try_fold(start, |current, segment| segment.step_mut(current))
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        Ok(Self(s.split('.').map(PathSegment::parse).collect()))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(FieldPath::from_str(&raw).unwrap_or_default())
    }
}
