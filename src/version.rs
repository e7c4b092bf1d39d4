//! Version parsing, ordering, and bound checks.
//!
//! Installer versions are dotted numbers of any length (`1.2`, `10.0.19041.1`),
//! optionally prefixed with `v`, optionally followed by `-` release labels and
//! `+` build metadata:
//!
//! ```text
//! v1.2.3.4-beta.2+build.77
//! └┬┘└──┬──┘ └──┬──┘ └──┬──┘
//!  │ numbers  labels  metadata (ignored when ordering)
//!  prefix
//! ```
//!
//! Parsing is strict. A bound that cannot be parsed is an error, never
//! "no constraint".

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::{Error, Result};

// ============================================================================
// Version
// ============================================================================

/// A parsed version with a total order.
///
/// Missing numeric parts count as zero, so `1.0` and `1.0.0.0` are equal.
/// A version with release labels sorts before the same numbers without.
#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    numbers: SmallVec<[u32; 4]>,
    labels: Vec<Label>,
    metadata: Option<String>,
}

#[derive(Debug, Clone)]
enum Label {
    Number(u32),
    Text(String),
}

impl Version {
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidVersion {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        let body = text
            .strip_prefix('v')
            .or_else(|| text.strip_prefix('V'))
            .unwrap_or(text);
        if body.is_empty() {
            return Err(invalid("empty version"));
        }

        let (body, metadata) = match body.split_once('+') {
            Some((_, "")) => return Err(invalid("empty build metadata")),
            Some((body, meta)) => (body, Some(meta.to_string())),
            None => (body, None),
        };
        let (numbers_text, labels_text) = match body.split_once('-') {
            Some((_, "")) => return Err(invalid("empty release label")),
            Some((numbers, labels)) => (numbers, Some(labels)),
            None => (body, None),
        };

        let mut numbers = SmallVec::new();
        for part in numbers_text.split('.') {
            if part.is_empty() {
                return Err(invalid("empty version part"));
            }
            if !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(&format!("\"{part}\" is not a number")));
            }
            let n = part
                .parse::<u32>()
                .map_err(|_| invalid(&format!("\"{part}\" is out of range")))?;
            numbers.push(n);
        }

        let mut labels = Vec::new();
        if let Some(labels_text) = labels_text {
            for part in labels_text.split('.') {
                if part.is_empty() {
                    return Err(invalid("empty release label"));
                }
                if !part.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
                    return Err(invalid(&format!("\"{part}\" is not a valid release label")));
                }
                let label = match part.parse::<u32>() {
                    Ok(n) if part.bytes().all(|b| b.is_ascii_digit()) => Label::Number(n),
                    _ => Label::Text(part.to_string()),
                };
                labels.push(label);
            }
        }

        Ok(Self { text: text.to_string(), numbers, labels, metadata })
    }

    /// The text this version was parsed from.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }

    pub fn is_prerelease(&self) -> bool {
        !self.labels.is_empty()
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.numbers.len().max(other.numbers.len());
        for i in 0..len {
            let a = self.numbers.get(i).copied().unwrap_or(0);
            let b = other.numbers.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }

        match (self.labels.is_empty(), other.labels.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        for (a, b) in self.labels.iter().zip(&other.labels) {
            match a.cmp(b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.labels.len().cmp(&other.labels.len())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Label {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Label::Number(a), Label::Number(b)) => a.cmp(b),
            (Label::Number(_), Label::Text(_)) => Ordering::Less,
            (Label::Text(_), Label::Number(_)) => Ordering::Greater,
            (Label::Text(a), Label::Text(b)) => a
                .bytes()
                .map(|c| c.to_ascii_lowercase())
                .cmp(b.bytes().map(|c| c.to_ascii_lowercase())),
        }
    }
}

// ============================================================================
// Bounds
// ============================================================================

/// Which side of a range a bound sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Min,
    Max,
}

/// One side of a version range, still in text form.
///
/// `None` and `Some("")` both mean "no constraint".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionBound<'a> {
    pub kind: BoundKind,
    pub text: Option<&'a str>,
    pub inclusive: bool,
}

impl<'a> VersionBound<'a> {
    pub fn min(text: Option<&'a str>, inclusive: bool) -> Self {
        Self { kind: BoundKind::Min, text, inclusive }
    }

    pub fn max(text: Option<&'a str>, inclusive: bool) -> Self {
        Self { kind: BoundKind::Max, text, inclusive }
    }

    pub fn is_unbounded(&self) -> bool {
        self.text.is_none_or(str::is_empty)
    }

    /// Whether `recorded` lies on the allowed side of this bound.
    ///
    /// Fails only when the bound text does not parse.
    pub fn is_satisfied_by(&self, recorded: &Version) -> Result<bool> {
        let Some(text) = self.text.filter(|t| !t.is_empty()) else {
            return Ok(true);
        };
        let bound = Version::parse(text)?;
        let ord = recorded.cmp(&bound);
        Ok(match (self.kind, self.inclusive) {
            (BoundKind::Min, true) => ord != Ordering::Less,
            (BoundKind::Min, false) => ord == Ordering::Greater,
            (BoundKind::Max, true) => ord != Ordering::Greater,
            (BoundKind::Max, false) => ord == Ordering::Less,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
