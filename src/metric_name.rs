//! Dotted metric names with wildcard segments.
//!
//! Mackerel groups per-instance metrics (disks, interfaces, filesystems) under
//! names such as `disk.*.reads.delta`. A [`MetricName`] is such a name parsed
//! into [`Segment`]s, and carries the three operations the graph builder needs:
//! matching a concrete name, generalizing into a wildcard pattern, and binding
//! a short graph-name prefix onto a longer metric name.

use std::fmt;

use crate::error::TelemetryError;

/// Separator between segments of a metric name.
pub const SEPARATOR: char = '.';

/// One `.`-delimited token of a metric name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Any other token, compared byte for byte.
    Literal(String),
    /// `*`: any single segment.
    Any,
    /// `#`: any single segment standing for an instance id.
    ///
    /// Matches exactly like [`Segment::Any`], but a trailing `#` is already the
    /// most general form of its position and is never generalized further.
    Id,
}

impl Segment {
    /// Parse one token; `*` and `#` become wildcards.
    pub fn parse(token: &str) -> Self {
        match token {
            "*" => Segment::Any,
            "#" => Segment::Id,
            other => Segment::Literal(other.to_string()),
        }
    }

    /// Whether this is `*` or `#`.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Any | Segment::Id)
    }

    /// Whether this pattern segment accepts `value` at its position.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Segment::Any | Segment::Id => true,
            Segment::Literal(literal) => literal == value,
        }
    }

    /// Token text as it appears in a dotted name.
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Literal(literal) => literal,
            Segment::Any => "*",
            Segment::Id => "#",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric name or pattern: one or more segments.
///
/// Parsing never fails and is lossless: the empty string is a single empty
/// segment, and doubled or edge dots produce empty literal segments, so
/// `MetricName::parse(s).to_string() == s` for every `s`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricName {
    segments: Vec<Segment>,
}

impl MetricName {
    /// Split `name` on `.` into segments.
    pub fn parse(name: &str) -> Self {
        Self {
            segments: name.split(SEPARATOR).map(Segment::parse).collect(),
        }
    }

    /// Segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments. Always at least one.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the name parsed from the empty string.
    pub fn is_blank(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::Literal(s)] if s.is_empty())
    }

    /// Whether any segment is `*` or `#`.
    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(Segment::is_wildcard)
    }

    /// Whether the concrete `name` matches this pattern.
    ///
    /// Segment counts must be equal; wildcards stand for exactly one segment.
    pub fn matches(&self, name: &str) -> bool {
        let values: Vec<&str> = name.split(SEPARATOR).collect();
        self.matches_segments(&values)
    }

    fn matches_segments(&self, values: &[&str]) -> bool {
        self.segments.len() == values.len()
            && self
                .segments
                .iter()
                .zip(values)
                .all(|(segment, value)| segment.matches(value))
    }

    /// Abstract the trailing segment into `*`.
    ///
    /// Names that already contain `*`, end in `#`, or are empty come back
    /// unchanged, which makes the operation idempotent.
    pub fn generalize(&self) -> MetricName {
        let already_general = self.is_blank()
            || self.segments.contains(&Segment::Any)
            || self.segments.last() == Some(&Segment::Id);
        if already_general {
            return self.clone();
        }

        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            *last = Segment::Any;
        }
        MetricName { segments }
    }

    /// Overlay this prefix onto the leading segments of `full`.
    ///
    /// The prefix must not be longer than `full` and must match the leading
    /// segments it replaces. Its own segments, wildcards included, are kept
    /// verbatim; the remaining segments of `full` follow unchanged.
    pub fn bind(&self, full: &str) -> Result<MetricName, TelemetryError> {
        let values: Vec<&str> = full.split(SEPARATOR).collect();
        if self.segments.len() > values.len() {
            return Err(TelemetryError::mismatch(self.to_string(), full));
        }

        let (head, tail) = values.split_at(self.segments.len());
        if !self.matches_segments(head) {
            return Err(TelemetryError::mismatch(self.to_string(), head.join(".")));
        }

        let segments = self
            .segments
            .iter()
            .cloned()
            .chain(tail.iter().map(|value| Segment::parse(value)))
            .collect();
        Ok(MetricName { segments })
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            f.write_str(segment.as_str())?;
        }
        Ok(())
    }
}

impl From<&str> for MetricName {
    fn from(name: &str) -> Self {
        MetricName::parse(name)
    }
}

/// Whether `name` matches `pattern`. See [`MetricName::matches`].
pub fn matches(pattern: &str, name: &str) -> bool {
    MetricName::parse(pattern).matches(name)
}

/// Generalize `name` into a one-level wildcard pattern. See [`MetricName::generalize`].
pub fn generalize(name: &str) -> String {
    MetricName::parse(name).generalize().to_string()
}

/// Combine `prefix` with the rest of `full`. See [`MetricName::bind`].
pub fn bind(prefix: &str, full: &str) -> Result<String, TelemetryError> {
    MetricName::parse(prefix)
        .bind(full)
        .map(|bound| bound.to_string())
}
