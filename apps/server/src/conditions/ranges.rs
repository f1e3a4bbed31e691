//! Discretized numeric ranges. A value maps to the id of the range that contains it, or -1.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Bound value that leaves a side of a range open.
pub const OPEN_BOUND: i64 = -1;

/// Bucket id of a value no configured range contains.
pub const UNCLASSIFIED: i64 = -1;

/// `[min, max)`, either side may be [`OPEN_BOUND`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub id: i64,
    pub min: i64,
    pub max: i64,
}

impl Range {
    pub const fn new(id: i64, min: i64, max: i64) -> Self {
        Self { id, min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min == OPEN_BOUND || value >= self.min)
            && (self.max == OPEN_BOUND || value < self.max)
    }
}

/// Ordered, immutable list of ranges for one attribute, with display affixes served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCondition {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    pub ranges: Vec<Range>,
}

impl RangeCondition {
    /// Build from interior cut points: `[a, b, c]` yields `<a`, `a..b`, `b..c`, `>=c`.
    pub fn from_cuts(prefix: &str, suffix: &str, cuts: &[i64]) -> Self {
        let mut ranges = Vec::with_capacity(cuts.len() + 1);
        let mut min = OPEN_BOUND;
        for (i, &cut) in cuts.iter().enumerate() {
            ranges.push(Range::new(i as i64, min, cut));
            min = cut;
        }
        ranges.push(Range::new(cuts.len() as i64, min, OPEN_BOUND));
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            ranges,
        }
    }

    pub fn classify(&self, value: i64) -> i64 {
        self.ranges
            .iter()
            .find(|r| r.contains(value))
            .map_or(UNCLASSIFIED, |r| r.id)
    }

    /// Validate a client-supplied bucket id.
    pub fn resolve(&self, id: i64) -> Result<&Range> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.ranges.get(idx))
            .ok_or_else(|| {
                Error::BadInput(format!(
                    "range id {} out of bounds (0..{})",
                    id,
                    self.ranges.len()
                ))
            })
    }

    /// Ids must equal list positions; ranges must be ordered and disjoint, with open bounds
    /// only at the two extremes.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.ranges.is_empty() {
            return Err("no ranges configured".into());
        }
        let last = self.ranges.len() - 1;
        for (idx, range) in self.ranges.iter().enumerate() {
            if range.id != idx as i64 {
                return Err(format!("range at position {idx} has id {}", range.id));
            }
            if range.min == OPEN_BOUND && idx != 0 {
                return Err(format!("range {idx} is open below but is not the first"));
            }
            if range.max == OPEN_BOUND && idx != last {
                return Err(format!("range {idx} is open above but is not the last"));
            }
            if range.min != OPEN_BOUND && range.max != OPEN_BOUND && range.min >= range.max {
                return Err(format!("range {idx} is empty: {}..{}", range.min, range.max));
            }
            if idx > 0 {
                let prev = &self.ranges[idx - 1];
                if prev.max == OPEN_BOUND || range.min == OPEN_BOUND || range.min < prev.max {
                    return Err(format!("range {idx} overlaps range {}", idx - 1));
                }
            }
        }
        Ok(())
    }
}

/// Vocabulary of a categorical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCondition {
    pub list: Vec<String>,
}

impl ListCondition {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            list: items.into_iter().map(Into::into).collect(),
        }
    }

    pub fn position(&self, name: &str) -> Option<i64> {
        self.list.iter().position(|v| v == name).map(|p| p as i64)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.list.iter().any(|v| v == name)
    }
}
