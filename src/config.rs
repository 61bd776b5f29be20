//! Options controlling how interval files are read and applied.
//!
//! Everything is passed explicitly to the load and filter entry points;
//! there is no process-wide configuration.

use std::fmt;

/// Longest set identifier accepted on an input line.
pub const MAX_SET_ID_LEN: usize = 16000;

/// Coordinate convention of the interval columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateConvention {
    /// 0-based, half-open (BED).
    Ibed0,
    /// 1-based, closed.
    #[default]
    Ibed1,
}

impl CoordinateConvention {
    /// Normalize a raw `(start, end)` pair to 0-based half-open.
    ///
    /// Returns `None` when a 1-based start is zero.
    #[inline]
    pub fn to_half_open(self, start: u32, end: u32) -> Option<(u32, u32)> {
        match self {
            CoordinateConvention::Ibed0 => Some((start, end)),
            CoordinateConvention::Ibed1 => start.checked_sub(1).map(|s| (s, end)),
        }
    }
}

/// What to do when a load produces no intervals at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyPolicy {
    /// Log a warning and continue with an empty result.
    Warn,
    /// Abort with an inconsistent-input error.
    #[default]
    Fail,
}

/// Direction of a range-based variant filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Keep only variants covered by the ranges.
    Include,
    /// Drop variants covered by the ranges.
    Exclude,
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Include => write!(f, "--extract range"),
            FilterMode::Exclude => write!(f, "--exclude range"),
        }
    }
}

/// Options for reading an interval file.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Coordinate convention of columns 2 and 3
    pub convention: CoordinateConvention,
    /// Bases added on both sides of every interval
    pub border_bp: u32,
    /// Group intervals by their trailing set id; otherwise everything is set 0
    pub track_sets: bool,
    /// Literal prefix stored in front of every set name
    pub name_prefix: Option<[u8; 2]>,
    /// Behavior when no intervals are found
    pub empty_policy: EmptyPolicy,
    /// Human-readable file role used in messages
    pub role: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self {
            convention: CoordinateConvention::default(),
            border_bp: 0,
            track_sets: true,
            name_prefix: None,
            empty_policy: EmptyPolicy::default(),
            role: "range file".to_string(),
        }
    }

    pub fn with_convention(mut self, convention: CoordinateConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn with_border(mut self, border_bp: u32) -> Self {
        self.border_bp = border_bp;
        self
    }

    pub fn with_track_sets(mut self, track_sets: bool) -> Self {
        self.track_sets = track_sets;
        self
    }

    pub fn with_name_prefix(mut self, prefix: [u8; 2]) -> Self {
        self.name_prefix = Some(prefix);
        self
    }

    pub fn with_empty_policy(mut self, policy: EmptyPolicy) -> Self {
        self.empty_policy = policy;
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Minimum number of whitespace-separated fields per line.
    #[inline]
    pub fn min_fields(&self) -> usize {
        if self.track_sets {
            4
        } else {
            3
        }
    }
}
