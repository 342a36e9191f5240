use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::FindError;

/// How many iteratees may be in flight at once.
///
/// `Bounded(1)` is the sequential policy, `Unbounded` dispatches every
/// entry up front, anything in between is a sliding window. A bound at
/// least as large as the collection behaves exactly like `Unbounded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    Bounded(NonZeroUsize),
    Unbounded,
}

impl Limit {
    /// A bounded limit. Zero is rejected rather than guessed at.
    pub fn new(n: usize) -> Result<Self, FindError> {
        NonZeroUsize::new(n)
            .map(Limit::Bounded)
            .ok_or(FindError::InvalidLimit(n))
    }

    /// One entry at a time, in position order.
    pub fn sequential() -> Self {
        Limit::Bounded(NonZeroUsize::MIN)
    }

    pub fn is_sequential(&self) -> bool {
        *self == Limit::sequential()
    }

    /// Effective concurrency over a sequence of `len` entries.
    pub fn window(&self, len: usize) -> usize {
        match self {
            Limit::Bounded(n) => n.get().min(len),
            Limit::Unbounded => len,
        }
    }
}

impl Default for Limit {
    fn default() -> Self {
        Limit::Unbounded
    }
}

impl From<NonZeroUsize> for Limit {
    fn from(n: NonZeroUsize) -> Self {
        Limit::Bounded(n)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Bounded(n) => write!(f, "{}", n),
            Limit::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl FromStr for Limit {
    type Err = FindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unbounded") {
            return Ok(Limit::Unbounded);
        }
        let n = s.parse::<usize>()
            .map_err(|_| FindError::ParseLimit(s.to_string()))?;
        Limit::new(n)
    }
}
