// vim: tw=80
use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering}
};

/// How many times an expectation may or must be called.
///
/// Ceilings are enforced when the call happens: the call that would exceed
/// one fails immediately.  Floors are checked at verification time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Occurrence {
    /// Any number of times.  A verified expectation must still be called at
    /// least once.
    #[default]
    Unbounded,
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
    AtMostOnce,
    /// Inclusive on both ends
    Between(usize, usize),
    Never,
}

impl Occurrence {
    /// The largest number of calls allowed, if any
    pub fn ceiling(&self) -> Option<usize> {
        match *self {
            Occurrence::AtMost(n) => Some(n),
            Occurrence::AtMostOnce => Some(1),
            Occurrence::Between(_, hi) => Some(hi),
            Occurrence::Never => Some(0),
            _ => None
        }
    }

    /// Is it required that the expectation be called an exact number of
    /// times?
    pub fn is_exact(&self) -> bool {
        match *self {
            Occurrence::Exactly(_) | Occurrence::Never => true,
            Occurrence::Between(lo, hi) => lo == hi,
            _ => false
        }
    }

    /// Does `count` satisfy this bound at verification time?
    pub fn is_satisfied_by(&self, count: usize) -> bool {
        match *self {
            Occurrence::Unbounded => count > 0,
            Occurrence::Exactly(n) => count == n,
            Occurrence::AtLeast(n) => count >= n,
            Occurrence::Between(lo, _) => count >= lo,
            Occurrence::AtMost(_) | Occurrence::AtMostOnce
                | Occurrence::Never => true,
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Occurrence::Unbounded => f.write_str("at least 1"),
            Occurrence::Exactly(n) => write!(f, "exactly {n}"),
            Occurrence::AtLeast(n) => write!(f, "at least {n}"),
            Occurrence::AtMost(n) => write!(f, "at most {n}"),
            Occurrence::AtMostOnce => f.write_str("at most 1"),
            Occurrence::Between(lo, hi) => write!(f, "between {lo} and {hi}"),
            Occurrence::Never => f.write_str("exactly 0"),
        }
    }
}

/// An expectation's bound together with its hit count.
#[derive(Debug, Default)]
pub(crate) struct Times {
    /// How many times has the expectation already been called?
    count: AtomicUsize,
    bound: Occurrence,
}

impl Times {
    /// Record a call.  Fails, without recording anything, with the ceiling
    /// if the call would exceed it.
    pub fn call(&self) -> Result<usize, usize> {
        let ceiling = self.bound.ceiling();
        self.count.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| {
            match ceiling {
                Some(max) if c >= max => None,
                _ => Some(c + 1)
            }
        }).map(|prev| prev + 1)
        .map_err(|_| ceiling.unwrap_or(usize::MAX))
    }

    pub fn bound(&self) -> Occurrence {
        self.bound
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Has this expectation already been called the minimum required number
    /// of times?
    pub fn is_satisfied(&self) -> bool {
        self.bound.is_satisfied_by(self.count())
    }

    pub fn set(&mut self, bound: Occurrence) {
        self.bound = bound;
    }
}
