// vim: tw=80
//! Post-hoc checks that required expectations were exercised

use std::fmt;

use tracing::debug;

use crate::{Error, ExpectationStore, Occurrence, Result};

/// Which expectations a verification pass looks at.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Strictness {
    /// Only those marked [`verifiable`](crate::Expectation::verifiable)
    #[default]
    Verifiable,
    /// Every declared expectation
    All,
}

/// One expectation that was not called the required number of times.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Unmet {
    expectation: String,
    member: String,
    matchers: Vec<String>,
    expected: Occurrence,
    actual: usize,
}

impl Unmet {
    pub fn actual(&self) -> usize {
        self.actual
    }

    pub fn expected(&self) -> Occurrence {
        self.expected
    }

    pub fn matchers(&self) -> &[String] {
        &self.matchers
    }

    pub fn member(&self) -> &str {
        &self.member
    }
}

impl fmt::Display for Unmet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: expected {}, got {}", self.expectation, self.expected,
               self.actual)
    }
}

/// The outcome of a verification pass.  Lists every unmet expectation, in
/// declaration order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VerificationReport {
    unmet: Vec<Unmet>,
}

impl VerificationReport {
    pub fn is_success(&self) -> bool {
        self.unmet.is_empty()
    }

    pub fn unmet(&self) -> &[Unmet] {
        &self.unmet
    }

    /// Convert into `Err(Error::VerificationFailed)` unless nothing is unmet.
    pub fn into_result(self) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(Error::VerificationFailed(self))
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_success() {
            return f.write_str("all expectations satisfied");
        }
        write!(f, "{} expectation(s) unmet:", self.unmet.len())?;
        for u in &self.unmet {
            write!(f, "\n  {u}")?;
        }
        Ok(())
    }
}

/// Check every selected expectation in `store` against its occurrence bound.
pub fn verify(store: &ExpectationStore, strictness: Strictness)
    -> VerificationReport
{
    let unmet = store.iter()
        .filter(|e| !e.is_overridden())
        .filter(|e| strictness == Strictness::All || e.is_verifiable())
        .filter(|e| !e.occurrence().is_satisfied_by(e.hit_count()))
        .map(|e| Unmet {
            expectation: e.to_string(),
            member: e.member().to_string(),
            matchers: e.matchers().iter().map(ToString::to_string).collect(),
            expected: e.occurrence(),
            actual: e.hit_count()
        })
        .inspect(|u| debug!(unmet = %u, "verification failure"))
        .collect();
    VerificationReport{unmet}
}
