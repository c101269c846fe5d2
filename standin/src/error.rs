// vim: tw=80
//! Errors raised while configuring, calling, or verifying a mock

use std::error::Error as StdError;

use thiserror::Error;

use crate::verify::VerificationReport;

/// Shared `Result` alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between declaring an expectation and
/// verifying it.
///
/// Configuration errors are raised at setup time, before any call is made.
/// Errors configured with [`throws`](crate::Expectation::throws) travel
/// unchanged inside [`Error::Thrown`].
#[derive(Debug, Error)]
pub enum Error {
    /// A structurally invalid expectation.
    #[error("invalid expectation for {member}: {reason}")]
    Configuration { member: String, reason: String },

    /// No rule with that name accepts the requested argument type.
    #[error("no rule named {name:?} accepts arguments of type {subject}")]
    MissingRule { name: String, subject: &'static str },

    /// An invocation carried the wrong number of arguments.
    #[error("{member} takes {expected} argument(s) but {actual} were supplied")]
    Arity { member: String, expected: usize, actual: usize },

    /// A strict mock received a call that no expectation matches.
    #[error("no expectation matches {invocation}{}", near_misses_suffix(.near_misses))]
    NoExpectation { invocation: String, near_misses: Vec<String> },

    /// A strict mock matched an expectation that has nothing to return.
    #[error("{expectation} has no return value configured")]
    ReturnValueRequired { expectation: String },

    /// A loose mock cannot synthesize a value of the member's return type.
    #[error("{member} cannot synthesize a default {type_name}")]
    NoDefault { member: String, type_name: &'static str },

    /// A base call was requested but no base implementation is attached.
    #[error("{member} has no base implementation")]
    MissingBase { member: String },

    /// A call would exceed the expectation's occurrence ceiling.
    #[error("{expectation} called more than {limit} time(s)")]
    OccurrenceExceeded { expectation: String, limit: usize },

    /// An expectation's callback or return function called back into the
    /// same expectation.
    #[error("{expectation} called recursively from its own callback or \
             return function")]
    Reentrant { expectation: String },

    /// An expectation was called before its predecessors in a sequence.
    #[error("{expectation} called out of sequence")]
    SequenceViolation { expectation: String },

    /// The engine produced a value of a different type than the caller asked
    /// for.
    #[error("returned value is not a {expected}")]
    ReturnType { expected: &'static str },

    /// Required expectations were not exercised.
    #[error("{0}")]
    VerificationFailed(VerificationReport),

    /// An error configured with `throws`, propagated verbatim.
    #[error(transparent)]
    Thrown(Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn configuration<M, R>(member: M, reason: R) -> Self
        where M: ToString, R: Into<String>
    {
        Error::Configuration {
            member: member.to_string(),
            reason: reason.into()
        }
    }

    /// Was this error raised while setting up expectations?
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. } | Error::MissingRule { .. })
    }

    /// The user-supplied error, if this is one.
    pub fn thrown(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Error::Thrown(e) => Some(e.as_ref()),
            _ => None
        }
    }

    /// Recover a user-supplied error by its concrete type.
    pub fn downcast_thrown<E: StdError + 'static>(&self) -> Option<&E> {
        self.thrown().and_then(|e| e.downcast_ref::<E>())
    }
}

fn near_misses_suffix(near_misses: &[String]) -> String {
    near_misses.iter()
        .map(|m| format!("\n  {m}"))
        .collect()
}
