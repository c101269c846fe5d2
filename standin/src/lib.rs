// vim: tw=80
//! A call-interception and expectation-matching engine for test doubles.
//!
//! Standin intercepts every call made against a stand-in object, decides
//! which declared expectation governs it, runs that expectation's configured
//! behavior, and afterwards verifies that required expectations were
//! exercised.
//!
//! # Usage
//!
//! The easiest way to get a stand-in is [`#[stand_in]`](stand_in) on a trait.
//! It generates a `StandIn` struct that implements the trait by forwarding
//! every call to a [`Mock`].  Anything else can drive a [`Mock`] directly by
//! building [`Invocation`]s and passing them to [`Mock::intercept`].
//!
//! Whichever method is used, the basic idea is the same.
//! * Create a [`Mock`] for the contract, choosing a [`BehaviorMode`].
//! * Declare expectations on it.  Each expectation targets one [`Member`]
//!   and has one [`ArgumentMatcher`] per parameter.  It may also have a
//!   return value or an error, a callback, a call count, and a position in a
//!   [`Sequence`].
//! * Wrap the mock in a stand-in and hand that to the code under test.
//! * Verify.
//!
//! ## Getting Started
//! ```
//! use standin::*;
//! use standin::matcher::eq;
//!
//! #[stand_in]
//! trait Calculator {
//!     fn echo(&self, x: i32) -> i32;
//! }
//!
//! fn call_with_five(c: &dyn Calculator) -> i32 {
//!     c.echo(5)
//! }
//!
//! let mut mock = Mock::strict(StandInCalculator::CONTRACT);
//! mock.expect(StandInCalculator::member_echo(), vec![eq(5)]).unwrap()
//!     .once()
//!     .returns(10).unwrap();
//! let calc = StandInCalculator::new(mock);
//! assert_eq!(10, call_with_five(&calc));
//! calc.mock().verify_all().unwrap();
//! ```
//!
//! ## Resolution
//!
//! When more than one expectation matches a call, the most recently declared
//! one wins.  Earlier ones stay in place and still count for verification.
//!
//! ```
//! # use standin::*;
//! use standin::matcher::{any, eq};
//!
//! let echo = Member::method("Calculator", "echo", &["i32"])
//!     .returns(ReturnKind::primitive::<i32>());
//! let mut mock = Mock::strict("Calculator");
//! mock.expect(echo.clone(), vec![any::<i32>()]).unwrap()
//!     .returns(0).unwrap();
//! mock.expect(echo.clone(), vec![eq(5)]).unwrap()
//!     .returns(10).unwrap();
//!
//! let five = Invocation::new(echo.clone(), args![5]).unwrap();
//! let six = Invocation::new(echo, args![6]).unwrap();
//! assert_eq!(10, mock.intercept(&five).unwrap().into_value::<i32>().unwrap());
//! assert_eq!(0, mock.intercept(&six).unwrap().into_value::<i32>().unwrap());
//! ```
//!
//! ## Behavior modes
//!
//! A [`Strict`](BehaviorMode::Strict) mock fails any call that no expectation
//! matches.  [`Loose`](BehaviorMode::Loose) and
//! [`Default`](BehaviorMode::Default) mocks instead call the base
//! implementation, if asked to, or synthesize a default value from the shape
//! of the member's return type.  See [`ReturnKind`] for the table.
//!
//! ## Verification
//!
//! [`Mock::verify`] checks only the expectations marked
//! [`verifiable`](Expectation::verifiable).  [`Mock::verify_all`] checks all
//! of them.  Either one reports every unmet expectation at once.
//!
//! ```
//! # use standin::*;
//! let submit = Member::method("Form", "submit", &[]);
//! let reset = Member::method("Form", "reset", &[]);
//! let mut mock = Mock::loose("Form");
//! mock.expect(submit, vec![]).unwrap().once();
//! mock.expect(reset, vec![]).unwrap().verifiable();
//!
//! let e = mock.verify_all().unwrap_err();
//! assert!(e.to_string().contains("Form::submit(): expected exactly 1, got 0"));
//! assert!(e.to_string().contains("Form::reset(): expected at least 1, got 0"));
//! ```

mod error;
mod expectation;
mod invocation;
pub mod matcher;
mod member;
mod mock;
mod registry;
mod sequence;
mod store;
mod times;
mod value;
mod verify;

pub use error::{Error, Result};
pub use expectation::Expectation;
pub use invocation::Invocation;
pub use matcher::{ArgumentMatcher, RangeKind, Rules};
pub use member::{Member, MemberId, MemberKind, ReturnKind, Shape};
pub use mock::{
    BaseImplementation,
    BehaviorMode,
    DefaultValueProvider,
    EmptyDefaults,
    Invocable,
    Mock,
    MockBuilder
};
pub use registry::MockRegistry;
pub use sequence::Sequence;
pub use store::ExpectationStore;
pub use times::Occurrence;
pub use value::{Args, Returned, Value};
pub use verify::{Strictness, Unmet, VerificationReport};

pub use predicates::prelude::{Predicate, predicate};
pub use standin_derive::stand_in;

/// Support code for `#[stand_in]`.  Not public API.
#[doc(hidden)]
pub mod __private {
    use super::*;

    /// Forward one call to `mock`, panicking on any engine error.
    pub fn answer<T: 'static>(mock: &Mock, member: Member,
                              args: Vec<Box<dyn Value>>) -> T
    {
        let answer = Invocation::new(member, args)
            .and_then(|inv| mock.intercept(&inv))
            .and_then(Returned::into_value::<T>);
        match answer {
            Ok(t) => t,
            Err(e) => panic!("{e}")
        }
    }
}
