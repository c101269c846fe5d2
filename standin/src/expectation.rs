// vim: tw=80
use std::{
    any::{self, Any},
    error::Error as StdError,
    fmt,
    mem,
    sync::{Mutex, PoisonError},
    thread::{self, ThreadId}
};

use fragile::Fragile;
use tracing::trace;

use crate::{
    Args,
    ArgumentMatcher,
    Error,
    Invocation,
    Member,
    Occurrence,
    Result,
    Sequence,
    sequence::SeqHandle,
    times::Times
};

type OutputFn = Box<dyn FnMut(Args<'_>) -> Box<dyn Any + Send> + Send>;
type OnceFn = Box<dyn FnOnce(Args<'_>) -> Box<dyn Any + Send> + Send>;
type ThrowFn =
    Box<dyn FnMut(Args<'_>) -> Box<dyn StdError + Send + Sync> + Send>;
type CallbackFn = Box<dyn FnMut(Args<'_>) + Send>;

/// Return functions for expectations.  Returning and throwing are mutually
/// exclusive, so they share one slot.
#[derive(Default)]
enum Rfunc {
    #[default]
    Default,
    // Indicates that a `return_once` expectation has already returned
    Expired,
    Mut(OutputFn),
    Once(OnceFn),
    Throw(ThrowFn),
}

enum Response {
    Unset,
    Expired,
    Value(Box<dyn Any + Send>),
    Thrown(Box<dyn StdError + Send + Sync>),
}

impl Rfunc {
    fn call_mut(&mut self, args: Args<'_>) -> Response {
        match self {
            Rfunc::Default => Response::Unset,
            Rfunc::Expired => Response::Expired,
            Rfunc::Mut(f) => Response::Value(f(args)),
            Rfunc::Throw(f) => Response::Thrown(f(args)),
            Rfunc::Once(_) => {
                if let Rfunc::Once(f) = mem::replace(self, Rfunc::Expired) {
                    Response::Value(f(args))
                } else {
                    unreachable!()
                }
            },
        }
    }
}

/// What an expectation produced for a call.
pub(crate) enum Answer {
    Returned(crate::Returned),
    /// Nothing was configured.  The mock decides what happens next.
    Unanswered { call_base: bool },
}

/// One declared rule: a call pattern plus the response to it.
///
/// Created by [`Mock::expect`](crate::Mock::expect) and configured through
/// its builder methods.  Methods that configure a return value check the type
/// against the member's declaration and fail right away if it doesn't fit.
pub struct Expectation {
    member: Member,
    matchers: Vec<ArgumentMatcher>,
    rfunc: Mutex<Rfunc>,
    callback: Mutex<Option<CallbackFn>>,
    /// The thread currently executing this expectation, if any
    running: Mutex<Option<ThreadId>>,
    call_base: bool,
    overridden: bool,
    verifiable: bool,
    seq_handle: Option<SeqHandle>,
    times: Times,
}

impl Expectation {
    pub(crate) fn new(member: Member, matchers: Vec<ArgumentMatcher>) -> Self {
        Expectation {
            member,
            matchers,
            rfunc: Mutex::new(Rfunc::Default),
            callback: Mutex::new(None),
            running: Mutex::new(None),
            call_base: false,
            overridden: false,
            verifiable: false,
            seq_handle: None,
            times: Times::default()
        }
    }

    /// Execute this expectation for a call that it matched.
    ///
    /// `needs_answer` is set when the mock has nothing to fall back on if no
    /// return value is configured.  A call that fails before its response
    /// runs is not counted as a hit.
    pub(crate) fn call(&self, invocation: &Invocation, needs_answer: bool)
        -> Result<Answer>
    {
        let me = thread::current().id();
        if *lock(&self.running) == Some(me) {
            return Err(Error::Reentrant{expectation: self.to_string()});
        }
        let mut rfunc = lock(&self.rfunc);
        // Must drop before `rfunc` unlocks
        let _running = Running::enter(&self.running, me);
        let void = self.member.return_kind().is_void();
        match *rfunc {
            Rfunc::Expired => return Err(Error::OccurrenceExceeded {
                expectation: self.to_string(),
                limit: 1
            }),
            Rfunc::Default if needs_answer && !self.call_base && !void =>
                return Err(Error::ReturnValueRequired {
                    expectation: self.to_string()
                }),
            _ => ()
        }
        if let Some(handle) = &self.seq_handle {
            if !handle.verify() {
                return Err(Error::SequenceViolation {
                    expectation: self.to_string()
                });
            }
        }
        let count = self.times.call()
            .map_err(|limit| Error::OccurrenceExceeded {
                expectation: self.to_string(),
                limit
            })?;
        trace!(expectation = %self, count, "expectation hit");
        if let Some(handle) = &self.seq_handle {
            if self.times.is_satisfied() && !handle.satisfy() {
                return Err(Error::SequenceViolation {
                    expectation: self.to_string()
                });
            }
        }

        let args = invocation.args();
        if let Some(cb) = lock(&self.callback).as_mut() {
            cb(args);
        }
        match rfunc.call_mut(args) {
            Response::Thrown(e) => Err(Error::Thrown(e)),
            Response::Expired => Err(Error::OccurrenceExceeded {
                expectation: self.to_string(),
                limit: 1
            }),
            _ if void => Ok(Answer::Returned(crate::Returned::Void)),
            Response::Value(v) => Ok(Answer::Returned(crate::Returned::Value(v))),
            Response::Unset => Ok(Answer::Unanswered{call_base: self.call_base}),
        }
    }

    fn check_output<T: 'static>(&self) -> Result<()> {
        let returns = self.member.return_kind();
        if returns.accepts::<T>() {
            Ok(())
        } else if returns.is_void() {
            Err(Error::configuration(&self.member,
                "a member that returns nothing can't be given a return value"))
        } else {
            Err(Error::configuration(&self.member, format!(
                "declared to return {}, not {}",
                returns.type_name(), any::type_name::<T>())))
        }
    }

    /// Does this expectation govern `invocation`?
    pub fn matches(&self, invocation: &Invocation) -> bool {
        let args = invocation.args();
        invocation.member() == &self.member &&
            self.matchers.len() == args.len() &&
            self.matchers.iter()
                .zip(args.iter())
                .all(|(m, a)| m.matches(a))
    }

    /// Explain why `invocation`'s arguments were rejected, naming the first
    /// argument that failed.
    pub(crate) fn near_miss(&self, invocation: &Invocation) -> Option<String> {
        if invocation.member() != &self.member {
            return None;
        }
        self.matchers.iter()
            .zip(invocation.args().iter())
            .enumerate()
            .find(|(_, (m, a))| !m.matches(*a))
            .map(|(i, (m, a))| {
                format!("{self}: argument {i}: {}", m.explain(a))
            })
    }

    pub fn hit_count(&self) -> usize {
        self.times.count()
    }

    pub fn is_verifiable(&self) -> bool {
        self.verifiable
    }

    /// Has a later expectation with the very same call pattern replaced this
    /// one?  Overridden expectations can never be reached, so verification
    /// skips them.
    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    pub(crate) fn override_if_shadowed_by(&mut self, later: &Expectation) {
        if self.member == later.member &&
            self.matchers.len() == later.matchers.len() &&
            self.matchers.iter()
                .zip(later.matchers.iter())
                .all(|(a, b)| a.same_as(b))
        {
            self.overridden = true;
        }
    }

    pub fn matchers(&self) -> &[ArgumentMatcher] {
        &self.matchers
    }

    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn occurrence(&self) -> Occurrence {
        self.times.bound()
    }

    /// Run `f` with the call's arguments before returning or throwing.
    pub fn callback<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(Args<'_>) + Send + 'static
    {
        *lock(&self.callback) = Some(Box::new(f));
        self
    }

    /// Delegate to the base implementation when nothing else is configured.
    pub fn call_base(&mut self) -> &mut Self {
        self.call_base = true;
        self
    }

    /// Add this expectation to a [`Sequence`].
    ///
    /// Only expectations with an exact call count can join a sequence.
    pub fn in_sequence(&mut self, seq: &mut Sequence) -> Result<&mut Self> {
        if !self.times.bound().is_exact() {
            return Err(Error::configuration(&self.member,
                "only expectations with an exact call count have sequences"));
        }
        self.seq_handle = Some(seq.next_handle());
        Ok(self)
    }

    /// Constrain the number of calls.
    pub fn occurs(&mut self, bound: Occurrence) -> &mut Self {
        self.times.set(bound);
        self
    }

    /// Forbid this expectation from ever being called.
    pub fn never(&mut self) -> &mut Self {
        self.occurs(Occurrence::Never)
    }

    /// Expect this expectation to be called exactly once.  Shortcut for
    /// [`times(1)`](#method.times).
    pub fn once(&mut self) -> &mut Self {
        self.times(1)
    }

    /// Require this expectation to be called exactly `n` times.
    pub fn times(&mut self, n: usize) -> &mut Self {
        self.occurs(Occurrence::Exactly(n))
    }

    /// Allow this expectation to be called any number of times
    ///
    /// This behavior is the default, but the method is provided in case the
    /// default behavior changes.
    pub fn times_any(&mut self) -> &mut Self {
        self.occurs(Occurrence::Unbounded)
    }

    pub fn at_least(&mut self, n: usize) -> &mut Self {
        self.occurs(Occurrence::AtLeast(n))
    }

    pub fn at_least_once(&mut self) -> &mut Self {
        self.at_least(1)
    }

    /// Fail any call beyond the `n`th, as soon as it happens.
    pub fn at_most(&mut self, n: usize) -> &mut Self {
        self.occurs(Occurrence::AtMost(n))
    }

    pub fn at_most_once(&mut self) -> &mut Self {
        self.occurs(Occurrence::AtMostOnce)
    }

    /// Require between `lo` and `hi` calls, inclusive.
    pub fn between(&mut self, lo: usize, hi: usize) -> &mut Self {
        self.occurs(Occurrence::Between(lo, hi))
    }

    /// Include this expectation in [`Mock::verify`](crate::Mock::verify).
    pub fn verifiable(&mut self) -> &mut Self {
        self.verifiable = true;
        self
    }

    /// Return a constant value.
    ///
    /// The output type must be `Clone`.  The compiler can't always infer the
    /// proper type to use with this method; you will usually need to specify
    /// it explicitly.  i.e. `returns(42i32)` instead of `returns(42)`.
    pub fn returns<T>(&mut self, t: T) -> Result<&mut Self>
        where T: Clone + Send + 'static
    {
        self.returning(move |_| t.clone())
    }

    /// Supply a closure that will compute a fresh return value for every call.
    pub fn returning<T, F>(&mut self, mut f: F) -> Result<&mut Self>
        where T: Send + 'static, F: FnMut(Args<'_>) -> T + Send + 'static
    {
        self.check_output::<T>()?;
        let fmut = move |args: Args<'_>| -> Box<dyn Any + Send> {
            Box::new(f(args))
        };
        *lock(&self.rfunc) = Rfunc::Mut(Box::new(fmut));
        Ok(self)
    }

    /// Single-threaded version of [`returning`](#method.returning).  Can be
    /// used when the closure isn't `Send`.
    ///
    /// It is a runtime error to call the mock method from a different thread
    /// than the one that originally called this method.
    pub fn returning_st<T, F>(&mut self, f: F) -> Result<&mut Self>
        where T: Send + 'static, F: FnMut(Args<'_>) -> T + 'static
    {
        self.check_output::<T>()?;
        let mut fragile = Fragile::new(f);
        let fmut = move |args: Args<'_>| -> Box<dyn Any + Send> {
            Box::new((fragile.get_mut())(args))
        };
        *lock(&self.rfunc) = Rfunc::Mut(Box::new(fmut));
        Ok(self)
    }

    /// Supply an `FnOnce` closure that will provide the return value.  This is
    /// useful for return types that aren't `Clone`.  A second call fails.
    pub fn return_once<T, F>(&mut self, f: F) -> Result<&mut Self>
        where T: Send + 'static, F: FnOnce(Args<'_>) -> T + Send + 'static
    {
        self.check_output::<T>()?;
        let fonce = move |args: Args<'_>| -> Box<dyn Any + Send> {
            Box::new(f(args))
        };
        *lock(&self.rfunc) = Rfunc::Once(Box::new(fonce));
        Ok(self)
    }

    /// Fail every call with a clone of `e`.
    pub fn throws<E>(&mut self, e: E) -> &mut Self
        where E: StdError + Clone + Send + Sync + 'static
    {
        self.throwing(move |_| e.clone())
    }

    /// Fail every call with an error computed by `f`.
    pub fn throwing<E, F>(&mut self, mut f: F) -> &mut Self
        where E: StdError + Send + Sync + 'static,
              F: FnMut(Args<'_>) -> E + Send + 'static
    {
        let fmut = move |args: Args<'_>|
            -> Box<dyn StdError + Send + Sync>
        {
            Box::new(f(args))
        };
        *lock(&self.rfunc) = Rfunc::Throw(Box::new(fmut));
        self
    }
}

impl fmt::Debug for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("member", &self.member.to_string())
            .field("matchers", &self.matchers)
            .field("verifiable", &self.verifiable)
            .field("overridden", &self.overridden)
            .field("occurrence", &self.times.bound())
            .field("hits", &self.times.count())
            .finish()
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let matchers = self.matchers.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        self.member.fmt_call(f, &matchers)
    }
}

/// Marks the thread executing an expectation for as long as it holds the
/// response lock.
struct Running<'a>(&'a Mutex<Option<ThreadId>>);

impl<'a> Running<'a> {
    fn enter(slot: &'a Mutex<Option<ThreadId>>, id: ThreadId) -> Self {
        *lock(slot) = Some(id);
        Running(slot)
    }
}

impl<'a> Drop for Running<'a> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

/// A panic inside a user closure poisons the lock, but the test is already
/// failing by then.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
