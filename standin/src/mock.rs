// vim: tw=80
//! The interception engine
//!
//! A [`Mock`] owns the expectations declared for one contract.  Every call
//! made against a stand-in arrives here as an [`Invocation`], is resolved to
//! the governing expectation, and is executed.  What happens when nothing
//! governs a call is decided by the mock's [`BehaviorMode`].

use std::{fmt, sync::Arc};

use tracing::{debug, trace};

use crate::{
    ArgumentMatcher,
    Error,
    Expectation,
    ExpectationStore,
    Invocation,
    Member,
    Result,
    Returned,
    expectation::Answer,
    verify::{self, Strictness, VerificationReport}
};

/// Policy for calls that no expectation answers
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BehaviorMode {
    /// Unmatched calls fail with [`Error::NoExpectation`], and matched
    /// expectations must have something to return.
    Strict,
    /// Unmatched calls degrade to a base call or a synthesized default.
    Loose,
    #[default]
    Default,
}

impl BehaviorMode {
    pub fn is_strict(&self) -> bool {
        *self == BehaviorMode::Strict
    }
}

/// The real implementation behind a stand-in, used for base calls.
///
/// Any `Fn(&Invocation) -> Result<Returned>` closure is a base
/// implementation.
pub trait BaseImplementation: Send + Sync {
    fn call_base(&self, invocation: &Invocation) -> Result<Returned>;
}

impl<F> BaseImplementation for F
    where F: Fn(&Invocation) -> Result<Returned> + Send + Sync
{
    fn call_base(&self, invocation: &Invocation) -> Result<Returned> {
        self(invocation)
    }
}

/// Supplies the value a non-strict mock returns when nothing else applies.
pub trait DefaultValueProvider: Send + Sync {
    /// `None` means no default exists for the member's return type.
    fn default_for(&self, member: &Member) -> Option<Returned>;
}

/// Synthesizes defaults from the shape of the member's return type: zero for
/// primitives, `None` for options and lists, empty arrays and iterators, and
/// `Default::default()` for value types.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyDefaults;

impl DefaultValueProvider for EmptyDefaults {
    fn default_for(&self, member: &Member) -> Option<Returned> {
        member.return_kind().synthesize()
    }
}

/// Anything that accepts a normalized invocation and returns a result.
///
/// This is the only capability a stand-in needs from the engine.
pub trait Invocable {
    fn invoke(&self, invocation: &Invocation) -> Result<Returned>;
}

impl<T: Invocable + ?Sized> Invocable for Arc<T> {
    fn invoke(&self, invocation: &Invocation) -> Result<Returned> {
        (**self).invoke(invocation)
    }
}

impl<T: Invocable + ?Sized> Invocable for &T {
    fn invoke(&self, invocation: &Invocation) -> Result<Returned> {
        (**self).invoke(invocation)
    }
}

/// Settings for a [`Mock`].
///
/// # Examples
/// ```
/// # use standin::*;
/// let base = |_: &Invocation| -> Result<Returned> {
///     Ok(Returned::value(7u32))
/// };
/// let mock = Mock::builder("Meter")
///     .behavior(BehaviorMode::Loose)
///     .call_base()
///     .base(base)
///     .build()
///     .unwrap();
/// let read = Member::method("Meter", "read", &[])
///     .returns(ReturnKind::primitive::<u32>());
/// let inv = Invocation::new(read, args![]).unwrap();
/// let r = mock.intercept(&inv).unwrap();
/// assert_eq!(7, r.into_value::<u32>().unwrap());
/// ```
pub struct MockBuilder {
    contract: &'static str,
    behavior: BehaviorMode,
    call_base: bool,
    base: Option<Box<dyn BaseImplementation>>,
    defaults: Box<dyn DefaultValueProvider>,
}

impl MockBuilder {
    fn new(contract: &'static str) -> Self {
        MockBuilder {
            contract,
            behavior: BehaviorMode::default(),
            call_base: false,
            base: None,
            defaults: Box::new(EmptyDefaults)
        }
    }

    pub fn behavior(mut self, behavior: BehaviorMode) -> Self {
        self.behavior = behavior;
        self
    }

    /// Delegate unanswered calls to the base implementation, for every
    /// member.
    pub fn call_base(mut self) -> Self {
        self.call_base = true;
        self
    }

    pub fn base<B: BaseImplementation + 'static>(mut self, base: B) -> Self {
        self.base = Some(Box::new(base));
        self
    }

    pub fn defaults<D>(mut self, defaults: D) -> Self
        where D: DefaultValueProvider + 'static
    {
        self.defaults = Box::new(defaults);
        self
    }

    pub fn build(self) -> Result<Mock> {
        if self.call_base && self.base.is_none() {
            return Err(Error::configuration(self.contract,
                "call_base requires a base implementation"));
        }
        Ok(Mock {
            contract: self.contract,
            behavior: self.behavior,
            call_base: self.call_base,
            base: self.base,
            defaults: self.defaults,
            store: ExpectationStore::new()
        })
    }
}

/// The engine behind one stand-in.
///
/// Expectations are declared through `&mut self` during setup.  Calls are
/// intercepted through `&self`, so a configured mock may be shared behind an
/// [`Arc`].
pub struct Mock {
    contract: &'static str,
    behavior: BehaviorMode,
    call_base: bool,
    base: Option<Box<dyn BaseImplementation>>,
    defaults: Box<dyn DefaultValueProvider>,
    store: ExpectationStore,
}

impl Mock {
    /// A mock in [`BehaviorMode::Default`] with no base implementation
    pub fn new(contract: &'static str) -> Self {
        Self::with_behavior(contract, BehaviorMode::Default)
    }

    pub fn strict(contract: &'static str) -> Self {
        Self::with_behavior(contract, BehaviorMode::Strict)
    }

    pub fn loose(contract: &'static str) -> Self {
        Self::with_behavior(contract, BehaviorMode::Loose)
    }

    fn with_behavior(contract: &'static str, behavior: BehaviorMode) -> Self {
        Mock {
            contract,
            behavior,
            call_base: false,
            base: None,
            defaults: Box::new(EmptyDefaults),
            store: ExpectationStore::new()
        }
    }

    pub fn builder(contract: &'static str) -> MockBuilder {
        MockBuilder::new(contract)
    }

    pub fn behavior(&self) -> BehaviorMode {
        self.behavior
    }

    pub fn contract(&self) -> &'static str {
        self.contract
    }

    pub fn store(&self) -> &ExpectationStore {
        &self.store
    }

    /// Declare a new expectation on `member`, with one matcher per
    /// parameter.
    ///
    /// Fails if the member can't be overridden or if the number of matchers
    /// doesn't equal its arity.
    pub fn expect(&mut self, member: Member, matchers: Vec<ArgumentMatcher>)
        -> Result<&mut Expectation>
    {
        if !member.is_overridable() {
            return Err(Error::configuration(&member,
                "member is not overridable"));
        }
        if matchers.len() != member.arity() {
            return Err(Error::configuration(&member, format!(
                "{} matcher(s) supplied for {} parameter(s)",
                matchers.len(), member.arity())));
        }
        trace!(%member, "expectation declared");
        Ok(self.store.push(Expectation::new(member, matchers)))
    }

    /// Handle one call made against the stand-in.
    pub fn intercept(&self, invocation: &Invocation) -> Result<Returned> {
        let Some(expectation) = self.store.resolve(invocation) else {
            if self.behavior.is_strict() {
                return Err(Error::NoExpectation {
                    invocation: invocation.to_string(),
                    near_misses: self.store.near_misses(invocation)
                });
            }
            debug!(%invocation, behavior = ?self.behavior,
                   "no expectation matched; falling back");
            return self.fallback(invocation);
        };
        trace!(%invocation, %expectation, "resolved");
        let needs_answer = self.behavior.is_strict() && !self.call_base;
        match expectation.call(invocation, needs_answer)? {
            Answer::Returned(r) => Ok(r),
            Answer::Unanswered{call_base} if call_base || self.call_base =>
                self.call_base(invocation),
            Answer::Unanswered{..} => {
                debug!(%expectation, "no return value configured");
                self.default_value(invocation.member())
            }
        }
    }

    fn fallback(&self, invocation: &Invocation) -> Result<Returned> {
        if self.call_base {
            self.call_base(invocation)
        } else {
            self.default_value(invocation.member())
        }
    }

    fn call_base(&self, invocation: &Invocation) -> Result<Returned> {
        let base = self.base.as_ref()
            .ok_or_else(|| Error::MissingBase {
                member: invocation.member().to_string()
            })?;
        debug!(%invocation, "calling base implementation");
        base.call_base(invocation)
    }

    fn default_value(&self, member: &Member) -> Result<Returned> {
        self.defaults.default_for(member)
            .ok_or_else(|| Error::NoDefault {
                member: member.to_string(),
                type_name: member.return_kind().type_name()
            })
    }

    /// Check the expectations marked [`verifiable`](Expectation::verifiable).
    pub fn verify(&self) -> Result<()> {
        self.verification(Strictness::Verifiable).into_result()
    }

    /// Check every declared expectation.
    pub fn verify_all(&self) -> Result<()> {
        self.verification(Strictness::All).into_result()
    }

    pub fn verification(&self, strictness: Strictness) -> VerificationReport {
        verify::verify(&self.store, strictness)
    }
}

impl fmt::Debug for Mock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Mock")
            .field("contract", &self.contract)
            .field("behavior", &self.behavior)
            .field("call_base", &self.call_base)
            .field("has_base", &self.base.is_some())
            .field("store", &self.store)
            .finish()
    }
}

impl Invocable for Mock {
    fn invoke(&self, invocation: &Invocation) -> Result<Returned> {
        self.intercept(invocation)
    }
}
