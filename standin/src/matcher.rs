// vim: tw=80
//! Per-argument matchers
//!
//! An expectation holds exactly one [`ArgumentMatcher`] per parameter of the
//! member it targets.  A call satisfies the expectation when every matcher
//! accepts the argument in its position.  Matchers are pure: they never
//! mutate state, and a panic raised inside a user-supplied predicate
//! propagates to the caller rather than counting as a mismatch.
//!
//! # Examples
//! ```
//! # use standin::*;
//! use standin::matcher::*;
//!
//! assert!(eq(5i32).matches(&5i32));
//! assert!(!eq(5i32).matches(&6i32));
//! assert!(between(1u8, 3).matches(&3u8));
//! assert!(any::<String>().matches(&String::from("x")));
//! assert!(satisfies::<u64, _>(predicate::gt(10u64)).matches(&11u64));
//! assert!(function(|s: &String| s.starts_with('a')).matches(&String::from("ab")));
//! ```

use std::{
    any::{self, TypeId},
    collections::HashMap,
    fmt,
    marker::PhantomData,
    sync::Arc
};

use predicates::{
    prelude::*,
    reflection::{Case, PredicateReflection, Product}
};
use predicates_tree::CaseTreeExt;

use crate::{Args, Error, Result, Value};

/// Decides whether a single argument satisfies part of an expectation.
pub enum ArgumentMatcher {
    /// Equal to a value, by the value's own `PartialEq`
    Literal(Box<dyn Value>),
    /// Satisfies a [`Predicate`]
    Predicate(Box<dyn Predicate<dyn Value> + Send + Sync>),
    /// Lies within a range
    Range(RangeMatcher),
    /// Is of a given type, whatever its value
    AnyOfType(TypeMatcher),
    /// Satisfies a named rule from a [`Rules`] registry
    Rule(RuleMatcher),
}

impl ArgumentMatcher {
    /// Describe why `value` was rejected.
    pub fn explain(&self, value: &dyn Value) -> String {
        if let ArgumentMatcher::Predicate(p) = self {
            if let Some(case) = p.find_case(false, value) {
                return case.tree().to_string();
            }
        }
        format!("{value:?} does not satisfy {self}")
    }

    /// Do `self` and `other` accept exactly the same arguments?  Only
    /// literals, ranges, and type matchers can be compared.  Predicates and
    /// rules are opaque, so they never compare equal.
    pub fn same_as(&self, other: &ArgumentMatcher) -> bool {
        match (self, other) {
            (ArgumentMatcher::Literal(a), ArgumentMatcher::Literal(b)) =>
                a.eq_value(&**b),
            (ArgumentMatcher::Range(a), ArgumentMatcher::Range(b)) =>
                a.kind == b.kind &&
                    a.low.eq_value(&*b.low) &&
                    a.high.eq_value(&*b.high),
            (ArgumentMatcher::AnyOfType(a), ArgumentMatcher::AnyOfType(b)) =>
                a.type_id == b.type_id,
            _ => false
        }
    }

    pub fn matches(&self, value: &dyn Value) -> bool {
        match self {
            ArgumentMatcher::Literal(expected) => value.eq_value(&**expected),
            ArgumentMatcher::Predicate(p) => p.eval(value),
            ArgumentMatcher::Range(r) => r.contains(value),
            ArgumentMatcher::AnyOfType(t) => (t.check)(value),
            ArgumentMatcher::Rule(r) => (r.rule)(value, Args::new(&r.extra)),
        }
    }
}

impl fmt::Debug for ArgumentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for ArgumentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArgumentMatcher::Literal(v) => write!(f, "{v:?}"),
            ArgumentMatcher::Predicate(p) => write!(f, "{p}"),
            ArgumentMatcher::Range(r) => match r.kind {
                RangeKind::Inclusive =>
                    write!(f, "in [{:?}, {:?}]", r.low, r.high),
                RangeKind::Exclusive =>
                    write!(f, "in ({:?}, {:?})", r.low, r.high),
            },
            ArgumentMatcher::AnyOfType(t) =>
                write!(f, "any::<{}>()", t.type_name),
            ArgumentMatcher::Rule(r) =>
                write!(f, "{}({})", r.name, Args::new(&r.extra)),
        }
    }
}

/// Whether a range includes its endpoints
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RangeKind {
    Inclusive,
    Exclusive,
}

pub struct RangeMatcher {
    low: Box<dyn Value>,
    high: Box<dyn Value>,
    kind: RangeKind,
    // Monomorphized at construction time, so the comparison happens on the
    // concrete type.
    cmp: fn(&dyn Value, &dyn Value, &dyn Value, RangeKind) -> bool,
}

impl RangeMatcher {
    fn contains(&self, value: &dyn Value) -> bool {
        (self.cmp)(value, &*self.low, &*self.high, self.kind)
    }
}

fn range_contains<T>(value: &dyn Value, low: &dyn Value, high: &dyn Value,
                     kind: RangeKind) -> bool
    where T: Value + PartialOrd
{
    let (Ok(v), Ok(lo), Ok(hi)) = (
        value.downcast_ref::<T>(),
        low.downcast_ref::<T>(),
        high.downcast_ref::<T>()
    ) else {
        return false;
    };
    match kind {
        RangeKind::Inclusive => lo <= v && v <= hi,
        RangeKind::Exclusive => lo < v && v < hi,
    }
}

pub struct TypeMatcher {
    type_id: TypeId,
    type_name: &'static str,
    check: fn(&dyn Value) -> bool,
}

fn is_a<T: Value>(value: &dyn Value) -> bool {
    value.is::<T>()
}

type RuleFn = dyn Fn(&dyn Value, Args<'_>) -> bool + Send + Sync;

pub struct RuleMatcher {
    name: String,
    /// Extra arguments, captured once when the matcher was built
    extra: Vec<Box<dyn Value>>,
    rule: Arc<RuleFn>,
}

/// Adapts a `Predicate<T>` into a `Predicate<dyn Value>`.  Values of any other
/// type fail the predicate.
struct Typed<T, P> {
    pred: P,
    _t: PhantomData<fn(&T)>,
}

impl<T, P: fmt::Display> fmt::Display for Typed<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.pred, f)
    }
}

impl<T, P: PredicateReflection> PredicateReflection for Typed<T, P> {}

impl<T, P> Predicate<dyn Value> for Typed<T, P>
    where T: Value, P: Predicate<T>
{
    fn eval(&self, variable: &dyn Value) -> bool {
        variable.downcast_ref::<T>()
            .map_or(false, |v| self.pred.eval(v))
    }

    fn find_case<'a>(&'a self, expected: bool, variable: &dyn Value)
        -> Option<Case<'a>>
    {
        match variable.downcast_ref::<T>() {
            Ok(v) => self.pred.find_case(expected, v),
            Err(_) if !expected => {
                let product = Product::new("actual", format!("{variable:?}"));
                Some(Case::new(Some(self), false).add_product(product))
            },
            Err(_) => None
        }
    }
}

/// Match a value equal to `t`.
pub fn eq<T: Value>(t: T) -> ArgumentMatcher {
    ArgumentMatcher::Literal(Box::new(t))
}

/// Match any value of type `T`.
pub fn any<T: Value>() -> ArgumentMatcher {
    ArgumentMatcher::AnyOfType(TypeMatcher {
        type_id: TypeId::of::<T>(),
        type_name: any::type_name::<T>(),
        check: is_a::<T>
    })
}

/// Match a value within `low..=high`.
pub fn between<T: Value + PartialOrd>(low: T, high: T) -> ArgumentMatcher {
    range(low, high, RangeKind::Inclusive)
}

/// Match a value for which `f` returns `true`.
pub fn function<T, F>(f: F) -> ArgumentMatcher
    where T: Value, F: Fn(&T) -> bool + Send + Sync + 'static
{
    satisfies::<T, _>(predicate::function(f))
}

pub fn range<T>(low: T, high: T, kind: RangeKind) -> ArgumentMatcher
    where T: Value + PartialOrd
{
    ArgumentMatcher::Range(RangeMatcher {
        low: Box::new(low),
        high: Box::new(high),
        kind,
        cmp: range_contains::<T>
    })
}

/// Match a value that satisfies any [`Predicate`], such as those in the
/// [`predicate`] module.
///
/// Many predicates accept more than one argument type, so the type usually
/// has to be named: `satisfies::<u32, _>(predicate::ge(1u32))`.
pub fn satisfies<T, P>(p: P) -> ArgumentMatcher
    where T: Value, P: Predicate<T> + Send + Sync + 'static
{
    ArgumentMatcher::Predicate(Box::new(Typed{pred: p, _t: PhantomData}))
}

/// A registry of named validation rules.
///
/// Rules are looked up by name and by the type of argument they validate, so
/// the same name may be registered once per argument type.  Looking up a rule
/// that doesn't exist fails immediately, at setup time.
///
/// # Examples
/// ```
/// # use standin::*;
/// use standin::matcher::Rules;
///
/// let mut rules = Rules::new();
/// rules.register("multiple_of", |x: &u32, extra| {
///     extra.arg::<u32>(0).map_or(false, |m| x % m == 0)
/// });
/// let m = rules.matcher::<u32>("multiple_of", args![3u32]).unwrap();
/// assert!(m.matches(&9u32));
/// assert!(!m.matches(&10u32));
/// assert!(rules.matcher::<i64>("multiple_of", args![3u32]).is_err());
/// ```
#[derive(Default)]
pub struct Rules {
    rules: HashMap<(String, TypeId), Arc<RuleFn>>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a matcher from the rule `name` for arguments of type `T`.
    ///
    /// `extra` is evaluated once, here, and passed to the rule on every
    /// match.
    pub fn matcher<T: Value>(&self, name: &str, extra: Vec<Box<dyn Value>>)
        -> Result<ArgumentMatcher>
    {
        let key = (name.to_owned(), TypeId::of::<T>());
        let rule = self.rules.get(&key)
            .cloned()
            .ok_or_else(|| Error::MissingRule {
                name: name.to_owned(),
                subject: any::type_name::<T>()
            })?;
        Ok(ArgumentMatcher::Rule(RuleMatcher {
            name: name.to_owned(),
            extra,
            rule
        }))
    }

    /// Register a rule validating arguments of type `T`.  The rule receives
    /// the argument plus whatever extra values the matcher captured.
    pub fn register<T, F>(&mut self, name: &str, f: F) -> &mut Self
        where T: Value, F: Fn(&T, Args<'_>) -> bool + Send + Sync + 'static
    {
        let rule = move |v: &dyn Value, extra: Args<'_>| {
            v.downcast_ref::<T>()
                .map_or(false, |t| f(t, extra))
        };
        self.rules.insert((name.to_owned(), TypeId::of::<T>()), Arc::new(rule));
        self
    }
}
