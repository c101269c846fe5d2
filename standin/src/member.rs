// vim: tw=80
//! Identities and return shapes of mockable contract members

use std::{
    any::{self, Any, TypeId},
    fmt,
    iter
};

use crate::Returned;

/// What sort of member is being called.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MemberKind {
    Method,
    Getter,
    Setter,
    IndexGet,
    IndexSet,
}

/// Stable identity of a contract member.
///
/// Two members are the same if they belong to the same contract and share
/// name, kind, and parameter types.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MemberId {
    contract: &'static str,
    name: &'static str,
    kind: MemberKind,
    params: Vec<&'static str>,
}

impl MemberId {
    pub fn contract(&self) -> &'static str {
        self.contract
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[&'static str] {
        &self.params
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            MemberKind::Method => write!(f, "{}::{}", self.contract, self.name),
            MemberKind::Getter => write!(f, "{}::{} (get)", self.contract,
                                         self.name),
            MemberKind::Setter => write!(f, "{}::{} (set)", self.contract,
                                         self.name),
            MemberKind::IndexGet => write!(f, "{}[{}] (get)", self.contract,
                                           self.params.join(", ")),
            MemberKind::IndexSet => {
                let keys = &self.params[..self.params.len().saturating_sub(1)];
                write!(f, "{}[{}] (set)", self.contract, keys.join(", "))
            }
        }
    }
}

/// The declared output type of a member
#[derive(Clone, Copy, Debug)]
struct Output {
    type_id: TypeId,
    type_name: &'static str,
    /// Builds the value a loose mock returns when nothing else applies
    synth: Option<fn() -> Box<dyn Any + Send>>,
}

impl Output {
    fn of<T: 'static>(synth: Option<fn() -> Box<dyn Any + Send>>) -> Self {
        Output {
            type_id: TypeId::of::<T>(),
            type_name: any::type_name::<T>(),
            synth
        }
    }
}

/// How a member's return type is shaped, for the purpose of synthesizing a
/// default value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Shape {
    Void,
    /// Numbers, `bool`, `char`: zero-equivalent
    Primitive,
    /// `Option<T>`: `None`
    Nullable,
    /// `Vec<T>`: empty
    Array,
    /// `Option<Vec<T>>`: `None`, *not* an empty list
    List,
    /// `Box<dyn Iterator<Item = T> + Send>`: an empty iterator
    Iterable,
    /// Anything else with a `Default` impl
    ValueType,
    /// No default can be synthesized
    Opaque,
}

/// The return type of a member, along with its default-value shape.
///
/// Note the asymmetry between [`array`](ReturnKind::array), which synthesizes
/// an empty `Vec`, and [`list`](ReturnKind::list), which synthesizes `None`.
/// It distinguishes "unconfigured" from "empty" and is relied upon by
/// existing suites.
#[derive(Clone, Copy, Debug)]
pub struct ReturnKind {
    shape: Shape,
    output: Output,
}

impl ReturnKind {
    /// The member returns nothing.  Only `()` may be configured as its return
    /// value.
    pub fn void() -> Self {
        ReturnKind {
            shape: Shape::Void,
            output: Output::of::<()>(Some(synth_default::<()>))
        }
    }

    pub fn primitive<T: Default + Send + 'static>() -> Self {
        Self::new::<T>(Shape::Primitive, Some(synth_default::<T>))
    }

    /// The member returns `Option<T>`.
    pub fn nullable<T: Send + 'static>() -> Self {
        Self::new::<Option<T>>(Shape::Nullable, Some(synth_none::<T>))
    }

    /// The member returns `Vec<T>`.
    pub fn array<T: Send + 'static>() -> Self {
        Self::new::<Vec<T>>(Shape::Array, Some(synth_empty_vec::<T>))
    }

    /// The member returns `Option<Vec<T>>`.
    pub fn list<T: Send + 'static>() -> Self {
        Self::new::<Option<Vec<T>>>(Shape::List, Some(synth_none::<Vec<T>>))
    }

    /// The member returns `Box<dyn Iterator<Item = T> + Send>`.
    pub fn iterable<T: Send + 'static>() -> Self {
        Self::new::<Box<dyn Iterator<Item = T> + Send>>(
            Shape::Iterable,
            Some(synth_empty_iter::<T>)
        )
    }

    pub fn value_type<T: Default + Send + 'static>() -> Self {
        Self::new::<T>(Shape::ValueType, Some(synth_default::<T>))
    }

    /// The member returns a `T` that has no sensible default.
    pub fn opaque<T: 'static>() -> Self {
        Self::new::<T>(Shape::Opaque, None)
    }

    fn new<T: 'static>(shape: Shape,
                       synth: Option<fn() -> Box<dyn Any + Send>>) -> Self
    {
        ReturnKind{shape, output: Output::of::<T>(synth)}
    }

    /// May a value of type `T` be returned?
    pub fn accepts<T: 'static>(&self) -> bool {
        self.output.type_id == TypeId::of::<T>()
    }

    pub fn is_void(&self) -> bool {
        self.shape == Shape::Void
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Build the default value, if the shape has one.
    pub fn synthesize(&self) -> Option<Returned> {
        if self.is_void() {
            return Some(Returned::Void);
        }
        self.output.synth.map(|synth| Returned::Value(synth()))
    }

    pub fn type_name(&self) -> &'static str {
        self.output.type_name
    }
}

fn synth_default<T: Default + Send + 'static>() -> Box<dyn Any + Send> {
    Box::new(T::default())
}

fn synth_empty_iter<T: Send + 'static>() -> Box<dyn Any + Send> {
    let it: Box<dyn Iterator<Item = T> + Send> = Box::new(iter::empty());
    Box::new(it)
}

fn synth_empty_vec<T: Send + 'static>() -> Box<dyn Any + Send> {
    Box::new(Vec::<T>::new())
}

fn synth_none<T: Send + 'static>() -> Box<dyn Any + Send> {
    Box::new(None::<T>)
}

/// A member of a mockable contract: its identity plus what it returns.
#[derive(Clone, Debug)]
pub struct Member {
    id: MemberId,
    returns: ReturnKind,
    overridable: bool,
}

impl Member {
    fn new(contract: &'static str, name: &'static str, kind: MemberKind,
           params: Vec<&'static str>) -> Self
    {
        let id = MemberId{contract, name, kind, params};
        Member{id, returns: ReturnKind::void(), overridable: true}
    }

    /// An ordinary method.  `params` names the parameter types, in order.
    ///
    /// The member returns nothing until told otherwise with
    /// [`returns`](Member::returns).
    pub fn method(contract: &'static str, name: &'static str,
                  params: &[&'static str]) -> Self
    {
        Self::new(contract, name, MemberKind::Method, params.to_vec())
    }

    /// A property getter
    pub fn getter(contract: &'static str, name: &'static str) -> Self {
        Self::new(contract, name, MemberKind::Getter, Vec::new())
    }

    /// A property setter taking a single value of type `param`
    pub fn setter(contract: &'static str, name: &'static str,
                  param: &'static str) -> Self
    {
        Self::new(contract, name, MemberKind::Setter, vec![param])
    }

    /// An indexer read, keyed by `keys`
    pub fn index_getter(contract: &'static str, keys: &[&'static str])
        -> Self
    {
        Self::new(contract, "[]", MemberKind::IndexGet, keys.to_vec())
    }

    /// An indexer write.  The value is the final argument, after the keys.
    pub fn index_setter(contract: &'static str, keys: &[&'static str],
                        value: &'static str) -> Self
    {
        let mut params = keys.to_vec();
        params.push(value);
        Self::new(contract, "[]", MemberKind::IndexSet, params)
    }

    /// Declare the member's return type.
    pub fn returns(mut self, returns: ReturnKind) -> Self {
        self.returns = returns;
        self
    }

    /// Mark the member as non-overridable.  Expectations can't be set on it.
    pub fn sealed(mut self) -> Self {
        self.overridable = false;
        self
    }

    pub fn arity(&self) -> usize {
        self.id.params.len()
    }

    pub fn id(&self) -> &MemberId {
        &self.id
    }

    pub fn is_overridable(&self) -> bool {
        self.overridable
    }

    pub fn kind(&self) -> MemberKind {
        self.id.kind
    }

    pub fn return_kind(&self) -> &ReturnKind {
        &self.returns
    }

    /// Render a call to this member, given its already formatted arguments.
    pub(crate) fn fmt_call(&self, f: &mut fmt::Formatter, args: &[String])
        -> fmt::Result
    {
        let id = &self.id;
        match id.kind {
            MemberKind::Method =>
                write!(f, "{}::{}({})", id.contract, id.name, args.join(", ")),
            MemberKind::Getter => write!(f, "{id}"),
            MemberKind::Setter =>
                write!(f, "{}::{} = {} (set)", id.contract, id.name,
                       args.join(", ")),
            MemberKind::IndexGet =>
                write!(f, "{}[{}] (get)", id.contract, args.join(", ")),
            MemberKind::IndexSet => match args.split_last() {
                Some((value, keys)) =>
                    write!(f, "{}[{}] = {value} (set)", id.contract,
                           keys.join(", ")),
                None => write!(f, "{id}")
            }
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Member {}
