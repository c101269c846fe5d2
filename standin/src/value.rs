// vim: tw=80
//! Type-erased argument and return values

use std::{
    any::{self, Any as StdAny},
    fmt
};

use downcast::{downcast, Any};

use crate::{Error, Result};

/// An argument value that can be matched against an expectation.
///
/// Implemented for every `'static` type that is `Debug`, `PartialEq`, `Clone`,
/// `Send` and `Sync`.  Equality always goes through the concrete type's own
/// `PartialEq`, never through identity.
pub trait Value: Any + fmt::Debug + Send + Sync + 'static {
    /// Compare with another value.  Values of different types are never
    /// equal.
    fn eq_value(&self, other: &dyn Value) -> bool;

    fn clone_value(&self) -> Box<dyn Value>;
}
downcast!(dyn Value);

impl<T> Value for T
    where T: Any + fmt::Debug + PartialEq + Clone + Send + Sync
{
    fn eq_value(&self, other: &dyn Value) -> bool {
        other.downcast_ref::<T>()
            .map_or(false, |o| self == o)
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }
}

/// Build a `Vec<Box<dyn Value>>` from plain values.
///
/// # Examples
/// ```
/// # use standin::*;
/// let args = args![5i32, String::from("five")];
/// assert_eq!(2, args.len());
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        ::std::vec![
            $(::std::boxed::Box::new($arg)
              as ::std::boxed::Box<dyn $crate::Value>),*
        ]
    };
}

/// Borrowed view of an invocation's arguments.
///
/// This is what callbacks and return closures receive.
#[derive(Clone, Copy)]
pub struct Args<'a>(&'a [Box<dyn Value>]);

impl<'a> Args<'a> {
    pub(crate) fn new(args: &'a [Box<dyn Value>]) -> Self {
        Args(args)
    }

    /// Fetch argument `i` as a `T`, if it is one.
    pub fn arg<T: Value>(&self, i: usize) -> Option<&'a T> {
        self.get(i)
            .and_then(|v| v.downcast_ref::<T>().ok())
    }

    pub fn get(&self, i: usize) -> Option<&'a dyn Value> {
        self.0.get(i).map(|v| v.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a dyn Value> {
        self.0.iter().map(|v| v.as_ref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'a> fmt::Debug for Args<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> fmt::Display for Args<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, arg) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg:?}")?;
        }
        Ok(())
    }
}

/// The normalized result of executing an invocation.
pub enum Returned {
    /// The member returns nothing.
    Void,
    Value(Box<dyn StdAny + Send>),
}

impl Returned {
    pub fn value<T: Send + 'static>(t: T) -> Self {
        Returned::Value(Box::new(t))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Returned::Void)
    }

    /// Recover the returned value as the member's declared type.
    ///
    /// `Void` converts only into `()`.
    pub fn into_value<T: 'static>(self) -> Result<T> {
        let boxed: Box<dyn StdAny + Send> = match self {
            Returned::Void => Box::new(()),
            Returned::Value(v) => v
        };
        boxed.downcast::<T>()
            .map(|b| *b)
            .map_err(|_| Error::ReturnType {
                expected: any::type_name::<T>()
            })
    }
}

impl fmt::Debug for Returned {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Returned::Void => f.write_str("Void"),
            Returned::Value(_) => f.write_str("Value(..)")
        }
    }
}
