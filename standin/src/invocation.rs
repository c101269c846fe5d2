// vim: tw=80
use std::fmt;

use crate::{Args, Error, Member, Result, Value};

/// One concrete call made against a stand-in.
///
/// Carries the called member and the already-evaluated argument values.  The
/// number of arguments always equals the member's declared arity.
#[derive(Debug)]
pub struct Invocation {
    member: Member,
    args: Vec<Box<dyn Value>>,
}

impl Invocation {
    /// # Examples
    /// ```
    /// # use standin::*;
    /// let echo = Member::method("Calculator", "echo", &["i32"]);
    /// assert!(Invocation::new(echo.clone(), args![5]).is_ok());
    /// assert!(Invocation::new(echo, args![5, 6]).is_err());
    /// ```
    pub fn new(member: Member, args: Vec<Box<dyn Value>>) -> Result<Self> {
        if args.len() != member.arity() {
            return Err(Error::Arity {
                member: member.to_string(),
                expected: member.arity(),
                actual: args.len()
            });
        }
        Ok(Invocation{member, args})
    }

    pub fn arg<T: Value>(&self, i: usize) -> Option<&T> {
        self.args().arg(i)
    }

    pub fn args(&self) -> Args<'_> {
        Args::new(&self.args)
    }

    pub fn member(&self) -> &Member {
        &self.member
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let args = self.args()
            .iter()
            .map(|a| format!("{a:?}"))
            .collect::<Vec<_>>();
        self.member.fmt_call(f, &args)
    }
}
