// vim: tw=80
//! Proc Macros for use with Standin
//!
//! You probably don't want to use this crate directly.  Instead, use its
//! reexports via the `standin` crate.

extern crate proc_macro;

mod stand_in;

/// Generate a stand-in for a trait.
///
/// For a trait named `Foo`, emits a struct `StandInFoo` that implements `Foo`
/// by forwarding every call to a `standin::Mock`.  The struct also gets a
/// `member_<method>()` descriptor for each method, to declare expectations
/// with.
///
/// Methods may be refined with an attribute:
/// * `#[stand_in(getter)]`: a property read.  Takes no arguments.
/// * `#[stand_in(setter)]`: a property write.  Takes exactly one argument.
///   A `set_` prefix is dropped from the property name.
/// * `#[stand_in(opaque)]`: the return type has no usable default.
/// * `#[stand_in(sealed)]`: the method's default body always runs, and no
///   expectation may be declared on it.
///
/// Reference arguments are recorded as owned values, so a `&str` argument is
/// matched as a `String`.  Generic traits, generic or static methods,
/// associated items, and methods returning references or `impl Trait` are
/// not supported.
#[proc_macro_attribute]
pub fn stand_in(attrs: proc_macro::TokenStream, input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    stand_in::do_stand_in(attrs.into(), input.into()).into()
}
