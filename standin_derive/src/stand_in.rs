// vim: tw=80
use proc_macro2::{Span, TokenStream};
use quote::{ToTokens, format_ident, quote};
use syn::{
    Attribute,
    Error,
    FnArg,
    GenericArgument,
    ItemTrait,
    Pat,
    PatIdent,
    PathArguments,
    PathSegment,
    Result,
    ReturnType,
    Signature,
    TraitItem,
    TraitItemFn,
    Type,
    TypeParamBound,
    Visibility,
    spanned::Spanned
};

const PRIMITIVES: &[&str] = &[
    "bool", "char", "f32", "f64", "i8", "i16", "i32", "i64", "i128", "isize",
    "u8", "u16", "u32", "u64", "u128", "usize"
];

/// What a trait method becomes on the stand-in
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum Role {
    #[default]
    Method,
    Getter,
    Setter,
}

/// `#[stand_in(..)]` attributes on a single method
#[derive(Debug, Default)]
struct MethodAttrs {
    role: Role,
    opaque: bool,
    sealed: bool,
}

impl MethodAttrs {
    fn set_role(&mut self, role: Role, span: Span) -> Result<()> {
        if self.role != Role::Method {
            return Err(Error::new(span,
                "a member can be a getter or a setter, but not both"));
        }
        self.role = role;
        Ok(())
    }

    /// Parse and remove every `#[stand_in(..)]` attribute.
    fn take(attrs: &mut Vec<Attribute>) -> Result<Self> {
        let mut out = MethodAttrs::default();
        let mut result = Ok(());
        attrs.retain(|attr| {
            if !attr.path().is_ident("stand_in") {
                return true;
            }
            if result.is_ok() {
                result = attr.parse_nested_meta(|meta| {
                    let span = meta.path.span();
                    if meta.path.is_ident("getter") {
                        out.set_role(Role::Getter, span)
                    } else if meta.path.is_ident("setter") {
                        out.set_role(Role::Setter, span)
                    } else if meta.path.is_ident("opaque") {
                        out.opaque = true;
                        Ok(())
                    } else if meta.path.is_ident("sealed") {
                        out.sealed = true;
                        Ok(())
                    } else {
                        Err(meta.error(
                            "expected `getter`, `setter`, `opaque` or `sealed`"))
                    }
                });
            }
            false
        });
        result.map(|_| out)
    }
}

/// One trait method, validated
struct Method {
    attrs: MethodAttrs,
    sig: Signature,
}

impl Method {
    fn new(item: &mut TraitItemFn) -> Result<Self> {
        let attrs = MethodAttrs::take(&mut item.attrs)?;
        let sig = &item.sig;
        if !sig.generics.params.is_empty() ||
            sig.generics.where_clause.is_some()
        {
            return Err(Error::new(sig.generics.span(),
                "generic methods are not supported"));
        }
        if let Some(a) = &sig.asyncness {
            return Err(Error::new(a.span(), "async methods are not supported"));
        }
        match sig.inputs.first() {
            Some(FnArg::Receiver(r))
                if r.reference.is_some() && r.colon_token.is_none() => (),
            Some(FnArg::Receiver(r)) => return Err(Error::new(r.span(),
                "only &self and &mut self receivers are supported")),
            _ => return Err(Error::new(sig.ident.span(),
                "static methods are not supported"))
        }
        if let ReturnType::Type(_, ty) = &sig.output {
            match ty.as_ref() {
                Type::Reference(_) => return Err(Error::new(ty.span(),
                    "methods returning references are not supported")),
                Type::ImplTrait(_) => return Err(Error::new(ty.span(),
                    "methods returning impl Trait are not supported")),
                _ => ()
            }
        }
        let nargs = sig.inputs.len() - 1;
        match attrs.role {
            Role::Getter
                if nargs != 0 || matches!(sig.output, ReturnType::Default) =>
                return Err(Error::new(sig.ident.span(),
                    "a getter takes no arguments and returns a value")),
            Role::Setter if nargs != 1 =>
                return Err(Error::new(sig.ident.span(),
                    "a setter takes exactly one argument")),
            _ => ()
        }
        if attrs.sealed && item.default.is_none() {
            return Err(Error::new(sig.ident.span(),
                "only methods with a default body can be sealed"));
        }
        Ok(Method{attrs, sig: sig.clone()})
    }

    fn descriptor_ident(&self) -> syn::Ident {
        format_ident!("member_{}", self.sig.ident)
    }

    /// Parameter types, excluding the receiver
    fn param_types(&self) -> Vec<String> {
        self.sig.inputs.iter()
            .filter_map(|arg| match arg {
                FnArg::Typed(pt) => Some(pt.ty.to_token_stream().to_string()),
                FnArg::Receiver(_) => None
            }).collect()
    }

    /// The property name for getters and setters
    fn property(&self) -> String {
        let name = self.sig.ident.to_string();
        let prefix = match self.attrs.role {
            Role::Setter => "set_",
            _ => "get_"
        };
        name.strip_prefix(prefix)
            .map(str::to_owned)
            .unwrap_or(name)
    }

    /// Generate the associated function that describes this member
    fn descriptor(&self, vis: &Visibility) -> TokenStream {
        let fname = self.descriptor_ident();
        let params = self.param_types();
        let member = match self.attrs.role {
            Role::Method => {
                let name = self.sig.ident.to_string();
                quote!(::standin::Member::method(Self::CONTRACT, #name,
                                                 &[#(#params),*]))
            },
            Role::Getter => {
                let prop = self.property();
                quote!(::standin::Member::getter(Self::CONTRACT, #prop))
            },
            Role::Setter => {
                let prop = self.property();
                let param = &params[0];
                quote!(::standin::Member::setter(Self::CONTRACT, #prop, #param))
            }
        };
        let returns = return_kind(&self.sig.output, self.attrs.opaque);
        let sealed = self.attrs.sealed.then(|| quote!(.sealed()));
        quote! {
            #vis fn #fname() -> ::standin::Member {
                #member.returns(#returns)#sealed
            }
        }
    }

    /// Generate the trait method that forwards to the mock
    fn forward(&self) -> TokenStream {
        let mut sig = self.sig.clone();
        let mut captures = Vec::new();
        for (i, arg) in sig.inputs.iter_mut().skip(1).enumerate() {
            if let FnArg::Typed(pt) = arg {
                let ident = format_ident!("__standin_arg{}", i);
                captures.push(match pt.ty.as_ref() {
                    Type::Reference(_) =>
                        quote!(::std::borrow::ToOwned::to_owned(&*#ident)),
                    _ => quote!(#ident)
                });
                *pt.pat = Pat::Ident(PatIdent {
                    attrs: Vec::new(),
                    by_ref: None,
                    mutability: None,
                    ident,
                    subpat: None
                });
            }
        }
        let output = match &sig.output {
            ReturnType::Default => quote!(()),
            ReturnType::Type(_, ty) => quote!(#ty)
        };
        let fname = self.descriptor_ident();
        quote! {
            #sig {
                ::standin::__private::answer::<#output>(
                    &self.mock,
                    Self::#fname(),
                    ::std::vec![#(
                        ::std::boxed::Box::new(#captures)
                            as ::std::boxed::Box<dyn ::standin::Value>
                    ),*]
                )
            }
        }
    }
}

/// Pick the `ReturnKind` constructor for a method's output.
fn return_kind(output: &ReturnType, opaque: bool) -> TokenStream {
    match output {
        ReturnType::Default => quote!(::standin::ReturnKind::void()),
        ReturnType::Type(_, ty) if opaque =>
            quote!(::standin::ReturnKind::opaque::<#ty>()),
        ReturnType::Type(_, ty) => classify(ty)
    }
}

/// Classify a return type by its syntax alone.
fn classify(ty: &Type) -> TokenStream {
    match ty {
        Type::Tuple(t) if t.elems.is_empty() =>
            quote!(::standin::ReturnKind::void()),
        Type::Paren(p) => classify(&p.elem),
        Type::Group(g) => classify(&g.elem),
        Type::Path(tp) if tp.qself.is_none() => {
            let Some(seg) = tp.path.segments.last() else {
                return quote!(::standin::ReturnKind::value_type::<#ty>());
            };
            let name = seg.ident.to_string();
            if tp.path.segments.len() == 1 &&
                PRIMITIVES.contains(&name.as_str())
            {
                return quote!(::standin::ReturnKind::primitive::<#ty>());
            }
            match (name.as_str(), single_type_arg(seg)) {
                ("Option", Some(inner)) => match vec_elem(inner) {
                    Some(elem) => quote!(::standin::ReturnKind::list::<#elem>()),
                    None => quote!(::standin::ReturnKind::nullable::<#inner>())
                },
                ("Vec", Some(elem)) =>
                    quote!(::standin::ReturnKind::array::<#elem>()),
                ("Box", Some(inner)) => match iterator_item(inner) {
                    Some(item) =>
                        quote!(::standin::ReturnKind::iterable::<#item>()),
                    None => quote!(::standin::ReturnKind::opaque::<#ty>())
                },
                ("Result", _) => quote!(::standin::ReturnKind::opaque::<#ty>()),
                _ => quote!(::standin::ReturnKind::value_type::<#ty>())
            }
        },
        _ => quote!(::standin::ReturnKind::value_type::<#ty>())
    }
}

/// The `T` in `Foo<T>`, if that is the segment's only generic argument
fn single_type_arg(seg: &PathSegment) -> Option<&Type> {
    let PathArguments::AngleBracketed(abga) = &seg.arguments else {
        return None;
    };
    if abga.args.len() != 1 {
        return None;
    }
    match abga.args.first() {
        Some(GenericArgument::Type(ty)) => Some(ty),
        _ => None
    }
}

fn vec_elem(ty: &Type) -> Option<&Type> {
    let Type::Path(tp) = ty else {
        return None;
    };
    tp.path.segments.last()
        .filter(|seg| seg.ident == "Vec")
        .and_then(single_type_arg)
}

/// The `T` in `dyn Iterator<Item = T> + Send`.  Any other set of bounds is
/// not recognized.
fn iterator_item(ty: &Type) -> Option<&Type> {
    let Type::TraitObject(obj) = ty else {
        return None;
    };
    let mut item = None;
    let mut send = false;
    let mut ntraits = 0;
    for bound in obj.bounds.iter() {
        let TypeParamBound::Trait(tb) = bound else {
            continue;
        };
        ntraits += 1;
        let seg = tb.path.segments.last()?;
        if seg.ident == "Send" {
            send = true;
        } else if seg.ident == "Iterator" {
            if let PathArguments::AngleBracketed(abga) = &seg.arguments {
                item = abga.args.iter().find_map(|arg| match arg {
                    GenericArgument::AssocType(at) if at.ident == "Item" =>
                        Some(&at.ty),
                    _ => None
                });
            }
        }
    }
    item.filter(|_| send && ntraits == 2)
}

fn accumulate(errors: &mut Option<Error>, e: Error) {
    match errors {
        Some(errs) => errs.combine(e),
        None => *errors = Some(e)
    }
}

/// Validate the trait, stripping `#[stand_in(..)]` attributes from its
/// methods along the way.
fn collect(item: &mut ItemTrait) -> Result<Vec<Method>> {
    let mut errors = None;
    if !item.generics.params.is_empty() ||
        item.generics.where_clause.is_some()
    {
        accumulate(&mut errors, Error::new(item.generics.span(),
            "generic traits are not supported"));
    }
    if !item.supertraits.is_empty() {
        accumulate(&mut errors, Error::new(item.supertraits.span(),
            "supertraits are not supported"));
    }
    let mut methods = Vec::new();
    for ti in item.items.iter_mut() {
        match ti {
            TraitItem::Fn(f) => match Method::new(f) {
                Ok(m) => methods.push(m),
                Err(e) => accumulate(&mut errors, e)
            },
            TraitItem::Type(t) => accumulate(&mut errors, Error::new(t.span(),
                "associated types are not supported")),
            TraitItem::Const(c) => accumulate(&mut errors, Error::new(c.span(),
                "associated constants are not supported")),
            other => accumulate(&mut errors, Error::new(other.span(),
                "unsupported trait item"))
        }
    }
    match errors {
        Some(e) => Err(e),
        None => Ok(methods)
    }
}

fn gen(item: &ItemTrait, methods: &[Method]) -> TokenStream {
    let vis = &item.vis;
    let unsafety = &item.unsafety;
    let trait_ident = &item.ident;
    let ident = format_ident!("StandIn{}", trait_ident);
    let contract = trait_ident.to_string();
    let doc = format!("Stand-in for `{contract}`, driven by a `Mock`");
    let descriptors = methods.iter()
        .map(|m| m.descriptor(vis));
    let forwards = methods.iter()
        .filter(|m| !m.attrs.sealed)
        .map(Method::forward);
    quote! {
        #[doc = #doc]
        #[allow(dead_code)]
        #vis struct #ident {
            mock: ::std::sync::Arc<::standin::Mock>,
        }

        #[allow(dead_code)]
        #[allow(missing_docs)]
        impl #ident {
            /// Contract name shared by every member of this stand-in
            #vis const CONTRACT: &'static str = #contract;

            #vis fn new(mock: ::standin::Mock) -> Self {
                Self::from_shared(::std::sync::Arc::new(mock))
            }

            #vis fn from_shared(mock: ::std::sync::Arc<::standin::Mock>)
                -> Self
            {
                #ident{mock}
            }

            #vis fn builder() -> ::standin::MockBuilder {
                ::standin::Mock::builder(Self::CONTRACT)
            }

            #vis fn mock(&self) -> &::standin::Mock {
                &self.mock
            }

            #vis fn shared(&self) -> ::std::sync::Arc<::standin::Mock> {
                ::std::sync::Arc::clone(&self.mock)
            }

            #(#descriptors)*
        }

        #unsafety impl #trait_ident for #ident {
            #(#forwards)*
        }

        impl ::std::fmt::Debug for #ident {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>)
                -> ::std::fmt::Result
            {
                f.debug_struct(stringify!(#ident))
                    .field("mock", &self.mock)
                    .finish()
            }
        }

        impl ::standin::Invocable for #ident {
            fn invoke(&self, invocation: &::standin::Invocation)
                -> ::standin::Result<::standin::Returned>
            {
                self.mock.intercept(invocation)
            }
        }
    }
}

pub(crate) fn do_stand_in(attrs: TokenStream, input: TokenStream)
    -> TokenStream
{
    let mut item: ItemTrait = match syn::parse2(input) {
        Ok(item) => item,
        Err(e) => return e.to_compile_error()
    };
    let generated = if attrs.is_empty() {
        collect(&mut item).map(|methods| gen(&item, &methods))
    } else {
        Err(Error::new(attrs.span(), "#[stand_in] takes no arguments"))
    };
    let mut output = item.to_token_stream();
    match generated {
        Ok(ts) => output.extend(ts),
        Err(e) => output.extend(e.to_compile_error())
    }
    output
}

/// Unit tests for `#[stand_in]`
#[cfg(test)]
mod t {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;

    /// Token spacing differs between `quote!` and parsed strings, so compare
    /// without whitespace.
    fn squash(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn check_kind(ty: &str, desired: &str) {
        let ty: Type = syn::parse_str(ty).unwrap();
        let output = classify(&ty).to_string();
        assert_eq!(squash(desired), squash(&output));
    }

    fn expand(code: &str) -> String {
        let ts = TokenStream::from_str(code).unwrap();
        squash(&do_stand_in(TokenStream::new(), ts).to_string())
    }

    fn assert_contains(output: &str, desired: &str) {
        let expected = squash(desired);
        assert!(output.contains(&expected),
            "{output}\ndoes not contain\n{expected}");
    }

    mod classify {
        use super::*;

        #[test]
        fn array() {
            check_kind("Vec<u8>", "::standin::ReturnKind::array::<u8>()");
        }

        #[test]
        fn iterable() {
            check_kind("Box<dyn Iterator<Item = u32> + Send>",
                "::standin::ReturnKind::iterable::<u32>()");
        }

        /// Without `Send` the boxed iterator doesn't match the synthesized
        /// default's type.
        #[test]
        fn iterable_without_send() {
            check_kind("Box<dyn Iterator<Item = u32>>",
                "::standin::ReturnKind::opaque::<Box<dyn Iterator<Item = u32>>>()");
        }

        #[test]
        fn list() {
            check_kind("Option<Vec<String>>",
                "::standin::ReturnKind::list::<String>()");
        }

        #[test]
        fn nullable() {
            check_kind("Option<String>",
                "::standin::ReturnKind::nullable::<String>()");
        }

        #[test]
        fn primitive() {
            check_kind("u32", "::standin::ReturnKind::primitive::<u32>()");
            check_kind("bool", "::standin::ReturnKind::primitive::<bool>()");
        }

        #[test]
        fn result() {
            check_kind("Result<u32, std::io::Error>",
                "::standin::ReturnKind::opaque::<Result<u32, std::io::Error>>()");
        }

        #[test]
        fn unit() {
            check_kind("()", "::standin::ReturnKind::void()");
        }

        #[test]
        fn value_type() {
            check_kind("String", "::standin::ReturnKind::value_type::<String>()");
            check_kind("(u8, u8)",
                "::standin::ReturnKind::value_type::<(u8, u8)>()");
        }
    }

    mod expand {
        use super::*;

        #[test]
        fn descriptor() {
            let output = expand(r#"
                trait Calculator {
                    fn add(&self, x: i32, y: i32) -> i32;
                }
            "#);
            assert_contains(&output, r#"
                fn member_add() -> ::standin::Member {
                    ::standin::Member::method(Self::CONTRACT, "add",
                                              &["i32", "i32"])
                    .returns(::standin::ReturnKind::primitive::<i32>())
                }
            "#);
            assert_contains(&output,
                r#"const CONTRACT: &'static str = "Calculator";"#);
            assert_contains(&output, "impl Calculator for StandInCalculator");
        }

        #[test]
        fn getter_and_setter() {
            let output = expand(r#"
                pub trait Gauge {
                    #[stand_in(getter)]
                    fn level(&self) -> u32;
                    #[stand_in(setter)]
                    fn set_level(&mut self, level: u32);
                }
            "#);
            assert_contains(&output,
                r#"::standin::Member::getter(Self::CONTRACT, "level")"#);
            assert_contains(&output,
                r#"::standin::Member::setter(Self::CONTRACT, "level", "u32")"#);
            assert_contains(&output, "pub fn member_level()");
            assert!(!output.contains("stand_in(getter)"));
            assert!(!output.contains("stand_in(setter)"));
        }

        #[test]
        fn reference_args_are_owned() {
            let output = expand(r#"
                trait Greeter {
                    fn greet(&self, name: &str) -> String;
                }
            "#);
            assert_contains(&output,
                "::std::borrow::ToOwned::to_owned(&*__standin_arg0)");
        }

        #[test]
        fn sealed() {
            let output = expand(r#"
                trait Greeter {
                    #[stand_in(sealed)]
                    fn hello(&self) -> u32 { 1 }
                }
            "#);
            assert_contains(&output, ".sealed()");
            assert!(!output.contains("__private::answer"));
        }

        #[test]
        fn untouched_attributes_are_kept() {
            let output = expand(r#"
                trait Greeter {
                    #[doc = "says hi"]
                    fn hello(&self);
                }
            "#);
            assert_contains(&output, r#"#[doc = "says hi"]"#);
        }
    }

    mod errors {
        use super::*;

        fn check_error(code: &str, msg: &str) {
            let output = expand(code);
            assert!(output.contains("compile_error"), "{output}");
            assert!(output.contains(&squash(msg)), "{output}");
        }

        #[test]
        fn associated_type() {
            check_error("trait Foo { type T; fn foo(&self); }",
                "associated types are not supported");
        }

        #[test]
        fn generic_method() {
            check_error("trait Foo { fn foo<T>(&self, t: T); }",
                "generic methods are not supported");
        }

        #[test]
        fn getter_with_args() {
            check_error(r#"
                trait Foo {
                    #[stand_in(getter)]
                    fn foo(&self, x: u32) -> u32;
                }
            "#, "a getter takes no arguments and returns a value");
        }

        #[test]
        fn reference_return() {
            check_error("trait Foo { fn foo(&self) -> &u32; }",
                "methods returning references are not supported");
        }

        #[test]
        fn sealed_without_body() {
            check_error(r#"
                trait Foo {
                    #[stand_in(sealed)]
                    fn foo(&self);
                }
            "#, "only methods with a default body can be sealed");
        }

        #[test]
        fn static_method() {
            check_error("trait Foo { fn foo() -> u32; }",
                "static methods are not supported");
        }

        #[test]
        fn unknown_attribute() {
            check_error(r#"
                trait Foo {
                    #[stand_in(frobnicate)]
                    fn foo(&self);
                }
            "#, "expected `getter`, `setter`, `opaque` or `sealed`");
        }

        /// Even on error, the trait itself is still emitted, without our
        /// attributes.
        #[test]
        fn trait_survives() {
            let output = expand(r#"
                trait Foo {
                    #[stand_in(sealed)]
                    fn foo(&self);
                }
            "#);
            assert_contains(&output, "trait Foo { fn foo(&self); }");
        }
    }
}
