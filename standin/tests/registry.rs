// vim: tw=80
//! Mapping stand-ins back to their mocks
#![deny(warnings)]

use std::sync::Arc;

use standin::*;

#[test]
fn lookup() {
    let registry = MockRegistry::new();
    let a = 1u32;
    let b = 2u32;
    let mock = Arc::new(Mock::loose("Stub"));
    registry.register(&a, mock.clone());
    assert!(Arc::ptr_eq(&mock, &registry.lookup(&a).unwrap()));
    assert!(registry.lookup(&b).is_none());
    assert_eq!(1, registry.len());
}

#[test]
fn replace() {
    let registry = MockRegistry::new();
    let stub = String::from("stub");
    let first = Arc::new(Mock::loose("Stub"));
    let second = Arc::new(Mock::strict("Stub"));
    registry.register(&stub, first);
    registry.register(&stub, second.clone());
    assert_eq!(1, registry.len());
    assert!(Arc::ptr_eq(&second, &registry.lookup(&stub).unwrap()));
}

#[test]
fn clear() {
    let registry = MockRegistry::new();
    let stub = String::from("stub");
    registry.register(&stub, Arc::new(Mock::loose("Stub")));
    assert!(!registry.is_empty());
    registry.clear();
    assert!(registry.is_empty());
    assert!(registry.lookup(&stub).is_none());
}

/// Unsized stand-ins, like trait objects, work too.
#[test]
fn trait_object() {
    let registry = MockRegistry::new();
    let stub: Box<dyn std::fmt::Debug> = Box::new(3u32);
    let mock = Arc::new(Mock::loose("Stub"));
    registry.register(&*stub, mock.clone());
    assert!(Arc::ptr_eq(&mock, &registry.lookup(&*stub).unwrap()));
}

/// A struct and its first field share an address, yet they are different
/// stand-ins.
#[test]
fn first_field() {
    #[repr(C)]
    struct Outer {
        inner: u32,
        _pad: u64,
    }

    let registry = MockRegistry::new();
    let outer = Outer{inner: 1, _pad: 0};
    registry.register(&outer, Arc::new(Mock::loose("Outer")));
    assert!(registry.lookup(&outer).is_some());
    assert!(registry.lookup(&outer.inner).is_none());
}
