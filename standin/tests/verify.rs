// vim: tw=80
//! Verification reports every unmet expectation at once
#![deny(warnings)]

use standin::*;
use standin::matcher::{eq, any};

fn submit() -> Member {
    Member::method("Form", "submit", &[])
}

fn fill() -> Member {
    Member::method("Form", "fill", &["String", "u32"])
}

#[test]
fn exactly_once_never_called() {
    let mut mock = Mock::loose("Form");
    mock.expect(submit(), vec![]).unwrap().times(1);
    let e = mock.verify_all().unwrap_err();
    assert!(matches!(e, Error::VerificationFailed(_)));
    assert_eq!("1 expectation(s) unmet:\n  Form::submit(): expected exactly 1, got 0",
               e.to_string());
}

#[test]
fn reports_all_unmet() {
    let mut mock = Mock::loose("Form");
    mock.expect(submit(), vec![]).unwrap().once().verifiable();
    mock.expect(fill(), vec![eq(String::from("name")), any::<u32>()]).unwrap()
        .verifiable();
    let Err(Error::VerificationFailed(report)) = mock.verify() else {
        panic!("verification should have failed");
    };
    assert_eq!(2, report.unmet().len());

    let first = &report.unmet()[0];
    assert_eq!("Form::submit", first.member());
    assert!(first.matchers().is_empty());
    assert_eq!(Occurrence::Exactly(1), first.expected());
    assert_eq!(0, first.actual());

    let second = &report.unmet()[1];
    assert_eq!("Form::fill", second.member());
    assert_eq!(vec!["\"name\"".to_owned(), "any::<u32>()".to_owned()],
               second.matchers());
    assert_eq!("Form::fill(\"name\", any::<u32>()): expected at least 1, got 0",
               second.to_string());
}

/// `verify` only looks at expectations marked verifiable.
#[test]
fn verifiable_only() {
    let mut mock = Mock::loose("Form");
    mock.expect(submit(), vec![]).unwrap().once();
    mock.verify().unwrap();
    assert!(mock.verify_all().is_err());
}

#[test]
fn satisfied() {
    let mut mock = Mock::loose("Form");
    mock.expect(submit(), vec![]).unwrap().once().verifiable();
    let inv = Invocation::new(submit(), args![]).unwrap();
    mock.intercept(&inv).unwrap();
    let report = mock.verification(Strictness::All);
    assert!(report.is_success());
    assert_eq!("all expectations satisfied", report.to_string());
    mock.verify().unwrap();
    mock.verify_all().unwrap();
}

/// Properties and indexers are described the way they are accessed.
#[test]
fn non_method_descriptions() {
    let value = Member::getter("Counter", "value")
        .returns(ReturnKind::primitive::<u32>());
    let set_value = Member::setter("Counter", "value", "u32");
    let cell = Member::index_getter("Grid", &["usize", "usize"])
        .returns(ReturnKind::primitive::<u8>());
    let set_cell = Member::index_setter("Grid", &["usize"], "u8");

    let mut mock = Mock::loose("Counter");
    mock.expect(value, vec![]).unwrap().once();
    mock.expect(set_value, vec![eq(5u32)]).unwrap().once();
    mock.expect(cell, vec![eq(0usize), any::<usize>()]).unwrap().once();
    let e = mock.verify_all().unwrap_err();
    assert_eq!("3 expectation(s) unmet:\n  \
                Counter::value (get): expected exactly 1, got 0\n  \
                Counter::value = 5 (set): expected exactly 1, got 0\n  \
                Grid[0, any::<usize>()] (get): expected exactly 1, got 0",
               e.to_string());

    let inv = Invocation::new(set_cell, args![2usize, 7u8]).unwrap();
    assert_eq!("Grid[2] = 7 (set)", inv.to_string());
}
