// vim: tw=80
//! Ordered expectations
#![deny(warnings)]

use standin::*;

fn member(name: &'static str) -> Member {
    Member::method("File", name, &[])
}

fn call(mock: &Mock, name: &'static str) -> Result<Returned> {
    let inv = Invocation::new(member(name), args![]).unwrap();
    mock.intercept(&inv)
}

fn open_then_close() -> Mock {
    let mut seq = Sequence::new();
    let mut mock = Mock::strict("File");
    mock.expect(member("open"), vec![]).unwrap()
        .once()
        .in_sequence(&mut seq).unwrap();
    mock.expect(member("close"), vec![]).unwrap()
        .once()
        .in_sequence(&mut seq).unwrap();
    mock
}

#[test]
fn ok() {
    let mock = open_then_close();
    call(&mock, "open").unwrap();
    call(&mock, "close").unwrap();
    mock.verify_all().unwrap();
}

#[test]
fn out_of_order() {
    let mock = open_then_close();
    let e = call(&mock, "close").unwrap_err();
    assert!(matches!(e, Error::SequenceViolation{..}));
    assert_eq!("File::close() called out of sequence", e.to_string());
}

/// An expectation satisfied earlier in the sequence can't be revisited.
#[test]
fn no_going_back() {
    let mut seq = Sequence::new();
    let mut mock = Mock::loose("File");
    mock.expect(member("open"), vec![]).unwrap()
        .once()
        .in_sequence(&mut seq).unwrap();
    mock.expect(member("read"), vec![]).unwrap()
        .times(2)
        .in_sequence(&mut seq).unwrap();
    call(&mock, "open").unwrap();
    call(&mock, "read").unwrap();
    call(&mock, "read").unwrap();
    assert!(call(&mock, "open").is_err());
}

/// One sequence can order calls across several mocks.
#[test]
fn across_mocks() {
    let mut seq = Sequence::new();
    let mut file = Mock::strict("File");
    let mut log = Mock::strict("Log");
    let write = Member::method("Log", "write", &[]);
    file.expect(member("open"), vec![]).unwrap()
        .once()
        .in_sequence(&mut seq).unwrap();
    log.expect(write.clone(), vec![]).unwrap()
        .once()
        .in_sequence(&mut seq).unwrap();

    let inv = Invocation::new(write, args![]).unwrap();
    assert!(log.intercept(&inv).is_err());
    call(&file, "open").unwrap();
    log.intercept(&inv).unwrap();
}

#[test]
fn requires_exact_count() {
    let mut seq = Sequence::new();
    let mut mock = Mock::strict("File");
    let e = mock.expect(member("open"), vec![]).unwrap()
        .at_least_once()
        .in_sequence(&mut seq)
        .unwrap_err();
    assert!(e.is_configuration());
}
