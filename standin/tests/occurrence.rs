// vim: tw=80
//! Call count bounds.  Ceilings fail the offending call; floors fail
//! verification.
#![deny(warnings)]

use standin::*;

fn ping() -> Member {
    Member::method("Peer", "ping", &[])
}

fn call(mock: &Mock) -> Result<Returned> {
    let inv = Invocation::new(ping(), args![]).unwrap();
    mock.intercept(&inv)
}

fn mock_with(bound: Occurrence) -> Mock {
    let mut mock = Mock::strict("Peer");
    mock.expect(ping(), vec![]).unwrap().occurs(bound);
    mock
}

#[test]
fn at_most_once() {
    let mut mock = Mock::strict("Peer");
    mock.expect(ping(), vec![]).unwrap().at_most_once();
    call(&mock).unwrap();
    let e = call(&mock).unwrap_err();
    assert!(matches!(e, Error::OccurrenceExceeded{limit: 1, ..}));
    assert_eq!("Peer::ping() called more than 1 time(s)", e.to_string());
}

/// A rejected call is not counted
#[test]
fn at_most() {
    let mock = mock_with(Occurrence::AtMost(2));
    call(&mock).unwrap();
    call(&mock).unwrap();
    assert!(call(&mock).is_err());
    assert_eq!(2, mock.store().iter().next().unwrap().hit_count());
    mock.verify_all().unwrap();
}

#[test]
fn at_most_zero_calls() {
    mock_with(Occurrence::AtMost(2)).verify_all().unwrap();
}

#[test]
fn never() {
    let mut mock = Mock::strict("Peer");
    mock.expect(ping(), vec![]).unwrap().never();
    mock.verify_all().unwrap();
    let e = call(&mock).unwrap_err();
    assert!(matches!(e, Error::OccurrenceExceeded{limit: 0, ..}));
}

#[test]
fn between() {
    let mut mock = Mock::strict("Peer");
    mock.expect(ping(), vec![]).unwrap().between(1, 2);
    assert!(mock.verify_all().is_err());
    call(&mock).unwrap();
    mock.verify_all().unwrap();
    call(&mock).unwrap();
    assert!(call(&mock).is_err());
}

#[test]
fn at_least() {
    let mut mock = Mock::strict("Peer");
    mock.expect(ping(), vec![]).unwrap().at_least(2);
    call(&mock).unwrap();
    assert!(mock.verify_all().is_err());
    call(&mock).unwrap();
    call(&mock).unwrap();
    mock.verify_all().unwrap();
}

#[test]
fn at_least_once() {
    let mut mock = Mock::strict("Peer");
    mock.expect(ping(), vec![]).unwrap().at_least_once();
    assert!(mock.verify_all().is_err());
    call(&mock).unwrap();
    mock.verify_all().unwrap();
}

/// Exact counts are checked by verification, not at call time.
#[test]
fn times() {
    let mut mock = Mock::strict("Peer");
    mock.expect(ping(), vec![]).unwrap().times(2);
    for _ in 0..3 {
        call(&mock).unwrap();
    }
    let e = mock.verify_all().unwrap_err();
    assert!(e.to_string().contains("Peer::ping(): expected exactly 2, got 3"));
}

/// An unbounded expectation must be called at least once to verify.
#[test]
fn times_any() {
    let mut mock = Mock::strict("Peer");
    mock.expect(ping(), vec![]).unwrap().once().times_any().verifiable();
    let e = mock.verify().unwrap_err();
    assert!(e.to_string().contains("Peer::ping(): expected at least 1, got 0"));
    call(&mock).unwrap();
    mock.verify().unwrap();
}

#[test]
fn display() {
    assert_eq!("at least 1", Occurrence::Unbounded.to_string());
    assert_eq!("exactly 3", Occurrence::Exactly(3).to_string());
    assert_eq!("at most 1", Occurrence::AtMostOnce.to_string());
    assert_eq!("between 1 and 4", Occurrence::Between(1, 4).to_string());
    assert_eq!("exactly 0", Occurrence::Never.to_string());
}
