// vim: tw=80
//! Per-argument matchers
#![deny(warnings)]

use standin::*;
use standin::matcher::*;

/// Equality always goes through the argument type's own `PartialEq`
#[test]
fn literal_uses_partial_eq() {
    #[derive(Clone, Debug)]
    struct NoCase(String);
    impl PartialEq for NoCase {
        fn eq(&self, other: &Self) -> bool {
            self.0.eq_ignore_ascii_case(&other.0)
        }
    }

    let m = eq(NoCase("Hello".to_owned()));
    assert!(m.matches(&NoCase("HELLO".to_owned())));
    assert!(!m.matches(&NoCase("bye".to_owned())));
}

#[test]
fn wrong_type_never_matches() {
    assert!(!eq(5i32).matches(&5i64));
    assert!(!between(1i32, 10).matches(&5u8));
    assert!(!any::<String>().matches(&5u8));
    assert!(!function(|x: &u32| *x > 0).matches(&"x"));
}

#[test]
fn range_inclusive() {
    let m = between(1u32, 3);
    assert!(m.matches(&1u32));
    assert!(m.matches(&3u32));
    assert!(!m.matches(&0u32));
    assert!(!m.matches(&4u32));
}

#[test]
fn range_exclusive() {
    let m = range(1u32, 3, RangeKind::Exclusive);
    assert!(m.matches(&2u32));
    assert!(!m.matches(&1u32));
    assert!(!m.matches(&3u32));
}

#[test]
fn predicates() {
    let m = satisfies::<u8, _>(predicate::in_iter(vec![2u8, 4, 8]));
    assert!(m.matches(&4u8));
    assert!(!m.matches(&5u8));

    let m = satisfies::<u32, _>(predicate::ne(3u32));
    assert!(m.matches(&4u32));
    assert!(!m.matches(&3u32));
}

#[test]
#[should_panic(expected = "boom")]
fn predicate_panics_propagate() {
    function(|_: &u32| -> bool { panic!("boom") }).matches(&1u32);
}

#[test]
fn display() {
    assert_eq!("5", eq(5i32).to_string());
    assert_eq!("\"abc\"", eq(String::from("abc")).to_string());
    assert_eq!("in [1, 3]", between(1u8, 3).to_string());
    assert_eq!("in (1, 3)", range(1u8, 3, RangeKind::Exclusive).to_string());
    assert_eq!("any::<u32>()", any::<u32>().to_string());
}

#[test]
fn explain_literal() {
    assert_eq!("6 does not satisfy 5", eq(5i32).explain(&6i32));
}

#[test]
fn explain_predicate() {
    let why = satisfies::<u64, _>(predicate::gt(10u64)).explain(&3u64);
    assert!(why.contains("10"), "{why}");
    assert!(why.contains('3'), "{why}");
}

mod rules {
    use super::*;

    #[test]
    fn missing() {
        let rules = Rules::new();
        let e = rules.matcher::<u32>("even", vec![]).unwrap_err();
        assert!(e.is_configuration());
        assert!(matches!(e, Error::MissingRule{..}));
    }

    /// The same name may be registered for different argument types
    #[test]
    fn per_type() {
        let mut rules = Rules::new();
        rules.register("positive", |x: &i32, _| *x > 0)
            .register("positive", |x: &f64, _| *x > 0.0);

        assert!(rules.matcher::<i32>("positive", vec![]).unwrap()
                .matches(&1i32));
        assert!(rules.matcher::<f64>("positive", vec![]).unwrap()
                .matches(&0.5f64));
        let e = rules.matcher::<u8>("positive", vec![]).unwrap_err();
        assert!(matches!(e, Error::MissingRule{..}));
    }

    #[test]
    fn extra_args() {
        let mut rules = Rules::new();
        rules.register("one_of", |x: &String, extra: Args<'_>| {
            extra.iter().any(|v| v.eq_value(x))
        });
        let m = rules.matcher::<String>("one_of",
            args![String::from("a"), String::from("b")]).unwrap();
        assert!(m.matches(&String::from("b")));
        assert!(!m.matches(&String::from("c")));
        assert_eq!("one_of(\"a\", \"b\")", m.to_string());
    }
}
