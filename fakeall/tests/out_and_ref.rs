// vim: tw=80
//! Writing values back to `&mut` arguments
use fakeall::*;
use pretty_assertions::assert_eq;

#[fake]
trait Parser {
    fn parse(&self, input: &str, value: &mut u32, rest: &mut String) -> bool;
    fn reset(&mut self, value: &mut u32);
}

#[test]
fn assigned_in_declaration_order() {
    let fake = FakeParser::new();
    fake.call_to_parse(arg::eq(String::from("12ab")), arg::ignored(),
                       arg::ignored())
        .returns(true)
        .unwrap()
        .assigns_out_and_ref_parameters(values![12u32, String::from("ab")])
        .unwrap();
    let mut value = 0;
    let mut rest = String::new();
    assert!(fake.parse("12ab", &mut value, &mut rest));
    assert_eq!(12, value);
    assert_eq!("ab", rest);
}

#[test]
fn input_value_is_recorded() {
    let fake = FakeParser::new();
    let mut value = 7;
    let mut rest = String::from("before");
    fake.parse("x", &mut value, &mut rest);
    // No rule assigned anything
    assert_eq!(7, value);
    assert_eq!("before", rest);
    let calls = fake.recorded_calls();
    assert_eq!("Parser.parse(input: \"x\", value: 7, rest: \"before\")",
               calls[0].to_string());
}

#[test]
fn lazily_assigned() {
    let fake = FakeParser::new();
    fake.call_to_reset(arg::ignored())
        .assigns_out_and_ref_parameters_lazily(|call| {
            let old = *call.get::<u32>(0).unwrap();
            values![old * 2]
        })
        .unwrap();
    let mut value = 21;
    fake.reset(&mut value);
    assert_eq!(42, value);
}

#[test]
fn count_checked_when_configured() {
    let fake = FakeParser::new();
    let e = fake.call_to_parse(arg::ignored(), arg::ignored(), arg::ignored())
        .assigns_out_and_ref_parameters(values![1u32])
        .unwrap_err();
    assert_eq!(concat!(
        "The number of values for out and ref parameters specified does not ",
        "match the number of out and ref parameters in the call ",
        "Parser.parse(input: <Ignored>, value: <Ignored>, rest: <Ignored>): ",
        "expected 2, got 1."), e.to_string());
}

#[test]
fn count_checked_when_called() {
    let fake = FakeParser::new();
    fake.call_to_parse(arg::ignored(), arg::ignored(), arg::ignored())
        .assigns_out_and_ref_parameters_lazily(|_| values![1u32])
        .unwrap();
    let mut value = 0;
    let mut rest = String::new();
    let outcome = fake.fake_manager().intercept_with(
        FakeParser::parse_method(),
        values![String::from("x"), value, rest.clone()]);
    let e = outcome.into_result::<bool>().unwrap_err();
    assert!(matches!(e.as_fake_error(),
                     Some(FakeError::OutAndRefCount { expected: 2, actual: 1, .. })));
    // The faked method itself panics
    let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        fake.parse("x", &mut value, &mut rest)
    }));
    assert!(r.is_err());
}

#[test]
fn types_checked_when_configured() {
    let fake = FakeParser::new();
    let e = fake.call_to_parse(arg::ignored(), arg::ignored(), arg::ignored())
        .assigns_out_and_ref_parameters(values![12i32, String::from("ab")])
        .unwrap_err();
    assert_eq!(FakeError::OutAndRefType {
        call: "Parser.parse(input: <Ignored>, value: <Ignored>, rest: <Ignored>)"
            .to_owned(),
        parameter: "value".to_owned(),
        expected: "u32".to_owned(),
        actual: "i32".to_owned()
    }, e);
    assert_eq!(ErrorKind::Configuration, e.kind());
}

#[test]
fn types_checked_when_called() {
    let fake = FakeParser::new();
    fake.call_to_parse(arg::ignored(), arg::ignored(), arg::ignored())
        .assigns_out_and_ref_parameters_lazily(|_| {
            values![12u32, 7u8]
        })
        .unwrap();
    let outcome = fake.fake_manager().intercept_with(
        FakeParser::parse_method(),
        values![String::from("x"), 0u32, String::new()]);
    let e = outcome.into_result::<bool>().unwrap_err();
    assert!(matches!(e.as_fake_error(),
                     Some(FakeError::OutAndRefType { parameter, actual, .. })
                         if parameter == "rest" && actual == "u8"));
    // Nothing is written back
    let mut value = 0;
    let mut rest = String::from("kept");
    let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        fake.parse("x", &mut value, &mut rest)
    }));
    assert!(r.is_err());
    assert_eq!(0, value);
    assert_eq!("kept", rest);
}
