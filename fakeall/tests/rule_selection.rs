// vim: tw=80
//! Which rule handles a call
use fakeall::*;

#[fake]
trait Foo {
    fn foo(&self, x: u32) -> u32;
    fn bar(&self, x: u32, y: u32) -> String;
    fn baz(&self) -> u64;
}

#[test]
fn newest_rule_wins() {
    let fake = FakeFoo::new();
    fake.call_to_foo(arg::any::<u32>()).returns(1u32).unwrap();
    fake.call_to_foo(arg::eq(5u32)).returns(2u32).unwrap();
    assert_eq!(2, fake.foo(5));
    assert_eq!(1, fake.foo(6));

    // A later, more general rule hides the earlier specific one
    fake.call_to_foo(arg::ignored()).returns(3u32).unwrap();
    assert_eq!(3, fake.foo(5));
}

#[test]
fn spent_rules_fall_through() {
    let fake = FakeFoo::new();
    fake.call_to_foo(arg::ignored()).returns(1u32).unwrap();
    fake.call_to_foo(arg::ignored())
        .returns(2u32)
        .unwrap()
        .twice();
    assert_eq!(2, fake.foo(0));
    assert_eq!(2, fake.foo(0));
    assert_eq!(1, fake.foo(0));
    assert_eq!(Some(0), fake.fake_manager().rules()[1].remaining());
}

#[test]
fn sequence() {
    let fake = FakeFoo::new();
    fake.call_to_foo(arg::ignored())
        .returns_next_from_sequence(vec![7u32, 8, 9])
        .unwrap();
    let values = (0..4).map(|_| fake.foo(0)).collect::<Vec<_>>();
    assert_eq!(vec![7, 8, 9, 0], values);
}

#[test]
fn where_call() {
    let fake = FakeFoo::new();
    fake.call_to_bar(arg::ignored(), arg::ignored())
        .where_call("x is less than y", |call| {
            call.get::<u32>(0) < call.get::<u32>(1)
        })
        .returns(String::from("ascending"))
        .unwrap();
    assert_eq!("ascending", fake.bar(1, 2));
    assert_eq!("", fake.bar(2, 1));
    let rule = fake.fake_manager().rules()[0].to_string();
    assert_eq!("Foo.bar(x: <Ignored>, y: <Ignored>) where x is less than y",
               rule);
}

#[test]
fn when_arguments_match() {
    let fake = FakeFoo::new();
    fake.call_to_bar(arg::eq(100u32), arg::eq(100u32))
        .when_arguments_match(|call| call.get::<u32>(0) == Some(&1))
        .returns(String::from("first is one"))
        .unwrap();
    assert_eq!("first is one", fake.bar(1, 42));
    assert_eq!("", fake.bar(100, 100));
}

#[test]
fn any_call_with_return_type() {
    let fake = FakeFoo::new();
    fake.call_to_any()
        .with_return_type::<u32>()
        .returns(11u32)
        .unwrap();
    assert_eq!(11, fake.foo(0));
    assert_eq!(0, fake.baz());
    assert_eq!("", fake.bar(0, 0));
}

#[test]
fn lazy_return_values() {
    let fake = FakeFoo::new();
    fake.call_to_foo(arg::ignored())
        .returns_lazily(|call| call.get::<u32>(0).copied().unwrap_or(0) * 10)
        .unwrap();
    fake.call_to_bar(arg::ignored(), arg::ignored())
        .returns_lazily_with(|(x, y): (u32, u32)| format!("{}-{}", x, y))
        .unwrap();
    assert_eq!(30, fake.foo(3));
    assert_eq!("1-2", fake.bar(1, 2));
}

#[test]
fn callback_signature_mismatch() {
    let fake = FakeFoo::new();
    fake.call_to_foo(arg::ignored())
        .returns_lazily_with(|(s,): (String,)| s.len() as u32)
        .unwrap();
    let outcome = fake.fake_manager()
        .intercept_with(FakeFoo::foo_method(), values![3u32]);
    let e = outcome.into_result::<u32>().unwrap_err();
    assert_eq!(
        Some(&FakeError::CallbackSignature {
            operation: "returns_lazily_with",
            faked: String::from("u32"),
            callback: String::from("String")
        }),
        e.as_fake_error());
}

#[test]
fn behavior_defined_twice() {
    let fake = FakeFoo::new();
    let e = fake.call_to_foo(arg::eq(1u32))
        .returns(1u32)
        .unwrap()
        .returns(2u32)
        .unwrap_err();
    assert_eq!(ErrorKind::Configuration, e.kind());
    assert_eq!(
        "The behavior for this call has already been defined: Foo.foo(x: 1)",
        e.to_string());
}

#[test]
fn wrong_return_type() {
    let fake = FakeFoo::new();
    let e = fake.call_to_foo(arg::ignored())
        .returns(String::from("nope"))
        .unwrap_err();
    assert!(matches!(e, FakeError::ReturnType { .. }));
}

#[test]
fn does_nothing_overrides() {
    let fake = FakeFoo::new();
    fake.call_to_foo(arg::ignored()).returns(5u32).unwrap();
    fake.call_to_foo(arg::eq(0u32)).does_nothing().unwrap();
    assert_eq!(0, fake.foo(0));
    assert_eq!(5, fake.foo(1));
}

#[test]
fn constraint_for_another_type() {
    let fake = FakeFoo::new();
    // An unsuffixed literal is an i32, but foo takes a u32
    let e = fake.call_to_foo(arg::eq(4)).returns(7u32).unwrap_err();
    assert_eq!(FakeError::ConstraintType {
        method: "Foo.foo".to_owned(),
        parameter: "x".to_owned(),
        expected: "u32".to_owned(),
        actual: "i32".to_owned()
    }, e);
    assert!(fake.fake_manager().rules().is_empty());
    assert_eq!(0, fake.foo(4));

    let e = fake.assert_that(FakeFoo::foo_call(arg::eq(4)))
        .must_have_happened_once_exactly()
        .unwrap_err();
    assert_eq!(ErrorKind::Configuration, e.kind());
    assert!(fake.assert_that(FakeFoo::foo_call(arg::any::<u64>()))
        .must_not_have_happened()
        .is_err());
}

#[test]
#[should_panic(expected = "The constraint on x of Foo.foo accepts i32, but the parameter is u32")]
fn constraint_for_another_type_without_outcome() {
    let fake = FakeFoo::new();
    fake.call_to_foo(arg::eq(4)).invokes(|_| ());
}
