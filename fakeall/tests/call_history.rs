// vim: tw=80
//! Recording calls
use fakeall::*;

#[fake]
trait Foo {
    fn foo(&self, x: u32) -> u32;
    fn name(&self, prefix: &str) -> String;
}

#[test]
fn sequence_numbers_increase_across_fakes() {
    let a = FakeFoo::new();
    let b = FakeFoo::new();
    a.foo(1);
    b.foo(2);
    a.foo(3);
    let mut calls = a.recorded_calls();
    calls.extend(b.recorded_calls());
    calls.sort_by_key(CompletedCall::sequence_number);
    let xs = calls.iter()
        .map(|c| *c.call().get::<u32>(0).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(vec![1, 2, 3], xs);
    assert_ne!(a.fake_manager().id(), b.fake_manager().id());
    assert!(calls.iter().all(|c| c.rule().is_none()));
}

#[test]
fn clear_keeps_counting() {
    let fake = FakeFoo::new();
    fake.foo(1);
    let before = fake.recorded_calls()[0].sequence_number();
    fake.clear_recorded_calls();
    assert!(fake.recorded_calls().is_empty());
    fake.foo(2);
    let calls = fake.recorded_calls();
    assert_eq!(1, calls.len());
    assert!(calls[0].sequence_number() > before);
}

#[test]
fn shared_references_are_recorded_owned() {
    let fake = FakeFoo::new();
    fake.call_to_name(arg::matches_str(predicate::str::starts_with("Dr")))
        .returns_lazily_with(|(prefix,): (String,)| format!("{} Who", prefix))
        .unwrap();
    assert_eq!("Dr Who", fake.name("Dr"));
    assert_eq!("", fake.name("Mr"));
    let calls = fake.recorded_calls();
    assert_eq!("Foo.name(prefix: \"Dr\")", calls[0].to_string());
    assert_eq!(Some(&String::from("Mr")), calls[1].call().get::<String>(0));
}

#[test]
fn rule_is_recorded() {
    let fake = FakeFoo::new();
    fake.call_to_foo(arg::eq(1u32)).returns(5u32).unwrap();
    fake.foo(1);
    fake.foo(2);
    let rule = fake.fake_manager().rules()[0].id();
    let calls = fake.recorded_calls();
    assert_eq!(Some(rule), calls[0].rule());
    assert_eq!(None, calls[1].rule());
}

#[test]
fn argument_count_mismatch_is_not_recorded() {
    let fake = FakeFoo::new();
    let outcome = fake.fake_manager()
        .intercept_with(FakeFoo::foo_method(), values![1u32, 2u32]);
    let e = outcome.into_result::<u32>().unwrap_err();
    assert_eq!(
        Some(&FakeError::ArgumentCount {
            method: String::from("Foo.foo"),
            expected: 1,
            actual: 2
        }),
        e.as_fake_error());
    assert!(fake.recorded_calls().is_empty());
}

#[test]
fn thrown_calls_are_recorded() {
    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    let fake = FakeFoo::new();
    fake.call_to_foo(arg::ignored()).throws(DiskFull).unwrap();
    let outcome = fake.fake_manager()
        .intercept_with(FakeFoo::foo_method(), values![1u32]);
    assert!(outcome.is_thrown());
    assert_eq!("disk full", outcome.into_result::<u32>().unwrap_err().message());
    let calls = fake.recorded_calls();
    assert_eq!(1, calls.len());
    assert!(calls[0].threw());
}
