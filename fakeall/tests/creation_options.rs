// vim: tw=80
//! Options given when a fake is created: creation rules, dummies and names
use fakeall::*;

#[derive(Clone, Debug, PartialEq)]
struct Token(u32);

#[fake]
trait Session {
    fn user(&self) -> String;
    fn token(&self) -> Token;
    fn retries(&self) -> u8;
}

fn options() -> FakeOptions {
    FakeOptions::new()
        .configure(|fake| {
            fake.call_to(FakeSession::user_call())
                .returns(String::from("root"))?;
            Ok(())
        })
        .with_dummy(|| Token(77))
}

#[test]
fn creation_rules_survive_reset() {
    let fake = FakeSession::with_options(options()).unwrap();
    assert_eq!(RuleOrigin::Creation, fake.fake_manager().rules()[0].origin());
    fake.call_to_user().returns(String::from("alice")).unwrap();
    assert_eq!("alice", fake.user());
    fake.reset();
    assert!(fake.recorded_calls().is_empty());
    assert_eq!(1, fake.fake_manager().rules().len());
    assert_eq!("root", fake.user());
}

#[test]
fn dummy_for_type_without_default() {
    let fake = FakeSession::with_options(options()).unwrap();
    assert_eq!(Token(77), fake.token());
    assert_eq!(0, fake.retries());
}

#[test]
fn dummy_takes_precedence_over_default() {
    let options = FakeOptions::new().with_dummy(|| 3u8);
    let fake = FakeSession::with_options(options).unwrap();
    assert_eq!(3, fake.retries());
}

#[test]
fn no_dummy() {
    let fake = FakeSession::new();
    let outcome = fake.fake_manager().intercept_with(
        FakeSession::token_method(), Vec::new());
    let e = outcome.into_result::<Token>().unwrap_err();
    assert!(matches!(e.as_fake_error(), Some(FakeError::NoDummy { .. })));
}

#[test]
fn failing_hook() {
    let options = FakeOptions::new().configure(|fake| {
        fake.call_to(FakeSession::retries_call())
            .returns(String::from("not a u8"))?;
        Ok(())
    });
    let e = FakeSession::with_options(options).unwrap_err();
    assert!(matches!(e, FakeError::ReturnType { .. }));
}

#[test]
fn default_name() {
    let fake = FakeSession::new();
    assert_eq!("Faked Session", fake.fake_manager().name());
}
