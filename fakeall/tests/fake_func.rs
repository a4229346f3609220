// vim: tw=80
//! Fake functions
use fakeall::*;

#[test]
fn several_arguments() {
    let f = FakeFunc::<(u32, String), usize>::new();
    f.call_to_invoke(arg::that::<(u32, String), _>("short", |(_, s)| {
        s.len() < 3
    }))
        .returns_lazily_with(|((n, s),): ((u32, String),)| {
            n as usize + s.len()
        })
        .unwrap();
    assert_eq!(12, f.invoke((10, String::from("ab"))));
    assert_eq!(0, f.invoke((10, String::from("abcd"))));
    f.assert_that(f.invoke_call(arg::ignored()))
        .must_have_happened(Repeated::twice())
        .unwrap();
}

#[test]
fn closures_share_the_history() {
    let f = FakeFunc::<i32, i32>::new();
    let g = f.as_fn();
    let h = f.as_fn();
    g(1);
    h(2);
    let calls = f.recorded_calls();
    assert_eq!(2, calls.len());
    assert_eq!("FakeFunc.invoke(arg: 2)", calls[1].to_string());
    assert!(calls[0].sequence_number() < calls[1].sequence_number());
}

#[test]
fn usable_where_a_callback_is_expected() {
    fn apply<F: Fn(u8) -> u8>(f: F) -> u8 {
        f(1) + f(2)
    }

    let f = FakeFunc::<u8, u8>::new();
    f.call_to_invoke(arg::any::<u8>()).returns(5u8).unwrap();
    assert_eq!(10, apply(f.as_fn()));
}

#[derive(Debug, PartialEq)]
struct Handle(u32);

#[test]
fn without_default_uses_a_dummy() {
    let f = FakeFunc::<u32, Handle>::without_default(
        FakeOptions::new().with_dummy(|| Handle(7))).unwrap();
    assert_eq!(Handle(7), f.invoke(1));
}

#[test]
#[should_panic(expected = "Can not create a default value of type")]
fn without_default_or_dummy() {
    let f = FakeFunc::<u32, Handle>::without_default(FakeOptions::new())
        .unwrap();
    f.invoke(1);
}
