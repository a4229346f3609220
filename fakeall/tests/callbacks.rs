// vim: tw=80
//! Callbacks configured with `invokes` and friends
use std::{
    cell::Cell,
    rc::Rc,
    sync::{Arc, Mutex}
};

use fakeall::*;

#[fake]
trait Foo {
    fn foo(&self, x: u32, s: String) -> u32;
    fn bar(&self) -> u32;
}

#[test]
fn run_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (l1, l2) = (log.clone(), log.clone());
    let fake = FakeFoo::new();
    fake.call_to_bar()
        .invokes(move |_| l1.lock().unwrap().push("first"))
        .invokes(move |_| l2.lock().unwrap().push("second"));
    assert_eq!(0, fake.bar());
    assert_eq!(vec!["first", "second"], *log.lock().unwrap());
}

#[test]
fn typed_arguments() {
    let seen = Arc::new(Mutex::new(None));
    let s2 = seen.clone();
    let fake = FakeFoo::new();
    fake.call_to_foo(arg::ignored(), arg::ignored())
        .invokes_with(move |(x, s): (u32, String)| {
            *s2.lock().unwrap() = Some(format!("{}{}", s, x));
        })
        .returns(1u32)
        .unwrap();
    fake.foo(5, String::from("x"));
    assert_eq!(Some(String::from("x5")), *seen.lock().unwrap());
}

#[test]
fn single_threaded_callbacks() {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    let fake = FakeFoo::new();
    fake.call_to_bar()
        .returns_lazily_st(move |_| {
            c.set(c.get() + 1);
            c.get()
        })
        .unwrap();
    assert_eq!(1, fake.bar());
    assert_eq!(2, fake.bar());
    assert_eq!(2, count.get());
}

#[test]
fn callback_may_call_the_fake() {
    let fake = Arc::new(FakeFoo::new());
    let inner = fake.clone();
    fake.call_to_foo(arg::ignored(), arg::ignored())
        .returns_lazily(move |_| inner.bar() + 1)
        .unwrap();
    fake.call_to_bar().returns(41u32).unwrap();
    assert_eq!(42, fake.foo(0, String::new()));
    assert_eq!(2, fake.recorded_calls().len());
}

#[test]
fn panic_is_recorded_then_resumed() {
    let fake = FakeFoo::new();
    fake.call_to_bar()
        .returns_lazily(|_| -> u32 { panic!("kaboom") })
        .unwrap();
    let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        fake.bar()
    }));
    let payload = r.unwrap_err();
    assert_eq!(Some(&"kaboom"), payload.downcast_ref::<&str>());
    let calls = fake.recorded_calls();
    assert_eq!(1, calls.len());
    assert!(calls[0].threw());
}

#[test]
#[should_panic(expected = "it broke")]
fn throws_lazily() {
    #[derive(Debug, thiserror::Error)]
    #[error("{0} broke")]
    struct Broke(String);

    let fake = FakeFoo::new();
    fake.call_to_bar()
        .throws_lazily(|_| Broke(String::from("it")))
        .unwrap();
    fake.bar();
}
