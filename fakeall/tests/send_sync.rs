// vim: tw=80
//! Fakes may be shared between threads
use std::{sync::Arc, thread};

use static_assertions::assert_impl_all;

use fakeall::*;

#[fake]
pub trait Counter {
    fn add(&self, n: u64) -> u64;
}

assert_impl_all!(FakeManager: Send, Sync);
assert_impl_all!(FakeCounter: Clone, Send, Sync);
assert_impl_all!(FakeFunc<u32, u32>: Send, Sync);
assert_impl_all!(EventHandler: Clone, Send, Sync);
assert_impl_all!(FakeError: Clone, Send, Sync, std::error::Error);
assert_impl_all!(CallMatcher: Send, Sync);

#[test]
fn calls_from_many_threads() {
    let fake = Arc::new(FakeCounter::new());
    fake.call_to_add(arg::ignored()).returns(1u64).unwrap();
    let handles = (0..8u64).map(|i| {
        let fake = fake.clone();
        thread::spawn(move || fake.add(i))
    }).collect::<Vec<_>>();
    let total: u64 = handles.into_iter()
        .map(|h| h.join().unwrap())
        .sum();
    assert_eq!(8, total);
    let calls = fake.recorded_calls();
    assert_eq!(8, calls.len());
    assert!(calls.windows(2)
        .all(|w| w[0].sequence_number() < w[1].sequence_number()));
}

#[test]
fn limited_rule_is_shared_across_threads() {
    let fake = Arc::new(FakeCounter::new());
    fake.call_to_add(arg::ignored())
        .returns(1u64)
        .unwrap()
        .number_of_times(3);
    let handles = (0..8u64).map(|i| {
        let fake = fake.clone();
        thread::spawn(move || fake.add(i))
    }).collect::<Vec<_>>();
    let total: u64 = handles.into_iter()
        .map(|h| h.join().unwrap())
        .sum();
    assert_eq!(3, total);
}
