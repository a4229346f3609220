// vim: tw=80
//! A rule-based fake object library for Rust.
//!
//! Fakeall creates fake versions of traits and functions, for use in unit
//! tests as stand-ins for the real thing.  Unlike a classic mock, a fake needs
//! no up-front expectations: every call returns a sensible default until a
//! rule says otherwise, every call is recorded, and assertions about the
//! calls are made after the fact.
//!
//! # Usage
//!
//! The easiest way to create a fake is with [`#[fake]`](macro@fake).  It can
//! fake most traits.  For everything else, build a [`FakeManager`] directly
//! and describe each faked member with a [`Method`].  Functions and closures
//! are faked with [`FakeFunc`].
//!
//! Whichever method is used, the basic idea is the same.
//! * Create the fake.  For a trait `Foo`, `#[fake]` generates a struct named
//!   `FakeFoo`.
//! * Optionally configure rules.  A rule pairs a [`CallMatcher`] with a
//!   behavior: return a value, run a callback, fail, or forward the call.
//! * Supply the fake to the code that you're testing.
//! * Assert on the recorded calls with
//!   [`must_have_happened`](CallAssertion::must_have_happened) and friends.
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Return values`](#return-values)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Call counts`](#call-counts)
//! * [`Assertions`](#assertions)
//! * [`Ordered assertions`](#ordered-assertions)
//! * [`Reference arguments`](#reference-arguments)
//! * [`Strict and wrapping fakes`](#strict-and-wrapping-fakes)
//! * [`Async methods`](#async-methods)
//! * [`Events`](#events)
//! * [`Fake functions`](#fake-functions)
//! * [`Logging`](#logging)
//! * [`Crate features`](#crate-features)
//!
//! ## Getting Started
//! ```
//! use fakeall::*;
//! #[fake]
//! trait MyTrait {
//!     fn foo(&self, x: u32) -> u32;
//! }
//!
//! fn call_with_four(x: &dyn MyTrait) -> u32 {
//!     x.foo(4)
//! }
//!
//! let fake = FakeMyTrait::new();
//! fake.call_to_foo(arg::eq(4u32))
//!     .returns(42u32)
//!     .unwrap();
//! assert_eq!(42, call_with_four(&fake));
//! fake.assert_that(FakeMyTrait::foo_call(arg::eq(4u32)))
//!     .must_have_happened_once_exactly()
//!     .unwrap();
//! ```
//!
//! ## Return values
//!
//! An unconfigured call returns a *dummy*: a value made by a factory
//! registered with [`FakeOptions::with_dummy`], or else the return type's
//! `Default`.  A call whose return type has neither fails with
//! [`FakeError::NoDummy`].
//!
//! Rules can return a constant with [`returns`](RuleBuilder::returns), compute
//! the value on every call with
//! [`returns_lazily`](RuleBuilder::returns_lazily), or compute it from the
//! call's arguments with
//! [`returns_lazily_with`](RuleBuilder::returns_lazily_with).
//!
//! ```
//! # use fakeall::*;
//! #[fake]
//! trait Foo {
//!     fn foo(&self, x: u32) -> u32;
//!     fn bar(&self) -> String;
//! }
//!
//! let fake = FakeFoo::new();
//! assert_eq!("", fake.bar());
//! fake.call_to_foo(arg::any::<u32>())
//!     .returns_lazily_with(|(x,): (u32,)| x + 1)
//!     .unwrap();
//! assert_eq!(5, fake.foo(4));
//! ```
//!
//! A sequence of values can be returned with
//! [`returns_next_from_sequence`](RuleBuilder::returns_next_from_sequence).
//! Once the sequence runs out the rule is spent, and later calls fall through
//! to earlier rules or to the default.
//!
//! ```
//! # use fakeall::*;
//! # #[fake]
//! # trait Foo {
//! #     fn foo(&self, x: u32) -> u32;
//! # }
//! let fake = FakeFoo::new();
//! fake.call_to_foo(arg::ignored())
//!     .returns_next_from_sequence(vec![1u32, 2])
//!     .unwrap();
//! assert_eq!(1, fake.foo(0));
//! assert_eq!(2, fake.foo(0));
//! assert_eq!(0, fake.foo(0));
//! ```
//!
//! Rules may also fail the call.  A faked method has no error channel of its
//! own, so [`throws`](RuleBuilder::throws) makes the call panic with the
//! error's message, after the call is recorded.
//!
//! ## Matching arguments
//!
//! Every generated `*_call` and `call_to_*` function takes one
//! [`ArgumentConstraint`] per parameter.  The [`arg`] module has the common
//! ones, including adapters for the predicates of the
//! [`predicates`](https://docs.rs/predicates) crate, re-exported here as
//! [`predicate`].
//!
//! ```
//! # use fakeall::*;
//! #[fake]
//! trait Foo {
//!     fn foo(&self, x: u32, name: String) -> u32;
//! }
//!
//! let fake = FakeFoo::new();
//! fake.call_to_foo(arg::matches::<u32, _>(predicate::gt(5)), arg::ignored())
//!     .returns(1u32)
//!     .unwrap();
//! fake.call_to_foo(arg::any::<u32>(), arg::eq(String::from("bob")))
//!     .returns(2u32)
//!     .unwrap();
//! assert_eq!(1, fake.foo(6, String::from("alice")));
//! assert_eq!(2, fake.foo(6, String::from("bob")));
//! assert_eq!(0, fake.foo(1, String::from("alice")));
//! ```
//!
//! When several rules accept a call, the most recently configured one wins,
//! as the second call above shows.  Conditions spanning several arguments are
//! written with [`where_call`](RuleBuilder::where_call).
//!
//! ## Call counts
//!
//! By default a rule handles any number of calls.  Limit it with
//! [`once`](RuleBuilder::once), [`twice`](RuleBuilder::twice) or
//! [`number_of_times`](RuleBuilder::number_of_times).  A spent rule is
//! skipped.
//!
//! ```
//! # use fakeall::*;
//! # #[fake]
//! # trait Foo {
//! #     fn foo(&self, x: u32) -> u32;
//! # }
//! let fake = FakeFoo::new();
//! fake.call_to_foo(arg::ignored())
//!     .returns(7u32)
//!     .unwrap()
//!     .once();
//! assert_eq!(7, fake.foo(0));
//! assert_eq!(0, fake.foo(0));
//! ```
//!
//! ## Assertions
//!
//! Assertions compare a [`CallMatcher`] against a fake's history.  They return
//! [`FakeError::Expectation`], whose message lists every recorded call.
//!
//! ```
//! # use fakeall::*;
//! # #[fake]
//! # trait Foo {
//! #     fn foo(&self, x: u32) -> u32;
//! # }
//! let fake = FakeFoo::new();
//! fake.foo(1);
//! fake.foo(2);
//! let e = fake.assert_that(FakeFoo::foo_call(arg::eq(3u32)))
//!     .must_have_happened(Repeated::at_least_once())
//!     .unwrap_err();
//! assert!(e.to_string().contains("found it #0 times"));
//! fake.assert_that(FakeFoo::foo_call(arg::any::<u32>()))
//!     .must_have_happened(Repeated::exactly(2))
//!     .unwrap();
//! ```
//!
//! ## Ordered assertions
//!
//! An [`OrderedAssertions`] scope checks that calls, possibly to different
//! fakes, happened in the order in which they are asserted.
//!
//! ```
//! # use fakeall::*;
//! # #[fake]
//! # trait Foo {
//! #     fn foo(&self, x: u32) -> u32;
//! # }
//! let fake = FakeFoo::new();
//! fake.foo(1);
//! fake.foo(2);
//! let mut ordered = OrderedAssertions::new();
//! ordered
//!     .must_have_happened(&fake, FakeFoo::foo_call(arg::eq(1u32)),
//!                         Repeated::once())
//!     .unwrap()
//!     .must_have_happened(&fake, FakeFoo::foo_call(arg::eq(2u32)),
//!                         Repeated::once())
//!     .unwrap();
//! ```
//!
//! ## Reference arguments
//!
//! Arguments passed by shared reference are recorded as owned values, so
//! their constraints are written for the owned type: a `&str` argument is
//! matched as a `String`.  Arguments passed by mutable reference are *ref
//! parameters*.  Their input value is recorded, and a rule may write new
//! values back with
//! [`assigns_out_and_ref_parameters`](RuleBuilder::assigns_out_and_ref_parameters).
//!
//! ```
//! # use fakeall::*;
//! #[fake]
//! trait Parser {
//!     fn parse(&self, input: &str, out: &mut u32) -> bool;
//! }
//!
//! let fake = FakeParser::new();
//! fake.call_to_parse(arg::eq(String::from("42")), arg::ignored())
//!     .returns(true)
//!     .unwrap()
//!     .assigns_out_and_ref_parameters(values![42u32])
//!     .unwrap();
//! let mut out = 0;
//! assert!(fake.parse("42", &mut out));
//! assert_eq!(42, out);
//! ```
//!
//! ## Strict and wrapping fakes
//!
//! A *strict* fake fails every call that no rule handles.  A *wrapping* fake
//! forwards such calls to a real implementation instead.
//!
//! ```
//! # use fakeall::*;
//! #[fake]
//! trait Foo {
//!     fn foo(&self, x: u32) -> u32;
//! }
//!
//! struct Real;
//! impl Foo for Real {
//!     fn foo(&self, x: u32) -> u32 { x * 2 }
//! }
//!
//! let fake = FakeFoo::wrapping(Real);
//! fake.call_to_foo(arg::eq(0u32)).returns(99u32).unwrap();
//! assert_eq!(99, fake.foo(0));
//! assert_eq!(6, fake.foo(3));
//!
//! let strict = FakeFoo::with_options(FakeOptions::new().strict()).unwrap();
//! let r = std::panic::catch_unwind(
//!     std::panic::AssertUnwindSafe(|| strict.foo(3)));
//! assert!(r.is_err());
//! ```
//!
//! Rules configured by a [`FakeOptions::configure`] hook belong to the fake's
//! creation, and survive [`reset`](FakeManager::reset).
//!
//! ## Async methods
//!
//! `async fn` members are faked too.  The call is intercepted and recorded
//! when the method is called, not when its future is first polled.
//!
//! ```
//! # use fakeall::*;
//! #[fake]
//! trait Store {
//!     async fn get(&self, key: u32) -> Option<String>;
//! }
//!
//! let fake = FakeStore::new();
//! fake.call_to_get(arg::eq(1u32))
//!     .returns(Some(String::from("one")))
//!     .unwrap();
//! let v = futures::executor::block_on(fake.get(1));
//! assert_eq!(Some(String::from("one")), v);
//! ```
//!
//! ## Events
//!
//! Rust traits have no events, but a hand-written proxy can declare
//! subscribe and unsubscribe accessors with [`Method::event_add`] and
//! [`Method::event_remove`].  The fake keeps the subscribers; raise the event
//! with [`FakeManager::raise`] or by passing [`EventHandler::raise`] to the
//! subscribe accessor.
//!
//! ## Fake functions
//!
//! [`FakeFunc`] fakes a plain function.  Both the fake itself and the closure
//! returned by [`as_fn`](FakeFunc::as_fn) are calls of the same method.
//!
//! ## Logging
//!
//! Fakes emit [`tracing`](https://docs.rs/tracing) events: `TRACE` for every
//! intercepted call, `DEBUG` for rule selection, including why a candidate
//! rule's constraints rejected a call, and `WARN` for events raised with no
//! subscribers.
//!
//! ## Crate features
//!
//! Fakeall has a `nightly` feature.  It improves the error messages produced
//! by `#[fake]` for unsupported traits, and requires a nightly compiler.

mod assert;
mod behavior;
mod call;
mod constraint;
mod delegate;
mod dummy;
mod error;
mod event;
mod format;
mod history;
mod manager;
mod matcher;
mod method;
mod repeat;
mod rule;
mod value;

pub mod arg;

pub use crate::{
    assert::{CallAssertion, OrderedAssertions},
    behavior::ArgumentTuple,
    call::{Call, CallOutcome, CompletedCall, FakeId, ParamsArray, Returned},
    constraint::ArgumentConstraint,
    delegate::FakeFunc,
    dummy::DummyRegistry,
    error::{ErrorKind, FakeError, Result, Thrown},
    event::EventHandler,
    history::{CallHistory, next_sequence_number},
    manager::{
        FakeManager,
        FakeMode,
        FakeOptions,
        Faked,
        InterceptionListener,
        Invoker
    },
    matcher::CallMatcher,
    method::{Asyncness, Method, MethodKind, ParamKind, Parameter, ReturnType},
    repeat::Repeated,
    rule::{CallRule, RuleBuilder, RuleId, RuleOrigin},
    value::{ArgValue, ReturnValue, TypeInfo, arg_value}
};
pub use fakeall_derive::fake;
pub use predicates::prelude::{Predicate, predicate};

/// Configuration and assertions for anything that owns a fake.
///
/// Generated fakes and [`FakeFunc`] get these through [`Faked`].
pub trait FakedExt: Faked {
    /// Configure a rule for the calls accepted by `matcher`.
    fn call_to(&self, matcher: CallMatcher) -> RuleBuilder<'_> {
        FakeManager::call_to(self.fake_manager(), matcher)
    }

    /// Configure a rule for every call made to the fake.
    fn call_to_any(&self) -> RuleBuilder<'_> {
        FakeManager::call_to_any(self.fake_manager())
    }

    /// Assert on the calls accepted by `matcher`.
    fn assert_that(&self, matcher: CallMatcher) -> CallAssertion<'_> {
        FakeManager::assert_that(self.fake_manager(), matcher)
    }

    /// Every call made to the fake, oldest first.
    fn recorded_calls(&self) -> Vec<CompletedCall> {
        FakeManager::recorded_calls(self.fake_manager())
    }

    /// Forget every recorded call.
    fn clear_recorded_calls(&self) {
        FakeManager::clear_recorded_calls(self.fake_manager())
    }

    /// Forget the recorded calls and every rule added after creation.
    fn reset(&self) {
        FakeManager::reset(self.fake_manager())
    }
}

impl<T: Faked + ?Sized> FakedExt for T {}

/// Used by the code that `#[fake]` generates.  Not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use crate::dummy::{DefaultReturner, ViaDefault, ViaNoDefault};
    pub use futures::executor::block_on;
}
