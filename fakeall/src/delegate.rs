// vim: tw=80
//! Fake functions.

use std::{
    fmt,
    marker::PhantomData,
    sync::Arc
};

use crate::{
    constraint::ArgumentConstraint,
    error::Result,
    manager::{FakeManager, FakeOptions, Faked},
    matcher::CallMatcher,
    method::{Method, ReturnType},
    rule::RuleBuilder,
    value::{ArgValue, arg_value}
};

/// A fake of a function from `A` to `R`.
///
/// Use a tuple for `A` to fake functions of several arguments.  Calls made
/// through [`invoke`](#method.invoke) and through the closure returned by
/// [`as_fn`](#method.as_fn) are calls of the same method, so one rule handles
/// both.
///
/// # Examples
///
/// ```
/// # use fakeall::*;
/// let f = FakeFunc::<String, i32>::new();
/// f.call_to_invoke(arg::any::<String>()).returns(10).unwrap();
/// let g = f.as_fn();
/// assert_eq!(10, f.invoke("x".to_owned()));
/// assert_eq!(10, g("x".to_owned()));
/// ```
pub struct FakeFunc<A, R> {
    manager: Arc<FakeManager>,
    method: Arc<Method>,
    _types: PhantomData<fn(A) -> R>,
}

impl<A, R> FakeFunc<A, R>
    where A: Clone + fmt::Debug + Send + Sync + 'static,
          R: Send + 'static
{
    /// Name of the faked method, for diagnostics
    pub const METHOD: &'static str = "invoke";

    fn build(manager: Arc<FakeManager>, returns: ReturnType) -> Self {
        let method = Method::new("FakeFunc", Self::METHOD)
            .with_param::<A>("arg")
            .with_return_type(returns);
        FakeFunc {
            manager,
            method: Arc::new(method),
            _types: PhantomData
        }
    }

    /// A fake whose return type has no `Default`.  Unconfigured calls fail
    /// unless `options` registers a dummy for `R`.
    pub fn without_default(options: FakeOptions) -> Result<Self> {
        let manager = FakeManager::with_options("FakeFunc", options)?;
        Ok(FakeFunc::build(manager, ReturnType::new::<R>(None)))
    }

    /// The faked method
    pub fn method(&self) -> &Arc<Method> {
        &self.method
    }

    /// Matcher for calls whose argument satisfies `arg`
    pub fn invoke_call(&self, arg: ArgumentConstraint) -> CallMatcher {
        CallMatcher::new_unchecked(self.method.clone(), vec![arg])
    }

    /// Configure calls whose argument satisfies `arg`.
    pub fn call_to_invoke(&self, arg: ArgumentConstraint) -> RuleBuilder<'_> {
        FakeManager::call_to(&self.manager, self.invoke_call(arg))
    }

    /// Call the fake.
    ///
    /// # Panics
    ///
    /// Panics with whatever the call throws.
    pub fn invoke(&self, a: A) -> R {
        invoke(&self.manager, &self.method, a)
    }

    /// The fake as a plain closure.
    pub fn as_fn(&self) -> impl Fn(A) -> R + Send + Sync + 'static {
        let manager = self.manager.clone();
        let method = self.method.clone();
        move |a| invoke(&manager, &method, a)
    }
}

impl<A, R> FakeFunc<A, R>
    where A: Clone + fmt::Debug + Send + Sync + 'static,
          R: Default + Send + 'static
{
    pub fn new() -> Self {
        FakeFunc::build(FakeManager::new("FakeFunc"), ReturnType::of::<R>())
    }

    pub fn with_options(options: FakeOptions) -> Result<Self> {
        let manager = FakeManager::with_options("FakeFunc", options)?;
        Ok(FakeFunc::build(manager, ReturnType::of::<R>()))
    }
}

impl<A, R> Default for FakeFunc<A, R>
    where A: Clone + fmt::Debug + Send + Sync + 'static,
          R: Default + Send + 'static
{
    fn default() -> Self {
        FakeFunc::new()
    }
}

fn invoke<A, R>(manager: &FakeManager, method: &Arc<Method>, a: A) -> R
    where A: Clone + fmt::Debug + Send + Sync + 'static,
          R: 'static
{
    let args: Vec<Box<dyn ArgValue>> = vec![arg_value(a)];
    manager.intercept_with(method.clone(), args).into_value()
}

impl<A, R> Faked for FakeFunc<A, R> {
    fn fake_manager(&self) -> &Arc<FakeManager> {
        &self.manager
    }
}

impl<A, R> fmt::Debug for FakeFunc<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeFunc")
            .field("manager", &self.manager)
            .field("method", &self.method.to_string())
            .finish()
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{arg, repeat::Repeated};

    #[test]
    fn both_call_paths_share_rules() {
        let f = FakeFunc::<String, i32>::new();
        f.call_to_invoke(arg::any::<String>()).returns(10).unwrap();
        let g = f.as_fn();
        assert_eq!(10, f.invoke("x".to_owned()));
        assert_eq!(10, g("x".to_owned()));
        let rule = f.fake_manager().rules()[0].id();
        let calls = f.fake_manager().recorded_calls();
        assert_eq!(2, calls.len());
        assert!(calls.iter().all(|c| c.rule() == Some(rule)));
        f.fake_manager()
            .assert_that(f.invoke_call(arg::eq("x".to_owned())))
            .must_have_happened(Repeated::twice())
            .unwrap();
    }

    #[test]
    fn tuple_arguments() {
        let f = FakeFunc::<(i32, i32), i32>::new();
        f.call_to_invoke(arg::ignored())
            .returns_lazily_with(|((a, b),): ((i32, i32),)| a + b)
            .unwrap();
        assert_eq!(5, f.invoke((2, 3)));
    }

    #[test]
    fn unconfigured_returns_default() {
        let f = FakeFunc::<u8, String>::default();
        assert_eq!("", f.invoke(1));
    }

    #[test]
    fn without_default() {
        #[derive(Debug, PartialEq)]
        struct Token(u32);
        let options = FakeOptions::new().with_dummy(|| Token(9));
        let f = FakeFunc::<(), Token>::without_default(options).unwrap();
        assert_eq!(Token(9), f.invoke(()));
    }
}
