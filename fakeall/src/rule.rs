// vim: tw=80
//! Call rules and the builder that configures them.

use std::{
    collections::VecDeque,
    error::Error as StdError,
    fmt,
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicU64, Ordering}
    },
    thread
};

use fragile::Fragile;

use crate::{
    behavior::{
        Action,
        ArgumentTuple,
        Assigner,
        Behavior,
        Outcome,
        Producer,
        check_out_and_ref,
        typed_arguments
    },
    call::Call,
    error::{FakeError, Result, Thrown},
    manager::{FakeManager, lock},
    matcher::CallMatcher,
    repeat::Times,
    value::{ArgValue, ReturnValue, TypeInfo}
};

/// Identity of a [`CallRule`]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RuleId(u64);

impl RuleId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        RuleId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule #{}", self.0)
    }
}

/// Who added a rule.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RuleOrigin {
    /// Added by a [`FakeOptions::configure`](crate::FakeOptions::configure)
    /// hook while the fake was created.  Survives
    /// [`FakeManager::reset`](crate::FakeManager::reset).
    Creation,
    /// Added by the test.
    User,
}

/// A matcher, a behavior, and how many more times the rule may apply.
pub struct CallRule {
    id: RuleId,
    origin: RuleOrigin,
    matcher: Mutex<CallMatcher>,
    behavior: Mutex<Behavior>,
    times: Times,
}

impl CallRule {
    pub(crate) fn new(matcher: CallMatcher, origin: RuleOrigin) -> Self {
        CallRule {
            id: RuleId::next(),
            origin,
            matcher: Mutex::new(matcher),
            behavior: Mutex::default(),
            times: Times::default()
        }
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn origin(&self) -> RuleOrigin {
        self.origin
    }

    /// A copy of the rule's matcher
    pub fn matcher(&self) -> CallMatcher {
        lock(&self.matcher).clone()
    }

    /// How many more calls the rule may handle, or `None` if unlimited
    pub fn remaining(&self) -> Option<usize> {
        self.times.remaining()
    }

    /// Has the rule handled as many calls as it was allowed to?
    pub fn is_exhausted(&self) -> bool {
        self.times.is_done()
    }

    /// A copy of the behavior, so it can run without any lock held.
    pub(crate) fn behavior(&self) -> Behavior {
        lock(&self.behavior).clone()
    }

    /// Claim one call for this rule.  False if another call took the last
    /// one first.
    pub(crate) fn spend(&self) -> bool {
        self.times.call()
    }
}

impl fmt::Debug for CallRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallRule")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("matcher", &self.matcher())
            .field("behavior", &*lock(&self.behavior))
            .field("times", &self.times)
            .finish()
    }
}

impl fmt::Display for CallRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*lock(&self.matcher), f)
    }
}

/// Configures one rule of a fake.
///
/// Obtained from [`FakeManager::call_to`] or from the `call_to_*` methods of
/// a generated fake.  The rule is added to the fake by the first method that
/// configures a behavior or a number of times.  Later rules take precedence
/// over earlier ones.
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use fakeall::*;
/// let fake = FakeManager::new("IFoo");
/// let baz = Arc::new(Method::new("IFoo", "Baz").returning::<i32>());
/// fake.call_to(CallMatcher::new(baz.clone(), vec![]).unwrap())
///     .returns(10)
///     .unwrap();
/// let v: i32 = fake.intercept_with(baz, vec![]).into_value();
/// assert_eq!(10, v);
/// ```
///
/// # Panics
///
/// A rule whose argument constraints are written for other types than the
/// method's parameters is never added.  The fallible configuration methods
/// report that as [`FakeError::ConstraintType`].  If only infallible ones
/// were called, the builder panics with that error when dropped.
#[must_use = "a rule is only added once it is configured"]
pub struct RuleBuilder<'a> {
    manager: &'a FakeManager,
    /// The matcher, until the rule is added
    matcher: CallMatcher,
    rule: Option<Arc<CallRule>>,
    /// Why the rule can not be added
    error: Option<FakeError>,
    /// Was `error` returned to the caller?
    reported: bool,
}

impl<'a> RuleBuilder<'a> {
    pub(crate) fn new(manager: &'a FakeManager, matcher: CallMatcher) -> Self {
        RuleBuilder {
            manager,
            matcher,
            rule: None,
            error: None,
            reported: false
        }
    }

    /// Can the rule be added?
    fn is_valid(&mut self) -> bool {
        if self.rule.is_none() && self.error.is_none() {
            self.error = self.matcher.check_types().err();
        }
        self.error.is_none()
    }

    /// Like [`is_valid`](#method.is_valid), returning the error to the
    /// caller.
    fn validate(&mut self) -> Result<()> {
        self.is_valid();
        match &self.error {
            Some(e) => {
                let e = e.clone();
                self.reported = true;
                Err(e)
            }
            None => Ok(())
        }
    }

    /// The rule, adding it to the fake first if needed.
    fn added(&mut self) -> Arc<CallRule> {
        match &self.rule {
            Some(rule) => rule.clone(),
            None => {
                let rule = self.manager.add_rule(self.matcher.clone());
                self.rule = Some(rule.clone());
                rule
            }
        }
    }

    /// The rule, or `None` if it can not be added.
    fn rule(&mut self) -> Option<Arc<CallRule>> {
        if self.is_valid() {
            Some(self.added())
        } else {
            None
        }
    }

    fn checked_rule(&mut self) -> Result<Arc<CallRule>> {
        self.validate()?;
        Ok(self.added())
    }

    /// The configured rule, if any configuration method was called yet.
    pub fn added_rule(&self) -> Option<&Arc<CallRule>> {
        self.rule.as_ref()
    }

    fn refine<F>(&mut self, f: F) -> &mut Self
        where F: FnOnce(CallMatcher) -> CallMatcher
    {
        match &self.rule {
            Some(rule) => {
                let mut guard = lock(&rule.matcher);
                *guard = f(guard.clone());
            }
            None => {
                self.matcher = f(self.matcher.clone());
            }
        }
        self
    }

    fn current_matcher(&self) -> CallMatcher {
        match &self.rule {
            Some(rule) => rule.matcher(),
            None => self.matcher.clone()
        }
    }

    fn action(&mut self, action: Action) -> &mut Self {
        if let Some(rule) = self.rule() {
            lock(&rule.behavior).add_action(action);
        }
        self
    }

    fn outcome(&mut self, outcome: Outcome) -> Result<&mut Self> {
        let rule = self.checked_rule()?;
        let bound = lock(&rule.behavior).set_outcome(outcome);
        bound.map_err(|()| FakeError::BehaviorAlreadyDefined {
            rule: rule.to_string()
        })?;
        Ok(self)
    }

    fn out_and_ref(&mut self, assigner: Assigner) -> Result<&mut Self> {
        let rule = self.checked_rule()?;
        let bound = lock(&rule.behavior).set_out_and_ref(assigner);
        bound.map_err(|()| FakeError::BehaviorAlreadyDefined {
            rule: rule.to_string()
        })?;
        Ok(self)
    }

    /// Check that a return value of type `T` fits the configured method.
    fn check_return_type<T: 'static>(&self) -> Result<()> {
        let matcher = self.current_matcher();
        if let Some(method) = matcher.method() {
            let expected = method.return_type().type_info();
            if expected != TypeInfo::of::<T>() {
                return Err(FakeError::ReturnType {
                    method: method.to_string(),
                    expected: expected.name(),
                    actual: TypeInfo::of::<T>().name()
                });
            }
        }
        Ok(())
    }

    fn producer<T, F>(&mut self, f: F) -> Result<&mut Self>
        where T: Send + 'static,
              F: Fn(&Call) -> Result<T> + Send + Sync + 'static
    {
        self.validate()?;
        self.check_return_type::<T>()?;
        let producer: Producer = Arc::new(move |call: &Call| {
            f(call).map(ReturnValue::new)
        });
        self.outcome(Outcome::Return(producer))
    }

    /// Additionally require `f` to accept the call.
    pub fn where_call<F>(&mut self, description: impl Into<String>, f: F)
        -> &mut Self
        where F: Fn(&Call) -> bool + Send + Sync + 'static
    {
        self.refine(|m| m.where_call(description, f))
    }

    /// Match the arguments with a predicate over the whole call instead of
    /// with the per-argument constraints.
    pub fn when_arguments_match<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&Call) -> bool + Send + Sync + 'static
    {
        self.refine(|m| m.when_arguments_match(f))
    }

    /// Only apply to members returning `T`.
    pub fn with_return_type<T: 'static>(&mut self) -> &mut Self {
        self.refine(CallMatcher::with_return_type::<T>)
    }

    /// Run `f` before the call returns.  Any number of callbacks may be added;
    /// they run in the order they were added.
    pub fn invokes<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&Call) + Send + Sync + 'static
    {
        self.action(Arc::new(move |call: &Call| {
            f(call);
            Ok(())
        }))
    }

    /// Like [`invokes`](#method.invokes), but `f` receives the call's
    /// arguments as a tuple.
    ///
    /// The tuple's types must equal the method's parameter types.  That is
    /// checked when the rule first applies, and a mismatch fails the call
    /// with [`FakeError::CallbackSignature`].
    pub fn invokes_with<A, F>(&mut self, f: F) -> &mut Self
        where A: ArgumentTuple,
              F: Fn(A) + Send + Sync + 'static
    {
        self.action(Arc::new(move |call: &Call| {
            f(typed_arguments::<A>(call, "invokes_with")?);
            Ok(())
        }))
    }

    /// Single-threaded version of [`invokes`](#method.invokes), for callbacks
    /// that aren't `Send`.
    ///
    /// It is a runtime error to call the fake from a different thread than
    /// the one that originally called this method.
    pub fn invokes_st<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&Call) + 'static
    {
        let fragile = Fragile::new(f);
        self.action(Arc::new(move |call: &Call| {
            (fragile.get())(call);
            Ok(())
        }))
    }

    /// Return a clone of `t` from every matching call.
    pub fn returns<T>(&mut self, t: T) -> Result<&mut Self>
        where T: Clone + Send + 'static
    {
        let t = Mutex::new(t);
        self.producer(move |_| Ok(lock(&t).clone()))
    }

    /// Compute the return value from the call, once per matching call.
    pub fn returns_lazily<T, F>(&mut self, f: F) -> Result<&mut Self>
        where T: Send + 'static,
              F: Fn(&Call) -> T + Send + Sync + 'static
    {
        self.producer(move |call| Ok(f(call)))
    }

    /// Like [`returns_lazily`](#method.returns_lazily), but `f` receives the
    /// call's arguments as a tuple.  See
    /// [`invokes_with`](#method.invokes_with) for how the tuple is checked.
    pub fn returns_lazily_with<A, T, F>(&mut self, f: F) -> Result<&mut Self>
        where A: ArgumentTuple,
              T: Send + 'static,
              F: Fn(A) -> T + Send + Sync + 'static
    {
        self.producer(move |call| {
            typed_arguments::<A>(call, "returns_lazily_with").map(&f)
        })
    }

    /// Single-threaded version of [`returns_lazily`](#method.returns_lazily),
    /// for closures that aren't `Send`.
    ///
    /// It is a runtime error to call the fake from a different thread than
    /// the one that originally called this method.
    pub fn returns_lazily_st<T, F>(&mut self, f: F) -> Result<&mut Self>
        where T: Send + 'static,
              F: Fn(&Call) -> T + 'static
    {
        let fragile = Fragile::new(f);
        self.producer(move |call| Ok((fragile.get())(call)))
    }

    /// Return each of `values` in turn, one per matching call.
    ///
    /// The rule then stops applying, and calls fall through to whatever
    /// would otherwise handle them.
    pub fn returns_next_from_sequence<T, I>(&mut self, values: I)
        -> Result<&mut Self>
        where T: Send + 'static,
              I: IntoIterator<Item=T>
    {
        let queue = values.into_iter().collect::<VecDeque<T>>();
        let n = queue.len();
        let queue = Mutex::new(queue);
        self.validate()?;
        self.check_return_type::<T>()?;
        let producer: Producer = Arc::new(move |call: &Call| {
            match lock(&queue).pop_front() {
                Some(t) => Ok(ReturnValue::new(t)),
                None => call.method().return_type()
                    .default_maker()
                    .map(|f| f())
                    .ok_or_else(|| FakeError::NoDummy {
                        method: call.method().to_string(),
                        type_name: TypeInfo::of::<T>().name()
                    })
            }
        });
        self.outcome(Outcome::Return(producer))?;
        Ok(self.number_of_times(n))
    }

    /// Make every matching call throw `e`.
    pub fn throws<E>(&mut self, e: E) -> Result<&mut Self>
        where E: StdError + Send + Sync + 'static
    {
        let e: Arc<dyn StdError + Send + Sync> = Arc::new(e);
        self.outcome(Outcome::Throw(Arc::new(move |_: &Call| {
            Thrown::Error(e.clone())
        })))
    }

    /// Make every matching call throw an error computed from the call.
    pub fn throws_lazily<E, F>(&mut self, f: F) -> Result<&mut Self>
        where E: StdError + Send + Sync + 'static,
              F: Fn(&Call) -> E + Send + Sync + 'static
    {
        self.outcome(Outcome::Throw(Arc::new(move |call: &Call| {
            Thrown::error(f(call))
        })))
    }

    /// Return the default value of the return type.  Mostly useful to
    /// override a more general rule, or to configure a strict fake.
    pub fn does_nothing(&mut self) -> Result<&mut Self> {
        self.outcome(Outcome::DoNothing)
    }

    /// Forward matching calls to the fake's wrapped instance.
    pub fn calls_wrapped_method(&mut self) -> Result<&mut Self> {
        self.outcome(Outcome::CallWrapped)
    }

    /// Write `values` back to the out and ref parameters, in the order those
    /// parameters are declared.
    ///
    /// When the rule is for a specific method, the number and the types of
    /// the values are checked right away.
    pub fn assigns_out_and_ref_parameters(&mut self,
                                          values: Vec<Box<dyn ArgValue>>)
        -> Result<&mut Self>
    {
        self.validate()?;
        let matcher = self.current_matcher();
        if let Some(method) = matcher.method() {
            check_out_and_ref(method, &matcher.to_string(), &values)?;
        }
        self.out_and_ref(Arc::new(move |_: &Call| {
            Ok(values.iter().map(|v| (**v).clone_value()).collect())
        }))
    }

    /// Like
    /// [`assigns_out_and_ref_parameters`](#method.assigns_out_and_ref_parameters),
    /// computing the values from the call.  The number and the types of the
    /// values are checked for every call.
    pub fn assigns_out_and_ref_parameters_lazily<F>(&mut self, f: F)
        -> Result<&mut Self>
        where F: Fn(&Call) -> Vec<Box<dyn ArgValue>> + Send + Sync + 'static
    {
        self.out_and_ref(Arc::new(move |call: &Call| Ok(f(call))))
    }

    /// Apply the rule to at most `n` more calls.
    pub fn number_of_times(&mut self, n: usize) -> &mut Self {
        if let Some(rule) = self.rule() {
            rule.times.limit(n);
        }
        self
    }

    /// Apply the rule to a single call.
    pub fn once(&mut self) -> &mut Self {
        self.number_of_times(1)
    }

    /// Apply the rule to two calls.
    pub fn twice(&mut self) -> &mut Self {
        self.number_of_times(2)
    }
}

impl Drop for RuleBuilder<'_> {
    fn drop(&mut self) {
        if let Some(e) = &self.error {
            if !self.reported && !thread::panicking() {
                panic!("{}", e);
            }
        }
    }
}

impl fmt::Debug for RuleBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBuilder")
            .field("fake", &self.manager.id())
            .field("matcher", &self.current_matcher())
            .field("rule", &self.rule.as_ref().map(|r| r.id()))
            .finish()
    }
}
