// vim: tw=80
//! The per-fake engine: rule store, dispatch, and call history.

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicBool, Ordering}
    }
};

use tracing::{Level, debug, enabled, trace, warn};

use crate::{
    assert::CallAssertion,
    behavior::{ArgumentTuple, Fallback},
    call::{Call, CallOutcome, CompletedCall, FakeId, Returned},
    dummy::DummyRegistry,
    error::{FakeError, Result, Thrown},
    event::{self, EventHandler, Subscriptions},
    history::{CallHistory, next_sequence_number},
    matcher::CallMatcher,
    method::{Method, MethodKind},
    rule::{CallRule, RuleBuilder, RuleOrigin},
    value::{ArgValue, ReturnValue, TypeInfo}
};

/// Lock a mutex, ignoring poison.  Poison can only come from user code
/// panicking, and that panic is reported by the call that raised it.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Implemented by every fake object, generated or hand written.
pub trait Faked {
    fn fake_manager(&self) -> &Arc<FakeManager>;
}

impl Faked for Arc<FakeManager> {
    fn fake_manager(&self) -> &Arc<FakeManager> {
        self
    }
}

/// Observes every call intercepted by a fake.
pub trait InterceptionListener: Send + Sync {
    /// Called before the call is dispatched.
    fn on_before_call(&self, _call: &Call) {}

    /// Called after the call was dispatched and recorded.
    fn on_after_call(&self, _call: &CompletedCall) {}
}

/// The real implementation behind a wrapping fake.
pub trait Invoker: Send + Sync {
    /// Run `call` against the wrapped instance.
    fn invoke(&self, call: &Call) -> std::result::Result<Returned, Thrown>;
}

/// What a fake does with calls that no rule handles.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FakeMode {
    /// Return the default value of the return type.
    #[default]
    Normal,
    /// Fail with [`FakeError::UnconfiguredStrictCall`].
    Strict,
    /// Forward the call to the wrapped [`Invoker`].
    Wrapping,
}

type Hook = Box<dyn FnOnce(&FakeManager) -> Result<()>>;

/// Settings for a new fake.
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use fakeall::*;
/// let get = Arc::new(Method::new("IFoo", "Get").returning::<u32>());
/// let m = get.clone();
/// let options = FakeOptions::new()
///     .strict()
///     .configure(move |fake| {
///         fake.call_to(CallMatcher::any_call().with_return_type::<u32>())
///             .returns(42u32)?;
///         Ok(())
///     });
/// let fake = FakeManager::with_options("IFoo", options).unwrap();
/// let v: u32 = fake.intercept_with(m, vec![]).into_value();
/// assert_eq!(42, v);
/// ```
#[derive(Default)]
pub struct FakeOptions {
    name: Option<String>,
    mode: FakeMode,
    invoker: Option<Arc<dyn Invoker>>,
    hooks: Vec<Hook>,
    dummies: DummyRegistry,
}

impl FakeOptions {
    pub fn new() -> Self {
        FakeOptions::default()
    }

    /// Reject calls that no rule handles.
    pub fn strict(mut self) -> Self {
        self.mode = FakeMode::Strict;
        self
    }

    /// Forward calls that no rule handles to `invoker`.
    pub fn wrapping<I: Invoker + 'static>(self, invoker: I) -> Self {
        self.wrapping_arc(Arc::new(invoker))
    }

    pub fn wrapping_arc(mut self, invoker: Arc<dyn Invoker>) -> Self {
        self.mode = FakeMode::Wrapping;
        self.invoker = Some(invoker);
        self
    }

    /// Configure the fake as soon as it is created.  Rules added by `f` are
    /// kept by [`FakeManager::reset`].
    pub fn configure<F>(mut self, f: F) -> Self
        where F: FnOnce(&FakeManager) -> Result<()> + 'static
    {
        self.hooks.push(Box::new(f));
        self
    }

    /// Return values made by `f` from unconfigured calls returning `T`.
    pub fn with_dummy<T, F>(mut self, f: F) -> Self
        where T: Send + 'static,
              F: Fn() -> T + Send + Sync + 'static
    {
        self.dummies.register(f);
        self
    }

    /// Name the fake in logs and in `Debug` output.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Debug for FakeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeOptions")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("hooks", &self.hooks.len())
            .field("dummies", &self.dummies)
            .finish_non_exhaustive()
    }
}

/// The engine behind one fake object.
///
/// Proxies hand every call to [`intercept`](#method.intercept).  The manager
/// picks the most recently added rule that applies, runs its behavior (or the
/// default behavior of the fake's [`FakeMode`]), and records the call.
///
/// The manager is `Send` and `Sync`, but concurrent configuration of or
/// calls to the same fake are not supported.  Behaviors run without any lock
/// held, so they may call the fake again.
pub struct FakeManager {
    id: FakeId,
    name: String,
    mode: FakeMode,
    invoker: Option<Arc<dyn Invoker>>,
    dummies: DummyRegistry,
    rules: Mutex<Vec<Arc<CallRule>>>,
    history: Mutex<CallHistory>,
    listeners: Mutex<Vec<Arc<dyn InterceptionListener>>>,
    events: Mutex<Subscriptions>,
    /// Set while the creation hooks run
    creating: AtomicBool,
}

impl FakeManager {
    /// A normal fake with no rules.  `type_name` names the faked type.
    pub fn new(type_name: &str) -> Arc<Self> {
        Arc::new(FakeManager::create(type_name, FakeOptions::new()))
    }

    /// A wrapping fake.
    pub fn wrapping<I: Invoker + 'static>(type_name: &str, invoker: I)
        -> Arc<Self>
    {
        let options = FakeOptions::new().wrapping(invoker);
        Arc::new(FakeManager::create(type_name, options))
    }

    /// A fake configured by `options`.  Fails if a
    /// [`configure`](FakeOptions::configure) hook fails.
    pub fn with_options(type_name: &str, mut options: FakeOptions)
        -> Result<Arc<Self>>
    {
        let hooks = std::mem::take(&mut options.hooks);
        let manager = FakeManager::create(type_name, options);
        manager.creating.store(true, Ordering::Relaxed);
        for hook in hooks {
            hook(&manager)?;
        }
        manager.creating.store(false, Ordering::Relaxed);
        Ok(Arc::new(manager))
    }

    fn create(type_name: &str, options: FakeOptions) -> Self {
        let id = FakeId::next();
        let name = options.name.unwrap_or_else(|| format!("Faked {}", type_name));
        debug!(fake = %id, %name, mode = ?options.mode, "created fake");
        FakeManager {
            id,
            name,
            mode: options.mode,
            invoker: options.invoker,
            dummies: options.dummies,
            rules: Mutex::default(),
            history: Mutex::default(),
            listeners: Mutex::default(),
            events: Mutex::default(),
            creating: AtomicBool::new(false)
        }
    }

    pub fn id(&self) -> FakeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> FakeMode {
        self.mode
    }

    /// Configure a rule for the calls accepted by `matcher`.
    pub fn call_to(&self, matcher: CallMatcher) -> RuleBuilder<'_> {
        RuleBuilder::new(self, matcher)
    }

    /// Configure a rule for every call made to the fake.
    pub fn call_to_any(&self) -> RuleBuilder<'_> {
        self.call_to(CallMatcher::any_call())
    }

    /// Assert on the calls accepted by `matcher`.
    pub fn assert_that(&self, matcher: CallMatcher) -> CallAssertion<'_> {
        CallAssertion::new(self, matcher)
    }

    pub(crate) fn add_rule(&self, matcher: CallMatcher) -> Arc<CallRule> {
        let origin = if self.creating.load(Ordering::Relaxed) {
            RuleOrigin::Creation
        } else {
            RuleOrigin::User
        };
        let rule = Arc::new(CallRule::new(matcher, origin));
        debug!(fake = %self.id, rule = %rule.id(), ?origin, matcher = %rule,
               "added rule");
        lock(&self.rules).push(rule.clone());
        rule
    }

    /// Every rule, oldest first
    pub fn rules(&self) -> Vec<Arc<CallRule>> {
        lock(&self.rules).clone()
    }

    /// Build a call of `method` with `arguments` and intercept it.
    ///
    /// A wrong number of arguments fails the call with
    /// [`FakeError::ArgumentCount`].
    pub fn intercept_with(&self, method: Arc<Method>,
                          arguments: Vec<Box<dyn ArgValue>>) -> CallOutcome
    {
        match Call::new(self.id, method.clone(), arguments) {
            Ok(call) => self.intercept(call),
            Err(e) => CallOutcome::new(method, Err(e.into()))
        }
    }

    /// Dispatch and record one call.
    pub fn intercept(&self, call: Call) -> CallOutcome {
        trace!(fake = %self.id, %call, "intercepted call");
        let listeners = lock(&self.listeners).clone();
        for listener in listeners.iter() {
            listener.on_before_call(&call);
        }
        let (rule, result) = self.dispatch(&call);
        let method = call.method().clone();
        let completed = {
            let mut history = lock(&self.history);
            let sequence = next_sequence_number();
            let completed = CompletedCall::new(call, rule.map(|r| r.id()),
                                               sequence, result.is_err());
            history.push(completed.clone());
            completed
        };
        trace!(fake = %self.id, call = %completed,
               sequence = completed.sequence_number(),
               threw = completed.threw(), "recorded call");
        for listener in listeners.iter() {
            listener.on_after_call(&completed);
        }
        CallOutcome::new(method, result)
    }

    fn dispatch(&self, call: &Call)
        -> (Option<Arc<CallRule>>, std::result::Result<Returned, Thrown>)
    {
        let rules = self.rules();
        for rule in rules.iter().rev() {
            if rule.is_exhausted() {
                continue;
            }
            let matcher = rule.matcher();
            if matcher.matches(call) {
                if !rule.spend() {
                    continue;
                }
                debug!(fake = %self.id, rule = %rule.id(), %call,
                       "rule applies");
                let behavior = rule.behavior();
                let result = catch(|| behavior.execute(call, self));
                return (Some(rule.clone()), result);
            } else if enabled!(Level::DEBUG) && matcher.method().is_some()
                && matcher.matches_method(call)
            {
                debug!(fake = %self.id, rule = %rule.id(), %call,
                       why = ?matcher.explain_mismatch(call),
                       "rule skipped");
            }
        }
        (None, catch(|| self.default_behavior(call)))
    }

    fn default_behavior(&self, call: &Call)
        -> std::result::Result<Returned, Thrown>
    {
        if !matches!(call.method().kind(), MethodKind::Ordinary) {
            return self.handle_event(call).map_err(Thrown::from);
        }
        match self.mode {
            FakeMode::Normal => {
                debug!(fake = %self.id, %call, "returning default value");
                Ok(Returned::from_value(self.default_value(call)?))
            }
            FakeMode::Strict => Err(FakeError::UnconfiguredStrictCall {
                call: call.to_string()
            }.into()),
            FakeMode::Wrapping => {
                debug!(fake = %self.id, %call, "forwarding to wrapped");
                self.call_wrapped(call)
            }
        }
    }

    fn handle_event(&self, call: &Call) -> Result<Returned> {
        let handler = call.cloned::<EventHandler>(0)?;
        match call.method().kind() {
            MethodKind::EventAdd { event, signature } => {
                event::check_signature(event, signature, handler.signature())?;
                if handler.is_raiser() {
                    let handlers = lock(&self.events).handlers(event);
                    self.raise_to(event, &handlers, &handler.arguments());
                } else {
                    debug!(fake = %self.id, event, "subscribed");
                    lock(&self.events).subscribe(event, signature, handler);
                }
            }
            MethodKind::EventRemove { event, signature } => {
                event::check_signature(event, signature, handler.signature())?;
                debug!(fake = %self.id, event, "unsubscribed");
                lock(&self.events).unsubscribe(event, signature, &handler);
            }
            MethodKind::Ordinary => {
                return Err(FakeError::NotAnEvent {
                    method: call.method().to_string()
                });
            }
        }
        Ok(Returned::new(()))
    }

    fn raise_to(&self, event: &str, handlers: &[EventHandler],
                arguments: &[&dyn ArgValue])
    {
        if handlers.is_empty() {
            warn!(fake = %self.id, event, "raised an event with no subscribers");
        } else {
            trace!(fake = %self.id, event, subscribers = handlers.len(),
                   "raising event");
        }
        event::raise(handlers, arguments);
    }

    /// Raise `event` with `arguments`, invoking every current subscriber once,
    /// in subscription order.  This is not a call, so it is not recorded.
    ///
    /// The arguments are checked against the signature declared by the
    /// event's accessors, even when nobody is subscribed.
    pub fn raise<A: ArgumentTuple>(&self, event: &str, arguments: A)
        -> Result<()>
    {
        let (declared, handlers) = {
            let events = lock(&self.events);
            (events.signature(event), events.handlers(event))
        };
        let signature = A::signature();
        if let Some(declared) = &declared {
            event::check_signature(event, declared, &signature)?;
        }
        for handler in handlers.iter() {
            event::check_signature(event, handler.signature(), &signature)?;
        }
        let values = arguments.into_values();
        let values = values.iter().map(|b| &**b).collect::<Vec<_>>();
        self.raise_to(event, &handlers, &values);
        Ok(())
    }

    /// How many handlers are subscribed to `event`?
    pub fn subscriber_count(&self, event: &str) -> usize {
        lock(&self.events).handlers(event).len()
    }

    pub fn add_listener(&self, listener: Arc<dyn InterceptionListener>) {
        lock(&self.listeners).push(listener);
    }

    /// Every call made to the fake, oldest first.
    pub fn recorded_calls(&self) -> Vec<CompletedCall> {
        lock(&self.history).iter().cloned().collect()
    }

    pub(crate) fn history(&self) -> CallHistory {
        lock(&self.history).clone()
    }

    /// Forget every recorded call.  Sequence numbers keep increasing.
    pub fn clear_recorded_calls(&self) {
        lock(&self.history).clear();
    }

    /// Forget every recorded call and every rule added by the test.  Rules
    /// added while the fake was created are kept.
    pub fn reset(&self) {
        lock(&self.rules).retain(|r| r.origin() == RuleOrigin::Creation);
        self.clear_recorded_calls();
        debug!(fake = %self.id, "reset");
    }
}

impl Fallback for FakeManager {
    fn default_value(&self, call: &Call)
        -> std::result::Result<ReturnValue, FakeError>
    {
        let returns = call.method().return_type();
        let t: TypeInfo = returns.type_info();
        self.dummies.create(&t)
            .or_else(|| returns.default_maker().map(|f| f()))
            .ok_or_else(|| FakeError::NoDummy {
                method: call.method().to_string(),
                type_name: t.name()
            })
    }

    fn call_wrapped(&self, call: &Call)
        -> std::result::Result<Returned, Thrown>
    {
        match &self.invoker {
            Some(invoker) => invoker.invoke(call),
            None => Err(FakeError::NoWrappedInstance {
                call: call.to_string()
            }.into())
        }
    }
}

/// Run `f`, turning a panic into a thrown value so the call can be recorded
/// before the panic resumes.
fn catch<F>(f: F) -> std::result::Result<Returned, Thrown>
    where F: FnOnce() -> std::result::Result<Returned, Thrown>
{
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(Thrown::Panic(payload)))
}

impl fmt::Debug for FakeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeManager")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("rules", &lock(&self.rules).len())
            .field("calls", &lock(&self.history).len())
            .finish_non_exhaustive()
    }
}
