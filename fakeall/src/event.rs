// vim: tw=80
//! Events: handlers passed to a fake's subscribe and unsubscribe accessors.

use std::{
    collections::HashMap,
    fmt,
    sync::Arc
};

use crate::{
    behavior::ArgumentTuple,
    error::FakeError,
    value::{ArgValue, TypeInfo, type_list}
};

type Handler = dyn Fn(&[&dyn ArgValue]) + Send + Sync;

enum Inner {
    Subscriber {
        signature: Vec<TypeInfo>,
        f: Box<Handler>,
    },
    Raiser {
        signature: Vec<TypeInfo>,
        arguments: Vec<Box<dyn ArgValue>>,
    }
}

/// The argument of an event accessor.
///
/// A handler is either a *subscriber*, a callback to run whenever the event
/// is raised, or a *raiser*.  Passing a raiser to the subscribe accessor of
/// a fake raises the event on that fake, instead of subscribing.
///
/// Handlers compare by identity: clones of a handler are equal to each other
/// and to nothing else.
///
/// # Examples
///
/// ```
/// # use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
/// # use fakeall::*;
/// let fake = FakeManager::new("IButton");
/// let add = Arc::new(Method::event_add::<(u32,)>("IButton", "clicked"));
/// let clicks = Arc::new(AtomicUsize::new(0));
/// let c = clicks.clone();
/// let handler = EventHandler::new(move |(n,): (u32,)| {
///     c.fetch_add(n as usize, Ordering::Relaxed);
/// });
/// fake.intercept_with(add.clone(), vec![arg_value(handler)]);
/// fake.intercept_with(add, vec![arg_value(EventHandler::raise((2u32,)))]);
/// assert_eq!(2, clicks.load(Ordering::Relaxed));
/// ```
#[derive(Clone)]
pub struct EventHandler(Arc<Inner>);

impl EventHandler {
    /// A subscriber that runs `f` with the event's arguments.
    pub fn new<A, F>(f: F) -> Self
        where A: ArgumentTuple,
              F: Fn(A) + Send + Sync + 'static
    {
        let f = move |values: &[&dyn ArgValue]| {
            // Signatures are checked before a subscriber is stored
            if let Some(a) = A::from_values(values) {
                f(a)
            }
        };
        EventHandler(Arc::new(Inner::Subscriber {
            signature: A::signature(),
            f: Box::new(f)
        }))
    }

    /// A raiser carrying the event's arguments.
    pub fn raise<A: ArgumentTuple>(arguments: A) -> Self {
        EventHandler(Arc::new(Inner::Raiser {
            signature: A::signature(),
            arguments: arguments.into_values()
        }))
    }

    pub fn is_raiser(&self) -> bool {
        matches!(*self.0, Inner::Raiser { .. })
    }

    pub fn signature(&self) -> &[TypeInfo] {
        match &*self.0 {
            Inner::Subscriber { signature, .. } => signature,
            Inner::Raiser { signature, .. } => signature,
        }
    }

    /// The raiser's arguments.  Empty for subscribers.
    pub(crate) fn arguments(&self) -> Vec<&dyn ArgValue> {
        match &*self.0 {
            Inner::Subscriber { .. } => Vec::new(),
            Inner::Raiser { arguments, .. } =>
                arguments.iter().map(|b| &**b).collect()
        }
    }

    fn invoke(&self, arguments: &[&dyn ArgValue]) {
        if let Inner::Subscriber { f, .. } = &*self.0 {
            f(arguments)
        }
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_raiser() { "raiser" } else { "subscriber" };
        write!(f, "<{} ({})>", kind, type_list(self.signature().iter()))
    }
}

/// Check that `actual` fits the declared signature of `event`.
pub(crate) fn check_signature(event: &str, declared: &[TypeInfo],
                              actual: &[TypeInfo])
    -> Result<(), FakeError>
{
    if declared == actual {
        Ok(())
    } else {
        Err(FakeError::EventSignature {
            event: event.to_owned(),
            expected: type_list(declared.iter()),
            actual: type_list(actual.iter())
        })
    }
}

/// One event of a fake: the signature its accessors declare, and its
/// subscribers.
#[derive(Debug, Default)]
struct Event {
    signature: Vec<TypeInfo>,
    handlers: Vec<EventHandler>,
}

/// Handlers subscribed to the events of one fake.
///
/// An event is known from the first time either of its accessors is called,
/// even if it has no subscribers left.
#[derive(Debug, Default)]
pub(crate) struct Subscriptions {
    events: HashMap<String, Event>,
}

impl Subscriptions {
    fn event(&mut self, event: &str, signature: &[TypeInfo]) -> &mut Event {
        let e = self.events.entry(event.to_owned()).or_default();
        e.signature = signature.to_vec();
        e
    }

    pub fn subscribe(&mut self, event: &str, signature: &[TypeInfo],
                     handler: EventHandler)
    {
        self.event(event, signature).handlers.push(handler);
    }

    /// Remove the most recently subscribed handler equal to `handler`.
    /// Unknown handlers are ignored.
    pub fn unsubscribe(&mut self, event: &str, signature: &[TypeInfo],
                       handler: &EventHandler)
    {
        let handlers = &mut self.event(event, signature).handlers;
        if let Some(i) = handlers.iter().rposition(|h| h == handler) {
            handlers.remove(i);
        }
    }

    /// The declared signature of `event`, if any accessor of it was called.
    pub fn signature(&self, event: &str) -> Option<Vec<TypeInfo>> {
        self.events.get(event).map(|e| e.signature.clone())
    }

    /// A snapshot of the handlers of `event`, in subscription order.
    pub fn handlers(&self, event: &str) -> Vec<EventHandler> {
        self.events.get(event)
            .map(|e| e.handlers.clone())
            .unwrap_or_default()
    }
}

/// Run each handler once, in order, with `arguments`.
pub(crate) fn raise(handlers: &[EventHandler], arguments: &[&dyn ArgValue]) {
    for handler in handlers {
        handler.invoke(arguments);
    }
}
