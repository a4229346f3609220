// vim: tw=80
//! Intercepted calls, their records in history, and their outcomes.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering}
    }
};

use futures::future::{self, BoxFuture, FutureExt};

use crate::{
    error::{FakeError, Thrown},
    method::Method,
    rule::RuleId,
    value::{ArgValue, ReturnValue, TypeInfo}
};

/// Identity of one faked instance.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FakeId(u64);

impl FakeId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        FakeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The recorded value of a variadic parameter.
#[derive(Default)]
pub struct ParamsArray(Vec<Box<dyn ArgValue>>);

impl ParamsArray {
    pub fn new(values: Vec<Box<dyn ArgValue>>) -> Self {
        ParamsArray(values)
    }

    pub fn from_values<T>(values: Vec<T>) -> Self
        where T: Clone + fmt::Debug + Send + Sync + 'static
    {
        ParamsArray(values.into_iter()
            .map(|v| Box::new(v) as Box<dyn ArgValue>)
            .collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item=&dyn ArgValue> {
        self.0.iter().map(|b| &**b)
    }

    /// All elements as `T`, or `None` if any element is of another type.
    pub fn values<T: 'static>(&self) -> Option<Vec<&T>> {
        self.iter()
            .map(|v| v.downcast_ref::<T>().ok())
            .collect()
    }
}

impl Clone for ParamsArray {
    fn clone(&self) -> Self {
        ParamsArray(self.iter().map(|v| v.clone_value()).collect())
    }
}

impl fmt::Debug for ParamsArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// One intercepted invocation of a faked method.
///
/// Immutable once built.  Values written back to out and ref parameters are
/// carried by the [`CallOutcome`], not by the `Call`.
pub struct Call {
    fake: FakeId,
    method: Arc<Method>,
    arguments: Vec<Box<dyn ArgValue>>,
}

impl Call {
    /// Build a call, checking that there is one argument per parameter.
    pub fn new(fake: FakeId, method: Arc<Method>,
               arguments: Vec<Box<dyn ArgValue>>)
        -> Result<Self, FakeError>
    {
        let expected = method.parameters().len();
        if arguments.len() != expected {
            return Err(FakeError::ArgumentCount {
                method: method.to_string(),
                expected,
                actual: arguments.len()
            });
        }
        Ok(Call { fake, method, arguments })
    }

    pub fn fake(&self) -> FakeId {
        self.fake
    }

    pub fn method(&self) -> &Arc<Method> {
        &self.method
    }

    pub fn arguments(&self) -> impl ExactSizeIterator<Item=&dyn ArgValue> {
        self.arguments.iter().map(|b| &**b)
    }

    pub fn argument(&self, position: usize) -> Option<&dyn ArgValue> {
        self.arguments.get(position).map(|b| &**b)
    }

    /// The argument passed for the parameter called `name`.
    pub fn argument_named(&self, name: &str) -> Option<&dyn ArgValue> {
        self.method.parameters()
            .iter()
            .position(|p| p.name() == Some(name))
            .and_then(|i| self.argument(i))
    }

    /// The argument at `position`, if it is a `T`.
    pub fn get<T: 'static>(&self, position: usize) -> Option<&T> {
        self.argument(position)?.downcast_ref::<T>().ok()
    }

    /// A clone of the argument at `position`, or an error naming the
    /// expected type.
    pub fn cloned<T>(&self, position: usize) -> Result<T, FakeError>
        where T: Clone + 'static
    {
        self.get::<T>(position)
            .cloned()
            .ok_or_else(|| FakeError::ArgumentType {
                method: self.method.to_string(),
                position,
                expected: TypeInfo::of::<T>().name()
            })
    }

    /// Type of every argument, in order.
    pub fn argument_types(&self) -> Vec<TypeInfo> {
        self.arguments().map(|v| v.type_info()).collect()
    }
}

impl Clone for Call {
    fn clone(&self) -> Self {
        Call {
            fake: self.fake,
            method: self.method.clone(),
            arguments: self.arguments().map(|v| v.clone_value()).collect()
        }
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("fake", &self.fake)
            .field("method", &self.method.to_string())
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// Renders as `Type.Method(name: value, ...)`.  Parameters without a name are
/// rendered positionally.
impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.method)?;
        for (i, (param, value)) in self.method.parameters().iter()
            .zip(self.arguments())
            .enumerate()
        {
            if i > 0 {
                f.write_str(", ")?;
            }
            match param.name() {
                Some(name) => write!(f, "{}: {:?}", name, value)?,
                None => write!(f, "{:?}", value)?
            }
        }
        f.write_str(")")
    }
}

/// A call in a fake's history.
#[derive(Clone, Debug)]
pub struct CompletedCall {
    call: Call,
    rule: Option<RuleId>,
    sequence: u64,
    threw: bool,
}

impl CompletedCall {
    pub(crate) fn new(call: Call, rule: Option<RuleId>, sequence: u64,
                      threw: bool) -> Self
    {
        CompletedCall { call, rule, sequence, threw }
    }

    pub fn call(&self) -> &Call {
        &self.call
    }

    /// The rule that handled the call, or `None` if a default behavior did.
    pub fn rule(&self) -> Option<RuleId> {
        self.rule
    }

    /// Process-wide position of this call, used to order calls made to
    /// different fakes.
    pub fn sequence_number(&self) -> u64 {
        self.sequence
    }

    /// Did the call end by throwing rather than returning?
    pub fn threw(&self) -> bool {
        self.threw
    }
}

impl fmt::Display for CompletedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.call, f)
    }
}

/// A successfully produced result: the return value plus any values to write
/// back to out and ref parameters.
#[derive(Debug)]
pub struct Returned {
    value: ReturnValue,
    assigned: Vec<(usize, Box<dyn ArgValue>)>,
}

impl Returned {
    pub fn new<T: Send + 'static>(t: T) -> Self {
        Returned::from_value(ReturnValue::new(t))
    }

    pub fn from_value(value: ReturnValue) -> Self {
        Returned { value, assigned: Vec::new() }
    }

    /// Write `t` back to the out or ref parameter at `position`.
    pub fn assign<T>(mut self, position: usize, t: T) -> Self
        where T: Clone + fmt::Debug + Send + Sync + 'static
    {
        self.set_assigned(position, Box::new(t));
        self
    }

    pub(crate) fn set_assigned(&mut self, position: usize,
                               value: Box<dyn ArgValue>)
    {
        self.assigned.retain(|(p, _)| *p != position);
        self.assigned.push((position, value));
    }

    pub fn value(&self) -> &ReturnValue {
        &self.value
    }
}

/// What the proxy gets back from [`FakeManager::intercept`].
///
/// [`FakeManager::intercept`]: crate::FakeManager::intercept
#[derive(Debug)]
pub struct CallOutcome {
    method: Arc<Method>,
    result: Result<Returned, Thrown>,
}

impl CallOutcome {
    pub(crate) fn new(method: Arc<Method>, result: Result<Returned, Thrown>)
        -> Self
    {
        CallOutcome { method, result }
    }

    pub fn is_thrown(&self) -> bool {
        self.result.is_err()
    }

    /// Take the value to write back to the out or ref parameter at
    /// `position`.  `None` if the call threw, nothing was assigned, or the
    /// value is not a `T`.
    pub fn assigned<T: 'static>(&mut self, position: usize) -> Option<T> {
        let returned = self.result.as_mut().ok()?;
        let i = returned.assigned.iter()
            .position(|(p, v)| *p == position && (**v).is::<T>())?;
        let (_, value) = returned.assigned.remove(i);
        value.downcast::<T>().ok().map(|b| *b)
    }

    /// The return value, or whatever the call threw.
    pub fn into_result<T: 'static>(self) -> Result<T, Thrown> {
        let method = self.method.to_string();
        self.result
            .and_then(|r| r.value.downcast::<T>(&method).map_err(Thrown::from))
    }

    /// The return value.
    ///
    /// # Panics
    ///
    /// Rethrows whatever the call threw, see [`Thrown::rethrow`].
    pub fn into_value<T: 'static>(self) -> T {
        match self.into_result() {
            Ok(t) => t,
            Err(thrown) => thrown.rethrow()
        }
    }

    /// The return value of an async member, as a future.
    ///
    /// A thrown error does not escape synchronously; the returned future
    /// rethrows it when polled.
    pub fn into_future<T: Send + 'static>(self) -> BoxFuture<'static, T> {
        match self.into_result::<T>() {
            Ok(t) => future::ready(t).boxed(),
            Err(thrown) => future::lazy(move |_| -> T { thrown.rethrow() })
                .boxed()
        }
    }
}
