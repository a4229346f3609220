// vim: tw=80
//! What a rule does when it applies to a call.

use std::{
    fmt,
    sync::Arc
};

use crate::{
    call::{Call, Returned},
    error::{FakeError, Thrown},
    method::Method,
    value::{ArgValue, ReturnValue, TypeInfo, type_list}
};

/// A tuple of argument types, used by the typed callback methods like
/// [`RuleBuilder::invokes_with`](crate::RuleBuilder::invokes_with) and by
/// events.
///
/// Implemented for `()` and for tuples of up to eight [`ArgValue`]s.
pub trait ArgumentTuple: Sized + 'static {
    /// Type of every element, in order
    fn signature() -> Vec<TypeInfo>;

    /// Clone a tuple out of type-erased values.  `None` if the number or the
    /// types of the values don't fit.
    fn from_values(values: &[&dyn ArgValue]) -> Option<Self>;

    fn into_values(self) -> Vec<Box<dyn ArgValue>>;
}

impl ArgumentTuple for () {
    fn signature() -> Vec<TypeInfo> {
        Vec::new()
    }

    fn from_values(values: &[&dyn ArgValue]) -> Option<Self> {
        values.is_empty().then_some(())
    }

    fn into_values(self) -> Vec<Box<dyn ArgValue>> {
        Vec::new()
    }
}

macro_rules! argument_tuple {
    ($n:expr; $($t:ident $i:tt),+) => {
        impl<$($t),+> ArgumentTuple for ($($t,)+)
            where $($t: Clone + fmt::Debug + Send + Sync + 'static),+
        {
            fn signature() -> Vec<TypeInfo> {
                vec![$(TypeInfo::of::<$t>()),+]
            }

            fn from_values(values: &[&dyn ArgValue]) -> Option<Self> {
                if values.len() != $n {
                    return None;
                }
                Some(($(values[$i].downcast_ref::<$t>().ok()?.clone(),)+))
            }

            fn into_values(self) -> Vec<Box<dyn ArgValue>> {
                vec![$(Box::new(self.$i) as Box<dyn ArgValue>),+]
            }
        }
    }
}

argument_tuple!(1; A 0);
argument_tuple!(2; A 0, B 1);
argument_tuple!(3; A 0, B 1, C 2);
argument_tuple!(4; A 0, B 1, C 2, D 3);
argument_tuple!(5; A 0, B 1, C 2, D 3, E 4);
argument_tuple!(6; A 0, B 1, C 2, D 3, E 4, F 5);
argument_tuple!(7; A 0, B 1, C 2, D 3, E 4, F 5, G 6);
argument_tuple!(8; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

/// Extract the arguments of `call` as an `A`, for the typed configuration
/// method `operation`.
pub(crate) fn typed_arguments<A: ArgumentTuple>(call: &Call,
                                                operation: &'static str)
    -> Result<A, FakeError>
{
    let values = call.arguments().collect::<Vec<_>>();
    A::from_values(&values).ok_or_else(|| FakeError::CallbackSignature {
        operation,
        faked: call.method().signature(),
        callback: type_list(A::signature().iter())
    })
}

pub(crate) type Action =
    Arc<dyn Fn(&Call) -> Result<(), FakeError> + Send + Sync>;
pub(crate) type Producer =
    Arc<dyn Fn(&Call) -> Result<ReturnValue, FakeError> + Send + Sync>;
pub(crate) type Raiser = Arc<dyn Fn(&Call) -> Thrown + Send + Sync>;
pub(crate) type Assigner =
    Arc<dyn Fn(&Call) -> Result<Vec<Box<dyn ArgValue>>, FakeError>
        + Send + Sync>;

/// The terminal step of a behavior.
#[derive(Clone, Default)]
pub(crate) enum Outcome {
    /// Nothing configured.  Behaves like `DoNothing`.
    #[default]
    Unset,
    Return(Producer),
    Throw(Raiser),
    /// Return the default value of the return type
    DoNothing,
    /// Forward to the wrapped instance
    CallWrapped,
}

impl Outcome {
    fn is_set(&self) -> bool {
        !matches!(self, Outcome::Unset)
    }
}

/// Services a behavior needs from the fake that runs it.
pub(crate) trait Fallback {
    /// The value returned by calls that configure no return value.
    fn default_value(&self, call: &Call) -> Result<ReturnValue, FakeError>;

    /// Forward `call` to the wrapped instance.
    fn call_wrapped(&self, call: &Call) -> Result<Returned, Thrown>;
}

/// The behavior of a rule: callbacks run in configuration order, then a
/// terminal step, then out and ref assignments.
#[derive(Clone, Default)]
pub(crate) struct Behavior {
    actions: Vec<Action>,
    outcome: Outcome,
    out_and_ref: Option<Assigner>,
}

impl Behavior {
    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Bind the terminal step.  It may only be bound once.
    pub fn set_outcome(&mut self, outcome: Outcome)
        -> Result<(), ()>
    {
        if self.outcome.is_set() {
            return Err(());
        }
        self.outcome = outcome;
        Ok(())
    }

    /// Bind the out and ref assignments.  They may only be bound once.
    pub fn set_out_and_ref(&mut self, assigner: Assigner) -> Result<(), ()> {
        if self.out_and_ref.is_some() {
            return Err(());
        }
        self.out_and_ref = Some(assigner);
        Ok(())
    }

    pub fn execute(&self, call: &Call, fallback: &dyn Fallback)
        -> Result<Returned, Thrown>
    {
        for action in self.actions.iter() {
            action(call)?;
        }
        let mut returned = match &self.outcome {
            Outcome::Unset | Outcome::DoNothing => {
                Returned::from_value(fallback.default_value(call)?)
            }
            Outcome::Return(producer) => {
                let value = producer(call)?;
                check_return_type(call, &value)?;
                Returned::from_value(value)
            }
            Outcome::Throw(raiser) => return Err(raiser(call)),
            Outcome::CallWrapped => fallback.call_wrapped(call)?,
        };
        if let Some(assigner) = &self.out_and_ref {
            let values = assigner(call)?;
            check_out_and_ref(call.method(), &call.to_string(), &values)?;
            let positions = call.method().by_ref_positions();
            for (position, value) in positions.into_iter().zip(values) {
                returned.set_assigned(position, value);
            }
        }
        Ok(returned)
    }
}

/// Check that `values` fit the out and ref parameters of `method`, in number
/// and in type.  `call` describes the call or rule, for diagnostics.
pub(crate) fn check_out_and_ref(method: &Method, call: &str,
                                values: &[Box<dyn ArgValue>])
    -> Result<(), FakeError>
{
    let positions = method.by_ref_positions();
    if values.len() != positions.len() {
        return Err(FakeError::OutAndRefCount {
            call: call.to_owned(),
            expected: positions.len(),
            actual: values.len()
        });
    }
    for (position, value) in positions.into_iter().zip(values.iter()) {
        let param = &method.parameters()[position];
        let actual = (**value).type_info();
        if let Some(expected) = param.type_info() {
            if expected != actual {
                return Err(FakeError::OutAndRefType {
                    call: call.to_owned(),
                    parameter: param.name()
                        .map(str::to_owned)
                        .unwrap_or_else(|| format!("argument {}", position)),
                    expected: expected.name(),
                    actual: actual.name()
                });
            }
        }
    }
    Ok(())
}

fn check_return_type(call: &Call, value: &ReturnValue) -> Result<(), FakeError>
{
    let expected = call.method().return_type().type_info();
    if value.type_info() == expected {
        Ok(())
    } else {
        Err(FakeError::ReturnType {
            method: call.method().to_string(),
            expected: expected.name(),
            actual: value.type_info().name()
        })
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match &self.outcome {
            Outcome::Unset => "Unset",
            Outcome::Return(_) => "Return",
            Outcome::Throw(_) => "Throw",
            Outcome::DoNothing => "DoNothing",
            Outcome::CallWrapped => "CallWrapped",
        };
        f.debug_struct("Behavior")
            .field("actions", &self.actions.len())
            .field("outcome", &outcome)
            .field("assigns_out_and_ref", &self.out_and_ref.is_some())
            .finish()
    }
}

#[cfg(test)]
mod t {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        call::FakeId,
        method::Method,
        value::arg_value
    };

    struct NoFallback;
    impl Fallback for NoFallback {
        fn default_value(&self, call: &Call) -> Result<ReturnValue, FakeError>
        {
            call.method().return_type().default_maker()
                .map(|f| f())
                .ok_or_else(|| FakeError::NoDummy {
                    method: call.method().to_string(),
                    type_name: call.method().return_type().type_info().name()
                })
        }

        fn call_wrapped(&self, call: &Call) -> Result<Returned, Thrown> {
            Err(FakeError::NoWrappedInstance { call: call.to_string() }.into())
        }
    }

    fn call(m: Method, args: Vec<Box<dyn ArgValue>>) -> Call {
        Call::new(FakeId::next(), Arc::new(m), args).unwrap()
    }

    fn baz() -> Call {
        call(Method::new("IFoo", "Baz").returning::<i32>(), Vec::new())
    }

    #[test]
    fn tuple_from_values() {
        let a = arg_value(1i32);
        let b = arg_value(String::from("x"));
        let values = [&*a, &*b];
        assert_eq!(Some((1i32, String::from("x"))),
            <(i32, String)>::from_values(&values));
        assert_eq!(None, <(i32, u8)>::from_values(&values));
        assert_eq!(None, <(i32,)>::from_values(&values));
        assert_eq!(Some(()), <()>::from_values(&[]));
    }

    #[test]
    fn callbacks_run_in_order_before_return() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut b = Behavior::default();
        let l1 = log.clone();
        b.add_action(Arc::new(move |_: &Call| {
            l1.lock().unwrap().push("a");
            Ok(())
        }));
        let l2 = log.clone();
        b.add_action(Arc::new(move |_: &Call| {
            l2.lock().unwrap().push("b");
            Ok(())
        }));
        b.set_outcome(Outcome::Return(Arc::new(|_: &Call| Ok(ReturnValue::new(10i32)))))
            .unwrap();
        let r = b.execute(&baz(), &NoFallback).unwrap();
        assert_eq!(vec!["a", "b"], *log.lock().unwrap());
        assert!(r.value().is::<i32>());
    }

    #[test]
    fn outcome_binds_once() {
        let mut b = Behavior::default();
        b.set_outcome(Outcome::DoNothing).unwrap();
        assert!(b.set_outcome(Outcome::CallWrapped).is_err());
    }

    #[test]
    fn unset_returns_default() {
        let b = Behavior::default();
        let r = b.execute(&baz(), &NoFallback).unwrap();
        assert!(r.value().is::<i32>());
    }

    #[test]
    fn wrong_return_type() {
        let mut b = Behavior::default();
        b.set_outcome(Outcome::Return(Arc::new(|_: &Call| Ok(ReturnValue::new(1u8)))))
            .unwrap();
        let e = b.execute(&baz(), &NoFallback).unwrap_err();
        assert_eq!(Some(&FakeError::ReturnType {
            method: "IFoo.Baz".to_owned(),
            expected: "i32".to_owned(),
            actual: "u8".to_owned()
        }), e.as_fake_error());
    }

    #[test]
    fn throw_skips_assignment() {
        let assigned = Arc::new(AtomicUsize::new(0));
        let a2 = assigned.clone();
        let mut b = Behavior::default();
        b.set_outcome(Outcome::Throw(Arc::new(|c: &Call|
            Thrown::from(FakeError::UnconfiguredStrictCall {
                call: c.to_string()
            })))).unwrap();
        b.set_out_and_ref(Arc::new(move |_: &Call| {
            a2.fetch_add(1, Ordering::Relaxed);
            Ok(Vec::new())
        })).unwrap();
        assert!(b.execute(&baz(), &NoFallback).is_err());
        assert_eq!(0, assigned.load(Ordering::Relaxed));
    }

    #[test]
    fn out_and_ref_count_mismatch() {
        let m = Method::new("IHaveAnOut", "M").with_out_param::<String>("s");
        let c = call(m, vec![arg_value(String::new())]);
        let mut b = Behavior::default();
        b.set_out_and_ref(Arc::new(|_: &Call| Ok(vec![arg_value(1i32),
                                               arg_value(2i32)])))
            .unwrap();
        let e = b.execute(&c, &NoFallback).unwrap_err();
        assert_eq!(Some(&FakeError::OutAndRefCount {
            call: "IHaveAnOut.M(s: \"\")".to_owned(),
            expected: 1,
            actual: 2
        }), e.as_fake_error());
    }

    #[test]
    fn typed_arguments_mismatch() {
        let m = Method::new("IFoo", "Bar").with_param::<i32>("x");
        let c = call(m, vec![arg_value(1i32)]);
        let e = typed_arguments::<(String,)>(&c, "invokes_with").unwrap_err();
        assert_eq!("The faked method has the signature (i32), but invokes_with was used with (String).",
            e.to_string());
    }
}
