// vim: tw=80
//! Deciding whether a call satisfies a rule or an assertion.

use std::{
    fmt,
    sync::Arc
};

use crate::{
    call::Call,
    constraint::ArgumentConstraint,
    error::FakeError,
    method::Method,
    value::TypeInfo
};

type CallPredicate = Arc<dyn Fn(&Call) -> bool + Send + Sync>;

/// Matches calls against a method identity, one constraint per argument, and
/// any number of predicates over the whole call.
///
/// Matching never has side effects, so a matcher can be evaluated any number
/// of times.
#[derive(Clone)]
pub struct CallMatcher {
    /// `None` matches calls to every method
    method: Option<Arc<Method>>,
    constraints: Vec<ArgumentConstraint>,
    /// Replaces the argument constraints when set
    arguments_predicate: Option<CallPredicate>,
    predicates: Vec<(String, CallPredicate)>,
    return_type: Option<TypeInfo>,
}

impl CallMatcher {
    /// Match calls to `method` whose arguments satisfy `constraints`.
    ///
    /// There must be exactly one constraint per parameter of `method`.
    pub fn new(method: Arc<Method>, constraints: Vec<ArgumentConstraint>)
        -> Result<Self, FakeError>
    {
        let expected = method.parameters().len();
        if constraints.len() != expected {
            return Err(FakeError::ConstraintCount {
                method: method.to_string(),
                expected,
                actual: constraints.len()
            });
        }
        let matcher = CallMatcher::new_unchecked(method, constraints);
        matcher.check_types()?;
        Ok(matcher)
    }

    /// Like [`new`](#method.new), for callers that already guarantee one
    /// constraint per parameter.
    #[doc(hidden)]
    pub fn new_unchecked(method: Arc<Method>,
                         constraints: Vec<ArgumentConstraint>) -> Self
    {
        CallMatcher {
            method: Some(method),
            constraints,
            arguments_predicate: None,
            predicates: Vec::new(),
            return_type: None
        }
    }

    /// Match every call made to the fake.
    pub fn any_call() -> Self {
        CallMatcher {
            method: None,
            constraints: Vec::new(),
            arguments_predicate: None,
            predicates: Vec::new(),
            return_type: None
        }
    }

    /// Additionally require `f` to accept the call.  `description` is used in
    /// diagnostics.
    pub fn where_call<F>(mut self, description: impl Into<String>, f: F) -> Self
        where F: Fn(&Call) -> bool + Send + Sync + 'static
    {
        self.predicates.push((description.into(), Arc::new(f)));
        self
    }

    /// Match the arguments with a single predicate over the whole call,
    /// instead of with per-argument constraints.
    pub fn when_arguments_match<F>(mut self, f: F) -> Self
        where F: Fn(&Call) -> bool + Send + Sync + 'static
    {
        self.arguments_predicate = Some(Arc::new(f));
        self
    }

    /// Only match calls to members returning `T`.  Intended for
    /// [`any_call`](#method.any_call) matchers.
    pub fn with_return_type<T: 'static>(mut self) -> Self {
        self.return_type = Some(TypeInfo::of::<T>());
        self
    }

    /// Check that every typed constraint is written for the type of its
    /// parameter.  A constraint for another type could never match.
    pub fn check_types(&self) -> Result<(), FakeError> {
        let Some(method) = &self.method else {
            return Ok(());
        };
        if self.arguments_predicate.is_some() {
            return Ok(());
        }
        for (i, (param, c)) in method.parameters().iter()
            .zip(self.constraints.iter())
            .enumerate()
        {
            if let (Some(expected), Some(actual)) =
                (param.type_info(), c.type_info())
            {
                if expected != actual {
                    return Err(FakeError::ConstraintType {
                        method: method.to_string(),
                        parameter: param.name()
                            .map(str::to_owned)
                            .unwrap_or_else(|| format!("argument {}", i)),
                        expected: expected.name(),
                        actual: actual.name()
                    });
                }
            }
        }
        Ok(())
    }

    /// The configured method, if this matcher is restricted to one.
    pub fn method(&self) -> Option<&Arc<Method>> {
        self.method.as_ref()
    }

    /// Does the call's method fit, regardless of its arguments?
    pub fn matches_method(&self, call: &Call) -> bool {
        let method_ok = match &self.method {
            Some(m) => m.matches(call.method()),
            None => true
        };
        let return_ok = match &self.return_type {
            Some(t) => call.method().return_type().type_info() == *t,
            None => true
        };
        method_ok && return_ok
    }

    fn matches_arguments(&self, call: &Call) -> bool {
        match &self.arguments_predicate {
            Some(p) => p(call),
            None => self.constraints.iter()
                .zip(call.arguments())
                .all(|(c, v)| c.matches(v))
        }
    }

    pub fn matches(&self, call: &Call) -> bool {
        self.matches_method(call)
            && self.matches_arguments(call)
            && self.predicates.iter().all(|(_, p)| p(call))
    }

    /// Explain why `call` does not match, one line per failing part.  Empty if
    /// it does match.
    pub fn explain_mismatch(&self, call: &Call) -> Vec<String> {
        let mut why = Vec::new();
        if !self.matches_method(call) {
            why.push(format!("{} is not a call to {}", call, self));
            return why;
        }
        match &self.arguments_predicate {
            Some(p) => if !p(call) {
                why.push("the arguments predicate returned false".to_owned());
            },
            None => {
                let params = call.method().parameters();
                for (i, (c, v)) in self.constraints.iter()
                    .zip(call.arguments())
                    .enumerate()
                {
                    if let Some(e) = c.explain(v) {
                        let name = params.get(i)
                            .and_then(|p| p.name())
                            .map(str::to_owned)
                            .unwrap_or_else(|| format!("argument {}", i));
                        why.push(format!("{}: {}", name, e));
                    }
                }
            }
        }
        for (description, p) in self.predicates.iter() {
            if !p(call) {
                why.push(format!("{} is false", description));
            }
        }
        why
    }
}

impl fmt::Debug for CallMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CallMatcher")
            .field(&self.to_string())
            .finish()
    }
}

/// Renders like the calls it matches, eg `IFoo.Bar(x: <var > 3>)`.
impl fmt::Display for CallMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            None => match &self.return_type {
                None => f.write_str("Any call made to the fake object.")?,
                Some(t) => write!(f,
                    "Any call with return type {} to the fake object.", t)?
            },
            Some(m) => {
                write!(f, "{}(", m)?;
                if self.arguments_predicate.is_some() {
                    f.write_str("<Predicated>")?;
                } else {
                    for (i, (param, c)) in m.parameters().iter()
                        .zip(self.constraints.iter())
                        .enumerate()
                    {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        match param.name() {
                            Some(name) => write!(f, "{}: {}", name, c)?,
                            None => write!(f, "{}", c)?
                        }
                    }
                }
                f.write_str(")")?;
            }
        }
        for (description, _) in self.predicates.iter() {
            write!(f, " where {}", description)?;
        }
        Ok(())
    }
}
