// vim: tw=80
//! Argument constraints: predicates over a single argument value.

use std::{
    fmt,
    sync::Arc
};

use predicates::prelude::Predicate;
use predicates_tree::CaseTreeExt;

use crate::{
    call::ParamsArray,
    value::{ArgValue, TypeInfo}
};

type Check = Arc<dyn Fn(&dyn ArgValue) -> bool + Send + Sync>;
type Explain = Arc<dyn Fn(&dyn ArgValue) -> Option<String> + Send + Sync>;

/// A predicate over one argument of a call, plus a description of it.
///
/// Constraints are usually built with the helpers in [`arg`](crate::arg).
/// Every constraint is immutable once built; composing constraints creates
/// new ones.
#[derive(Clone)]
pub struct ArgumentConstraint {
    description: String,
    ignored: bool,
    /// The argument type this constraint is written for, if it has one
    type_info: Option<TypeInfo>,
    check: Check,
    explain: Option<Explain>,
}

impl ArgumentConstraint {
    /// A constraint from an arbitrary check over the type-erased value.
    pub fn new<F>(description: impl Into<String>, check: F) -> Self
        where F: Fn(&dyn ArgValue) -> bool + Send + Sync + 'static
    {
        ArgumentConstraint {
            description: description.into(),
            ignored: false,
            type_info: None,
            check: Arc::new(check),
            explain: None,
        }
    }

    /// Accepts every value.
    pub fn ignored() -> Self {
        let mut c = ArgumentConstraint::new("<Ignored>", |_| true);
        c.ignored = true;
        c
    }

    /// Accepts every value of type `T`.
    pub fn any<T: 'static>() -> Self {
        let mut c = ArgumentConstraint::new("<Ignored>", |v| v.is::<T>());
        c.ignored = true;
        c.type_info = Some(TypeInfo::of::<T>());
        c
    }

    /// Accepts values equal to `expected`.  Described by the value itself, as
    /// if the value had been written literally in the call.
    pub fn eq<T>(expected: T) -> Self
        where T: ArgValue + PartialEq
    {
        let description = format!("{:?}", expected);
        ArgumentConstraint::typed::<T, _>(description,
            move |v| *v == expected)
    }

    /// Accepts values of type `T` for which `f` returns true.
    pub fn typed<T, F>(description: impl Into<String>, f: F) -> Self
        where T: 'static, F: Fn(&T) -> bool + Send + Sync + 'static
    {
        let mut c = ArgumentConstraint::new(description, move |v| {
            v.downcast_ref::<T>().map(&f).unwrap_or(false)
        });
        c.type_info = Some(TypeInfo::of::<T>());
        c
    }

    /// Accepts values of type `T` that satisfy a
    /// [`predicates`](https://docs.rs/predicates) predicate.  Failures can be
    /// explained with the predicate's case tree.
    pub fn from_predicate<T, P>(p: P) -> Self
        where T: 'static, P: Predicate<T> + Send + Sync + 'static
    {
        let p = Arc::new(p);
        let description = format!("<{}>", p);
        let p2 = p.clone();
        let mut c = ArgumentConstraint::typed::<T, _>(description,
            move |t| p.eval(t));
        c.explain = Some(Arc::new(move |v| {
            let t = v.downcast_ref::<T>().ok()?;
            p2.find_case(false, t).map(|case| case.tree().to_string())
        }));
        c
    }

    /// Like [`from_predicate`](#method.from_predicate), for `String`
    /// arguments checked with a `str` predicate such as
    /// `predicate::str::contains`.
    pub fn from_str_predicate<P>(p: P) -> Self
        where P: Predicate<str> + Send + Sync + 'static
    {
        let p = Arc::new(p);
        let description = format!("<{}>", p);
        let p2 = p.clone();
        let mut c = ArgumentConstraint::typed::<String, _>(description,
            move |s| p.eval(s.as_str()));
        c.explain = Some(Arc::new(move |v| {
            let s = v.downcast_ref::<String>().ok()?;
            p2.find_case(false, s.as_str())
                .map(|case| case.tree().to_string())
        }));
        c
    }

    /// Accepts exactly the values this constraint rejects.
    pub fn negate(self) -> Self {
        let description = format!("<not {}>", strip_brackets(&self.description));
        let check = self.check;
        let mut c = ArgumentConstraint::new(description, move |v| !check(v));
        c.type_info = self.type_info;
        c
    }

    /// An element-wise constraint for a params array: the array must have as
    /// many elements as there are constraints, and each element must satisfy
    /// its constraint.
    pub fn elements(constraints: Vec<ArgumentConstraint>) -> Self {
        let description = format!("[{}]", constraints.iter()
            .map(ArgumentConstraint::description)
            .collect::<Vec<_>>()
            .join(", "));
        ArgumentConstraint::typed::<ParamsArray, _>(description, move |array| {
            array.len() == constraints.len()
                && array.iter()
                    .zip(constraints.iter())
                    .all(|(v, c)| c.matches(v))
        })
    }

    /// A whole-array constraint for a params array whose elements are all of
    /// type `T`.
    pub fn array_that<T, F>(description: &str, f: F) -> Self
        where T: 'static, F: Fn(&[&T]) -> bool + Send + Sync + 'static
    {
        ArgumentConstraint::typed::<ParamsArray, _>(format!("<{}>", description),
            move |array| {
                array.values::<T>()
                    .map(|values| f(&values))
                    .unwrap_or(false)
            })
    }

    /// Accepts a params array whose elements equal `expected`.
    pub fn array_eq<T>(expected: Vec<T>) -> Self
        where T: ArgValue + PartialEq
    {
        let description = format!("{:?}", expected);
        ArgumentConstraint::typed::<ParamsArray, _>(description, move |array| {
            array.values::<T>()
                .map(|values| {
                    values.len() == expected.len()
                        && values.iter().zip(expected.iter())
                            .all(|(a, b)| *a == b)
                })
                .unwrap_or(false)
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The argument type this constraint accepts, if it only accepts one
    pub fn type_info(&self) -> Option<TypeInfo> {
        self.type_info
    }

    /// Is this the wildcard constraint?
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    pub fn matches(&self, value: &dyn ArgValue) -> bool {
        (self.check)(value)
    }

    /// Explain why `value` fails this constraint, or `None` if it passes.
    pub fn explain(&self, value: &dyn ArgValue) -> Option<String> {
        if self.matches(value) {
            return None;
        }
        let detail = self.explain.as_ref().and_then(|e| e(value));
        Some(detail.unwrap_or_else(|| {
            let actual: TypeInfo = value.type_info();
            format!("{:?} ({}) does not satisfy {}", value, actual,
                    self.description)
        }))
    }
}

impl fmt::Debug for ArgumentConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArgumentConstraint")
            .field(&self.description)
            .finish()
    }
}

impl fmt::Display for ArgumentConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

fn strip_brackets(s: &str) -> &str {
    s.strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(s)
}
