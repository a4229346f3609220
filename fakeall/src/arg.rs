// vim: tw=80
//! Argument constraints, for building [`CallMatcher`]s.
//!
//! ```
//! # use std::sync::Arc;
//! # use fakeall::*;
//! let bar = Arc::new(Method::new("IFoo", "Bar")
//!     .with_param::<i32>("x")
//!     .with_param::<String>("name"));
//! let matcher = CallMatcher::new(bar, vec![
//!     arg::matches::<i32, _>(predicate::gt(3)),
//!     arg::not(arg::eq(String::from("bob")))
//! ]).unwrap();
//! assert_eq!("IFoo.Bar(x: <var > 3>, name: <not \"bob\">)",
//!            matcher.to_string());
//! ```
//!
//! [`CallMatcher`]: crate::CallMatcher

use predicates::prelude::Predicate;

use crate::{
    constraint::ArgumentConstraint,
    value::ArgValue
};

/// Accept arguments equal to `t`.
pub fn eq<T>(t: T) -> ArgumentConstraint
    where T: ArgValue + PartialEq
{
    ArgumentConstraint::eq(t)
}

/// Accept any argument of type `T`.
pub fn any<T: 'static>() -> ArgumentConstraint {
    ArgumentConstraint::any::<T>()
}

/// Accept any argument at all.
pub fn ignored() -> ArgumentConstraint {
    ArgumentConstraint::ignored()
}

/// Accept arguments of type `T` for which `f` returns true.
pub fn that<T, F>(description: &str, f: F) -> ArgumentConstraint
    where T: 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    ArgumentConstraint::typed(format!("<{}>", description), f)
}

/// Accept arguments that satisfy a predicate from the
/// [`predicates`](https://docs.rs/predicates) crate.
pub fn matches<T, P>(p: P) -> ArgumentConstraint
    where T: 'static,
          P: Predicate<T> + Send + Sync + 'static
{
    ArgumentConstraint::from_predicate(p)
}

/// Accept `String` arguments that satisfy a `str` predicate, like
/// `predicate::str::starts_with`.
pub fn matches_str<P>(p: P) -> ArgumentConstraint
    where P: Predicate<str> + Send + Sync + 'static
{
    ArgumentConstraint::from_str_predicate(p)
}

/// Accept the arguments that `c` rejects.
pub fn not(c: ArgumentConstraint) -> ArgumentConstraint {
    c.negate()
}

/// Constrain a params array element by element.
pub fn elements(constraints: Vec<ArgumentConstraint>) -> ArgumentConstraint {
    ArgumentConstraint::elements(constraints)
}

/// Accept a params array equal to `values`.
pub fn array_eq<T>(values: Vec<T>) -> ArgumentConstraint
    where T: ArgValue + PartialEq
{
    ArgumentConstraint::array_eq(values)
}

/// Accept a params array of `T`s for which `f` returns true.
pub fn array_that<T, F>(description: &str, f: F) -> ArgumentConstraint
    where T: 'static,
          F: Fn(&[&T]) -> bool + Send + Sync + 'static
{
    ArgumentConstraint::array_that(description, f)
}

/// Box values for
/// [`assigns_out_and_ref_parameters`](crate::RuleBuilder::assigns_out_and_ref_parameters).
///
/// Each value must have exactly the type of its parameter; a `&str` is not a
/// `String`.
///
/// ```
/// # use fakeall::*;
/// let values = values![String::from("you"), 3u8];
/// assert_eq!(2, values.len());
/// ```
#[macro_export]
macro_rules! values {
    ($($v:expr),* $(,)?) => {
        vec![$($crate::arg_value($v)),*]
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::value::arg_value;

    #[test]
    fn that() {
        let c = super::that::<u32, _>("even", |x| x % 2 == 0);
        assert_eq!("<even>", c.description());
        assert!(c.matches(&*arg_value(2u32)));
        assert!(!c.matches(&*arg_value(3u32)));
    }

    #[test]
    fn matches_str() {
        use predicates::prelude::predicate;
        let c = super::matches_str(predicate::str::starts_with("ab"));
        assert!(c.matches(&*arg_value(String::from("abc"))));
    }
}
