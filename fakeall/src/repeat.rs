// vim: tw=80
//! Call counts: how often a call must have happened, and how often a rule may
//! still apply.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering}
    }
};

#[derive(Clone)]
enum Kind {
    Exactly(usize),
    AtLeast(usize),
    NoMoreThan(usize),
    Like(String, Arc<dyn Fn(usize) -> bool + Send + Sync>),
}

/// A constraint on the number of times a call happened.
///
/// Used with [`CallAssertion::must_have_happened`] and
/// [`OrderedAssertions::must_have_happened`].
///
/// [`CallAssertion::must_have_happened`]: crate::CallAssertion::must_have_happened
/// [`OrderedAssertions::must_have_happened`]: crate::OrderedAssertions::must_have_happened
#[derive(Clone)]
pub struct Repeated(Kind);

impl Repeated {
    pub fn never() -> Self {
        Repeated(Kind::Exactly(0))
    }

    pub fn once() -> Self {
        Repeated::exactly(1)
    }

    pub fn twice() -> Self {
        Repeated::exactly(2)
    }

    pub fn exactly(n: usize) -> Self {
        Repeated(Kind::Exactly(n))
    }

    pub fn at_least_once() -> Self {
        Repeated::at_least(1)
    }

    pub fn at_least(n: usize) -> Self {
        Repeated(Kind::AtLeast(n))
    }

    pub fn no_more_than(n: usize) -> Self {
        Repeated(Kind::NoMoreThan(n))
    }

    /// Any count accepted by `f`.  `description` should describe `f`; it is
    /// used in failure messages.
    pub fn like<F>(description: impl Into<String>, f: F) -> Self
        where F: Fn(usize) -> bool + Send + Sync + 'static
    {
        Repeated(Kind::Like(description.into(), Arc::new(f)))
    }

    /// Does `count` satisfy this constraint?
    pub fn matches(&self, count: usize) -> bool {
        match &self.0 {
            Kind::Exactly(n) => count == *n,
            Kind::AtLeast(n) => count >= *n,
            Kind::NoMoreThan(n) => count <= *n,
            Kind::Like(_, f) => f(count),
        }
    }
}

fn times(n: usize) -> String {
    match n {
        1 => "once".to_owned(),
        2 => "twice".to_owned(),
        n => format!("{} times", n)
    }
}

impl fmt::Display for Repeated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Kind::Exactly(0) => f.write_str("never"),
            Kind::Exactly(n) => write!(f, "exactly {}", times(*n)),
            Kind::AtLeast(n) => write!(f, "at least {}", times(*n)),
            Kind::NoMoreThan(n) => write!(f, "no more than {}", times(*n)),
            Kind::Like(d, _) =>
                write!(f, "a number of times matching the predicate '{}'", d),
        }
    }
}

impl fmt::Debug for Repeated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Repeated({})", self)
    }
}

/// How many more times a rule may be applied.
#[derive(Debug)]
pub(crate) struct Times {
    /// How many times has the rule already been applied?
    count: AtomicUsize,
    /// `usize::MAX` means unlimited
    limit: AtomicUsize,
}

impl Times {
    /// Record one application of the rule, unless it is already done.
    /// Returns whether the application was allowed.
    pub fn call(&self) -> bool {
        let limit = self.limit.load(Ordering::Relaxed);
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                (limit == usize::MAX || count < limit).then_some(count + 1)
            })
            .is_ok()
    }

    /// Has the rule already been applied the maximum allowed number of
    /// times?
    pub fn is_done(&self) -> bool {
        match self.remaining() {
            Some(n) => n == 0,
            None => false
        }
    }

    /// Allow `n` more applications, counting from now.
    pub fn limit(&self, n: usize) {
        let count = self.count.load(Ordering::Relaxed);
        self.limit.store(count.saturating_add(n), Ordering::Relaxed);
    }

    /// Remaining applications, or `None` if unlimited
    pub fn remaining(&self) -> Option<usize> {
        let limit = self.limit.load(Ordering::Relaxed);
        if limit == usize::MAX {
            None
        } else {
            Some(limit.saturating_sub(self.count.load(Ordering::Relaxed)))
        }
    }
}

impl Default for Times {
    fn default() -> Self {
        // By default, allow any number of calls
        Times {
            count: AtomicUsize::new(0),
            limit: AtomicUsize::new(usize::MAX)
        }
    }
}
