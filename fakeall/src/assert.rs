// vim: tw=80
//! Assertions on call history.

use std::sync::Arc;

use crate::{
    call::CompletedCall,
    error::{FakeError, Result},
    format::DiagnosticWriter,
    history,
    manager::{FakeManager, Faked},
    matcher::CallMatcher,
    repeat::Repeated
};

/// An assertion about the calls made to one fake.
///
/// Obtained from [`FakeManager::assert_that`].  Assertions only read the
/// history, so they may be repeated any number of times.
#[derive(Debug)]
pub struct CallAssertion<'a> {
    manager: &'a FakeManager,
    matcher: CallMatcher,
}

impl<'a> CallAssertion<'a> {
    pub(crate) fn new(manager: &'a FakeManager, matcher: CallMatcher) -> Self {
        CallAssertion { manager, matcher }
    }

    /// Check that the number of matching calls satisfies `repeat`.
    pub fn must_have_happened(&self, repeat: Repeated) -> Result<()> {
        check_unordered(self.manager, &self.matcher, &repeat)
    }

    pub fn must_have_happened_once_exactly(&self) -> Result<()> {
        self.must_have_happened(Repeated::once())
    }

    pub fn must_not_have_happened(&self) -> Result<()> {
        self.must_have_happened(Repeated::never())
    }
}

fn check_unordered(manager: &FakeManager, matcher: &CallMatcher,
                   repeat: &Repeated) -> Result<()>
{
    matcher.check_types()?;
    let calls = manager.recorded_calls();
    let count = calls.iter()
        .filter(|c| matcher.matches(c.call()))
        .count();
    if repeat.matches(count) {
        return Ok(());
    }
    let mut w = DiagnosticWriter::new();
    w.blank().blank().indented(|w| {
        w.line("Assertion failed for the following call:");
        w.indented(|w| {
            w.line(matcher.to_string());
        });
        if calls.is_empty() {
            w.line(format!("Expected to find it {} but no calls were made to the fake object.",
                           repeat));
        } else {
            w.line(format!("Expected to find it {} but found it #{} times among the calls:",
                           repeat, count));
            w.indented(|w| {
                w.calls(&calls);
            });
        }
    }).blank();
    Err(FakeError::Expectation(w.finish()))
}

/// Assertions that calls happened in a particular order, possibly across
/// several fakes.
///
/// Each assertion first checks, like [`CallAssertion::must_have_happened`],
/// that the call happened at all.  It then checks that enough matching calls
/// happened after the calls that satisfied the previous assertions.  Matching
/// calls are consumed leftmost first.
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use fakeall::*;
/// # struct Fake(Arc<FakeManager>);
/// # impl Faked for Fake {
/// #     fn fake_manager(&self) -> &Arc<FakeManager> { &self.0 }
/// # }
/// let fake = Fake(FakeManager::new("IFoo"));
/// let bar = Arc::new(Method::new("IFoo", "Bar").with_param::<i32>("x"));
/// for x in [1, 2] {
///     fake.0.intercept_with(bar.clone(), vec![arg_value(x)]);
/// }
/// let bar_with = |x: i32| CallMatcher::new(bar.clone(), vec![arg::eq(x)])
///     .unwrap();
/// let mut ordered = OrderedAssertions::new();
/// ordered.must_have_happened(&fake, bar_with(1), Repeated::once()).unwrap();
/// ordered.must_have_happened(&fake, bar_with(2), Repeated::once()).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct OrderedAssertions {
    /// Every fake asserted on so far
    fakes: Vec<Arc<FakeManager>>,
    /// Description of every assertion so far
    asserted: Vec<String>,
    /// Sequence number of the last call consumed
    cursor: Option<u64>,
}

impl OrderedAssertions {
    pub fn new() -> Self {
        OrderedAssertions::default()
    }

    pub fn must_have_happened<F>(&mut self, fake: &F, matcher: CallMatcher,
                                 repeat: Repeated) -> Result<&mut Self>
        where F: Faked + ?Sized
    {
        let manager = fake.fake_manager();
        check_unordered(manager, &matcher, &repeat)?;
        if !self.fakes.iter().any(|m| m.id() == manager.id()) {
            self.fakes.push(manager.clone());
        }
        self.asserted.push(format!("'{}' repeated {}", matcher, repeat));
        if repeat.matches(0) {
            return Ok(self);
        }
        let calls = history::merge(self.fakes.iter().map(|m| m.history()));
        let mut count = 0;
        for call in calls.iter()
            .filter(|c| self.cursor.map(|n| c.sequence_number() > n)
                .unwrap_or(true))
        {
            if matcher.matches(call.call()) {
                count += 1;
                if repeat.matches(count) {
                    self.cursor = Some(call.sequence_number());
                    return Ok(self);
                }
            }
        }
        Err(FakeError::Expectation(self.out_of_order(&calls)))
    }

    fn out_of_order(&self, calls: &[CompletedCall]) -> String {
        let mut w = DiagnosticWriter::new();
        w.blank().blank().indented(|w| {
            w.line("Assertion failed for the following calls:");
            w.indented(|w| {
                for a in self.asserted.iter() {
                    w.line(a);
                }
            });
            w.line("The calls where found but not in the correct order among the calls:");
            w.indented(|w| {
                w.calls(calls);
            });
        }).blank();
        w.finish()
    }
}
