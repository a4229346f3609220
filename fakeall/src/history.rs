// vim: tw=80
//! The record of calls made to a fake.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    call::CompletedCall,
    matcher::CallMatcher
};

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Take the next process-wide call sequence number.
///
/// Numbers are unique and strictly increasing across every fake, so calls to
/// different fakes can be put in the order they were made.
pub fn next_sequence_number() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// The calls made to one fake, in the order they completed.
#[derive(Clone, Debug, Default)]
pub struct CallHistory {
    calls: Vec<CompletedCall>,
}

impl CallHistory {
    pub(crate) fn push(&mut self, call: CompletedCall) {
        debug_assert!(self.calls.last()
            .map(|last| last.sequence_number() < call.sequence_number())
            .unwrap_or(true));
        self.calls.push(call);
    }

    pub(crate) fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item=&CompletedCall> {
        self.calls.iter()
    }

    /// How many recorded calls does `matcher` accept?
    pub fn count_matching(&self, matcher: &CallMatcher) -> usize {
        self.calls.iter()
            .filter(|c| matcher.matches(c.call()))
            .count()
    }

    pub fn into_vec(self) -> Vec<CompletedCall> {
        self.calls
    }
}

/// Merge the histories of several fakes into one, ordered by sequence number.
pub(crate) fn merge<I>(histories: I) -> Vec<CompletedCall>
    where I: IntoIterator<Item=CallHistory>
{
    let mut calls = histories.into_iter()
        .flat_map(CallHistory::into_vec)
        .collect::<Vec<_>>();
    calls.sort_by_key(CompletedCall::sequence_number);
    calls
}
