// vim: tw=80
//! Errors raised by configuration, dispatch and assertions.

use std::{
    any::Any,
    error::Error as StdError,
    fmt,
    panic,
    sync::Arc
};

use thiserror::Error;

/// Shared `Result` alias for the crate.
pub type Result<T> = std::result::Result<T, FakeError>;

/// Everything that can go wrong while configuring, calling, or asserting on a
/// fake.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FakeError {
    #[error("The behavior for this call has already been defined: {rule}")]
    BehaviorAlreadyDefined { rule: String },

    #[error("{method} has {expected} parameters, but {actual} argument constraints were supplied")]
    ConstraintCount {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("The constraint on {parameter} of {method} accepts {actual}, but the parameter is {expected}")]
    ConstraintType {
        method: String,
        parameter: String,
        expected: String,
        actual: String,
    },

    #[error("{method} has {expected} parameters, but the call supplied {actual} arguments")]
    ArgumentCount {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("Argument {position} of {method} is not of type {expected}")]
    ArgumentType {
        method: String,
        position: usize,
        expected: String,
    },

    #[error("The faked method has the signature ({faked}), but {operation} was used with ({callback}).")]
    CallbackSignature {
        operation: &'static str,
        faked: String,
        callback: String,
    },

    #[error("The number of values for out and ref parameters specified does not match the number of out and ref parameters in the call {call}: expected {expected}, got {actual}.")]
    OutAndRefCount {
        call: String,
        expected: usize,
        actual: usize,
    },

    #[error("The value assigned to {parameter} in the call {call} is of type {actual}, but the parameter is {expected}")]
    OutAndRefType {
        call: String,
        parameter: String,
        expected: String,
        actual: String,
    },

    #[error("Call to unconfigured method of strict fake: {call}.")]
    UnconfiguredStrictCall { call: String },

    /// An assertion about the call history failed.  The payload is the full
    /// diagnostic text.
    #[error("{0}")]
    Expectation(String),

    #[error("The event {event} has the signature ({expected}), but the provided arguments have types ({actual}).")]
    EventSignature {
        event: String,
        expected: String,
        actual: String,
    },

    #[error("Can not create a default value of type {type_name} for {method}; configure a return value or register a dummy for it")]
    NoDummy { method: String, type_name: String },

    #[error("{method} produced a value of type {actual}, but the caller expected {expected}")]
    ReturnType {
        method: String,
        expected: String,
        actual: String,
    },

    #[error("There is no wrapped instance to forward {call} to")]
    NoWrappedInstance { call: String },

    #[error("{method} is not an event accessor")]
    NotAnEvent { method: String },
}

/// Broad classification of a [`FakeError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The fake was configured incorrectly.  Raised at the point of misuse.
    Configuration,
    /// A call count or ordering expectation was not met.
    Expectation,
    /// Raised from inside a faked call.
    Dispatch,
}

impl FakeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FakeError::BehaviorAlreadyDefined { .. }
            | FakeError::ConstraintCount { .. }
            | FakeError::ConstraintType { .. }
            | FakeError::CallbackSignature { .. }
            | FakeError::EventSignature { .. }
            | FakeError::OutAndRefCount { .. }
            | FakeError::OutAndRefType { .. } => ErrorKind::Configuration,
            FakeError::Expectation(_) => ErrorKind::Expectation,
            FakeError::ArgumentCount { .. }
            | FakeError::ArgumentType { .. }
            | FakeError::UnconfiguredStrictCall { .. }
            | FakeError::NoDummy { .. }
            | FakeError::ReturnType { .. }
            | FakeError::NoWrappedInstance { .. }
            | FakeError::NotAnEvent { .. } => ErrorKind::Dispatch,
        }
    }
}

/// Whatever a faked call "throws" instead of returning.
pub enum Thrown {
    /// An error configured with `throws` or `throws_lazily`.
    Error(Arc<dyn StdError + Send + Sync>),
    /// An error raised by the fake itself, like a strict fake rejecting an
    /// unconfigured call.
    Fake(FakeError),
    /// User code running inside the call panicked.  The payload is kept so the
    /// panic can be resumed unmodified.
    Panic(Box<dyn Any + Send>),
}

impl Thrown {
    pub fn error<E>(e: E) -> Self
        where E: StdError + Send + Sync + 'static
    {
        Thrown::Error(Arc::new(e))
    }

    /// The `FakeError`, if the fake itself raised this.
    pub fn as_fake_error(&self) -> Option<&FakeError> {
        match self {
            Thrown::Fake(e) => Some(e),
            _ => None
        }
    }

    /// Human readable description, used in logs.
    pub fn message(&self) -> String {
        match self {
            Thrown::Error(e) => e.to_string(),
            Thrown::Fake(e) => e.to_string(),
            Thrown::Panic(payload) => panic_message(payload.as_ref())
        }
    }

    /// Propagate this out of the faked method.
    ///
    /// Captured panics are resumed unmodified; errors become a panic whose
    /// message is the error's `Display` output.
    pub fn rethrow(self) -> ! {
        match self {
            Thrown::Panic(payload) => panic::resume_unwind(payload),
            Thrown::Error(e) => panic!("{}", e),
            Thrown::Fake(e) => panic!("{}", e),
        }
    }
}

impl fmt::Debug for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thrown::Error(e) => f.debug_tuple("Error").field(&e.to_string())
                .finish(),
            Thrown::Fake(e) => f.debug_tuple("Fake").field(e).finish(),
            Thrown::Panic(payload) => f.debug_tuple("Panic")
                .field(&panic_message(payload.as_ref()))
                .finish(),
        }
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl From<FakeError> for Thrown {
    fn from(e: FakeError) -> Self {
        Thrown::Fake(e)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct OnFire;

    #[test]
    fn kinds() {
        let e = FakeError::BehaviorAlreadyDefined { rule: "r".into() };
        assert_eq!(ErrorKind::Configuration, e.kind());
        let e = FakeError::Expectation("x".into());
        assert_eq!(ErrorKind::Expectation, e.kind());
        let e = FakeError::UnconfiguredStrictCall { call: "IFoo.Bar()".into() };
        assert_eq!(ErrorKind::Dispatch, e.kind());
    }

    #[test]
    fn message_of_panic_payload() {
        let t = Thrown::Panic(Box::new("boom"));
        assert_eq!("boom", t.message());
        let t = Thrown::Panic(Box::new(String::from("bang")));
        assert_eq!("bang", t.message());
    }

    #[test]
    #[should_panic(expected = "disk on fire")]
    fn rethrow_error() {
        Thrown::error(OnFire).rethrow();
    }

    #[test]
    #[should_panic(expected = "Call to unconfigured method of strict fake: IFoo.Bar().")]
    fn rethrow_fake_error() {
        Thrown::from(FakeError::UnconfiguredStrictCall {
            call: "IFoo.Bar()".to_owned()
        }).rethrow();
    }
}
