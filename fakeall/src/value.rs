// vim: tw=80
//! Type-erased argument and return values.

use std::{
    any::{self, TypeId},
    fmt,
    hash::{Hash, Hasher}
};

use downcast::{downcast, Any};

use crate::error::FakeError;

/// A value that can be passed to a faked method.
///
/// Automatically implemented for every `'static` type that is `Clone`,
/// `Debug`, `Send` and `Sync`.  The `Debug` output is what appears in
/// diagnostics.
pub trait ArgValue: Any + fmt::Debug + Send + Sync {
    /// Clone this value into a new box.
    fn clone_value(&self) -> Box<dyn ArgValue>;

    /// Describe the concrete type of this value.
    fn type_info(&self) -> TypeInfo;
}
downcast!(dyn ArgValue);

impl<T> ArgValue for T
    where T: Clone + fmt::Debug + Send + Sync + 'static
{
    fn clone_value(&self) -> Box<dyn ArgValue> {
        Box::new(self.clone())
    }

    fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }
}

/// Box a value for storage in a [`Call`](crate::Call).
pub fn arg_value<T>(t: T) -> Box<dyn ArgValue>
    where T: Clone + fmt::Debug + Send + Sync + 'static
{
    Box::new(t)
}

/// Runtime identity of a type, plus its name for diagnostics.
#[derive(Clone, Copy, Debug)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeInfo {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>()
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified name, as reported by `std::any::type_name`
    pub fn full_name(&self) -> &'static str {
        self.name
    }

    /// Name with every module path stripped, eg `Option<String>`
    pub fn name(&self) -> String {
        short_type_name(self.name)
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Strip module paths from every path in a type name.
///
/// `core::option::Option<alloc::string::String>` becomes `Option<String>`.
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    // Start, within `out`, of the path currently being written
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
        } else if c.is_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push(c);
            segment_start = out.len();
        }
    }
    out
}

/// Render a list of types as `i32, String`
pub(crate) fn type_list<'a, I>(types: I) -> String
    where I: IntoIterator<Item=&'a TypeInfo>
{
    types.into_iter()
        .map(TypeInfo::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The value produced by a faked call.
///
/// Unlike arguments, return values need not be `Clone` or `Debug`.
pub struct ReturnValue {
    value: Box<dyn any::Any + Send>,
    type_info: TypeInfo,
}

impl ReturnValue {
    pub fn new<T: Send + 'static>(t: T) -> Self {
        ReturnValue {
            value: Box::new(t),
            type_info: TypeInfo::of::<T>()
        }
    }

    /// The value returned by methods that return nothing.
    pub fn unit() -> Self {
        ReturnValue::new(())
    }

    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_info.id() == TypeId::of::<T>()
    }

    /// Recover the concrete value.
    ///
    /// `method` is only used to describe a type mismatch.
    pub fn downcast<T: 'static>(self, method: &str)
        -> std::result::Result<T, FakeError>
    {
        let actual = self.type_info;
        self.value.downcast::<T>()
            .map(|b| *b)
            .map_err(|_| FakeError::ReturnType {
                method: method.to_owned(),
                expected: TypeInfo::of::<T>().name(),
                actual: actual.name()
            })
    }
}

impl fmt::Debug for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReturnValue")
            .field("type", &self.type_info.name())
            .finish_non_exhaustive()
    }
}
