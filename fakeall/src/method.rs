// vim: tw=80
//! Method identity.
//!
//! A [`Method`] describes a faked member structurally, so that rules
//! configured for a method can be compared against intercepted calls without
//! any runtime reflection.

use std::fmt;

use crate::{
    behavior::ArgumentTuple,
    call::ParamsArray,
    event::EventHandler,
    value::{ReturnValue, TypeInfo, short_type_name}
};

/// How an argument is passed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ParamKind {
    /// Passed by value, or by shared reference
    In,
    /// A by-reference slot whose value is only written by the call
    Out,
    /// A by-reference slot that is both read and written by the call
    Ref,
    /// A variadic argument list.  Recorded as a
    /// [`ParamsArray`](crate::ParamsArray).
    Params,
}

impl ParamKind {
    /// Can the call write a value back to this position?
    pub fn is_by_ref(self) -> bool {
        matches!(self, ParamKind::Out | ParamKind::Ref)
    }
}

/// A formal parameter of a faked method.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Parameter {
    name: Option<&'static str>,
    type_name: String,
    /// `None` when the type is only known by name, eg a generic parameter
    type_info: Option<TypeInfo>,
    kind: ParamKind,
}

impl Parameter {
    pub fn new(name: Option<&'static str>, type_name: impl Into<String>,
               kind: ParamKind) -> Self
    {
        Parameter { name, type_name: type_name.into(), type_info: None, kind }
    }

    /// A parameter whose values are of type `T`.
    pub fn of<T: ?Sized + 'static>(name: Option<&'static str>,
                                   kind: ParamKind) -> Self
    {
        Parameter {
            name,
            type_name: short_type_name(std::any::type_name::<T>()),
            type_info: Some(TypeInfo::of::<T>()),
            kind
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Type of the values stored for this parameter, if known
    pub fn type_info(&self) -> Option<TypeInfo> {
        self.type_info
    }
}

/// Whether a method's result is produced synchronously.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Asyncness {
    Sync,
    /// The member returns a future of the value type.
    Async,
}

/// The return type of a faked method.
#[derive(Clone, Copy)]
pub struct ReturnType {
    type_info: TypeInfo,
    asyncness: Asyncness,
    /// Produces the default value returned by unconfigured calls
    default: Option<fn() -> ReturnValue>,
}

pub(crate) fn default_value<T: Default + Send + 'static>() -> ReturnValue {
    ReturnValue::new(T::default())
}

impl ReturnType {
    /// The return type of methods that return nothing.
    pub fn unit() -> Self {
        ReturnType::of::<()>()
    }

    /// A return type whose unconfigured calls return `T::default()`.
    pub fn of<T: Default + Send + 'static>() -> Self {
        ReturnType::new::<T>(Some(default_value::<T>))
    }

    /// A return type with an explicit default maker, or none at all.
    ///
    /// Without a maker, unconfigured calls must find a dummy in the fake's
    /// [`DummyRegistry`](crate::DummyRegistry).
    pub fn new<T: 'static>(default: Option<fn() -> ReturnValue>) -> Self {
        ReturnType {
            type_info: TypeInfo::of::<T>(),
            asyncness: Asyncness::Sync,
            default
        }
    }

    /// Mark the member as returning a future of this type.
    pub fn asynchronous(mut self) -> Self {
        self.asyncness = Asyncness::Async;
        self
    }

    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    pub fn is_async(&self) -> bool {
        self.asyncness == Asyncness::Async
    }

    pub(crate) fn default_maker(&self) -> Option<fn() -> ReturnValue> {
        self.default
    }
}

impl fmt::Debug for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReturnType")
            .field("type", &self.type_info.name())
            .field("asyncness", &self.asyncness)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

impl PartialEq for ReturnType {
    fn eq(&self, other: &Self) -> bool {
        self.type_info == other.type_info && self.asyncness == other.asyncness
    }
}

/// What kind of member a method is.
#[derive(Clone, Debug, PartialEq)]
pub enum MethodKind {
    Ordinary,
    /// Subscribes a handler to the named event
    EventAdd { event: &'static str, signature: Vec<TypeInfo> },
    /// Unsubscribes a handler from the named event
    EventRemove { event: &'static str, signature: Vec<TypeInfo> },
}

/// Structural identity of a faked method.
///
/// Two methods have the same *definition* when their declaring type, name,
/// parameter list and generic parameters agree.  A method whose generic
/// parameters are not bound to arguments is *open*; a rule configured for an
/// open method matches every closed instantiation of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Method {
    declaring_type: &'static str,
    name: &'static str,
    parameters: Vec<Parameter>,
    generic_parameters: Vec<&'static str>,
    generic_arguments: Vec<TypeInfo>,
    returns: ReturnType,
    kind: MethodKind,
}

impl Method {
    /// A method taking no arguments and returning nothing
    pub fn new(declaring_type: &'static str, name: &'static str) -> Self {
        Method {
            declaring_type,
            name,
            parameters: Vec::new(),
            generic_parameters: Vec::new(),
            generic_arguments: Vec::new(),
            returns: ReturnType::unit(),
            kind: MethodKind::Ordinary,
        }
    }

    fn param_of<T: ?Sized + 'static>(mut self, name: &'static str,
                                      kind: ParamKind) -> Self
    {
        self.parameters.push(Parameter::of::<T>(Some(name), kind));
        self
    }

    /// Append a by-value parameter.
    pub fn with_param<T: ?Sized + 'static>(self, name: &'static str) -> Self {
        self.param_of::<T>(name, ParamKind::In)
    }

    /// Append a ref parameter: its input value is recorded, and the call may
    /// write a new value back.
    pub fn with_ref_param<T: 'static>(self, name: &'static str) -> Self {
        self.param_of::<T>(name, ParamKind::Ref)
    }

    /// Append an out parameter.
    pub fn with_out_param<T: 'static>(self, name: &'static str) -> Self {
        self.param_of::<T>(name, ParamKind::Out)
    }

    /// Append a variadic parameter whose elements are of type `T`.
    pub fn with_params_array<T: 'static>(mut self, name: &'static str) -> Self
    {
        let type_name = format!("params {}",
            short_type_name(std::any::type_name::<T>()));
        self.parameters.push(Parameter {
            name: Some(name),
            type_name,
            type_info: Some(TypeInfo::of::<ParamsArray>()),
            kind: ParamKind::Params
        });
        self
    }

    /// Append a parameter described only by its type's name, eg a generic
    /// parameter `T`.  `name` may be `None` when the parameter's name is
    /// unknown.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Declare generic parameters, eg `&["T"]`.
    pub fn with_generic_parameters(mut self, names: &[&'static str]) -> Self
    {
        self.generic_parameters = names.to_vec();
        self
    }

    /// Bind the method's generic parameters to concrete types.
    pub fn with_generic_arguments(mut self, args: Vec<TypeInfo>) -> Self {
        self.generic_arguments = args;
        self
    }

    /// Set the return type to `T`, defaulting to `T::default()`.
    pub fn returning<T: Default + Send + 'static>(self) -> Self {
        self.with_return_type(ReturnType::of::<T>())
    }

    /// Set the return type to a future of `T`, defaulting to a completed
    /// future of `T::default()`.
    pub fn returning_async<T: Default + Send + 'static>(self) -> Self {
        self.with_return_type(ReturnType::of::<T>().asynchronous())
    }

    pub fn with_return_type(mut self, returns: ReturnType) -> Self {
        self.returns = returns;
        self
    }

    fn accessor(declaring_type: &'static str, name: &'static str) -> Self
    {
        Method::new(declaring_type, name)
            .with_param::<EventHandler>("value")
    }

    /// The accessor that subscribes handlers to `event`.  `A` is the tuple of
    /// the event's argument types.
    pub fn event_add<A: ArgumentTuple>(declaring_type: &'static str,
                                       event: &'static str) -> Self
    {
        let mut m = Method::accessor(declaring_type, event);
        m.kind = MethodKind::EventAdd { event, signature: A::signature() };
        m
    }

    /// The accessor that unsubscribes handlers from `event`.
    pub fn event_remove<A: ArgumentTuple>(declaring_type: &'static str,
                                          event: &'static str) -> Self
    {
        let mut m = Method::accessor(declaring_type, event);
        m.kind = MethodKind::EventRemove { event, signature: A::signature() };
        m
    }

    pub fn declaring_type(&self) -> &'static str {
        self.declaring_type
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn generic_arguments(&self) -> &[TypeInfo] {
        &self.generic_arguments
    }

    pub fn return_type(&self) -> &ReturnType {
        &self.returns
    }

    pub fn kind(&self) -> &MethodKind {
        &self.kind
    }

    /// Is this an open generic method, one whose generic parameters have not
    /// been bound?
    pub fn is_open_generic(&self) -> bool {
        !self.generic_parameters.is_empty() && self.generic_arguments.is_empty()
    }

    /// Positions of the out and ref parameters, in order.
    pub fn by_ref_positions(&self) -> Vec<usize> {
        self.parameters.iter()
            .enumerate()
            .filter(|(_, p)| p.kind().is_by_ref())
            .map(|(i, _)| i)
            .collect()
    }

    /// Do `self` and `other` describe the same method, ignoring generic
    /// arguments?
    pub fn same_definition(&self, other: &Method) -> bool {
        self.declaring_type == other.declaring_type
            && self.name == other.name
            && self.parameters == other.parameters
            && self.generic_parameters == other.generic_parameters
    }

    /// Does a rule configured for `self` apply to a call of `other`?
    pub fn matches(&self, other: &Method) -> bool {
        self.same_definition(other)
            && (self.generic_arguments.is_empty()
                || self.generic_arguments == other.generic_arguments)
    }

    /// The comma separated parameter types, eg `i32, String`
    pub fn signature(&self) -> String {
        self.parameters.iter()
            .map(Parameter::type_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Renders as `Type.Name<T1, T2>`, without the parameter list.
impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)?;
        if !self.generic_arguments.is_empty() {
            write!(f, "<{}>",
                crate::value::type_list(self.generic_arguments.iter()))?;
        } else if !self.generic_parameters.is_empty() {
            write!(f, "<{}>", self.generic_parameters.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod t {
    use super::*;

    fn bar() -> Method {
        Method::new("IFoo", "Bar")
            .with_param::<i32>("x")
            .with_ref_param::<String>("s")
            .returning::<u32>()
    }

    #[test]
    fn by_ref_positions() {
        let m = Method::new("IFoo", "Baz")
            .with_param::<i32>("a")
            .with_out_param::<String>("b")
            .with_param::<i32>("c")
            .with_ref_param::<u8>("d");
        assert_eq!(vec![1, 3], m.by_ref_positions());
    }

    #[test]
    fn parameter_types() {
        let m = bar().with_params_array::<u8>("rest");
        let types = m.parameters().iter()
            .map(Parameter::type_info)
            .collect::<Vec<_>>();
        assert_eq!(vec![Some(TypeInfo::of::<i32>()),
                        Some(TypeInfo::of::<String>()),
                        Some(TypeInfo::of::<ParamsArray>())], types);
        let generic = Parameter::new(Some("t"), "T", ParamKind::In);
        assert_eq!(None, generic.type_info());
    }

    #[test]
    fn same_definition() {
        assert!(bar().same_definition(&bar()));
        let other = Method::new("IFoo", "Bar").with_param::<i32>("x");
        assert!(!bar().same_definition(&other));
    }

    #[test]
    fn open_generic_matches_any_closure() {
        let open = Method::new("IFoo", "Get")
            .with_generic_parameters(&["T"])
            .with_parameter(Parameter::new(Some("t"), "T", ParamKind::In));
        let closed_i32 = open.clone()
            .with_generic_arguments(vec![TypeInfo::of::<i32>()]);
        let closed_str = open.clone()
            .with_generic_arguments(vec![TypeInfo::of::<String>()]);
        assert!(open.is_open_generic());
        assert!(open.matches(&closed_i32));
        assert!(open.matches(&closed_str));
        assert!(closed_i32.matches(&closed_i32));
        assert!(!closed_i32.matches(&closed_str));
    }

    #[test]
    fn display() {
        assert_eq!("IFoo.Bar", bar().to_string());
        let m = Method::new("IFoo", "Get")
            .with_generic_parameters(&["T", "U"])
            .with_generic_arguments(vec![TypeInfo::of::<i32>(),
                                         TypeInfo::of::<String>()]);
        assert_eq!("IFoo.Get<i32, String>", m.to_string());
    }

    #[test]
    fn signature() {
        assert_eq!("i32, String", bar().signature());
    }
}
