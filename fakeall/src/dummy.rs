// vim: tw=80
//! Dummy values: what unconfigured calls return.

use std::{
    any::TypeId,
    collections::HashMap,
    fmt,
    marker::PhantomData,
    sync::Arc
};

use crate::{
    method::default_value,
    value::{ReturnValue, TypeInfo}
};

type Factory = Arc<dyn Fn() -> ReturnValue + Send + Sync>;

/// Per-fake factories for the values returned by unconfigured calls.
///
/// A registered factory takes precedence over the return type's `Default`
/// implementation, and is the only source of values for return types that
/// don't implement `Default`.
#[derive(Clone, Default)]
pub struct DummyRegistry {
    factories: HashMap<TypeId, (TypeInfo, Factory)>,
}

impl DummyRegistry {
    pub fn new() -> Self {
        DummyRegistry::default()
    }

    /// Produce values of type `T` with `f`.  Replaces any previous factory for
    /// `T`.
    pub fn register<T, F>(&mut self, f: F)
        where T: Send + 'static,
              F: Fn() -> T + Send + Sync + 'static
    {
        let info = TypeInfo::of::<T>();
        self.factories.insert(info.id(),
            (info, Arc::new(move || ReturnValue::new(f()))));
    }

    pub fn contains(&self, t: &TypeInfo) -> bool {
        self.factories.contains_key(&t.id())
    }

    /// A fresh dummy of type `t`, if a factory is registered for it.
    pub fn create(&self, t: &TypeInfo) -> Option<ReturnValue> {
        self.factories.get(&t.id()).map(|(_, f)| f())
    }
}

impl fmt::Debug for DummyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.factories.values().map(|(t, _)| t.name()))
            .finish()
    }
}

/// Finds the `Default` maker of a type, if it has one, without requiring
/// `T: Default`.
///
/// Used by generated code through method-resolution precedence: with both
/// [`ViaDefault`] and [`ViaNoDefault`] in scope,
/// `(&DefaultReturner::<T>::new()).default_maker()` resolves to `ViaDefault`
/// when `T: Default` and to `ViaNoDefault` otherwise.  That only works when
/// `T` is a concrete type.
pub struct DefaultReturner<T>(PhantomData<fn() -> T>);

impl<T> DefaultReturner<T> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        DefaultReturner(PhantomData)
    }
}

pub trait ViaDefault {
    fn default_maker(&self) -> Option<fn() -> ReturnValue>;
}

impl<T: Default + Send + 'static> ViaDefault for DefaultReturner<T> {
    fn default_maker(&self) -> Option<fn() -> ReturnValue> {
        Some(default_value::<T>)
    }
}

pub trait ViaNoDefault {
    fn default_maker(&self) -> Option<fn() -> ReturnValue>;
}

impl<T> ViaNoDefault for &DefaultReturner<T> {
    fn default_maker(&self) -> Option<fn() -> ReturnValue> {
        None
    }
}

#[cfg(test)]
mod t {
    use super::*;

    struct NoDefault;

    #[test]
    fn registry() {
        let mut r = DummyRegistry::new();
        let t = TypeInfo::of::<String>();
        assert!(r.create(&t).is_none());
        r.register(|| String::from("dummy"));
        assert!(r.contains(&t));
        let v = r.create(&t).unwrap();
        assert_eq!("dummy", v.downcast::<String>("f").unwrap());
    }

    #[test]
    fn default_returner() {
        let maker = (&DefaultReturner::<u32>::new()).default_maker();
        let v = maker.unwrap()();
        assert_eq!(0, v.downcast::<u32>("f").unwrap());
        let maker = (&DefaultReturner::<NoDefault>::new()).default_maker();
        assert!(maker.is_none());
    }
}
