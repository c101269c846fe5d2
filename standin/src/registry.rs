// vim: tw=80
use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError}
};

use crate::Mock;

type Key = (usize, TypeId);

/// Maps stand-in objects back to the mocks that drive them.
///
/// Keyed by the stand-in's address and type, so an entry is only meaningful
/// while the stand-in stays where it was registered.  A struct and its first
/// field share an address, but not a type.  Create one per test run, or call
/// [`clear`](MockRegistry::clear) when tearing down.
///
/// # Examples
/// ```
/// # use standin::*;
/// # use std::sync::Arc;
/// struct Stub(u32);
/// let registry = MockRegistry::new();
/// let stub = Stub(1);
/// let mock = Arc::new(Mock::loose("Stub"));
/// registry.register(&stub, mock.clone());
/// assert!(Arc::ptr_eq(&mock, &registry.lookup(&stub).unwrap()));
/// ```
#[derive(Debug, Default)]
pub struct MockRegistry {
    mocks: Mutex<HashMap<Key, Arc<Mock>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn key<S: ?Sized + 'static>(stub: &S) -> Key {
        (stub as *const S as *const () as usize, TypeId::of::<S>())
    }

    fn mocks(&self) -> MutexGuard<'_, HashMap<Key, Arc<Mock>>> {
        self.mocks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Associate `stub` with `mock`, replacing any previous association.
    pub fn register<S: ?Sized + 'static>(&self, stub: &S, mock: Arc<Mock>) {
        self.mocks().insert(Self::key(stub), mock);
    }

    pub fn lookup<S: ?Sized + 'static>(&self, stub: &S) -> Option<Arc<Mock>> {
        self.mocks().get(&Self::key(stub)).cloned()
    }

    /// Forget every association.
    pub fn clear(&self) {
        self.mocks().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.mocks().is_empty()
    }

    pub fn len(&self) -> usize {
        self.mocks().len()
    }
}
