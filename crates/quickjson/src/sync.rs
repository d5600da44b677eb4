//! Shared/exclusive facade over a value for cross-thread use.
//!
//! Many concurrent readers or one writer, backed by `parking_lot::RwLock`.
//! Good throughput for read-mostly configuration and state documents.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Result;
use crate::options::SerializeOptions;
use crate::value::{JsonType, Value};

/// Thread-safe wrapper around a [`Value`].
///
/// ```
/// use quickjson::SharedValue;
///
/// let shared = SharedValue::new(quickjson::parse(r#"{"count":0}"#).unwrap());
/// shared.write(|v| {
///     v.insert("count", 1i64).unwrap();
/// });
/// let count = shared.read(|v| v["count"].as_integer());
/// assert_eq!(count.unwrap(), 1);
/// ```
#[derive(Default)]
pub struct SharedValue {
    inner: RwLock<Value>,
}

impl SharedValue {
    pub fn new(value: impl Into<Value>) -> SharedValue {
        SharedValue {
            inner: RwLock::new(value.into()),
        }
    }

    // ─── Read access (shared lock) ───

    /// Run a read operation under the shared lock.
    pub fn read<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.inner.read())
    }

    /// Copy of the value taken under the shared lock.
    pub fn snapshot(&self) -> Value {
        self.inner.read().clone()
    }

    /// Serialized form taken under the shared lock.
    pub fn dump(&self, options: &SerializeOptions) -> String {
        self.inner.read().dump(options)
    }

    pub fn json_type(&self) -> JsonType {
        self.inner.read().json_type()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// RAII read guard for multi-step read sequences.
    pub fn read_guard(&self) -> RwLockReadGuard<'_, Value> {
        self.inner.read()
    }

    // ─── Write access (exclusive lock) ───

    /// Run a write operation under the exclusive lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Replace the entire value.
    pub fn assign(&self, value: impl Into<Value>) {
        *self.inner.write() = value.into();
    }

    /// Atomic read-modify-write: the closure receives the current value by
    /// move and its result becomes the new value.
    pub fn update(&self, f: impl FnOnce(Value) -> Value) {
        let mut guard = self.inner.write();
        let current = guard.take();
        *guard = f(current);
    }

    /// Atomic object insert.
    pub fn insert(&self, key: &str, value: impl Into<Value>) -> Result<Option<Value>> {
        self.inner.write().insert(key, value)
    }

    /// Atomic array append.
    pub fn push(&self, value: impl Into<Value>) -> Result<()> {
        self.inner.write().push(value)
    }

    /// Atomic object key removal.
    pub fn erase(&self, key: &str) -> Result<bool> {
        self.inner.write().erase(key)
    }

    /// RAII write guard for multi-step mutation sequences.
    pub fn write_guard(&self) -> RwLockWriteGuard<'_, Value> {
        self.inner.write()
    }

    /// Consume the wrapper, returning the value.
    pub fn into_inner(self) -> Value {
        self.inner.into_inner()
    }
}

impl From<Value> for SharedValue {
    fn from(value: Value) -> SharedValue {
        SharedValue::new(value)
    }
}

impl std::fmt::Debug for SharedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedValue").field(&*self.inner.read()).finish()
    }
}
