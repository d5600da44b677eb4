//! The core value representation: a compact tagged union over all JSON
//! variants, with small-string optimization and arena-aware containers.
//!
//! `Value` is 32 bytes on 64-bit targets: one word for the discriminant
//! plus a 24-byte payload region shared by the SSO string, the array
//! header, and the boxed object pointer.

mod array;
mod object;
pub(crate) mod storage;
pub(crate) mod string;

use std::alloc::Layout;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::ptr::{self, NonNull};
use std::str::FromStr;

pub use array::Array;
pub use object::Object;

use crate::arena::{self, Arena};
use crate::convert::FromValue;
use crate::error::{Error, ErrorKind, Result};
use crate::options::{ParseOptions, SerializeOptions};
use crate::value::string::Str;

/// Discriminant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    Null,
    Bool,
    Integer,
    UInteger,
    Float,
    String,
    Array,
    Object,
}

impl JsonType {
    pub fn name(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Bool => "bool",
            JsonType::Integer => "integer",
            JsonType::UInteger => "uinteger",
            JsonType::Float => "float",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Heap- or arena-placed `Object`, so the object header itself follows the
/// same placement rule as its storage.
pub(crate) struct ObjectBox {
    ptr: NonNull<Object>,
    in_arena: bool,
}

// SAFETY: the pointee is exclusively owned; arena placement follows the
// scope contract documented on `ArenaScope::new`.
unsafe impl Send for ObjectBox {}
unsafe impl Sync for ObjectBox {}

impl ObjectBox {
    pub(crate) fn new(object: Object) -> ObjectBox {
        arena::with_active(|active| ObjectBox::with_arena(object, active))
    }

    pub(crate) fn with_arena(object: Object, active: Option<&Arena>) -> ObjectBox {
        match active {
            Some(arena) => {
                let ptr = arena.alloc_layout(Layout::new::<Object>()).cast::<Object>();
                // SAFETY: freshly allocated, properly aligned, uninitialized.
                unsafe { ptr.as_ptr().write(object) };
                ObjectBox {
                    ptr,
                    in_arena: true,
                }
            }
            None => ObjectBox {
                // SAFETY: `Box::into_raw` never returns null.
                ptr: unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(object))) },
                in_arena: false,
            },
        }
    }

    pub(crate) fn get(&self) -> &Object {
        // SAFETY: the pointee is alive for as long as this box.
        unsafe { self.ptr.as_ref() }
    }

    pub(crate) fn get_mut(&mut self) -> &mut Object {
        // SAFETY: exclusive access through `&mut self`.
        unsafe { self.ptr.as_mut() }
    }
}

impl Drop for ObjectBox {
    fn drop(&mut self) {
        // Destructors always run (entries may own heap memory); only the
        // heap placement frees the object slot itself.
        unsafe {
            if self.in_arena {
                ptr::drop_in_place(self.ptr.as_ptr());
            } else {
                drop(Box::from_raw(self.ptr.as_ptr()));
            }
        }
    }
}

impl Clone for ObjectBox {
    fn clone(&self) -> ObjectBox {
        ObjectBox::new(self.get().clone())
    }
}

#[derive(Clone)]
pub(crate) enum Repr {
    Null,
    Bool(bool),
    Integer(i64),
    UInteger(u64),
    Float(f64),
    String(Str),
    Array(Array),
    Object(ObjectBox),
}

/// A parsed or constructed JSON value.
///
/// Scalars are stored inline, strings of up to 15 bytes are inline (SSO),
/// and longer payloads live on the heap or in the active arena. Accessors
/// come in a fallible form (`as_*`, `at`, `get::<T>`) and a panicking
/// indexing form (`value["key"]`, `value[0]`).
#[derive(Clone, Default)]
pub struct Value {
    pub(crate) repr: Repr,
}

impl Default for Repr {
    fn default() -> Self {
        Repr::Null
    }
}

const _: () = assert!(std::mem::size_of::<Value>() == 32);

impl Value {
    /// The null value.
    pub const fn null() -> Value {
        Value { repr: Repr::Null }
    }

    /// An empty array, placed per the current arena context.
    pub fn new_array() -> Value {
        Value {
            repr: Repr::Array(Array::new()),
        }
    }

    /// An empty object, placed per the current arena context.
    pub fn new_object() -> Value {
        Value {
            repr: Repr::Object(ObjectBox::new(Object::new())),
        }
    }

    pub(crate) fn from_str_value(s: Str) -> Value {
        Value {
            repr: Repr::String(s),
        }
    }

    pub(crate) fn from_array_value(array: Array) -> Value {
        Value {
            repr: Repr::Array(array),
        }
    }

    pub(crate) fn from_object_in(object: Object, active: Option<&Arena>) -> Value {
        Value {
            repr: Repr::Object(ObjectBox::with_arena(object, active)),
        }
    }

    // ─── Type inspection ───

    pub fn json_type(&self) -> JsonType {
        match &self.repr {
            Repr::Null => JsonType::Null,
            Repr::Bool(_) => JsonType::Bool,
            Repr::Integer(_) => JsonType::Integer,
            Repr::UInteger(_) => JsonType::UInteger,
            Repr::Float(_) => JsonType::Float,
            Repr::String(_) => JsonType::String,
            Repr::Array(_) => JsonType::Array,
            Repr::Object(_) => JsonType::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.repr, Repr::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.repr, Repr::Bool(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.repr, Repr::Integer(_))
    }

    pub fn is_uinteger(&self) -> bool {
        matches!(self.repr, Repr::UInteger(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self.repr, Repr::Float(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self.repr,
            Repr::Integer(_) | Repr::UInteger(_) | Repr::Float(_)
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self.repr, Repr::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.repr, Repr::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.repr, Repr::Object(_))
    }

    // ─── Typed access ───

    pub fn as_bool(&self) -> Result<bool> {
        match self.repr {
            Repr::Bool(b) => Ok(b),
            _ => Err(self.type_error("bool")),
        }
    }

    /// Signed value; succeeds for `UInteger` within signed range.
    pub fn as_integer(&self) -> Result<i64> {
        match self.repr {
            Repr::Integer(i) => Ok(i),
            Repr::UInteger(u) => i64::try_from(u).map_err(|_| {
                Error::new(
                    ErrorKind::IntegerOverflow,
                    format!("uinteger {u} exceeds signed 64-bit range"),
                )
            }),
            _ => Err(self.type_error("integer")),
        }
    }

    /// Unsigned value; succeeds for non-negative `Integer`.
    pub fn as_uinteger(&self) -> Result<u64> {
        match self.repr {
            Repr::UInteger(u) => Ok(u),
            Repr::Integer(i) => u64::try_from(i).map_err(|_| {
                Error::new(
                    ErrorKind::IntegerOverflow,
                    format!("integer {i} is negative"),
                )
            }),
            _ => Err(self.type_error("uinteger")),
        }
    }

    /// Float value; integers widen (lossy beyond 2^53).
    pub fn as_float(&self) -> Result<f64> {
        match self.repr {
            Repr::Float(f) => Ok(f),
            Repr::Integer(i) => Ok(i as f64),
            Repr::UInteger(u) => Ok(u as f64),
            _ => Err(self.type_error("number")),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match &self.repr {
            Repr::String(s) => Ok(s.as_str()),
            _ => Err(self.type_error("string")),
        }
    }

    pub fn as_array(&self) -> Result<&Array> {
        match &self.repr {
            Repr::Array(a) => Ok(a),
            _ => Err(self.type_error("array")),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Array> {
        if !matches!(self.repr, Repr::Array(_)) {
            return Err(self.type_error("array"));
        }
        match &mut self.repr {
            Repr::Array(a) => Ok(a),
            _ => unreachable!(),
        }
    }

    pub fn as_object(&self) -> Result<&Object> {
        match &self.repr {
            Repr::Object(o) => Ok(o.get()),
            _ => Err(self.type_error("object")),
        }
    }

    pub fn as_object_mut(&mut self) -> Result<&mut Object> {
        if !matches!(self.repr, Repr::Object(_)) {
            return Err(self.type_error("object"));
        }
        match &mut self.repr {
            Repr::Object(o) => Ok(o.get_mut()),
            _ => unreachable!(),
        }
    }

    /// Typed conversion for primitives and strings.
    pub fn get<T: FromValue>(&self) -> Result<T> {
        T::from_value(self)
    }

    /// Typed conversion that never fails: any mismatch yields `default`.
    pub fn get_or<T: FromValue>(&self, default: T) -> T {
        T::from_value(self).unwrap_or(default)
    }

    // ─── Lookup ───

    /// Object lookup without creating entries; `None` for non-objects.
    pub fn find(&self, key: &str) -> Option<&Value> {
        match &self.repr {
            Repr::Object(o) => o.get().get(key),
            _ => None,
        }
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut Value> {
        match &mut self.repr {
            Repr::Object(o) => o.get_mut().get_mut(key),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Object member access; fails with `KeyNotFound` on a miss.
    pub fn at(&self, key: &str) -> Result<&Value> {
        let object = self.as_object()?;
        object.get(key).ok_or_else(|| {
            Error::new(ErrorKind::KeyNotFound, format!("key not found: \"{key}\""))
        })
    }

    /// Array element access; fails with `OutOfRange` on a bad index.
    pub fn at_index(&self, index: usize) -> Result<&Value> {
        let array = self.as_array()?;
        let len = array.len();
        array.get(index).ok_or_else(|| {
            Error::new(
                ErrorKind::OutOfRange,
                format!("array index {index} out of range (len {len})"),
            )
        })
    }

    // ─── Size ───

    /// Element count for arrays, entry count for objects, 0 otherwise.
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Array(a) => a.len(),
            Repr::Object(o) => o.get().len(),
            _ => 0,
        }
    }

    /// True for null, an empty array, or an empty object.
    pub fn is_empty(&self) -> bool {
        match &self.repr {
            Repr::Null => true,
            Repr::Array(a) => a.is_empty(),
            Repr::Object(o) => o.get().is_empty(),
            _ => false,
        }
    }

    // ─── Mutation ───

    /// Append to an array.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        self.as_array_mut()?.push(value);
        Ok(())
    }

    /// Insert into an object, overwriting an existing entry.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<Value>) -> Result<Option<Value>> {
        Ok(self.as_object_mut()?.insert(key, value))
    }

    /// Remove a key from an object; returns whether an entry was removed.
    pub fn erase(&mut self, key: &str) -> Result<bool> {
        Ok(self.as_object_mut()?.remove(key).is_some())
    }

    /// Empty out an array or object; no-op for other variants.
    pub fn clear(&mut self) {
        match &mut self.repr {
            Repr::Array(a) => a.clear(),
            Repr::Object(o) => o.get_mut().clear(),
            _ => {}
        }
    }

    /// Move the value out, leaving null behind.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    // ─── Serialization ───

    /// Serialize with explicit options.
    pub fn dump(&self, options: &SerializeOptions) -> String {
        crate::ser::value_to_string(self, options)
    }

    fn type_error(&self, expected: &str) -> Error {
        Error::new(
            ErrorKind::TypeMismatch,
            format!("expected {expected}, got {}", self.json_type()),
        )
    }
}

impl PartialEq for Value {
    /// Structural equality. Numbers compare across variants: integer and
    /// uinteger compare exactly, mixed float comparisons go through `f64`
    /// and are lossy beyond 2^53.
    fn eq(&self, other: &Value) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Null, Repr::Null) => true,
            (Repr::Bool(a), Repr::Bool(b)) => a == b,
            (Repr::Integer(a), Repr::Integer(b)) => a == b,
            (Repr::UInteger(a), Repr::UInteger(b)) => a == b,
            (Repr::Float(a), Repr::Float(b)) => a == b,
            (Repr::Integer(i), Repr::UInteger(u)) | (Repr::UInteger(u), Repr::Integer(i)) => {
                *i >= 0 && *i as u64 == *u
            }
            (Repr::Integer(i), Repr::Float(f)) | (Repr::Float(f), Repr::Integer(i)) => {
                *i as f64 == *f
            }
            (Repr::UInteger(u), Repr::Float(f)) | (Repr::Float(f), Repr::UInteger(u)) => {
                *u as f64 == *f
            }
            (Repr::String(a), Repr::String(b)) => a == b,
            (Repr::Array(a), Repr::Array(b)) => a == b,
            (Repr::Object(a), Repr::Object(b)) => a.get() == b.get(),
            _ => false,
        }
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str().map(|s| s == other).unwrap_or(false)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        match self.repr {
            Repr::Integer(i) => i == *other,
            Repr::UInteger(u) => *other >= 0 && u == *other as u64,
            _ => false,
        }
    }
}

impl PartialEq<u64> for Value {
    fn eq(&self, other: &u64) -> bool {
        match self.repr {
            Repr::UInteger(u) => u == *other,
            Repr::Integer(i) => i >= 0 && i as u64 == *other,
            _ => false,
        }
    }
}

impl PartialEq<f64> for Value {
    fn eq(&self, other: &f64) -> bool {
        matches!(self.repr, Repr::Float(f) if f == *other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        matches!(self.repr, Repr::Bool(b) if b == *other)
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// Panicking form of [`Value::at_index`].
    fn index(&self, index: usize) -> &Value {
        match self.at_index(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl IndexMut<usize> for Value {
    fn index_mut(&mut self, index: usize) -> &mut Value {
        let array = match self.as_array_mut() {
            Ok(array) => array,
            Err(err) => panic!("{err}"),
        };
        let len = array.len();
        match array.get_mut(index) {
            Some(value) => value,
            None => panic!("array index {index} out of range (len {len})"),
        }
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Panicking form of [`Value::at`].
    fn index(&self, key: &str) -> &Value {
        match self.at(key) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl IndexMut<&str> for Value {
    /// Auto-inserts a null entry on a missing key, like map indexing in the
    /// mutable direction.
    fn index_mut(&mut self, key: &str) -> &mut Value {
        let object = match self.as_object_mut() {
            Ok(object) => object,
            Err(err) => panic!("{err}"),
        };
        object.entry_or_null(key)
    }
}

impl fmt::Display for Value {
    /// Compact JSON text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump(&SerializeOptions::compact()))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Null => f.write_str("Null"),
            Repr::Bool(b) => write!(f, "Bool({b})"),
            Repr::Integer(i) => write!(f, "Integer({i})"),
            Repr::UInteger(u) => write!(f, "UInteger({u})"),
            Repr::Float(v) => write!(f, "Float({v})"),
            Repr::String(s) => write!(f, "String({s:?})"),
            Repr::Array(a) => fmt::Debug::fmt(a, f),
            Repr::Object(o) => fmt::Debug::fmt(o.get(), f),
        }
    }
}

impl FromStr for Value {
    type Err = Error;

    fn from_str(s: &str) -> Result<Value> {
        crate::parser::parse_slice(s.as_bytes(), &ParseOptions::strict())
    }
}
