//! Conversions between Rust types and [`Value`].
//!
//! `From` impls cover primitives, strings, sequences, maps, and `Option`;
//! [`FromValue`] powers the typed `Value::get::<T>()` / `get_or` accessors.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::value::string::Str;
use crate::value::{Array, Object, ObjectBox, Repr, Value};

impl From<()> for Value {
    fn from(_: ()) -> Value {
        Value::null()
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value { repr: Repr::Bool(v) }
    }
}

macro_rules! from_signed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Value {
                    Value { repr: Repr::Integer(i64::from(v)) }
                }
            }
        )*
    };
}

from_signed!(i8, i16, i32, i64, u8, u16, u32);

impl From<isize> for Value {
    fn from(v: isize) -> Value {
        Value {
            repr: Repr::Integer(v as i64),
        }
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Value {
        Value {
            repr: Repr::UInteger(v),
        }
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Value {
        Value {
            repr: Repr::UInteger(v as u64),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Value {
        Value {
            repr: Repr::Float(f64::from(v)),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value { repr: Repr::Float(v) }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::from_str_value(Str::new(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::from_str_value(Str::from_string(v))
    }
}

impl From<Cow<'_, str>> for Value {
    fn from(v: Cow<'_, str>) -> Value {
        match v {
            Cow::Borrowed(s) => Value::from(s),
            Cow::Owned(s) => Value::from(s),
        }
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Value {
        Value::from_array_value(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Value {
        Value {
            repr: Repr::Object(ObjectBox::new(v)),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Value {
        match v {
            Some(inner) => inner.into(),
            None => Value::null(),
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Value {
        v.into_iter().collect::<Array>().into()
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(v: &[T]) -> Value {
        v.iter().cloned().collect::<Array>().into()
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Value {
        v.into_iter().collect::<Array>().into()
    }
}

impl<K: AsRef<str>, V: Into<Value>> From<HashMap<K, V>> for Value {
    fn from(v: HashMap<K, V>) -> Value {
        v.into_iter().collect::<Object>().into()
    }
}

impl<K: AsRef<str>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(v: BTreeMap<K, V>) -> Value {
        v.into_iter().collect::<Object>().into()
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Value {
        iter.into_iter().collect::<Array>().into()
    }
}

/// Types extractable from a [`Value`] via `get::<T>()`.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<bool> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<i64> {
        value.as_integer()
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> Result<u64> {
        value.as_uinteger()
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<f64> {
        value.as_float()
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<f32> {
        value.as_float().map(|v| v as f32)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<String> {
        value.as_str().map(str::to_owned)
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Value> {
        Ok(value.clone())
    }
}
