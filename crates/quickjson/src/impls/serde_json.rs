//! serde support: `Serialize`/`Deserialize` for [`Value`] and lossless
//! conversions to and from `serde_json::Value`.
//!
//! Available with the `serde` feature.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::{Array, Object, Repr, Value};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.repr {
            Repr::Null => serializer.serialize_unit(),
            Repr::Bool(b) => serializer.serialize_bool(*b),
            Repr::Integer(i) => serializer.serialize_i64(*i),
            Repr::UInteger(u) => serializer.serialize_u64(*u),
            Repr::Float(f) => serializer.serialize_f64(*f),
            Repr::String(s) => serializer.serialize_str(s.as_str()),
            Repr::Array(array) => {
                let mut seq = serializer.serialize_seq(Some(array.len()))?;
                for item in array {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Repr::Object(object) => {
                let object = object.get();
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (key, value) in object.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("any valid JSON value")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
                Ok(Value::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
                Ok(Value::from(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
                Ok(Value::from(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
                Ok(Value::from(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
                Ok(Value::from(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
                Ok(Value::from(v))
            }

            fn visit_none<E: de::Error>(self) -> Result<Value, E> {
                Ok(Value::null())
            }

            fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
                Ok(Value::null())
            }

            fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
                let mut array = Array::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element::<Value>()? {
                    array.push(item);
                }
                Ok(Value::from(array))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
                let mut object = Object::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    object.insert(key, value);
                }
                Ok(Value::from(object))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl From<::serde_json::Value> for Value {
    fn from(value: ::serde_json::Value) -> Value {
        match value {
            ::serde_json::Value::Null => Value::null(),
            ::serde_json::Value::Bool(b) => Value::from(b),
            ::serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::from(i)
                } else if let Some(u) = n.as_u64() {
                    Value::from(u)
                } else {
                    Value::from(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            ::serde_json::Value::String(s) => Value::from(s),
            ::serde_json::Value::Array(items) => {
                items.into_iter().map(Value::from).collect::<Array>().into()
            }
            ::serde_json::Value::Object(entries) => entries
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect::<Object>()
                .into(),
        }
    }
}

impl From<Value> for ::serde_json::Value {
    /// Non-finite floats become `null`: `serde_json::Number` cannot hold
    /// them.
    fn from(value: Value) -> ::serde_json::Value {
        match value.repr {
            Repr::Null => ::serde_json::Value::Null,
            Repr::Bool(b) => ::serde_json::Value::Bool(b),
            Repr::Integer(i) => ::serde_json::Value::from(i),
            Repr::UInteger(u) => ::serde_json::Value::from(u),
            Repr::Float(f) => ::serde_json::Number::from_f64(f)
                .map(::serde_json::Value::Number)
                .unwrap_or(::serde_json::Value::Null),
            Repr::String(s) => ::serde_json::Value::String(s.as_str().to_owned()),
            Repr::Array(array) => ::serde_json::Value::Array(
                array.iter().cloned().map(::serde_json::Value::from).collect(),
            ),
            Repr::Object(object) => {
                let mut map = ::serde_json::Map::with_capacity(object.get().len());
                for (key, value) in object.get().iter() {
                    map.insert(key.to_owned(), ::serde_json::Value::from(value.clone()));
                }
                ::serde_json::Value::Object(map)
            }
        }
    }
}

impl PartialEq<::serde_json::Value> for Value {
    fn eq(&self, other: &::serde_json::Value) -> bool {
        eq(other, self)
    }
}

impl PartialEq<Value> for ::serde_json::Value {
    fn eq(&self, other: &Value) -> bool {
        eq(self, other)
    }
}

fn eq(lhs: &::serde_json::Value, rhs: &Value) -> bool {
    match (lhs, &rhs.repr) {
        (::serde_json::Value::Null, Repr::Null) => true,
        (::serde_json::Value::Bool(l), Repr::Bool(r)) => l == r,
        (::serde_json::Value::Number(l), _) => {
            if let Some(u) = l.as_u64() {
                rhs == &u
            } else if let Some(i) = l.as_i64() {
                rhs == &i
            } else {
                matches!(rhs.repr, Repr::Float(f) if l.as_f64() == Some(f))
            }
        }
        (::serde_json::Value::String(l), Repr::String(r)) => l.as_str() == r.as_str(),
        (::serde_json::Value::Array(l), Repr::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r.iter()).all(|(a, b)| eq(a, b))
        }
        (::serde_json::Value::Object(l), Repr::Object(r)) => {
            let r = r.get();
            l.len() == r.len()
                && l.iter()
                    .all(|(key, value)| r.get(key).map(|v| eq(value, v)).unwrap_or(false))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::Value;
    use serde_json::json;

    #[test]
    fn converts_both_directions() {
        let original = json!({"a": [1, 2.5, "three"], "b": null, "big": 18446744073709551615u64});
        let ours = Value::from(original.clone());
        assert_eq!(ours["a"].len(), 3);
        assert_eq!(ours["big"].as_uinteger().unwrap(), u64::MAX);
        assert_eq!(ours, original);

        let back = serde_json::Value::from(ours);
        assert_eq!(back, original);
    }

    #[test]
    fn serde_round_trip_through_text() {
        let ours = crate::parse(r#"{"k":[true,null,1.5]}"#).unwrap();
        let text = serde_json::to_string(&ours).unwrap();
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(ours, reparsed);
    }
}
