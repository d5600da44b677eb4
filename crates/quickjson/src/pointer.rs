//! JSON Pointer (RFC 6901) navigation.
//!
//! ```
//! use quickjson::JsonPointer;
//!
//! let doc = quickjson::parse(r#"{"users":[{"name":"Ada"}]}"#).unwrap();
//! let ptr = JsonPointer::new("/users/0/name").unwrap();
//! assert_eq!(ptr.resolve(&doc).unwrap().as_str().unwrap(), "Ada");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};
use crate::value::Value;

/// A parsed RFC 6901 pointer: `""` is the root, `/foo/0/a~1b` walks key
/// `foo`, index 0, then key `a/b` (`~0` unescapes to `~`, `~1` to `/`).
///
/// Tokens are stored unescaped and owned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    /// Parse a pointer string. Must be empty or start with `/`.
    pub fn new(pointer: &str) -> Result<JsonPointer> {
        if pointer.is_empty() {
            return Ok(JsonPointer::default());
        }
        if !pointer.starts_with('/') {
            return Err(Error::new(
                ErrorKind::UnexpectedCharacter,
                "JSON pointer must start with '/' or be empty",
            ));
        }
        let tokens = pointer[1..].split('/').map(unescape).collect();
        Ok(JsonPointer { tokens })
    }

    /// Pointer from already-unescaped tokens.
    pub fn from_tokens(tokens: impl IntoIterator<Item = impl Into<String>>) -> JsonPointer {
        JsonPointer {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of reference tokens.
    pub fn depth(&self) -> usize {
        self.tokens.len()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Walk the pointer; fails with `KeyNotFound`, `OutOfRange`, or
    /// `TypeMismatch` describing the first step that does not apply.
    pub fn resolve<'v>(&self, root: &'v Value) -> Result<&'v Value> {
        let mut current = root;
        for (depth, token) in self.tokens.iter().enumerate() {
            if current.is_object() {
                current = current.find(token).ok_or_else(|| {
                    Error::new(
                        ErrorKind::KeyNotFound,
                        format!("JSON pointer: key not found \"{token}\" at depth {depth}"),
                    )
                })?;
            } else if current.is_array() {
                let array = current.as_array()?;
                let index = parse_index(token, array.len())?;
                current = &array[index];
            } else {
                return Err(Error::new(
                    ErrorKind::TypeMismatch,
                    format!(
                        "JSON pointer: cannot index into {} at depth {depth}",
                        current.json_type()
                    ),
                ));
            }
        }
        Ok(current)
    }

    /// Mutable variant of [`resolve`](JsonPointer::resolve).
    pub fn resolve_mut<'v>(&self, root: &'v mut Value) -> Result<&'v mut Value> {
        let mut current = root;
        for (depth, token) in self.tokens.iter().enumerate() {
            if current.is_object() {
                current = current.find_mut(token).ok_or_else(|| {
                    Error::new(
                        ErrorKind::KeyNotFound,
                        format!("JSON pointer: key not found \"{token}\" at depth {depth}"),
                    )
                })?;
            } else if current.is_array() {
                let len = current.len();
                let index = parse_index(token, len)?;
                current = &mut current.as_array_mut()?[index];
            } else {
                return Err(Error::new(
                    ErrorKind::TypeMismatch,
                    format!(
                        "JSON pointer: cannot index into {} at depth {depth}",
                        current.json_type()
                    ),
                ));
            }
        }
        Ok(current)
    }

    /// Non-failing lookup; `None` wherever `resolve` would error.
    pub fn try_resolve<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        let mut current = root;
        for token in &self.tokens {
            if current.is_object() {
                current = current.find(token)?;
            } else if current.is_array() {
                let array = current.as_array().ok()?;
                let index = parse_index(token, array.len()).ok()?;
                current = &array[index];
            } else {
                return None;
            }
        }
        Some(current)
    }

    /// Set the value at this location, creating intermediate objects for
    /// missing keys. The final token `-` appends to an array.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<()> {
        let Some((last, path)) = self.tokens.split_last() else {
            *root = value;
            return Ok(());
        };

        let mut current = root;
        for token in path {
            if current.is_object() {
                let object = current.as_object_mut()?;
                if !object.contains_key(token) {
                    object.insert(token.as_str(), Value::new_object());
                }
                current = match object.get_mut(token) {
                    Some(next) => next,
                    None => unreachable!("entry was just inserted"),
                };
            } else if current.is_array() {
                let len = current.len();
                let index = parse_index(token, len)?;
                current = &mut current.as_array_mut()?[index];
            } else {
                return Err(Error::new(
                    ErrorKind::TypeMismatch,
                    format!("JSON pointer: cannot traverse {}", current.json_type()),
                ));
            }
        }

        if current.is_object() {
            current.as_object_mut()?.insert(last.as_str(), value);
            Ok(())
        } else if current.is_array() {
            if last == "-" {
                current.push(value)
            } else {
                let len = current.len();
                let index = parse_index(last, len)?;
                current.as_array_mut()?[index] = value;
                Ok(())
            }
        } else {
            Err(Error::new(
                ErrorKind::TypeMismatch,
                format!("JSON pointer: cannot set in {}", current.json_type()),
            ))
        }
    }

    /// Remove the value at this location. Returns whether anything was
    /// removed; the root itself cannot be erased.
    pub fn erase(&self, root: &mut Value) -> bool {
        let Some((last, _)) = self.tokens.split_last() else {
            return false;
        };
        let Some(container) = self.parent().try_resolve_mut(root) else {
            return false;
        };
        if container.is_object() {
            return container
                .as_object_mut()
                .map(|object| object.remove(last).is_some())
                .unwrap_or(false);
        }
        if container.is_array() {
            let Ok(index) = last.parse::<usize>() else {
                return false;
            };
            let Ok(array) = container.as_array_mut() else {
                return false;
            };
            if index >= array.len() {
                return false;
            }
            array.remove(index);
            return true;
        }
        false
    }

    fn try_resolve_mut<'v>(&self, root: &'v mut Value) -> Option<&'v mut Value> {
        let mut current = root;
        for token in &self.tokens {
            if current.is_object() {
                current = current.find_mut(token)?;
            } else if current.is_array() {
                let len = current.len();
                let index = parse_index(token, len).ok()?;
                current = &mut current.as_array_mut().ok()?[index];
            } else {
                return None;
            }
        }
        Some(current)
    }

    /// New pointer with one more token appended.
    #[must_use]
    pub fn append(&self, token: &str) -> JsonPointer {
        let mut tokens = self.tokens.clone();
        tokens.push(token.to_owned());
        JsonPointer { tokens }
    }

    #[must_use]
    pub fn append_index(&self, index: usize) -> JsonPointer {
        self.append(&index.to_string())
    }

    /// Parent pointer; the root is its own parent.
    #[must_use]
    pub fn parent(&self) -> JsonPointer {
        let mut tokens = self.tokens.clone();
        tokens.pop();
        JsonPointer { tokens }
    }
}

impl FromStr for JsonPointer {
    type Err = Error;

    fn from_str(s: &str) -> Result<JsonPointer> {
        JsonPointer::new(s)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            f.write_str("/")?;
            for c in token.chars() {
                match c {
                    '~' => f.write_str("~0")?,
                    '/' => f.write_str("~1")?,
                    _ => fmt::Write::write_char(f, c)?,
                }
            }
        }
        Ok(())
    }
}

fn unescape(token: &str) -> String {
    if !token.contains('~') {
        return token.to_owned();
    }
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.peek() {
                Some('0') => {
                    out.push('~');
                    chars.next();
                }
                Some('1') => {
                    out.push('/');
                    chars.next();
                }
                _ => out.push('~'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Strict array index token: digits only, no leading zeros, in bounds.
fn parse_index(token: &str, len: usize) -> Result<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return Err(Error::new(
            ErrorKind::OutOfRange,
            format!("JSON pointer: invalid array index \"{token}\""),
        ));
    }
    let index: usize = token.parse().map_err(|_| {
        Error::new(
            ErrorKind::OutOfRange,
            format!("JSON pointer: invalid array index \"{token}\""),
        )
    })?;
    if index >= len {
        return Err(Error::new(
            ErrorKind::OutOfRange,
            format!("JSON pointer: array index {index} >= size {len}"),
        ));
    }
    Ok(index)
}

/// Resolve a pointer string against a value in one call.
pub fn resolve<'v>(root: &'v Value, pointer: &str) -> Result<&'v Value> {
    JsonPointer::new(pointer)?.resolve(root)
}
