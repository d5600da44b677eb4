//! Small-string-optimized string storage for `Value`.
//!
//! A `Str` is 24 bytes: one tag byte plus a 16-byte payload. Strings of up
//! to 15 bytes live inline; longer strings are either a heap `Box<str>` or
//! a pointer/length pair into an arena. Arena strings are not freed on
//! drop; the arena releases them in bulk.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::ManuallyDrop;
use std::ptr::NonNull;

use crate::arena::{self, Arena};

/// Longest string stored inline.
pub(crate) const SSO_MAX: usize = 15;

/// Tag values above `SSO_MAX` select the out-of-line representations.
const TAG_HEAP: u8 = 0xFE;
const TAG_ARENA: u8 = 0xFF;

#[derive(Clone, Copy)]
struct ArenaSlice {
    ptr: NonNull<u8>,
    len: u32,
}

union Payload {
    inline: [u8; 16],
    heap: ManuallyDrop<Box<str>>,
    arena: ArenaSlice,
}

pub(crate) struct Str {
    tag: u8,
    payload: Payload,
}

// SAFETY: heap and inline representations own their bytes. Arena-backed
// strings are raw pointers into a `bumpalo` block; the scope contract
// (`ArenaScope::new`) guarantees they do not outlive the arena, and arena
// bytes are never written after creation, so shared reads are safe.
unsafe impl Send for Str {}
unsafe impl Sync for Str {}

impl Str {
    /// Build from a borrowed string, consulting the active arena for
    /// long strings.
    pub(crate) fn new(s: &str) -> Str {
        if s.len() <= SSO_MAX {
            Str::inline(s)
        } else {
            arena::with_active(|active| Str::long_with(active, s))
        }
    }

    /// Build with a pre-resolved arena, avoiding a thread-local lookup per
    /// string on the parser's hot path.
    pub(crate) fn with_arena(active: Option<&Arena>, s: &str) -> Str {
        if s.len() <= SSO_MAX {
            Str::inline(s)
        } else {
            Str::long_with(active, s)
        }
    }

    /// Build from an owned string, reusing its allocation on the heap path.
    pub(crate) fn from_string(s: String) -> Str {
        if s.len() <= SSO_MAX {
            Str::inline(&s)
        } else {
            arena::with_active(|active| match active {
                Some(arena) => Str::arena_copy(arena, &s),
                None => Str {
                    tag: TAG_HEAP,
                    payload: Payload {
                        heap: ManuallyDrop::new(s.into_boxed_str()),
                    },
                },
            })
        }
    }

    fn inline(s: &str) -> Str {
        debug_assert!(s.len() <= SSO_MAX);
        let mut inline = [0u8; 16];
        inline[..s.len()].copy_from_slice(s.as_bytes());
        Str {
            tag: s.len() as u8,
            payload: Payload { inline },
        }
    }

    fn long_with(active: Option<&Arena>, s: &str) -> Str {
        debug_assert!(s.len() > SSO_MAX);
        match active {
            Some(arena) => Str::arena_copy(arena, s),
            None => Str {
                tag: TAG_HEAP,
                payload: Payload {
                    heap: ManuallyDrop::new(Box::from(s)),
                },
            },
        }
    }

    fn arena_copy(arena: &Arena, s: &str) -> Str {
        let copied = arena.alloc_str(s);
        Str {
            tag: TAG_ARENA,
            payload: Payload {
                arena: ArenaSlice {
                    // SAFETY: `alloc_str` never returns a null pointer.
                    ptr: unsafe { NonNull::new_unchecked(copied.as_ptr() as *mut u8) },
                    len: copied.len() as u32,
                },
            },
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        match self.tag {
            TAG_HEAP => {
                // SAFETY: the tag says the heap representation is active.
                let boxed: &Box<str> = unsafe { &self.payload.heap };
                boxed
            }
            TAG_ARENA => {
                // SAFETY: the tag says the arena representation is active;
                // the bytes were copied from a valid `&str` and stay alive
                // for as long as this value (scope contract).
                unsafe {
                    let slice = self.payload.arena;
                    let bytes = std::slice::from_raw_parts(slice.ptr.as_ptr(), slice.len as usize);
                    std::str::from_utf8_unchecked(bytes)
                }
            }
            len => {
                // SAFETY: inline representation; `len <= SSO_MAX` bytes were
                // copied from a valid `&str`.
                unsafe { std::str::from_utf8_unchecked(&self.payload.inline[..len as usize]) }
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self.tag {
            TAG_HEAP => {
                let boxed: &Box<str> = unsafe { &self.payload.heap };
                boxed.len()
            }
            TAG_ARENA => unsafe { self.payload.arena.len as usize },
            len => len as usize,
        }
    }

}

impl Drop for Str {
    fn drop(&mut self) {
        if self.tag == TAG_HEAP {
            // SAFETY: the heap representation is active and dropped once.
            unsafe { ManuallyDrop::drop(&mut self.payload.heap) }
        }
        // Inline: nothing owned. Arena: the arena frees the bytes in bulk.
    }
}

impl Clone for Str {
    /// Copies consult the active arena the same way construction does:
    /// cloning an arena string with no scope active yields an independent
    /// heap string. Inline strings copy bytes, nothing more.
    fn clone(&self) -> Str {
        if self.tag <= SSO_MAX as u8 {
            return Str {
                tag: self.tag,
                payload: Payload {
                    // SAFETY: inline representation is active.
                    inline: unsafe { self.payload.inline },
                },
            };
        }
        Str::new(self.as_str())
    }
}

impl From<&str> for Str {
    fn from(s: &str) -> Str {
        Str::new(s)
    }
}

impl From<String> for Str {
    fn from(s: String) -> Str {
        Str::from_string(s)
    }
}

impl std::ops::Deref for Str {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq for Str {
    fn eq(&self, other: &Str) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Str {}

impl Hash for Str {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const _: () = assert!(std::mem::size_of::<Str>() == 24);
