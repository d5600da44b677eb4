//! Monotonic arena allocation for parse-heavy workloads.
//!
//! An [`Arena`] is a bump allocator: allocations are pointer bumps,
//! individual deallocation is a no-op, and all memory is released at once
//! by [`Arena::reset`] or on drop. While an [`ArenaScope`] is active on the
//! current thread, long strings and container storage created by parsing
//! (or by `Value` constructors) are placed in the arena instead of the heap.
//!
//! [`ArenaDocument`] is the safe way to use this: it owns the arena and the
//! parsed root together, so borrow checking rules out use-after-reset.

use std::alloc::Layout;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use bumpalo::Bump;

use crate::error::Result;
use crate::options::ParseOptions;
use crate::parser;
use crate::value::Value;

/// Default initial arena capacity in bytes. Enough for typical
/// small-to-medium messages without a second block.
pub const DEFAULT_ARENA_CAPACITY: usize = 4096;

/// Monotonic (bump) arena allocator.
///
/// Not shareable across threads; each thread uses its own instance.
/// Overflow blocks grow geometrically inside `bumpalo`.
pub struct Arena {
    bump: Bump,
}

impl Arena {
    pub fn new() -> Arena {
        Arena::with_capacity(DEFAULT_ARENA_CAPACITY)
    }

    /// Create an arena with the given initial block capacity in bytes.
    pub fn with_capacity(capacity: usize) -> Arena {
        Arena {
            bump: Bump::with_capacity(capacity),
        }
    }

    /// Total bytes currently held by the arena across all blocks.
    ///
    /// Stable across repeated parse/reset cycles over bounded inputs:
    /// `reset` keeps the largest block, so the arena stops growing once it
    /// has seen its peak working set.
    pub fn bytes_allocated(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Release every allocation, keeping the largest block for reuse.
    ///
    /// Taking `&mut self` guarantees no outstanding safe borrows of arena
    /// memory exist; values that were parsed into this arena must already
    /// be gone (see [`ArenaScope::new`] for the contract).
    pub fn reset(&mut self) {
        self.bump.reset();
    }

    pub(crate) fn alloc_layout(&self, layout: Layout) -> NonNull<u8> {
        self.bump.alloc_layout(layout)
    }

    pub(crate) fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Arena::new()
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("bytes_allocated", &self.bytes_allocated())
            .finish()
    }
}

thread_local! {
    /// The at-most-one active arena for this thread. Consulted by string
    /// and container constructors to decide where payloads live.
    static ACTIVE_ARENA: Cell<Option<NonNull<Arena>>> = const { Cell::new(None) };
}

/// Run `f` with the currently active arena, if any.
pub(crate) fn with_active<R>(f: impl FnOnce(Option<&Arena>) -> R) -> R {
    ACTIVE_ARENA.with(|cell| {
        let current = cell.get();
        // SAFETY: the pointer was installed by an `ArenaScope` that is
        // still alive (it removes itself on drop) and whose constructor
        // received a live `&Arena`.
        f(current.map(|ptr| unsafe { ptr.as_ref() }))
    })
}

/// RAII guard that makes an arena the active one for the current thread.
///
/// Nesting is supported: the previous arena is restored when the guard is
/// dropped, including during unwinding.
pub struct ArenaScope<'a> {
    previous: Option<NonNull<Arena>>,
    _arena: PhantomData<&'a Arena>,
}

impl<'a> ArenaScope<'a> {
    /// Activate `arena` for the current thread until the guard is dropped.
    ///
    /// # Safety
    ///
    /// Values created while the scope is active may hold raw pointers into
    /// the arena. The caller must ensure every such value is dropped before
    /// the arena is reset or dropped, and that such values are not given to
    /// other threads that could outlive the arena. [`ArenaDocument`]
    /// packages this contract safely.
    pub unsafe fn new(arena: &'a Arena) -> ArenaScope<'a> {
        let previous = ACTIVE_ARENA.with(|cell| cell.replace(Some(NonNull::from(arena))));
        ArenaScope {
            previous,
            _arena: PhantomData,
        }
    }
}

impl Drop for ArenaScope<'_> {
    fn drop(&mut self) {
        ACTIVE_ARENA.with(|cell| cell.set(self.previous));
    }
}

/// A parsed document that owns both its arena and its root value.
///
/// All tree allocations come from the internal arena; the root and its
/// descendants stay valid until [`reset`](ArenaDocument::reset), the next
/// [`parse`](ArenaDocument::parse), or drop. Use
/// [`snapshot`](ArenaDocument::snapshot) to obtain an independent
/// heap-backed copy that outlives the document.
///
/// ```
/// let mut doc = quickjson::ArenaDocument::new();
/// doc.parse(r#"{"a":1,"b":[2,3]}"#).unwrap();
/// assert_eq!(doc.root()["a"].as_integer().unwrap(), 1);
/// doc.reset(); // O(1), reuse for the next message
/// ```
pub struct ArenaDocument {
    arena: Arena,
    root: Value,
}

impl ArenaDocument {
    pub fn new() -> ArenaDocument {
        ArenaDocument::with_capacity(DEFAULT_ARENA_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> ArenaDocument {
        ArenaDocument {
            arena: Arena::with_capacity(capacity),
            root: Value::null(),
        }
    }

    /// Parse `input` into the document, replacing any previous root.
    pub fn parse(&mut self, input: &str) -> Result<&Value> {
        self.parse_with(input, &ParseOptions::strict())
    }

    /// Parse with explicit options.
    pub fn parse_with(&mut self, input: &str, options: &ParseOptions) -> Result<&Value> {
        // Drop the previous tree before touching the arena again.
        self.root = Value::null();
        let root = {
            // SAFETY: the parsed tree is stored in `self.root`, which is
            // cleared before every reset and cannot be moved out of the
            // document; the arena therefore outlives it.
            let _scope = unsafe { ArenaScope::new(&self.arena) };
            parser::parse_slice(input.as_bytes(), options)?
        };
        self.root = root;
        Ok(&self.root)
    }

    /// The most recently parsed root (null before the first parse).
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Deep copy of the root, backed entirely by the heap. The copy stays
    /// valid after `reset` and after the document is dropped.
    pub fn snapshot(&self) -> Value {
        self.root.clone()
    }

    /// Clear the root and rewind the arena for reuse.
    pub fn reset(&mut self) {
        self.root = Value::null();
        self.arena.reset();
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }
}

impl Default for ArenaDocument {
    fn default() -> Self {
        ArenaDocument::new()
    }
}

impl fmt::Debug for ArenaDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaDocument")
            .field("bytes_allocated", &self.arena.bytes_allocated())
            .field("root", &self.root)
            .finish()
    }
}
