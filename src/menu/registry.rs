use std::fmt;

use super::entry::Callback;

/// Integer identifying a registered callback. This is the only value that
/// crosses into native code (as the menu item's tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Append-only table of click callbacks. Handles are indices into the table,
/// so they are issued sequentially from zero and never reused.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: Vec<Callback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, callback: Callback) -> Handle {
        let handle = Handle(self.callbacks.len());
        self.callbacks.push(callback);
        handle
    }

    pub fn get(&self, handle: Handle) -> Option<Callback> {
        self.callbacks.get(handle.0).cloned()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
