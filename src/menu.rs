//! Declarative menus: the entry tree, the shortcut grammar, and the
//! registry/dispatcher pair that routes native clicks back to closures.

pub mod builder;
pub mod dispatch;
pub mod entry;
pub mod layout;
pub mod registry;
pub mod shortcut;

pub use builder::{BuildReport, EntryOutcome, EntryReport, MenuBuilder, ShortcutPolicy};
pub use dispatch::Dispatcher;
pub use entry::{Callback, Menu, MenuEntry};
pub use registry::{CallbackRegistry, Handle};
pub use shortcut::{Modifiers, Shortcut, ShortcutError};
