//! Declarative native menus for macOS.
//!
//! Build a [`menu::MenuEntry`] tree, hand it to an [`app::App`], and clicks on
//! the resulting native items call back into the closures of the tree.

pub mod app;
pub mod bundle;
pub mod config;
pub mod logging;
pub mod menu;
pub mod platform;

pub use app::{App, WeakApp};
