use std::path::Path;

use anyhow::Result;
use thiserror::Error;

use crate::menu::{Dispatcher, Handle, Shortcut};

/// Width of a status bar item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusItemWidth {
    /// Sized to fit the title.
    Variable,
    /// Same width as the status bar height.
    Square,
    Fixed(f64),
}

impl StatusItemWidth {
    /// AppKit status item length (`NSVariableStatusItemLength` is -1,
    /// `NSSquareStatusItemLength` is -2).
    pub fn length(self) -> f64 {
        match self {
            Self::Variable => -1.0,
            Self::Square => -2.0,
            Self::Fixed(width) => width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("image could not be decoded")]
    DecodeFailed,
}

/// A user notification. The action and other buttons are only shown when
/// their titles are non-empty.
#[derive(Debug, Clone)]
pub struct Notification<'a, I> {
    pub title: String,
    pub subtitle: String,
    pub informative_text: String,
    pub image: Option<&'a I>,
    pub identifier: String,
    pub action_button_title: String,
    pub other_button_title: String,
}

impl<'a, I> Notification<'a, I> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: String::new(),
            informative_text: String::new(),
            image: None,
            identifier: String::new(),
            action_button_title: String::new(),
            other_button_title: String::new(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.informative_text = text.into();
        self
    }

    pub fn with_image(mut self, image: &'a I) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn with_buttons(mut self, action: impl Into<String>, other: impl Into<String>) -> Self {
        self.action_button_title = action.into();
        self.other_button_title = other.into();
        self
    }

    pub fn has_action_button(&self) -> bool {
        !self.action_button_title.is_empty()
    }

    pub fn has_other_button(&self) -> bool {
        !self.other_button_title.is_empty()
    }
}

/// The native toolkit primitives the menu builder drives.
///
/// Objects returned here are owned by the toolkit; callers only hold on to
/// them while a build is in progress.
pub trait NativeSurface {
    type Menu;
    type Item;
    type Image;

    /// Hands over the dispatcher that activated leaf items call into.
    /// Called once, before any item is created.
    fn connect(&mut self, dispatcher: Dispatcher) -> Result<()>;

    fn create_menu(&mut self, title: &str) -> Result<Self::Menu>;

    /// Appends an item to `parent`. Items with an `action` invoke the
    /// dispatcher with that handle when activated.
    fn add_menu_item(
        &mut self,
        parent: &Self::Menu,
        title: &str,
        shortcut: Option<&Shortcut>,
        action: Option<Handle>,
    ) -> Result<Self::Item>;

    fn set_submenu(&mut self, item: &Self::Item, submenu: &Self::Menu) -> Result<()>;

    fn set_main_menu(&mut self, root: &Self::Menu) -> Result<()>;

    fn add_status_item(
        &mut self,
        width: StatusItemWidth,
        title: &str,
        highlight: bool,
        root: &Self::Menu,
    ) -> Result<()>;

    fn image_from_png(&mut self, bytes: &[u8]) -> Result<Self::Image, ImageError>;

    fn write_png(&mut self, image: &Self::Image, path: &Path) -> Result<()>;

    fn deliver_notification(&mut self, notification: &Notification<'_, Self::Image>)
        -> Result<()>;

    /// Prepares the native event loop. The returned closure blocks until the
    /// application exits and must not borrow the surface, so callbacks fired
    /// from inside the loop can keep building menus.
    fn event_loop(&mut self) -> Result<EventLoop>;
}

/// Blocking entry into a toolkit's event loop, see [`NativeSurface::event_loop`].
pub type EventLoop = Box<dyn FnOnce() -> Result<()>>;

#[cfg(target_os = "macos")]
pub mod macos;
pub mod recording;

#[cfg(target_os = "macos")]
pub fn native(activation: crate::config::ActivationPolicy) -> Result<macos::AppKitSurface> {
    macos::AppKitSurface::new(activation)
}
