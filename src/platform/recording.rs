//! In-memory [`NativeSurface`] that records every call.
//!
//! Used by the test suite and by `gallium check` to build a menu without a
//! window server. Activating an item (see `App::click`) goes through the same
//! [`Dispatcher`] the AppKit surface uses.

use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};

use super::{EventLoop, ImageError, NativeSurface, Notification, StatusItemWidth};
use crate::menu::{Dispatcher, Handle, Shortcut};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedImage(pub Vec<u8>);

#[derive(Debug, Clone)]
pub struct RecordedMenu {
    pub title: String,
    pub items: Vec<ItemId>,
}

#[derive(Debug, Clone)]
pub struct RecordedItem {
    pub title: String,
    pub shortcut: Option<Shortcut>,
    pub action: Option<Handle>,
    pub submenu: Option<MenuId>,
}

#[derive(Debug, Clone)]
pub struct RecordedStatusItem {
    pub width: StatusItemWidth,
    pub title: String,
    pub highlight: bool,
    pub menu: MenuId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedNotification {
    pub title: String,
    pub subtitle: String,
    pub informative_text: String,
    pub identifier: String,
    pub has_image: bool,
    pub buttons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    CreateMenu { menu: MenuId, title: String },
    AddMenuItem { parent: MenuId, item: ItemId, title: String },
    SetSubmenu { item: ItemId, submenu: MenuId },
    SetMainMenu(MenuId),
    AddStatusItem { title: String, menu: MenuId },
    DeliverNotification { title: String },
    Run,
}

#[derive(Default)]
pub struct RecordingSurface {
    menus: Vec<RecordedMenu>,
    items: Vec<RecordedItem>,
    main_menu: Option<MenuId>,
    status_items: Vec<RecordedStatusItem>,
    notifications: Vec<RecordedNotification>,
    calls: Vec<NativeCall>,
    dispatcher: Option<Dispatcher>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[NativeCall] {
        &self.calls
    }

    pub fn menu(&self, id: MenuId) -> &RecordedMenu {
        &self.menus[id.0]
    }

    pub fn item(&self, id: ItemId) -> &RecordedItem {
        &self.items[id.0]
    }

    pub fn main_menu(&self) -> Option<MenuId> {
        self.main_menu
    }

    pub fn status_items(&self) -> &[RecordedStatusItem] {
        &self.status_items
    }

    pub fn notifications(&self) -> &[RecordedNotification] {
        &self.notifications
    }

    /// Titles of the direct children of `menu`, in native order.
    pub fn titles(&self, menu: MenuId) -> Vec<&str> {
        self.menu(menu)
            .items
            .iter()
            .map(|id| self.item(*id).title.as_str())
            .collect()
    }

    /// Follows `path` by item title starting at `menu`.
    pub fn find(&self, menu: MenuId, path: &[&str]) -> Option<&RecordedItem> {
        let (first, rest) = path.split_first()?;
        let item = self
            .menu(menu)
            .items
            .iter()
            .map(|id| self.item(*id))
            .find(|item| item.title == *first)?;
        if rest.is_empty() {
            return Some(item);
        }
        self.find(item.submenu?, rest)
    }

    /// Menus an item can be activated from: the main menu first, then each
    /// status item's menu in the order they were added.
    pub fn roots(&self) -> impl Iterator<Item = MenuId> + '_ {
        self.main_menu
            .into_iter()
            .chain(self.status_items.iter().map(|s| s.menu))
    }

    /// Handle of the leaf at `path` under `menu`.
    pub fn action_at(&self, menu: MenuId, path: &[&str]) -> Result<Handle> {
        let item = self
            .find(menu, path)
            .ok_or_else(|| anyhow!("no menu item at '{}'", path.join(" > ")))?;
        item.action
            .ok_or_else(|| anyhow!("'{}' has no action", path.join(" > ")))
    }

    /// Handle of the first leaf at `path` under any of [`Self::roots`].
    pub fn find_action(&self, path: &[&str]) -> Result<Handle> {
        let mut last = None;
        for root in self.roots() {
            match self.action_at(root, path) {
                Ok(handle) => return Ok(handle),
                Err(err) => last = Some(err),
            }
        }
        Err(last.unwrap_or_else(|| anyhow!("no menus have been built")))
    }

    /// The dispatcher handed over by [`NativeSurface::connect`]. Clone it out
    /// and drop any borrow of the surface before dispatching.
    pub fn dispatcher(&self) -> Result<Dispatcher> {
        self.dispatcher
            .clone()
            .ok_or_else(|| anyhow!("surface is not connected to a dispatcher"))
    }

    /// Indented rendering of `menu`, one line per item.
    pub fn outline(&self, menu: MenuId) -> Vec<String> {
        let mut lines = Vec::new();
        self.outline_into(menu, 0, &mut lines);
        lines
    }

    fn outline_into(&self, menu: MenuId, depth: usize, lines: &mut Vec<String>) {
        for id in &self.menu(menu).items {
            let item = self.item(*id);
            let mut line = format!("{}{}", "  ".repeat(depth), item.title);
            if let Some(shortcut) = &item.shortcut {
                line.push_str(&format!("  [{shortcut}]"));
            }
            if let Some(handle) = item.action {
                line.push_str(&format!("  {handle}"));
            }
            lines.push(line);
            if let Some(submenu) = item.submenu {
                self.outline_into(submenu, depth + 1, lines);
            }
        }
    }
}

impl NativeSurface for RecordingSurface {
    type Menu = MenuId;
    type Item = ItemId;
    type Image = RecordedImage;

    fn connect(&mut self, dispatcher: Dispatcher) -> Result<()> {
        self.dispatcher = Some(dispatcher);
        Ok(())
    }

    fn create_menu(&mut self, title: &str) -> Result<MenuId> {
        let menu = MenuId(self.menus.len());
        self.menus.push(RecordedMenu {
            title: title.to_string(),
            items: Vec::new(),
        });
        self.calls.push(NativeCall::CreateMenu {
            menu,
            title: title.to_string(),
        });
        Ok(menu)
    }

    fn add_menu_item(
        &mut self,
        parent: &MenuId,
        title: &str,
        shortcut: Option<&Shortcut>,
        action: Option<Handle>,
    ) -> Result<ItemId> {
        let item = ItemId(self.items.len());
        self.items.push(RecordedItem {
            title: title.to_string(),
            shortcut: shortcut.cloned(),
            action,
            submenu: None,
        });
        self.menus
            .get_mut(parent.0)
            .context("add item to unknown menu")?
            .items
            .push(item);
        self.calls.push(NativeCall::AddMenuItem {
            parent: *parent,
            item,
            title: title.to_string(),
        });
        Ok(item)
    }

    fn set_submenu(&mut self, item: &ItemId, submenu: &MenuId) -> Result<()> {
        self.items
            .get_mut(item.0)
            .context("set submenu on unknown item")?
            .submenu = Some(*submenu);
        self.calls.push(NativeCall::SetSubmenu {
            item: *item,
            submenu: *submenu,
        });
        Ok(())
    }

    fn set_main_menu(&mut self, root: &MenuId) -> Result<()> {
        self.main_menu = Some(*root);
        self.calls.push(NativeCall::SetMainMenu(*root));
        Ok(())
    }

    fn add_status_item(
        &mut self,
        width: StatusItemWidth,
        title: &str,
        highlight: bool,
        root: &MenuId,
    ) -> Result<()> {
        self.status_items.push(RecordedStatusItem {
            width,
            title: title.to_string(),
            highlight,
            menu: *root,
        });
        self.calls.push(NativeCall::AddStatusItem {
            title: title.to_string(),
            menu: *root,
        });
        Ok(())
    }

    fn image_from_png(&mut self, bytes: &[u8]) -> Result<RecordedImage, ImageError> {
        if !bytes.starts_with(&PNG_SIGNATURE) {
            return Err(ImageError::DecodeFailed);
        }
        Ok(RecordedImage(bytes.to_vec()))
    }

    fn write_png(&mut self, image: &RecordedImage, path: &Path) -> Result<()> {
        fs::write(path, &image.0).with_context(|| format!("write {}", path.display()))
    }

    fn deliver_notification(&mut self, n: &Notification<'_, RecordedImage>) -> Result<()> {
        let mut buttons = Vec::new();
        if n.has_action_button() {
            buttons.push(n.action_button_title.clone());
        }
        if n.has_other_button() {
            buttons.push(n.other_button_title.clone());
        }
        self.notifications.push(RecordedNotification {
            title: n.title.clone(),
            subtitle: n.subtitle.clone(),
            informative_text: n.informative_text.clone(),
            identifier: n.identifier.clone(),
            has_image: n.image.is_some(),
            buttons,
        });
        self.calls.push(NativeCall::DeliverNotification {
            title: n.title.clone(),
        });
        Ok(())
    }

    fn event_loop(&mut self) -> Result<EventLoop> {
        self.calls.push(NativeCall::Run);
        Ok(Box::new(|| -> Result<()> { Ok(()) }))
    }
}
