//! JSON description of a menu tree, for tooling that declares menus without
//! code (`gallium check`). Every leaf gets its callback from a caller-supplied
//! factory.

use std::{fs, path::Path, rc::Rc};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::entry::{Callback, Menu, MenuEntry};

/// A layout node. Told apart by shape: an object with `entries` is a
/// submenu. Both shapes reject unknown keys, so a submenu whose children fail
/// to parse is an error instead of an item with its subtree dropped.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LayoutEntry {
    Submenu(LayoutSubmenu),
    Item(LayoutItem),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutSubmenu {
    pub title: String,
    pub entries: Vec<LayoutEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutItem {
    pub title: String,
    #[serde(default)]
    pub shortcut: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutMenu {
    pub title: String,
    #[serde(default)]
    pub entries: Vec<LayoutEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutStatusItem {
    pub title: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub highlight: bool,
    #[serde(default)]
    pub entries: Vec<LayoutEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuLayout {
    #[serde(default)]
    pub menus: Vec<LayoutMenu>,
    #[serde(default)]
    pub status_items: Vec<LayoutStatusItem>,
}

impl MenuLayout {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading layout {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
    }
}

impl LayoutMenu {
    pub fn into_menu<F>(self, on_click: &F) -> Menu
    where
        F: Fn(&str) -> Callback,
    {
        Menu::new(self.title, into_entries(self.entries, on_click))
    }
}

/// Converts layout entries into menu entries, asking `on_click` for each
/// leaf's callback by title.
pub fn into_entries<F>(entries: Vec<LayoutEntry>, on_click: &F) -> Vec<MenuEntry>
where
    F: Fn(&str) -> Callback,
{
    entries
        .into_iter()
        .map(|entry| match entry {
            LayoutEntry::Submenu(LayoutSubmenu { title, entries }) => {
                MenuEntry::Submenu(Menu::new(title, into_entries(entries, on_click)))
            }
            LayoutEntry::Item(LayoutItem { title, shortcut }) => MenuEntry::Item {
                on_click: on_click(&title),
                title,
                shortcut,
            },
        })
        .collect()
}

/// Callback factory that only logs the activation.
pub fn log_activation(title: &str) -> Callback {
    let title = title.to_string();
    Rc::new(move || tracing::info!(item = %title, "menu item activated"))
}
