use std::{fmt, rc::Rc};

/// Click handler for a leaf item. Invoked on the UI thread with no arguments.
pub type Callback = Rc<dyn Fn()>;

/// A titled submenu. Used both for the top-level menus of the menu bar and
/// for nested submenus.
pub struct Menu {
    pub title: String,
    pub entries: Vec<MenuEntry>,
}

impl Menu {
    pub fn new(title: impl Into<String>, entries: Vec<MenuEntry>) -> Self {
        Self {
            title: title.into(),
            entries,
        }
    }
}

/// One node of a declarative menu tree. Entry order is kept as the native
/// child order.
pub enum MenuEntry {
    Submenu(Menu),
    Item {
        title: String,
        /// `mod+...+key`, or empty for no shortcut.
        shortcut: String,
        on_click: Callback,
    },
}

impl MenuEntry {
    pub fn item(
        title: impl Into<String>,
        shortcut: impl Into<String>,
        on_click: impl Fn() + 'static,
    ) -> Self {
        Self::Item {
            title: title.into(),
            shortcut: shortcut.into(),
            on_click: Rc::new(on_click),
        }
    }

    pub fn submenu(title: impl Into<String>, entries: Vec<MenuEntry>) -> Self {
        Self::Submenu(Menu::new(title, entries))
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Submenu(menu) => &menu.title,
            Self::Item { title, .. } => title,
        }
    }
}

impl From<Menu> for MenuEntry {
    fn from(menu: Menu) -> Self {
        Self::Submenu(menu)
    }
}

impl fmt::Debug for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Menu")
            .field("title", &self.title)
            .field("entries", &self.entries)
            .finish()
    }
}

impl fmt::Debug for MenuEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submenu(menu) => f.debug_tuple("Submenu").field(menu).finish(),
            Self::Item {
                title, shortcut, ..
            } => f
                .debug_struct("Item")
                .field("title", title)
                .field("shortcut", shortcut)
                .finish_non_exhaustive(),
        }
    }
}
