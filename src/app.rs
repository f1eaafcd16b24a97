use std::{
    cell::{Ref, RefCell, RefMut},
    path::Path,
    rc::{Rc, Weak},
};

use anyhow::{anyhow, Context, Result};

use crate::menu::{
    BuildReport, CallbackRegistry, Dispatcher, Handle, Menu, MenuBuilder, MenuEntry,
    ShortcutPolicy,
};
use crate::platform::{
    recording::RecordingSurface, ImageError, NativeSurface, Notification, StatusItemWidth,
};

/// Application context. Owns the native surface and the callback registry
/// that every menu built through it shares.
///
/// `App` is a cheap, cloneable handle and every operation takes `&self`, so a
/// click callback can capture a [`WeakApp`] and build more menus while it is
/// being dispatched. Construct one per process, on the thread that will run
/// the event loop.
pub struct App<S> {
    inner: Rc<Inner<S>>,
}

/// Non-owning [`App`] handle for callbacks. Capturing an `App` itself inside
/// a callback would keep the registry alive through its own entries.
pub struct WeakApp<S> {
    inner: Weak<Inner<S>>,
}

struct Inner<S> {
    surface: RefCell<S>,
    registry: Rc<RefCell<CallbackRegistry>>,
    policy: ShortcutPolicy,
}

impl<S> Clone for App<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> Clone for WeakApp<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> WeakApp<S> {
    pub fn upgrade(&self) -> Option<App<S>> {
        self.inner.upgrade().map(|inner| App { inner })
    }
}

impl<S: NativeSurface> App<S> {
    pub fn new(mut surface: S, policy: ShortcutPolicy) -> Result<Self> {
        let registry = Rc::new(RefCell::new(CallbackRegistry::new()));
        surface
            .connect(Dispatcher::new(registry.clone()))
            .context("connect dispatcher")?;
        Ok(Self {
            inner: Rc::new(Inner {
                surface: RefCell::new(surface),
                registry,
                policy,
            }),
        })
    }

    pub fn downgrade(&self) -> WeakApp<S> {
        WeakApp {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Read access to the surface. Release the guard before triggering a
    /// callback that builds menus.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a surface operation of this app.
    pub fn surface(&self) -> Ref<'_, S> {
        self.inner.surface.borrow()
    }

    pub fn policy(&self) -> ShortcutPolicy {
        self.inner.policy
    }

    /// Number of click callbacks registered so far.
    pub fn registered_callbacks(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    /// Installs `menus` as the application's main menu bar.
    pub fn set_menu(&self, menus: Vec<Menu>) -> Result<BuildReport> {
        let mut surface = self.surface_mut()?;
        let root = surface.create_menu("<root>").context("create root menu")?;
        let entries = menus.into_iter().map(MenuEntry::Submenu).collect();
        let report = self.build(&mut *surface, entries, &root)?;
        surface.set_main_menu(&root).context("install main menu")?;
        tracing::info!(entries = report.entries.len(), "main menu installed");
        Ok(report)
    }

    /// Adds a status bar item whose menu holds `entries`.
    pub fn add_status_item(
        &self,
        width: StatusItemWidth,
        title: &str,
        highlight: bool,
        entries: Vec<MenuEntry>,
    ) -> Result<BuildReport> {
        let mut surface = self.surface_mut()?;
        let root = surface
            .create_menu("<statusbar>")
            .context("create status menu")?;
        let report = self.build(&mut *surface, entries, &root)?;
        surface
            .add_status_item(width, title, highlight, &root)
            .with_context(|| format!("add status item '{title}'"))?;
        tracing::info!(title, entries = report.entries.len(), "status item installed");
        Ok(report)
    }

    fn build(
        &self,
        surface: &mut S,
        entries: Vec<MenuEntry>,
        root: &S::Menu,
    ) -> Result<BuildReport> {
        MenuBuilder::new(surface, &self.inner.registry, self.inner.policy).build(entries, root)
    }

    fn surface_mut(&self) -> Result<RefMut<'_, S>> {
        self.inner
            .surface
            .try_borrow_mut()
            .map_err(|_| anyhow!("native surface is borrowed elsewhere"))
    }

    pub fn image_from_png(&self, bytes: &[u8]) -> Result<S::Image, ImageError> {
        self.inner.surface.borrow_mut().image_from_png(bytes)
    }

    pub fn write_png(&self, image: &S::Image, path: &Path) -> Result<()> {
        self.surface_mut()?
            .write_png(image, path)
            .with_context(|| format!("write image to {}", path.display()))
    }

    pub fn post(&self, notification: &Notification<'_, S::Image>) -> Result<()> {
        self.surface_mut()?
            .deliver_notification(notification)
            .with_context(|| format!("deliver notification '{}'", notification.title))
    }

    /// Hands control to the native event loop. Blocks until the app exits.
    /// The surface is not borrowed while the loop runs.
    pub fn run(&self) -> Result<()> {
        tracing::debug!(callbacks = self.registered_callbacks(), "entering run loop");
        let event_loop = self.surface_mut()?.event_loop()?;
        event_loop()
    }
}

impl App<RecordingSurface> {
    /// Simulates the user activating the item with `handle`.
    pub fn click(&self, handle: Handle) -> Result<()> {
        let dispatcher = self.surface().dispatcher()?;
        dispatcher.dispatch(handle);
        Ok(())
    }

    /// Activates the item at `path`, looked up in the main menu first and
    /// then in each status item's menu.
    pub fn click_path(&self, path: &[&str]) -> Result<()> {
        let (dispatcher, handle) = {
            let surface = self.surface();
            (surface.dispatcher()?, surface.find_action(path)?)
        };
        dispatcher.dispatch(handle);
        Ok(())
    }
}
