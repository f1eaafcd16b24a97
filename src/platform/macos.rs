use std::{
    ffi::c_void,
    fs::OpenOptions,
    os::fd::AsRawFd,
    path::Path,
    sync::Once,
};

use anyhow::{anyhow, bail, Context, Result};
use cocoa::{
    appkit::{
        NSApp, NSApplication, NSApplicationActivationPolicyAccessory,
        NSApplicationActivationPolicyRegular, NSStatusBar,
    },
    base::{id, nil, BOOL, NO, YES},
    foundation::{NSAutoreleasePool, NSInteger, NSString, NSUInteger},
};
use objc::{
    class,
    declare::ClassDecl,
    msg_send,
    runtime::{Class, Object, Sel},
    sel, sel_impl,
};

use super::{EventLoop, ImageError, NativeSurface, Notification, StatusItemWidth};
use crate::config::ActivationPolicy;
use crate::menu::{Dispatcher, Handle, Modifiers, Shortcut};

// NSEventModifierFlags
const NS_SHIFT_KEY_MASK: NSUInteger = 1 << 17;
const NS_CONTROL_KEY_MASK: NSUInteger = 1 << 18;
const NS_ALTERNATE_KEY_MASK: NSUInteger = 1 << 19;
const NS_COMMAND_KEY_MASK: NSUInteger = 1 << 20;
const NS_FUNCTION_KEY_MASK: NSUInteger = 1 << 23;

const NS_BITMAP_IMAGE_FILE_TYPE_PNG: NSUInteger = 4;

const DISPATCHER_IVAR: &str = "dispatcher_ptr";

#[derive(Debug, Clone, Copy)]
pub struct NativeMenu(id);

#[derive(Debug, Clone, Copy)]
pub struct NativeItem(id);

/// An `NSImage`.
#[derive(Debug, Clone, Copy)]
pub struct Image(id);

/// [`NativeSurface`] backed by AppKit. Must be created and used on the main
/// thread.
pub struct AppKitSurface {
    app: id,
    target: id,
    status_items: Vec<id>,
    _pool: id,
}

impl AppKitSurface {
    pub fn new(activation: ActivationPolicy) -> Result<Self> {
        unsafe {
            let is_main: BOOL = msg_send![class!(NSThread), isMainThread];
            if is_main == NO {
                bail!("AppKit menus must be created on the main thread");
            }

            let pool = NSAutoreleasePool::new(nil);
            let app = NSApp();
            match activation {
                ActivationPolicy::Regular => {
                    app.setActivationPolicy_(NSApplicationActivationPolicyRegular);
                }
                ActivationPolicy::Accessory => {
                    app.setActivationPolicy_(NSApplicationActivationPolicyAccessory);
                }
            }

            let target: id = msg_send![target_class(), new];
            (*target).set_ivar::<*mut c_void>(DISPATCHER_IVAR, std::ptr::null_mut());

            Ok(Self {
                app,
                target,
                status_items: Vec::new(),
                _pool: pool,
            })
        }
    }
}

impl Drop for AppKitSurface {
    fn drop(&mut self) {
        unsafe {
            let ptr: *mut c_void = *(*self.target).get_ivar(DISPATCHER_IVAR);
            (*self.target).set_ivar::<*mut c_void>(DISPATCHER_IVAR, std::ptr::null_mut());
            if !ptr.is_null() {
                drop(Box::from_raw(ptr as *mut Dispatcher));
            }
        }
    }
}

impl NativeSurface for AppKitSurface {
    type Menu = NativeMenu;
    type Item = NativeItem;
    type Image = Image;

    fn connect(&mut self, dispatcher: Dispatcher) -> Result<()> {
        unsafe {
            let old: *mut c_void = *(*self.target).get_ivar(DISPATCHER_IVAR);
            if !old.is_null() {
                bail!("surface is already connected to a dispatcher");
            }
            let ptr = Box::into_raw(Box::new(dispatcher));
            (*self.target).set_ivar(DISPATCHER_IVAR, ptr as *mut c_void);
        }
        Ok(())
    }

    fn create_menu(&mut self, title: &str) -> Result<NativeMenu> {
        unsafe {
            let menu: id = msg_send![class!(NSMenu), alloc];
            let menu: id = msg_send![menu, initWithTitle: nsstring(title)];
            if menu == nil {
                bail!("NSMenu initWithTitle returned nil");
            }
            Ok(NativeMenu(menu))
        }
    }

    fn add_menu_item(
        &mut self,
        parent: &NativeMenu,
        title: &str,
        shortcut: Option<&Shortcut>,
        action: Option<Handle>,
    ) -> Result<NativeItem> {
        let tag = action
            .map(|h| NSInteger::try_from(h.raw()))
            .transpose()
            .map_err(|_| anyhow!("handle does not fit in a menu item tag"))?;

        unsafe {
            let key = shortcut.map(|s| s.key.as_str()).unwrap_or("");
            let item: id = msg_send![class!(NSMenuItem), alloc];
            let item: id = match tag {
                Some(_) => msg_send![item,
                    initWithTitle: nsstring(title)
                    action: sel!(onMenuItem:)
                    keyEquivalent: nsstring(key)],
                None => msg_send![item,
                    initWithTitle: nsstring(title)
                    action: std::ptr::null::<c_void>()
                    keyEquivalent: nsstring(key)],
            };
            if item == nil {
                bail!("NSMenuItem initWithTitle returned nil");
            }

            if let Some(shortcut) = shortcut {
                let mask = modifier_mask(shortcut.modifiers);
                let _: () = msg_send![item, setKeyEquivalentModifierMask: mask];
            }
            if let Some(tag) = tag {
                let _: () = msg_send![item, setTarget: self.target];
                let _: () = msg_send![item, setTag: tag];
            }

            let _: () = msg_send![parent.0, addItem: item];
            Ok(NativeItem(item))
        }
    }

    fn set_submenu(&mut self, item: &NativeItem, submenu: &NativeMenu) -> Result<()> {
        unsafe {
            let _: () = msg_send![item.0, setSubmenu: submenu.0];
        }
        Ok(())
    }

    fn set_main_menu(&mut self, root: &NativeMenu) -> Result<()> {
        unsafe {
            let _: () = msg_send![self.app, setMainMenu: root.0];
        }
        Ok(())
    }

    fn add_status_item(
        &mut self,
        width: StatusItemWidth,
        title: &str,
        highlight: bool,
        root: &NativeMenu,
    ) -> Result<()> {
        unsafe {
            let status_item: id =
                msg_send![NSStatusBar::systemStatusBar(nil), statusItemWithLength: width.length()];
            if status_item == nil {
                bail!("statusItemWithLength returned nil");
            }
            let _: id = msg_send![status_item, retain];

            let button: id = msg_send![status_item, button];
            let _: () = msg_send![button, setTitle: nsstring(title)];
            let highlight = if highlight { YES } else { NO };
            let _: () = msg_send![status_item, setHighlightMode: highlight];
            let _: () = msg_send![status_item, setMenu: root.0];

            self.status_items.push(status_item);
        }
        Ok(())
    }

    fn image_from_png(&mut self, bytes: &[u8]) -> Result<Image, ImageError> {
        unsafe {
            let data: id = msg_send![class!(NSData),
                dataWithBytes: bytes.as_ptr() as *const c_void
                length: bytes.len() as NSUInteger];
            if data == nil {
                return Err(ImageError::DecodeFailed);
            }
            let image: id = msg_send![class!(NSImage), alloc];
            let image: id = msg_send![image, initWithData: data];
            if image == nil {
                return Err(ImageError::DecodeFailed);
            }
            Ok(Image(image))
        }
    }

    fn write_png(&mut self, image: &Image, path: &Path) -> Result<()> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("path is not valid UTF-8: {}", path.display()))?;
        unsafe {
            let tiff: id = msg_send![image.0, TIFFRepresentation];
            if tiff == nil {
                bail!("image has no TIFF representation");
            }
            let rep: id = msg_send![class!(NSBitmapImageRep), imageRepWithData: tiff];
            if rep == nil {
                bail!("could not create bitmap representation");
            }
            let props: id = msg_send![class!(NSDictionary), dictionary];
            let png: id = msg_send![rep,
                representationUsingType: NS_BITMAP_IMAGE_FILE_TYPE_PNG
                properties: props];
            if png == nil {
                bail!("PNG encoding failed");
            }
            let ok: BOOL = msg_send![png, writeToFile: nsstring(path_str) atomically: YES];
            if ok == NO {
                bail!("writeToFile failed for {}", path.display());
            }
        }
        Ok(())
    }

    fn deliver_notification(&mut self, n: &Notification<'_, Image>) -> Result<()> {
        unsafe {
            let note: id = msg_send![class!(NSUserNotification), alloc];
            let note: id = msg_send![note, init];
            if note == nil {
                bail!("NSUserNotification init returned nil");
            }
            let _: () = msg_send![note, setTitle: nsstring(&n.title)];
            let _: () = msg_send![note, setSubtitle: nsstring(&n.subtitle)];
            let _: () = msg_send![note, setInformativeText: nsstring(&n.informative_text)];
            if let Some(image) = n.image {
                let _: () = msg_send![note, setContentImage: image.0];
            }
            if !n.identifier.is_empty() {
                let _: () = msg_send![note, setIdentifier: nsstring(&n.identifier)];
            }
            let has_action = if n.has_action_button() { YES } else { NO };
            let _: () = msg_send![note, setHasActionButton: has_action];
            if n.has_action_button() {
                let _: () = msg_send![note, setActionButtonTitle: nsstring(&n.action_button_title)];
            }
            if n.has_other_button() {
                let _: () = msg_send![note, setOtherButtonTitle: nsstring(&n.other_button_title)];
            }

            let center: id =
                msg_send![class!(NSUserNotificationCenter), defaultUserNotificationCenter];
            if center == nil {
                bail!("no default user notification center (is the app bundled?)");
            }
            let _: () = msg_send![center, deliverNotification: note];
        }
        Ok(())
    }

    fn event_loop(&mut self) -> Result<EventLoop> {
        let app = self.app;
        Ok(Box::new(move || -> Result<()> {
            unsafe {
                app.run();
            }
            Ok(())
        }))
    }
}

/// Asks AppKit to quit the application.
pub fn terminate() {
    unsafe {
        let app = NSApp();
        let _: () = msg_send![app, terminate: nil];
    }
}

/// Ignores SIGHUP and, when attached to a tty, sends stdout/stderr to `log_path`
/// so that closing the launching terminal does not kill a status bar app.
pub fn detach_from_terminal(log_path: &Path) -> Result<()> {
    unsafe {
        libc::signal(libc::SIGHUP, libc::SIG_IGN);

        let stdout_is_tty = libc::isatty(libc::STDOUT_FILENO) == 1;
        let stderr_is_tty = libc::isatty(libc::STDERR_FILENO) == 1;
        if !stdout_is_tty && !stderr_is_tty {
            return Ok(());
        }

        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .with_context(|| format!("open {}", log_path.display()))?;
        let _ = libc::dup2(f.as_raw_fd(), libc::STDOUT_FILENO);
        let _ = libc::dup2(f.as_raw_fd(), libc::STDERR_FILENO);
    }
    Ok(())
}

fn modifier_mask(modifiers: Modifiers) -> NSUInteger {
    let mut mask = 0;
    if modifiers.contains(Modifiers::CMD) || modifiers.contains(Modifiers::CMD_OR_CTRL) {
        mask |= NS_COMMAND_KEY_MASK;
    }
    if modifiers.contains(Modifiers::CTRL) {
        mask |= NS_CONTROL_KEY_MASK;
    }
    if modifiers.contains(Modifiers::ALT_OR_OPTION) {
        mask |= NS_ALTERNATE_KEY_MASK;
    }
    if modifiers.contains(Modifiers::FUNCTION) {
        mask |= NS_FUNCTION_KEY_MASK;
    }
    if modifiers.contains(Modifiers::SHIFT) {
        mask |= NS_SHIFT_KEY_MASK;
    }
    mask
}

unsafe fn nsstring(s: &str) -> id {
    NSString::alloc(nil).init_str(s)
}

fn target_class() -> *const Class {
    static ONCE: Once = Once::new();
    static mut CLS: *const Class = std::ptr::null();

    ONCE.call_once(|| unsafe {
        let ns_object = class!(NSObject);
        let Some(mut decl) = ClassDecl::new("GalliumMenuTarget", ns_object) else {
            // Registered by an earlier surface in this process.
            CLS = class!(GalliumMenuTarget);
            return;
        };
        decl.add_ivar::<*mut c_void>(DISPATCHER_IVAR);
        decl.add_method(
            sel!(onMenuItem:),
            on_menu_item as extern "C" fn(&Object, Sel, id),
        );
        CLS = decl.register();
    });

    unsafe { CLS }
}

/// Objective-C action for every leaf item: the item's tag is the handle.
extern "C" fn on_menu_item(this: &Object, _cmd: Sel, sender: id) {
    unsafe {
        let ptr: *mut c_void = *this.get_ivar(DISPATCHER_IVAR);
        if ptr.is_null() {
            tracing::warn!("menu activation after the surface was dropped");
            return;
        }
        let dispatcher = &*(ptr as *const Dispatcher);
        let tag: NSInteger = msg_send![sender, tag];
        let Ok(raw) = usize::try_from(tag) else {
            tracing::error!(tag, "menu item carries a negative tag");
            std::process::abort();
        };
        dispatcher.dispatch(Handle::from_raw(raw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmd_and_cmdctrl_both_map_to_command() {
        assert_eq!(modifier_mask(Modifiers::CMD), NS_COMMAND_KEY_MASK);
        assert_eq!(modifier_mask(Modifiers::CMD_OR_CTRL), NS_COMMAND_KEY_MASK);
    }

    #[test]
    fn combined_mask() {
        let mask = modifier_mask(Modifiers::CMD | Modifiers::SHIFT | Modifiers::ALT_OR_OPTION);
        assert_eq!(
            mask,
            NS_COMMAND_KEY_MASK | NS_SHIFT_KEY_MASK | NS_ALTERNATE_KEY_MASK
        );
    }
}
