use std::{cell::RefCell, rc::Rc};

use super::registry::{CallbackRegistry, Handle};

/// Entry point native code calls when a leaf item is activated.
///
/// Shares the registry with the builder. Both must stay on the UI thread, so
/// this type is `!Send`.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Rc<RefCell<CallbackRegistry>>,
}

impl Dispatcher {
    pub fn new(registry: Rc<RefCell<CallbackRegistry>>) -> Self {
        Self { registry }
    }

    /// Invokes the callback behind `handle` synchronously.
    ///
    /// # Panics
    ///
    /// Panics if `handle` was never issued by the registry. Native code only
    /// ever receives handles from the builder, so a miss means the accounting
    /// between the two is broken.
    pub fn dispatch(&self, handle: Handle) {
        // The borrow ends before the call so callbacks may rebuild menus.
        let callback = self.registry.borrow().get(handle);
        let Some(callback) = callback else {
            tracing::error!(%handle, "menu activation for unregistered handle");
            panic!("menu dispatch: handle {handle} was never registered");
        };
        tracing::trace!(%handle, "dispatching menu callback");
        callback();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn dispatch_invokes_only_the_matching_callback() {
        let registry = Rc::new(RefCell::new(CallbackRegistry::new()));
        let counts = Rc::new([Cell::new(0), Cell::new(0), Cell::new(0)]);
        let handles = (0..3)
            .map(|i| {
                let counts = counts.clone();
                registry
                    .borrow_mut()
                    .register(Rc::new(move || counts[i].set(counts[i].get() + 1)))
            })
            .collect::<Vec<_>>();

        let dispatcher = Dispatcher::new(registry);
        dispatcher.dispatch(handles[1]);

        assert_eq!(counts[0].get(), 0);
        assert_eq!(counts[1].get(), 1);
        assert_eq!(counts[2].get(), 0);
    }

    #[test]
    #[should_panic(expected = "never registered")]
    fn dispatch_of_unissued_handle_panics() {
        let registry = Rc::new(RefCell::new(CallbackRegistry::new()));
        registry.borrow_mut().register(Rc::new(|| {}));
        Dispatcher::new(registry).dispatch(Handle::from_raw(7));
    }

    #[test]
    fn callback_may_register_while_dispatching() {
        let registry = Rc::new(RefCell::new(CallbackRegistry::new()));
        let inner = registry.clone();
        let handle = registry.borrow_mut().register(Rc::new(move || {
            inner.borrow_mut().register(Rc::new(|| {}));
        }));

        Dispatcher::new(registry.clone()).dispatch(handle);
        assert_eq!(registry.borrow().len(), 2);
    }
}
