//! Mount surface and event-listener lifetimes
//!
//! The viewer draws into a surface owned by the host UI (a DOM element in
//! the browser). The host can remove that surface at any time, including
//! while a load is in flight, so the controller re-checks it before
//! touching the scene.

use std::cell::Cell;
use std::rc::Rc;

/// The surface the viewer is mounted into.
pub trait MountTarget {
    /// Whether the surface still exists.
    fn is_attached(&self) -> bool;

    fn describe(&self) -> String {
        "mount target".to_string()
    }
}

/// A mount target without a real surface, detachable through
/// [`MountHandle`]. Used natively and in tests.
#[derive(Debug, Clone)]
pub struct HeadlessMount {
    name: String,
    attached: Rc<Cell<bool>>,
}

impl HeadlessMount {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attached: Rc::new(Cell::new(true)),
        }
    }

    /// A handle the host keeps to remove the surface later.
    #[must_use]
    pub fn handle(&self) -> MountHandle {
        MountHandle {
            attached: Rc::clone(&self.attached),
        }
    }
}

impl MountTarget for HeadlessMount {
    fn is_attached(&self) -> bool {
        self.attached.get()
    }

    fn describe(&self) -> String {
        format!("headless surface '{}'", self.name)
    }
}

#[derive(Debug, Clone)]
pub struct MountHandle {
    attached: Rc<Cell<bool>>,
}

impl MountHandle {
    pub fn detach(&self) {
        self.attached.set(false);
    }
}

/// Keeps an event listener registered until detached or dropped.
///
/// Listeners the viewer installs on the host (resize, keyboard,
/// outside-click) are handed to the controller as guards so teardown can
/// remove all of them.
pub struct ListenerGuard {
    label: String,
    detach: Option<Box<dyn FnOnce()>>,
}

impl ListenerGuard {
    pub fn new(label: impl Into<String>, detach: impl FnOnce() + 'static) -> Self {
        Self {
            label: label.into(),
            detach: Some(Box::new(detach)),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Removes the listener now.
    pub fn detach(mut self) {
        self.run_detach();
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            log::debug!("Removing '{}' listener", self.label);
            detach();
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.run_detach();
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("label", &self.label)
            .field("attached", &self.detach.is_some())
            .finish()
    }
}
