//! Browser glue
//!
//! DOM-backed [`MountTarget`], window event listeners that detach through a
//! [`ListenerGuard`], and a `requestAnimationFrame` loop that drives the
//! controller.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::assets::AssetLoader;
use crate::errors::{Result, ViewerError};
use crate::viewer::{AnimationController, ListenerGuard, MountTarget};

/// Routes `log` output to the browser console and panics to `console.error`.
pub fn init_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(level).is_err() {
        log::debug!("Logger already installed");
    }
}

fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| ViewerError::Environment("no global window".into()))
}

fn js_error(context: &str, err: &wasm_bindgen::JsValue) -> ViewerError {
    ViewerError::Environment(format!("{context}: {err:?}"))
}

/// A DOM element the viewer renders into.
#[derive(Debug, Clone)]
pub struct ElementMount {
    element: web_sys::Element,
}

impl ElementMount {
    #[must_use]
    pub fn new(element: web_sys::Element) -> Self {
        Self { element }
    }

    /// Looks the element up by id; `None` if the page does not have it.
    #[must_use]
    pub fn find(id: &str) -> Option<Self> {
        let document = web_sys::window()?.document()?;
        document.get_element_by_id(id).map(Self::new)
    }

    #[must_use]
    pub fn element(&self) -> &web_sys::Element {
        &self.element
    }
}

impl MountTarget for ElementMount {
    fn is_attached(&self) -> bool {
        self.element.is_connected()
    }

    fn describe(&self) -> String {
        format!("<{} id=\"{}\">", self.element.tag_name().to_lowercase(), self.element.id())
    }
}

/// Adds `callback` as a window listener for `event`; dropping or detaching
/// the guard removes it.
pub fn window_listener(
    event: &'static str,
    callback: impl FnMut(web_sys::Event) + 'static,
) -> Result<ListenerGuard> {
    let window = window()?;
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(callback);
    window
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(|e| js_error(event, &e))?;

    Ok(ListenerGuard::new(event, move || {
        if let Err(err) =
            window.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        {
            log::warn!("Failed to remove '{event}' listener: {err:?}");
        }
        drop(closure);
    }))
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Calls [`AnimationController::frame`] on every animation frame until the
/// controller is torn down. The returned guard is registered with the
/// controller so teardown cancels the pending frame.
pub fn start_frame_loop<L: AssetLoader + 'static>(
    controller: &Rc<RefCell<AnimationController<L>>>,
) -> Result<()> {
    let window = window()?;
    let pending = Rc::new(Cell::new(None::<i32>));
    let callback: FrameCallback = Rc::new(RefCell::new(None));

    let tick = {
        let controller = Rc::clone(controller);
        let callback = Rc::clone(&callback);
        let pending = Rc::clone(&pending);
        let window = window.clone();
        move || {
            pending.set(None);
            let ran = controller
                .try_borrow_mut()
                .map(|mut c| c.frame())
                .unwrap_or(true);
            if !ran {
                callback.borrow_mut().take();
                return;
            }
            if let Some(next) = callback.borrow().as_ref() {
                match window.request_animation_frame(next.as_ref().unchecked_ref()) {
                    Ok(id) => pending.set(Some(id)),
                    Err(err) => log::error!("requestAnimationFrame failed: {err:?}"),
                }
            }
        }
    };
    *callback.borrow_mut() = Some(Closure::new(tick));

    if let Some(first) = callback.borrow().as_ref() {
        let id = window
            .request_animation_frame(first.as_ref().unchecked_ref())
            .map_err(|e| js_error("requestAnimationFrame", &e))?;
        pending.set(Some(id));
    }

    let guard = ListenerGuard::new("animation-frame", move || {
        if let Some(id) = pending.take()
            && let Err(err) = window.cancel_animation_frame(id)
        {
            log::warn!("cancelAnimationFrame failed: {err:?}");
        }
        callback.borrow_mut().take();
    });
    controller.borrow_mut().register_listener(guard);
    Ok(())
}
