//! UI-side models. Rendering is left to the host; these types only hold the
//! state a widget needs and translate clicks into controller commands.

pub mod selector;

pub use selector::{Dropdown, SelectOption};
