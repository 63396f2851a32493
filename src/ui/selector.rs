//! Generic single-select dropdown
//!
//! A controlled widget: `value` is owned by whoever renders it (for the
//! viewer, the active descriptor), and picking an option only reports the
//! chosen value back. Mouse-only; the panel closes on selection or on any
//! click outside of it.

use serde::Serialize;

use crate::viewer::{AnimationDescriptor, ViewerStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl From<&AnimationDescriptor> for SelectOption {
    fn from(descriptor: &AnimationDescriptor) -> Self {
        Self::new(&descriptor.id, &descriptor.display_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dropdown {
    options: Vec<SelectOption>,
    value: Option<String>,
    open: bool,
    disabled: bool,
}

impl Dropdown {
    #[must_use]
    pub fn new(options: Vec<SelectOption>) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Options, value and disabled flag taken from a controller snapshot.
    /// The dropdown is disabled while a load is in flight.
    #[must_use]
    pub fn from_status(status: &ViewerStatus) -> Self {
        Self {
            options: status.descriptors.iter().map(SelectOption::from).collect(),
            value: status.active_animation.clone(),
            open: false,
            disabled: status.is_loading,
        }
    }

    /// Refreshes the controlled state, keeping the open flag unless the
    /// widget became disabled.
    pub fn sync(&mut self, status: &ViewerStatus) {
        self.options = status.descriptors.iter().map(SelectOption::from).collect();
        self.value.clone_from(&status.active_animation);
        self.disabled = status.is_loading;
        if self.disabled {
            self.open = false;
        }
    }

    #[must_use]
    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    /// Label shown on the closed control.
    #[must_use]
    pub fn selected_label(&self) -> Option<&str> {
        let value = self.value.as_deref()?;
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.open = false;
        }
    }

    /// Click on the control itself.
    pub fn toggle(&mut self) {
        if !self.disabled {
            self.open = !self.open;
        }
    }

    /// Click on the option at `index`. Closes the panel and returns the
    /// value to hand to the change callback. The dropdown's own `value` is
    /// left alone; the owner feeds it back.
    pub fn select(&mut self, index: usize) -> Option<String> {
        if self.disabled || !self.open {
            return None;
        }
        let option = self.options.get(index)?;
        self.open = false;
        Some(option.value.clone())
    }

    /// Click anywhere outside the widget.
    pub fn handle_outside_click(&mut self) {
        self.open = false;
    }
}
