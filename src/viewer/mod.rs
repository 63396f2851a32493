//! Animation viewer: catalog, playback state and the lifecycle controller.

pub mod catalog;
pub mod controller;
pub mod diagnostics;
pub mod mount;
pub mod normalize;
pub mod playback;
pub mod token;

pub use catalog::{AnimationCatalog, AnimationDescriptor};
pub use controller::{AnimationController, ControllerState, LoadEvent, ViewerStatus};
pub use diagnostics::{DiagnosticEntry, DiagnosticLevel, DiagnosticLog};
pub use mount::{HeadlessMount, ListenerGuard, MountHandle, MountTarget};
pub use normalize::{Normalization, fit_scale, normalize_model};
pub use playback::PlaybackState;
pub use token::{RequestToken, TokenGenerator};
