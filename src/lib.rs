#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod assets;
pub mod config;
pub mod errors;
pub mod scene;
pub mod ui;
pub mod utils;
pub mod viewer;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use animation::{AnimationAction, AnimationClip, AnimationMixer, Binder, LoopMode};
pub use assets::{AssetLoader, AssetPath, GltfAssetLoader, ModelAsset, ProgressReporter};
pub use config::{AnimationEntry, ViewerConfig};
pub use errors::{AssetError, Result, SetupError, ViewerError};
pub use scene::{Node, Scene};
pub use ui::{Dropdown, SelectOption};
pub use viewer::{
    AnimationController, AnimationDescriptor, ControllerState, HeadlessMount, ListenerGuard,
    MountTarget, ViewerStatus,
};
