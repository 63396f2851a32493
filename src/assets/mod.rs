//! Asset loading
//!
//! - [`io`]: byte readers for local directories and HTTP roots
//! - [`loaders`]: format loaders (glTF)
//! - [`model`]: the scene-independent [`ModelAsset`]
//! - [`loader`]: the [`AssetLoader`] seam the viewer controller loads through

pub mod io;
pub mod loader;
pub mod loaders;
pub mod model;

pub use io::{AssetPath, AssetReader, AssetReaderVariant, FileAssetReader};
#[cfg(feature = "http")]
pub use io::HttpAssetReader;
pub use loader::{AssetLoader, GltfAssetLoader, ProgressReporter};
pub use loaders::GltfLoader;
pub use model::{ModelAsset, ModelNode};
