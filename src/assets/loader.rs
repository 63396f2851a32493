use futures::future::{FutureExt, LocalBoxFuture};

use crate::assets::io::{AssetPath, AssetReaderVariant};
use crate::assets::loaders::GltfLoader;
use crate::assets::model::ModelAsset;
use crate::errors::AssetError;

/// Receives load progress as a fraction in `[0, 1]`.
pub struct ProgressReporter {
    sink: Option<Box<dyn Fn(f32)>>,
}

impl ProgressReporter {
    pub fn new(sink: impl Fn(f32) + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
        }
    }

    /// A reporter that drops every update.
    #[must_use]
    pub fn silent() -> Self {
        Self { sink: None }
    }

    pub fn report(&self, fraction: f32) {
        if let Some(sink) = &self.sink {
            sink(fraction.clamp(0.0, 1.0));
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("silent", &self.sink.is_none())
            .finish()
    }
}

/// Produces model assets for the viewer.
///
/// Loads are started from the UI thread and polled on it; the returned
/// future does not need to be `Send`.
pub trait AssetLoader {
    fn load(
        &self,
        path: &AssetPath,
        progress: ProgressReporter,
    ) -> LocalBoxFuture<'static, Result<ModelAsset, AssetError>>;
}

/// Loads glTF models from a directory or a base URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfAssetLoader;

impl GltfAssetLoader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AssetLoader for GltfAssetLoader {
    fn load(
        &self,
        path: &AssetPath,
        progress: ProgressReporter,
    ) -> LocalBoxFuture<'static, Result<ModelAsset, AssetError>> {
        let path = path.clone();
        async move {
            let reader = AssetReaderVariant::from_source(&path.root)?;
            GltfLoader::load_async(&reader, &path.file, &progress).await
        }
        .boxed_local()
    }
}
