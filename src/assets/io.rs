//! Asset IO
//!
//! Readers return the raw bytes of a file relative to a root (a directory or
//! a base URL). All reads are non-blocking from the caller's point of view:
//! local files are read on a helper thread, HTTP goes through `ehttp`.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::AssetError;

/// Location of a model file: a root plus a file name relative to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetPath {
    pub root: String,
    pub file: String,
}

impl AssetPath {
    #[must_use]
    pub fn new(root: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            file: file.into(),
        }
    }

    /// `{root}/{id}.{format}`
    #[must_use]
    pub fn for_animation(root: &str, animation_id: &str, format: &str) -> Self {
        Self::new(root, format!("{animation_id}.{format}"))
    }

    /// File name without its extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        self.file
            .rsplit_once('.')
            .map_or(self.file.as_str(), |(stem, _)| stem)
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        is_remote(&self.root)
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.root.trim_end_matches('/');
        if root.is_empty() {
            write!(f, "{}", self.file)
        } else {
            write!(f, "{root}/{}", self.file)
        }
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Asynchronous byte reader for a family of assets.
pub trait AssetReader {
    fn read_bytes(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>>;
}

/// Local file reader
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            root_path: path.as_ref().to_path_buf(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    #[cfg(not(target_arch = "wasm32"))]
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.root_path.join(uri);
        let display = path.display().to_string();

        let (tx, rx) = flume::bounded(1);
        std::thread::spawn(move || {
            let _ = tx.send(std::fs::read(&path));
        });

        match rx.recv_async().await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(display))
            }
            Ok(Err(err)) => Err(AssetError::Io {
                path: display,
                message: err.to_string(),
            }),
            Err(_) => Err(AssetError::Cancelled),
        }
    }

    #[cfg(target_arch = "wasm32")]
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>, AssetError> {
        Err(AssetError::Io {
            path: self.root_path.join(uri).display().to_string(),
            message: "local files cannot be read from the browser".to_string(),
        })
    }
}

/// HTTP reader
#[cfg(feature = "http")]
pub struct HttpAssetReader {
    root_url: url::Url,
}

#[cfg(feature = "http")]
impl HttpAssetReader {
    pub fn new(url_str: &str) -> Result<Self, AssetError> {
        let root_url =
            url::Url::parse(url_str).map_err(|e| AssetError::Network(e.to_string()))?;
        Ok(Self::with_root(root_url))
    }

    /// Reader for a root given relative to `base` (usually the page URL),
    /// resolved the way a browser resolves a relative link.
    pub fn relative_to(base: &str, root: &str) -> Result<Self, AssetError> {
        let root_url = url::Url::parse(base)
            .and_then(|base| base.join(root))
            .map_err(|e| {
                AssetError::Network(format!("cannot resolve '{root}' against '{base}': {e}"))
            })?;
        Ok(Self::with_root(root_url))
    }

    fn with_root(mut root_url: url::Url) -> Self {
        // Url::join replaces the last segment unless the base ends with '/'.
        if !root_url.path().ends_with('/') {
            let path = format!("{}/", root_url.path());
            root_url.set_path(&path);
        }
        Self { root_url }
    }

    #[inline]
    #[must_use]
    pub fn root_url(&self) -> &url::Url {
        &self.root_url
    }
}

#[cfg(feature = "http")]
impl AssetReader for HttpAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>, AssetError> {
        let url = self
            .root_url
            .join(uri)
            .map_err(|e| AssetError::Network(e.to_string()))?;

        let response = ehttp::fetch_async(ehttp::Request::get(url.as_str()))
            .await
            .map_err(AssetError::Network)?;

        if response.status == 404 {
            return Err(AssetError::NotFound(url.to_string()));
        }
        if !response.ok {
            return Err(AssetError::Http {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response.bytes)
    }
}

/// Reader chosen from the shape of the root: URL roots use HTTP, anything
/// else is a local directory. In the browser a relative root is resolved
/// against the page URL and fetched over HTTP.
#[derive(Clone)]
pub enum AssetReaderVariant {
    File(Arc<FileAssetReader>),
    #[cfg(feature = "http")]
    Http(Arc<HttpAssetReader>),
}

impl AssetReaderVariant {
    pub fn from_source(source: &str) -> Result<Self, AssetError> {
        if is_remote(source) {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(Arc::new(HttpAssetReader::new(source)?)))
            }
            #[cfg(not(feature = "http"))]
            {
                Err(AssetError::Network(format!(
                    "cannot fetch {source}: the `http` feature is disabled"
                )))
            }
        } else {
            #[cfg(all(target_arch = "wasm32", feature = "http"))]
            {
                let base = page_url().ok_or_else(|| {
                    AssetError::Network(format!("no page URL to resolve '{source}' against"))
                })?;
                Ok(Self::Http(Arc::new(HttpAssetReader::relative_to(&base, source)?)))
            }
            #[cfg(not(all(target_arch = "wasm32", feature = "http")))]
            {
                Ok(Self::File(Arc::new(FileAssetReader::new(source))))
            }
        }
    }

    pub async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>, AssetError> {
        match self {
            Self::File(r) => r.read_bytes(uri).await,
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_bytes(uri).await,
        }
    }
}

#[cfg(all(target_arch = "wasm32", feature = "http"))]
fn page_url() -> Option<String> {
    web_sys::window()?.location().href().ok()
}
