use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::OnceLock;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use rustc_hash::FxHashMap;
use tokio::runtime::{Builder, Runtime};

use crate::errors::{Result, WidgetError};

/// Lazily created runtime that backs blocking filesystem reads.
fn asset_runtime() -> Result<&'static Runtime> {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime);
    }
    let runtime = Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("live2d-asset-io")
        .build()?;
    Ok(RUNTIME.get_or_init(|| runtime))
}

/// Async byte source for model bundles.
///
/// Futures are `'static` and local: they are driven by the widget's
/// single-threaded executor and must not borrow the reader.
pub trait AssetReader {
    fn read_bytes(&self, path: &str) -> LocalBoxFuture<'static, Result<Vec<u8>>>;
}

/// Reads assets from the local filesystem.
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    fn read_bytes(&self, path: &str) -> LocalBoxFuture<'static, Result<Vec<u8>>> {
        let full_path = self.root_path.join(path.trim_start_matches("./"));
        let display = path.to_string();
        let runtime = match asset_runtime() {
            Ok(runtime) => runtime,
            Err(err) => return futures::future::ready(Err(err)).boxed_local(),
        };
        let handle = runtime.spawn(async move { tokio::fs::read(&full_path).await });
        async move {
            match handle.await? {
                Ok(data) => Ok(data),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    Err(WidgetError::AssetNotFound(display))
                }
                Err(err) => Err(err.into()),
            }
        }
        .boxed_local()
    }
}

/// Fetches assets over HTTP, bypassing caches.
#[cfg(feature = "http")]
pub struct HttpAssetReader {
    root_url: url::Url,
}

#[cfg(feature = "http")]
impl HttpAssetReader {
    pub fn new(url_str: &str) -> Result<Self> {
        let url = url::Url::parse(url_str)?;
        let root_url = if url.path().ends_with('/') {
            url
        } else {
            let mut u = url.clone();
            if let Ok(mut segments) = u.path_segments_mut() {
                segments.pop();
                segments.push("");
            }
            u
        };
        Ok(Self { root_url })
    }

    #[inline]
    #[must_use]
    pub fn root_url(&self) -> &url::Url {
        &self.root_url
    }
}

#[cfg(feature = "http")]
impl AssetReader for HttpAssetReader {
    fn read_bytes(&self, path: &str) -> LocalBoxFuture<'static, Result<Vec<u8>>> {
        let url = match self.root_url.join(path) {
            Ok(url) => url,
            Err(err) => return futures::future::ready(Err(err.into())).boxed_local(),
        };
        let mut request = ehttp::Request::get(url.as_str());
        request.headers.insert("Cache-Control", "no-cache");
        let display = url.to_string();
        async move {
            let response = ehttp::fetch_async(request)
                .await
                .map_err(|reason| WidgetError::FetchFailed {
                    path: display.clone(),
                    reason,
                })?;
            if response.status == 404 {
                return Err(WidgetError::AssetNotFound(display));
            }
            if !response.ok {
                return Err(WidgetError::HttpResponseError {
                    status: response.status,
                });
            }
            Ok(response.bytes)
        }
        .boxed_local()
    }
}

/// In-memory bundle keyed by normalized path.
#[derive(Default)]
pub struct MemoryAssetReader {
    files: RefCell<FxHashMap<String, Rc<[u8]>>>,
}

impl MemoryAssetReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = bytes.into();
        self.files
            .borrow_mut()
            .insert(Self::normalize(path), Rc::from(bytes));
    }

    pub fn remove(&self, path: &str) -> bool {
        self.files.borrow_mut().remove(&Self::normalize(path)).is_some()
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.borrow().contains_key(&Self::normalize(path))
    }

    fn normalize(path: &str) -> String {
        super::join_path("", path)
    }
}

impl AssetReader for MemoryAssetReader {
    fn read_bytes(&self, path: &str) -> LocalBoxFuture<'static, Result<Vec<u8>>> {
        let result = self
            .files
            .borrow()
            .get(&Self::normalize(path))
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| WidgetError::AssetNotFound(path.to_string()));
        futures::future::ready(result).boxed_local()
    }
}

/// Picks a reader from the configured source string.
#[derive(Clone)]
pub enum AssetReaderVariant {
    File(Rc<FileAssetReader>),
    #[cfg(feature = "http")]
    Http(Rc<HttpAssetReader>),
    Memory(Rc<MemoryAssetReader>),
}

impl AssetReaderVariant {
    /// Creates an HTTP reader for URLs and a file reader for everything else.
    pub fn from_source(source: &str) -> Result<Self> {
        if super::is_url(source) {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(Rc::new(HttpAssetReader::new(source)?)))
            }
            #[cfg(not(feature = "http"))]
            {
                Err(WidgetError::Config(
                    "HTTP feature is not enabled. Enable it with `features = [\"http\"]`".into(),
                ))
            }
        } else {
            Ok(Self::File(Rc::new(FileAssetReader::new(source))))
        }
    }

    /// Last path component of a source string.
    #[must_use]
    pub fn source_filename(source: &str) -> &str {
        if super::is_url(source) {
            source.rsplit('/').next().unwrap_or(source)
        } else {
            Path::new(source)
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(source)
        }
    }
}

impl AssetReader for AssetReaderVariant {
    fn read_bytes(&self, path: &str) -> LocalBoxFuture<'static, Result<Vec<u8>>> {
        match self {
            Self::File(r) => r.read_bytes(path),
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_bytes(path),
            Self::Memory(r) => r.read_bytes(path),
        }
    }
}
