pub mod io;
pub mod loader;
pub mod storage;

pub use io::{AssetReader, AssetReaderVariant, FileAssetReader, MemoryAssetReader};
#[cfg(feature = "http")]
pub use io::HttpAssetReader;
pub use loader::{AssetLoader, AssetRequest, Completion, FetchTicket};
pub use storage::{ClipCache, ClipStatus};

use crate::errors::Result;

/// True for `http://` and `https://` sources.
#[must_use]
pub fn is_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Joins a bundle-relative asset name onto a base directory or URL.
///
/// Absolute names and URLs are returned as-is (normalized). `.` segments are
/// dropped and `..` pops the previous segment.
#[must_use]
pub fn join_path(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return normalize(base);
    }
    if base.is_empty() || is_url(relative) || relative.starts_with('/') {
        return normalize(relative);
    }
    normalize(&format!("{}/{}", base.trim_end_matches('/'), relative))
}

fn normalize(path: &str) -> String {
    let (prefix, rest) = if let Some(idx) = path.find("://") {
        path.split_at(idx + 3)
    } else if let Some(rest) = path.strip_prefix('/') {
        ("/", rest)
    } else {
        ("", path)
    };

    let mut parts: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if prefix.is_empty() {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }
    format!("{prefix}{}", parts.join("/"))
}

/// Decoded RGBA8 texture ready for upload.
#[derive(Debug, Clone)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub premultiplied: bool,
}

impl TextureImage {
    /// Decodes PNG/JPEG bytes, optionally premultiplying alpha.
    pub fn decode(bytes: &[u8], premultiply: bool) -> Result<Self> {
        let image = image::load_from_memory(bytes)?.into_rgba8();
        let (width, height) = image.dimensions();
        let mut rgba = image.into_raw();
        if premultiply {
            for px in rgba.chunks_exact_mut(4) {
                let a = u16::from(px[3]);
                for c in &mut px[..3] {
                    *c = ((u16::from(*c) * a + 127) / 255) as u8;
                }
            }
        }
        Ok(Self {
            width,
            height,
            rgba,
            premultiplied: premultiply,
        })
    }
}
