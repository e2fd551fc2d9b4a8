//! # File Store
//!
//! Uploaded files on local disk, one directory per bucket:
//!
//! - `products`: product images, readable by anyone
//! - `payment_proofs`: proof-of-payment images, readable by admins only
//!
//! Object paths are relative, slash-separated and checked before they touch
//! the filesystem. Each bucket has its own extension allow-list.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("file type .{0} is not allowed")]
    UnsupportedExtension(String),

    #[error("invalid file path")]
    InvalidPath,

    #[error("file is empty")]
    Empty,

    #[error("file not found")]
    NotFound,

    #[error("file store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Products,
    PaymentProofs,
}

impl Bucket {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Bucket::Products => "products",
            Bucket::PaymentProofs => "payment_proofs",
        }
    }

    #[must_use]
    pub fn is_public(self) -> bool {
        matches!(self, Bucket::Products)
    }

    #[must_use]
    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            Bucket::Products => &["jpg", "jpeg", "png", "webp", "gif"],
            Bucket::PaymentProofs => &["jpg", "jpeg", "png", "webp", "pdf"],
        }
    }

    /// Lowercased extension if this bucket accepts it.
    pub fn check_extension(self, ext: &str) -> Result<String, FileError> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        if self.allowed_extensions().contains(&ext.as_str()) {
            Ok(ext)
        } else {
            Err(FileError::UnsupportedExtension(ext))
        }
    }
}

/// Content type for a stored object, from its extension.
#[must_use]
pub fn content_type(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// `<uuid>.<ext>` for a product image.
#[must_use]
pub fn product_object_name(id: &uuid::Uuid, ext: &str) -> String {
    format!("{id}.{ext}")
}

/// `<user>/<transaction>/<upload>.<ext>` for a payment proof. Every upload
/// gets its own name.
#[must_use]
pub fn proof_object_name(
    user_id: u64,
    transaction_id: &str,
    upload_id: &uuid::Uuid,
    ext: &str,
) -> String {
    format!("{user_id}/{transaction_id}/{upload_id}.{ext}")
}

/// Reject anything but a plain relative path of normal components.
pub fn validate_object_path(path: &str) -> Result<&Path, FileError> {
    if path.is_empty() || path.contains('\\') || path.contains('\0') {
        return Err(FileError::InvalidPath);
    }
    let candidate = Path::new(path);
    let all_normal = candidate
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !all_normal || path.split('/').any(str::is_empty) {
        return Err(FileError::InvalidPath);
    }
    Ok(candidate)
}

/// Bucketed files under one root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, bucket: Bucket, object: &str) -> Result<PathBuf, FileError> {
        let relative = validate_object_path(object)?;
        Ok(self.root.join(bucket.name()).join(relative))
    }

    /// Write an object, replacing any previous one at the same path.
    pub async fn put(&self, bucket: Bucket, object: &str, bytes: &[u8]) -> Result<(), FileError> {
        if bytes.is_empty() {
            return Err(FileError::Empty);
        }
        let ext = object.rsplit_once('.').map(|(_, e)| e).unwrap_or_default();
        bucket.check_extension(ext)?;
        let target = self.resolve(bucket, object)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, bytes).await?;
        Ok(())
    }

    pub async fn get(&self, bucket: Bucket, object: &str) -> Result<Vec<u8>, FileError> {
        let target = self.resolve(bucket, object)?;
        match fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FileError::NotFound),
            Err(e) => Err(FileError::Io(e)),
        }
    }
}
