//! Vault-backed image asset repository.
//!
//! # Responsibility
//! - Implement `AssetStore` on a vault directory on disk.
//! - Name stored images with fresh UUIDs under `attachments/images/`.
//!
//! # Invariants
//! - Relative paths handed out or accepted never leave the vault root.
//! - Deleting a missing image succeeds.

use crate::store::{AssetStore, StoreError, StoreResult};
use log::{debug, info};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::fs;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

pub const IMAGES_DIR: &str = "attachments/images";
const DEFAULT_EXTENSION: &str = "png";
const ASSET_URL_PREFIX: &str = "asset://localhost/";

pub struct VaultAssetRepository {
    root: PathBuf,
}

impl VaultAssetRepository {
    /// Uses `root` as the vault directory, creating it when missing.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a vault-relative path.
    pub fn resolve(&self, relative_path: &str) -> StoreResult<PathBuf> {
        let normalized = relative_path.replace('\\', "/");
        let relative = Path::new(&normalized);
        let escapes = normalized.is_empty()
            || relative
                .components()
                .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StoreError::Rejected(format!(
                "asset path `{relative_path}` is outside the vault"
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetStore for VaultAssetRepository {
    fn save_image(&mut self, bytes: &[u8], filename: &str) -> StoreResult<String> {
        if bytes.is_empty() {
            return Err(StoreError::Rejected("image is empty".to_string()));
        }
        let relative_path = format!(
            "{IMAGES_DIR}/{}.{}",
            Uuid::new_v4(),
            image_extension(filename)
        );
        let target = self.resolve(&relative_path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
        info!(
            "event=image_store module=asset_repo status=ok bytes={}",
            bytes.len()
        );
        Ok(relative_path)
    }

    fn image_url(&self, relative_path: &str) -> String {
        let absolute = self.root.join(relative_path.replace('\\', "/"));
        let absolute = absolute.to_string_lossy().replace('\\', "/");
        format!(
            "{ASSET_URL_PREFIX}{}",
            utf8_percent_encode(&absolute, NON_ALPHANUMERIC)
        )
    }

    fn delete_image(&mut self, relative_path: &str) -> StoreResult<()> {
        let target = self.resolve(relative_path)?;
        match fs::remove_file(&target) {
            Ok(()) => {
                info!("event=image_delete module=asset_repo status=ok");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("event=image_delete module=asset_repo status=skip reason=missing");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Lowercased extension of `filename`, or `png` when absent or unusual.
fn image_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
