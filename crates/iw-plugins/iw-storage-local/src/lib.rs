//! # iw-storage-local
//!
//! Local filesystem implementation of `MediaStore` for post image
//! attachments. Content-addressable: the SHA-256 of the bytes names the
//! file, which deduplicates repeat uploads for free. Files are sharded two
//! levels deep to keep directories small, and a 250px WebP thumbnail is
//! generated on first save for listing pages.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::io::Reader as ImageReader;
use iw_core::traits::MediaStore;
use sha2::{Digest, Sha256};
use tokio::fs;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/static/uploads")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self {
            root_path: root,
            url_prefix,
        }
    }

    /// Generates a sharded path: "ab/cd/abcdef...hash"
    fn sharded_path(&self, hash: &str) -> PathBuf {
        let mut path = self.root_path.clone();
        path.push(&hash[0..2]);
        path.push(&hash[2..4]);
        path.push(hash);
        path
    }

    /// Internal helper to generate a 250px WebP thumbnail next to the
    /// original.
    fn generate_thumbnail(
        &self,
        img: &image::DynamicImage,
        source_path: &Path,
        hash: &str,
    ) -> anyhow::Result<()> {
        let thumb = img.thumbnail(250, 250);
        let mut thumb_path = source_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        thumb_path.push(format!("thumb_{hash}.webp"));

        thumb.save_with_format(thumb_path, image::ImageFormat::WebP)?;
        Ok(())
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload under its SHA-256 hash. A repeat upload of the same
    /// bytes is a no-op returning the same media id.
    async fn save_upload(&self, data: Vec<u8>, _content_type: &str) -> anyhow::Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(&data);
        let hash = format!("{:x}", hasher.finalize());

        let target_path = self.sharded_path(&hash);
        if fs::metadata(&target_path).await.is_ok() {
            return Ok(hash);
        }

        // Decode before anything touches the disk: a rejected upload must
        // leave no file that a retry of the same bytes would dedup against.
        let img = ImageReader::new(Cursor::new(data.as_slice()))
            .with_guessed_format()?
            .decode()?;

        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target_path, &data).await?;
        self.generate_thumbnail(&img, &target_path, &hash)?;

        Ok(hash)
    }

    fn media_url(&self, media_id: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.url_prefix,
            &media_id[0..2],
            &media_id[2..4],
            media_id
        )
    }

    fn thumbnail_url(&self, media_id: &str) -> String {
        format!(
            "{}/{}/{}/thumb_{}.webp",
            self.url_prefix,
            &media_id[0..2],
            &media_id[2..4],
            media_id
        )
    }
}
