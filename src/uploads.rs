use std::path::{Path, PathBuf};

use actix_multipart::form::tempfile::TempFile;
use uuid::Uuid;

use crate::errors::AppError;

/// URL prefix under which stored media is exposed.
pub const PUBLIC_PREFIX: &str = "/static/uploads";

/// Extensions accepted for uploaded images. Content is not inspected.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Extract the (lowercased) extension of `filename` if it is on the
/// image allow-list.
pub fn image_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_IMAGE_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Filesystem-backed store for uploaded images.
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Persist an uploaded image under a server-generated random name,
    /// preserving the original (allow-listed) extension. Returns the public
    /// path the stored file is referenced by.
    pub fn store_image(&self, upload: &TempFile) -> Result<String, AppError> {
        let original = upload
            .file_name
            .as_deref()
            .ok_or_else(|| AppError::Validation("Uploaded file has no filename".into()))?;
        let ext = image_extension(original).ok_or_else(|| {
            AppError::Validation(format!("Unsupported image extension on '{}'", original))
        })?;

        let stored = format!("{}.{}", Uuid::new_v4(), ext);
        let dest = self.dir.join(&stored);
        std::fs::copy(upload.file.path(), &dest)
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

        Ok(format!("{}/{}", PUBLIC_PREFIX, stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn extension_allow_list() {
        assert_eq!(image_extension("photo.png").as_deref(), Some("png"));
        assert_eq!(image_extension("photo.JPEG").as_deref(), Some("jpeg"));
        assert_eq!(image_extension("archive.tar.gz"), None);
        assert_eq!(image_extension("script.exe"), None);
        assert_eq!(image_extension("noextension"), None);
    }

    #[test]
    fn stored_name_is_random_and_keeps_extension() {
        let workdir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(workdir.path()).unwrap();

        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"not really a png").unwrap();
        let upload = TempFile {
            file: tmp,
            content_type: None,
            file_name: Some("Profile Pic.PNG".to_string()),
            size: 16,
        };

        let public = store.store_image(&upload).unwrap();
        assert!(public.starts_with(PUBLIC_PREFIX));
        assert!(public.ends_with(".png"));
        assert!(!public.contains("Profile Pic"));

        let stored = workdir.path().join(public.rsplit('/').next().unwrap());
        assert_eq!(std::fs::read(stored).unwrap(), b"not really a png");
    }

    #[test]
    fn disallowed_extension_is_rejected() {
        let workdir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(workdir.path()).unwrap();

        let upload = TempFile {
            file: NamedTempFile::new().unwrap(),
            content_type: None,
            file_name: Some("payload.exe".to_string()),
            size: 0,
        };

        assert!(matches!(
            store.store_image(&upload),
            Err(AppError::Validation(_))
        ));
    }
}
