//! The local OCI image store.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ImageError, Result};

/// A parsed image reference.
///
/// `registry.example.com/library/alpine:3.19@sha256:...` splits into the
/// repository path (used as the storage directory) and the tag; any digest
/// suffix is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Repository path, possibly including a registry prefix.
    pub repository: String,
    /// Tag, defaulting to `latest`.
    pub tag: String,
}

impl ImageReference {
    /// Parses a user-supplied reference string.
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        // Drop any @digest suffix.
        let reference = reference
            .split_once('@')
            .map_or(reference, |(name, _)| name);

        // A colon after the last slash separates the tag.
        let slash = reference.rfind('/').map_or(0, |i| i + 1);
        match reference[slash..].rsplit_once(':') {
            Some((name, tag)) if !tag.is_empty() => Self {
                repository: format!("{}{name}", &reference[..slash]),
                tag: tag.to_owned(),
            },
            _ => Self {
                repository: reference.to_owned(),
                tag: "latest".to_owned(),
            },
        }
    }
}

/// Manages the on-disk store of pulled images.
///
/// Layout: one OCI image layout directory per repository path under the
/// store root.
#[derive(Debug)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Opens or initializes the store at the given root.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| ImageError::Io {
            path: root.clone(),
            source: e,
        })?;
        tracing::debug!(path = %root.display(), "image store opened");
        Ok(Self { root })
    }

    /// Directory holding the OCI layout for a reference.
    #[must_use]
    pub fn image_dir(&self, reference: &ImageReference) -> PathBuf {
        self.root.join(&reference.repository)
    }

    /// Pulls an image from its registry into the store as an OCI layout.
    ///
    /// Delegates the transfer to `skopeo copy`, then validates the
    /// resulting layout.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::MissingTool`] if `skopeo` is not installed,
    /// [`ImageError::Preparation`] if the copy fails, or
    /// [`ImageError::InvalidLayout`] if the result is malformed.
    pub fn pull(&self, reference: &str) -> Result<PathBuf> {
        let skopeo = which::which("skopeo").map_err(|_| ImageError::MissingTool {
            tool: "skopeo",
        })?;
        let parsed = ImageReference::parse(reference);
        let dir = self.image_dir(&parsed);
        std::fs::create_dir_all(&dir).map_err(|e| ImageError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let src = format!("docker://{}:{}", parsed.repository, parsed.tag);
        let dest = format!("oci:{}:{}", dir.display(), parsed.tag);
        tracing::info!(%src, %dest, "pulling image");

        let output = Command::new(skopeo)
            .args(["copy", &src, &dest])
            .output()
            .map_err(|e| ImageError::Io {
                path: dir.clone(),
                source: e,
            })?;
        if !output.status.success() {
            return Err(ImageError::Preparation {
                image: reference.to_owned(),
                message: format!(
                    "skopeo copy failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        validate_layout(&dir)?;
        tracing::info!(image = reference, path = %dir.display(), "image pulled");
        Ok(dir)
    }

    /// Returns the validated layout directory for a reference already in
    /// the store.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Preparation`] if the image has not been
    /// pulled, or [`ImageError::InvalidLayout`] if its layout is broken.
    pub fn lookup(&self, reference: &str) -> Result<(PathBuf, ImageReference)> {
        let parsed = ImageReference::parse(reference);
        let dir = self.image_dir(&parsed);
        if !dir.is_dir() {
            return Err(ImageError::Preparation {
                image: reference.to_owned(),
                message: format!("image not present in store, run `pull {reference}` first"),
            });
        }
        validate_layout(&dir)?;
        Ok((dir, parsed))
    }

    /// Lists the repository names present in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store root cannot be read.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| ImageError::Io {
            path: self.root.clone(),
            source: e,
        })?;
        let mut images = Vec::new();
        for entry in entries.flatten() {
            if entry.path().is_dir() {
                images.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        images.sort();
        Ok(images)
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Checks the three OCI layout markers: `index.json`, `oci-layout`, and
/// the `blobs/sha256` content store.
pub fn validate_layout(dir: &Path) -> Result<()> {
    if !dir.join("index.json").is_file() {
        return Err(ImageError::InvalidLayout {
            path: dir.to_path_buf(),
            missing: "index.json",
        });
    }
    if !dir.join("oci-layout").is_file() {
        return Err(ImageError::InvalidLayout {
            path: dir.to_path_buf(),
            missing: "oci-layout",
        });
    }
    if !dir.join("blobs").join("sha256").is_dir() {
        return Err(ImageError::InvalidLayout {
            path: dir.to_path_buf(),
            missing: "blobs/sha256",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_name_defaults_to_latest() {
        let r = ImageReference::parse("alpine");
        assert_eq!(r.repository, "alpine");
        assert_eq!(r.tag, "latest");
    }

    #[test]
    fn parse_name_with_tag() {
        let r = ImageReference::parse("alpine:3.19");
        assert_eq!(r.repository, "alpine");
        assert_eq!(r.tag, "3.19");
    }

    #[test]
    fn parse_registry_with_port_keeps_port_in_repository() {
        let r = ImageReference::parse("registry.local:5000/team/app");
        assert_eq!(r.repository, "registry.local:5000/team/app");
        assert_eq!(r.tag, "latest");
    }

    #[test]
    fn parse_drops_digest_suffix() {
        let r = ImageReference::parse("alpine:3.19@sha256:abcdef");
        assert_eq!(r.repository, "alpine");
        assert_eq!(r.tag, "3.19");
    }

    fn write_layout(dir: &Path) {
        std::fs::write(dir.join("index.json"), "{}").expect("index");
        std::fs::write(dir.join("oci-layout"), "{}").expect("layout");
        std::fs::create_dir_all(dir.join("blobs/sha256")).expect("blobs");
    }

    #[test]
    fn validate_layout_accepts_complete_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_layout(dir.path());
        validate_layout(dir.path()).expect("valid layout");
    }

    #[test]
    fn validate_layout_reports_missing_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("oci-layout"), "{}").expect("layout");
        std::fs::create_dir_all(dir.path().join("blobs/sha256")).expect("blobs");
        let err = validate_layout(dir.path()).expect_err("missing index");
        assert!(matches!(
            err,
            ImageError::InvalidLayout {
                missing: "index.json",
                ..
            }
        ));
    }

    #[test]
    fn validate_layout_reports_missing_blob_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("index.json"), "{}").expect("index");
        std::fs::write(dir.path().join("oci-layout"), "{}").expect("layout");
        let err = validate_layout(dir.path()).expect_err("missing blobs");
        assert!(matches!(
            err,
            ImageError::InvalidLayout {
                missing: "blobs/sha256",
                ..
            }
        ));
    }

    #[test]
    fn lookup_rejects_unpulled_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ImageStore::open(dir.path()).expect("open");
        assert!(matches!(
            store.lookup("ghost"),
            Err(ImageError::Preparation { .. })
        ));
    }

    #[test]
    fn list_returns_sorted_repository_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ImageStore::open(dir.path()).expect("open");
        std::fs::create_dir_all(dir.path().join("busybox")).expect("mkdir");
        std::fs::create_dir_all(dir.path().join("alpine")).expect("mkdir");
        std::fs::write(dir.path().join("stray-file"), "x").expect("file");
        assert_eq!(store.list().expect("list"), vec!["alpine", "busybox"]);
    }
}
