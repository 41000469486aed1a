//! Image persistence: write a region's raster under the document's output
//! directory, at the relative path the engine suggested.
//!
//! The raster is encoded in memory in the format implied by the file
//! extension and then written with `tokio::fs`, overwriting any previous run's
//! file. JPEG has no alpha channel, so rasters are flattened to RGB first.

use crate::engine::RegionImage;
use crate::error::RegionError;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error};

/// Persist an image region.
///
/// Returns the relative path to record in the JSON, or `None` when the region
/// has no raster or no suggested path, or when writing failed (logged).
pub async fn persist(image: Option<&RegionImage>, output_dir: &Path) -> Option<String> {
    let image = image?;
    let relative = image.path.as_deref()?;

    match write_image(&image.raster, relative, output_dir).await {
        Ok(dest) => {
            debug!("Saved image → {}", dest.display());
            Some(relative.to_string())
        }
        Err(e) => {
            error!("Failed to save image: {}", e);
            None
        }
    }
}

/// Encode `raster` and write it to `output_dir/relative`, creating parent
/// directories as needed.
pub async fn write_image(
    raster: &DynamicImage,
    relative: &str,
    output_dir: &Path,
) -> Result<PathBuf, RegionError> {
    let dest = output_dir.join(relative);
    let fail = |detail: String| RegionError::ImageWrite {
        path: dest.clone(),
        detail,
    };

    if !is_contained(Path::new(relative)) {
        return Err(fail("path must be relative and stay inside the output directory".into()));
    }

    let format = ImageFormat::from_path(&dest).map_err(|e| fail(e.to_string()))?;
    let bytes = encode(raster, format).map_err(|e| fail(e.to_string()))?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| fail(e.to_string()))?;
    }
    tokio::fs::write(&dest, &bytes)
        .await
        .map_err(|e| fail(e.to_string()))?;

    Ok(dest)
}

fn encode(raster: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(raster.to_rgb8()).write_to(&mut Cursor::new(&mut buf), format)?;
    } else {
        raster.write_to(&mut Cursor::new(&mut buf), format)?;
    }
    Ok(buf)
}

/// Non-empty, relative, and free of `..`.
fn is_contained(path: &Path) -> bool {
    let mut has_name = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => has_name = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    has_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn raster() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([255, 0, 0, 128])))
    }

    #[tokio::test]
    async fn writes_jpeg_under_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let image = RegionImage {
            path: Some("imgs/img_in_image_box_1_2_3_4.jpg".into()),
            raster: raster(),
        };

        let rel = persist(Some(&image), dir.path()).await;
        assert_eq!(rel.as_deref(), Some("imgs/img_in_image_box_1_2_3_4.jpg"));

        let written = dir.path().join("imgs/img_in_image_box_1_2_3_4.jpg");
        let decoded = image::open(&written).expect("valid jpeg on disk");
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"stale").unwrap();

        let dest = write_image(&raster(), "a.png", dir.path()).await.unwrap();
        let bytes = std::fs::read(dest).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[tokio::test]
    async fn missing_path_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let image = RegionImage {
            path: None,
            raster: raster(),
        };
        assert_eq!(persist(Some(&image), dir.path()).await, None);
        assert_eq!(persist(None, dir.path()).await, None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn escaping_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for rel in ["../evil.png", "/tmp/evil.png", ""] {
            let err = write_image(&raster(), rel, dir.path()).await.unwrap_err();
            assert!(matches!(err, RegionError::ImageWrite { .. }), "{rel}");
        }
    }

    #[tokio::test]
    async fn unknown_extension_fails_softly() {
        let dir = tempfile::tempdir().unwrap();
        let image = RegionImage {
            path: Some("imgs/figure.unknownext".into()),
            raster: raster(),
        };
        assert_eq!(persist(Some(&image), dir.path()).await, None);
        assert!(!dir.path().join("imgs/figure.unknownext").exists());
    }

    #[tokio::test]
    async fn write_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is needed.
        std::fs::write(dir.path().join("imgs"), b"file").unwrap();
        let image = RegionImage {
            path: Some("imgs/a.png".into()),
            raster: raster(),
        };
        assert_eq!(persist(Some(&image), dir.path()).await, None);
    }
}
