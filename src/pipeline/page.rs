//! Page aggregation: all regions of one page → one [`PageRecord`].

use super::{classify, image};
use crate::engine::{Region, RegionLabel};
use crate::output::{Content, ContentRecord, PageMetadata, PageRecord};
use std::path::Path;
use tracing::debug;

/// Build the record for one page, keeping the engine's region order.
///
/// Returns `None` when no region produced a record; such pages are left out
/// of the document.
pub async fn aggregate(page_idx: usize, regions: &[Region], output_dir: &Path) -> Option<PageRecord> {
    let metadata = PageMetadata::for_index(page_idx);
    let mut content = Vec::with_capacity(regions.len());

    for region in regions {
        let record = if region.label == RegionLabel::Image {
            image::persist(region.image.as_ref(), output_dir)
                .await
                .map(|img_path| Content::Image { img_path })
        } else {
            classify::classify(region)
        };

        if let Some(content_value) = record {
            debug!("page {}: {} record", page_idx + 1, content_value.label());
            content.push(ContentRecord {
                content: content_value,
                metadata,
            });
        }
    }

    if content.is_empty() {
        None
    } else {
        Some(PageRecord { page_idx, content })
    }
}
