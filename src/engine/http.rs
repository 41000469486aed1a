//! HTTP client for a PP-StructureV3 layout-parsing service.
//!
//! The service takes a whole PDF per request and answers with one entry per
//! page in `result.layoutParsingResults`. Each entry carries the pruned
//! parsing result (`parsing_res_list` blocks with label, content and bbox) and
//! a markdown rendition whose `images` map holds the cropped rasters,
//! base64-encoded and keyed by their relative path.
//!
//! The request is issued lazily, on the first poll of the page stream, and
//! pages are decoded one at a time as the stream is pulled.

use super::{EnginePage, LayoutEngine, PageStream, Region, RegionLabel};
use crate::config::{EngineOptions, ExtractionConfig};
use crate::error::{EngineError, ExtractError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// `fileType` value the service uses for PDF input.
const FILE_TYPE_PDF: u8 = 0;

/// Layout engine backed by a PP-StructureV3 serving endpoint.
#[derive(Debug, Clone)]
pub struct ServingEngine {
    client: reqwest::Client,
    endpoint: String,
    options: EngineOptions,
}

impl ServingEngine {
    /// Create a client for `base_url` (the `/layout-parsing` path is appended).
    pub fn new(
        base_url: &str,
        options: EngineOptions,
        timeout_secs: u64,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| EngineError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/layout-parsing", base_url.trim_end_matches('/')),
            options,
        })
    }

    /// Build the engine described by a run configuration.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        Self::new(
            &config.engine_url,
            config.engine.clone(),
            config.request_timeout_secs,
        )
        .map_err(|e| ExtractError::InvalidConfig(format!("layout engine client: {e}")))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl LayoutEngine for ServingEngine {
    fn predict(&self, document: &Path) -> PageStream {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let options = self.options.clone();
        let path = document.to_path_buf();

        let fetch = async move { fetch_pages(&client, &endpoint, &options, &path).await };

        Box::pin(stream::once(fetch).flat_map(|result| match result {
            Ok(pages) => stream::iter(pages.into_iter().map(|p| Ok(decode_page(p)))).left_stream(),
            Err(e) => stream::iter(std::iter::once(Err(e))).right_stream(),
        }))
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutRequest<'a> {
    file: String,
    file_type: u8,
    #[serde(flatten)]
    options: &'a EngineOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutResponse {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_msg: String,
    result: Option<LayoutResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutResult {
    #[serde(default)]
    layout_parsing_results: Vec<PageResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageResult {
    pruned_result: PrunedResult,
    #[serde(default)]
    markdown: Option<MarkdownResult>,
}

#[derive(Debug, Deserialize)]
struct PrunedResult {
    #[serde(default)]
    page_index: Option<usize>,
    #[serde(default)]
    parsing_res_list: Vec<Block>,
}

#[derive(Debug, Deserialize)]
struct Block {
    block_label: String,
    #[serde(default)]
    block_content: String,
    #[serde(default)]
    block_bbox: Option<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct MarkdownResult {
    #[serde(default)]
    images: HashMap<String, String>,
}

// ── Request / decode ─────────────────────────────────────────────────────

async fn fetch_pages(
    client: &reqwest::Client,
    endpoint: &str,
    options: &EngineOptions,
    path: &Path,
) -> Result<Vec<PageResult>, EngineError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| EngineError::Input(format!("{}: {e}", path.display())))?;

    info!("Sending {} ({} bytes) to {}", path.display(), bytes.len(), endpoint);

    let request = LayoutRequest {
        file: STANDARD.encode(&bytes),
        file_type: FILE_TYPE_PDF,
        options,
    };

    let response = client
        .post(endpoint)
        .json(&request)
        .send()
        .await
        .map_err(|e| EngineError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EngineError::Status {
            status: status.as_u16(),
            body: truncate(&body, 300),
        });
    }

    let body: LayoutResponse = response
        .json()
        .await
        .map_err(|e| EngineError::Decode(e.to_string()))?;

    let pages = parse_envelope(body)?;
    debug!("Layout service returned {} pages", pages.len());
    Ok(pages)
}

fn parse_envelope(body: LayoutResponse) -> Result<Vec<PageResult>, EngineError> {
    if body.error_code != 0 {
        return Err(EngineError::Service {
            code: body.error_code,
            message: body.error_msg,
        });
    }
    body.result
        .map(|r| r.layout_parsing_results)
        .ok_or_else(|| EngineError::Decode("response has no `result`".into()))
}

/// Convert one page of wire output into regions.
///
/// An image block whose raster is missing or undecodable becomes an image
/// region without payload; the pipeline drops it.
fn decode_page(page: PageResult) -> EnginePage {
    let images = page.markdown.unwrap_or_default().images;

    let regions = page
        .pruned_result
        .parsing_res_list
        .into_iter()
        .map(|block| {
            let label = RegionLabel::parse(&block.block_label);
            if label != RegionLabel::Image {
                return Region::new(label, block.block_content);
            }

            let Some(key) = block.block_bbox.as_deref().and_then(|b| image_key(&block.block_label, b))
            else {
                return Region::new(label, block.block_content);
            };
            let Some(encoded) = images.get(&key) else {
                debug!("No raster for image block '{}'", key);
                return Region::new(label, block.block_content);
            };
            match decode_raster(encoded) {
                Ok(raster) => Region::image(Some(key), raster),
                Err(detail) => {
                    warn!("Dropping image '{}': {}", key, detail);
                    Region::new(label, block.block_content)
                }
            }
        })
        .collect();

    EnginePage {
        page_index: page.pruned_result.page_index,
        regions,
    }
}

/// Relative path the engine stores a cropped block under.
fn image_key(label: &str, bbox: &[f64]) -> Option<String> {
    if bbox.len() != 4 {
        return None;
    }
    let c: Vec<i64> = bbox.iter().map(|v| *v as i64).collect();
    Some(format!(
        "imgs/img_in_{}_box_{}_{}_{}_{}.jpg",
        label, c[0], c[1], c[2], c[3]
    ))
}

fn decode_raster(encoded: &str) -> Result<image::DynamicImage, String> {
    let data = encoded
        .split_once("base64,")
        .map(|(_, d)| d)
        .unwrap_or(encoded);
    let bytes = STANDARD.decode(data.trim()).map_err(|e| e.to_string())?;
    image::load_from_memory(&bytes).map_err(|e| e.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}\u{2026}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use serde_json::json;
    use std::io::Cursor;

    fn tiny_png_base64() -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0, 128, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode");
        STANDARD.encode(&buf)
    }

    #[test]
    fn endpoint_appends_path_once() {
        let engine =
            ServingEngine::new("http://localhost:8080/", EngineOptions::default(), 5).unwrap();
        assert_eq!(engine.endpoint(), "http://localhost:8080/layout-parsing");
    }

    #[test]
    fn request_flattens_engine_options() {
        let options = EngineOptions::default();
        let req = LayoutRequest {
            file: "AAAA".into(),
            file_type: FILE_TYPE_PDF,
            options: &options,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["file"], "AAAA");
        assert_eq!(v["fileType"], 0);
        assert_eq!(v["useRegionDetection"], true);
        assert_eq!(v["useDocUnwarping"], false);
    }

    #[test]
    fn envelope_error_code_is_service_error() {
        let body: LayoutResponse = serde_json::from_value(json!({
            "errorCode": 500,
            "errorMsg": "model crashed"
        }))
        .unwrap();
        let err = parse_envelope(body).unwrap_err();
        assert!(matches!(err, EngineError::Service { code: 500, .. }));
    }

    #[test]
    fn envelope_without_result_is_decode_error() {
        let body: LayoutResponse = serde_json::from_value(json!({"errorCode": 0})).unwrap();
        assert!(matches!(parse_envelope(body), Err(EngineError::Decode(_))));
    }

    #[test]
    fn decode_page_maps_blocks_in_order() {
        let png = tiny_png_base64();
        let body: LayoutResponse = serde_json::from_value(json!({
            "errorCode": 0,
            "errorMsg": "Success",
            "result": {
                "layoutParsingResults": [{
                    "prunedResult": {
                        "page_index": 3,
                        "parsing_res_list": [
                            {"block_label": "doc_title", "block_content": "Judul", "block_bbox": [1, 2, 3, 4]},
                            {"block_label": "image", "block_content": "", "block_bbox": [10.0, 20.0, 30.7, 40.2]},
                            {"block_label": "image", "block_content": "", "block_bbox": [0, 0, 5, 5]},
                            {"block_label": "footer", "block_content": "hal. 4"}
                        ]
                    },
                    "markdown": {
                        "text": "# Judul",
                        "images": {"imgs/img_in_image_box_10_20_30_40.jpg": png}
                    }
                }]
            }
        }))
        .unwrap();

        let mut pages = parse_envelope(body).unwrap();
        let page = decode_page(pages.remove(0));
        assert_eq!(page.page_index, Some(3));
        assert_eq!(page.regions.len(), 4);
        assert_eq!(page.regions[0].label, RegionLabel::DocTitle);
        assert_eq!(page.regions[0].content, "Judul");

        let with_raster = page.regions[1].image.as_ref().expect("raster attached");
        assert_eq!(
            with_raster.path.as_deref(),
            Some("imgs/img_in_image_box_10_20_30_40.jpg")
        );
        assert_eq!(with_raster.raster.width(), 2);

        assert_eq!(page.regions[2].label, RegionLabel::Image);
        assert!(page.regions[2].image.is_none());
        assert_eq!(page.regions[3].label, RegionLabel::Other("footer".into()));
    }

    #[test]
    fn data_uri_prefix_is_accepted() {
        let uri = format!("data:image/png;base64,{}", tiny_png_base64());
        assert!(decode_raster(&uri).is_ok());
        assert!(decode_raster("not base64!").is_err());
    }

    #[test]
    fn image_key_needs_four_coordinates() {
        assert!(image_key("image", &[1.0, 2.0]).is_none());
        assert_eq!(
            image_key("image", &[1.9, 2.0, 3.0, 4.0]).as_deref(),
            Some("imgs/img_in_image_box_1_2_3_4.jpg")
        );
    }

    #[test]
    fn truncate_long_bodies() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc\u{2026}");
    }
}
