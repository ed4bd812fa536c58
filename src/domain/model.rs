use crate::utils::error::{Result, SheetError};
use crate::utils::observer::{PipelineEvent, PipelineObserver};
use image::RgbImage;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Normalized, URL-safe card identifier. Only built by
/// [`normalize`](crate::core::normalize::normalize).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalKey(pub(crate) String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One entry of the incoming card list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRequest {
    #[serde(default, deserialize_with = "coerce_name")]
    pub name: String,
    #[serde(default = "default_count", deserialize_with = "coerce_count")]
    pub count: u32,
}

/// Copies of a single entry are capped here; a whole sheet of one card is
/// far below it.
pub const MAX_COUNT: u32 = 1000;

fn default_count() -> u32 {
    1
}

fn coerce_name<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn coerce_count<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<u32, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let count = value.as_ref().and_then(count_from_value).unwrap_or(1);
    Ok(clamp_count(count))
}

fn clamp_count(count: i64) -> u32 {
    if count > i64::from(MAX_COUNT) {
        tracing::warn!("⚠️ Count {} capped at {}", count, MAX_COUNT);
    }
    // 上下限都已確認，轉型不會溢位
    count.clamp(1, i64::from(MAX_COUNT)) as u32
}

fn count_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequestBody {
    Bare(Vec<CardRequest>),
    Wrapped {
        #[serde(default)]
        cards: Option<Vec<CardRequest>>,
    },
}

impl CardRequest {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count: clamp_count(i64::from(count)),
        }
    }

    /// 解析請求內容：`{"cards": [...]}` 或直接一個陣列
    pub fn parse_list(body: &[u8]) -> Result<Vec<CardRequest>> {
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(SheetError::MissingInput {
                message: "request body is empty".to_string(),
            });
        }

        let parsed: RequestBody =
            serde_json::from_slice(body).map_err(|e| SheetError::MissingInput {
                message: format!("request body is not a card list: {}", e),
            })?;

        let cards = match parsed {
            RequestBody::Wrapped { cards } => cards.unwrap_or_default(),
            RequestBody::Bare(cards) => cards,
        };

        if cards.is_empty() {
            return Err(SheetError::EmptyInput);
        }
        Ok(cards)
    }
}

/// Absolute URL of one card's artwork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkLocator {
    pub url: String,
}

impl ArtworkLocator {
    /// Appends a catalog image path to the catalog base address. Values
    /// that are already absolute URLs are kept as they are.
    pub fn join(base_url: &str, image: &str) -> Self {
        let image = image.trim();
        if image.starts_with("http://") || image.starts_with("https://") {
            return Self {
                url: image.to_string(),
            };
        }

        let base = base_url.trim_end_matches('/');
        let url = if image.starts_with('/') {
            format!("{}{}", base, image)
        } else {
            format!("{}/{}", base, image)
        };
        Self { url }
    }
}

/// Decoded and resized artwork for one key.
#[derive(Debug, Clone)]
pub struct ResolvedArtwork {
    pub key: CanonicalKey,
    pub image: RgbImage,
}

impl ResolvedArtwork {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Per-request dedup cache. Dropping it releases every decoded image and
/// reports a `CacheReleased` event.
pub struct ArtworkCache {
    entries: HashMap<CanonicalKey, ResolvedArtwork>,
    observer: Arc<dyn PipelineObserver>,
}

impl ArtworkCache {
    pub fn new(observer: Arc<dyn PipelineObserver>) -> Self {
        Self {
            entries: HashMap::new(),
            observer,
        }
    }

    pub fn insert(&mut self, artwork: ResolvedArtwork) {
        self.entries.insert(artwork.key.clone(), artwork);
    }

    pub fn get(&self, key: &CanonicalKey) -> Option<&ResolvedArtwork> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &CanonicalKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ArtworkCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtworkCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Drop for ArtworkCache {
    fn drop(&mut self) {
        let entries = self.entries.len();
        self.entries.clear();
        self.observer
            .on_event(&PipelineEvent::CacheReleased { entries });
    }
}

/// Physical page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width_mm: 210.0,
        height_mm: 297.0,
    };
}

/// A grid cell: page, row, column and its rectangle in millimetres,
/// measured from the top-left corner of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub page_index: usize,
    pub row: usize,
    pub col: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub key: CanonicalKey,
    pub page_index: usize,
    pub row: usize,
    pub col: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    pub fn at(slot: Slot, key: CanonicalKey) -> Self {
        Self {
            key,
            page_index: slot.page_index,
            row: slot.row,
            col: slot.col,
            x: slot.x,
            y: slot.y,
            width: slot.width,
            height: slot.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub index: usize,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub page_size: PageSize,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn placement_count(&self) -> usize {
        self.pages.iter().map(|p| p.placements.len()).sum()
    }

    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.pages.iter().flat_map(|p| p.placements.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Finished sheet, ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct SheetOutput {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub media_type: &'static str,
    pub pages: usize,
    pub placements: usize,
    pub unresolved: Vec<CanonicalKey>,
}

/// Diagnostic view of one request entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub name: String,
    pub normalized_key: CanonicalKey,
    pub resolved_url: Option<String>,
}
