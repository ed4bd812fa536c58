use crate::core::{CanonicalKey, PageCanvas, PageSize, ResolvedArtwork};
use crate::utils::error::{Result, SheetError};
use chrono::{Datelike, Timelike, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use pdf_writer::{Content, Date, Filter, Name, Pdf, Rect, Ref, TextStr};
use std::collections::HashMap;

const PT_PER_MM: f64 = 72.0 / 25.4;
const PRODUCER: &str = concat!("card-sheet ", env!("CARGO_PKG_VERSION"));

struct PendingPage {
    index: usize,
    content: Content,
    xobjects: Vec<(String, Ref)>,
}

/// [`PageCanvas`] backed by `pdf-writer`.
///
/// Each distinct artwork is JPEG-encoded and embedded once, then referenced
/// from every page it appears on. Page content streams are deflated.
pub struct PdfCanvas {
    pdf: Pdf,
    next_id: i32,
    page_size: PageSize,
    jpeg_quality: u8,
    title: String,
    embedded: HashMap<CanonicalKey, (String, Ref)>,
    pages: Vec<PendingPage>,
}

impl PdfCanvas {
    pub fn new(page_size: PageSize, jpeg_quality: u8, title: impl Into<String>) -> Self {
        Self {
            pdf: Pdf::new(),
            // 1 = catalog, 2 = page tree
            next_id: 3,
            page_size,
            jpeg_quality: jpeg_quality.clamp(1, 100),
            title: title.into(),
            embedded: HashMap::new(),
            pages: Vec::new(),
        }
    }

    fn alloc(&mut self) -> Ref {
        let id = Ref::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn embed(&mut self, artwork: &ResolvedArtwork) -> Result<(String, Ref)> {
        if let Some(found) = self.embedded.get(&artwork.key) {
            return Ok(found.clone());
        }

        let jpeg = encode_jpeg(&artwork.image, self.jpeg_quality)?;
        let id = self.alloc();
        let name = format!("Im{}", self.embedded.len() + 1);

        let mut xobject = self.pdf.image_xobject(id, &jpeg);
        xobject.filter(Filter::DctDecode);
        xobject.width(artwork.width() as i32);
        xobject.height(artwork.height() as i32);
        xobject.color_space().device_rgb();
        xobject.bits_per_component(8);
        drop(xobject);

        tracing::debug!("🖼️ Embedded '{}' as {} ({} bytes)", artwork.key, name, jpeg.len());

        self.embedded
            .insert(artwork.key.clone(), (name.clone(), id));
        Ok((name, id))
    }
}

impl PageCanvas for PdfCanvas {
    fn begin_page(&mut self, index: usize) -> Result<()> {
        self.pages.push(PendingPage {
            index,
            content: Content::new(),
            xobjects: Vec::new(),
        });
        Ok(())
    }

    fn draw_image(
        &mut self,
        artwork: &ResolvedArtwork,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        if self.pages.is_empty() {
            return Err(SheetError::SinkFailure {
                message: "draw_image called before begin_page".to_string(),
            });
        }

        let (name, id) = self.embed(artwork)?;
        let page_height = self.page_size.height_mm;
        let Some(page) = self.pages.last_mut() else {
            return Err(SheetError::SinkFailure {
                message: "no open page".to_string(),
            });
        };

        // PDF 原點在左下角，y 軸要翻轉
        let bottom = page_height - y - height;
        page.content.save_state();
        page.content.transform([
            (width * PT_PER_MM) as f32,
            0.0,
            0.0,
            (height * PT_PER_MM) as f32,
            (x * PT_PER_MM) as f32,
            (bottom * PT_PER_MM) as f32,
        ]);
        page.content.x_object(Name(name.as_bytes()));
        page.content.restore_state();

        if !page.xobjects.iter().any(|(existing, _)| existing == &name) {
            page.xobjects.push((name, id));
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(SheetError::SinkFailure {
                message: "document has no pages".to_string(),
            });
        }

        let catalog_id = Ref::new(1);
        let tree_id = Ref::new(2);
        let info_id = self.alloc();
        let media_box = Rect::new(
            0.0,
            0.0,
            (self.page_size.width_mm * PT_PER_MM) as f32,
            (self.page_size.height_mm * PT_PER_MM) as f32,
        );

        let pending = std::mem::take(&mut self.pages);
        let mut page_ids = Vec::with_capacity(pending.len());

        for page in pending {
            let page_id = self.alloc();
            let content_id = self.alloc();

            let raw = page.content.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6);
            self.pdf
                .stream(content_id, &compressed)
                .filter(Filter::FlateDecode);

            let mut writer = self.pdf.page(page_id);
            writer
                .media_box(media_box)
                .parent(tree_id)
                .contents(content_id);
            let mut resources = writer.resources();
            let mut xobjects = resources.x_objects();
            for (name, id) in &page.xobjects {
                xobjects.pair(Name(name.as_bytes()), *id);
            }
            drop(xobjects);
            drop(resources);
            drop(writer);

            tracing::trace!(
                "Page {} written with {} images",
                page.index,
                page.xobjects.len()
            );
            page_ids.push(page_id);
        }

        self.pdf
            .pages(tree_id)
            .kids(page_ids.iter().copied())
            .count(page_ids.len() as i32);
        self.pdf.catalog(catalog_id).pages(tree_id);

        let mut info = self.pdf.document_info(info_id);
        info.title(TextStr(&self.title));
        info.producer(TextStr(PRODUCER));
        info.creation_date(now());
        drop(info);

        Ok(self.pdf.finish())
    }
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| SheetError::SinkFailure {
            message: format!("cannot encode artwork as JPEG: {}", e),
        })?;
    Ok(buffer)
}

fn now() -> Date {
    let now = Utc::now();
    Date::new(now.year().clamp(0, 9999) as u16)
        .month(now.month() as u8)
        .day(now.day() as u8)
        .hour(now.hour() as u8)
        .minute(now.minute() as u8)
        .second(now.second() as u8)
        .utc_offset_hour(0)
        .utc_offset_minute(0)
}
