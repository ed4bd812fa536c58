//! Shared fixtures for unit tests: tiny in-memory images, pre-filled
//! caches and a mocked catalog.

use crate::core::normalize::normalize;
use crate::core::{ArtworkCache, ResolvedArtwork};
use crate::utils::observer::TracingObserver;
use httpmock::prelude::*;
use httpmock::Mock;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;

/// Encode a `width` × `height` solid-colour PNG.
pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(color));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

pub fn solid_artwork(name: &str, color: [u8; 3]) -> ResolvedArtwork {
    ResolvedArtwork {
        key: normalize(name),
        image: RgbImage::from_pixel(8, 11, Rgb(color)),
    }
}

/// A cache holding one small artwork per name.
pub fn cache_with(names: &[&str]) -> ArtworkCache {
    let mut cache = ArtworkCache::new(Arc::new(TracingObserver));
    for name in names {
        cache.insert(solid_artwork(name, [128, 128, 128]));
    }
    cache
}

/// Mount a catalog entry at `/cards/{key}` pointing to a PNG served at
/// `/img/{key}.png`. Returns `(lookup, image)` mocks.
pub async fn serve_card<'a>(
    server: &'a MockServer,
    name: &str,
    color: [u8; 3],
) -> (Mock<'a>, Mock<'a>) {
    let key = normalize(name);
    let image_path = format!("/img/{}.png", key);

    let lookup = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/cards/{}", key));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({ "editions": [{ "image": image_path }] }));
        })
        .await;

    let image = server
        .mock_async(|when, then| {
            when.method(GET).path(image_path.clone());
            then.status(200)
                .header("Content-Type", "image/png")
                .body(png_bytes(20, 28, color));
        })
        .await;

    (lookup, image)
}
