#![allow(dead_code)]

use card_sheet::config::toml_config::{CatalogConfig, SheetConfig};
use card_sheet::normalize;
use httpmock::prelude::*;
use httpmock::Mock;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(color));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Default config pointed at the mock catalog, with a low print density
/// so resizing stays cheap.
pub fn config_for(server: &MockServer) -> SheetConfig {
    let mut config = SheetConfig {
        catalog: CatalogConfig {
            base_url: server.base_url(),
            ..CatalogConfig::default()
        },
        ..SheetConfig::default()
    };
    config.fetch.print_dpi = 72;
    config
}

/// 目錄條目 + 圖片，回傳 (lookup, image)
pub async fn mount_card<'a>(server: &'a MockServer, name: &str) -> (Mock<'a>, Mock<'a>) {
    let key = normalize(name);
    let image_path = format!("/img/{}.png", key);

    let lookup = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/cards/{}", key));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "name": name,
                    "editions": [{ "image": image_path }]
                }));
        })
        .await;

    let image = server
        .mock_async(|when, then| {
            when.method(GET).path(image_path.clone());
            then.status(200)
                .header("Content-Type", "image/png")
                .body(png_bytes(25, 35, [200, 120, 40]));
        })
        .await;

    (lookup, image)
}

pub async fn mount_missing<'a>(server: &'a MockServer, name: &str) -> Mock<'a> {
    let key = normalize(name);
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/cards/{}", key));
            then.status(404)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({ "error": "not found" }));
        })
        .await
}
