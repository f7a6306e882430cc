//! Hodograph page generation.
//!
//! Renders a single HTML page listing the hodograph images produced by
//! the render stage. During playback the page is regenerated per tick
//! so only images at or before the virtual clock appear.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use super::timestamp_from_name;

/// Regenerate the hodograph page from the images in `images_dir`.
///
/// With `clock == None` every image is listed; with a clock only images
/// stamped at or before it. Returns the number of images included.
pub fn write_hodo_page(
    images_dir: &Path,
    page_path: &Path,
    clock: Option<DateTime<Utc>>,
) -> std::io::Result<usize> {
    let mut images = Vec::new();
    if images_dir.is_dir() {
        for entry in fs::read_dir(images_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = match name.to_str() {
                Some(n) => n,
                None => continue,
            };
            if !name.ends_with(".png") {
                continue;
            }
            if let Some(limit) = clock {
                match timestamp_from_name(name) {
                    Some(ts) if ts <= limit => {}
                    _ => continue,
                }
            }
            images.push(name.to_string());
        }
    }
    images.sort();

    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html>\n<head><title>Hodographs</title></head>\n<body>\n");
    match clock {
        Some(limit) => page.push_str(&format!(
            "<p>Hodographs through {}</p>\n",
            limit.format("%Y-%m-%d %H:%M")
        )),
        None => page.push_str("<p>Hodographs</p>\n"),
    }
    for name in &images {
        page.push_str(&format!(
            "<img src=\"hodographs/{}\" alt=\"{}\"><br>\n",
            name, name
        ));
    }
    page.push_str("</body>\n</html>\n");

    fs::write(page_path, page)?;
    Ok(images.len())
}
