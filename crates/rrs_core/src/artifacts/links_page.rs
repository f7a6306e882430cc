//! Links page generation.
//!
//! Writes the page pointing display clients at the session's polling
//! endpoint and the downloadable bundles.

use std::fs;
use std::path::Path;

/// Write the links page for a session.
///
/// `link_base` is the externally visible URL prefix for the session's
/// assets tree.
pub fn write_links_page(page_path: &Path, link_base: &str, sites: &[String]) -> std::io::Result<()> {
    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html>\n<head><title>Simulation Links</title></head>\n<body>\n");
    page.push_str("<h3>Polling</h3>\n<ul>\n");
    for site in sites {
        page.push_str(&format!(
            "<li><a href=\"{base}/polling/{site}/\">{site}</a></li>\n",
            base = link_base,
            site = site
        ));
    }
    page.push_str("</ul>\n<h3>Downloads</h3>\n<ul>\n");
    page.push_str(&format!(
        "<li><a href=\"{base}/downloads/original_radar_files.zip\">Original radar files</a></li>\n",
        base = link_base
    ));
    page.push_str(&format!(
        "<li><a href=\"{base}/downloads/original_placefiles.zip\">Original placefiles</a></li>\n",
        base = link_base
    ));
    page.push_str("</ul>\n</body>\n</html>\n");

    fs::write(page_path, page)
}
