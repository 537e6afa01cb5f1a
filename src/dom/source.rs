use log::debug;
use std::path::Path;

use crate::error::Result;

/// Load page markup from an http(s) URL or a local file path
pub async fn load_html(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        debug!("Fetching page from {}", source);
        let response = reqwest::get(source).await?.error_for_status()?;
        Ok(response.text().await?)
    } else {
        debug!("Reading page from {}", source);
        Ok(tokio::fs::read_to_string(Path::new(source)).await?)
    }
}
