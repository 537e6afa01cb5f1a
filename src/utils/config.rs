use std::path::PathBuf;

use crate::picker::HighlightStyle;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// How long the UI side waits for a page context reply (ms)
    pub rpc_timeout_ms: u64,

    /// How long the UI side waits for a `parseData` reply (ms)
    pub parse_timeout_ms: u64,

    /// Inline border applied to the hovered element
    pub highlight_border: String,

    /// Inline outline applied to the hovered element
    pub highlight_outline: String,

    /// Where the form state is persisted between runs
    pub state_file: PathBuf,

    /// Inspector server port
    pub inspector_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        let highlight = HighlightStyle::default();
        Self {
            rpc_timeout_ms: 5000,
            parse_timeout_ms: 60_000,
            highlight_border: highlight.border,
            highlight_outline: highlight.outline,
            state_file: default_state_file(),
            inspector_port: 9333,
        }
    }
}

impl Config {
    /// Defaults overridden by `PAGE_PICKER_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(timeout) = std::env::var("PAGE_PICKER_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.rpc_timeout_ms = timeout;
        }
        if let Some(timeout) = std::env::var("PAGE_PICKER_PARSE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.parse_timeout_ms = timeout;
        }
        if let Ok(path) = std::env::var("PAGE_PICKER_STATE") {
            config.state_file = PathBuf::from(path);
        }
        if let Some(port) = std::env::var("PAGE_PICKER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.inspector_port = port;
        }

        config
    }

    pub fn highlight_style(&self) -> HighlightStyle {
        HighlightStyle {
            border: self.highlight_border.clone(),
            outline: self.highlight_outline.clone(),
        }
    }
}

fn default_state_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("page-picker")
        .join("state.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rpc_timeout_ms, 5000);
        assert_eq!(config.parse_timeout_ms, 60_000);
        assert_eq!(config.inspector_port, 9333);
        assert_eq!(config.highlight_style(), HighlightStyle::default());
        assert!(config.state_file.ends_with("page-picker/state.json"));
    }
}
