use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cellgrid_core::expansion::ExpansionConfig;
use cellgrid_core::viewport::ViewportConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Tunables for the grid engine. Every field has a default; a settings file
/// only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    // Grid geometry
    #[serde(rename = "grid.rowHeight")]
    pub row_height: f32,

    #[serde(rename = "grid.defaultColumnWidth")]
    pub default_column_width: f32,

    // Viewport
    #[serde(rename = "viewport.buffer")]
    pub viewport_buffer: usize,

    #[serde(rename = "viewport.maxRenderRows")]
    pub max_render_rows: usize,

    #[serde(rename = "viewport.maxRenderCols")]
    pub max_render_cols: usize,

    #[serde(rename = "viewport.performanceThreshold")]
    pub performance_threshold: usize,

    // Expansion
    #[serde(rename = "expansion.minVisibleRows")]
    pub min_visible_rows: usize,

    #[serde(rename = "expansion.minVisibleCols")]
    pub min_visible_cols: usize,

    #[serde(rename = "expansion.rowBuffer")]
    pub row_buffer: usize,

    #[serde(rename = "expansion.colBuffer")]
    pub col_buffer: usize,

    #[serde(rename = "expansion.navigationMargin")]
    pub navigation_margin: usize,

    #[serde(rename = "expansion.scrollMargin")]
    pub scroll_margin: usize,

    // History
    #[serde(rename = "history.maxEntries")]
    pub history_limit: usize,

    #[serde(rename = "history.coalesceWindowMs")]
    pub coalesce_window_ms: u64,

    // Offload worker
    #[serde(rename = "offload.enabled")]
    pub offload_enabled: bool,

    #[serde(rename = "offload.threshold")]
    pub offload_threshold: usize,

    #[serde(rename = "offload.timeoutMs")]
    pub worker_timeout_ms: u64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            // Grid
            row_height: 24.0,
            default_column_width: 80.0,
            // Viewport
            viewport_buffer: 5,
            max_render_rows: 100,
            max_render_cols: 50,
            performance_threshold: 1_000_000,
            // Expansion
            min_visible_rows: 100,
            min_visible_cols: 26,
            row_buffer: 100,
            col_buffer: 10,
            navigation_margin: 10,
            scroll_margin: 3,
            // History
            history_limit: 100,
            coalesce_window_ms: 500,
            // Offload
            offload_enabled: true,
            offload_threshold: 10_000,
            worker_timeout_ms: 5_000,
        }
    }
}

// Strip comments (lines starting with //)
fn strip_comments(contents: &str) -> String {
    contents
        .lines()
        .filter(|line| !line.trim().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl GridSettings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cellgrid");
        config_dir.join("settings.json")
    }

    /// Load settings from the user config file, falling back to defaults.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Load and validate settings from `path`.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&strip_comments(&contents)).map_err(|source| {
            SettingsError::Parse { path: path.to_path_buf(), source }
        })?;
        Ok(settings.validate())
    }

    /// Write settings as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| SettingsError::Write { path: path.to_path_buf(), source })
    }

    /// Replace nonsensical values (zero sizes, zero caps) with defaults.
    pub fn validate(mut self) -> Self {
        let d = Self::default();
        if !(self.row_height.is_finite() && self.row_height > 0.0) {
            log::warn!("grid.rowHeight {} is invalid, using {}", self.row_height, d.row_height);
            self.row_height = d.row_height;
        }
        if !(self.default_column_width.is_finite() && self.default_column_width > 0.0) {
            log::warn!(
                "grid.defaultColumnWidth {} is invalid, using {}",
                self.default_column_width,
                d.default_column_width
            );
            self.default_column_width = d.default_column_width;
        }
        let positive = [
            (&mut self.max_render_rows, d.max_render_rows, "viewport.maxRenderRows"),
            (&mut self.max_render_cols, d.max_render_cols, "viewport.maxRenderCols"),
            (&mut self.performance_threshold, d.performance_threshold, "viewport.performanceThreshold"),
            (&mut self.min_visible_rows, d.min_visible_rows, "expansion.minVisibleRows"),
            (&mut self.min_visible_cols, d.min_visible_cols, "expansion.minVisibleCols"),
            (&mut self.history_limit, d.history_limit, "history.maxEntries"),
        ];
        for (value, default, key) in positive {
            if *value == 0 {
                log::warn!("{} must be positive, using {}", key, default);
                *value = default;
            }
        }
        // The scroll margin must activate closer to the edge than navigation
        if self.scroll_margin > self.navigation_margin {
            self.scroll_margin = self.navigation_margin;
        }
        self
    }

    pub fn viewport_config(&self) -> ViewportConfig {
        ViewportConfig {
            row_height: self.row_height,
            col_width: self.default_column_width,
            buffer: self.viewport_buffer,
            max_render_rows: self.max_render_rows,
            max_render_cols: self.max_render_cols,
            performance_threshold: self.performance_threshold,
        }
    }

    pub fn expansion_config(&self) -> ExpansionConfig {
        ExpansionConfig {
            min_visible_rows: self.min_visible_rows,
            min_visible_cols: self.min_visible_cols,
            row_buffer: self.row_buffer,
            col_buffer: self.col_buffer,
            navigation_margin: self.navigation_margin,
            scroll_margin: self.scroll_margin,
            performance_threshold: self.performance_threshold,
        }
    }

    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_millis(self.worker_timeout_ms)
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let s = GridSettings::default();
        assert_eq!(s.viewport_config(), ViewportConfig::default());
        assert_eq!(s.expansion_config(), ExpansionConfig::default());
        assert_eq!(s.history_limit, 100);
        assert_eq!(s.coalesce_window(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_file_with_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
    // Render fewer rows on slow machines
    "viewport.maxRenderRows": 60,
    "history.maxEntries": 20
}"#,
        )
        .unwrap();

        let s = GridSettings::load_from(&path).unwrap();
        assert_eq!(s.max_render_rows, 60);
        assert_eq!(s.history_limit, 20);
        assert_eq!(s.max_render_cols, 50, "unspecified keys keep defaults");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(GridSettings::load_from(&path), Err(SettingsError::Parse { .. })));
        assert!(matches!(
            GridSettings::load_from(&dir.path().join("missing.json")),
            Err(SettingsError::Read { .. })
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let s = GridSettings { offload_threshold: 500, offload_enabled: false, ..GridSettings::default() };
        s.save_to(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"offload.threshold\": 500"));
        assert_eq!(GridSettings::load_from(&path).unwrap(), s);
    }

    #[test]
    fn test_validate_replaces_zeros() {
        let s = GridSettings {
            max_render_rows: 0,
            row_height: -3.0,
            history_limit: 0,
            scroll_margin: 50,
            ..GridSettings::default()
        }
        .validate();
        assert_eq!(s.max_render_rows, 100);
        assert_eq!(s.row_height, 24.0);
        assert_eq!(s.history_limit, 100);
        assert_eq!(s.scroll_margin, s.navigation_margin);
    }
}
