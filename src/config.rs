// src/config.rs
use crate::error::ProcessingError;
use crate::functions::FunctionSpec;
use quire_types::geometry;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings of a [`crate::ReportProcessor`].
///
/// All lengths are in points and converted to strict geometry units where
/// they are used. The defaults describe an A4 portrait page with half-inch
/// vertical margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub page_width: f64,
    pub page_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,

    /// Runs a prepare pass before printing so that `prepared.<function>`
    /// columns are available. Defaults to `true`.
    pub prepare_pass: bool,

    /// Number of print passes. Defaults to `1`.
    pub print_passes: usize,

    /// Routes print passes through the paginator. Defaults to `false`.
    pub paginate: bool,

    /// Upper bound on committed steps per pass. A traversal that runs longer
    /// fails with an invalid-state error instead of spinning forever.
    ///
    /// Defaults to `1_000_000`.
    pub max_steps: usize,

    /// Functions of the top-level report.
    pub functions: Vec<FunctionSpec>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            page_width: 595.0,
            page_height: 842.0,
            margin_top: 36.0,
            margin_bottom: 36.0,
            margin_left: 36.0,
            margin_right: 36.0,
            prepare_pass: true,
            print_passes: 1,
            paginate: false,
            max_steps: 1_000_000,
            functions: Vec::new(),
        }
    }
}

impl ProcessingConfig {
    pub fn from_json(source: &str) -> Result<Self, ProcessingError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProcessingError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            ProcessingError::Config(format!("Failed to read config from '{}': {}", path.display(), e))
        })?;
        Self::from_json(&source)
    }

    /// Height available to bands on one page, in micro-points.
    pub fn content_height(&self) -> i64 {
        geometry::to_internal(self.page_height)
            - geometry::to_internal(self.margin_top)
            - geometry::to_internal(self.margin_bottom)
    }

    /// Width available to bands on one page, in micro-points.
    pub fn content_width(&self) -> i64 {
        geometry::to_internal(self.page_width)
            - geometry::to_internal(self.margin_left)
            - geometry::to_internal(self.margin_right)
    }

    pub fn validate(&self) -> Result<(), ProcessingError> {
        if self.content_height() <= 0 || self.content_width() <= 0 {
            return Err(ProcessingError::Config(format!(
                "margins leave no content area on a {}x{} page",
                self.page_width, self.page_height
            )));
        }
        if self.print_passes == 0 {
            return Err(ProcessingError::Config("print_passes must be at least 1".to_string()));
        }
        if self.max_steps == 0 {
            return Err(ProcessingError::Config("max_steps must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessingConfig::default();
        assert!(config.prepare_pass);
        assert_eq!(config.print_passes, 1);
        assert_eq!(config.content_height(), 77_000_000);
        assert_eq!(config.content_width(), 52_300_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ProcessingConfig::from_json(r#"{ "page_height": 200, "paginate": true }"#).unwrap();
        assert_eq!(config.page_height, 200.0);
        assert!(config.paginate);
        assert_eq!(config.max_steps, 1_000_000);
    }

    #[test]
    fn test_rejects_unusable_pages() {
        let err = ProcessingConfig::from_json(r#"{ "page_height": 50, "margin_top": 30, "margin_bottom": 30 }"#)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Config(_)));
        assert!(ProcessingConfig::from_json(r#"{ "print_passes": 0 }"#).is_err());
        assert!(ProcessingConfig::from_json("not json").is_err());
    }
}
