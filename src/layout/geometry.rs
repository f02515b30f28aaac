//! Page geometry: page sizes, margins and the derived content area

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Standard page sizes in CSS pixels at 96 DPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// 210mm x 297mm
    A4,
    /// 8.5in x 11in
    Letter,
    /// 8.5in x 14in
    Legal,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::A4, PageSize::Letter, PageSize::Legal];

    /// Look up a size by key, ignoring case
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "a4" => Some(PageSize::A4),
            "letter" => Some(PageSize::Letter),
            "legal" => Some(PageSize::Legal),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            PageSize::A4 => "a4",
            PageSize::Letter => "letter",
            PageSize::Legal => "legal",
        }
    }

    /// (width, height) in pixels
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (794.0, 1123.0),
            PageSize::Letter => (816.0, 1056.0),
            PageSize::Legal => (816.0, 1344.0),
        }
    }
}

/// Page configuration as supplied by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageConfig {
    /// One of "a4", "letter", "legal"; other keys need `width` and `height`
    pub page_size: String,
    /// Explicit page width, overriding the key's width
    pub width: Option<f32>,
    /// Explicit page height, overriding the key's height
    pub height: Option<f32>,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Visual gap between pages in the editor
    pub page_gap: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4.key().to_string(),
            width: None,
            height: None,
            margin_top: 96.0, // 1 inch
            margin_bottom: 96.0,
            margin_left: 96.0,
            margin_right: 96.0,
            page_gap: 24.0,
        }
    }
}

impl PageConfig {
    /// Default margins with the given page size key
    pub fn with_page_size(page_size: impl Into<String>) -> Self {
        Self {
            page_size: page_size.into(),
            ..Self::default()
        }
    }

    /// Custom page dimensions with default margins
    pub fn custom(width: f32, height: f32) -> Self {
        Self {
            page_size: "custom".to_string(),
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }
}

/// Resolved page geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub page_gap: f32,
    pub content_width: f32,
    pub content_height: f32,
}

/// Geometry resolved under the lenient fallback policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub geometry: PageGeometry,
    /// The page size key was unknown and A4 was used instead
    pub fell_back: bool,
}

impl Default for PageGeometry {
    fn default() -> Self {
        // A4 with 1 inch margins is always valid
        Self::from_parts(794.0, 1123.0, &PageConfig::default())
    }
}

impl PageGeometry {
    /// Resolve a page configuration strictly
    pub fn resolve(config: &PageConfig) -> Result<Self, ConfigError> {
        let size = PageSize::from_key(&config.page_size);
        let (width, height) = match (size, config.width, config.height) {
            (_, Some(width), Some(height)) => (width, height),
            (Some(size), width, height) => {
                let (w, h) = size.dimensions();
                (width.unwrap_or(w), height.unwrap_or(h))
            }
            (None, _, _) => return Err(ConfigError::UnknownPageSize(config.page_size.clone())),
        };
        Self::validated(width, height, config)
    }

    /// Resolve a page configuration, falling back to A4 for unknown keys.
    ///
    /// Invalid margins are still an error.
    pub fn resolve_or_default(config: &PageConfig) -> Result<Resolved, ConfigError> {
        match Self::resolve(config) {
            Ok(geometry) => Ok(Resolved {
                geometry,
                fell_back: false,
            }),
            Err(ConfigError::UnknownPageSize(key)) => {
                log::warn!("Unknown page size '{}', falling back to A4", key);
                let (width, height) = PageSize::A4.dimensions();
                let geometry = Self::validated(
                    config.width.unwrap_or(width),
                    config.height.unwrap_or(height),
                    config,
                )?;
                Ok(Resolved {
                    geometry,
                    fell_back: true,
                })
            }
            Err(err) => Err(err),
        }
    }

    fn validated(width: f32, height: f32, config: &PageConfig) -> Result<Self, ConfigError> {
        let margins = [
            ("marginTop", config.margin_top),
            ("marginBottom", config.margin_bottom),
            ("marginLeft", config.margin_left),
            ("marginRight", config.margin_right),
            ("pageGap", config.page_gap),
        ];
        for (name, value) in margins {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidMargin { name, value });
            }
        }

        let geometry = Self::from_parts(width, height, config);

        if !(geometry.content_height > 0.0) {
            return Err(ConfigError::NonPositiveContentHeight {
                content_height: geometry.content_height,
                page_height: height,
                margin_top: config.margin_top,
                margin_bottom: config.margin_bottom,
            });
        }
        if !(geometry.content_width > 0.0) {
            return Err(ConfigError::NonPositiveContentWidth(geometry.content_width));
        }

        Ok(geometry)
    }

    fn from_parts(width: f32, height: f32, config: &PageConfig) -> Self {
        Self {
            page_width: width,
            page_height: height,
            margin_top: config.margin_top,
            margin_bottom: config.margin_bottom,
            margin_left: config.margin_left,
            margin_right: config.margin_right,
            page_gap: config.page_gap,
            content_width: width - config.margin_left - config.margin_right,
            content_height: height - config.margin_top - config.margin_bottom,
        }
    }

    /// Minimum editor height showing `pages` full pages separated by gaps
    pub fn stack_height(&self, pages: u32) -> f32 {
        let pages = pages.max(1) as f32;
        pages * self.page_height + (pages - 1.0) * self.page_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_heights() {
        let a4 = PageGeometry::resolve(&PageConfig::default()).unwrap();
        assert_eq!(a4.content_height, 931.0); // 1123 - 96 - 96
        assert_eq!(a4.content_width, 602.0); // 794 - 96 - 96

        let letter = PageGeometry::resolve(&PageConfig::with_page_size("letter")).unwrap();
        assert_eq!(letter.content_height, 864.0);

        let legal = PageGeometry::resolve(&PageConfig::with_page_size("Legal")).unwrap();
        assert_eq!(legal.content_height, 1152.0);
    }

    #[test]
    fn test_default_geometry_matches_default_config() {
        assert_eq!(
            PageGeometry::default(),
            PageGeometry::resolve(&PageConfig::default()).unwrap()
        );
    }

    #[test]
    fn test_unknown_page_size_is_an_error() {
        let config = PageConfig::with_page_size("tabloid");
        assert_eq!(
            PageGeometry::resolve(&config),
            Err(ConfigError::UnknownPageSize("tabloid".to_string()))
        );
    }

    #[test]
    fn test_unknown_page_size_with_dimensions_is_custom() {
        let geometry = PageGeometry::resolve(&PageConfig::custom(500.0, 700.0)).unwrap();
        assert_eq!(geometry.page_width, 500.0);
        assert_eq!(geometry.content_height, 508.0);
    }

    #[test]
    fn test_fallback_is_observable() {
        let resolved = PageGeometry::resolve_or_default(&PageConfig::with_page_size("b5")).unwrap();
        assert!(resolved.fell_back);
        assert_eq!(resolved.geometry.content_height, 931.0);

        let resolved = PageGeometry::resolve_or_default(&PageConfig::default()).unwrap();
        assert!(!resolved.fell_back);
    }

    #[test]
    fn test_non_positive_content_height() {
        let config = PageConfig {
            margin_top: 600.0,
            margin_bottom: 600.0,
            ..PageConfig::default()
        };
        assert!(matches!(
            PageGeometry::resolve(&config),
            Err(ConfigError::NonPositiveContentHeight { .. })
        ));
        // The fallback policy never hides a broken content area
        assert!(PageGeometry::resolve_or_default(&config).is_err());
    }

    #[test]
    fn test_negative_margin() {
        let config = PageConfig {
            margin_left: -1.0,
            ..PageConfig::default()
        };
        assert_eq!(
            PageGeometry::resolve(&config),
            Err(ConfigError::InvalidMargin {
                name: "marginLeft",
                value: -1.0
            })
        );
    }

    #[test]
    fn test_stack_height() {
        let a4 = PageGeometry::default();
        assert_eq!(a4.stack_height(1), 1123.0);
        assert_eq!(a4.stack_height(2), 1123.0 * 2.0 + 24.0);
    }

    #[test]
    fn test_config_json() {
        let config: PageConfig =
            serde_json::from_str(r#"{"pageSize":"letter","marginTop":72}"#).unwrap();
        assert_eq!(config.page_size, "letter");
        assert_eq!(config.margin_top, 72.0);
        assert_eq!(config.margin_bottom, 96.0);
    }
}
