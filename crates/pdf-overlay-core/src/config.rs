use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Language codes following ISO 639-1 with regional variants
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `auto` asks the backend to detect the source language.
    pub fn is_auto(&self) -> bool {
        self.0 == "auto"
    }
}

fn default_source_lang() -> Lang {
    Lang::new("auto")
}

fn default_target_lang() -> Lang {
    Lang::new("en")
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Text color for translated overlay text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl TextColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn dark_red() -> Self {
        Self::new(0.8, 0.0, 0.0)
    }

    pub const fn blue() -> Self {
        Self::new(0.0, 0.0, 0.8)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "black" => Some(Self::black()),
            "darkred" | "dark_red" | "dark-red" => Some(Self::dark_red()),
            "blue" => Some(Self::blue()),
            _ => None,
        }
    }

    /// Convert to RGB bytes (0-255)
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_rgb_bytes(&self) -> (u8, u8, u8) {
        (
            (self.r.clamp(0.0, 1.0) * 255.0) as u8,
            (self.g.clamp(0.0, 1.0) * 255.0) as u8,
            (self.b.clamp(0.0, 1.0) * 255.0) as u8,
        )
    }
}

impl Default for TextColor {
    fn default() -> Self {
        Self::black()
    }
}

/// Which translation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Keyless public web translation endpoint
    #[default]
    Free,
    /// OpenAI-compatible chat completion API
    OpenAi,
}

impl BackendKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "free" | "google" => Some(Self::Free),
            "openai" | "open_ai" | "ai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

/// Translator backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Endpoint of the free backend
    #[serde(default = "default_free_endpoint")]
    pub free_endpoint: String,
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl TranslatorConfig {
    /// Configuration for the AI-model backend
    pub fn openai(
        api_base: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            backend: BackendKind::OpenAi,
            api_base: api_base.into(),
            api_key,
            model: model.into(),
            ..Self::default()
        }
    }
}

fn default_free_endpoint() -> String {
    crate::translator::DEFAULT_FREE_ENDPOINT.to_string()
}

fn default_api_base() -> String {
    "http://localhost:8080/v1".to_string()
}

fn default_model() -> String {
    "default_model".to_string()
}

const fn default_retry_count() -> u32 {
    crate::translator::DEFAULT_RETRY_COUNT
}

const fn default_retry_delay_ms() -> u64 {
    crate::translator::DEFAULT_RETRY_DELAY_MS
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            free_endpoint: default_free_endpoint(),
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Page rasterization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Oversampling scale used when rasterizing a page for storage
    #[serde(default = "default_render_scale")]
    pub scale: f32,
    /// Lossy quality for stored page images and exported frames (0-100)
    #[serde(default = "default_quality")]
    pub quality: f32,
}

const fn default_render_scale() -> f32 {
    3.0
}

const fn default_quality() -> f32 {
    85.0
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: default_render_scale(),
            quality: default_quality(),
        }
    }
}

/// Overlay drawing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Canvas width every frame is drawn at
    #[serde(default = "default_display_width")]
    pub display_width: u32,
    /// Canvas width used when composing exported PDFs
    #[serde(default = "default_display_width")]
    pub export_width: u32,
    /// TrueType/OpenType font used for overlay text (system font if unset)
    pub font_path: Option<PathBuf>,
    /// Horizontal padding of the masking rectangle, in canvas pixels
    #[serde(default = "default_mask_padding")]
    pub mask_padding: f32,
    /// Mask extent above the baseline as a multiple of the segment height
    #[serde(default = "default_mask_ascent")]
    pub mask_ascent: f32,
    /// Mask extent below the baseline as a multiple of the segment height
    #[serde(default = "default_mask_descent")]
    pub mask_descent: f32,
}

const fn default_display_width() -> u32 {
    1200
}

const fn default_mask_padding() -> f32 {
    2.0
}

const fn default_mask_ascent() -> f32 {
    1.15
}

const fn default_mask_descent() -> f32 {
    0.35
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            display_width: default_display_width(),
            export_width: default_display_width(),
            font_path: None,
            mask_padding: default_mask_padding(),
            mask_ascent: default_mask_ascent(),
            mask_descent: default_mask_descent(),
        }
    }
}

/// Pointer selection tolerances, in normalized page units
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Maximum distance from a segment anchor for a single pick
    #[serde(default = "default_pick_radius")]
    pub pick_radius: f32,
    /// Drags shorter than this fall back to a single pick
    #[serde(default = "default_dead_zone")]
    pub dead_zone: f32,
}

const fn default_pick_radius() -> f32 {
    0.05
}

const fn default_dead_zone() -> f32 {
    0.01
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            pick_radius: default_pick_radius(),
            dead_zone: default_dead_zone(),
        }
    }
}

/// Project store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store directory (defaults to ~/.local/share/pdf-overlay)
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(crate::util::default_store_path)
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source language
    #[serde(default = "default_source_lang")]
    pub source_lang: Lang,

    /// Target language
    #[serde(default = "default_target_lang")]
    pub target_lang: Lang,

    /// Overlay text color
    #[serde(default)]
    pub text_color: TextColor,

    #[serde(default)]
    pub translator: TranslatorConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub overlay: OverlayConfig,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            text_color: TextColor::default(),
            translator: TranslatorConfig::default(),
            render: RenderConfig::default(),
            overlay: OverlayConfig::default(),
            selection: SelectionConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/pdf-overlay/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("pdf-overlay").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Reject values the renderer or rasterizer cannot work with.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        let invalid = |field: &str, reason: &str| crate::error::Error::ConfigInvalid {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if !(self.render.scale > 0.0) {
            return Err(invalid("render.scale", "must be positive"));
        }
        if !(0.0..=100.0).contains(&self.render.quality) {
            return Err(invalid("render.quality", "must be within 0..=100"));
        }
        if self.overlay.display_width == 0 {
            return Err(invalid("overlay.display_width", "must be non-zero"));
        }
        if self.overlay.export_width == 0 {
            return Err(invalid("overlay.export_width", "must be non-zero"));
        }
        if self.selection.pick_radius < 0.0 || self.selection.dead_zone < 0.0 {
            return Err(invalid("selection", "tolerances must be non-negative"));
        }
        Ok(())
    }
}
