//! Database models for themes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::theming::TextColorMode;
use crate::types::{ClientId, ThemeId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ThemeDBResponse {
    pub id: ThemeId,
    pub client_id: ClientId,
    pub name: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub background_color: String,
    pub surface_color: String,
    pub text_color: String,
    pub text_color_mode: TextColorMode,
    pub custom_text_color: Option<String>,
    pub font_family: String,
    pub border_radius: String,
    pub spacing_unit: String,
    pub max_width: String,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ThemeDBResponse {
    /// The hardcoded platform default. This is the single fallback branch of
    /// [`resolve_theme`]; it is never persisted as-is (the nil ids mark it).
    pub fn platform_default() -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id: Uuid::nil(),
            client_id: Uuid::nil(),
            name: "Default".to_string(),
            primary_color: "#3b82f6".to_string(),
            secondary_color: "#64748b".to_string(),
            accent_color: "#8b5cf6".to_string(),
            background_color: "#ffffff".to_string(),
            surface_color: "#f8fafc".to_string(),
            text_color: "#0f172a".to_string(),
            text_color_mode: TextColorMode::Auto,
            custom_text_color: None,
            font_family: "Inter".to_string(),
            border_radius: "0.5rem".to_string(),
            spacing_unit: "1rem".to_string(),
            max_width: "42rem".to_string(),
            is_default: true,
            is_active: true,
            created_at: epoch,
            updated_at: epoch,
        }
    }
}

/// Total theme resolution: a stored theme or the platform default, never an
/// absence. Embeds always have something to render.
pub fn resolve_theme(stored: Option<ThemeDBResponse>) -> ThemeDBResponse {
    stored.unwrap_or_else(ThemeDBResponse::platform_default)
}

#[derive(Debug, Clone)]
pub struct ThemeCreateDBRequest {
    pub client_id: ClientId,
    pub name: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub background_color: String,
    pub surface_color: String,
    pub text_color: String,
    pub text_color_mode: TextColorMode,
    pub custom_text_color: Option<String>,
    pub font_family: String,
    pub border_radius: String,
    pub spacing_unit: String,
    pub max_width: String,
    pub is_default: bool,
    pub is_active: bool,
}

impl ThemeCreateDBRequest {
    /// The default theme provisioned for a new client (and by theme reset).
    pub fn default_for(client_id: ClientId) -> Self {
        let defaults = ThemeDBResponse::platform_default();
        Self {
            client_id,
            name: defaults.name,
            primary_color: defaults.primary_color,
            secondary_color: defaults.secondary_color,
            accent_color: defaults.accent_color,
            background_color: defaults.background_color,
            surface_color: defaults.surface_color,
            text_color: defaults.text_color,
            text_color_mode: defaults.text_color_mode,
            custom_text_color: None,
            font_family: defaults.font_family,
            border_radius: defaults.border_radius,
            spacing_unit: defaults.spacing_unit,
            max_width: defaults.max_width,
            is_default: true,
            is_active: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ThemeUpdateDBRequest {
    pub name: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub accent_color: Option<String>,
    pub background_color: Option<String>,
    pub surface_color: Option<String>,
    pub text_color: Option<String>,
    pub text_color_mode: Option<TextColorMode>,
    pub custom_text_color: Option<String>,
    pub font_family: Option<String>,
    pub border_radius: Option<String>,
    pub spacing_unit: Option<String>,
    pub max_width: Option<String>,
    pub is_default: Option<bool>,
    pub is_active: Option<bool>,
}
