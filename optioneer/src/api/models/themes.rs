//! API models for themes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::themes::ThemeDBResponse;
use crate::theming::TextColorMode;
use crate::types::ThemeId;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThemeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ThemeId,
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

impl From<ThemeDBResponse> for ThemeResponse {
    fn from(db: ThemeDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            primary_color: db.primary_color,
            secondary_color: db.secondary_color,
            accent_color: db.accent_color,
            background_color: db.background_color,
            surface_color: db.surface_color,
            text_color: db.text_color,
            text_color_mode: db.text_color_mode,
            custom_text_color: db.custom_text_color,
            font_family: db.font_family,
            border_radius: db.border_radius,
            spacing_unit: db.spacing_unit,
            max_width: db.max_width,
            is_default: db.is_default,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Create-or-update payload: with an `id` it updates that theme, without one
/// it updates the active theme or creates a fresh one.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ThemeUpsert {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<ThemeId>,
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
