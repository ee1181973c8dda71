//! API models for the public embed surface.
//!
//! The embed read returns the full configurator graph - categories in
//! display order, their options with prices and relation edges, and the
//! resolved theme with derived CSS variables. Private UUIDs for the
//! configurator itself are not exposed; embeds address it by public id.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::db::models::categories::{CategoryDBResponse, CategoryType};
use crate::db::models::configurators::ConfiguratorDBResponse;
use crate::db::models::options::OptionWithEdges;
use crate::db::models::themes::ThemeDBResponse;
use crate::theming::{self, TextColorMode};
use crate::types::{CategoryId, OptionId};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmbedConfiguratorResponse {
    /// The public id; embeds never see the private UUID
    pub public_id: String,
    pub name: String,
    pub description: Option<String>,
    pub currency_code: String,
    pub currency_symbol: String,
    pub categories: Vec<EmbedCategory>,
    pub theme: EmbedTheme,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmbedCategory {
    #[schema(value_type = String, format = "uuid")]
    pub id: CategoryId,
    pub name: String,
    pub category_type: CategoryType,
    pub position: i32,
    pub is_required: bool,
    pub options: Vec<EmbedOption>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmbedOption {
    #[schema(value_type = String, format = "uuid")]
    pub id: OptionId,
    pub label: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    /// Price preformatted with the configurator's currency symbol
    pub display_price: String,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub is_default: bool,
    #[schema(value_type = Vec<String>)]
    pub incompatible_with: Vec<OptionId>,
    #[schema(value_type = Vec<String>)]
    pub depends_on: Vec<OptionId>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmbedTheme {
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub background_color: String,
    pub surface_color: String,
    pub text_color: String,
    pub text_color_mode: TextColorMode,
    pub font_family: String,
    pub border_radius: String,
    pub spacing_unit: String,
    pub max_width: String,
    /// Derived CSS variables (`--primary`, `--primary-foreground`, ...)
    pub variables: BTreeMap<String, String>,
}

impl From<ThemeDBResponse> for EmbedTheme {
    fn from(theme: ThemeDBResponse) -> Self {
        let variables = theming::css_variables(
            &theme.primary_color,
            theme.text_color_mode,
            theme.custom_text_color.as_deref(),
        )
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

        Self {
            primary_color: theme.primary_color,
            secondary_color: theme.secondary_color,
            accent_color: theme.accent_color,
            background_color: theme.background_color,
            surface_color: theme.surface_color,
            text_color: theme.text_color,
            text_color_mode: theme.text_color_mode,
            font_family: theme.font_family,
            border_radius: theme.border_radius,
            spacing_unit: theme.spacing_unit,
            max_width: theme.max_width,
            variables,
        }
    }
}

impl EmbedConfiguratorResponse {
    /// Assemble the embed graph from repository output.
    pub fn assemble(
        configurator: ConfiguratorDBResponse,
        categories: Vec<CategoryDBResponse>,
        options: Vec<OptionWithEdges>,
        theme: ThemeDBResponse,
    ) -> Self {
        let symbol = configurator.currency_symbol.clone();
        let mut embed_categories: Vec<EmbedCategory> = categories
            .into_iter()
            .map(|category| EmbedCategory {
                id: category.id,
                name: category.name,
                category_type: category.category_type,
                position: category.position,
                is_required: category.is_required,
                options: Vec::new(),
            })
            .collect();

        for entry in options {
            let display_price = crate::pricing::format_price(entry.option.price, &symbol);
            if let Some(category) = embed_categories.iter_mut().find(|c| c.id == entry.option.category_id) {
                category.options.push(EmbedOption {
                    id: entry.option.id,
                    label: entry.option.label,
                    description: entry.option.description,
                    price: entry.option.price,
                    display_price,
                    sku: entry.option.sku,
                    image_url: entry.option.image_url,
                    is_default: entry.option.is_default,
                    incompatible_with: entry.incompatible_with,
                    depends_on: entry.depends_on,
                });
            }
        }

        Self {
            public_id: configurator.public_id,
            name: configurator.name,
            description: configurator.description,
            currency_code: configurator.currency_code,
            currency_symbol: configurator.currency_symbol,
            categories: embed_categories,
            theme: EmbedTheme::from(theme),
        }
    }
}
