//! OpenAPI documentation, served at `/docs`.

use utoipa::OpenApi;

use crate::api::models;
use crate::db::models::categories::CategoryType;
use crate::db::models::quotes::QuoteStatus;
use crate::limits::UsageSummary;
use crate::theming::{Hsl, TextColorMode};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Optioneer API",
        description = "Multi-tenant product-configurator platform: dashboard CRUD, public embed reads, and quote capture."
    ),
    paths(
        crate::api::handlers::auth::register,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::logout,
        crate::api::handlers::auth::get_account,
        crate::api::handlers::auth::update_account,
        crate::api::handlers::configurators::list_configurators,
        crate::api::handlers::configurators::create_configurator,
        crate::api::handlers::configurators::get_configurator,
        crate::api::handlers::configurators::update_configurator,
        crate::api::handlers::configurators::delete_configurator,
        crate::api::handlers::categories::list_categories,
        crate::api::handlers::categories::create_category,
        crate::api::handlers::categories::get_category,
        crate::api::handlers::categories::update_category,
        crate::api::handlers::categories::delete_category,
        crate::api::handlers::options::list_options,
        crate::api::handlers::options::create_option,
        crate::api::handlers::options::get_option,
        crate::api::handlers::options::update_option,
        crate::api::handlers::options::delete_option,
        crate::api::handlers::options::add_incompatibility,
        crate::api::handlers::options::remove_incompatibility,
        crate::api::handlers::options::add_dependency,
        crate::api::handlers::options::remove_dependency,
        crate::api::handlers::themes::list_themes,
        crate::api::handlers::themes::get_active_theme,
        crate::api::handlers::themes::upsert_theme,
        crate::api::handlers::themes::reset_theme,
        crate::api::handlers::themes::delete_theme,
        crate::api::handlers::embed::get_embed_configurator,
        crate::api::handlers::quotes::create_quote,
        crate::api::handlers::quotes::get_quote_by_code,
        crate::api::handlers::quotes::list_quotes,
        crate::api::handlers::quotes::get_quote,
        crate::api::handlers::quotes::update_quote,
        crate::api::handlers::quotes::delete_quote,
        crate::api::handlers::billing::get_usage,
        crate::api::handlers::billing::create_checkout,
        crate::api::handlers::billing::verify_payment,
    ),
    components(schemas(
        models::auth::RegisterRequest,
        models::auth::LoginRequest,
        models::auth::AuthResponse,
        models::clients::CurrentClient,
        models::clients::ClientResponse,
        models::clients::ClientSettingsUpdate,
        models::configurators::ConfiguratorResponse,
        models::configurators::ConfiguratorCreate,
        models::configurators::ConfiguratorUpdate,
        models::categories::CategoryResponse,
        models::categories::CategoryCreate,
        models::categories::CategoryUpdate,
        models::options::OptionResponse,
        models::options::OptionCreate,
        models::options::OptionCreateResponse,
        models::options::OptionUpdate,
        models::options::EdgeRequest,
        models::themes::ThemeResponse,
        models::themes::ThemeUpsert,
        models::quotes::QuoteResponse,
        models::quotes::QuoteCreate,
        models::quotes::QuoteUpdate,
        models::billing::CheckoutResponse,
        models::billing::VerifyPaymentRequest,
        models::billing::VerifyPaymentResponse,
        models::embed::EmbedConfiguratorResponse,
        models::embed::EmbedCategory,
        models::embed::EmbedOption,
        models::embed::EmbedTheme,
        CategoryType,
        QuoteStatus,
        TextColorMode,
        Hsl,
        UsageSummary,
    )),
    tags(
        (name = "authentication", description = "Client registration and sessions"),
        (name = "account", description = "Account settings and embed allow-list"),
        (name = "configurators", description = "Configurator management"),
        (name = "categories", description = "Category management"),
        (name = "options", description = "Option and relation-edge management"),
        (name = "themes", description = "Theme management"),
        (name = "quotes", description = "Quote lifecycle"),
        (name = "billing", description = "Plan usage and capacity blocks"),
        (name = "embed", description = "Public embed surface"),
    )
)]
pub struct ApiDoc;
