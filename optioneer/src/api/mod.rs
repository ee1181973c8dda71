//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Authentication** (`/authentication/*`): register, login, logout
//! - **Dashboard** (`/api/v1/*`): session-authenticated CRUD for
//!   configurators, categories, options, themes, quotes, account settings,
//!   and billing
//! - **Embed** (`/configurator/{public_id}`, `/quote`,
//!   `/quote/{quote_code}`): public-key or unauthenticated endpoints serving
//!   third-party embeds and customers
//!
//! All endpoints answer with the `{success, data?, message?, error?, code?}`
//! envelope. OpenAPI documentation is served at `/docs`.

pub mod handlers;
pub mod models;
