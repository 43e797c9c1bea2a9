//! Railify pricing & billing service library
//!
//! Quotes handrail jobs for the embeddable widget (style price range, footage
//! and travel surcharge), captures leads, and reports metered usage to the
//! billing provider.
//!
//! # Modules
//!
//! - `api_doc`: OpenAPI document.
//! - `config`: Configuration management.
//! - `db`: Database connection pool and migrations.
//! - `errors`: Error handling types.
//! - `estimate`: Estimate composer.
//! - `handlers`: HTTP request handlers.
//! - `leads`: Lead validation and capture.
//! - `models`: Domain, row and API models.
//! - `routes`: HTTP router and middleware stack.
//! - `store`: Tenant data access.
//! - `stripe_client`: Billing provider REST client.
//! - `travel`: Travel-fee calculator.
//! - `usage`: Metered usage reporter.
//! - `webhook_handler`: Billing webhook handler.
//! - `webhook_models`: Billing webhook payload models.
//! - `zip_distance`: Offline zip code distance lookup.

pub mod api_doc;
pub mod config;
pub mod db;
pub mod errors;
pub mod estimate;
pub mod handlers;
pub mod leads;
pub mod models;
pub mod routes;
pub mod store;
pub mod stripe_client;
pub mod travel;
pub mod usage;
pub mod webhook_handler;
pub mod webhook_models;
pub mod zip_distance;
