//! GoCD provider and command-line client.
//!
//! This crate manages GoCD configuration (pipeline configs and pipeline
//! templates) as declarative resources, and exposes the same REST operations
//! through the `gocd` binary.
//!
//! # Overview
//!
//! - **Client** ([`GocdClient`]): one typed method per REST endpoint, each
//!   returning an [`ApiResponse`] with status, version token and body
//! - **Resources**: `gocd_pipeline` and `gocd_pipeline_template`, mapped
//!   between JSON state bags and GoCD config documents
//! - **Data sources**: `gocd_agents` and `gocd_scheduled_jobs`
//! - **Provider** ([`GocdProvider`]): the [`ProviderService`] a provider
//!   runtime drives (schema, configure, plan, CRUD, import)
//! - **CLI** ([`cli`]): subcommands rendering a `success`, `not_found` or
//!   `error` outcome as JSON, YAML or a table
//!
//! # Quick Start
//!
//! ```no_run
//! use gocd_provider::{GocdProvider, ProviderService};
//! use serde_json::json;
//!
//! # async fn example() -> gocd_provider::Result<()> {
//! let provider = GocdProvider::new();
//! provider
//!     .configure(json!({"baseurl": "https://ci.example.com", "username": "admin", "password": "secret"}))
//!     .await?;
//!
//! let state = provider
//!     .create("gocd_pipeline", json!({
//!         "name": "build",
//!         "group": "ops",
//!         "materials": [{"type": "git", "attributes": {"url": "https://github.com/gocd/gocd"}}],
//!         "stages": [{"name": "compile", "jobs": [{"name": "make", "tasks": []}]}]
//!     }))
//!     .await?;
//! println!("created at version {}", state["version"]);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod cli;
pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod logging;
pub mod models;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::{ApiResponse, GocdClient};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{GocdProvider, ProviderService};
pub use schema::ProviderSchema;
pub use types::{AttributeChange, ChangeAction, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate};

// Re-export async_trait for implementors of ProviderService
pub use async_trait::async_trait;
pub use serde_json;
