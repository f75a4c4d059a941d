//! Retail assistant tools over a search engine.
//!
//! This crate provides:
//! - Configuration loading (connection credentials, index names, field tables)
//! - An HTTP search client behind the [`search::SearchBackend`] trait
//! - The tool façade: one operation per assistant tool, each returning a
//!   [`retail_agents_core::ResultEnvelope`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod search;
pub mod tools;

pub use config::{ConfigError, ConnectionConfig, RetailConfig, ToolSettings};
pub use error::ToolError;
pub use search::{EsClient, SearchBackend, SearchError};
pub use tools::{RetailTools, Tool, all_retail_tools, get_tool_by_name, get_tools_by_domain};
