//! Error types for each collaborator, plus the session-level union.

use std::path::PathBuf;

use thiserror::Error;

use crate::editor::{ClientField, CompanyField};

/// A field that blocks submission. Never reaches the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    EmptyClientField(ClientField),

    #[error("company {0} is required")]
    EmptyCompanyField(CompanyField),

    #[error("item {} needs a description", .0 + 1)]
    EmptyDescription(usize),

    #[error("item {} needs a whole quantity of at least 1", .0 + 1)]
    InvalidQuantity(usize),

    #[error("item {} needs a price of zero or more", .0 + 1)]
    InvalidUnitPrice(usize),

    #[error("amounts are too large to total")]
    TotalTooLarge,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server rejected append ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Unexpected store response: {0}")]
    InvalidResponse(String),

    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("'{0}' is not installed or not on PATH")]
    TypstMissing(String),

    #[error("typst failed to compile {}", .0.display())]
    Compile(PathBuf),

    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Template IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("action not available while {0}")]
    WrongState(&'static str),

    #[error("quote is not ready to submit")]
    Invalid(Vec<ValidationError>),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
