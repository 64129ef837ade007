//! Line-itemized quotes and payment receipts: edit, seal, persist, export.

pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod model;
pub mod notify;
pub mod render;
pub mod session;
pub mod store;
pub mod wizard;

pub use editor::{ClientField, CompanyField, ItemField, QuoteEditor};
pub use error::{ExportError, RenderError, SessionError, StoreError, ValidationError};
pub use model::{compute_total, CompanyProfile, DocumentKind, LineItem, Quote};
pub use render::{DocumentRenderer, RenderedDocument};
pub use session::{Session, SessionState};
