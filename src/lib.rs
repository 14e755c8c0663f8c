pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::FinderConfig;

pub use crate::adapters::{LocalStorage, TextSurface};
pub use crate::core::cache::{CachePolicy, CatalogCache};
pub use crate::core::cascade::FilterCascade;
pub use crate::core::loader::{load_catalog, load_catalog_from_reader, LoadOptions};
pub use crate::core::session::{present, CascadeView, Selection, Session, ViewReport};
pub use crate::domain::model::{Catalog, Payload, Record, Stage, Variant};
pub use crate::domain::ports::{ConfigProvider, DisplaySurface, ImageResolver};
pub use crate::utils::error::{FinderError, Result};
