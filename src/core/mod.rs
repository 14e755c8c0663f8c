pub mod cache;
pub mod cascade;
pub mod loader;
pub mod session;

pub use crate::domain::model::{Catalog, Payload, Record, Stage, Variant};
pub use crate::domain::ports::{ConfigProvider, DisplaySurface, ImageResolver};
pub use crate::utils::error::Result;
