use crate::domain::model::{Record, Stage};
use crate::utils::error::Result;

/// 外部顯示端：接收選項與結果並負責呈現
pub trait DisplaySurface {
    fn show_options(&mut self, stage: Stage, options: &[String], selected: &str) -> Result<()>;
    fn show_no_data(&mut self, stage: Stage) -> Result<()>;
    fn show_records(&mut self, records: &[&Record], resolver: &ImageResolver) -> Result<()>;
}

pub trait ConfigProvider {
    fn source_path(&self) -> &str;
    fn image_base(&self) -> &str;
    fn download_extension(&self) -> &str;
}

/// Builds image references by plain concatenation of a base location and `ImageFile`.
/// The base is passed through as configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageResolver {
    base: String,
}

impl ImageResolver {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn resolve(&self, record: &Record) -> Option<String> {
        record
            .image_file()
            .map(|file| format!("{}{}", self.base, file))
    }
}
