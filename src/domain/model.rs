use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const COL_BRAND: &str = "Brand";
pub const COL_PRODUCT_GROUP: &str = "ProductGroup";
pub const COL_TEMPLATE_NAME: &str = "TemplateName";
pub const COL_TEMPLATE_CONTENT: &str = "TemplateContent";
pub const COL_IMAGE_FILE: &str = "ImageFile";
pub const COL_LANGUAGE: &str = "Language";

/// 部署型態：決定 CSV 的固定欄位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Brand, ProductGroup, TemplateName, TemplateContent
    Content,
    /// Brand, ProductGroup, TemplateName, ImageFile, Language
    Image,
}

impl Variant {
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Variant::Content => &[
                COL_BRAND,
                COL_PRODUCT_GROUP,
                COL_TEMPLATE_NAME,
                COL_TEMPLATE_CONTENT,
            ],
            Variant::Image => &[
                COL_BRAND,
                COL_PRODUCT_GROUP,
                COL_TEMPLATE_NAME,
                COL_IMAGE_FILE,
                COL_LANGUAGE,
            ],
        }
    }

    /// Only the image variant carries a Language column.
    pub fn is_localized(&self) -> bool {
        matches!(self, Variant::Image)
    }

    /// 從表頭推斷型態；兩種都不完整時回傳 None
    pub fn detect<'a, I>(headers: I) -> Option<Variant>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let headers: Vec<&str> = headers.into_iter().collect();
        [Variant::Image, Variant::Content]
            .into_iter()
            .find(|variant| variant.missing_columns(&headers).is_empty())
    }

    pub fn missing_columns(&self, headers: &[&str]) -> Vec<&'static str> {
        self.required_columns()
            .iter()
            .copied()
            .filter(|column| !headers.contains(column))
            .collect()
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Content => write!(f, "content"),
            Variant::Image => write!(f, "image"),
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "content" => Ok(Variant::Content),
            "image" => Ok(Variant::Image),
            other => Err(format!(
                "unknown variant '{}', expected 'content' or 'image'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Payload {
    Content(String),
    Image(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub brand: String,
    pub product_group: String,
    pub template_name: String,
    pub payload: Payload,
    /// `None` when the catalog has no Language column; an empty cell is `Some("")`.
    pub language: Option<String>,
}

impl Record {
    pub fn content(&self) -> Option<&str> {
        match &self.payload {
            Payload::Content(text) => Some(text),
            Payload::Image(_) => None,
        }
    }

    pub fn image_file(&self) -> Option<&str> {
        match &self.payload {
            Payload::Image(file) => Some(file),
            Payload::Content(_) => None,
        }
    }

    /// 下載檔名：`<TemplateName>.<ext>`
    pub fn download_name(&self, extension: &str) -> String {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() {
            self.template_name.clone()
        } else {
            format!("{}.{}", self.template_name, extension)
        }
    }
}

/// The immutable in-memory table. Built once by the loader and shared as `Arc<Catalog>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    variant: Variant,
    records: Vec<Record>,
    source: Option<PathBuf>,
}

impl Catalog {
    pub fn new(variant: Variant, records: Vec<Record>) -> Self {
        Self {
            variant,
            records,
            source: None,
        }
    }

    pub(crate) fn with_source(mut self, source: PathBuf) -> Self {
        self.source = Some(source);
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One level of the filter cascade, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Language,
    Brand,
    ProductGroup,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Language => "language",
            Stage::Brand => "brand",
            Stage::ProductGroup => "product group",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_variant_from_headers() {
        let content = ["Brand", "ProductGroup", "TemplateName", "TemplateContent"];
        assert_eq!(Variant::detect(content), Some(Variant::Content));

        let image = ["Language", "Brand", "ProductGroup", "TemplateName", "ImageFile"];
        assert_eq!(Variant::detect(image), Some(Variant::Image));

        let broken = ["Brand", "TemplateName"];
        assert_eq!(Variant::detect(broken), None);
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let headers = ["Brand", "ProductGroup", "TemplateName", "ImageFile"];
        assert_eq!(Variant::Image.missing_columns(&headers), vec!["Language"]);
    }

    #[test]
    fn test_download_name() {
        let record = Record {
            brand: "Acme".to_string(),
            product_group: "Shoes".to_string(),
            template_name: "Welcome".to_string(),
            payload: Payload::Content("<p>hi</p>".to_string()),
            language: None,
        };
        assert_eq!(record.download_name("html"), "Welcome.html");
        assert_eq!(record.download_name(".txt"), "Welcome.txt");
        assert_eq!(record.download_name(""), "Welcome");
        assert_eq!(record.content(), Some("<p>hi</p>"));
        assert_eq!(record.image_file(), None);
    }
}
