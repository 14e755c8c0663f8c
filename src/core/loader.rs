use crate::domain::model::{
    Catalog, Payload, Record, Variant, COL_BRAND, COL_IMAGE_FILE, COL_LANGUAGE,
    COL_PRODUCT_GROUP, COL_TEMPLATE_CONTENT, COL_TEMPLATE_NAME,
};
use crate::utils::error::{FinderError, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// 指定型態時會驗證表頭；未指定則由表頭推斷
    pub variant: Option<Variant>,
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            variant: None,
            delimiter: b',',
        }
    }
}

/// Column positions resolved once from the header row.
struct ColumnMap {
    brand: usize,
    product_group: usize,
    template_name: usize,
    payload: usize,
    language: Option<usize>,
}

impl ColumnMap {
    fn resolve(variant: Variant, headers: &StringRecord) -> Option<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let payload_column = match variant {
            Variant::Content => COL_TEMPLATE_CONTENT,
            Variant::Image => COL_IMAGE_FILE,
        };
        let language = if variant.is_localized() {
            Some(find(COL_LANGUAGE)?)
        } else {
            None
        };
        Some(Self {
            brand: find(COL_BRAND)?,
            product_group: find(COL_PRODUCT_GROUP)?,
            template_name: find(COL_TEMPLATE_NAME)?,
            payload: find(payload_column)?,
            language,
        })
    }
}

/// 讀取 CSV 目錄檔；檔案不存在時回傳 SourceNotFound
pub fn load_catalog<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Catalog> {
    let path = path.as_ref();
    let origin = path.display().to_string();

    tracing::debug!("Loading catalog from: {}", origin);
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FinderError::SourceNotFound {
            path: origin.clone(),
        },
        _ => FinderError::MalformedSource {
            path: origin.clone(),
            message: e.to_string(),
        },
    })?;

    let catalog = read_catalog(file, options, &origin)?.with_source(path.to_path_buf());
    tracing::info!(
        "📂 Loaded {} records ({} variant) from {}",
        catalog.len(),
        catalog.variant(),
        origin
    );
    Ok(catalog)
}

pub fn load_catalog_from_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Catalog> {
    read_catalog(reader, options, "<reader>")
}

fn read_catalog<R: Read>(reader: R, options: &LoadOptions, origin: &str) -> Result<Catalog> {
    let malformed = |message: String| FinderError::MalformedSource {
        path: origin.to_string(),
        message,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| malformed(e.to_string()))?
        .clone();
    let header_names: Vec<&str> = headers.iter().collect();

    let variant = match options.variant {
        Some(variant) => {
            let missing = variant.missing_columns(&header_names);
            if !missing.is_empty() {
                return Err(malformed(format!(
                    "missing columns for {} variant: {}",
                    variant,
                    missing.join(", ")
                )));
            }
            variant
        }
        None => Variant::detect(header_names.iter().copied()).ok_or_else(|| {
            malformed(format!(
                "header [{}] matches neither the content nor the image layout",
                header_names.join(", ")
            ))
        })?,
    };

    let columns = ColumnMap::resolve(variant, &headers)
        .ok_or_else(|| malformed("header could not be mapped".to_string()))?;

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        // 第 1 列是表頭，資料列從第 2 列開始
        let row = row.map_err(|e| malformed(format!("row {}: {}", index + 2, e)))?;
        records.push(to_record(&row, &columns, variant));
    }

    tracing::debug!("Parsed {} data rows", records.len());
    Ok(Catalog::new(variant, records))
}

fn to_record(row: &StringRecord, columns: &ColumnMap, variant: Variant) -> Record {
    // 缺少的儲存格一律視為空字串
    let cell = |index: usize| row.get(index).unwrap_or("").to_string();
    let payload = match variant {
        Variant::Content => Payload::Content(cell(columns.payload)),
        Variant::Image => Payload::Image(cell(columns.payload)),
    };
    Record {
        brand: cell(columns.brand),
        product_group: cell(columns.product_group),
        template_name: cell(columns.template_name),
        payload,
        language: columns.language.map(cell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_content_variant() {
        let csv = "Brand,ProductGroup,TemplateName,TemplateContent\n\
                   Acme,Shoes,Welcome,<p>Hello</p>\n\
                   Acme,Bags,Promo,\"<p>a, b</p>\"\n";
        let catalog = load_catalog_from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(catalog.variant(), Variant::Content);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[1].content(), Some("<p>a, b</p>"));
        assert_eq!(catalog.records()[0].language, None);
    }

    #[test]
    fn test_missing_cells_become_empty_strings() {
        let csv = "Brand,ProductGroup,TemplateName,ImageFile,Language\n\
                   Acme,Shoes,T1,,\n\
                   Acme,Shoes,T2\n";
        let catalog = load_catalog_from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(catalog.variant(), Variant::Image);
        for record in catalog.records() {
            assert_eq!(record.image_file(), Some(""));
            assert_eq!(record.language.as_deref(), Some(""));
        }
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let csv = "Notes,Language,TemplateName,ImageFile,ProductGroup,Brand\n\
                   x,DE,T1,t1.png,Shoes,Acme\n";
        let catalog = load_catalog_from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap();
        let record = &catalog.records()[0];

        assert_eq!(record.brand, "Acme");
        assert_eq!(record.product_group, "Shoes");
        assert_eq!(record.image_file(), Some("t1.png"));
        assert_eq!(record.language.as_deref(), Some("DE"));
    }

    #[test]
    fn test_configured_variant_must_match_header() {
        let csv = "Brand,ProductGroup,TemplateName,TemplateContent\nAcme,Shoes,T1,x\n";
        let options = LoadOptions {
            variant: Some(Variant::Image),
            ..LoadOptions::default()
        };
        let err = load_catalog_from_reader(csv.as_bytes(), &options).unwrap_err();
        assert!(matches!(err, FinderError::MalformedSource { .. }));
        assert!(err.to_string().contains("ImageFile"));
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let err = load_catalog_from_reader("".as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, FinderError::MalformedSource { .. }));
    }

    #[test]
    fn test_undecodable_row_is_malformed_with_row_number() {
        let mut csv = b"Brand,ProductGroup,TemplateName,TemplateContent\nAcme,Shoes,T1,".to_vec();
        csv.extend_from_slice(&[0xff, 0xfe, b'\n']);
        let err = load_catalog_from_reader(csv.as_slice(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, FinderError::MalformedSource { .. }));
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_header_only_is_an_empty_catalog() {
        let csv = "Brand,ProductGroup,TemplateName,TemplateContent\n";
        let catalog = load_catalog_from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_semicolon_delimiter() {
        let csv = "Brand;ProductGroup;TemplateName;TemplateContent\nAcme;Shoes;T1;a,b\n";
        let options = LoadOptions {
            delimiter: b';',
            ..LoadOptions::default()
        };
        let catalog = load_catalog_from_reader(csv.as_bytes(), &options).unwrap();
        assert_eq!(catalog.records()[0].content(), Some("a,b"));
    }

    #[test]
    fn test_load_from_file_and_missing_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"Brand,ProductGroup,TemplateName,TemplateContent\nAcme,Shoes,T1,x\n")
            .unwrap();

        let catalog = load_catalog(temp_file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.source().map(|p| p.as_path()), Some(temp_file.path()));

        let err = load_catalog("/definitely/not/here.csv", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, FinderError::SourceNotFound { .. }));
    }
}
