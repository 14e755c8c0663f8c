use crate::domain::model::Record;
use crate::utils::error::Result;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::{FileOptions, ZipWriter};

/// Writes template downloads below a base directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn write_file(&self, path: &str, data: &[u8]) -> Result<PathBuf> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&full_path, data)?;
        Ok(full_path)
    }

    /// 每個內容模板寫成 `<TemplateName>.<ext>`；圖片紀錄沒有內容可下載，略過
    pub fn export_templates(&self, records: &[&Record], extension: &str) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (name, content) in download_entries(records, extension) {
            written.push(self.write_file(&name, content.as_bytes())?);
        }
        tracing::info!("💾 Exported {} template(s) to {}", written.len(), self.base_path.display());
        Ok(written)
    }

    /// Bundles every content template into one ZIP archive under the base directory.
    pub fn export_zip(&self, records: &[&Record], extension: &str, archive_name: &str) -> Result<PathBuf> {
        let entries = download_entries(records, extension);
        tracing::debug!("Creating ZIP file with {} files", entries.len());

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for (name, content) in &entries {
                zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
                zip.write_all(content.as_bytes())?;
            }
            // 完成並取回底層 Vec<u8>
            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        let path = self.write_file(archive_name, &zip_data)?;
        tracing::info!("📦 Bundled {} template(s) into {}", entries.len(), path.display());
        Ok(path)
    }
}

/// Pairs each content record with a unique, flat file name. Repeated names get `-2`, `-3`, ...
fn download_entries<'r>(records: &[&'r Record], extension: &str) -> Vec<(String, &'r str)> {
    let mut used: HashSet<String> = HashSet::new();
    let mut entries = Vec::new();

    for &record in records {
        let Some(content) = record.content() else {
            tracing::warn!("Skipping '{}': image records have no downloadable content", record.template_name);
            continue;
        };

        let base = sanitize(&record.template_name);
        let mut stem = base.clone();
        let mut suffix = 1;
        while !used.insert(stem.clone()) {
            suffix += 1;
            stem = format!("{}-{}", base, suffix);
        }

        let mut flat = record.clone();
        flat.template_name = stem;
        entries.push((flat.download_name(extension), content));
    }
    entries
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "template".to_string(),
        _ => cleaned,
    }
}
