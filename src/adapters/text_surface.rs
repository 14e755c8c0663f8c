use crate::domain::model::{Payload, Record, Stage};
use crate::domain::ports::{DisplaySurface, ImageResolver};
use crate::utils::error::Result;
use std::io::Write;

pub const NO_TEMPLATES_MESSAGE: &str = "No templates found for this combination.";

/// Plain-text display surface for terminals and pipes.
pub struct TextSurface<W: Write> {
    out: W,
    download_extension: String,
}

impl<W: Write> TextSurface<W> {
    pub fn new(out: W, download_extension: impl Into<String>) -> Self {
        Self {
            out,
            download_extension: download_extension.into(),
        }
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// 一行一個選項，供 `languages` / `brands` / `groups` 子命令使用
    pub fn list(&mut self, options: &[String]) -> Result<()> {
        for option in options {
            writeln!(self.out, "{}", option)?;
        }
        Ok(())
    }

    fn write_record(&mut self, record: &Record, resolver: &ImageResolver) -> Result<()> {
        writeln!(self.out, "### {}", record.template_name)?;
        match &record.payload {
            Payload::Content(text) => {
                writeln!(self.out, "```html")?;
                writeln!(self.out, "{}", text)?;
                writeln!(self.out, "```")?;
                writeln!(
                    self.out,
                    "download: {}",
                    record.download_name(&self.download_extension)
                )?;
            }
            Payload::Image(_) => {
                let reference = resolver.resolve(record).unwrap_or_default();
                writeln!(self.out, "image: {}", reference)?;
            }
        }
        Ok(())
    }
}

impl<W: Write> DisplaySurface for TextSurface<W> {
    fn show_options(&mut self, stage: Stage, options: &[String], selected: &str) -> Result<()> {
        let rendered: Vec<String> = options
            .iter()
            .enumerate()
            .map(|(index, option)| {
                if option == selected {
                    format!("[{}] *{}*", index + 1, option)
                } else {
                    format!("[{}] {}", index + 1, option)
                }
            })
            .collect();
        writeln!(self.out, "{}: {}", stage_title(stage), rendered.join("  "))?;
        Ok(())
    }

    fn show_no_data(&mut self, stage: Stage) -> Result<()> {
        writeln!(self.out, "No data available for {}.", stage.label())?;
        Ok(())
    }

    fn show_records(&mut self, records: &[&Record], resolver: &ImageResolver) -> Result<()> {
        writeln!(self.out, "---")?;
        if records.is_empty() {
            writeln!(self.out, "{}", NO_TEMPLATES_MESSAGE)?;
            return Ok(());
        }
        writeln!(self.out, "Found {} template(s)", records.len())?;
        for record in records {
            self.write_record(record, resolver)?;
        }
        Ok(())
    }
}

fn stage_title(stage: Stage) -> &'static str {
    match stage {
        Stage::Language => "Language",
        Stage::Brand => "Brand",
        Stage::ProductGroup => "Product group",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(surface: TextSurface<Vec<u8>>) -> String {
        String::from_utf8(surface.into_inner()).unwrap()
    }

    #[test]
    fn test_options_mark_the_selection() {
        let mut surface = TextSurface::new(Vec::new(), "html");
        let options = vec!["Acme".to_string(), "Bolt".to_string()];
        surface.show_options(Stage::Brand, &options, "Bolt").unwrap();
        assert_eq!(rendered(surface), "Brand: [1] Acme  [2] *Bolt*\n");
    }

    #[test]
    fn test_content_record_shows_download_name() {
        let record = Record {
            brand: "Acme".to_string(),
            product_group: "Shoes".to_string(),
            template_name: "Welcome".to_string(),
            payload: Payload::Content("<p>Hi</p>".to_string()),
            language: None,
        };
        let mut surface = TextSurface::new(Vec::new(), "html");
        surface
            .show_records(&[&record], &ImageResolver::default())
            .unwrap();

        let text = rendered(surface);
        assert!(text.contains("### Welcome"));
        assert!(text.contains("<p>Hi</p>"));
        assert!(text.contains("download: Welcome.html"));
    }

    #[test]
    fn test_image_record_shows_resolved_reference() {
        let record = Record {
            brand: "Acme".to_string(),
            product_group: "Shoes".to_string(),
            template_name: "Banner".to_string(),
            payload: Payload::Image("acme/banner.png".to_string()),
            language: Some("DE".to_string()),
        };
        let mut surface = TextSurface::new(Vec::new(), "html");
        surface
            .show_records(&[&record], &ImageResolver::new("https://cdn.example.com/"))
            .unwrap();
        assert!(rendered(surface).contains("image: https://cdn.example.com/acme/banner.png"));
    }

    #[test]
    fn test_empty_result_and_no_data_messages() {
        let mut surface = TextSurface::new(Vec::new(), "html");
        surface.show_records(&[], &ImageResolver::default()).unwrap();
        surface.show_no_data(Stage::Brand).unwrap();

        let text = rendered(surface);
        assert!(text.contains(NO_TEMPLATES_MESSAGE));
        assert!(text.contains("No data available for brand."));
    }
}
