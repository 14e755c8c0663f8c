use crate::core::cascade::FilterCascade;
use crate::domain::model::{Catalog, Record, Stage};
use crate::domain::ports::{DisplaySurface, ImageResolver};
use crate::utils::error::{FinderError, Result};
use serde::Serialize;
use std::sync::Arc;

/// The user's current picks. Every field is a plain key string as the display side sent it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub language: Option<String>,
    pub brand: Option<String>,
    pub product_group: Option<String>,
}

/// 一次完整解析後的畫面狀態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeView<'a> {
    /// `None` when the catalog has no Language stage.
    pub languages: Option<Vec<String>>,
    pub language: Option<String>,
    pub brands: Vec<String>,
    pub brand: String,
    pub product_groups: Vec<String>,
    pub product_group: String,
    pub records: Vec<&'a Record>,
    /// Stages whose previous selection was invalid and got replaced by the first option.
    pub resets: Vec<Stage>,
}

impl<'a> CascadeView<'a> {
    pub fn selection(&self) -> Selection {
        Selection {
            language: self.language.clone(),
            brand: Some(self.brand.clone()),
            product_group: Some(self.product_group.clone()),
        }
    }

    pub fn report(&self) -> ViewReport<'a> {
        ViewReport {
            selection: self.selection(),
            resets: self.resets.clone(),
            records: self.records.clone(),
        }
    }
}

/// 機器可讀的輸出：解析後的選擇 + 被重設的階段 + 符合的範本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewReport<'a> {
    pub selection: Selection,
    pub resets: Vec<Stage>,
    pub records: Vec<&'a Record>,
}

/// Per-interaction filter state over a shared catalog handle.
///
/// Changing an upstream selection drops every downstream selection that is no
/// longer offered under the new upstream value.
#[derive(Debug, Clone)]
pub struct Session {
    catalog: Arc<Catalog>,
    selection: Selection,
}

impl Session {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            selection: Selection::default(),
        }
    }

    pub fn with_selection(catalog: Arc<Catalog>, selection: Selection) -> Self {
        Self { catalog, selection }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn cascade(&self) -> FilterCascade<'_> {
        FilterCascade::new(&self.catalog)
    }

    /// 換上新的目錄（例如重新載入後），並清掉已經失效的選擇
    pub fn replace_catalog(&mut self, catalog: Arc<Catalog>) {
        self.catalog = catalog;
        self.revalidate_from(Stage::Language);
    }

    /// Ignored when the catalog has no active Language stage.
    pub fn select_language(&mut self, language: impl Into<String>) {
        if !self.cascade().has_language_stage() {
            tracing::debug!("Language stage inactive, ignoring language selection");
            self.selection.language = None;
            return;
        }
        self.selection.language = Some(language.into());
        self.revalidate_from(Stage::Brand);
    }

    pub fn select_brand(&mut self, brand: impl Into<String>) {
        self.selection.brand = Some(brand.into());
        self.revalidate_from(Stage::ProductGroup);
    }

    pub fn select_product_group(&mut self, product_group: impl Into<String>) {
        self.selection.product_group = Some(product_group.into());
    }

    pub fn clear(&mut self) {
        self.selection = Selection::default();
    }

    /// Drops selections at `from` and below that the current upstream picks no longer offer.
    fn revalidate_from(&mut self, from: Stage) {
        let cascade = FilterCascade::new(&self.catalog);
        let selection = &mut self.selection;

        if from <= Stage::Language {
            let offered = cascade.language_stage().ok().flatten();
            keep_if_offered(&mut selection.language, offered.as_deref(), Stage::Language);
            if !cascade.has_language_stage() {
                selection.language = None;
            }
        }

        if from <= Stage::Brand {
            let offered = cascade.available_brands(selection.language.as_deref()).ok();
            keep_if_offered(&mut selection.brand, offered.as_deref(), Stage::Brand);
        }

        let offered = match selection.brand.as_deref() {
            Some(brand) => cascade
                .available_product_groups(selection.language.as_deref(), brand)
                .ok(),
            None => None,
        };
        keep_if_offered(&mut selection.product_group, offered.as_deref(), Stage::ProductGroup);
    }

    /// 依序解析每一層；失效的選擇以第一個選項取代
    ///
    /// Halts with `EmptyOptionSet` at the first stage that has nothing to offer.
    pub fn view(&self) -> Result<CascadeView<'_>> {
        let cascade = self.cascade();
        let mut resets = Vec::new();

        let languages = cascade.language_stage()?;
        let language = match &languages {
            Some(options) => Some(pick(
                self.selection.language.as_deref(),
                options,
                Stage::Language,
                &mut resets,
            )),
            None => None,
        };

        let brands = cascade.available_brands(language.as_deref())?;
        let brand = pick(self.selection.brand.as_deref(), &brands, Stage::Brand, &mut resets);

        let product_groups = cascade.available_product_groups(language.as_deref(), &brand)?;
        let product_group = pick(
            self.selection.product_group.as_deref(),
            &product_groups,
            Stage::ProductGroup,
            &mut resets,
        );

        let records = cascade.matched_records(language.as_deref(), &brand, &product_group);
        tracing::debug!(
            "Resolved view: language={:?} brand={} group={} -> {} records",
            language,
            brand,
            product_group,
            records.len()
        );

        Ok(CascadeView {
            languages,
            language,
            brands,
            brand,
            product_groups,
            product_group,
            records,
            resets,
        })
    }

    /// Resolves the view and writes the resolved picks back, so the state never holds a stale value.
    pub fn commit(&mut self) -> Result<Selection> {
        let selection = self.view()?.selection();
        self.selection = selection.clone();
        Ok(selection)
    }
}

/// Drives a display surface through one interaction.
///
/// An empty stage is shown as "no data" and yields `Ok(None)`; the surface never
/// receives an empty option list.
pub fn present<'s, S: DisplaySurface>(
    session: &'s Session,
    surface: &mut S,
    resolver: &ImageResolver,
) -> Result<Option<CascadeView<'s>>> {
    let view = match session.view() {
        Ok(view) => view,
        Err(FinderError::EmptyOptionSet { stage }) => {
            surface.show_no_data(stage)?;
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    if let (Some(languages), Some(language)) = (&view.languages, &view.language) {
        surface.show_options(Stage::Language, languages, language)?;
    }
    surface.show_options(Stage::Brand, &view.brands, &view.brand)?;
    surface.show_options(Stage::ProductGroup, &view.product_groups, &view.product_group)?;
    surface.show_records(&view.records, resolver)?;
    Ok(Some(view))
}

fn keep_if_offered(slot: &mut Option<String>, offered: Option<&[String]>, stage: Stage) {
    let still_valid = match (slot.as_deref(), offered) {
        (Some(current), Some(options)) => options.iter().any(|option| option == current),
        (None, _) => true,
        (Some(_), None) => false,
    };
    if !still_valid {
        tracing::debug!("Invalidated stale {} selection {:?}", stage, slot);
        *slot = None;
    }
}

fn pick(current: Option<&str>, options: &[String], stage: Stage, resets: &mut Vec<Stage>) -> String {
    match current {
        Some(value) if options.iter().any(|option| option == value) => value.to_string(),
        other => {
            if other.is_some() {
                resets.push(stage);
            }
            // options 由上游保證非空
            options[0].clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Payload, Variant};

    fn image(brand: &str, group: &str, name: &str, language: &str) -> Record {
        Record {
            brand: brand.to_string(),
            product_group: group.to_string(),
            template_name: name.to_string(),
            payload: Payload::Image(format!("{}.png", name)),
            language: Some(language.to_string()),
        }
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::new(
            Variant::Image,
            vec![
                image("Acme", "Shoes", "T1", "EN"),
                image("Acme", "Bags", "T2", "EN"),
                image("Bolt", "Hats", "T3", "EN"),
                image("Acme", "Shoes", "T4", "DE"),
            ],
        ))
    }

    #[test]
    fn test_defaults_to_first_option_at_each_stage() {
        let session = Session::new(catalog());
        let view = session.view().unwrap();

        assert_eq!(view.languages, Some(vec!["DE".to_string(), "EN".to_string()]));
        assert_eq!(view.language.as_deref(), Some("DE"));
        assert_eq!(view.brand, "Acme");
        assert_eq!(view.product_group, "Shoes");
        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].template_name, "T4");
        assert!(view.resets.is_empty());
    }

    #[test]
    fn test_changing_brand_drops_incompatible_product_group() {
        let mut session = Session::new(catalog());
        session.select_language("EN");
        session.select_brand("Acme");
        session.select_product_group("Bags");
        assert_eq!(session.view().unwrap().records[0].template_name, "T2");

        session.select_brand("Bolt");
        assert_eq!(session.selection().product_group, None);

        let view = session.view().unwrap();
        assert_eq!(view.product_group, "Hats");
        assert_eq!(view.records[0].template_name, "T3");
    }

    #[test]
    fn test_changing_brand_keeps_compatible_product_group() {
        let mut session = Session::new(catalog());
        session.select_language("EN");
        session.select_brand("Acme");
        session.select_product_group("Shoes");
        session.select_language("DE");

        assert_eq!(session.selection().brand.as_deref(), Some("Acme"));
        assert_eq!(session.selection().product_group.as_deref(), Some("Shoes"));
    }

    #[test]
    fn test_changing_language_cascades_invalidation() {
        let mut session = Session::new(catalog());
        session.select_language("EN");
        session.select_brand("Bolt");
        session.select_product_group("Hats");

        session.select_language("DE");
        assert_eq!(session.selection().brand, None);
        assert_eq!(session.selection().product_group, None);
    }

    #[test]
    fn test_stale_selection_is_reported_as_reset() {
        let selection = Selection {
            language: Some("EN".to_string()),
            brand: Some("Acme".to_string()),
            product_group: Some("Hats".to_string()),
        };
        let mut session = Session::with_selection(catalog(), selection);
        let view = session.view().unwrap();
        assert_eq!(view.resets, vec![Stage::ProductGroup]);
        assert_eq!(view.product_group, "Bags");

        let committed = session.commit().unwrap();
        assert_eq!(committed.product_group.as_deref(), Some("Bags"));
        assert_eq!(session.selection(), &committed);
    }

    #[test]
    fn test_unknown_language_resets_instead_of_filtering_to_empty() {
        let mut session = Session::new(catalog());
        session.select_language("FR");
        let view = session.view().unwrap();
        assert_eq!(view.language.as_deref(), Some("DE"));
        assert_eq!(view.resets, vec![Stage::Language]);
    }

    #[test]
    fn test_report_carries_resolved_selection_and_resets() {
        let mut session = Session::new(catalog());
        session.select_language("FR");
        let view = session.view().unwrap();

        let json = serde_json::to_value(view.report()).unwrap();
        assert_eq!(json["selection"]["language"], "DE");
        assert_eq!(json["selection"]["brand"], "Acme");
        assert_eq!(json["selection"]["product_group"], "Shoes");
        assert_eq!(json["resets"], serde_json::json!(["language"]));
        assert_eq!(json["records"].as_array().map(|r| r.len()), Some(1));
        assert_eq!(json["records"][0]["template_name"], "T4");
    }

    #[test]
    fn test_empty_catalog_halts_the_view() {
        let session = Session::new(Arc::new(Catalog::new(Variant::Content, vec![])));
        assert!(matches!(
            session.view(),
            Err(FinderError::EmptyOptionSet {
                stage: Stage::Brand
            })
        ));
    }

    #[test]
    fn test_all_blank_languages_still_show_records() {
        let catalog = Arc::new(Catalog::new(
            Variant::Image,
            vec![image("Acme", "Shoes", "T1", ""), image("Acme", "Shoes", "T2", "")],
        ));
        let mut session = Session::new(catalog);
        session.select_language("EN");
        session.select_brand("Acme");

        let view = session.view().unwrap();
        assert_eq!(view.languages, None);
        assert_eq!(view.language, None);
        assert_eq!(view.records.len(), 2);
        assert_eq!(session.selection().language, None);
    }

    #[test]
    fn test_replace_catalog_revalidates_selection() {
        let mut session = Session::new(catalog());
        session.select_language("EN");
        session.select_brand("Bolt");
        session.select_product_group("Hats");

        let reloaded = Arc::new(Catalog::new(
            Variant::Image,
            vec![image("Acme", "Shoes", "T1", "EN")],
        ));
        session.replace_catalog(reloaded);
        assert_eq!(session.selection().language.as_deref(), Some("EN"));
        assert_eq!(session.selection().brand, None);
        assert_eq!(session.selection().product_group, None);
    }

    #[derive(Default)]
    struct RecordingSurface {
        options: Vec<(Stage, Vec<String>, String)>,
        no_data: Vec<Stage>,
        shown: Vec<String>,
    }

    impl DisplaySurface for RecordingSurface {
        fn show_options(&mut self, stage: Stage, options: &[String], selected: &str) -> Result<()> {
            self.options.push((stage, options.to_vec(), selected.to_string()));
            Ok(())
        }

        fn show_no_data(&mut self, stage: Stage) -> Result<()> {
            self.no_data.push(stage);
            Ok(())
        }

        fn show_records(&mut self, records: &[&Record], resolver: &ImageResolver) -> Result<()> {
            self.shown = records
                .iter()
                .filter_map(|record| resolver.resolve(record))
                .collect();
            Ok(())
        }
    }

    #[test]
    fn test_present_renders_every_stage_then_records() {
        let mut session = Session::new(catalog());
        session.select_language("EN");
        let mut surface = RecordingSurface::default();

        let view = present(&session, &mut surface, &ImageResolver::new("img/"))
            .unwrap()
            .unwrap();
        assert_eq!(view.brand, "Acme");

        let stages: Vec<Stage> = surface.options.iter().map(|(stage, _, _)| *stage).collect();
        assert_eq!(stages, vec![Stage::Language, Stage::Brand, Stage::ProductGroup]);
        assert_eq!(surface.options[2].1, vec!["Bags", "Shoes"]);
        assert_eq!(surface.shown, vec!["img/T2.png"]);
        assert!(surface.no_data.is_empty());
    }

    #[test]
    fn test_present_reports_no_data_instead_of_empty_selector() {
        let session = Session::new(Arc::new(Catalog::new(Variant::Image, vec![])));
        let mut surface = RecordingSurface::default();

        let view = present(&session, &mut surface, &ImageResolver::default()).unwrap();
        assert!(view.is_none());
        assert_eq!(surface.no_data, vec![Stage::Language]);
        assert!(surface.options.is_empty());
    }
}
