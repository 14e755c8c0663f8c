//! Staged filtering over an immutable [`Catalog`].
//!
//! Stages run Language → Brand → ProductGroup → Records. Every option set is
//! derived from the records that survive all prior stages, compared with exact,
//! case-sensitive string equality. Option sets are deduplicated and sorted
//! ordinally; matched records keep catalog order and are never deduplicated.

use crate::domain::model::{Catalog, Record, Stage};
use crate::utils::error::{FinderError, Result};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy)]
pub struct FilterCascade<'a> {
    catalog: &'a Catalog,
}

impl<'a> FilterCascade<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Whether the cascade starts with a Language stage.
    ///
    /// A localized catalog whose rows all have a blank Language has nothing to
    /// choose from, so the cascade starts at Brand instead. An empty localized
    /// catalog keeps the stage and fails there.
    pub fn has_language_stage(&self) -> bool {
        if !self.catalog.variant().is_localized() {
            return false;
        }
        let records = self.catalog.records();
        records.is_empty()
            || records
                .iter()
                .any(|record| record.language.as_deref().is_some_and(|l| !l.is_empty()))
    }

    /// 第一層：語言。非在地化目錄回傳 `Ok(None)`，代表跳過此層
    pub fn language_stage(&self) -> Result<Option<Vec<String>>> {
        if self.has_language_stage() {
            self.available_languages().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Distinct non-empty `Language` values, sorted ascending.
    pub fn available_languages(&self) -> Result<Vec<String>> {
        let languages = distinct(
            self.catalog
                .records()
                .iter()
                .filter_map(|record| record.language.as_deref())
                .filter(|language| !language.is_empty()),
        );
        non_empty(Stage::Language, languages)
    }

    pub fn available_brands(&self, language: Option<&str>) -> Result<Vec<String>> {
        let brands = distinct(self.by_language(language).map(|record| record.brand.as_str()));
        non_empty(Stage::Brand, brands)
    }

    pub fn available_product_groups(
        &self,
        language: Option<&str>,
        brand: &str,
    ) -> Result<Vec<String>> {
        let groups = distinct(
            self.by_brand(language, brand)
                .map(|record| record.product_group.as_str()),
        );
        non_empty(Stage::ProductGroup, groups)
    }

    /// 最終結果：可能為空（「查無模板」是正常結果，不是錯誤）
    pub fn matched_records(
        &self,
        language: Option<&str>,
        brand: &str,
        product_group: &str,
    ) -> Vec<&'a Record> {
        self.by_brand(language, brand)
            .filter(|record| record.product_group == product_group)
            .collect()
    }

    fn by_language<'q>(&self, language: Option<&'q str>) -> impl Iterator<Item = &'a Record> + 'q
    where
        'a: 'q,
    {
        self.catalog
            .records()
            .iter()
            .filter(move |record| match language {
                Some(selected) => record.language.as_deref() == Some(selected),
                None => true,
            })
    }

    fn by_brand<'q>(
        &self,
        language: Option<&'q str>,
        brand: &'q str,
    ) -> impl Iterator<Item = &'a Record> + 'q
    where
        'a: 'q,
    {
        self.by_language(language)
            .filter(move |record| record.brand == brand)
    }
}

fn distinct<'r, I>(values: I) -> Vec<String>
where
    I: Iterator<Item = &'r str>,
{
    values
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn non_empty(stage: Stage, options: Vec<String>) -> Result<Vec<String>> {
    if options.is_empty() {
        tracing::debug!("Cascade halted: no options at the {} stage", stage);
        Err(FinderError::EmptyOptionSet { stage })
    } else {
        Ok(options)
    }
}
