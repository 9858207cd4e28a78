//! End-to-end conversion of one record set into section documents.
//!
//! Records are filtered, rewritten under a path prefix, routed to sections
//! and each section is emitted independently. A failing section is reported
//! with its error and does not stop the others.

use std::{fs, path::Path, sync::Arc};

use log::info;
use unic_langid::LanguageIdentifier;

#[cfg(feature = "multithreading")]
use rayon::prelude::*;

use crate::{
    config::{ConvertOptions, OTHER_SECTION, SectionSpec, TransformSpec},
    emitter::TreeEmitter,
    error::Error,
    filter::RecordFilter,
    item::Item,
    rbnf::{self, is_rbnf_prefix},
    rewrite::PathRewriter,
    rules::ConvertRules,
    section::SectionRouter,
    sort::{ItemComparator, SemanticComparator},
    source::Record,
    writer::JsonTreeWriter,
};

/// One finished output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOutput {
    pub name: String,
    pub package: Option<String>,
    /// Pretty-printed JSON text.
    pub document: String,
    pub value_count: usize,
}

impl SectionOutput {
    pub fn file_name(&self) -> String {
        format!("{}.json", self.name)
    }
}

#[derive(Debug, Default)]
pub struct ConversionReport {
    pub outputs: Vec<SectionOutput>,
    /// Sections that failed, with the error that aborted them.
    pub failures: Vec<(String, Error)>,
}

impl ConversionReport {
    pub fn output(&self, name: &str) -> Option<&SectionOutput> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn value_count(&self) -> usize {
        self.outputs.iter().map(|o| o.value_count).sum()
    }
}

#[derive(Debug, Clone, Copy)]
struct EmitContext<'a> {
    region: Option<&'a str>,
    rbnf: bool,
}

pub struct Converter {
    rules: Arc<ConvertRules>,
    rewriter: PathRewriter,
    router: SectionRouter,
    options: ConvertOptions,
    comparator: Arc<dyn ItemComparator>,
}

impl Converter {
    /// Converter with the built-in rules, sections and transforms.
    pub fn new(options: ConvertOptions) -> Result<Self, Error> {
        Self::with_config(ConvertRules::default(), None, None, options)
    }

    /// Converter with custom section and transform lists; `None` keeps the
    /// built-in list.
    pub fn with_config(
        rules: ConvertRules,
        sections: Option<&[SectionSpec]>,
        transforms: Option<Vec<TransformSpec>>,
        options: ConvertOptions,
    ) -> Result<Self, Error> {
        let router = match sections {
            Some(sections) => SectionRouter::new(sections)?,
            None => SectionRouter::builtin()?,
        };
        let mut rewriter = match transforms {
            Some(transforms) => PathRewriter::new(transforms)?,
            None => PathRewriter::builtin()?,
        };
        if let Some(version) = &options.cldr_version {
            rewriter = rewriter.with_version(version)?;
        }
        Ok(Self {
            rules: Arc::new(rules),
            rewriter,
            router,
            options,
            comparator: Arc::new(SemanticComparator),
        })
    }

    pub fn with_comparator(mut self, comparator: Arc<dyn ItemComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn rules(&self) -> &ConvertRules {
        &self.rules
    }

    pub fn rewriter(&self) -> &PathRewriter {
        &self.rewriter
    }

    pub fn router(&self) -> &SectionRouter {
        &self.router
    }

    /// Prefix that replaces the LDML root, e.g. `/main/en-GB/` or `/supplemental/`.
    ///
    /// `locale` only applies to the `main` kind and is canonicalized with
    /// [`canonical_locale`].
    pub fn path_prefix(kind: &str, locale: Option<&str>) -> String {
        match (kind, locale) {
            ("main", Some(locale)) => format!("/main/{}/", canonical_locale(locale)),
            (kind, _) => format!("/{}/", kind),
        }
    }

    /// Rewrites records into items, dropping filtered and emptied ones.
    pub fn prepare(&self, records: &[Record], prefix: &str) -> Vec<Item> {
        let filter = RecordFilter::new(records, &self.options, prefix_locale(prefix));
        filter
            .apply(records)
            .filter_map(|record| {
                let path = self.rewriter.rewrite(&record.path, prefix)?;
                let full_path = self.rewriter.rewrite(&record.full_path, prefix)?;
                Some(Item::new(
                    path,
                    full_path,
                    record.path.clone(),
                    record.full_path.clone(),
                    record.value.clone(),
                ))
            })
            .collect()
    }

    /// Converts `records` under `prefix` (see [`Self::path_prefix`]).
    pub fn convert(&self, records: &[Record], prefix: &str) -> Result<ConversionReport, Error> {
        self.convert_for(records, prefix, prefix_locale(prefix))
    }

    /// Converts records of `locale` whose prefix may not name it, such as
    /// `/rbnf/`. The locale's region decides which identity territory is kept.
    pub fn convert_for(
        &self,
        records: &[Record],
        prefix: &str,
        locale: Option<&str>,
    ) -> Result<ConversionReport, Error> {
        let region = locale.map(locale_region);
        let context = EmitContext {
            region: region.as_deref(),
            rbnf: is_rbnf_prefix(prefix),
        };
        let items = self.prepare(records, prefix);
        let buckets = self.router.partition(items, self.options.copy_identity);

        let jobs: Vec<(usize, Vec<Item>)> = buckets
            .into_iter()
            .enumerate()
            .filter(|(index, items)| !items.is_empty() && self.is_written(*index))
            .collect();

        #[cfg(feature = "multithreading")]
        let results: Vec<Result<SectionOutput, (String, Error)>> = jobs
            .into_par_iter()
            .map(|(index, items)| self.emit_section(index, &items, context))
            .collect();

        #[cfg(not(feature = "multithreading"))]
        let results: Vec<Result<SectionOutput, (String, Error)>> = jobs
            .into_iter()
            .map(|(index, items)| self.emit_section(index, &items, context))
            .collect();

        let mut report = ConversionReport::default();
        for result in results {
            match result {
                Ok(output) => {
                    info!("{} = {} values", output.file_name(), output.value_count);
                    report.outputs.push(output);
                }
                Err(failure) => report.failures.push(failure),
            }
        }
        Ok(report)
    }

    fn is_written(&self, index: usize) -> bool {
        let section = &self.router.sections()[index];
        if section.is_ignored() {
            return false;
        }
        section.name != OTHER_SECTION || self.options.write_other
    }

    fn emit_section(
        &self,
        index: usize,
        items: &[Item],
        context: EmitContext<'_>,
    ) -> Result<SectionOutput, (String, Error)> {
        let section = &self.router.sections()[index];
        self.emit_items(items, context)
            .map(|(document, value_count)| SectionOutput {
                name: section.name.clone(),
                package: section.package.clone(),
                document,
                value_count,
            })
            .map_err(|e| (section.name.clone(), e.in_section(section.name.clone())))
    }

    fn emit_items(&self, items: &[Item], context: EmitContext<'_>) -> Result<(String, usize), Error> {
        let writer = JsonTreeWriter::new(Vec::new());
        let mut emitter = TreeEmitter::new(&self.rules, self.comparator.as_ref(), writer);
        if let Some(region) = context.region {
            emitter = emitter.with_region(region);
        }
        for item in items {
            if context.rbnf {
                emitter.push(&rbnf::adjust(item)?)?;
            } else {
                emitter.push(item)?;
            }
        }
        let (writer, stats) = emitter.finish()?;
        let bytes = writer.finish()?;
        let document = String::from_utf8(bytes)
            .map_err(|e| Error::config_error(format!("emitted invalid UTF-8: {}", e)))?;
        Ok((document, stats.value_count))
    }
}

/// Writes every output of `report` as `<section>.json` under `dir`.
pub fn write_to_dir<P: AsRef<Path>>(report: &ConversionReport, dir: P) -> Result<(), Error> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    for output in &report.outputs {
        fs::write(dir.join(output.file_name()), &output.document)?;
    }
    Ok(())
}

/// BCP 47 form of `locale`; identifiers that do not parse keep their text
/// with `_` replaced by `-`.
pub fn canonical_locale(locale: &str) -> String {
    match locale.parse::<LanguageIdentifier>() {
        Ok(id) => id.to_string(),
        _ => locale.replace('_', "-"),
    }
}

/// Region subtag of `locale`, empty when it has none or does not parse.
pub fn locale_region(locale: &str) -> String {
    locale
        .parse::<LanguageIdentifier>()
        .ok()
        .and_then(|id| id.region.map(|region| region.to_string()))
        .unwrap_or_default()
}

// `/main/<locale>/` carries a locale, other prefixes do not.
fn prefix_locale(prefix: &str) -> Option<&str> {
    let mut parts = prefix.trim_matches('/').split('/');
    match (parts.next(), parts.next()) {
        (Some("main"), Some(locale)) => Some(locale),
        _ => None,
    }
}
