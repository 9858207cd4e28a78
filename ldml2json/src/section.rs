//! Routes rewritten items to output sections.

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

use crate::{
    config::{DEFAULT_SECTIONS, IGNORE_SECTION, OTHER_SECTION, SectionSpec, parse_sections},
    error::Error,
    item::Item,
    rules::anchored,
};

lazy_static! {
    static ref METADATA_PATH: Regex = anchored(".*/(identity|version|generation).*").unwrap();
}

/// Whether `path` is document metadata that every section carries.
pub fn is_metadata_path(path: &str) -> bool {
    METADATA_PATH.is_match(path)
}

#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub package: Option<String>,
    pattern: Regex,
}

impl Section {
    pub fn new(name: impl Into<String>, pattern: &str, package: Option<String>) -> Result<Self, Error> {
        Ok(Self {
            name: name.into(),
            package,
            pattern: anchored(pattern)?,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    pub fn is_ignored(&self) -> bool {
        self.name == IGNORE_SECTION
    }
}

/// Ordered section list; the last entry is always the catch-all.
#[derive(Debug, Clone)]
pub struct SectionRouter {
    sections: Vec<Section>,
}

impl SectionRouter {
    pub fn new(specs: &[SectionSpec]) -> Result<Self, Error> {
        let mut sections = specs
            .iter()
            .map(|s| Section::new(s.name.clone(), &s.pattern, s.package.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        sections.push(Section::new(OTHER_SECTION, ".*", None)?);
        Ok(Self { sections })
    }

    pub fn builtin() -> Result<Self, Error> {
        Self::new(&parse_sections(DEFAULT_SECTIONS)?)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn other_index(&self) -> usize {
        self.sections.len() - 1
    }

    /// Index of the first section matching all of `path`.
    pub fn route(&self, path: &str) -> usize {
        let index = self
            .sections
            .iter()
            .position(|s| s.matches(path))
            .unwrap_or(self.other_index());
        trace!("{} -> {}", path, self.sections[index].name);
        index
    }

    pub fn section_for(&self, path: &str) -> &Section {
        &self.sections[self.route(path)]
    }

    /// Distributes items to sections, index-aligned with [`Self::sections`].
    ///
    /// Metadata items that landed in the catch-all are moved out of it and,
    /// when `copy_identity` is set, copied to the front of every other
    /// section that received data.
    pub fn partition(&self, items: impl IntoIterator<Item = Item>, copy_identity: bool) -> Vec<Vec<Item>> {
        let mut buckets: Vec<Vec<Item>> = vec![Vec::new(); self.sections.len()];
        for item in items {
            let index = self.route(&item.path);
            buckets[index].push(item);
        }

        let other = self.other_index();
        let (metadata, rest): (Vec<Item>, Vec<Item>) = std::mem::take(&mut buckets[other])
            .into_iter()
            .partition(|item| is_metadata_path(&item.path));
        buckets[other] = rest;

        if copy_identity && !metadata.is_empty() {
            for bucket in buckets[..other].iter_mut().filter(|b| !b.is_empty()) {
                let tail = std::mem::take(bucket);
                bucket.extend(metadata.iter().cloned());
                bucket.extend(tail);
            }
        }
        buckets
    }
}
