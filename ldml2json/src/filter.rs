//! Drops input records that never reach the output.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::{config::ConvertOptions, node::XPath, rules::anchored, source::Record};

/// Value of a record that explicitly blocks inheritance in resolved data.
pub const NO_INHERITANCE_MARKER: &str = "∅∅∅";

pub const DEFAULT_NUMBERING_SYSTEM: &str = "latn";

lazy_static! {
    static ref NO_NUMBERING_SYSTEM: Regex =
        anchored(r"//ldml/numbers/(symbols|(decimal|percent|scientific|currency)Formats)/.*").unwrap();
    static ref NUMBERING_SYSTEM: Regex = anchored(
        r#"//ldml/numbers/(symbols|miscPatterns|(decimal|percent|scientific|currency)Formats)\[@numberSystem="([^"]+)"\]/.*"#
    )
    .unwrap();
    static ref ROOT_IDENTITY: Regex = Regex::new(r#"^//ldml/identity/language\[@type="root"\]"#).unwrap();
}

const DEFAULT_SYSTEM_PATH: &str = "//ldml/numbers/defaultNumberingSystem";
const OTHER_SYSTEM_PATHS: [&str; 3] = [
    "//ldml/numbers/otherNumberingSystems/native",
    "//ldml/numbers/otherNumberingSystems/traditional",
    "//ldml/numbers/otherNumberingSystems/finance",
];

#[derive(Debug, Clone)]
pub struct RecordFilter {
    active_systems: BTreeSet<String>,
    full_numbers: bool,
    resolved: bool,
    is_root: bool,
}

impl RecordFilter {
    /// Scans `records` for the numbering systems the locale uses.
    pub fn new(records: &[Record], options: &ConvertOptions, locale: Option<&str>) -> Self {
        let mut active_systems = BTreeSet::new();
        active_systems.insert(DEFAULT_NUMBERING_SYSTEM.to_string());
        for record in records {
            let path = record.path.as_str();
            if path == DEFAULT_SYSTEM_PATH || OTHER_SYSTEM_PATHS.contains(&path) {
                active_systems.insert(record.value.trim().to_string());
            }
        }
        debug!("active numbering systems: {:?}", active_systems);

        Self {
            active_systems,
            full_numbers: options.full_numbers,
            resolved: options.resolved,
            is_root: locale == Some("root"),
        }
    }

    pub fn active_systems(&self) -> impl Iterator<Item = &str> {
        self.active_systems.iter().map(String::as_str)
    }

    pub fn keep(&self, record: &Record) -> bool {
        let path = record.path.as_str();
        if NO_NUMBERING_SYSTEM.is_match(path) {
            return false;
        }
        if !self.full_numbers && NUMBERING_SYSTEM.is_match(path) {
            if let Some(system) = numbering_system(&record.full_path) {
                if !self.active_systems.contains(&system) {
                    return false;
                }
            }
        }
        if self.resolved && record.value == NO_INHERITANCE_MARKER {
            return false;
        }
        if !self.is_root && ROOT_IDENTITY.is_match(path) {
            return false;
        }
        true
    }

    pub fn apply<'r>(&'r self, records: &'r [Record]) -> impl Iterator<Item = &'r Record> + 'r {
        records.iter().filter(move |r| self.keep(r))
    }
}

// The attribute sits on the element directly under `numbers`.
fn numbering_system(full_path: &str) -> Option<String> {
    let path = XPath::parse(full_path).ok()?;
    let segment = path.segments().get(2)?;
    segment.attributes.get("numberSystem").map(str::to_string)
}
