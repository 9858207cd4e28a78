#![forbid(unsafe_code)]
//! Converts flat LDML path/value records into nested JSON documents.
//!
//! Input records are `(path, fullPath, value)` triples such as
//! `//ldml/localeDisplayNames/languages/language[@type="de"]` = `German`.
//! Each record is rewritten, routed to an output section and streamed into
//! a tree writer, so a section is built without holding its document tree
//! in memory.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ldml2json::{ConvertOptions, Converter, RecordSet, traits::Parser, write_to_dir};
//!
//! let records = RecordSet::read_from("en.tsv")?;
//! let converter = Converter::new(ConvertOptions::default())?;
//! let prefix = Converter::path_prefix("main", Some("en"));
//! let report = converter.convert(&records.records, &prefix)?;
//! write_to_dir(&report, "out/main/en")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Pipeline
//!
//! - [`filter`]: drops records that never reach the output
//! - [`rewrite`]: ordered whole-path rewrite rules and the root prefix
//! - [`section`]: first-match routing of items to sections
//! - [`rbnf`]: ICU adjustments for rule-based number format data
//! - [`emitter`]: sort groups, array groups and prefix-diff emission
//! - [`writer`]: begin/end checked JSON output

pub mod config;
pub mod converter;
pub mod emitter;
pub mod error;
pub mod filter;
pub mod item;
pub mod node;
pub mod rbnf;
pub mod resolver;
pub mod rewrite;
pub mod rules;
pub mod section;
pub mod sort;
pub mod source;
pub mod traits;
pub mod writer;

// Re-export most used types for easy consumption
pub use crate::{
    config::{ConvertOptions, SectionSpec, TransformSpec},
    converter::{
        ConversionReport, Converter, SectionOutput, canonical_locale, locale_region, write_to_dir,
    },
    emitter::{EmitStats, TreeEmitter},
    error::Error,
    item::Item,
    node::{PathNode, XPath},
    resolver::{KeyResolver, ResolvedKey, resolve_key},
    rules::ConvertRules,
    sort::{ItemComparator, PathComparator, SemanticComparator},
    source::{Record, RecordSet},
    writer::{EventRecorder, JsonTreeWriter, TreeWriter},
};
