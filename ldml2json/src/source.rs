//! Input records.
//!
//! A record file is either tab-separated (`path`, `fullPath`, `value` per
//! line) or a JSON array of `{"path", "fullPath", "value"}` objects. In the
//! tab-separated form a missing full path defaults to the path, a missing
//! value to the empty string, and `\t`, `\n`, `\r` and `\\` escape the
//! corresponding characters inside a value.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::{error::Error, traits::Parser};

/// One `(path, fullPath, value)` triple as produced by an LDML reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Path with distinguishing attributes only.
    pub path: String,
    /// Path with all attributes.
    #[serde(default)]
    pub full_path: String,
    #[serde(default)]
    pub value: String,
}

impl Record {
    pub fn new(path: impl Into<String>, full_path: Option<String>, value: impl Into<String>) -> Self {
        let path = path.into();
        let full_path = full_path.filter(|f| !f.is_empty()).unwrap_or_else(|| path.clone());
        Self {
            path,
            full_path,
            value: value.into(),
        }
    }

    /// Record whose full path equals its path.
    pub fn simple(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(path, None, value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn from_json(text: &str) -> Result<Self, Error> {
        let records: Vec<Record> = serde_json::from_str(text)?;
        let records = records
            .into_iter()
            .map(|r| Record::new(r.path, Some(r.full_path), r.value))
            .collect();
        Ok(Self { records })
    }

    fn from_tsv(text: &str) -> Result<Self, Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(text.as_bytes());

        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row.map_err(Error::CsvParse)?;
            let line = row.position().map_or(0, |p| p.line());
            let fields: Vec<&str> = row.iter().collect();
            let record = match fields.as_slice() {
                [] | [""] => continue,
                [path] => Record::simple(*path, ""),
                [path, full] => Record::new(*path, Some(full.to_string()), ""),
                [path, full, value] => Record::new(*path, Some(full.to_string()), unescape(value)),
                _ => {
                    return Err(Error::config_error(format!(
                        "line {}: expected at most 3 tab-separated fields, found {}",
                        line,
                        fields.len()
                    )));
                }
            };
            records.push(record);
        }
        Ok(Self { records })
    }
}

impl Parser for RecordSet {
    fn from_reader<R: BufRead>(mut reader: R) -> Result<Self, Error> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let text = text.trim_start_matches('\u{feff}');
        if text.trim_start().starts_with('[') {
            Self::from_json(text)
        } else {
            Self::from_tsv(text)
        }
    }

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(writer);
        for record in &self.records {
            let value = escape(&record.value);
            wtr.write_record([record.path.as_str(), record.full_path.as_str(), value.as_str()])
                .map_err(Error::CsvParse)?;
        }
        wtr.flush().map_err(Error::Io)?;
        Ok(())
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

// Unknown escapes are kept as written.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
