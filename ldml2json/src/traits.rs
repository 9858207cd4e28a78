//! Reading and writing record files.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Cursor, Read, Write},
    path::Path,
};

use crate::error::Error;

/// A value that can be parsed from, and written back to, one file.
///
/// # Example
///
/// ```rust,no_run
/// use ldml2json::{RecordSet, traits::Parser};
/// let records = RecordSet::read_from("en.tsv")?;
/// records.write_to("en_copy.tsv")?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Parser {
    /// Parse from any UTF-8 reader.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error>
    where
        Self: Sized;

    /// Parse from a file path. A byte order mark selects UTF-8 or UTF-16
    /// decoding; files without one are read as UTF-8.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path).map_err(Error::Io)?;
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .encoding(Some(encoding_rs::UTF_8))
            .bom_override(true)
            .build(BufReader::new(file));

        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded).map_err(Error::Io)?;
        Self::from_str(&decoded)
    }

    /// Write to any writer.
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error>;

    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        self.to_writer(writer)
    }

    fn from_str(s: &str) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Self::from_reader(Cursor::new(s))
    }
}
