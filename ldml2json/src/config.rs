//! Text configuration: section lists, path transforms and run options.
//!
//! Section lines look like
//! `section=numbers; path=//main/[^/]+/numbers/.*; package=cldr-numbers-full`.
//!
//! Transforms are `<`/`>` line pairs, optionally preceded by `#` comments:
//!
//! ```text
//! # Separate calendar type
//! < (.*/calendars)/calendar\[@type="([^"]*)"\](.*)$
//! > $1/$2$3
//! ```

use std::{fs, path::Path};

use indoc::indoc;

use crate::error::Error;

/// Name of the catch-all section appended after every configured section.
pub const OTHER_SECTION: &str = "other";

/// Sections with this name are routed but never written.
pub const IGNORE_SECTION: &str = "IGNORE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpec {
    pub name: String,
    pub pattern: String,
    pub package: Option<String>,
}

/// Parses section lines. Blank lines and `#` comments are skipped.
pub fn parse_sections(text: &str) -> Result<Vec<SectionSpec>, Error> {
    let mut specs = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut name = None;
        let mut pattern = None;
        let mut package = None;
        for part in line.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                Error::config_error(format!(
                    "line {}: `{}` is not a key=value pair",
                    number + 1,
                    part
                ))
            })?;
            match key.trim() {
                "section" => name = Some(value.trim().to_string()),
                "path" => pattern = Some(value.trim().to_string()),
                "package" => package = Some(value.trim().to_string()),
                _ => {}
            }
        }
        match (name, pattern) {
            (Some(name), Some(pattern)) => specs.push(SectionSpec {
                name,
                pattern,
                package,
            }),
            _ => {
                return Err(Error::config_error(format!(
                    "line {}: a section needs both `section=` and `path=`",
                    number + 1
                )));
            }
        }
    }
    Ok(specs)
}

pub fn read_sections<P: AsRef<Path>>(path: P) -> Result<Vec<SectionSpec>, Error> {
    parse_sections(&fs::read_to_string(path)?)
}

/// A path transform in its textual form. The replacement uses `$n` group
/// references and `\` to escape the next character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSpec {
    pub pattern: String,
    pub replacement: String,
    pub comment: String,
}

pub fn parse_transforms(text: &str) -> Result<Vec<TransformSpec>, Error> {
    let mut specs = Vec::new();
    let mut comment: Vec<&str> = Vec::new();
    let mut pattern: Option<String> = None;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        let number = number + 1;
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('#') {
            comment.push(rest.trim());
        } else if let Some(rest) = line.strip_prefix('<') {
            if pattern.is_some() {
                return Err(Error::config_error(format!("line {}: two `<` lines in a row", number)));
            }
            let rest = rest.trim();
            if rest.is_empty() {
                return Err(Error::config_error(format!("line {}: empty `<` pattern", number)));
            }
            pattern = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('>') {
            let pattern = pattern.take().ok_or_else(|| {
                Error::config_error(format!("line {}: `>` without a preceding `<`", number))
            })?;
            specs.push(TransformSpec {
                pattern,
                replacement: rest.trim().to_string(),
                comment: comment.join(" "),
            });
            comment.clear();
        } else {
            return Err(Error::config_error(format!(
                "line {}: expected `#`, `<` or `>`, got `{}`",
                number, line
            )));
        }
    }
    if pattern.is_some() {
        return Err(Error::config_error("ended with a `<` but no `>`"));
    }
    Ok(specs)
}

pub fn read_transforms<P: AsRef<Path>>(path: P) -> Result<Vec<TransformSpec>, Error> {
    parse_transforms(&fs::read_to_string(path)?)
}

/// Renders transforms back into the block format.
pub fn render_transforms(specs: &[TransformSpec]) -> String {
    let mut out = String::new();
    for spec in specs {
        if !spec.comment.is_empty() {
            out.push_str("# ");
            out.push_str(&spec.comment);
            out.push('\n');
        }
        out.push_str("< ");
        out.push_str(&spec.pattern);
        out.push_str("\n> ");
        out.push_str(&spec.replacement);
        out.push_str("\n\n");
    }
    out
}

pub const DEFAULT_SECTIONS: &str = indoc! {r#"
    # Locale data
    section=ca-gregorian; path=//main/[^/]+/dates/calendars/gregorian/.*; package=cldr-dates-full
    section=ca-generic; path=//main/[^/]+/dates/calendars/generic/.*; package=cldr-dates-full
    section=timeZoneNames; path=//main/[^/]+/dates/timeZoneNames/.*; package=cldr-dates-full
    section=dateFields; path=//main/[^/]+/dates/fields/.*; package=cldr-dates-full
    section=currencies; path=//main/[^/]+/numbers/currencies/.*; package=cldr-numbers-full
    section=numbers; path=//main/[^/]+/numbers/.*; package=cldr-numbers-full
    section=languages; path=//main/[^/]+/localeDisplayNames/languages/.*; package=cldr-localenames-full
    section=territories; path=//main/[^/]+/localeDisplayNames/territories/.*; package=cldr-localenames-full
    section=scripts; path=//main/[^/]+/localeDisplayNames/scripts/.*; package=cldr-localenames-full
    section=variants; path=//main/[^/]+/localeDisplayNames/variants/.*; package=cldr-localenames-full
    section=measurementSystemNames; path=//main/[^/]+/localeDisplayNames/measurementSystemNames/.*; package=cldr-localenames-full
    section=localeDisplayNames; path=//main/[^/]+/localeDisplayNames/.*; package=cldr-localenames-full
    section=characters; path=//main/[^/]+/characters/.*; package=cldr-misc-full
    section=delimiters; path=//main/[^/]+/delimiters/.*; package=cldr-misc-full
    section=layout; path=//main/[^/]+/layout/.*; package=cldr-misc-full
    section=listPatterns; path=//main/[^/]+/listPatterns/.*; package=cldr-misc-full
    section=contextTransforms; path=//main/[^/]+/contextTransforms/.*; package=cldr-misc-full
    section=posix; path=//main/[^/]+/posix/.*; package=cldr-misc-full
    section=units; path=//main/[^/]+/units/.*; package=cldr-units-full

    # Supplemental data
    section=likelySubtags; path=//supplemental/likelySubtags/.*; package=cldr-core
    section=plurals; path=//supplemental/plurals\[@type="cardinal"\]/.*; package=cldr-core
    section=ordinals; path=//supplemental/plurals\[@type="ordinal"\]/.*; package=cldr-core
    section=pluralRanges; path=//supplemental/plurals/pluralRanges.*; package=cldr-core
    section=currencyData; path=//supplemental/currencyData/.*; package=cldr-core
    section=timeData; path=//supplemental/timeData/.*; package=cldr-core
    section=weekData; path=//supplemental/weekData/.*; package=cldr-core
    section=territoryInfo; path=//supplemental/territoryInfo/.*; package=cldr-core
    section=territoryContainment; path=//supplemental/territoryContainment/.*; package=cldr-core
    section=calendarData; path=//supplemental/calendarData/.*; package=cldr-core
    section=calendarPreferenceData; path=//supplemental/calendarPreferenceData/.*; package=cldr-core
    section=metaZones; path=//supplemental/metaZones/.*; package=cldr-core
    section=windowsZones; path=//supplemental/windowsZones/.*; package=cldr-core
    section=numberingSystems; path=//supplemental/numberingSystems/.*; package=cldr-core
    section=aliases; path=//supplemental/metadata/alias/.*; package=cldr-core
    section=parentLocales; path=//supplemental/parentLocales/.*; package=cldr-core
    section=languageMatching; path=//supplemental/languageMatching/.*; package=cldr-core
    section=dayPeriods; path=//supplemental/dayPeriodRuleSet.*; package=cldr-core
    section=codeMappings; path=//supplemental/codeMappings/.*; package=cldr-core
    section=measurementData; path=//supplemental/measurementData/.*; package=cldr-core
    section=telephoneCodeData; path=//supplemental/telephoneCodeData/.*; package=cldr-core
    section=unitPreferenceData; path=//supplemental/unitPreferenceData/.*; package=cldr-core
    section=languageData; path=//supplemental/languageData/.*; package=cldr-core

    # Rule-based number formats
    section=rbnf; path=//rbnf/.*; package=cldr-rbnf
"#};

pub const DEFAULT_TRANSFORMS: &str = indoc! {r#"
    # Add "standard" as type to exemplarCharacters and split it into two layers
    < (.*ldml/exemplarCharacters)\[@type="([^"]*)"\](.*)
    > $1/$2$3
    < (.*ldml/exemplarCharacters)(.*)$
    > $1/standard$2

    # Underscore to hyphen-minus in language keys
    < (.*/language\[@type="[a-z]{2,3})_([^"]*"\](\[@alt="short"])?)
    > $1-$2

    # Separate ellipsis from its type
    < (.*/ellipsis)\[@type="([^"]*)"\](.*)$
    > $1/$2$3

    # Remove unnecessary dateFormat/pattern
    < (.*/calendars)/calendar\[@type="([^"]*)"\](.*)Length\[@type="([^"]*)"\]/(date|time|dateTime)Format\[@type="([^"]*)"\]/pattern\[@type="([^"]*)"\](.*)
    > $1/$2/$5Formats/$4$8

    # Separate calendar type
    < (.*/calendars)/calendar\[@type="([^"]*)"\](.*)$
    > $1/$2$3

    # Separate metazone from its type
    < (.*/metazone)\[@type="([^"]*)"\]/(.*)$
    > $1/$2/$3

    # Split types into their key and type fields
    < (.*)/types/type\[@key="([^"]*)"\]\[@type="([^"]*)"\](.*)$
    > $1/types/$2/$3$4

    < (.*/numbers/(decimal|scientific|percent|currency)Formats\[@numberSystem="([^"]*)"\])/(decimal|scientific|percent|currency)FormatLength/(decimal|scientific|percent|currency)Format\[@type="standard"\]/pattern.*$
    > $1/standard

    < (.*/numbers/currencyFormats\[@numberSystem="([^"]*)"\])/currencyFormatLength/currencyFormat\[@type="accounting"\]/pattern.*$
    > $1/accounting

    # Add type="standard" to decimalFormatLength when it has none
    < (.*/numbers/(decimal|scientific|percent)Formats\[@numberSystem="([^"]*)"\]/(decimal|scientific|percent)FormatLength)/(.*)$
    > $1[@type="standard"]/$5

    < (.*/listPattern)/(.*)$
    > $1[@type="standard"]/$2

    < (.*/languagePopulation)\[@type="([^"]*)"\](.*)
    > $1/$2$3

    < (.*/languageAlias)\[@type="([^"]*)"\](.*)
    > $1/$2$3
    < (.*/scriptAlias)\[@type="([^"]*)"\](.*)
    > $1/$2$3
    < (.*/territoryAlias)\[@type="([^"]*)"\](.*)
    > $1/$2$3
    < (.*/variantAlias)\[@type="([^"]*)"\](.*)
    > $1/$2$3
    < (.*/zoneAlias)\[@type="([^"]*)"\](.*)
    > $1/$2$3
    < (.*/alias)(.*)
    > $1/alias$2

    < (.*currencyData/region)(.*)
    > $1/region$2

    # Etc/GMT and UTC zones have no exemplar city
    < (.*(GMT|UTC).*/exemplarCity)(.*)
    >

    < (.*/transforms/transform[^/]*)/(.*)
    > $1/tRules/$2
    < (.*)\[@territories="([^"]*)"\](.*)\[@alt="variant"\](.*)
    > $1\[@territories="$2-alt-variant"\]
    < (.*)/weekData/(.*)\[@alt="variant"\](.*)
    > $1/weekData/$2$3
    < (.*)/unitPreferenceData/unitPreferences\[@category="([^"]*)"\]\[@usage="([^"]*)"\](.*)
    > $1/unitPreferenceData/unitPreferences/$2/$3$4
"#};

/// Per-run switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Also write the catch-all section.
    pub write_other: bool,
    /// Copy identity and version items into every written section.
    pub copy_identity: bool,
    /// Keep numbering-system data for systems the locale does not use.
    pub full_numbers: bool,
    /// Input is fully resolved; drop no-inheritance markers.
    pub resolved: bool,
    pub cldr_version: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            write_other: false,
            copy_identity: true,
            full_numbers: false,
            resolved: false,
            cldr_version: None,
        }
    }
}

impl ConvertOptions {
    pub fn with_write_other(mut self, write_other: bool) -> Self {
        self.write_other = write_other;
        self
    }

    pub fn with_copy_identity(mut self, copy_identity: bool) -> Self {
        self.copy_identity = copy_identity;
        self
    }

    pub fn with_full_numbers(mut self, full_numbers: bool) -> Self {
        self.full_numbers = full_numbers;
        self
    }

    pub fn with_resolved(mut self, resolved: bool) -> Self {
        self.resolved = resolved;
        self
    }

    pub fn with_cldr_version(mut self, version: impl Into<String>) -> Self {
        self.cldr_version = Some(version.into());
        self
    }
}
