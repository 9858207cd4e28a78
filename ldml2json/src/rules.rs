//! Static conversion tables.
//!
//! [`ConvertRules`] is loaded once per run and shared read-only by every
//! section. [`ConvertRules::default`] carries the built-in LDML tables.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Error;

/// Wildcard accepted in any position of an [`AttributeKey`].
pub const WILDCARD: &str = "*";

/// A `parent:element:attribute` registration. `parent` and `element` may be `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeKey {
    pub parent: String,
    pub element: String,
    pub attribute: String,
}

impl AttributeKey {
    pub fn parse(spec: &str) -> Result<Self, Error> {
        let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
        match parts.as_slice() {
            [parent, element, attribute] if !attribute.is_empty() => Ok(Self {
                parent: parent.to_string(),
                element: element.to_string(),
                attribute: attribute.to_string(),
            }),
            [element, attribute] if !attribute.is_empty() => Ok(Self {
                parent: WILDCARD.to_string(),
                element: element.to_string(),
                attribute: attribute.to_string(),
            }),
            _ => Err(Error::config_error(format!(
                "attribute key `{}` is not of the form parent:element:attribute",
                spec
            ))),
        }
    }

    fn matches(&self, parent: &str, element: &str, attribute: &str) -> bool {
        self.attribute == attribute
            && (self.element == WILDCARD || self.element == element)
            && (self.parent == WILDCARD || self.parent == parent)
    }
}

/// An ordered list of attribute registrations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTable {
    entries: Vec<AttributeKey>,
}

impl AttributeTable {
    pub fn parse<'a>(specs: impl IntoIterator<Item = &'a str>) -> Result<Self, Error> {
        let entries = specs
            .into_iter()
            .map(AttributeKey::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Position of the first matching registration, used for declared-order sorting.
    pub fn position(&self, parent: &str, element: &str, attribute: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.matches(parent, element, attribute))
    }

    pub fn contains(&self, parent: &str, element: &str, attribute: &str) -> bool {
        self.position(parent, element, attribute).is_some()
    }

    pub fn push(&mut self, key: AttributeKey) {
        self.entries.push(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drop `attribute` from `element` when its value equals `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suppression {
    pub element: String,
    pub value: String,
    pub attribute: String,
}

/// Attribute holding a whitespace-separated list that expands into one item per word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplittableAttribute {
    pub element: String,
    pub attribute: String,
    /// After splitting, this attribute's value becomes the item value and the
    /// word becomes a trailing path segment.
    pub value_attribute: Option<String>,
}

/// Characters stripped from the keys of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedSymbol {
    pub element: String,
    pub symbol: char,
}

#[derive(Debug, Clone)]
pub struct ConvertRules {
    pub suppressions: Vec<Suppression>,
    /// Distinguishing attributes whose value replaces the element name in the key.
    pub key_body: AttributeTable,
    /// Distinguishing attributes appended as `-attr-value`, in table order.
    pub key_suffix: AttributeTable,
    /// Attributes always emitted as named value fields.
    pub attr_as_value: AttributeTable,
    /// Attributes that fill the anonymous value slot.
    pub compactable: AttributeTable,
    pub ignorable: Vec<String>,
    /// Value fields emitted as arrays of whitespace-separated words.
    pub array_valued: Vec<String>,
    /// Elements whose single-character keys are written as `U+XXXX`.
    pub codepoint_elements: Vec<String>,
    pub reserved_symbols: Vec<ReservedSymbol>,
    pub sort_elements: Vec<String>,
    pub timezone_elements: Vec<String>,
    pub splittable: Vec<SplittableAttribute>,
    array_pattern: Regex,
    value_array_pattern: Regex,
    pub value_array_parents: Vec<String>,
    /// Array-group members whose container is written as an object keyed by
    /// the members' attributes.
    pub object_array_elements: Vec<String>,
    /// Items under this marker keep only the first item per element path.
    pub identity_marker: String,
    pub alias_suffix: String,
}

impl ConvertRules {
    /// Replaces the array-group pattern. Group 1 must capture the leading path,
    /// ending with the `/` after the array container.
    pub fn with_array_pattern(mut self, pattern: &str) -> Result<Self, Error> {
        self.array_pattern = anchored(pattern)?;
        Ok(self)
    }

    /// Leading path of an array-group member, if `path` is one.
    pub fn array_leading_path<'p>(&self, path: &'p str) -> Option<&'p str> {
        self.array_pattern
            .captures(path)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|s| !s.trim_matches('/').is_empty())
    }

    pub fn is_suppressed(&self, element: &str, attribute: &str, value: &str) -> bool {
        attribute.ends_with("_q")
            || attribute.ends_with("-q")
            || self
                .suppressions
                .iter()
                .any(|s| s.element == element && s.attribute == attribute && s.value == value)
    }

    pub fn is_ignorable(&self, attribute: &str) -> bool {
        self.ignorable.iter().any(|a| a == attribute)
    }

    pub fn is_array_valued(&self, attribute: &str) -> bool {
        self.array_valued.iter().any(|a| a == attribute)
    }

    pub fn is_sort_element(&self, element: &str) -> bool {
        self.sort_elements.iter().any(|e| e == element)
    }

    pub fn is_object_array_element(&self, element: &str) -> bool {
        self.object_array_elements.iter().any(|e| e == element)
    }

    pub fn is_timezone_element(&self, element: &str) -> bool {
        self.timezone_elements.iter().any(|e| e == element)
    }

    pub fn is_codepoint_element(&self, element: &str) -> bool {
        self.codepoint_elements.iter().any(|e| e == element)
    }

    /// Whether a leaf's own value is a whitespace-separated list.
    pub fn value_is_array(&self, element: &str, parent: &str) -> bool {
        self.value_array_pattern.is_match(element)
            || self.value_array_parents.iter().any(|p| p == parent)
    }
}

/// Compiles `pattern` so that it only matches whole strings.
pub(crate) fn anchored(pattern: &str) -> Result<Regex, Error> {
    Ok(Regex::new(&format!("^(?:{})$", pattern))?)
}

fn table(specs: &[&str]) -> AttributeTable {
    AttributeTable::parse(specs.iter().copied()).unwrap_or_default()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const ARRAY_ITEM_PATTERN: &str = concat!(
    "(.*/collation[^/]*/rules[^/]*/",
    "|.*/character-fallback[^/]*/character[^/]*/",
    "|.*/rbnfrule[^/]*/",
    "|.*/ruleset[^/]*/",
    "|.*/languageMatching[^/]*/languageMatches[^/]*/",
    "|.*/unitPreferences/[^/]*/[^/]*/",
    "|.*/windowsZones[^/]*/mapTimezones[^/]*/",
    "|.*/metaZones[^/]*/mapTimezones[^/]*/",
    "|.*/segmentation[^/]*/variables[^/]*/",
    "|.*/segmentation[^/]*/suppressions[^/]*/",
    "|.*/transform[^/]*/tRules[^/]*/",
    "|.*/region/region[^/]*/",
    "|.*/keyword[^/]*/key[^/]*/",
    "|.*/telephoneCodeData[^/]*/codesByTerritory[^/]*/",
    "|.*/metazoneInfo[^/]*/timezone\\[[^\\]]*\\]/",
    "|.*/metadata[^/]*/validity[^/]*/",
    "|.*/metadata[^/]*/suppress[^/]*/",
    "|.*/metadata[^/]*/deprecated[^/]*/",
    ")(.*)"
);

const VALUE_ARRAY_PATTERN: &str = "grammaticalCase|grammaticalGender|grammaticalDefiniteness";

lazy_static! {
    static ref ARRAY_ITEM_REGEX: Regex = anchored(ARRAY_ITEM_PATTERN).unwrap();
    static ref VALUE_ARRAY_REGEX: Regex = anchored(VALUE_ARRAY_PATTERN).unwrap();
}

impl Default for ConvertRules {
    fn default() -> Self {
        let suppress = |element: &str, value: &str, attribute: &str| Suppression {
            element: element.to_string(),
            value: value.to_string(),
            attribute: attribute.to_string(),
        };
        let split = |element: &str, attribute: &str, value_attribute: Option<&str>| {
            SplittableAttribute {
                element: element.to_string(),
                attribute: attribute.to_string(),
                value_attribute: value_attribute.map(str::to_string),
            }
        };

        ConvertRules {
            suppressions: vec![
                suppress("dateFormat", "standard", "type"),
                suppress("dateTimeFormat", "standard", "type"),
                suppress("timeFormat", "standard", "type"),
                suppress("decimalFormat", "standard", "type"),
                suppress("percentFormat", "standard", "type"),
                suppress("scientificFormat", "standard", "type"),
                suppress("pattern", "standard", "type"),
            ],
            key_body: table(&[
                "*:*:type",
                "*:*:iso4217",
                "*:likelySubtag:from",
                "*:key:name",
                "*:character:value",
            ]),
            key_suffix: table(&[
                "monthWidth:month:yeartype",
                "characters:parseLenients:scope",
                "dateFormat:pattern:numbers",
                "characterLabelPatterns:characterLabelPattern:count",
                "currencyFormats:unitPattern:count",
                "currency:displayName:count",
                "numbers:symbols:numberSystem",
                "numbers:decimalFormats:numberSystem",
                "numbers:currencyFormats:numberSystem",
                "numbers:percentFormats:numberSystem",
                "numbers:scientificFormats:numberSystem",
                "numbers:miscPatterns:numberSystem",
                "minimalPairs:pluralMinimalPairs:count",
                "territoryContainment:group:status",
                "decimalFormat:pattern:count",
                "currencyFormat:pattern:count",
                "unit:unitPattern:count",
                "compoundUnit:compoundUnitPattern1:count",
                "compoundUnit:compoundUnitPattern1:gender",
                "compoundUnit:compoundUnitPattern1:case",
                "field:relative:type",
                "field:relativeTime:type",
                "relativeTime:relativeTimePattern:count",
                "availableFormats:dateFormatItem:count",
                "listPatterns:listPattern:type",
                "timeZoneNames:regionFormat:type",
                "units:durationUnit:type",
                "weekData:minDays:territories",
                "weekData:firstDay:territories",
                "weekData:weekendStart:territories",
                "weekData:weekendEnd:territories",
                "unitPreferenceDataData:unitPreferences:category",
                "measurementData:measurementSystem:category",
                "supplemental:plurals:type",
                "pluralRules:pluralRule:count",
                "languageMatches:languageMatch:desired",
                "*:*:alt",
            ]),
            attr_as_value: table(&[
                "dayPeriodRules:dayPeriodRule:from",
                "likelySubtags:likelySubtag:to",
                "timezone:usesMetazone:mzone",
                "timezone:usesMetazone:to",
                "timezone:usesMetazone:from",
                "mapTimezones:mapZone:other",
                "mapTimezones:mapZone:type",
                "mapTimezones:mapZone:territory",
                "numberingSystems:numberingSystem:type",
                "region:currency:from",
                "region:currency:to",
                "region:currency:tender",
                "calendar:calendarSystem:type",
                "codeMappings:territoryCodes:numeric",
                "codeMappings:territoryCodes:alpha3",
                "codeMappings:currencyCodes:numeric",
                "timeData:hours:allowed",
                "timeData:hours:preferred",
                "validity:variable:type",
                "deprecated:deprecatedItems:elements",
                "deprecated:deprecatedItems:attributes",
                "deprecated:deprecatedItems:type",
                "codesByTerritory:telephoneCountryCode:code",
                "keyword:key:alias",
                "key:type:alias",
                "identity:language:type",
                "identity:script:type",
                "identity:territory:type",
                "identity:variant:type",
            ]),
            compactable: table(&[
                "calendars:default:choice",
                "dateFormats:default:choice",
                "months:default:choice",
                "monthContext:default:choice",
                "days:default:choice",
                "dayContext:default:choice",
                "timeFormats:default:choice",
                "dateTimeFormats:default:choice",
                "timeZoneNames:singleCountries:list",
                "ruleset:rbnfrule:value",
                "likelySubtags:likelySubtag:to",
                "calendar:calendarSystem:type",
                "calendarPreferenceData:calendarPreference:ordering",
                "codesByTerritory:telephoneCountryCode:code",
                "collations:default:choice",
                "identity:language:type",
                "identity:script:type",
                "identity:territory:type",
                "identity:variant:type",
            ]),
            ignorable: strings(&["draft", "references"]),
            array_valued: strings(&["territories", "scripts", "contains", "systems"]),
            codepoint_elements: strings(&["character"]),
            reserved_symbols: Vec::new(),
            sort_elements: strings(&[
                "zone",
                "timezone",
                "zoneItem",
                "typeMap",
                "dayPeriodRule",
                "pluralRanges",
                "pluralRules",
                "personList",
                "calendarPreferenceData",
                "character-fallback",
                "types",
                "timeData",
                "minDays",
                "firstDay",
                "weekendStart",
                "weekendEnd",
                "measurementData",
                "measurementSystem",
            ]),
            timezone_elements: strings(&["zone", "timezone", "zoneItem", "typeMap"]),
            splittable: vec![
                split("calendarPreference", "territories", None),
                split("pluralRules", "locales", None),
                split("minDays", "territories", Some("count")),
                split("firstDay", "territories", Some("day")),
                split("weekendStart", "territories", Some("day")),
                split("weekendEnd", "territories", Some("day")),
                split("measurementSystem", "territories", Some("type")),
                split("paperSize", "territories", Some("type")),
                split("parentLocale", "locales", Some("parent")),
                split("hours", "regions", None),
                split("dayPeriodRules", "locales", None),
                split("personList", "locales", Some("type")),
                split("unitPreference", "regions", None),
                split("grammaticalFeatures", "locales", None),
                split("grammaticalDerivations", "locales", None),
            ],
            array_pattern: ARRAY_ITEM_REGEX.clone(),
            value_array_pattern: VALUE_ARRAY_REGEX.clone(),
            value_array_parents: strings(&["weekOfPreference", "calendarPreferenceData"]),
            object_array_elements: strings(&["rbnfrule"]),
            identity_marker: "/identity/".to_string(),
            alias_suffix: "/alias".to_string(),
        }
    }
}
