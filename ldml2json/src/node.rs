//! Path segment parsing.
//!
//! A path looks like `//ldml/dates/calendars/calendar[@type="gregorian"]/months`.
//! Each `/`-separated segment is an element name followed by zero or more
//! `[@name="value"]` attributes. Slashes inside brackets or quotes do not
//! split segments (`zone[@type="America/Adak"]` is one segment).

use std::fmt::{Display, Formatter};

use crate::{error::Error, rules::ConvertRules};

/// Insertion-ordered attribute map.
///
/// Attribute order is part of a node's identity and of its emitted key, so a
/// plain `Vec` is used instead of a hash map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k == name)
    }

    /// Inserts or replaces an attribute. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.0.iter().position(|(k, _)| k == name)?;
        Some(self.0.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut attributes = Attributes::new();
        for (k, v) in iter {
            attributes.insert(k, v);
        }
        attributes
    }
}

/// One raw path segment: element name plus its attributes, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Name,
    ExpectAt,
    AttrName,
    ExpectQuote,
    Value(char),
    ExpectClose,
    ExpectOpen,
}

impl Segment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
        }
    }

    /// Parses `text`, which starts at byte `base` of `path`.
    ///
    /// Offsets in errors are relative to `path`.
    pub fn parse(path: &str, text: &str, base: usize) -> Result<Self, Error> {
        let mut state = State::Name;
        let mut name = String::new();
        let mut attr = String::new();
        let mut value = String::new();
        let mut attributes = Attributes::new();

        for (i, c) in text.char_indices() {
            let at = base + i;
            state = match (state, c) {
                (State::Name, '[') => {
                    if name.is_empty() {
                        return Err(Error::malformed_path(path, at, "missing element name"));
                    }
                    State::ExpectAt
                }
                (State::Name, ']' | '"' | '\'' | '=' | '@') => {
                    return Err(Error::malformed_path(
                        path,
                        at,
                        format!("unexpected `{}` in element name", c),
                    ));
                }
                (State::Name, c) => {
                    name.push(c);
                    State::Name
                }
                (State::ExpectAt, '@') => State::AttrName,
                (State::ExpectAt, _) => {
                    return Err(Error::malformed_path(path, at, "expected `@` after `[`"));
                }
                (State::AttrName, '=') => {
                    if attr.is_empty() {
                        return Err(Error::malformed_path(path, at, "missing attribute name"));
                    }
                    State::ExpectQuote
                }
                (State::AttrName, '[' | ']' | '"' | '\'') => {
                    return Err(Error::malformed_path(path, at, "missing `=` in attribute"));
                }
                (State::AttrName, c) => {
                    attr.push(c);
                    State::AttrName
                }
                (State::ExpectQuote, q @ ('"' | '\'')) => State::Value(q),
                (State::ExpectQuote, _) => {
                    return Err(Error::malformed_path(path, at, "expected quoted value"));
                }
                (State::Value(q), c) if c == q => {
                    attributes.insert(std::mem::take(&mut attr), std::mem::take(&mut value));
                    State::ExpectClose
                }
                (State::Value(q), c) => {
                    value.push(c);
                    State::Value(q)
                }
                (State::ExpectClose, ']') => State::ExpectOpen,
                (State::ExpectClose, _) => {
                    return Err(Error::malformed_path(path, at, "expected `]` after value"));
                }
                (State::ExpectOpen, '[') => State::ExpectAt,
                (State::ExpectOpen, _) => {
                    return Err(Error::malformed_path(
                        path,
                        at,
                        "unexpected text after attribute",
                    ));
                }
            };
        }

        let end = base + text.len();
        match state {
            State::Name if name.is_empty() => {
                Err(Error::malformed_path(path, end, "empty path segment"))
            }
            State::Name | State::ExpectOpen => Ok(Segment { name, attributes }),
            State::Value(_) => Err(Error::malformed_path(path, end, "unterminated quote")),
            State::AttrName => Err(Error::malformed_path(path, end, "missing `=` in attribute")),
            _ => Err(Error::malformed_path(path, end, "unbalanced `[`")),
        }
    }
}

// Values holding `"` are quoted with `'` so the text parses back.
fn write_attribute(f: &mut Formatter<'_>, name: &str, value: &str) -> std::fmt::Result {
    let quote = if value.contains('"') { '\'' } else { '"' };
    write!(f, "[@{}={}{}{}]", name, quote, value, quote)
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        for (k, v) in self.attributes.iter() {
            write_attribute(f, k, v)?;
        }
        Ok(())
    }
}

/// Splits a path into `(offset, segment)` pairs, ignoring a leading `//`.
pub fn split_segments(path: &str) -> Result<Vec<(usize, &str)>, Error> {
    let start = path.len() - path.trim_start_matches('/').len();
    let mut segments = Vec::new();
    let mut seg_start = start;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, c) in path[start..].char_indices() {
        let at = start + i;
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if depth > 0 => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => {
                if depth == 0 {
                    return Err(Error::malformed_path(path, at, "unbalanced `]`"));
                }
                depth -= 1;
            }
            (None, '/') if depth == 0 => {
                segments.push((seg_start, &path[seg_start..at]));
                seg_start = at + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err(Error::malformed_path(path, path.len(), "unterminated quote"));
    }
    if depth > 0 {
        return Err(Error::malformed_path(path, path.len(), "unbalanced `[`"));
    }
    segments.push((seg_start, &path[seg_start..]));
    Ok(segments)
}

/// A parsed path, used where segments have to be edited and re-serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    segments: Vec<Segment>,
}

impl XPath {
    pub fn parse(path: &str) -> Result<Self, Error> {
        let segments = split_segments(path)?
            .into_iter()
            .map(|(offset, text)| Segment::parse(path, text, offset))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn element(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(|s| s.name.as_str())
    }

    pub fn contains_element(&self, element: &str) -> bool {
        self.segments.iter().any(|s| s.name == element)
    }

    pub fn contains_attribute(&self, attribute: &str) -> bool {
        self.segments
            .iter()
            .any(|s| s.attributes.contains_key(attribute))
    }

    /// Value of `attribute` on the first `element` segment.
    pub fn find_attribute_value(&self, element: &str, attribute: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|s| s.name == element)
            .and_then(|s| s.attributes.get(attribute))
    }

    /// Value of the first `attribute` on any segment.
    pub fn find_first_attribute_value(&self, attribute: &str) -> Option<&str> {
        self.segments
            .iter()
            .find_map(|s| s.attributes.get(attribute))
    }

    pub fn set_attribute(&mut self, element: &str, attribute: &str, value: &str) {
        if let Some(segment) = self.segments.iter_mut().find(|s| s.name == element) {
            segment.attributes.insert(attribute, value);
        }
    }

    pub fn remove_attribute(&mut self, element: &str, attribute: &str) {
        if let Some(segment) = self.segments.iter_mut().find(|s| s.name == element) {
            segment.attributes.remove(attribute);
        }
    }

    pub fn add_element(&mut self, name: &str) {
        self.segments.push(Segment::new(name));
    }
}

impl Display for XPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/")?;
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// One node of an item's path.
///
/// Two nodes are the same for tree diffing when their name and distinguishing
/// attributes are equal; non-distinguishing attributes are payload only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathNode {
    pub name: String,
    pub distinguishing: Attributes,
    pub non_distinguishing: Attributes,
}

impl PathNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            distinguishing: Attributes::new(),
            non_distinguishing: Attributes::new(),
        }
    }

    /// Builds a node from the matching segments of `path` and `fullPath`.
    ///
    /// Attributes present only in the full segment are non-distinguishing.
    /// Suppressed attributes are dropped from both sets.
    pub fn from_segments(path_segment: &Segment, full_segment: &Segment, rules: &ConvertRules) -> Self {
        let name = path_segment.name.clone();
        let keep = |attr: &str, value: &str| !rules.is_suppressed(&name, attr, value);

        let distinguishing = path_segment
            .attributes
            .iter()
            .filter(|(k, v)| keep(k, v))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let non_distinguishing = full_segment
            .attributes
            .iter()
            .filter(|(k, v)| !path_segment.attributes.contains_key(k) && keep(k, v))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            name,
            distinguishing,
            non_distinguishing,
        }
    }

    pub fn same_identity(&self, other: &PathNode) -> bool {
        self.name == other.name && self.distinguishing == other.distinguishing
    }
}

impl Display for PathNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        for (k, v) in self.distinguishing.iter() {
            write_attribute(f, k, v)?;
        }
        Ok(())
    }
}
