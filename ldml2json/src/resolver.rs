//! Key-name resolution.
//!
//! Turns a [`PathNode`] and its parent's element name into an output key and
//! the list of attribute-as-value fields written next to it.

use std::collections::HashMap;

use crate::{error::Error, node::PathNode, rules::ConvertRules};

pub const ANONYMOUS_KEY: &str = "_";

/// One attribute emitted as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueField {
    pub attribute: String,
    pub value: String,
    /// Fills the anonymous slot instead of a named `_attribute` field.
    pub anonymous: bool,
}

impl ValueField {
    /// Key this field is written under. The anonymous slot is named `_`.
    pub fn output_name(&self) -> String {
        if self.anonymous {
            format!("_{}", ANONYMOUS_KEY)
        } else {
            format!("_{}", self.attribute)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub key: String,
    /// The key without its `-attr-value` suffixes.
    pub base: String,
    pub fields: Vec<ValueField>,
    /// Attributes folded into the key suffix, in suffix order. Written as
    /// fields where the key itself is not emitted.
    pub suffixes: Vec<ValueField>,
}

impl ResolvedKey {
    pub fn anonymous(&self) -> Option<&ValueField> {
        self.fields.iter().find(|f| f.anonymous)
    }

    /// True when the anonymous slot is the only field.
    pub fn only_anonymous(&self) -> bool {
        self.fields.len() == 1 && self.fields[0].anonymous
    }
}

/// Memoizing front end over [`resolve_key`].
pub struct KeyResolver<'r> {
    rules: &'r ConvertRules,
    cache: HashMap<(String, PathNode), ResolvedKey>,
}

impl<'r> KeyResolver<'r> {
    pub fn new(rules: &'r ConvertRules) -> Self {
        Self {
            rules,
            cache: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, parent: &str, node: &PathNode) -> Result<ResolvedKey, Error> {
        let cache_key = (parent.to_string(), node.clone());
        if let Some(hit) = self.cache.get(&cache_key) {
            return Ok(hit.clone());
        }
        let resolved = resolve_key(self.rules, parent, node)?;
        self.cache.insert(cache_key, resolved.clone());
        Ok(resolved)
    }
}

/// Resolves the key and value fields of `node` under `parent`.
pub fn resolve_key(
    rules: &ConvertRules,
    parent: &str,
    node: &PathNode,
) -> Result<ResolvedKey, Error> {
    let element = node.name.as_str();
    let mut body: Option<(&str, &str)> = None;
    let mut suffixes: Vec<(usize, &str, &str)> = Vec::new();
    let mut fields: Vec<ValueField> = Vec::new();

    for (attr, value) in node.distinguishing.iter() {
        if rules.is_ignorable(attr) {
            continue;
        }
        if let Some(pos) = rules.key_suffix.position(parent, element, attr) {
            suffixes.push((pos, attr, value));
        } else if rules.compactable.contains(parent, element, attr) {
            push_field(node, &mut fields, attr, value, true)?;
        } else if rules.attr_as_value.contains(parent, element, attr) {
            push_field(node, &mut fields, attr, value, false)?;
        } else if rules.key_body.contains(parent, element, attr) {
            if let Some((first, _)) = body {
                return Err(Error::ConflictingKeyAttribute {
                    node: node.to_string(),
                    first: first.to_string(),
                    second: attr.to_string(),
                });
            }
            body = Some((attr, value));
        } else {
            push_field(node, &mut fields, attr, value, false)?;
        }
    }

    for (attr, value) in node.non_distinguishing.iter() {
        if rules.is_ignorable(attr) {
            continue;
        }
        let anonymous = rules.compactable.contains(parent, element, attr);
        push_field(node, &mut fields, attr, value, anonymous)?;
    }

    let mut base = match body {
        Some((_, value)) => codepoint_key(rules, element, value),
        None => element.to_string(),
    };

    suffixes.sort_by_key(|(pos, _, _)| *pos);
    let mut key = base.clone();
    for (_, attr, value) in &suffixes {
        key.push('-');
        key.push_str(attr);
        key.push('-');
        key.push_str(value);
    }

    for reserved in rules.reserved_symbols.iter().filter(|r| r.element == element) {
        key.retain(|c| c != reserved.symbol);
        base.retain(|c| c != reserved.symbol);
    }

    let suffixes = suffixes
        .into_iter()
        .map(|(_, attr, value)| ValueField {
            attribute: attr.to_string(),
            value: value.to_string(),
            anonymous: false,
        })
        .collect();

    Ok(ResolvedKey {
        key,
        base,
        fields,
        suffixes,
    })
}

fn push_field(
    node: &PathNode,
    fields: &mut Vec<ValueField>,
    attribute: &str,
    value: &str,
    anonymous: bool,
) -> Result<(), Error> {
    if anonymous {
        if let Some(first) = fields.iter().find(|f| f.anonymous) {
            return Err(Error::ConflictingAnonymousAttribute {
                node: node.to_string(),
                first: first.attribute.clone(),
                second: attribute.to_string(),
            });
        }
    }
    fields.push(ValueField {
        attribute: attribute.to_string(),
        value: value.to_string(),
        anonymous,
    });
    Ok(())
}

fn codepoint_key(rules: &ConvertRules, element: &str, value: &str) -> String {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if rules.is_codepoint_element(element) => format!("U+{:04X}", c as u32),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Segment;
    use crate::rules::{AttributeTable, ReservedSymbol};

    fn node(text: &str) -> PathNode {
        let segment = Segment::parse(text, text, 0).unwrap();
        PathNode::from_segments(&segment, &segment, &ConvertRules::default())
    }

    fn node_with_full(path: &str, full: &str) -> PathNode {
        let p = Segment::parse(path, path, 0).unwrap();
        let f = Segment::parse(full, full, 0).unwrap();
        PathNode::from_segments(&p, &f, &ConvertRules::default())
    }

    #[test]
    fn test_type_becomes_key_body() {
        let rules = ConvertRules::default();
        let resolved = resolve_key(&rules, "calendars", &node(r#"calendar[@type="gregorian"]"#)).unwrap();
        assert_eq!(resolved.key, "gregorian");
        assert!(resolved.fields.is_empty());
    }

    #[test]
    fn test_plain_node_uses_its_name() {
        let rules = ConvertRules::default();
        let resolved = resolve_key(&rules, "ldml", &node("numbers")).unwrap();
        assert_eq!(resolved.key, "numbers");
    }

    #[test]
    fn test_suffixes_follow_table_order() {
        let rules = ConvertRules::default();
        let resolved = resolve_key(
            &rules,
            "numbers",
            &node(r#"symbols[@alt="short"][@numberSystem="arab"]"#),
        )
        .unwrap();
        assert_eq!(resolved.key, "symbols-numberSystem-arab-alt-short");
        assert_eq!(resolved.base, "symbols");
        let suffixes: Vec<&str> = resolved.suffixes.iter().map(|f| f.attribute.as_str()).collect();
        assert_eq!(suffixes, vec!["numberSystem", "alt"]);
    }

    #[test]
    fn test_unregistered_attribute_becomes_field() {
        let rules = ConvertRules::default();
        let resolved = resolve_key(&rules, "doc", &node(r#"item[@k="a"]"#)).unwrap();
        assert_eq!(resolved.key, "item");
        assert_eq!(resolved.fields.len(), 1);
        assert_eq!(resolved.fields[0].output_name(), "_k");
        assert_eq!(resolved.fields[0].value, "a");
    }

    #[test]
    fn test_ignorable_attributes_dropped() {
        let rules = ConvertRules::default();
        let resolved = resolve_key(
            &rules,
            "languages",
            &node_with_full(
                r#"language[@type="en"]"#,
                r#"language[@type="en"][@draft="contributed"][@references="R"]"#,
            ),
        )
        .unwrap();
        assert_eq!(resolved.key, "en");
        assert!(resolved.fields.is_empty());
    }

    #[test]
    fn test_compactable_fills_anonymous_slot() {
        let rules = ConvertRules::default();
        let resolved = resolve_key(&rules, "months", &node(r#"default[@choice="format"]"#)).unwrap();
        assert_eq!(resolved.key, "default");
        assert!(resolved.only_anonymous());
        assert_eq!(resolved.fields[0].output_name(), "__");
        assert_eq!(resolved.anonymous().map(|f| f.value.as_str()), Some("format"));
    }

    #[test]
    fn test_conflicting_key_body_is_fatal() {
        let mut rules = ConvertRules::default();
        rules.key_body = AttributeTable::parse(["*:currency:type", "*:currency:iso4217"]).unwrap();
        let err = resolve_key(
            &rules,
            "currencies",
            &node(r#"currency[@type="USD"][@iso4217="USD"]"#),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConflictingKeyAttribute { .. }));
    }

    #[test]
    fn test_conflicting_anonymous_is_fatal() {
        let mut rules = ConvertRules::default();
        rules.compactable = AttributeTable::parse(["*:x:a", "*:x:b"]).unwrap();
        let err = resolve_key(&rules, "p", &node(r#"x[@a="1"][@b="2"]"#)).unwrap_err();
        assert!(matches!(
            err,
            Error::ConflictingAnonymousAttribute { ref first, ref second, .. }
                if first == "a" && second == "b"
        ));
    }

    #[test]
    fn test_codepoint_key() {
        let rules = ConvertRules::default();
        let resolved = resolve_key(&rules, "character-fallback", &node(r#"character[@value="é"]"#)).unwrap();
        assert_eq!(resolved.key, "U+00E9");

        let resolved = resolve_key(&rules, "x", &node(r#"other[@type="é"]"#)).unwrap();
        assert_eq!(resolved.key, "é");
    }

    #[test]
    fn test_reserved_symbol_stripped() {
        let mut rules = ConvertRules::default();
        rules.reserved_symbols.push(ReservedSymbol {
            element: "unit".to_string(),
            symbol: '.',
        });
        let resolved = resolve_key(&rules, "units", &node(r#"unit[@type="length.meter"]"#)).unwrap();
        assert_eq!(resolved.key, "lengthmeter");
    }

    #[test]
    fn test_resolver_memoizes_and_is_idempotent() {
        let rules = ConvertRules::default();
        let mut resolver = KeyResolver::new(&rules);
        let n = node(r#"territory[@type="GB"][@alt="short"]"#);
        let first = resolver.resolve("territories", &n).unwrap();
        let second = resolver.resolve("territories", &n).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.key, "GB-alt-short");
        assert_eq!(resolver.cache.len(), 1);
        assert_eq!(first, resolve_key(&rules, "territories", &n).unwrap());
    }
}
