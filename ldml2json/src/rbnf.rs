//! Adjustments applied to rule-based number format items before emission.
//!
//! Rule text uses ICU's ASCII substitution markers, each rule's `value`
//! becomes the key of its text, and ruleset names carry ICU's `%` (public)
//! or `%%` (private) prefix.

use crate::{error::Error, item::Item, node::XPath};

/// Kind (first prefix component) whose items are adjusted.
pub const RBNF_KIND: &str = "rbnf";

const RULE_ELEMENT: &str = "rbnfrule";
const RULESET_ELEMENT: &str = "ruleset";

/// True for prefixes such as `/rbnf/`.
pub fn is_rbnf_prefix(prefix: &str) -> bool {
    prefix.trim_matches('/').split('/').next() == Some(RBNF_KIND)
}

/// Returns `item` rewritten for ICU consumption.
///
/// `rbnfrule[@value="0"]` with text `zero;` becomes `rbnfrule[@0="zero;"]`
/// in the full path with an empty value.
pub fn adjust(item: &Item) -> Result<Item, Error> {
    let mut value = item.value.replace('→', ">").replace('←', "<");
    let mut path = XPath::parse(&item.path)?;
    let mut full_path = XPath::parse(&item.full_path)?;

    let rule_value = full_path
        .find_attribute_value(RULE_ELEMENT, "value")
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    if let Some(rule_value) = rule_value {
        full_path.remove_attribute(RULE_ELEMENT, "value");
        full_path.set_attribute(RULE_ELEMENT, &rule_value, &value);
        value.clear();
    }

    let ruleset_type = full_path
        .find_attribute_value(RULESET_ELEMENT, "type")
        .map(str::to_string);
    if let Some(ruleset_type) = ruleset_type {
        let private = full_path
            .segments()
            .iter()
            .find(|s| s.name == RULESET_ELEMENT)
            .is_some_and(|s| s.attributes.contains_key("access"));
        let prefixed = format!("{}{}", if private { "%%" } else { "%" }, ruleset_type);
        full_path.set_attribute(RULESET_ELEMENT, "type", &prefixed);
        if path.find_attribute_value(RULESET_ELEMENT, "type").is_some() {
            path.set_attribute(RULESET_ELEMENT, "type", &prefixed);
        }
    }

    Ok(Item::new(
        path.to_string(),
        full_path.to_string(),
        item.untransformed_path.clone(),
        item.untransformed_full_path.clone(),
        value,
    ))
}
