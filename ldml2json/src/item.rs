//! A single rewritten record on its way into a section.

use std::collections::HashSet;

use log::warn;

use crate::{
    error::Error,
    node::{PathNode, Segment, XPath, split_segments},
    rules::ConvertRules,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub path: String,
    pub full_path: String,
    /// Paths as they were before rewriting; used for sorting.
    pub untransformed_path: String,
    pub untransformed_full_path: String,
    pub value: String,
}

impl Item {
    pub fn new(
        path: impl Into<String>,
        full_path: impl Into<String>,
        untransformed_path: impl Into<String>,
        untransformed_full_path: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            full_path: full_path.into(),
            untransformed_path: untransformed_path.into(),
            untransformed_full_path: untransformed_full_path.into(),
            value: value.into(),
        }
    }

    /// Item whose full and untransformed paths all equal `path`.
    pub fn simple(path: impl Into<String>, value: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(path.clone(), path.clone(), path.clone(), path, value)
    }

    pub fn is_alias(&self, rules: &ConvertRules) -> bool {
        self.path.ends_with(rules.alias_suffix.as_str())
    }

    /// Path text before the first `[`.
    pub fn element_path(&self) -> &str {
        match self.path.find('[') {
            Some(pos) => &self.path[..pos],
            None => &self.path,
        }
    }

    /// Expands a splittable attribute into one item per word.
    ///
    /// Returns `None` when no registered attribute applies.
    pub fn split(&self, rules: &ConvertRules) -> Result<Option<Vec<Item>>, Error> {
        let full = XPath::parse(&self.full_path)?;
        let spec = match rules
            .splittable
            .iter()
            .find(|s| full.contains_element(&s.element) && full.contains_attribute(&s.attribute))
        {
            Some(spec) => spec,
            None => return Ok(None),
        };
        let words = match full.find_attribute_value(&spec.element, &spec.attribute) {
            Some(words) => words,
            None => return Ok(None),
        };

        let path = XPath::parse(&self.path)?;
        let untransformed = XPath::parse(&self.untransformed_path)?;
        let untransformed_full = XPath::parse(&self.untransformed_full_path)?;

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for word in words.split_whitespace() {
            if !seen.insert(word) {
                warn!("duplicate attribute {} in {}", word, self.full_path);
                continue;
            }
            let mut new_path = path.clone();
            let mut new_full = full.clone();
            let mut new_untransformed = untransformed.clone();
            let mut new_untransformed_full = untransformed_full.clone();
            for xpath in [
                &mut new_path,
                &mut new_full,
                &mut new_untransformed,
                &mut new_untransformed_full,
            ] {
                xpath.set_attribute(&spec.element, &spec.attribute, word);
            }

            let value = match &spec.value_attribute {
                Some(value_attribute) => {
                    let value = full
                        .find_attribute_value(&spec.element, value_attribute)
                        .unwrap_or_default()
                        .to_string();
                    for xpath in [&mut new_path, &mut new_full] {
                        xpath.remove_attribute(&spec.element, value_attribute);
                        xpath.remove_attribute(&spec.element, &spec.attribute);
                        xpath.add_element(word);
                    }
                    value
                }
                None => self.value.clone(),
            };
            items.push(Item::new(
                new_path.to_string(),
                new_full.to_string(),
                new_untransformed.to_string(),
                new_untransformed_full.to_string(),
                value,
            ));
        }
        Ok(Some(items))
    }

    /// Parses the path into its node sequence, root first.
    pub fn nodes(&self, rules: &ConvertRules) -> Result<Vec<PathNode>, Error> {
        let path_segments = split_segments(&self.path)?;
        let full_segments = split_segments(&self.full_path)?;
        if path_segments.len() != full_segments.len() {
            return Err(Error::malformed_path(
                &self.full_path,
                0,
                format!(
                    "full path has {} segments, path has {}",
                    full_segments.len(),
                    path_segments.len()
                ),
            ));
        }

        let mut nodes = Vec::with_capacity(path_segments.len());
        for ((p_off, p_text), (f_off, f_text)) in path_segments.into_iter().zip(full_segments) {
            let path_segment = Segment::parse(&self.path, p_text, p_off)?;
            let full_segment = Segment::parse(&self.full_path, f_text, f_off)?;
            let node = PathNode::from_segments(&path_segment, &full_segment, rules);

            let zone = node
                .distinguishing
                .get("type")
                .filter(|z| z.contains('/') && rules.is_timezone_element(&node.name))
                .map(str::to_string);
            match zone {
                Some(zone) => expand_timezone(&node, &zone, &mut nodes),
                None => nodes.push(node),
            }
        }
        Ok(nodes)
    }
}

// `zone[@type="America/Adak"]` becomes `zone`, `zone[@type="America"]`, `zone[@type="Adak"]`.
fn expand_timezone(node: &PathNode, zone: &str, nodes: &mut Vec<PathNode>) {
    nodes.push(PathNode::new(node.name.clone()));
    let zone = zone.replace("Asia:Taipei", "Asia/Taipei");
    let pieces: Vec<&str> = zone.split('/').collect();
    for (i, piece) in pieces.iter().enumerate() {
        let mut piece_node = PathNode::new(node.name.clone());
        if i == pieces.len() - 1 {
            piece_node.distinguishing = node.distinguishing.clone();
        }
        piece_node.distinguishing.insert("type", *piece);
        nodes.push(piece_node);
    }
}
