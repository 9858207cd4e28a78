//! Streaming tree construction.
//!
//! Items arrive in section order. The emitter keeps a stack of open
//! containers matching the previous item's ancestors and, for each new item,
//! closes and opens only what differs (compared by node identity). Runs of
//! sort-group and array-group items are buffered and replayed when the run
//! ends.

use log::warn;

use crate::{
    error::Error,
    item::Item,
    node::{PathNode, XPath},
    resolver::{KeyResolver, ResolvedKey, ValueField},
    rules::ConvertRules,
    sort::ItemComparator,
    writer::TreeWriter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Object,
    Array,
    /// `{ "key": {` inside an array; owns two writer objects.
    Element,
}

#[derive(Debug)]
struct Frame {
    node: PathNode,
    kind: FrameKind,
}

/// An item with its node path parsed and its grouping decided.
#[derive(Debug, Clone)]
struct ParsedItem {
    item: Item,
    nodes: Vec<PathNode>,
    needs_sort: bool,
    /// Leading path and array level when the item is an array-group member.
    array: Option<(String, usize)>,
}

impl ParsedItem {
    fn leading(&self) -> Option<&str> {
        self.array.as_ref().map(|(leading, _)| leading.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitStats {
    /// Items accepted after splitting, aliases excluded.
    pub value_count: usize,
    /// Paths skipped as duplicate collisions.
    pub collisions: Vec<String>,
}

pub struct TreeEmitter<'a, W: TreeWriter> {
    rules: &'a ConvertRules,
    comparator: &'a dyn ItemComparator,
    resolver: KeyResolver<'a>,
    writer: W,
    stack: Vec<Frame>,
    /// Leaf written last, a sibling of whatever comes next at `stack.len()`.
    last_leaf: Option<PathNode>,
    sorting: Vec<ParsedItem>,
    array: Vec<ParsedItem>,
    previous_identity: Option<String>,
    /// Region of the locale being emitted; `Some("")` for a locale without one.
    region: Option<String>,
    root_open: bool,
    stats: EmitStats,
}

impl<'a, W: TreeWriter> TreeEmitter<'a, W> {
    pub fn new(rules: &'a ConvertRules, comparator: &'a dyn ItemComparator, writer: W) -> Self {
        Self {
            rules,
            comparator,
            resolver: KeyResolver::new(rules),
            writer,
            stack: Vec::new(),
            last_leaf: None,
            sorting: Vec::new(),
            array: Vec::new(),
            previous_identity: None,
            region: None,
            root_open: false,
            stats: EmitStats::default(),
        }
    }

    /// Drops identity territories other than `region`.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn stats(&self) -> &EmitStats {
        &self.stats
    }

    /// Feeds one item in section order.
    pub fn push(&mut self, item: &Item) -> Result<(), Error> {
        if item.path.contains(self.rules.identity_marker.as_str()) {
            if self.is_foreign_territory(item)? {
                return Ok(());
            }
            let element_path = item.element_path();
            if self.previous_identity.as_deref() == Some(element_path) {
                return Ok(());
            }
            self.previous_identity = Some(element_path.to_string());
        }

        let items = match item.split(self.rules)? {
            Some(items) => items,
            None => vec![item.clone()],
        };
        for item in items {
            if item.is_alias(self.rules) {
                continue;
            }
            self.stats.value_count += 1;
            let parsed = self.prepare(item)?;

            if parsed.needs_sort {
                self.flush_array()?;
                self.sorting.push(parsed);
            } else if let Some(leading) = parsed.leading() {
                self.flush_sorting()?;
                let switched = self
                    .array
                    .first()
                    .is_some_and(|first| first.leading() != Some(leading));
                if switched {
                    self.flush_array()?;
                }
                self.array.push(parsed);
            } else {
                self.flush_sorting()?;
                self.flush_array()?;
                self.emit_plain(&parsed)?;
            }
        }
        Ok(())
    }

    /// Flushes pending groups, closes everything and returns the writer.
    pub fn finish(mut self) -> Result<(W, EmitStats), Error> {
        self.flush_sorting()?;
        self.flush_array()?;
        self.ensure_root()?;
        self.close_to(0)?;
        self.writer.end_object()?;
        Ok((self.writer, self.stats))
    }

    fn is_foreign_territory(&self, item: &Item) -> Result<bool, Error> {
        let Some(region) = self.region.as_deref() else {
            return Ok(false);
        };
        let path = XPath::parse(&item.path)?;
        Ok(match path.find_attribute_value("territory", "type") {
            Some(territory) => !territory.is_empty() && territory != region,
            None => false,
        })
    }

    fn prepare(&self, item: Item) -> Result<ParsedItem, Error> {
        let nodes = item.nodes(self.rules)?;
        let needs_sort = nodes.iter().any(|n| self.rules.is_sort_element(&n.name));
        let array = match self.rules.array_leading_path(&item.path) {
            Some(leading) => {
                let trimmed = leading.trim_end_matches('/');
                let level = Item::simple(trimmed, "").nodes(self.rules)?.len();
                (level >= 1 && nodes.len() > level).then(|| (leading.to_string(), level))
            }
            None => None,
        };
        Ok(ParsedItem {
            item,
            nodes,
            needs_sort,
            array,
        })
    }

    fn ensure_root(&mut self) -> Result<(), Error> {
        if !self.root_open {
            self.writer.begin_object()?;
            self.root_open = true;
        }
        Ok(())
    }

    /// Length of the common identity prefix of the open stack and `nodes`.
    fn divergence(&self, nodes: &[PathNode]) -> usize {
        self.stack
            .iter()
            .zip(nodes)
            .take_while(|(frame, node)| frame.node.same_identity(node))
            .count()
    }

    fn close_to(&mut self, depth: usize) -> Result<(), Error> {
        while self.stack.len() > depth {
            if let Some(frame) = self.stack.pop() {
                match frame.kind {
                    FrameKind::Object => self.writer.end_object()?,
                    FrameKind::Array => self.writer.end_array()?,
                    FrameKind::Element => {
                        self.writer.end_object()?;
                        self.writer.end_object()?;
                    }
                }
            }
            self.last_leaf = None;
        }
        Ok(())
    }

    /// True when the leaf of `nodes` clashes with what was just written.
    fn collides(&self, d: usize, nodes: &[PathNode]) -> bool {
        let n = nodes.len();
        let leaf = &nodes[n - 1];
        let same_as_last = |node: &PathNode| {
            self.last_leaf
                .as_ref()
                .is_some_and(|last| last.same_identity(node))
        };
        if d == n - 1 {
            match self.stack.get(d) {
                Some(frame) => frame.node.same_identity(leaf),
                None => self.stack.len() == d && same_as_last(leaf),
            }
        } else {
            d == self.stack.len() && same_as_last(&nodes[d])
        }
    }

    fn record_collision(&mut self, path: &str) {
        let error = Error::DuplicatePathCollision(path.to_string());
        warn!("{}", error);
        self.stats.collisions.push(path.to_string());
    }

    fn resolve(&mut self, nodes: &[PathNode], index: usize) -> Result<ResolvedKey, Error> {
        let parent = match index {
            0 => "",
            i => nodes[i - 1].name.as_str(),
        };
        self.resolver.resolve(parent, &nodes[index])
    }

    fn parent_name(nodes: &[PathNode], index: usize) -> &str {
        match index {
            0 => "",
            i => nodes[i - 1].name.as_str(),
        }
    }

    fn open_containers(&mut self, nodes: &[PathNode], from: usize, to: usize) -> Result<(), Error> {
        for i in from..to {
            let resolved = self.resolve(nodes, i)?;
            self.writer.name(&resolved.key)?;
            self.writer.begin_object()?;
            self.write_fields(&resolved.fields)?;
            self.stack.push(Frame {
                node: nodes[i].clone(),
                kind: FrameKind::Object,
            });
        }
        self.last_leaf = None;
        Ok(())
    }

    fn write_fields(&mut self, fields: &[ValueField]) -> Result<(), Error> {
        for field in fields {
            self.writer.name(&field.output_name())?;
            if !field.anonymous && self.rules.is_array_valued(&field.attribute) {
                self.write_words(&field.value)?;
            } else {
                self.writer.value(&field.value)?;
            }
        }
        Ok(())
    }

    fn write_words(&mut self, text: &str) -> Result<(), Error> {
        self.writer.begin_array()?;
        for word in text.split_whitespace() {
            self.writer.value(word)?;
        }
        self.writer.end_array()
    }

    /// Writes the leaf of `nodes`, named when `named` is set. A bare leaf
    /// inside an array carries its key suffixes as fields instead.
    fn write_leaf(&mut self, nodes: &[PathNode], value: &str, named: bool) -> Result<(), Error> {
        let index = nodes.len() - 1;
        let resolved = self.resolve(nodes, index)?;
        let value_array = self
            .rules
            .value_is_array(&nodes[index].name, Self::parent_name(nodes, index));
        let suffixes: &[ValueField] = if named {
            self.writer.name(&resolved.key)?;
            &[]
        } else {
            &resolved.suffixes
        };

        if resolved.fields.is_empty() && suffixes.is_empty() {
            return match (value.is_empty(), value_array) {
                (_, true) => self.write_words(value),
                (true, false) => {
                    self.writer.begin_object()?;
                    self.writer.end_object()
                }
                (false, false) => self.writer.value(value),
            };
        }

        if value.is_empty()
            && suffixes.is_empty()
            && resolved.only_anonymous()
            && let Some(anonymous) = resolved.anonymous()
        {
            return if value_array {
                self.write_words(&anonymous.value)
            } else {
                self.writer.value(&anonymous.value)
            };
        }

        self.writer.begin_object()?;
        if !value.is_empty() {
            self.writer.name("_value")?;
            self.writer.value(value)?;
        }
        self.write_fields(&resolved.fields)?;
        self.write_fields(suffixes)?;
        self.writer.end_object()
    }

    fn emit_plain(&mut self, parsed: &ParsedItem) -> Result<(), Error> {
        self.ensure_root()?;
        let nodes = &parsed.nodes;
        let n = nodes.len();
        let d = self.divergence(&nodes[..n - 1]);
        if self.collides(d, nodes) {
            self.record_collision(&parsed.item.path);
            return Ok(());
        }
        self.close_to(d)?;
        self.open_containers(nodes, d, n - 1)?;
        self.write_leaf(nodes, &parsed.item.value, true)?;
        self.last_leaf = Some(nodes[n - 1].clone());
        Ok(())
    }

    fn flush_sorting(&mut self) -> Result<(), Error> {
        if self.sorting.is_empty() {
            return Ok(());
        }
        let mut items = std::mem::take(&mut self.sorting);
        let comparator = self.comparator;
        items.sort_by(|a, b| comparator.compare(&a.item, &b.item));

        let mut group: Vec<ParsedItem> = Vec::new();
        for parsed in items {
            match parsed.leading() {
                Some(leading) => {
                    if group.first().is_some_and(|first| first.leading() != Some(leading)) {
                        self.emit_array(std::mem::take(&mut group))?;
                    }
                    group.push(parsed);
                }
                None => {
                    self.emit_array(std::mem::take(&mut group))?;
                    self.emit_plain(&parsed)?;
                }
            }
        }
        self.emit_array(group)
    }

    fn flush_array(&mut self) -> Result<(), Error> {
        let items = std::mem::take(&mut self.array);
        self.emit_array(items)
    }

    fn emit_array(&mut self, mut items: Vec<ParsedItem>) -> Result<(), Error> {
        let level = match items.first().and_then(|first| first.array.as_ref()) {
            Some((_, level)) => *level,
            None => return Ok(()),
        };
        if items[0].needs_sort {
            let comparator = self.comparator;
            items.sort_by(|a, b| comparator.compare(&a.item, &b.item));
        }
        self.ensure_root()?;

        let container = level - 1;
        let first = &items[0].nodes;
        let d = self.divergence(&first[..container]);
        let reused = match self.stack.get(container) {
            Some(frame) => d == container && frame.node.same_identity(&first[container]),
            None => {
                d == container
                    && self
                        .last_leaf
                        .as_ref()
                        .is_some_and(|last| last.same_identity(&first[container]))
            }
        };
        if reused {
            warn!(
                "array container `{}` is emitted twice under the same parent",
                first[container]
            );
        }

        let keyed = first.iter().any(|n| self.rules.is_object_array_element(&n.name));

        self.close_to(d)?;
        self.open_containers(first, d, container)?;
        let resolved = self.resolve(first, container)?;
        self.writer.name(&resolved.key)?;
        let kind = if keyed {
            self.writer.begin_object()?;
            FrameKind::Object
        } else {
            self.writer.begin_array()?;
            FrameKind::Array
        };
        self.stack.push(Frame {
            node: first[container].clone(),
            kind,
        });
        self.last_leaf = None;

        for parsed in &items {
            if keyed {
                self.emit_keyed_member(parsed, level)?;
            } else {
                self.emit_element(parsed, level)?;
            }
        }

        self.close_to(container)?;
        self.last_leaf = Some(items[0].nodes[container].clone());
        Ok(())
    }

    /// Writes a member of a keyed array group straight into its container.
    fn emit_keyed_member(&mut self, parsed: &ParsedItem, level: usize) -> Result<(), Error> {
        let nodes = &parsed.nodes;
        let n = nodes.len();
        if n != level + 1 || !self.rules.is_object_array_element(&nodes[n - 1].name) {
            return self.emit_plain(parsed);
        }
        self.close_to(level)?;
        self.write_member_fields(nodes, &parsed.item.value)?;
        self.last_leaf = None;
        Ok(())
    }

    /// Fields are written under their bare attribute names. A `radix` field
    /// is folded into the other names as `name/radix`.
    fn write_member_fields(&mut self, nodes: &[PathNode], value: &str) -> Result<(), Error> {
        let resolved = self.resolve(nodes, nodes.len() - 1)?;
        let mut fields: Vec<ValueField> = resolved.fields.into_iter().chain(resolved.suffixes).collect();
        if let Some(pos) = fields.iter().position(|f| f.attribute == "radix") {
            let radix = fields.remove(pos).value;
            for field in &mut fields {
                field.attribute = format!("{}/{}", field.attribute, radix);
            }
        }

        if fields.is_empty() {
            self.writer.name(&resolved.key)?;
            return self.writer.value(value);
        }
        if !value.is_empty() {
            self.writer.name("_value")?;
            self.writer.value(value)?;
        }
        for field in &fields {
            self.writer.name(&field.attribute)?;
            if self.rules.is_array_valued(&field.attribute) {
                self.write_words(&field.value)?;
            } else {
                self.writer.value(&field.value)?;
            }
        }
        Ok(())
    }

    fn emit_element(&mut self, parsed: &ParsedItem, level: usize) -> Result<(), Error> {
        let nodes = &parsed.nodes;
        let n = nodes.len();
        let value = parsed.item.value.as_str();
        let d = self.divergence(&nodes[..n - 1]);

        // Same element as the previous item: continue inside it.
        if d > level && self.stack.len() > level {
            if self.collides(d, nodes) {
                self.record_collision(&parsed.item.path);
                return Ok(());
            }
            self.close_to(d)?;
            self.open_containers(nodes, d, n - 1)?;
            self.write_leaf(nodes, value, true)?;
            self.last_leaf = Some(nodes[n - 1].clone());
            return Ok(());
        }

        self.close_to(level)?;
        if n == level + 1 {
            self.write_leaf(nodes, value, false)?;
            self.last_leaf = None;
            return Ok(());
        }

        let resolved = self.resolve(nodes, level)?;
        self.writer.begin_object()?;
        self.writer.name(&resolved.base)?;
        self.writer.begin_object()?;
        self.write_fields(&resolved.fields)?;
        self.write_fields(&resolved.suffixes)?;
        self.stack.push(Frame {
            node: nodes[level].clone(),
            kind: FrameKind::Element,
        });
        self.open_containers(nodes, level + 1, n - 1)?;
        self.write_leaf(nodes, value, true)?;
        self.last_leaf = Some(nodes[n - 1].clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sort::PathComparator,
        writer::{EventRecorder, JsonTreeWriter, WriterEvent},
    };
    use serde_json::{Value, json};

    fn convert_with(rules: &ConvertRules, items: &[Item]) -> (Value, EmitStats) {
        let mut emitter = TreeEmitter::new(rules, &PathComparator, JsonTreeWriter::new(Vec::new()));
        for item in items {
            emitter.push(item).unwrap();
        }
        let (writer, stats) = emitter.finish().unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        (serde_json::from_str(&text).unwrap(), stats)
    }

    fn convert(items: &[Item]) -> Value {
        convert_with(&ConvertRules::default(), items).0
    }

    #[test]
    fn test_nested_objects_and_siblings() {
        let doc = convert(&[
            Item::simple("//main/en/numbers/decimal", "."),
            Item::simple("//main/en/numbers/group", ","),
            Item::simple("//main/en/layout/orientation", ""),
        ]);
        assert_eq!(
            doc,
            json!({"main": {"en": {
                "numbers": {"decimal": ".", "group": ","},
                "layout": {"orientation": {}}
            }}})
        );
    }

    #[test]
    fn test_key_body_and_fields() {
        let doc = convert(&[
            Item::simple(r#"//main/en/localeDisplayNames/territories/territory[@type="GB"]"#, "UK"),
            Item::simple(
                r#"//main/en/localeDisplayNames/territories/territory[@type="GB"][@alt="short"]"#,
                "U.K.",
            ),
            Item::simple(r#"//doc/item[@k="a"]"#, "1"),
        ]);
        assert_eq!(doc["main"]["en"]["localeDisplayNames"]["territories"]["GB"], "UK");
        assert_eq!(
            doc["main"]["en"]["localeDisplayNames"]["territories"]["GB-alt-short"],
            "U.K."
        );
        assert_eq!(doc["doc"]["item"], json!({"_value": "1", "_k": "a"}));
    }

    #[test]
    fn test_container_fields() {
        let doc = convert(&[Item::simple(r#"//doc/group[@k="a"]/leaf"#, "1")]);
        assert_eq!(doc, json!({"doc": {"group": {"_k": "a", "leaf": "1"}}}));
    }

    #[test]
    fn test_anonymous_collapse() {
        let doc = convert(&[
            Item::simple(r#"//main/en/dates/calendars/gregorian/months/default[@choice="format"]"#, ""),
            Item::simple(r#"//main/en/dates/calendars/gregorian/days/default[@choice="format"]"#, "x"),
        ]);
        let gregorian = &doc["main"]["en"]["dates"]["calendars"]["gregorian"];
        assert_eq!(gregorian["months"]["default"], "format");
        assert_eq!(gregorian["days"]["default"], json!({"_value": "x", "__": "format"}));
    }

    #[test]
    fn test_array_valued_attribute() {
        let doc = convert(&[Item::simple(
            r#"//supplemental/territoryContainment/group[@type="EU"][@contains="AT BE"]"#,
            "",
        )]);
        assert_eq!(
            doc["supplemental"]["territoryContainment"]["EU"],
            json!({"_contains": ["AT", "BE"]})
        );
    }

    #[test]
    fn test_value_array_leaf() {
        let doc = convert(&[Item::simple(
            r#"//supplemental/grammaticalData/grammaticalFeatures/grammaticalCase"#,
            "nominative accusative",
        )]);
        assert_eq!(
            doc["supplemental"]["grammaticalData"]["grammaticalFeatures"]["grammaticalCase"],
            json!(["nominative", "accusative"])
        );
    }

    #[test]
    fn test_scenario_list_array() {
        let rules = ConvertRules::default().with_array_pattern("(.*/list/)(.*)").unwrap();
        let (doc, _) = convert_with(
            &rules,
            &[
                Item::simple(r#"//doc/list/item[@k="a"]"#, "1"),
                Item::simple(r#"//doc/list/item[@k="b"]"#, "2"),
            ],
        );
        assert_eq!(
            doc,
            json!({"doc": {"list": [{"_value": "1", "_k": "a"}, {"_value": "2", "_k": "b"}]}})
        );
    }

    #[test]
    fn test_deep_array_elements() {
        let rules = ConvertRules::default().with_array_pattern("(.*/list/)(.*)").unwrap();
        let (doc, _) = convert_with(
            &rules,
            &[
                Item::simple(r#"//doc/list/entry[@type="x"][@alt="y"]/a"#, "1"),
                Item::simple(r#"//doc/list/entry[@type="x"][@alt="y"]/b"#, "2"),
                Item::simple(r#"//doc/list/entry[@type="z"]/a"#, "3"),
                Item::simple(r#"//doc/list/plain"#, ""),
                Item::simple("//doc/after", "4"),
            ],
        );
        assert_eq!(
            doc,
            json!({"doc": {
                "list": [
                    {"x": {"_alt": "y", "a": "1", "b": "2"}},
                    {"z": {"a": "3"}},
                    {}
                ],
                "after": "4"
            }})
        );
    }

    #[test]
    fn test_sorted_zones_form_nested_tree() {
        let doc = convert(&[
            Item::simple(r#"//main/en/dates/timeZoneNames/zone[@type="Europe/Berlin"]/exemplarCity"#, "Berlin"),
            Item::simple(r#"//main/en/dates/timeZoneNames/zone[@type="America/Adak"]/exemplarCity"#, "Adak"),
            Item::simple(r#"//main/en/dates/timeZoneNames/zone[@type="America/Adak"]/short/generic"#, "HST"),
            Item::simple("//main/en/dates/timeZoneNames/gmtFormat", "GMT{0}"),
        ]);
        let names = &doc["main"]["en"]["dates"]["timeZoneNames"];
        assert_eq!(names["zone"]["America"]["Adak"]["exemplarCity"], "Adak");
        assert_eq!(names["zone"]["America"]["Adak"]["short"]["generic"], "HST");
        assert_eq!(names["zone"]["Europe"]["Berlin"]["exemplarCity"], "Berlin");
        assert_eq!(names["gmtFormat"], "GMT{0}");
    }

    #[test]
    fn test_split_items_and_value_count() {
        let (doc, stats) = convert_with(
            &ConvertRules::default(),
            &[Item::simple(
                r#"//supplemental/weekData/firstDay[@day="mon"][@territories="DE FR"]"#,
                "",
            )],
        );
        assert_eq!(doc["supplemental"]["weekData"]["firstDay"], json!({"DE": "mon", "FR": "mon"}));
        assert_eq!(stats.value_count, 2);
    }

    #[test]
    fn test_aliases_dropped() {
        let (doc, stats) = convert_with(
            &ConvertRules::default(),
            &[
                Item::simple("//main/en/numbers/alias", ""),
                Item::simple("//main/en/numbers/decimal", "."),
            ],
        );
        assert_eq!(doc, json!({"main": {"en": {"numbers": {"decimal": "."}}}}));
        assert_eq!(stats.value_count, 1);
    }

    fn convert_in_region(region: &str, items: &[Item]) -> (Value, EmitStats) {
        let rules = ConvertRules::default();
        let mut emitter =
            TreeEmitter::new(&rules, &PathComparator, JsonTreeWriter::new(Vec::new())).with_region(region);
        for item in items {
            emitter.push(item).unwrap();
        }
        let (writer, stats) = emitter.finish().unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        (serde_json::from_str(&text).unwrap(), stats)
    }

    #[test]
    fn test_identity_deduplicated() {
        let (doc, stats) = convert_in_region(
            "GB",
            &[
                Item::simple(r#"//main/en-GB/identity/language[@type="en"]"#, ""),
                Item::simple(r#"//main/en-GB/identity/language[@type="en"]"#, ""),
                Item::simple(r#"//main/en-GB/identity/territory[@type="GB"]"#, ""),
            ],
        );
        assert_eq!(
            doc,
            json!({"main": {"en-GB": {"identity": {"language": "en", "territory": "GB"}}}})
        );
        assert_eq!(stats.value_count, 2);
    }

    #[test]
    fn test_identity_territory_outside_region_dropped() {
        let items = [
            Item::simple(r#"//main/en/identity/language[@type="en"]"#, ""),
            Item::simple(r#"//main/en/identity/territory[@type="GB"]"#, ""),
            Item::simple(r#"//main/en/localeDisplayNames/territories/territory[@type="GB"]"#, "UK"),
        ];
        let (doc, stats) = convert_in_region("", &items);
        assert_eq!(
            doc,
            json!({"main": {"en": {
                "identity": {"language": "en"},
                "localeDisplayNames": {"territories": {"GB": "UK"}}
            }}})
        );
        assert_eq!(stats.value_count, 2);

        let (doc, _) = convert_in_region("US", &items);
        assert!(doc["main"]["en"]["identity"].get("territory").is_none());

        // Without a known region nothing is filtered.
        assert_eq!(convert(&items)["main"]["en"]["identity"]["territory"], "GB");
    }

    #[test]
    fn test_rule_groups_written_as_objects() {
        let grouping = r#"//rbnf/rbnf/rulesetGrouping[@type="SpelloutRules"]"#;
        let rule = |ruleset: &str, full_ruleset: &str, q: usize, attrs: &str| {
            let path = format!(r#"{}/{}/rbnfrule[@_q="{}"]"#, grouping, ruleset, q);
            let full = format!(r#"{}/{}/rbnfrule[@_q="{}"]{}"#, grouping, full_ruleset, q, attrs);
            Item::new(&path, &full, &path, &full, "")
        };
        let numbering = r#"ruleset[@type="%spellout-numbering"]"#;
        let year = r#"ruleset[@type="%%2d-year"]"#;
        let year_full = r#"ruleset[@type="%%2d-year"][@access="private"]"#;
        let (doc, stats) = convert_with(
            &ConvertRules::default(),
            &[
                rule(numbering, numbering, 1, r#"[@0="zero;"]"#),
                rule(numbering, numbering, 2, r#"[@1="one;"]"#),
                rule(numbering, numbering, 3, r#"[@radix="1000"][@100="<< hundred[ >>];"]"#),
                rule(year, year_full, 4, r#"[@0="hundred;"]"#),
            ],
        );
        assert_eq!(
            doc,
            json!({"rbnf": {"rbnf": {"SpelloutRules": {
                "%spellout-numbering": {"0": "zero;", "1": "one;", "100/1000": "<< hundred[ >>];"},
                "%%2d-year": {"0": "hundred;"}
            }}}})
        );
        assert_eq!(stats.value_count, 4);
        assert!(stats.collisions.is_empty());
    }

    #[test]
    fn test_duplicate_path_collision() {
        let (doc, stats) = convert_with(
            &ConvertRules::default(),
            &[
                Item::simple("//a/b", "first"),
                Item::simple("//a/b", "second"),
                Item::simple("//a/b/c", "third"),
            ],
        );
        assert_eq!(doc, json!({"a": {"b": "first"}}));
        assert_eq!(stats.collisions, vec!["//a/b".to_string(), "//a/b/c".to_string()]);
    }

    #[test]
    fn test_leaf_over_open_container_collides() {
        let (doc, stats) = convert_with(
            &ConvertRules::default(),
            &[Item::simple("//a/b/c", "1"), Item::simple("//a/b", "2")],
        );
        assert_eq!(doc, json!({"a": {"b": {"c": "1"}}}));
        assert_eq!(stats.collisions.len(), 1);
    }

    #[test]
    fn test_prefix_divergence_events() {
        let rules = ConvertRules::default();
        let mut emitter = TreeEmitter::new(&rules, &PathComparator, EventRecorder::new());
        emitter.push(&Item::simple("//a/b/c/x", "1")).unwrap();
        emitter.push(&Item::simple("//a/b/d/x", "2")).unwrap();
        let (recorder, _) = emitter.finish().unwrap();

        let first = recorder
            .events
            .iter()
            .position(|e| *e == WriterEvent::Value("1".to_string()))
            .unwrap();
        let second = recorder
            .events
            .iter()
            .position(|e| *e == WriterEvent::Value("2".to_string()))
            .unwrap();
        let between = &recorder.events[first + 1..second];
        assert_eq!(
            between,
            &[
                WriterEvent::EndObject,
                WriterEvent::Name("d".to_string()),
                WriterEvent::BeginObject,
                WriterEvent::Name("x".to_string()),
            ]
        );
        assert!(recorder.is_closed());
    }

    #[test]
    fn test_empty_section_is_empty_object() {
        let (doc, stats) = convert_with(&ConvertRules::default(), &[]);
        assert_eq!(doc, json!({}));
        assert_eq!(stats, EmitStats::default());
    }

    #[test]
    fn test_malformed_path_is_fatal() {
        let rules = ConvertRules::default();
        let mut emitter = TreeEmitter::new(&rules, &PathComparator, EventRecorder::new());
        let err = emitter.push(&Item::simple(r#"//a/b[@x="1"/c"#, "")).unwrap_err();
        assert!(matches!(err, Error::MalformedPath { .. }));
    }
}
