//! Whole-path rewriting ahead of section routing.

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;

use crate::{
    config::{DEFAULT_TRANSFORMS, TransformSpec, parse_transforms},
    error::Error,
    rules::anchored,
};

lazy_static! {
    // Code points that would break the segment grammar inside `cp="..."`.
    static ref CP_REMAP: Regex =
        Regex::new(r#"^(.*)\[@cp="(\[|\]|'|"|@|/|=)"\](.*)$"#).unwrap();
}

/// Converts a `$n` / `\x` replacement template into `regex` expansion syntax.
pub fn convert_template(template: &str) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('$') => out.push_str("$$"),
                Some(next) => out.push(next),
                None => {}
            },
            '$' if chars.peek().is_some_and(|n| n.is_ascii_digit()) => {
                out.push_str("${");
                while let Some(d) = chars.next_if(|n| n.is_ascii_digit()) {
                    out.push(d);
                }
                out.push('}');
            }
            '$' => out.push_str("$$"),
            c => out.push(c),
        }
    }
    out
}

fn escape_template(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == '$' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone)]
pub struct RewriteRule {
    spec: TransformSpec,
    pattern: Regex,
    template: String,
}

impl RewriteRule {
    pub fn new(spec: TransformSpec) -> Result<Self, Error> {
        let pattern = anchored(&spec.pattern)?;
        let template = convert_template(&spec.replacement);
        Ok(Self {
            spec,
            pattern,
            template,
        })
    }

    pub fn spec(&self) -> &TransformSpec {
        &self.spec
    }

    /// Rewritten path when the pattern matches all of `path`.
    pub fn apply(&self, path: &str) -> Option<String> {
        let caps = self.pattern.captures(path)?;
        let mut out = String::new();
        caps.expand(&self.template, &mut out);
        Some(out)
    }
}

#[derive(Debug, Clone)]
pub struct PathRewriter {
    rules: Vec<RewriteRule>,
    root_markers: Vec<String>,
    hyphenation_markers: Vec<String>,
}

impl PathRewriter {
    pub fn new(specs: Vec<TransformSpec>) -> Result<Self, Error> {
        let rules = specs
            .into_iter()
            .map(RewriteRule::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rules,
            root_markers: vec!["/ldml/".to_string(), "/supplementalData/".to_string()],
            hyphenation_markers: [
                "languages",
                "languageAlias",
                "languageMatches",
                "likelySubtags",
                "parentLocale",
                "locales=",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        })
    }

    /// Rewriter loaded with the built-in transforms.
    pub fn builtin() -> Result<Self, Error> {
        Self::new(parse_transforms(DEFAULT_TRANSFORMS)?)
    }

    /// Prepends the rules that stamp `version` onto identity and
    /// supplemental version elements.
    pub fn with_version(mut self, version: &str) -> Result<Self, Error> {
        let version = escape_template(version);
        let identity = RewriteRule::new(TransformSpec {
            pattern: r#"(.+)/identity/version\[@number="([^"]*)"\]"#.to_string(),
            replacement: format!(r#"$1/identity/version\[@cldrVersion="{}"\]"#, version),
            comment: "identity version".to_string(),
        })?;
        let supplemental = RewriteRule::new(TransformSpec {
            pattern: r#"(.+)/version\[@number="([^"]*)"\]\[@unicodeVersion="([^"]*")(\])"#.to_string(),
            replacement: format!(
                r#"$1/version\[@cldrVersion="{}"\]\[@unicodeVersion="$3\]"#,
                version
            ),
            comment: "supplemental version".to_string(),
        })?;
        self.rules.insert(0, identity);
        self.rules.insert(0, supplemental);
        Ok(self)
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn specs(&self) -> Vec<TransformSpec> {
        self.rules.iter().map(|r| r.spec().clone()).collect()
    }

    /// Applies the first whole-path rule only.
    pub fn apply_rules(&self, path: &str) -> String {
        for rule in &self.rules {
            if let Some(result) = rule.apply(path) {
                trace!("{} => {} ({})", path, result, rule.spec.pattern);
                return result;
            }
        }
        path.to_string()
    }

    /// Full rewrite of `path` under `prefix`. `None` drops the record.
    pub fn rewrite(&self, path: &str, prefix: &str) -> Option<String> {
        let path = remap_codepoint(path);
        let mut result = self.apply_rules(&path);
        if result.is_empty() {
            debug!("dropping {}", path);
            return None;
        }
        for marker in &self.root_markers {
            result = result.replacen(marker.as_str(), prefix, 1);
        }
        if self.hyphenation_markers.iter().any(|m| result.contains(m.as_str())) {
            result = result.replace('_', "-");
        }
        Some(result)
    }
}

fn remap_codepoint(path: &str) -> String {
    match CP_REMAP.captures(path) {
        Some(caps) => {
            let cp = caps[2].chars().next().map(|c| c as u32).unwrap_or_default();
            format!("{}[@cp=\"U+{:X}\"]{}", &caps[1], cp, &caps[3])
        }
        None => path.to_string(),
    }
}
