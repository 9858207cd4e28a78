use ldml2json::{Converter, Record};
use serde_json::json;

/// One rewritten record and the section it lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub section: String,
    pub path: String,
    pub value: String,
}

pub fn collect_routes(converter: &Converter, records: &[Record], prefix: &str) -> Vec<RouteEntry> {
    converter
        .prepare(records, prefix)
        .into_iter()
        .map(|item| RouteEntry {
            section: converter.router().section_for(&item.path).name.clone(),
            path: item.path,
            value: item.value,
        })
        .collect()
}

pub fn print_routes(entries: &[RouteEntry], json_output: bool) -> Result<(), String> {
    if json_output {
        let body: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "section": e.section,
                    "path": e.path,
                    "value": e.value,
                })
            })
            .collect();
        let text = serde_json::to_string_pretty(&body).map_err(|e| format!("Error rendering JSON: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    for entry in entries {
        println!("{}\t{}", entry.section, entry.path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldml2json::ConvertOptions;

    #[test]
    fn test_routes_follow_rewritten_paths() {
        let converter = Converter::new(ConvertOptions::default()).expect("built-in configuration");
        let records = vec![
            Record::simple(r#"//ldml/localeDisplayNames/languages/language[@type="de"]"#, "German"),
            Record::simple("//ldml/characters/ellipsis[@type=\"final\"]", "{0}…"),
        ];
        let prefix = Converter::path_prefix("main", Some("en"));
        let routes = collect_routes(&converter, &records, &prefix);
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].section, "languages");
        assert_eq!(
            routes[0].path,
            r#"//main/en/localeDisplayNames/languages/language[@type="de"]"#
        );
        assert_eq!(routes[0].value, "German");
        assert_eq!(routes[1].path, "//main/en/characters/ellipsis/final");
    }
}
