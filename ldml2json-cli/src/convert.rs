use ldml2json::config::{read_sections, read_transforms};
use ldml2json::traits::Parser;
use ldml2json::rbnf::RBNF_KIND;
use ldml2json::{ConversionReport, ConvertOptions, ConvertRules, Converter, RecordSet, SectionOutput, canonical_locale};

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ConvertArgs {
    pub inputs: Vec<String>,
    pub output: String,
    pub kind: String,
    pub locale: Option<String>,
    pub sections: Option<String>,
    pub transforms: Option<String>,
    /// Group outputs by the package named in the section rules.
    pub packages: bool,
    pub options: ConvertOptions,
}

/// Builds a converter from optional section and transform files.
pub fn build_converter(
    sections: Option<&str>,
    transforms: Option<&str>,
    options: ConvertOptions,
) -> Result<Converter, String> {
    let sections = sections
        .map(|path| read_sections(path).map_err(|e| format!("Error reading sections '{}': {}", path, e)))
        .transpose()?;
    let transforms = transforms
        .map(|path| read_transforms(path).map_err(|e| format!("Error reading transforms '{}': {}", path, e)))
        .transpose()?;
    Converter::with_config(ConvertRules::default(), sections.as_deref(), transforms, options)
        .map_err(|e| format!("Invalid configuration: {}", e))
}

/// Locale for an input: the explicit one, else the file stem (`en_GB.tsv` → `en_GB`).
pub fn input_locale(input: &str, explicit: Option<&str>) -> Option<String> {
    explicit.map(str::to_string).or_else(|| {
        Path::new(input)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
    })
}

/// Directory a section lands in: `<out>[/<package>]/<kind>[/<locale>]`.
pub fn section_dir(output: &str, package: Option<&str>, kind: &str, locale: Option<&str>) -> PathBuf {
    let mut dir = PathBuf::from(output);
    if let Some(package) = package {
        dir.push(package);
    }
    dir.push(kind);
    if kind == "main" {
        if let Some(locale) = locale {
            dir.push(locale);
        }
    }
    dir
}

/// File an output is written to: `<section>.json`, or `<locale>.json` for
/// RBNF data, which has one section per locale.
pub fn output_file_name(output: &SectionOutput, kind: &str, locale: Option<&str>) -> String {
    match (kind, locale) {
        (RBNF_KIND, Some(locale)) => format!("{}.json", canonical_locale(locale)),
        _ => output.file_name(),
    }
}

struct InputResult {
    input: String,
    locale: Option<String>,
    report: ConversionReport,
}

fn convert_input(converter: &Converter, args: &ConvertArgs, input: &str) -> Result<InputResult, String> {
    let records = RecordSet::read_from(input).map_err(|e| format!("Error reading '{}': {}", input, e))?;
    let locale = input_locale(input, args.locale.as_deref());
    let prefix = Converter::path_prefix(&args.kind, locale.as_deref());
    let report = match args.kind.as_str() {
        RBNF_KIND => converter.convert_for(&records.records, &prefix, locale.as_deref()),
        _ => converter.convert(&records.records, &prefix),
    }
    .map_err(|e| format!("Error converting '{}': {}", input, e))?;

    // The prefix carries the canonical locale, e.g. `/main/en-GB/`.
    let locale_dir = prefix.trim_matches('/').split('/').nth(1);
    for output in &report.outputs {
        let package = output.package.as_deref().filter(|_| args.packages);
        let dir = section_dir(&args.output, package, &args.kind, locale_dir);
        fs::create_dir_all(&dir).map_err(|e| format!("Error creating '{}': {}", dir.display(), e))?;
        let file = dir.join(output_file_name(output, &args.kind, locale.as_deref()));
        fs::write(&file, &output.document).map_err(|e| format!("Error writing '{}': {}", file.display(), e))?;
    }

    Ok(InputResult {
        input: input.to_string(),
        locale,
        report,
    })
}

/// Converts every input in parallel and prints the per-section value counts.
///
/// Returns the total number of values written.
pub fn run_convert_command(args: &ConvertArgs) -> Result<usize, String> {
    if args.inputs.is_empty() {
        return Err("No input files given".to_string());
    }
    let converter = build_converter(
        args.sections.as_deref(),
        args.transforms.as_deref(),
        args.options.clone(),
    )?;

    let results: Vec<Result<InputResult, String>> = args
        .inputs
        .par_iter()
        .map(|input| convert_input(&converter, args, input))
        .collect();

    let mut total = 0;
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(result) => {
                if args.inputs.len() > 1 {
                    println!("{}:", result.input);
                }
                for output in &result.report.outputs {
                    let file = output_file_name(output, &args.kind, result.locale.as_deref());
                    println!("{} = {} values", file, output.value_count);
                }
                for (section, error) in &result.report.failures {
                    errors.push(format!("{}: section {} failed: {}", result.input, section, error));
                }
                total += result.report.value_count();
            }
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(total)
    } else {
        Err(errors.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_locale_from_stem() {
        assert_eq!(input_locale("data/en_GB.tsv", None), Some("en_GB".to_string()));
        assert_eq!(input_locale("data/en_GB.tsv", Some("fr")), Some("fr".to_string()));
    }

    #[test]
    fn test_section_dir_layout() {
        assert_eq!(
            section_dir("out", Some("cldr-dates-full"), "main", Some("en-GB")),
            PathBuf::from("out/cldr-dates-full/main/en-GB")
        );
        assert_eq!(
            section_dir("out", None, "supplemental", Some("en")),
            PathBuf::from("out/supplemental")
        );
    }

    #[test]
    fn test_output_file_name_per_kind() {
        let output = SectionOutput {
            name: "rbnf".to_string(),
            package: Some("cldr-rbnf".to_string()),
            document: "{}\n".to_string(),
            value_count: 0,
        };
        assert_eq!(output_file_name(&output, "rbnf", Some("en_GB")), "en-GB.json");
        assert_eq!(output_file_name(&output, "main", Some("en_GB")), "rbnf.json");
        assert_eq!(output_file_name(&output, "rbnf", None), "rbnf.json");
    }

    #[test]
    fn test_build_converter_missing_file() {
        let result = build_converter(Some("/nonexistent/sections.txt"), None, ConvertOptions::default());
        assert!(result.is_err());
        assert!(result.err().unwrap_or_default().contains("Error reading sections"));
    }
}
