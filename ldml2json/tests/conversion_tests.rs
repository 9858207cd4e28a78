use ldml2json::traits::Parser;
use ldml2json::{ConvertOptions, Converter, Item, ItemComparator, Record, RecordSet, write_to_dir};
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::fs;
use std::sync::Arc;

fn convert(records: &[Record], kind: &str, locale: Option<&str>) -> ldml2json::ConversionReport {
    let converter = Converter::new(ConvertOptions::default()).expect("built-in configuration");
    let prefix = Converter::path_prefix(kind, locale);
    converter.convert(records, &prefix).expect("conversion")
}

fn document(report: &ldml2json::ConversionReport, section: &str) -> Value {
    let output = report
        .output(section)
        .unwrap_or_else(|| panic!("section {} missing", section));
    serde_json::from_str(&output.document).expect("valid json")
}

#[test]
fn test_locale_sections() {
    let records = vec![
        Record::simple(r#"//ldml/identity/language[@type="en"]"#, ""),
        Record::simple(r#"//ldml/identity/territory[@type="GB"]"#, ""),
        Record::simple(
            r#"//ldml/dates/calendars/calendar[@type="gregorian"]/months/monthContext[@type="format"]/monthWidth[@type="wide"]/month[@type="1"]"#,
            "January",
        ),
        Record::simple(
            r#"//ldml/dates/calendars/calendar[@type="gregorian"]/months/monthContext[@type="format"]/monthWidth[@type="wide"]/month[@type="2"]"#,
            "February",
        ),
        Record::simple("//ldml/numbers/defaultNumberingSystem", "latn"),
        Record::simple(r#"//ldml/numbers/symbols[@numberSystem="latn"]/decimal"#, "."),
        Record::simple(r#"//ldml/numbers/symbols[@numberSystem="arab"]/decimal"#, "٫"),
    ];
    let report = convert(&records, "main", Some("en_GB"));
    assert!(report.is_success());

    let gregorian = document(&report, "ca-gregorian");
    let en = &gregorian["main"]["en-GB"];
    assert_eq!(en["identity"]["language"], "en");
    assert_eq!(en["identity"]["territory"], "GB");
    assert_eq!(
        en["dates"]["calendars"]["gregorian"]["months"]["format"]["wide"],
        json!({"1": "January", "2": "February"})
    );

    let numbers = document(&report, "numbers");
    let numbers = &numbers["main"]["en-GB"]["numbers"];
    assert_eq!(numbers["defaultNumberingSystem"], "latn");
    assert_eq!(numbers["symbols-numberSystem-latn"]["decimal"], ".");
    assert!(numbers.get("symbols-numberSystem-arab").is_none());
}

#[test]
fn test_language_matching_array() {
    let records = vec![
        Record::simple(
            r#"//supplementalData/languageMatching/languageMatches[@type="written"]/languageMatch[@desired="nb"][@supported="no"][@distance="1"]"#,
            "",
        ),
        Record::simple(
            r#"//supplementalData/languageMatching/languageMatches[@type="written"]/languageMatch[@desired="ru"][@supported="be"][@distance="4"]"#,
            "",
        ),
    ];
    let report = convert(&records, "supplemental", None);
    let doc = document(&report, "languageMatching");
    assert_eq!(
        doc,
        json!({"supplemental": {"languageMatching": {"written": [
            {"_supported": "no", "_distance": "1", "_desired": "nb"},
            {"_supported": "be", "_distance": "4", "_desired": "ru"}
        ]}}})
    );
}

#[test]
fn test_week_data_split_and_sorted() {
    let records = vec![
        Record::simple(r#"//supplementalData/weekData/firstDay[@day="sun"][@territories="US AG"]"#, ""),
        Record::simple(r#"//supplementalData/weekData/firstDay[@day="mon"][@territories="001"]"#, ""),
    ];
    let report = convert(&records, "supplemental", None);
    let output = report.output("weekData").expect("weekData written");
    assert_eq!(output.value_count, 3);
    let doc: Value = serde_json::from_str(&output.document).expect("valid json");
    assert_eq!(
        doc["supplemental"]["weekData"]["firstDay"],
        json!({"001": "mon", "AG": "sun", "US": "sun"})
    );
    // Sorted by territory before emission.
    let first = output.document.find("\"001\"").expect("001 present");
    let ag = output.document.find("\"AG\"").expect("AG present");
    let us = output.document.find("\"US\"").expect("US present");
    assert!(first < ag && ag < us);
}

struct ReversePathOrder;

impl ItemComparator for ReversePathOrder {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        b.untransformed_path.cmp(&a.untransformed_path)
    }
}

#[test]
fn test_custom_comparator_orders_sort_groups() {
    let records = vec![
        Record::simple(r#"//supplementalData/weekData/firstDay[@day="mon"][@territories="001"]"#, ""),
        Record::simple(r#"//supplementalData/weekData/firstDay[@day="sun"][@territories="US AG"]"#, ""),
    ];
    let converter = Converter::new(ConvertOptions::default())
        .expect("built-in configuration")
        .with_comparator(Arc::new(ReversePathOrder));
    let report = converter
        .convert(&records, &Converter::path_prefix("supplemental", None))
        .expect("conversion");
    let document = &report.output("weekData").expect("weekData written").document;
    let first = document.find("\"001\"").expect("001 present");
    let ag = document.find("\"AG\"").expect("AG present");
    let us = document.find("\"US\"").expect("US present");
    assert!(us < ag && ag < first);
}

#[test]
fn test_metazone_history_arrays() {
    let records = vec![
        Record::simple(
            r#"//supplementalData/metaZones/metazoneInfo/timezone[@type="America/Adak"]/usesMetazone[@to="1983-10-30 12:00"][@mzone="Alaska"]"#,
            "",
        ),
        Record::simple(
            r#"//supplementalData/metaZones/metazoneInfo/timezone[@type="America/Adak"]/usesMetazone[@from="1983-10-30 12:00"][@mzone="Hawaii_Aleutian"]"#,
            "",
        ),
    ];
    let report = convert(&records, "supplemental", None);
    let doc = document(&report, "metaZones");
    let adak = doc["supplemental"]["metaZones"]["metazoneInfo"]["timezone"]["America"]["Adak"]
        .as_array()
        .expect("history array");
    assert_eq!(adak.len(), 2);
    assert_eq!(adak[0]["_mzone"], "Hawaii_Aleutian");
    assert_eq!(adak[1], json!({"_to": "1983-10-30 12:00", "_mzone": "Alaska"}));
}

#[test]
fn test_records_file_to_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("en.tsv");
    fs::write(
        &input,
        "//ldml/localeDisplayNames/languages/language[@type=\"fr\"]\t\tFrench\n\
         //ldml/localeDisplayNames/territories/territory[@type=\"FR\"]\t\tFrance\n",
    )
    .expect("write input");

    let records = RecordSet::read_from(&input).expect("read records");
    assert_eq!(records.len(), 2);
    let report = convert(&records.records, "main", Some("en"));
    let out = dir.path().join("main").join("en");
    write_to_dir(&report, &out).expect("write outputs");

    let languages: Value =
        serde_json::from_str(&fs::read_to_string(out.join("languages.json")).expect("languages.json"))
            .expect("valid json");
    assert_eq!(languages["main"]["en"]["localeDisplayNames"]["languages"]["fr"], "French");
    assert!(out.join("territories.json").exists());
    assert!(!out.join("other.json").exists());
}
