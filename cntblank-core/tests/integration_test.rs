use cntblank_common::CollectConfig;
use cntblank_core::{
    collect_files, profile_files, profile_path, renderer_for, CntblankError, Dialect, OutputFormat,
    RecordSource, SourceFile,
};
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

const PREFECTURES: &str = "都道府県コード\t都道府県\t県庁所在地\n\
01\t北海道\t札幌市\n\
02\t青森県\t青森市\n\
03\t岩手県\t\n\
# comment line\n\
04\t宮城県\t仙台市\n";

fn write_fixture(suffix: &str, bytes: &[u8]) -> NamedTempFile {
    let tmp = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    fs::write(tmp.path(), bytes).unwrap();
    tmp
}

#[test]
fn profiles_tsv_file() {
    let tmp = write_fixture(".tsv", PREFECTURES.as_bytes());
    let report = profile_path(tmp.path(), &Dialect::default()).unwrap();
    assert_eq!(report.records, 4);
    assert!(report.has_header);
    let names: Vec<&str> = report.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["都道府県コード", "都道府県", "県庁所在地"]);

    let code = &report.fields[0];
    assert_eq!(code.int_type, 4);
    assert_eq!(code.int_range.map(|e| (e.min, e.max)), Some((1, 4)));

    let pref = &report.fields[1];
    assert_eq!(pref.full_width, 4);
    assert_eq!(pref.length.map(|e| (e.min, e.max)), Some((3, 3)));

    let capital = report.fields[2].format(report.records);
    assert_eq!(capital[2], "1");
    assert_eq!(capital[3], "0.2500");

    assert_eq!(
        report.source.filename.as_deref(),
        tmp.path().file_name().and_then(|n| n.to_str())
    );
}

#[test]
fn profiles_shift_jis_file() {
    let bytes = encoding_rs::SHIFT_JIS.encode(PREFECTURES).0.into_owned();
    let tmp = write_fixture(".tsv", &bytes);
    let dialect = Dialect::new("\t", "sjis", true).unwrap();
    let report = profile_path(tmp.path(), &dialect).unwrap();
    assert_eq!(report.records, 4);
    assert_eq!(report.fields[1].name, "都道府県");
}

#[test]
fn empty_file_with_header_fails() {
    let tmp = write_fixture(".csv", b"");
    let err = profile_path(tmp.path(), &Dialect::default()).err();
    assert!(matches!(err, Some(CntblankError::EmptySource)));
}

#[test]
fn record_source_reports_width_histogram() {
    let tmp = write_fixture(".csv", b"a,b\nc,d,e\nf,g\n");
    let dialect = Dialect::new(",", "utf8", true).unwrap();
    let mut src = RecordSource::open(tmp.path(), &dialect).unwrap();
    while src.next_row().unwrap().is_some() {}
    assert_eq!(src.row_widths().get(&2), Some(&2));
    assert_eq!(src.row_widths().get(&3), Some(&1));
    src.close();
    src.close();
}

#[test]
fn directory_run_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.tsv"), "k\tv\n1\t2\n").unwrap();
    fs::write(dir.path().join("b.tsv"), "").unwrap();
    fs::write(dir.path().join("c.tsv"), "x\n\n y \n").unwrap();
    fs::write(dir.path().join("ignored.md"), "# notes\n").unwrap();

    let files = collect_files(&[dir.path().display().to_string()], &CollectConfig::default());
    assert_eq!(files.len(), 3);

    let reports = profile_files(&files, &Dialect::default());
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].source.filename.as_deref(), Some("a.tsv"));
    assert_eq!(reports[0].records, 1);
    assert_eq!(reports[1].source.filename.as_deref(), Some("c.tsv"));
    assert_eq!(reports[1].records, 1);
    assert_eq!(reports[1].fields[0].length.map(|e| e.max), Some(1));
}

#[test]
fn checksum_is_attached_to_reports() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.csv");
    fs::write(&path, "k\tv\n1\t2\n").unwrap();
    let file = SourceFile::from_path(&path).unwrap();
    let expected = file.checksum().unwrap();
    let reports = profile_files(&[file], &Dialect::default());
    assert_eq!(reports[0].source.checksum.as_deref(), Some(expected.as_str()));
    assert_eq!(expected.len(), 16);
}

#[test]
fn renders_csv_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kv.csv");
    fs::write(&path, "key,value\nA,B\nC,D\n").unwrap();
    let input = Dialect::new(",", "utf8", true).unwrap();
    let files = vec![SourceFile::from_path(&path).unwrap()];
    let reports = profile_files(&files, &input);

    let output = Dialect::new(",", "utf8", true).unwrap().with_metadata(true);
    let mut buf = Vec::new();
    renderer_for(OutputFormat::Csv, &output)
        .render(&reports, &mut buf)
        .unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("# File,"));
    assert!(lines[0].contains(",kv.csv,"));
    assert_eq!(lines[1], "# Field,2,(has header),");
    assert_eq!(lines[2], "# Record,2,,");
    assert!(lines[3].starts_with("seq,Name,#Blank"));
    assert_eq!(lines[4], "1,key,0,0.0000,1,1,,,,,,,,");
    assert_eq!(lines[5], "2,value,0,0.0000,1,1,,,,,,,,");
}

#[test]
fn renders_json_end_to_end() {
    let tmp = write_fixture(".tsv", PREFECTURES.as_bytes());
    let report = profile_path(tmp.path(), &Dialect::default()).unwrap();
    let mut buf = Vec::new();
    renderer_for(OutputFormat::Json, &Dialect::default())
        .render(&[report], &mut buf)
        .unwrap();
    let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(v[0]["records"], 4);
    assert_eq!(v[0]["fields"][0]["name"], "都道府県コード");
    assert_eq!(v[0]["fields"][2]["blank"], 1);
}

#[test]
fn missing_input_yields_no_reports() {
    let files = collect_files(&["/nonexistent/dir/x.csv".to_string()], &CollectConfig::default());
    assert!(files.is_empty());
    assert!(profile_files(&files, &Dialect::default()).is_empty());
    assert!(!Path::new("/nonexistent/dir/x.csv").exists());
}

const FOUNDED_FIRST: &str = "2015-01-23 00:00:00";
const FOUNDED_LAST: &str = "2015-01-24 00:00:00";

/// two sheets; the first has blanks, dates and a formatted empty row below the data
fn write_workbook() -> NamedTempFile {
    let tmp = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
    let date = Format::new().set_num_format_index(22);
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("prefectures").unwrap();
    for (col, name) in ["code", "name", "founded", "note"].into_iter().enumerate() {
        sheet.write_string(0, col as u16, name).unwrap();
    }
    sheet.write_number(1, 0, 1).unwrap();
    sheet.write_string(1, 1, "北海道").unwrap();
    sheet.write_number_with_format(1, 2, 42027, &date).unwrap(); // 2015-01-23
    sheet.write_string(1, 3, "x").unwrap();
    sheet.write_number(2, 0, 2).unwrap();
    sheet.write_number_with_format(2, 2, 42028, &date).unwrap();
    sheet.write_number(3, 0, 3).unwrap();
    sheet.write_string(3, 1, "岩手県").unwrap();
    sheet.write_blank(4, 3, &date).unwrap();

    let sheet = workbook.add_worksheet();
    sheet.set_name("second").unwrap();
    sheet.write_string(0, 0, "k").unwrap();
    sheet.write_string(0, 1, "v").unwrap();
    sheet.write_string(1, 0, "a").unwrap();
    sheet.write_number(1, 1, 1.5).unwrap();

    workbook.save(tmp.path()).unwrap();
    tmp
}

fn field_names(report: &cntblank_core::Report) -> Vec<&str> {
    report.fields.iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn workbook_rows_are_strings_with_blanks() {
    let book = write_workbook();
    let mut src = RecordSource::open(book.path(), &Dialect::default()).unwrap();
    let mut rows = Vec::new();
    while let Some(row) = src.next_row().unwrap() {
        rows.push(row);
    }
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], vec!["code", "name", "founded", "note"]);
    assert_eq!(rows[1], vec!["1", "北海道", FOUNDED_FIRST, "x"]);
    assert_eq!(rows[2], vec!["2", "", FOUNDED_LAST, ""]);
    assert_eq!(rows[3], vec!["3", "岩手県", "", ""]);
    assert_eq!(src.row_widths().get(&4), Some(&4));
}

#[test]
fn workbook_default_sheet_profiles_first() {
    let book = write_workbook();
    let report = profile_path(book.path(), &Dialect::default()).unwrap();
    assert_eq!(report.records, 3);
    assert_eq!(field_names(&report), vec!["code", "name", "founded", "note"]);

    let code = &report.fields[0];
    assert_eq!(code.int_type, 3);
    assert_eq!(code.int_range.map(|e| (e.min, e.max)), Some((1, 3)));

    let name = &report.fields[1];
    assert_eq!(name.blank, 1);
    assert_eq!(name.full_width, 2);

    let founded = report.fields[2].format(report.records);
    assert_eq!(founded[2], "1");
    assert_eq!(founded[9], "2");
    assert_eq!(founded[10], FOUNDED_FIRST);
    assert_eq!(founded[11], FOUNDED_LAST);

    assert_eq!(report.fields[3].blank, 2);
}

#[test]
fn workbook_sheet_numbers_are_one_based() {
    let book = write_workbook();
    let first = profile_path(book.path(), &Dialect::default().with_sheet(1)).unwrap();
    assert_eq!(field_names(&first), vec!["code", "name", "founded", "note"]);

    let second = profile_path(book.path(), &Dialect::default().with_sheet(2)).unwrap();
    assert_eq!(field_names(&second), vec!["k", "v"]);
    assert_eq!(second.records, 1);
    let v = &second.fields[1];
    assert_eq!(v.int_type, 0);
    assert_eq!(v.float_range.map(|e| (e.min, e.max)), Some((1.5, 1.5)));
}

#[test]
fn workbook_sheet_out_of_range_fails_at_open() {
    let book = write_workbook();
    let dialect = Dialect::default().with_sheet(3);
    assert!(matches!(
        RecordSource::open(book.path(), &dialect).err(),
        Some(CntblankError::Open { .. })
    ));
    assert!(matches!(
        profile_path(book.path(), &dialect),
        Err(CntblankError::Open { .. })
    ));
}

#[test]
fn directory_path_fails_at_open() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        profile_path(dir.path(), &Dialect::default()),
        Err(CntblankError::Open { .. })
    ));
}
