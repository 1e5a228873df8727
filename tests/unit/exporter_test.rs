//! Unit tests for JSON and HTML export.

#[path = "../common/mod.rs"]
mod common;

use std::fs;

use common::*;
use marksmith::database::Database;
use marksmith::managers::bookmark_tree::BookmarkTree;
use marksmith::services::exporter::{export_html, export_json, export_to_file, ExportFormat};
use rstest::rstest;

fn fixture_tree() -> (Fixture, BookmarkTree) {
    let fx = places_fixture();
    let tree = Database::open_read_only(&fx.path).unwrap().load_tree().unwrap();
    (fx, tree)
}

#[test]
fn test_json_export_is_nested() {
    let (_fx, tree) = fixture_tree();
    let mut out = Vec::new();
    export_json(&tree, &mut out).unwrap();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["type"], "folder");
    let menu = &value["children"][0];
    assert_eq!(menu["title"], "menu");
    let reading = &menu["children"][0];
    assert_eq!(reading["title"], "Reading");
    assert_eq!(reading["children"][1]["url"], "https://doc.rust-lang.org/");
    assert_eq!(reading["children"][1]["type"], "bookmark");
    assert_eq!(reading["children"][1]["dateAdded"], "2020-09-13T12:26:40Z");
    assert!(reading["children"][1].get("children").is_none());
    assert_eq!(value["children"][1]["children"][1]["type"], "separator");
}

#[test]
fn test_html_export_is_netscape_format() {
    let (_fx, tree) = fixture_tree();
    let mut out = Vec::new();
    export_html(&tree, &mut out).unwrap();
    let html = String::from_utf8(out).unwrap();

    assert!(html.starts_with("<!DOCTYPE NETSCAPE-Bookmark-file-1>"));
    assert!(html.contains("<DT><H3 ADD_DATE=\"1600000000\">Reading</H3>"));
    assert!(html.contains("<DT><A HREF=\"https://crates.io/\" ADD_DATE=\"1600000000\">Crates</A>"));
    assert!(html.contains("<HR>"));
    assert!(html.trim_end().ends_with("</DL><p>"));
    // The untitled root does not get its own heading.
    assert!(!html.contains("<H3 ADD_DATE=\"0\"></H3>"));
}

#[test]
fn test_html_escapes_titles() {
    let fx = places_fixture();
    fx.open()
        .execute("UPDATE moz_bookmarks SET title = 'Tom & <Jerry>' WHERE id = ?1", [DOCS])
        .unwrap();
    let tree = Database::open_read_only(&fx.path).unwrap().load_tree().unwrap();

    let mut out = Vec::new();
    export_html(&tree, &mut out).unwrap();
    let html = String::from_utf8(out).unwrap();
    assert!(html.contains(">Tom &amp; &lt;Jerry&gt;</A>"));
}

#[rstest]
#[case::json(ExportFormat::Json, "{")]
#[case::html(ExportFormat::Html, "<!DOCTYPE")]
fn test_export_to_file(#[case] format: ExportFormat, #[case] prefix: &str) {
    let (fx, tree) = fixture_tree();
    let path = fx.dir.path().join(format!("out.{}", format.extension()));

    export_to_file(&tree, format, &path).unwrap();

    assert!(fs::read_to_string(&path).unwrap().starts_with(prefix));
}

#[test]
fn test_export_to_missing_dir_fails() {
    let (fx, tree) = fixture_tree();
    let path = fx.dir.path().join("no").join("such").join("dir.json");
    assert!(export_to_file(&tree, ExportFormat::Json, &path).is_err());
}
