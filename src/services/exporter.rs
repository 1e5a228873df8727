//! Exports a bookmark tree as nested JSON or as a Netscape bookmark file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

use crate::managers::bookmark_tree::BookmarkTree;
use crate::types::bookmark::{BookmarkKind, BookmarkNode};
use crate::types::errors::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "html" | "htm" => Ok(ExportFormat::Html),
            other => Err(format!("unknown export format '{}' (use json or html)", other)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedNode {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<ExportedNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_added: Option<String>,
}

/// RFC 3339 rendering of a places timestamp (microseconds since the epoch).
/// `None` for zero or out-of-range values.
pub fn format_timestamp(micros: i64) -> Option<String> {
    if micros <= 0 {
        return None;
    }
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
}

fn convert(tree: &BookmarkTree, node: &BookmarkNode) -> ExportedNode {
    let (kind, url, children) = match &node.kind {
        BookmarkKind::Folder => (
            "folder",
            None,
            Some(
                tree.children(node.id)
                    .into_iter()
                    .map(|c| convert(tree, c))
                    .collect(),
            ),
        ),
        BookmarkKind::Bookmark(place) => ("bookmark", Some(place.url.clone()), None),
        BookmarkKind::Separator => ("separator", None, None),
    };
    ExportedNode {
        title: node.title.clone(),
        url,
        kind,
        children,
        date_added: format_timestamp(node.date_added),
    }
}

/// Writes the whole tree as pretty-printed JSON, rooted at the tree root.
pub fn export_json<W: Write>(tree: &BookmarkTree, writer: W) -> Result<(), ExportError> {
    let root = tree
        .get(tree.root())
        .ok_or_else(|| ExportError::Serialization("tree has no root".to_string()))?;
    let exported = convert(tree, root);
    serde_json::to_writer_pretty(writer, &exported)
        .map_err(|e| ExportError::Serialization(e.to_string()))
}

/// Writes the tree as a Netscape bookmark file, the format browsers import.
pub fn export_html<W: Write>(tree: &BookmarkTree, mut writer: W) -> Result<(), ExportError> {
    let io = |e: std::io::Error| ExportError::Io(e.to_string());
    writer
        .write_all(
            b"<!DOCTYPE NETSCAPE-Bookmark-file-1>\n\
<!-- This is an automatically generated file.\n     It will be read and overwritten.\n     DO NOT EDIT! -->\n\
<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">\n\
<TITLE>Bookmarks</TITLE>\n<H1>Bookmarks</H1>\n<DL><p>\n",
        )
        .map_err(io)?;
    if let Some(root) = tree.get(tree.root()) {
        write_html_node(tree, root, 1, &mut writer).map_err(io)?;
    }
    writer.write_all(b"</DL><p>\n").map_err(io)?;
    writer.flush().map_err(io)
}

fn write_html_node<W: Write>(
    tree: &BookmarkTree,
    node: &BookmarkNode,
    depth: usize,
    out: &mut W,
) -> std::io::Result<()> {
    let indent = "    ".repeat(depth);
    let add_date = node.date_added / 1_000_000;
    match &node.kind {
        BookmarkKind::Folder => {
            // Untitled folders (the root) are flattened into their parent list.
            let titled = !node.title.is_empty();
            if titled {
                writeln!(
                    out,
                    "{}<DT><H3 ADD_DATE=\"{}\">{}</H3>",
                    indent,
                    add_date,
                    escape_html(&node.title)
                )?;
                writeln!(out, "{}<DL><p>", indent)?;
            }
            for child in tree.children(node.id) {
                write_html_node(tree, child, depth + 1, out)?;
            }
            if titled {
                writeln!(out, "{}</DL><p>", indent)?;
            }
        }
        BookmarkKind::Bookmark(place) => {
            writeln!(
                out,
                "{}<DT><A HREF=\"{}\" ADD_DATE=\"{}\">{}</A>",
                indent,
                escape_html(&place.url),
                add_date,
                escape_html(&node.title)
            )?;
        }
        BookmarkKind::Separator => writeln!(out, "{}<HR>", indent)?,
    }
    Ok(())
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Creates `path` and writes the tree to it in `format`.
pub fn export_to_file(
    tree: &BookmarkTree,
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let file = File::create(path)
        .map_err(|e| ExportError::Io(format!("failed to create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    match format {
        ExportFormat::Json => {
            export_json(tree, &mut writer)?;
            writer.write_all(b"\n").map_err(|e| ExportError::Io(e.to_string()))?;
        }
        ExportFormat::Html => export_html(tree, &mut writer)?,
    }
    writer.flush().map_err(|e| ExportError::Io(e.to_string()))?;
    info!(path = %path.display(), ?format, nodes = tree.len(), "bookmarks exported");
    Ok(())
}
