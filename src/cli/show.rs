//! `show`: list fields.

use anyhow::Result;
use serde::Serialize;

use dynset::settings::{Field, FieldKind, FieldValue, ParsedDocument};
use dynset::session::{EditSession, Origin};
use dynset::logger::status_warning;

use super::common::{Context, Device, plural};

/// One row of `show` output.
#[derive(Debug, Serialize)]
struct FieldRow<'a> {
    name: &'a str,
    kind: FieldKind,
    value: &'a FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<String>,
    line: usize,
}

impl<'a> FieldRow<'a> {
    fn new(field: &'a Field) -> Self {
        let (min, max) = field
            .range
            .map(|r| r.encoded())
            .map_or((None, None), |(lo, hi)| (Some(lo), Some(hi)));
        Self {
            name: &field.name,
            kind: field.kind(),
            value: field.value(),
            min,
            max,
            line: field.source_line,
        }
    }

    fn range(&self) -> String {
        match (&self.min, &self.max) {
            (Some(lo), Some(hi)) => format!("{lo}..{hi}"),
            _ => "-".to_owned(),
        }
    }
}

pub fn run_show(
    device: &Device,
    ctx: &Context,
    json: bool,
    filter: Option<&str>,
    fallback_default: bool,
) -> Result<()> {
    let path = ctx.path.clone();
    let fallback = ctx.fallback(fallback_default);
    let (document, origin) = device.run("read", ctx.path.display(), move |channel| {
        EditSession::load(channel, &path, fallback).map(|s| (s.document().clone(), s.origin()))
    })??;

    if origin == Origin::BuiltinDefault {
        status_warning("file unreadable, showing built-in defaults");
    }

    let needle = filter.map(str::to_ascii_lowercase);
    let rows: Vec<FieldRow> = document
        .fields()
        .iter()
        .filter(|f| {
            needle
                .as_deref()
                .is_none_or(|n| f.name.to_ascii_lowercase().contains(n))
        })
        .map(FieldRow::new)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", render_table(&rows));
        print_summary(&document, rows.len());
    }
    Ok(())
}

fn render_table(rows: &[FieldRow]) -> String {
    let values: Vec<String> = rows.iter().map(|r| r.value.to_string()).collect();
    let ranges: Vec<String> = rows.iter().map(FieldRow::range).collect();

    let name_w = rows.iter().map(|r| r.name.len()).max().unwrap_or(0).max(4);
    let value_w = values.iter().map(String::len).max().unwrap_or(0).max(5);

    let mut out = format!("{:>4}  {:name_w$}  {:7}  {:value_w$}  RANGE\n", "LINE", "NAME", "KIND", "VALUE");
    for ((row, value), range) in rows.iter().zip(&values).zip(&ranges) {
        out.push_str(&format!(
            "{:>4}  {:name_w$}  {:7}  {:value_w$}  {range}\n",
            row.line,
            row.name,
            row.kind.as_str(),
            value
        ));
    }
    out
}

fn print_summary(document: &ParsedDocument, shown: usize) {
    let total = document.fields().len();
    let mut summary = if shown == total {
        plural(total, "field")
    } else {
        format!("{shown} of {}", plural(total, "field"))
    };
    if let Some(root) = document.root() {
        summary.push_str(&format!(" in <{}>", root.name));
        if let Some(version) = &root.version {
            summary.push_str(&format!(" v{version}"));
        }
    }
    if !document.unparsed_lines().is_empty() {
        summary.push_str(&format!(
            ", {} not recognized",
            plural(document.unparsed_lines().len(), "line")
        ));
    }
    eprintln!("{summary}");
}
