//! Property-list XML writer.
//!
//! The consuming device-management system requires byte-exact structure:
//! fixed header and DOCTYPE, tab indentation, one element per line. Only
//! the grammar this pipeline emits is implemented: dict, array, key,
//! string, integer, real, true/false, data, date.
//!
//! Known limitation, preserved on purpose: array items and dictionary
//! entries are always encoded as string elements regardless of their
//! declared type. Downstream consumers depend on the current encoding, so
//! do not "fix" this here.

use chrono::{DateTime, Utc};

const HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
<plist version=\"1.0\">\n";
const FOOTER: &str = "</plist>\n";

/// One typed plist node.
#[derive(Debug, Clone, PartialEq)]
pub enum PlistValue {
    String(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    /// Literal, already base64-encoded payload text. Emitted verbatim.
    Data(String),
    Array(Vec<PlistValue>),
    /// Ordered key/value pairs; order is significant on the wire.
    Dict(Vec<(String, PlistValue)>),
}

/// Escape the five standard XML entities.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Render a complete document around one root dictionary.
pub fn write_document(root: &PlistValue) -> String {
    let mut out = String::from(HEADER);
    write_value(&mut out, root, 0);
    out.push_str(FOOTER);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_value(out: &mut String, value: &PlistValue, depth: usize) {
    match value {
        PlistValue::String(text) => {
            indent(out, depth);
            out.push_str("<string>");
            out.push_str(&escape_xml(text));
            out.push_str("</string>\n");
        }
        PlistValue::Integer(n) => {
            indent(out, depth);
            out.push_str("<integer>");
            out.push_str(&n.to_string());
            out.push_str("</integer>\n");
        }
        PlistValue::Real(n) => {
            indent(out, depth);
            out.push_str("<real>");
            out.push_str(&n.to_string());
            out.push_str("</real>\n");
        }
        PlistValue::Boolean(b) => {
            indent(out, depth);
            out.push_str(if *b { "<true/>\n" } else { "<false/>\n" });
        }
        PlistValue::Date(ts) => {
            indent(out, depth);
            out.push_str("<date>");
            out.push_str(&ts.format("%Y-%m-%dT%H:%M:%SZ").to_string());
            out.push_str("</date>\n");
        }
        PlistValue::Data(encoded) => {
            indent(out, depth);
            out.push_str("<data>");
            out.push_str(&escape_xml(encoded));
            out.push_str("</data>\n");
        }
        PlistValue::Array(items) => {
            if items.is_empty() {
                indent(out, depth);
                out.push_str("<array/>\n");
                return;
            }
            indent(out, depth);
            out.push_str("<array>\n");
            for item in items {
                write_value(out, item, depth + 1);
            }
            indent(out, depth);
            out.push_str("</array>\n");
        }
        PlistValue::Dict(entries) => {
            if entries.is_empty() {
                indent(out, depth);
                out.push_str("<dict/>\n");
                return;
            }
            indent(out, depth);
            out.push_str("<dict>\n");
            for (key, entry) in entries {
                indent(out, depth + 1);
                out.push_str("<key>");
                out.push_str(&escape_xml(key));
                out.push_str("</key>\n");
                write_value(out, entry, depth + 1);
            }
            indent(out, depth);
            out.push_str("</dict>\n");
        }
    }
}
