// Copyright (c) 2025 - Cowboy AI, Inc.
//! HCL value rendering
//!
//! Inputs are written in the JSON-compatible object syntax HCL accepts,
//! two-space indented, with object keys in lexicographic order at every
//! nesting level. Template interpolation sequences inside strings are
//! escaped so values pass through literally.

use serde_json::Value;

use crate::domain::Inputs;

const INDENT: &str = "  ";

/// Quote a value as an HCL string literal
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    push_escaped(value, &mut out);
    out.push('"');
    out
}

/// Render an inputs map as an HCL object expression
pub fn render_inputs(inputs: &Inputs) -> String {
    let mut out = String::new();
    let entries: Vec<(&String, &Value)> = inputs.iter().collect();
    render_object(&entries, 0, &mut out);
    out
}

fn render_value(value: &Value, depth: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&quote(s)),
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                push_indent(depth + 1, out);
                render_value(item, depth + 1, out);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(depth, out);
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            render_object(&entries, depth, out);
        }
    }
}

/// `entries` must already be sorted by key
fn render_object(entries: &[(&String, &Value)], depth: usize, out: &mut String) {
    if entries.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for (i, (key, value)) in entries.iter().enumerate() {
        push_indent(depth + 1, out);
        out.push_str(&quote(key));
        out.push_str(": ");
        render_value(value, depth + 1, out);
        if i + 1 < entries.len() {
            out.push(',');
        }
        out.push('\n');
    }
    push_indent(depth, out);
    out.push('}');
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn push_escaped(value: &str, out: &mut String) {
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
}
