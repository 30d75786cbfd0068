//! Snippet and literal construction for tool/prompt calls.
//!
//! Insertion snippets use Monaco tabstop syntax (`${1:...}`). Saved literals
//! use the exact same field order as the schema, so regenerating a block's
//! text is deterministic.

use indexmap::IndexMap;
use serde_json::Value;
use smol_str::SmolStr;

use crate::catalog::{CallSchema, CatalogEntry, FieldSchema, FieldType};
use crate::grammar::RefCategory;

/// Insert text offered after `@tool.` / `@prompt.`, e.g.
/// `files.read(path: str = "${1:path}")`. The category sigil is already in
/// the buffer and is not repeated.
pub fn snippet_body(entry: &CatalogEntry) -> String {
    if entry.schema.is_empty() {
        return format!("{}()", entry.label());
    }

    let mut parts = Vec::with_capacity(entry.schema.properties.len());
    for (i, (name, field)) in entry.schema.properties.iter().enumerate() {
        let tabstop = i + 1;
        let value = match &field.default {
            Some(default) => format!("${{{tabstop}:{}}}", render_value(default)),
            None => placeholder_value(name, field, tabstop),
        };
        parts.push(format!("{name}: {} = {value}", field.display_type()));
    }
    format!("{}({})", entry.label(), parts.join(", "))
}

/// Placeholder for a field with no schema default. Strings stay editable
/// text (the description, else the name); arrays and the rest fall back to
/// neutral literals.
fn placeholder_value(name: &SmolStr, field: &FieldSchema, tabstop: usize) -> String {
    match field.ty {
        FieldType::String => {
            let hint = field.description.as_deref().unwrap_or(name.as_str());
            format!("\"${{{tabstop}:{hint}}}\"")
        }
        FieldType::Array => format!("${{{tabstop}:[]}}"),
        _ => format!("${{{tabstop}:null}}"),
    }
}

/// Regenerate a full call literal from saved values, e.g.
/// `@tool.files.read(path: str = "/tmp/x")`. Fields keep schema order;
/// absent values render as `""` / `[]` / `null` by type.
pub fn render_literal(
    category: RefCategory,
    namespace: &str,
    name: &str,
    schema: &CallSchema,
    values: &IndexMap<SmolStr, Value>,
) -> String {
    let mut parts = Vec::with_capacity(schema.properties.len());
    for (field_name, field) in &schema.properties {
        let rendered = match values.get(field_name) {
            Some(v) => render_value(v),
            None => absent_value(field),
        };
        parts.push(format!(
            "{field_name}: {} = {rendered}",
            field.display_type()
        ));
    }
    format!("@{category}.{namespace}.{name}({})", parts.join(", "))
}

fn absent_value(field: &FieldSchema) -> String {
    match field.ty {
        FieldType::String => "\"\"".to_owned(),
        FieldType::Array => "[]".to_owned(),
        _ => "null".to_owned(),
    }
}

/// JSON-escaped literal text for one value.
fn render_value(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(schema: CallSchema) -> CatalogEntry {
        CatalogEntry {
            category: RefCategory::Tool,
            namespace: "files".into(),
            name: "read".into(),
            server_id: "srv-1".into(),
            description: None,
            schema,
        }
    }

    #[test]
    fn test_snippet_without_params() {
        assert_eq!(snippet_body(&entry(CallSchema::default())), "files.read()");
    }

    #[test]
    fn test_snippet_with_params() {
        let mut schema = CallSchema::default();
        schema.properties.insert(
            "path".into(),
            FieldSchema::new(FieldType::String).with_description("file path"),
        );
        schema.properties.insert(
            "lines".into(),
            FieldSchema::new(FieldType::Integer).with_default(json!(10)),
        );
        schema
            .properties
            .insert("tags".into(), FieldSchema::new(FieldType::Array));
        assert_eq!(
            snippet_body(&entry(schema)),
            r#"files.read(path: str = "${1:file path}", lines: int = ${2:10}, tags: [str] = ${3:[]})"#
        );
    }

    #[test]
    fn test_render_literal_is_deterministic() {
        let mut schema = CallSchema::default();
        schema
            .properties
            .insert("path".into(), FieldSchema::new(FieldType::String));
        schema
            .properties
            .insert("lines".into(), FieldSchema::new(FieldType::Integer));
        let mut values = IndexMap::new();
        values.insert(SmolStr::from("path"), json!("/tmp/x"));
        values.insert(SmolStr::from("lines"), json!(10));
        assert_eq!(
            render_literal(RefCategory::Tool, "files", "read", &schema, &values),
            r#"@tool.files.read(path: str = "/tmp/x", lines: int = 10)"#
        );
    }

    #[test]
    fn test_render_literal_escapes_strings() {
        let mut schema = CallSchema::default();
        schema
            .properties
            .insert("note".into(), FieldSchema::new(FieldType::String));
        let mut values = IndexMap::new();
        values.insert(SmolStr::from("note"), json!("say \"hi\"\n"));
        assert_eq!(
            render_literal(RefCategory::Prompt, "vmcp", "greet", &schema, &values),
            r#"@prompt.vmcp.greet(note: str = "say \"hi\"\n")"#
        );
    }

    #[test]
    fn test_render_literal_fills_absent_values() {
        let mut schema = CallSchema::default();
        schema
            .properties
            .insert("who".into(), FieldSchema::new(FieldType::String));
        schema
            .properties
            .insert("tags".into(), FieldSchema::new(FieldType::Array));
        let values = IndexMap::new();
        assert_eq!(
            render_literal(RefCategory::Tool, "a", "b", &schema, &values),
            r#"@tool.a.b(who: str = "", tags: [str] = [])"#
        );
    }
}
