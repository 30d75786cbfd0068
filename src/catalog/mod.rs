//! Externally supplied catalogs.
//!
//! The surrounding application owns the catalog data: which servers are
//! connected, which of their tools/prompts/resources the user selected,
//! the custom entries defined in the document itself, the parameter list of
//! the active authoring context, and the document's environment-variable
//! names. The engine only reads these; it never fetches or refreshes them.
//!
//! A server entry is offered for completion only when it is both *selected*
//! and *currently available* (present in the server's detail list); a
//! selected-but-unavailable identifier is silently omitted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use tracing::warn;

use crate::base::LOCAL_NAMESPACE;
use crate::grammar::RefCategory;

/// JSON-schema scalar/container kinds we model for parameter fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// Schema of one call parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub ty: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Item type for array fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<FieldType>,
}

impl FieldSchema {
    pub fn new(ty: FieldType) -> Self {
        Self {
            ty,
            description: None,
            default: None,
            items: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_items(mut self, items: FieldType) -> Self {
        self.items = Some(items);
        self
    }

    /// Pydantic-style display type used in snippets: `str`, `int`, `bool`,
    /// `[str]`, `dict`.
    pub fn display_type(&self) -> String {
        match self.ty {
            FieldType::String => "str".to_owned(),
            FieldType::Number | FieldType::Integer => "int".to_owned(),
            FieldType::Boolean => "bool".to_owned(),
            FieldType::Object => "dict".to_owned(),
            FieldType::Array => {
                let item = match self.items {
                    Some(FieldType::Number) | Some(FieldType::Integer) => "int",
                    Some(FieldType::Boolean) => "bool",
                    Some(FieldType::Object) => "dict",
                    _ => "str",
                };
                format!("[{item}]")
            }
        }
    }
}

/// Ordered call schema: field order is declaration order and is preserved
/// through snippets, rewrites and argument extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallSchema {
    pub properties: IndexMap<SmolStr, FieldSchema>,
    #[serde(default)]
    pub required: Vec<SmolStr>,
}

impl CallSchema {
    pub fn is_required(&self, field: &str) -> bool {
        self.required.iter().any(|r| r == field)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// A tool as described by a server (or a custom tool).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: CallSchema,
}

/// One declared prompt argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArg {
    pub name: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Prompt arguments default to required when unspecified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// A prompt as described by a server (or a custom prompt).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSpec {
    pub name: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: Vec<PromptArg>,
}

impl PromptSpec {
    /// Prompt arguments flattened into the common call-schema shape;
    /// prompt parameters are string-typed.
    pub fn schema(&self) -> CallSchema {
        let mut schema = CallSchema::default();
        for arg in &self.arguments {
            let mut field = FieldSchema::new(FieldType::String);
            field.description = arg.description.clone();
            schema.properties.insert(arg.name.clone(), field);
            if arg.required.unwrap_or(true) {
                schema.required.push(arg.name.clone());
            }
        }
        schema
    }
}

/// A referenceable resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A parameter declared in the active authoring context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// One connected server's contribution: what the user selected, and what
/// the server currently reports as available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCatalog {
    pub server_id: SmolStr,
    /// Display name; used as the namespace in references.
    pub name: SmolStr,
    #[serde(default)]
    pub selected_tools: Vec<SmolStr>,
    #[serde(default)]
    pub tool_details: Vec<ToolSpec>,
    #[serde(default)]
    pub selected_prompts: Vec<SmolStr>,
    #[serde(default)]
    pub prompt_details: Vec<PromptSpec>,
    #[serde(default)]
    pub selected_resources: Vec<SmolStr>,
}

/// Custom tools/prompts/resources defined in the document itself,
/// published under the fixed `vmcp` pseudo-namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalCatalog {
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
    #[serde(default)]
    pub prompts: Vec<PromptSpec>,
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
}

/// Everything the completion engine can offer at a cursor.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub local: LocalCatalog,
    pub servers: Vec<ServerCatalog>,
    /// Parameters of the active authoring context only; swapped together
    /// with the context.
    pub context_params: Vec<ParamDecl>,
    pub env_names: Vec<SmolStr>,
}

/// A resolved invocable entry (tool or prompt) offered for completion and
/// block creation.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub category: RefCategory,
    pub namespace: SmolStr,
    pub name: SmolStr,
    pub server_id: SmolStr,
    pub description: Option<String>,
    pub schema: CallSchema,
}

impl CatalogEntry {
    pub fn label(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// A resolved resource entry.
#[derive(Debug, Clone)]
pub struct ResourceEntry {
    pub namespace: SmolStr,
    pub name: SmolStr,
    pub description: Option<String>,
}

impl ResourceEntry {
    pub fn label(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

impl Catalogs {
    /// All offerable tools: custom entries first, then per-server entries
    /// restricted to selected ∩ available.
    pub fn tools(&self) -> Vec<CatalogEntry> {
        let mut entries: Vec<CatalogEntry> = self
            .local
            .tools
            .iter()
            .map(|t| CatalogEntry {
                category: RefCategory::Tool,
                namespace: LOCAL_NAMESPACE.into(),
                name: t.name.clone(),
                server_id: LOCAL_NAMESPACE.into(),
                description: t.description.clone(),
                schema: t.schema.clone(),
            })
            .collect();

        for server in &self.servers {
            for selected in &server.selected_tools {
                let Some(detail) = server.tool_details.iter().find(|t| &t.name == selected)
                else {
                    warn!(
                        server = %server.server_id,
                        tool = %selected,
                        "selected tool not in available details, omitting"
                    );
                    continue;
                };
                entries.push(CatalogEntry {
                    category: RefCategory::Tool,
                    namespace: server.name.clone(),
                    name: detail.name.clone(),
                    server_id: server.server_id.clone(),
                    description: detail.description.clone(),
                    schema: detail.schema.clone(),
                });
            }
        }
        entries
    }

    /// All offerable prompts, same resolution rules as [`Catalogs::tools`].
    pub fn prompts(&self) -> Vec<CatalogEntry> {
        let mut entries: Vec<CatalogEntry> = self
            .local
            .prompts
            .iter()
            .map(|p| CatalogEntry {
                category: RefCategory::Prompt,
                namespace: LOCAL_NAMESPACE.into(),
                name: p.name.clone(),
                server_id: LOCAL_NAMESPACE.into(),
                description: p.description.clone(),
                schema: p.schema(),
            })
            .collect();

        for server in &self.servers {
            for selected in &server.selected_prompts {
                let Some(detail) = server.prompt_details.iter().find(|p| &p.name == selected)
                else {
                    warn!(
                        server = %server.server_id,
                        prompt = %selected,
                        "selected prompt not in available details, omitting"
                    );
                    continue;
                };
                entries.push(CatalogEntry {
                    category: RefCategory::Prompt,
                    namespace: server.name.clone(),
                    name: detail.name.clone(),
                    server_id: server.server_id.clone(),
                    description: detail.description.clone(),
                    schema: detail.schema(),
                });
            }
        }
        entries
    }

    /// All offerable resources; resources carry no schema.
    pub fn resources(&self) -> Vec<ResourceEntry> {
        let mut entries: Vec<ResourceEntry> = self
            .local
            .resources
            .iter()
            .map(|r| ResourceEntry {
                namespace: LOCAL_NAMESPACE.into(),
                name: r.name.clone(),
                description: r.description.clone(),
            })
            .collect();

        for server in &self.servers {
            for name in &server.selected_resources {
                entries.push(ResourceEntry {
                    namespace: server.name.clone(),
                    name: name.clone(),
                    description: None,
                });
            }
        }
        entries
    }

    /// Look up an invocable entry by namespace and name.
    pub fn entry(&self, category: RefCategory, namespace: &str, name: &str) -> Option<CatalogEntry> {
        let pool = match category {
            RefCategory::Tool => self.tools(),
            RefCategory::Prompt => self.prompts(),
            _ => return None,
        };
        pool.into_iter()
            .find(|e| e.namespace == namespace && e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(name: &str) -> ToolSpec {
        ToolSpec {
            name: name.into(),
            description: None,
            schema: CallSchema::default(),
        }
    }

    fn server_with_tools(selected: &[&str], available: &[&str]) -> ServerCatalog {
        ServerCatalog {
            server_id: "srv-1".into(),
            name: "files".into(),
            selected_tools: selected.iter().map(|s| SmolStr::from(*s)).collect(),
            tool_details: available.iter().map(|s| spec(s)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_selected_unavailable_tool_is_omitted() {
        let catalogs = Catalogs {
            servers: vec![server_with_tools(&["read", "write"], &["read"])],
            ..Default::default()
        };
        let names: Vec<_> = catalogs.tools().iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec![SmolStr::from("read")]);
    }

    #[test]
    fn test_local_tools_come_first() {
        let catalogs = Catalogs {
            local: LocalCatalog {
                tools: vec![spec("mine")],
                ..Default::default()
            },
            servers: vec![server_with_tools(&["read"], &["read"])],
            ..Default::default()
        };
        let entries = catalogs.tools();
        assert_eq!(entries[0].namespace, "vmcp");
        assert_eq!(entries[0].name, "mine");
        assert_eq!(entries[1].namespace, "files");
    }

    #[test]
    fn test_prompt_schema_defaults_to_required_strings() {
        let prompt = PromptSpec {
            name: "greet".into(),
            description: None,
            arguments: vec![
                PromptArg {
                    name: "who".into(),
                    description: Some("target".into()),
                    required: None,
                },
                PromptArg {
                    name: "tone".into(),
                    description: None,
                    required: Some(false),
                },
            ],
        };
        let schema = prompt.schema();
        assert!(schema.is_required("who"));
        assert!(!schema.is_required("tone"));
        assert_eq!(schema.properties["who"].ty, FieldType::String);
    }

    #[test]
    fn test_display_types() {
        assert_eq!(FieldSchema::new(FieldType::String).display_type(), "str");
        assert_eq!(FieldSchema::new(FieldType::Integer).display_type(), "int");
        assert_eq!(FieldSchema::new(FieldType::Boolean).display_type(), "bool");
        assert_eq!(FieldSchema::new(FieldType::Object).display_type(), "dict");
        assert_eq!(
            FieldSchema::new(FieldType::Array)
                .with_items(FieldType::Integer)
                .display_type(),
            "[int]"
        );
        assert_eq!(FieldSchema::new(FieldType::Array).display_type(), "[str]");
    }

    #[test]
    fn test_schema_serde_preserves_field_order() {
        let mut schema = CallSchema::default();
        schema
            .properties
            .insert("zeta".into(), FieldSchema::new(FieldType::String));
        schema.properties.insert(
            "alpha".into(),
            FieldSchema::new(FieldType::Integer).with_default(json!(3)),
        );
        let roundtripped: CallSchema =
            serde_json::from_str(&serde_json::to_string(&schema).unwrap()).unwrap();
        let keys: Vec<_> = roundtripped.properties.keys().cloned().collect();
        assert_eq!(keys, vec![SmolStr::from("zeta"), SmolStr::from("alpha")]);
    }
}
