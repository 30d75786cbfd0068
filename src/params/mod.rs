//! The parameter editor model.
//!
//! A [`ParamSession`] is the state behind the modal the host shows when a
//! block is clicked or guarded: one typed field per schema entry, explicit
//! validation, and a save path that rewrites the block through the engine.
//! Test calls go through the host-supplied [`TestRunner`] and never touch
//! the document.

pub mod json;

pub use json::{format_json, validate_json};

use indexmap::IndexMap;
use serde_json::Value;
use smol_str::SmolStr;
use thiserror::Error;
use tracing::debug;

use crate::base::BlockId;
use crate::catalog::{CallSchema, FieldSchema, FieldType};
use crate::engine::{AtomicBlock, BlockCategory, Engine, EngineAction};
use crate::error::EngineError;

/// One failed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: SmolStr,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    /// One or more fields failed validation; save is blocked and the
    /// document untouched.
    #[error("{} field(s) failed validation", fields.len())]
    Validation { fields: Vec<FieldError> },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Which control the host should render for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldControl {
    Text,
    Number,
    Checkbox,
    /// Array of primitives with add/edit/remove.
    StringList,
    /// Raw JSON with validate/format helpers.
    JsonEditor,
}

impl FieldControl {
    fn for_type(ty: FieldType) -> Self {
        match ty {
            FieldType::String => FieldControl::Text,
            FieldType::Number | FieldType::Integer => FieldControl::Number,
            FieldType::Boolean => FieldControl::Checkbox,
            FieldType::Array => FieldControl::StringList,
            FieldType::Object => FieldControl::JsonEditor,
        }
    }
}

/// One editable field of the session.
#[derive(Debug, Clone)]
pub struct ParamField {
    pub name: SmolStr,
    pub schema: FieldSchema,
    pub required: bool,
    pub control: FieldControl,
    pub value: Value,
    /// Raw text for [`FieldControl::JsonEditor`] fields; the working value
    /// is only updated when the text parses.
    pub json_text: Option<String>,
    pub error: Option<String>,
}

impl ParamField {
    fn new(name: SmolStr, schema: FieldSchema, required: bool, value: Value) -> Self {
        let control = FieldControl::for_type(schema.ty);
        let json_text = (control == FieldControl::JsonEditor)
            .then(|| serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        Self {
            name,
            schema,
            required,
            control,
            value,
            json_text,
            error: None,
        }
    }

    fn is_blank(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

/// The request handed to the host's [`TestRunner`]. Arguments are plain
/// JSON values, type annotations already stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRequest {
    pub category: BlockCategory,
    pub namespace: SmolStr,
    pub name: SmolStr,
    pub arguments: IndexMap<SmolStr, Value>,
}

/// Result of a test call.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub success: bool,
    pub payload: Option<Value>,
    pub error_message: Option<String>,
}

impl TestOutcome {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error_message: Some(message.into()),
        }
    }
}

/// Executes test calls against the backend. Supplied by the host; the
/// library never performs I/O itself.
pub trait TestRunner {
    fn run(&self, request: TestRequest) -> TestOutcome;
}

/// A token tying a test call to the session generation that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestToken(u64);

/// One open parameter editor.
#[derive(Debug)]
pub struct ParamSession {
    block_id: BlockId,
    category: BlockCategory,
    namespace: SmolStr,
    name: SmolStr,
    schema: CallSchema,
    fields: Vec<ParamField>,
    /// Bumped on close; an outcome stamped with an older generation is
    /// discarded.
    generation: u64,
    closed: bool,
    last_outcome: Option<TestOutcome>,
}

impl ParamSession {
    /// Open a session over a block's current values. Fields with no value
    /// fall back to the schema default, else stay empty.
    pub fn open(block: &AtomicBlock) -> Self {
        let fields = block
            .schema
            .properties
            .iter()
            .map(|(name, schema)| {
                let value = block
                    .values
                    .get(name)
                    .cloned()
                    .or_else(|| schema.default.clone())
                    .unwrap_or(Value::Null);
                ParamField::new(
                    name.clone(),
                    schema.clone(),
                    block.schema.is_required(name),
                    value,
                )
            })
            .collect();
        Self {
            block_id: block.id,
            category: block.category,
            namespace: block.namespace.clone(),
            name: block.name.clone(),
            schema: block.schema.clone(),
            fields,
            generation: 0,
            closed: false,
            last_outcome: None,
        }
    }

    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    pub fn fields(&self) -> &[ParamField] {
        &self.fields
    }

    pub fn last_outcome(&self) -> Option<&TestOutcome> {
        self.last_outcome.as_ref()
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut ParamField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Set a field's working value directly (text, number, checkbox).
    pub fn set_value(&mut self, name: &str, value: Value) {
        if let Some(field) = self.field_mut(name) {
            field.value = value;
            field.error = None;
        }
    }

    /// Append an item to an array field.
    pub fn push_item(&mut self, name: &str, item: Value) {
        if let Some(field) = self.field_mut(name) {
            match &mut field.value {
                Value::Array(items) => items.push(item),
                _ => field.value = Value::Array(vec![item]),
            }
            field.error = None;
        }
    }

    /// Remove an item from an array field by index.
    pub fn remove_item(&mut self, name: &str, index: usize) {
        if let Some(field) = self.field_mut(name) {
            if let Value::Array(items) = &mut field.value {
                if index < items.len() {
                    items.remove(index);
                }
            }
        }
    }

    /// Update the raw text of an object field. The working value follows
    /// only when the text parses; the error slot reports otherwise.
    pub fn set_json_text(&mut self, name: &str, text: impl Into<String>) {
        if let Some(field) = self.field_mut(name) {
            let text = text.into();
            match json::validate_json(&text) {
                Ok(value) => {
                    field.value = value;
                    field.error = None;
                }
                Err(message) => field.error = Some(message),
            }
            field.json_text = Some(text);
        }
    }

    /// Pretty-print an object field's raw text in place.
    pub fn format_field(&mut self, name: &str) {
        if let Some(field) = self.field_mut(name) {
            if let Some(text) = &field.json_text {
                match json::format_json(text) {
                    Ok(formatted) => {
                        field.json_text = Some(formatted);
                        field.error = None;
                    }
                    Err(message) => field.error = Some(message),
                }
            }
        }
    }

    /// Check every required field. Failures land in each field's error
    /// slot and in the returned error.
    pub fn validate(&mut self) -> Result<(), ParamError> {
        let mut failed = Vec::new();
        for field in &mut self.fields {
            field.error = None;
            if field.control == FieldControl::JsonEditor {
                if let Some(text) = &field.json_text {
                    if let Err(message) = json::validate_json(text) {
                        field.error = Some(message);
                    }
                }
            }
            if field.error.is_none() && field.required && field.is_blank() {
                field.error = Some(format!("{} is required", field.name));
            }
            if let Some(message) = &field.error {
                failed.push(FieldError {
                    field: field.name.clone(),
                    message: message.clone(),
                });
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(ParamError::Validation { fields: failed })
        }
    }

    /// Current values in schema order, blanks omitted.
    pub fn values(&self) -> IndexMap<SmolStr, Value> {
        self.fields
            .iter()
            .filter(|f| !f.is_blank())
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }

    /// Validate and commit through the engine. On validation failure the
    /// document is untouched.
    pub fn save(&mut self, engine: &mut Engine) -> Result<Vec<EngineAction>, ParamError> {
        self.validate()?;
        Ok(engine.commit_parameters(self.block_id, self.values())?)
    }

    /// Issue a test call. The returned token stamps the session's current
    /// generation; results for a stale token are discarded.
    pub fn begin_test(&self) -> (TestRequest, TestToken) {
        (
            TestRequest {
                category: self.category,
                namespace: self.namespace.clone(),
                name: self.name.clone(),
                arguments: self.values(),
            },
            TestToken(self.generation),
        )
    }

    /// Deliver a test outcome. Outcomes for a closed or superseded session
    /// are dropped; test calls never change block state.
    pub fn accept_result(&mut self, token: TestToken, outcome: TestOutcome) {
        if self.closed || token.0 != self.generation {
            debug!("discarding test outcome for a closed session");
            return;
        }
        self.last_outcome = Some(outcome);
    }

    /// Close the session, invalidating in-flight test calls.
    pub fn close(&mut self) {
        self.closed = true;
        self.generation += 1;
        self.last_outcome = None;
    }

    /// The schema the fields were built from.
    pub fn schema(&self) -> &CallSchema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{BlockId, Span};
    use serde_json::json;

    fn block() -> AtomicBlock {
        let mut schema = CallSchema::default();
        schema
            .properties
            .insert("path".into(), FieldSchema::new(FieldType::String));
        schema
            .properties
            .insert("tags".into(), FieldSchema::new(FieldType::Array));
        schema.properties.insert(
            "options".into(),
            FieldSchema::new(FieldType::Object),
        );
        schema.required.push("path".into());
        schema.required.push("tags".into());

        let mut values = IndexMap::new();
        values.insert(SmolStr::from("path"), json!("/x"));
        AtomicBlock {
            id: BlockId::new(),
            span: Span::from_coords(1, 1, 1, 10),
            category: BlockCategory::Tool,
            namespace: "files".into(),
            name: "read".into(),
            literal_text: String::new(),
            schema,
            values,
        }
    }

    #[test]
    fn test_open_builds_typed_fields() {
        let session = ParamSession::open(&block());
        let fields = session.fields();
        assert_eq!(fields[0].control, FieldControl::Text);
        assert_eq!(fields[0].value, json!("/x"));
        assert_eq!(fields[1].control, FieldControl::StringList);
        assert_eq!(fields[2].control, FieldControl::JsonEditor);
    }

    #[test]
    fn test_validate_requires_non_empty_arrays() {
        let mut session = ParamSession::open(&block());
        let err = session.validate().unwrap_err();
        let ParamError::Validation { fields } = err else {
            panic!("expected validation error");
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "tags");

        session.push_item("tags", json!("a"));
        assert!(session.validate().is_ok());
    }

    #[test]
    fn test_bad_json_text_blocks_save() {
        let mut session = ParamSession::open(&block());
        session.push_item("tags", json!("a"));
        session.set_json_text("options", "{not json");
        let ParamError::Validation { fields } = session.validate().unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(fields[0].field, "options");

        session.set_json_text("options", r#"{"deep": true}"#);
        assert!(session.validate().is_ok());
        assert_eq!(session.values()["options"], json!({"deep": true}));
    }

    #[test]
    fn test_required_empty_string_fails() {
        let mut session = ParamSession::open(&block());
        session.push_item("tags", json!("a"));
        session.set_value("path", json!(""));
        assert!(session.validate().is_err());
    }

    #[test]
    fn test_stale_test_outcome_is_discarded() {
        let mut session = ParamSession::open(&block());
        let (request, token) = session.begin_test();
        assert_eq!(request.namespace, "files");
        assert_eq!(request.arguments["path"], json!("/x"));

        session.close();
        session.accept_result(token, TestOutcome::ok(json!({"content": "..."})));
        assert!(session.last_outcome().is_none());
    }

    #[test]
    fn test_live_test_outcome_is_kept() {
        let mut session = ParamSession::open(&block());
        let (_, token) = session.begin_test();
        session.accept_result(token, TestOutcome::failed("boom"));
        assert_eq!(
            session.last_outcome().unwrap().error_message.as_deref(),
            Some("boom")
        );
    }
}
