//! Full authoring flow: completion, block creation, parameter editing,
//! test calls and context switching, driven the way a host editor would.

use serde_json::json;
use vmcp_expr::catalog::{
    CallSchema, Catalogs, FieldSchema, FieldType, ParamDecl, ServerCatalog, ToolSpec,
};
use vmcp_expr::complete::{CompletionKind, complete, hover};
use vmcp_expr::engine::{ContextKey, Edit, Engine, EngineAction};
use vmcp_expr::params::{ParamSession, TestOutcome, TestRequest, TestRunner};
use vmcp_expr::{BufferView, Position, Span, TextBuffer};

fn catalogs() -> Catalogs {
    let mut schema = CallSchema::default();
    schema.properties.insert(
        "path".into(),
        FieldSchema::new(FieldType::String).with_description("file path"),
    );
    schema.required.push("path".into());
    Catalogs {
        servers: vec![ServerCatalog {
            server_id: "srv-1".into(),
            name: "files".into(),
            selected_tools: vec!["read".into(), "gone".into()],
            tool_details: vec![ToolSpec {
                name: "read".into(),
                description: Some("Read a file".into()),
                schema,
            }],
            ..Default::default()
        }],
        context_params: vec![ParamDecl {
            name: "target".into(),
            description: None,
            required: true,
        }],
        ..Default::default()
    }
}

fn apply_actions(engine: &mut Engine, buffer: &mut TextBuffer, actions: Vec<EngineAction>) {
    for action in actions {
        if let EngineAction::Replace { span, text } = action {
            buffer.apply(span, &text);
            let echo = engine.apply_edit(Edit::new(span, text));
            apply_actions(engine, buffer, echo);
        }
    }
}

struct StubRunner {
    outcome: TestOutcome,
}

impl TestRunner for StubRunner {
    fn run(&self, _request: TestRequest) -> TestOutcome {
        self.outcome.clone()
    }
}

#[test]
fn completion_drives_block_creation() {
    let catalogs = catalogs();
    let mut engine = Engine::new();
    let mut buffer = TextBuffer::new("check @");

    // `@` offers the five categories.
    let items = complete(buffer.line(1).unwrap(), &catalogs);
    assert_eq!(items.len(), 5);
    let tool_item = &items[0];
    assert_eq!(tool_item.insert_text, "tool.");

    // Accept `tool.`; the prefix now triggers entry completion.
    buffer.apply(Span::empty(Position::new(1, 8)), &tool_item.insert_text);
    engine.apply_edit(Edit::insert(Position::new(1, 8), tool_item.insert_text.clone()));
    let items = complete(buffer.line(1).unwrap(), &catalogs);
    assert_eq!(items.len(), 1, "the unavailable selection is omitted");
    let read = &items[0];
    assert_eq!(read.label, "files.read");
    assert_eq!(read.kind, CompletionKind::Tool);

    // Accept the entry: the host expands tabstops and inserts, the engine
    // is armed with the accepted entry.
    engine.arm_completion(read.entry.clone().unwrap());
    let inserted = r#"files.read(path: str = "file path")"#;
    buffer.apply(Span::empty(Position::new(1, 13)), inserted);
    let actions = engine.apply_edit(Edit::insert(Position::new(1, 13), inserted));
    assert!(actions.contains(&EngineAction::BlocksChanged));

    let block = engine.blocks()[0];
    assert_eq!(
        buffer.slice(block.span).as_deref(),
        Some(block.literal_text.as_str())
    );
    assert_eq!(block.values["path"], json!("file path"));

    // Hover over the new block names the tool and its parameters.
    let text = hover(&buffer, block.span.start, &catalogs).unwrap();
    assert!(text.contains("Read a file"));
    assert!(text.contains("`path: str` (required)"));
}

#[test]
fn param_session_edits_and_saves_a_block() {
    let catalogs = catalogs();
    let mut engine = Engine::new();
    let mut buffer = TextBuffer::new("@tool.");
    engine.arm_completion(catalogs.tools()[0].clone());
    let inserted = r#"files.read(path: str = "/old")"#;
    buffer.apply(Span::empty(Position::new(1, 7)), inserted);
    let actions = engine.apply_edit(Edit::insert(Position::new(1, 7), inserted));
    apply_actions(&mut engine, &mut buffer, actions);

    let id = engine.blocks()[0].id;
    let mut session = ParamSession::open(engine.registry().get(id).unwrap());

    // Clearing a required field blocks the save and leaves the buffer
    // untouched.
    session.set_value("path", json!(""));
    let before = buffer.text();
    assert!(session.save(&mut engine).is_err());
    assert_eq!(buffer.text(), before);

    session.set_value("path", json!("/new/location"));
    let actions = session.save(&mut engine).unwrap();
    apply_actions(&mut engine, &mut buffer, actions);

    assert_eq!(
        buffer.text(),
        r#"@tool.files.read(path: str = "/new/location")"#
    );
    let block = engine.registry().get(id).unwrap();
    assert_eq!(buffer.slice(block.span).as_deref(), Some(block.literal_text.as_str()));
}

#[test]
fn test_calls_never_touch_the_document() {
    let catalogs = catalogs();
    let mut engine = Engine::new();
    let mut buffer = TextBuffer::new("@tool.");
    engine.arm_completion(catalogs.tools()[0].clone());
    let inserted = r#"files.read(path: str = "/x")"#;
    buffer.apply(Span::empty(Position::new(1, 7)), inserted);
    let actions = engine.apply_edit(Edit::insert(Position::new(1, 7), inserted));
    apply_actions(&mut engine, &mut buffer, actions);
    let id = engine.blocks()[0].id;
    let before = buffer.text();
    let values_before = engine.registry().get(id).unwrap().values.clone();

    let mut session = ParamSession::open(engine.registry().get(id).unwrap());
    session.set_value("path", json!("/probed"));
    let runner = StubRunner {
        outcome: TestOutcome::ok(json!({"content": "hello"})),
    };
    let (request, token) = session.begin_test();
    assert_eq!(request.name, "read");
    assert_eq!(request.arguments["path"], json!("/probed"));
    let outcome = runner.run(request);
    session.accept_result(token, outcome);
    assert!(session.last_outcome().unwrap().success);

    // No save happened: document and block values are unchanged.
    assert_eq!(buffer.text(), before);
    assert_eq!(engine.registry().get(id).unwrap().values, values_before);
}

#[test]
fn contexts_keep_independent_registries() {
    let catalogs = catalogs();
    let mut engine = Engine::new();
    let mut buffer = TextBuffer::new("@tool.");
    engine.arm_completion(catalogs.tools()[0].clone());
    let inserted = r#"files.read(path: str = "/x")"#;
    buffer.apply(Span::empty(Position::new(1, 7)), inserted);
    let actions = engine.apply_edit(Edit::insert(Position::new(1, 7), inserted));
    apply_actions(&mut engine, &mut buffer, actions);
    assert_eq!(engine.blocks().len(), 1);
    let records = engine.snapshot();

    // A prompt context starts empty and edits there touch nothing here.
    engine.set_context(ContextKey::Prompt(0));
    assert!(engine.blocks().is_empty());
    engine.apply_edit(Edit::insert(Position::new(1, 1), "prompt text"));
    assert!(engine.blocks().is_empty());

    // Back on the system prompt the block is still tracked, and the
    // snapshot restores against the unchanged buffer.
    engine.set_context(ContextKey::SystemPrompt);
    assert_eq!(engine.blocks().len(), 1);
    engine.restore(records, &buffer);
    assert_eq!(engine.blocks().len(), 1);
}
