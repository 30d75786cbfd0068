//! Context-sensitive completion for the reference grammar.
//!
//! Completion is pure: the same line prefix and catalogs always produce the
//! same items. The host wires this into its editor's suggest provider with
//! `@` and `.` as trigger characters.

pub mod hover;
pub mod snippet;

pub use hover::hover;
pub use snippet::{render_literal, snippet_body};

use crate::catalog::{CatalogEntry, Catalogs};
use crate::grammar::RefCategory;

/// Kind of completion item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionKind {
    Category,
    Tool,
    Prompt,
    Resource,
    Param,
    Config,
    /// Informational item shown when a category has no entries; selecting
    /// it inserts nothing.
    Notice,
}

impl CompletionKind {
    /// Convert to LSP completion item kind number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            CompletionKind::Category => 14, // Keyword
            CompletionKind::Tool => 3,      // Function
            CompletionKind::Prompt => 15,   // Snippet
            CompletionKind::Resource => 17, // File
            CompletionKind::Param => 6,     // Variable
            CompletionKind::Config => 21,   // Constant
            CompletionKind::Notice => 1,    // Text
        }
    }

    fn for_category(category: RefCategory) -> Self {
        match category {
            RefCategory::Tool => CompletionKind::Tool,
            RefCategory::Prompt => CompletionKind::Prompt,
            RefCategory::Resource => CompletionKind::Resource,
            RefCategory::Param => CompletionKind::Param,
            RefCategory::Config => CompletionKind::Config,
        }
    }
}

/// A completion suggestion.
#[derive(Clone, Debug)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionKind,
    /// Detail text (shown after label).
    pub detail: Option<String>,
    /// Documentation (shown in popup).
    pub documentation: Option<String>,
    /// Text to insert; snippet syntax for tool/prompt items, empty for
    /// notices.
    pub insert_text: String,
    /// Re-open the suggest widget after inserting (category items).
    pub retrigger: bool,
    /// The resolved catalog entry, carried so that accepting a tool/prompt
    /// item can arm atomic-block creation.
    pub entry: Option<CatalogEntry>,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>, kind: CompletionKind) -> Self {
        let label = label.into();
        Self {
            insert_text: label.clone(),
            label,
            kind,
            detail: None,
            documentation: None,
            retrigger: false,
            entry: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_documentation(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }

    pub fn with_insert_text(mut self, text: impl Into<String>) -> Self {
        self.insert_text = text.into();
        self
    }

    fn notice(label: impl Into<String>) -> Self {
        Self::new(label, CompletionKind::Notice).with_insert_text("")
    }
}

/// What the text before the cursor asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Trailing `@`: offer the five categories.
    Category,
    /// Trailing `@tool.` / `@prompt.` / etc: offer that category's entries.
    Entries(RefCategory),
}

/// Inspect the line text before the cursor for a completion trigger.
pub fn detect_trigger(prefix: &str) -> Option<Trigger> {
    if prefix.ends_with('@') {
        return Some(Trigger::Category);
    }
    for category in RefCategory::ALL {
        if prefix.ends_with(&format!("@{}.", category.keyword())) {
            return Some(Trigger::Entries(category));
        }
    }
    None
}

/// Completion items for the text before the cursor. Returns an empty list
/// when the prefix is not at a trigger point.
pub fn complete(prefix: &str, catalogs: &Catalogs) -> Vec<CompletionItem> {
    match detect_trigger(prefix) {
        Some(Trigger::Category) => category_items(),
        Some(Trigger::Entries(category)) => entry_items(category, catalogs),
        None => Vec::new(),
    }
}

fn category_items() -> Vec<CompletionItem> {
    RefCategory::ALL
        .iter()
        .map(|category| {
            let keyword = category.keyword();
            let mut item = CompletionItem::new(keyword, CompletionKind::Category)
                .with_insert_text(format!("{keyword}."))
                .with_detail(category_detail(*category));
            item.retrigger = true;
            item
        })
        .collect()
}

fn category_detail(category: RefCategory) -> &'static str {
    match category {
        RefCategory::Tool => "Reference a tool",
        RefCategory::Prompt => "Reference a prompt",
        RefCategory::Resource => "Reference a resource",
        RefCategory::Param => "Reference a context parameter",
        RefCategory::Config => "Reference an environment variable",
    }
}

fn entry_items(category: RefCategory, catalogs: &Catalogs) -> Vec<CompletionItem> {
    match category {
        RefCategory::Tool | RefCategory::Prompt => invocable_items(category, catalogs),
        RefCategory::Resource => {
            let entries = catalogs.resources();
            if entries.is_empty() {
                return vec![CompletionItem::notice("No resources available")];
            }
            entries
                .into_iter()
                .map(|r| {
                    let mut item =
                        CompletionItem::new(r.label(), CompletionKind::Resource);
                    if let Some(desc) = r.description {
                        item = item.with_documentation(desc);
                    }
                    item
                })
                .collect()
        }
        RefCategory::Param => {
            if catalogs.context_params.is_empty() {
                return vec![CompletionItem::notice("No parameters defined")];
            }
            catalogs
                .context_params
                .iter()
                .map(|p| {
                    let mut item =
                        CompletionItem::new(p.name.as_str(), CompletionKind::Param);
                    if let Some(desc) = &p.description {
                        item = item.with_documentation(desc.clone());
                    }
                    if p.required {
                        item = item.with_detail("required");
                    }
                    item
                })
                .collect()
        }
        RefCategory::Config => {
            if catalogs.env_names.is_empty() {
                return vec![CompletionItem::notice("No environment variables defined")];
            }
            catalogs
                .env_names
                .iter()
                .map(|name| CompletionItem::new(name.as_str(), CompletionKind::Config))
                .collect()
        }
    }
}

fn invocable_items(category: RefCategory, catalogs: &Catalogs) -> Vec<CompletionItem> {
    let entries = match category {
        RefCategory::Tool => catalogs.tools(),
        _ => catalogs.prompts(),
    };
    if entries.is_empty() {
        let noun = match category {
            RefCategory::Tool => "tools",
            _ => "prompts",
        };
        return vec![CompletionItem::notice(format!("No {noun} available"))];
    }
    entries
        .into_iter()
        .map(|entry| {
            let mut item =
                CompletionItem::new(entry.label(), CompletionKind::for_category(category))
                    .with_insert_text(snippet_body(&entry))
                    .with_detail(format!("{} parameter(s)", entry.schema.properties.len()));
            if let Some(desc) = &entry.description {
                item = item.with_documentation(desc.clone());
            }
            item.entry = Some(entry);
            item
        })
        .collect()
}
