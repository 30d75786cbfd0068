//! Hover descriptions for references under the cursor.

use std::fmt::Write as _;

use crate::base::{BufferView, Position};
use crate::catalog::Catalogs;
use crate::grammar::{RefCategory, Reference, find_references};

/// Describe the reference under `position`, if any. The returned string is
/// plain markdown for the host's hover widget.
pub fn hover(buffer: &dyn BufferView, position: Position, catalogs: &Catalogs) -> Option<String> {
    let line = buffer.line(position.line)?;
    let byte_col = byte_offset(line, position.column)?;
    let hit = find_references(line)
        .into_iter()
        .find(|r| r.start <= byte_col && byte_col < r.end)?;
    Some(describe(&hit.reference, catalogs))
}

/// Byte offset of the 1-based character column.
fn byte_offset(line: &str, column: u32) -> Option<usize> {
    let index = column.checked_sub(1)? as usize;
    line.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(line.len()))
        .nth(index)
}

fn describe(reference: &Reference, catalogs: &Catalogs) -> String {
    let mut text = format!("**{reference}**");
    match reference.category {
        RefCategory::Tool | RefCategory::Prompt => {
            let entry = reference.namespace.as_ref().and_then(|ns| {
                catalogs.entry(reference.category, ns, &reference.name)
            });
            if let Some(entry) = entry {
                if let Some(desc) = &entry.description {
                    let _ = write!(text, "\n\n{desc}");
                }
                if !entry.schema.is_empty() {
                    let _ = write!(text, "\n\nParameters:");
                    for (name, field) in &entry.schema.properties {
                        let marker = if entry.schema.is_required(name) {
                            " (required)"
                        } else {
                            ""
                        };
                        let _ = write!(text, "\n- `{name}: {}`{marker}", field.display_type());
                        if let Some(desc) = &field.description {
                            let _ = write!(text, ": {desc}");
                        }
                    }
                }
            } else {
                let _ = write!(text, "\n\nNot found in the current catalogs.");
            }
        }
        RefCategory::Resource => {
            let found = reference.namespace.as_ref().and_then(|ns| {
                catalogs
                    .resources()
                    .into_iter()
                    .find(|r| &r.namespace == ns && r.name == reference.name)
            });
            match found.and_then(|r| r.description) {
                Some(desc) => {
                    let _ = write!(text, "\n\n{desc}");
                }
                None => {
                    let _ = write!(text, "\n\nResource reference.");
                }
            }
        }
        RefCategory::Param => {
            let decl = catalogs
                .context_params
                .iter()
                .find(|p| p.name == reference.name);
            match decl {
                Some(p) => {
                    if let Some(desc) = &p.description {
                        let _ = write!(text, "\n\n{desc}");
                    }
                    if p.required {
                        let _ = write!(text, "\n\nRequired context parameter.");
                    } else {
                        let _ = write!(text, "\n\nContext parameter.");
                    }
                }
                None => {
                    let _ = write!(text, "\n\nUndeclared context parameter.");
                }
            }
        }
        RefCategory::Config => {
            if catalogs.env_names.iter().any(|n| n == &reference.name) {
                let _ = write!(text, "\n\nEnvironment variable.");
            } else {
                let _ = write!(text, "\n\nUndeclared environment variable.");
            }
        }
    }
    text
}
