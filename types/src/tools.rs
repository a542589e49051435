//! Static tool descriptor table.
//!
//! Maps a tool name to the single JSON argument field whose value is worth
//! announcing to the client early (the "trigger" field) and to the verb used
//! when rendering that announcement. Tools without an entry are
//! unconfigured: their extractors are permanent no-ops.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// What a tool does to its trigger value, for rendering purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolAction {
    Write,
    Modify,
    Read,
    Delete,
    Search,
    Generate,
}

impl ToolAction {
    /// Imperative verb for the wire `action` field.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            ToolAction::Write => "write",
            ToolAction::Modify => "modify",
            ToolAction::Read => "read",
            ToolAction::Delete => "delete",
            ToolAction::Search => "search",
            ToolAction::Generate => "generate",
        }
    }

    /// Progressive form for "starting" notices.
    #[must_use]
    pub fn in_progress(self) -> &'static str {
        match self {
            ToolAction::Write => "Writing",
            ToolAction::Modify => "Modifying",
            ToolAction::Read => "Reading",
            ToolAction::Delete => "Deleting",
            ToolAction::Search => "Searching for",
            ToolAction::Generate => "Generating",
        }
    }

    /// Past form for "completed" summaries.
    #[must_use]
    pub fn completed(self) -> &'static str {
        match self {
            ToolAction::Write => "Wrote",
            ToolAction::Modify => "Modified",
            ToolAction::Read => "Read",
            ToolAction::Delete => "Deleted",
            ToolAction::Search => "Searched for",
            ToolAction::Generate => "Generated",
        }
    }
}

impl fmt::Display for ToolAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Static per-tool configuration: which argument field triggers the early
/// client notice, and how to phrase it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub trigger_field: &'static str,
    pub action: ToolAction,
}

/// Builtin descriptor for a tool name, if the tool is configured.
#[must_use]
pub fn descriptor_for(tool_name: &str) -> Option<ToolDescriptor> {
    let (trigger_field, action) = match tool_name {
        "writeFile" => ("relativeFilePath", ToolAction::Write),
        "modifyFile" => ("relativeFilePath", ToolAction::Modify),
        "readFile" => ("relativeFilePath", ToolAction::Read),
        "readDir" => ("relativeDirPath", ToolAction::Read),
        "deleteFile" => ("relativeFilePath", ToolAction::Delete),
        "searchContentImages" | "searchIllustrations" => ("query", ToolAction::Search),
        "generateLogos" => ("description", ToolAction::Generate),
        "generateMermaidDiagram" => ("mermaidCode", ToolAction::Generate),
        _ => return None,
    };
    Some(ToolDescriptor {
        trigger_field,
        action,
    })
}

/// Injectable descriptor lookup.
///
/// Production code uses [`ToolCatalog::default`], which is exactly the
/// builtin table; tests can override entries without touching the static
/// lookup. The catalog is defined once per process and never mutated after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    overrides: HashMap<String, ToolDescriptor>,
}

impl ToolCatalog {
    /// Catalog with an extra (or replacement) entry. Intended for tests.
    #[must_use]
    pub fn with_entry(mut self, tool_name: impl Into<String>, descriptor: ToolDescriptor) -> Self {
        self.overrides.insert(tool_name.into(), descriptor);
        self
    }

    #[must_use]
    pub fn descriptor(&self, tool_name: &str) -> Option<ToolDescriptor> {
        self.overrides
            .get(tool_name)
            .copied()
            .or_else(|| descriptor_for(tool_name))
    }

    #[must_use]
    pub fn is_configured(&self, tool_name: &str) -> bool {
        self.descriptor(tool_name).is_some()
    }
}
