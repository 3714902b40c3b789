//! The request context: the only input a section generator may read.
//!
//! A `Context` is built fresh per request by the caller, with every piece of
//! live data (memory recall, dimensions, workspace files) already resolved.
//! The orchestrator only ever borrows it immutably.

use crate::dimensions::Dimensions;
use crate::error::EngineError;
use crate::purpose::Purpose;
use serde::{Deserialize, Serialize};

/// Input record for one prompt build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Why the prompt is being built
    pub purpose: Purpose,

    /// Opaque session identifier
    pub session_id: String,

    /// Opaque user identifier
    pub user_id: String,

    /// Raw transcript text from speech-to-text, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    /// Free-text task description, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,

    /// Recalled memory snippets supplied by the memory collaborator
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memory_snippets: Vec<MemorySnippet>,

    /// Accumulated structured dimensions for the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,

    /// Tool identifiers available to the caller
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_tools: Vec<String>,

    /// Skills the caller can advertise to the model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<Skill>,

    /// Workspace bootstrap files, already read by the caller
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspace_files: Vec<WorkspaceFile>,

    /// Runtime facts (platform, model, capabilities)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeInfo>,
}

/// A recalled memory snippet with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnippet {
    pub text: String,

    /// Where the snippet came from; drives how much weight the model may give it
    pub provenance: Provenance,

    /// Relevance distance from the query (lower is more relevant)
    #[serde(default)]
    pub distance: f32,

    /// Number of graph neighbours linked to this snippet, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_neighbors: Option<u32>,
}

impl MemorySnippet {
    pub fn new(text: impl Into<String>, provenance: Provenance, distance: f32) -> Self {
        Self {
            text: text.into(),
            provenance,
            distance,
            graph_neighbors: None,
        }
    }

    pub fn with_graph_neighbors(mut self, count: u32) -> Self {
        self.graph_neighbors = Some(count);
        self
    }
}

/// Provenance tier of a memory snippet, from most to least trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Explicitly stated or confirmed by the user
    Confirmed,
    /// Passively observed from behaviour or prior sessions
    Observed,
    /// Derived by a model; never authoritative
    Inferred,
}

impl Provenance {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmed by user",
            Self::Observed => "Observed (unconfirmed)",
            Self::Inferred => "Inferred (speculative)",
        }
    }
}

/// A skill the caller can advertise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A workspace bootstrap file (e.g. an instructions file), already loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFile {
    pub path: String,
    pub content: String,
}

/// Runtime facts the model may rely on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuntimeInfo {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl Context {
    /// Create a context with only the mandatory fields set.
    pub fn new(purpose: Purpose, session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            purpose,
            session_id: session_id.into(),
            user_id: user_id.into(),
            transcript: None,
            task_description: None,
            memory_snippets: Vec::new(),
            dimensions: None,
            available_tools: Vec::new(),
            skills: Vec::new(),
            workspace_files: Vec::new(),
            runtime: None,
        }
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task_description = Some(task.into());
        self
    }

    pub fn with_memory(mut self, snippets: Vec<MemorySnippet>) -> Self {
        self.memory_snippets = snippets;
        self
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skills(mut self, skills: Vec<Skill>) -> Self {
        self.skills = skills;
        self
    }

    pub fn with_workspace_files(mut self, files: Vec<WorkspaceFile>) -> Self {
        self.workspace_files = files;
        self
    }

    pub fn with_runtime(mut self, runtime: RuntimeInfo) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Reject malformed contexts before any generator runs.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.session_id.trim().is_empty() {
            return Err(EngineError::InvalidContext("session_id is required".into()));
        }
        if self.user_id.trim().is_empty() {
            return Err(EngineError::InvalidContext("user_id is required".into()));
        }
        for (i, snippet) in self.memory_snippets.iter().enumerate() {
            if snippet.text.trim().is_empty() {
                return Err(EngineError::InvalidContext(format!(
                    "memory snippet #{i} has empty text"
                )));
            }
            if !snippet.distance.is_finite() || snippet.distance < 0.0 {
                return Err(EngineError::InvalidContext(format!(
                    "memory snippet #{i} has invalid distance {}",
                    snippet.distance
                )));
            }
        }
        if self.available_tools.iter().any(|t| t.trim().is_empty()) {
            return Err(EngineError::InvalidContext(
                "tool identifiers must be non-empty".into(),
            ));
        }
        Ok(())
    }
}
