use serde::Serialize;

use scribe_core::{Mode, ModificationType, OperationId, OperationOutcome};

/// Parameters of one AI operation. Serialized as the operation payload of
/// the request body and as part of the response-cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OperationParams {
    #[serde(rename_all = "camelCase")]
    Prompt { prompt: String, cursor_position: usize },
    #[serde(rename_all = "camelCase")]
    Continue {
        cursor_position: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        selected_text: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Modify {
        selected_text: String,
        #[serde(serialize_with = "serialize_modification_type")]
        modification_type: ModificationType,
        #[serde(skip_serializing_if = "Option::is_none")]
        instruction: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        custom_prompt: Option<String>,
    },
}

fn serialize_modification_type<S>(ty: &ModificationType, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(ty.as_str())
}

impl OperationParams {
    pub fn prompt(prompt: impl Into<String>, cursor_position: usize) -> Self {
        OperationParams::Prompt {
            prompt: prompt.into(),
            cursor_position,
        }
    }

    pub fn continuation(cursor_position: usize, selected_text: Option<String>) -> Self {
        OperationParams::Continue {
            cursor_position,
            selected_text,
        }
    }

    pub fn modify(
        selected_text: impl Into<String>,
        modification_type: ModificationType,
        custom_prompt: Option<String>,
    ) -> Self {
        OperationParams::Modify {
            selected_text: selected_text.into(),
            modification_type,
            instruction: modification_type.instruction().map(str::to_string),
            custom_prompt,
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            OperationParams::Prompt { .. } => Mode::Prompt,
            OperationParams::Continue { .. } => Mode::Continue,
            OperationParams::Modify { .. } => Mode::Modify,
        }
    }

    /// Stable text form used in cache keys.
    pub fn cache_fragment(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// One operation as handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub params: OperationParams,
    pub document_content: String,
    /// Skip the response cache, e.g. when regenerating a preview.
    pub bypass_cache: bool,
}

impl OperationRequest {
    pub fn new(params: OperationParams, document_content: impl Into<String>) -> Self {
        Self {
            params,
            document_content: document_content.into(),
            bypass_cache: false,
        }
    }

    pub fn bypassing_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }
}

/// Raw AI output; the editor decides how to apply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiResponse {
    pub operation: OperationId,
    pub mode: Mode,
    pub content: String,
    /// Served from the response cache without network I/O.
    pub cached: bool,
}

/// Progress reported by the orchestrator while an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Started {
        op: OperationId,
        mode: Mode,
        status: String,
    },
    Progress {
        op: OperationId,
        progress: u8,
        status: Option<String>,
    },
    Finished {
        op: OperationId,
        outcome: OperationOutcome,
    },
}

impl EngineEvent {
    pub fn operation(&self) -> OperationId {
        match self {
            EngineEvent::Started { op, .. }
            | EngineEvent::Progress { op, .. }
            | EngineEvent::Finished { op, .. } => *op,
        }
    }
}
