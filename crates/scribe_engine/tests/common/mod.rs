#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scribe_core::TextSelection;
use scribe_engine::{AiError, EditorHost, EngineEvent, Endpoint, ProgressSink, RequestEnvelope};
use tokio::time::Instant;

/// Endpoint answering from a script, then with `fallback` forever.
pub struct ScriptedEndpoint {
    script: Mutex<VecDeque<(Duration, Result<String, AiError>)>>,
    fallback: Result<String, AiError>,
    calls: Mutex<Vec<(Instant, RequestEnvelope)>>,
}

impl ScriptedEndpoint {
    pub fn always(response: Result<String, AiError>) -> Arc<Self> {
        Self::scripted(Vec::new(), response)
    }

    pub fn scripted(
        script: Vec<(Duration, Result<String, AiError>)>,
        fallback: Result<String, AiError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(Instant, RequestEnvelope)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Gaps between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        self.calls()
            .windows(2)
            .map(|pair| pair[1].0 - pair[0].0)
            .collect()
    }
}

#[async_trait::async_trait]
impl Endpoint for ScriptedEndpoint {
    async fn send(&self, request: &RequestEnvelope) -> Result<String, AiError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));
        let next = self.script.lock().unwrap().pop_front();
        let (delay, response) = next.unwrap_or_else(|| (Duration::ZERO, self.fallback.clone()));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// In-memory document standing in for the editor.
pub struct MemoryEditor {
    text: Mutex<String>,
}

impl MemoryEditor {
    pub fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: Mutex::new(text.to_string()),
        })
    }

    pub fn text(&self) -> String {
        self.text.lock().unwrap().clone()
    }

    pub fn select(&self, needle: &str) -> TextSelection {
        let text = self.text();
        let start = text.find(needle).expect("needle in document");
        TextSelection::new(needle, start, start + needle.len())
    }
}

impl EditorHost for MemoryEditor {
    fn document_content(&self) -> String {
        self.text()
    }

    fn replace_text(
        &self,
        selection: Option<&TextSelection>,
        original: &str,
        replacement: &str,
    ) -> bool {
        let mut text = self.text.lock().unwrap();
        let range = selection
            .map(|sel| sel.start..sel.end)
            .filter(|range| text.get(range.clone()) == Some(original))
            .or_else(|| text.find(original).map(|start| start..start + original.len()));
        match range {
            Some(range) => {
                text.replace_range(range, replacement);
                true
            }
            None => false,
        }
    }
}

pub fn ok(content: &str) -> Result<String, AiError> {
    Ok(content.to_string())
}

pub fn status(code: u16) -> Result<String, AiError> {
    Err(AiError::from_status(code, format!("status {code}")))
}
