//! Testing utilities for the plan staging workspace
//!
//! Shared fixtures and scripted generators.

#![allow(missing_docs)]

use parking_lot::Mutex;
use plan_core::{GenerationError, ProposalGenerator};
use plan_model::{Collection, ProjectRecord, ProjectState, Slot};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::oneshot;

pub fn collection(value: Value) -> Collection {
    Collection::from_value(&value, "fixture").unwrap()
}

/// Small startup project with canvas, personas and tasks populated
pub fn sample_project() -> ProjectState {
    ProjectState::new(
        ProjectRecord::new("p1", "Acme Analytics")
            .with_description("Dashboards for small retailers")
            .with_industry("retail")
            .with_stage("idea"),
    )
    .with_collection(
        Slot::CanvasItems,
        collection(json!([
            {"id": "1", "section": "problem", "text": "Retailers lack sales insight"},
            {"id": "2", "section": "solution", "text": "Plug-and-play dashboards"},
        ])),
    )
    .with_collection(
        Slot::MarketPersonas,
        collection(json!([
            {"id": "a", "name": "Store owner", "age_range": "35-55"},
        ])),
    )
    .with_collection(
        Slot::TeamTasks,
        collection(json!([
            {"id": "task-1", "title": "Interview five store owners", "done": false},
        ])),
    )
}

/// Patch touching canvas items: one modified, one removed, one added
pub fn canvas_patch() -> Value {
    json!({
        "canvas_items": [
            {"id": "1", "section": "problem", "text": "Retailers cannot see which products sell"},
            {"id": "3", "section": "channels", "text": "POS integrations"},
        ]
    })
}

/// Patch adding one persona
pub fn persona_patch(id: &str, name: &str) -> Value {
    json!({
        "market_personas": [
            {"id": "a", "name": "Store owner", "age_range": "35-55"},
            {"id": id, "name": name},
        ]
    })
}

/// Generator answering from a queue, recording every instruction
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<Value, GenerationError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, response: Value) -> Self {
        self.responses.lock().push_back(Ok(response));
        self
    }

    pub fn with_failure(self, error: GenerationError) -> Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl ProposalGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        instruction: &str,
        _snapshot: Arc<ProjectState>,
    ) -> Result<Value, GenerationError> {
        self.calls.lock().push(instruction.to_string());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Unavailable("script exhausted".into())))
    }
}

/// Sender half of a gate; resolves the matching `generate` call
pub type Gate = oneshot::Sender<Result<Value, GenerationError>>;

/// Generator whose calls block until the test opens their gate
///
/// Lets a test control the order in which concurrent proposals resolve.
#[derive(Debug, Default)]
pub struct GatedGenerator {
    pending: Mutex<HashMap<String, oneshot::Receiver<Result<Value, GenerationError>>>>,
    snapshots: Mutex<Vec<Arc<ProjectState>>>,
}

impl GatedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gate for `instruction`; the call waits until it is sent
    pub fn gate(&self, instruction: &str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(instruction.to_string(), rx);
        tx
    }

    /// Snapshots handed to the generator, in call order
    pub fn snapshots(&self) -> Vec<Arc<ProjectState>> {
        self.snapshots.lock().clone()
    }
}

#[async_trait::async_trait]
impl ProposalGenerator for GatedGenerator {
    async fn generate(
        &self,
        instruction: &str,
        snapshot: Arc<ProjectState>,
    ) -> Result<Value, GenerationError> {
        self.snapshots.lock().push(snapshot);
        let gate = self.pending.lock().remove(instruction);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(GenerationError::Unavailable("gate dropped".into()))),
            None => Err(GenerationError::Rejected(format!("no gate for {instruction:?}"))),
        }
    }
}
