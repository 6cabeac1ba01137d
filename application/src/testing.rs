//! Scripted adapters for tests and dry runs.
//!
//! [`ScriptedRegistry`] and [`ScriptedProxyChannel`] implement the source
//! ports with per-tool [`Behavior`]s and count invocations, so resilience
//! paths (retries, breaker trips, fallbacks) can be driven deterministically.
//! [`RecordingEventSink`] keeps every event it receives.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use toolweave_domain::{ExecutionEvent, ProviderError, ToolDefinition, ToolError};

use crate::ports::event_sink::EventSink;
use crate::ports::internal_registry::InternalToolRegistry;
use crate::ports::proxy_channel::ProxyChannel;

/// How a scripted tool answers
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return the received parameters as an object
    Echo,
    Return(Value),
    Fail(ToolError),
    /// Fail the first `times` invocations, then return `then`
    FailFirst {
        times: u32,
        error: ToolError,
        then: Value,
    },
    /// Sleep, then return the value
    Sleep(Duration, Value),
}

#[derive(Default)]
struct Script {
    tools: Vec<ToolDefinition>,
    behaviors: HashMap<String, Behavior>,
    invocations: HashMap<String, u32>,
    last_params: HashMap<String, Map<String, Value>>,
}

impl Script {
    fn add(&mut self, definition: ToolDefinition, behavior: Behavior) {
        self.behaviors.insert(definition.name.clone(), behavior);
        self.tools.push(definition);
    }

    /// Count the invocation and pick the answer; sleeping happens unlocked
    fn next(
        &mut self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<(Option<Duration>, Result<Value, ToolError>), ToolError> {
        let behavior = self
            .behaviors
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::not_found(format!("tool '{}'", name)))?;
        let count = {
            let entry = self.invocations.entry(name.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        self.last_params.insert(name.to_string(), params.clone());

        Ok(match behavior {
            Behavior::Echo => (None, Ok(Value::Object(params.clone()))),
            Behavior::Return(value) => (None, Ok(value)),
            Behavior::Fail(error) => (None, Err(error)),
            Behavior::FailFirst { times, error, then } => {
                if count <= times {
                    (None, Err(error))
                } else {
                    (None, Ok(then))
                }
            }
            Behavior::Sleep(delay, value) => (Some(delay), Ok(value)),
        })
    }
}

struct ScriptedCore {
    id: String,
    script: Mutex<Script>,
    listing_fails: AtomicBool,
}

impl ScriptedCore {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            script: Mutex::new(Script::default()),
            listing_fails: AtomicBool::new(false),
        }
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn list(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(ProviderError::DiscoveryFailed(format!(
                "source '{}' refused to list tools",
                self.id
            )));
        }
        Ok(self.script().tools.clone())
    }

    async fn answer(&self, name: &str, params: &Map<String, Value>) -> Result<Value, ToolError> {
        let (delay, answer) = self.script().next(name, params)?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        answer
    }

    fn invocations(&self, name: &str) -> u32 {
        self.script().invocations.get(name).copied().unwrap_or(0)
    }

    fn last_params(&self, name: &str) -> Option<Map<String, Value>> {
        self.script().last_params.get(name).cloned()
    }
}

/// Internal registry answering from a script
pub struct ScriptedRegistry {
    core: ScriptedCore,
}

impl ScriptedRegistry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            core: ScriptedCore::new(id),
        }
    }

    pub fn with_tool(self, definition: ToolDefinition, behavior: Behavior) -> Self {
        self.core.script().add(definition, behavior);
        self
    }

    /// Make every listing fail
    pub fn failing_listing(self) -> Self {
        self.core.listing_fails.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_behavior(&self, tool: &str, behavior: Behavior) {
        self.core.script().behaviors.insert(tool.to_string(), behavior);
    }

    pub fn invocations(&self, tool: &str) -> u32 {
        self.core.invocations(tool)
    }

    pub fn last_params(&self, tool: &str) -> Option<Map<String, Value>> {
        self.core.last_params(tool)
    }
}

#[async_trait]
impl InternalToolRegistry for ScriptedRegistry {
    fn id(&self) -> &str {
        &self.core.id
    }

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        self.core.list()
    }

    async fn invoke(&self, name: &str, params: &Map<String, Value>) -> Result<Value, ToolError> {
        self.core.answer(name, params).await
    }
}

/// Proxy channel answering from a script
///
/// `Return` values are handed back as raw responses, so they go through the
/// tool's response normalization like any remote answer.
pub struct ScriptedProxyChannel {
    core: ScriptedCore,
    available: AtomicBool,
}

impl ScriptedProxyChannel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            core: ScriptedCore::new(id),
            available: AtomicBool::new(true),
        }
    }

    pub fn with_tool(self, definition: ToolDefinition, behavior: Behavior) -> Self {
        self.core.script().add(definition, behavior);
        self
    }

    pub fn failing_listing(self) -> Self {
        self.core.listing_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Report the channel as unreachable
    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_behavior(&self, tool: &str, behavior: Behavior) {
        self.core.script().behaviors.insert(tool.to_string(), behavior);
    }

    pub fn invocations(&self, tool: &str) -> u32 {
        self.core.invocations(tool)
    }

    pub fn last_params(&self, tool: &str) -> Option<Map<String, Value>> {
        self.core.last_params(tool)
    }
}

#[async_trait]
impl ProxyChannel for ScriptedProxyChannel {
    fn id(&self) -> &str {
        &self.core.id
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        self.core.list()
    }

    async fn forward(&self, name: &str, params: &Map<String, Value>) -> Result<Value, ToolError> {
        self.core.answer(name, params).await
    }
}

/// Event sink that keeps everything it receives
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Event type names in arrival order
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(ExecutionEvent::kind)
            .collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }
}

impl EventSink for RecordingEventSink {
    fn record(&self, event: &ExecutionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
