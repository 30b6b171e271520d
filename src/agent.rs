//! The age-calculator agent: a model client plus the two date capabilities.
//!
//! The model backend is injected through [`ModelClient`]; nothing in this
//! crate talks to a network. [`Agent::invoke`] runs the usual tool loop: ask
//! the model, execute any tool it requests, feed the result back, and stop at
//! the first plain-text turn.

use std::collections::BTreeSet;

use agecalc_tools::{Clock, ToolSpec, dispatch, tool_specs};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::instrument;

use crate::eval::surface::CapabilityRegistry;

pub const SYSTEM_PROMPT: &str = "\
You are a helpful assistant that calculates a user's age in days.
When the user provides their birthdate, use the get_current_date tool to find today's date,
then use the calculate_days_between tool to compute the number of days between their birthdate
and today. Present the result clearly. Politely decline any request that is not about
calculating an age or a number of days between dates.";

// ---------------------------------------------------------------------------
// Model interface
// ---------------------------------------------------------------------------

/// One entry in the conversation sent to the model.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    User { text: String },
    ToolUse { name: String, arguments: Map<String, Value> },
    ToolResult { name: String, content: Value, is_error: bool },
}

/// Everything the model sees for one turn.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ModelRequest<'a> {
    pub model_id: &'a str,
    pub system: &'a str,
    pub tools: &'a [ToolSpec],
    pub messages: &'a [Message],
}

/// What the model decided to do.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelTurn {
    /// Final answer.
    Text(String),
    /// Call a tool and continue.
    ToolUse { name: String, arguments: Map<String, Value> },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("model backend error: {message}")]
pub struct ModelError {
    pub message: String,
}

/// A model backend.
pub trait ModelClient {
    /// Produce the next turn for `request`.
    ///
    /// # Errors
    /// Returns [`ModelError`] when the backend fails.
    fn converse(&self, request: &ModelRequest<'_>) -> Result<ModelTurn, ModelError>;
}

impl<F> ModelClient for F
where
    F: Fn(&ModelRequest<'_>) -> Result<ModelTurn, ModelError>,
{
    fn converse(&self, request: &ModelRequest<'_>) -> Result<ModelTurn, ModelError> {
        self(request)
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Agent settings, loaded from the `[agent]` config section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentSettings {
    /// Model identifier passed through to the backend.
    pub model_id: String,
    /// Tool calls allowed before the agent gives up on a request.
    pub max_tool_turns: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model_id: "age-calculator".to_owned(),
            max_tool_turns: 4,
        }
    }
}

/// A capability invocation made while answering.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The agent's answer plus every tool call it made, in order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AgentResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("model requested more than {limit} tool calls without answering")]
    ToolTurnLimit { limit: usize },
}

pub struct Agent<M, C> {
    model: M,
    clock: C,
    settings: AgentSettings,
}

impl<M: ModelClient, C: Clock> Agent<M, C> {
    pub const fn new(model: M, clock: C, settings: AgentSettings) -> Self {
        Self {
            model,
            clock,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Answer one user message.
    ///
    /// Tool errors are returned to the model as error results, not raised.
    ///
    /// # Errors
    /// Returns [`AgentError::Model`] if the backend fails and
    /// [`AgentError::ToolTurnLimit`] if the model never produces text.
    #[instrument(skip_all, fields(model = %self.settings.model_id, input_len = input.len()))]
    pub fn invoke(&self, input: &str) -> Result<AgentResponse, AgentError> {
        let tools = tool_specs();
        let mut messages = vec![Message::User {
            text: input.to_owned(),
        }];
        let mut tool_calls = Vec::new();

        for _ in 0..=self.settings.max_tool_turns {
            let request = ModelRequest {
                model_id: &self.settings.model_id,
                system: SYSTEM_PROMPT,
                tools: &tools,
                messages: &messages,
            };
            match self.model.converse(&request)? {
                ModelTurn::Text(text) => {
                    tracing::debug!(tool_calls = tool_calls.len(), "agent answered");
                    return Ok(AgentResponse { text, tool_calls });
                }
                ModelTurn::ToolUse { name, arguments } => {
                    if tool_calls.len() == self.settings.max_tool_turns {
                        tracing::warn!(tool = %name, "tool turn limit reached");
                        break;
                    }
                    let result = dispatch(&name, &arguments, &self.clock);
                    tracing::debug!(tool = %name, ok = result.is_ok(), "tool call");
                    let (content, is_error) = match &result {
                        Ok(v) => (v.clone(), false),
                        Err(e) => (Value::String(e.to_string()), true),
                    };
                    messages.push(Message::ToolUse {
                        name: name.clone(),
                        arguments: arguments.clone(),
                    });
                    messages.push(Message::ToolResult {
                        name: name.clone(),
                        content,
                        is_error,
                    });
                    let (output, error) = match result {
                        Ok(v) => (Some(v), None),
                        Err(e) => (None, Some(e.to_string())),
                    };
                    tool_calls.push(ToolCall {
                        name,
                        arguments,
                        output,
                        error,
                    });
                }
            }
        }

        Err(AgentError::ToolTurnLimit {
            limit: self.settings.max_tool_turns,
        })
    }
}

/// The capabilities every agent is built with, without a model attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegisteredTools;

impl CapabilityRegistry for RegisteredTools {
    fn capability_names(&self) -> BTreeSet<String> {
        tool_specs().iter().map(|s| s.name.to_owned()).collect()
    }
}

impl<M, C> CapabilityRegistry for Agent<M, C> {
    fn capability_names(&self) -> BTreeSet<String> {
        RegisteredTools.capability_names()
    }
}
