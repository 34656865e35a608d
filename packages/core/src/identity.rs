//! Agent identity: monotonic integer ids and `agentId` tagging.
//!
//! Unlike a process-wide counter, [`AgentIdAllocator`] is an ordinary value.
//! The host (or a test) constructs one and hands out ids from it; two
//! allocators never share state, so tests cannot observe each other's
//! allocations.
//!
//! # Typical model lifecycle
//!
//! ```text
//! speaker  = allocator.next_agent_id()?       // 1
//! listener = allocator.next_agent_id()?       // 2
//! utterances = tag_with_agent_id(&words, speaker)
//! // every element now carries agentId = 1
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::value::Value;

/// Property name under which a tagged value carries its [`AgentId`].
pub const AGENT_ID_PROP: &str = "agentId";

/// The largest id an allocator issues: `2^53 - 1`, the largest integer a
/// host-language number represents exactly.
pub const MAX_AGENT_ID: u64 = (1 << 53) - 1;

/// A positive integer naming one conceptual agent (speaker, listener, …).
///
/// Serialises as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(u64);

impl AgentId {
    /// Wrap a raw id. The library never checks that `raw` was actually
    /// handed out by an allocator.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AgentId> for Value {
    fn from(id: AgentId) -> Self {
        Value::Number(id.0 as f64)
    }
}

/// Issues strictly increasing [`AgentId`]s in call order.
///
/// The allocator never deduplicates: call [`next_agent_id`] exactly once per
/// logically distinct agent.
///
/// [`next_agent_id`]: AgentIdAllocator::next_agent_id
#[derive(Debug, Clone, Default)]
pub struct AgentIdAllocator {
    last: u64,
}

impl AgentIdAllocator {
    /// An allocator whose first id is `1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// An allocator whose first id is `offset + 1`.
    pub fn starting_after(offset: u64) -> Self {
        Self { last: offset }
    }

    /// Increment the counter and return the new value.
    ///
    /// Fails with [`CoreError::AgentIdsExhausted`] once the counter reaches
    /// [`MAX_AGENT_ID`]; the counter is left unchanged.
    pub fn next_agent_id(&mut self) -> Result<AgentId, CoreError> {
        let next = self
            .last
            .checked_add(1)
            .filter(|&id| id <= MAX_AGENT_ID)
            .ok_or(CoreError::AgentIdsExhausted(self.last))?;
        self.last = next;
        tracing::trace!(agent_id = next, "allocated agent id");
        Ok(AgentId(next))
    }

    /// The counter value: the most recently issued id, or the starting
    /// offset if nothing has been issued yet.
    pub fn current(&self) -> u64 {
        self.last
    }
}

/// Return a new sequence in which every element carries `agentId = id`.
///
/// The result has the same length and order as `items`, and `items` itself is
/// never resized or reordered. Elements are handled by kind:
///
/// | Element | Result |
/// |---------|--------|
/// | string | a **new** boxed-string object carrying the tag; the literal is untouched |
/// | object, array, function | the **same** handle, tagged in place |
/// | number, boolean | returned unchanged, untagged |
/// | `null`, `undefined` | [`CoreError::UntaggableValue`] |
///
/// The asymmetry between strings (copied) and objects (mutated) is observable
/// by callers and is kept as is.
pub fn tag_with_agent_id(items: &[Value], id: AgentId) -> Result<Vec<Value>, CoreError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(s) => {
                let boxed = Value::boxed_string(s.clone());
                boxed.set_prop(AGENT_ID_PROP, id.into());
                Ok(boxed)
            }
            Value::Object(_) => {
                item.set_prop(AGENT_ID_PROP, id.into());
                Ok(item.clone())
            }
            Value::Number(_) | Value::Bool(_) => Ok(item.clone()),
            Value::Null => Err(CoreError::UntaggableValue {
                index,
                kind: "null",
            }),
            Value::Undefined => Err(CoreError::UntaggableValue {
                index,
                kind: "undefined",
            }),
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
