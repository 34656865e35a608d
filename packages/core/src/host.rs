//! By-name call surface for the embedding interpreter.
//!
//! The hosting DSL calls library functions by their exported name with
//! positional arguments and expects either a value back or an error carrying
//! a message. [`Host`] owns the state those functions share (one
//! [`AgentIdAllocator`] and one [`LiveRegistry`]) and dispatches each call:
//!
//! ```rust,ignore
//! use webppl_rsa::{Host, HostConfig, Value};
//!
//! let mut host = Host::new(HostConfig::default());
//! let speaker = host.call("getNewAgentId", &[])?;
//! host.call("store", &["agent".into(), "speaker".into(), speaker])?;
//! let same = host.call("get", &["agent".into(), "speaker".into()])?;
//! ```
//!
//! | Export | Arguments | Returns |
//! |--------|-----------|---------|
//! | `getNewAgentId` | none | number |
//! | `addAgentId` | array, id | new array of tagged elements |
//! | `store` | type, name, value | `undefined` |
//! | `get` | type, name | the stored value |
//! | `getAll` | type | the live bucket object of name → value |
//! | `makeObject` | key or keys, value or values | object |
//! | `assert` | condition, message | `undefined` |
//! | `nameFunction` | name, function | named function with an `fn` field |
//! | `renderAsciiTable` | array of rows | string |
//! | `mkAgent` | object | the same object, flagged as an agent |
//! | `applyFixedArity` | function, array of 1–3 args | zero-argument function |

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use thiserror::Error;

use crate::config::HostConfig;
use crate::error::{assert_invariant, CoreError};
use crate::function::{apply_fixed_arity, name_function, NAMED_FN_PROP};
use crate::identity::{tag_with_agent_id, AgentId, AgentIdAllocator, MAX_AGENT_ID};
use crate::record::{make_record, IS_AGENT_FIELD};
use crate::registry::{LiveRegistry, RegistryError};
use crate::render::render_ascii_table_padded;
use crate::value::{HostFunction, ObjectKind, Props, Value};

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// A function the host may call by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Export {
    GetNewAgentId,
    AddAgentId,
    Store,
    Get,
    GetAll,
    MakeObject,
    Assert,
    NameFunction,
    RenderAsciiTable,
    MkAgent,
    ApplyFixedArity,
}

impl Export {
    pub const ALL: [Export; 11] = [
        Export::GetNewAgentId,
        Export::AddAgentId,
        Export::Store,
        Export::Get,
        Export::GetAll,
        Export::MakeObject,
        Export::Assert,
        Export::NameFunction,
        Export::RenderAsciiTable,
        Export::MkAgent,
        Export::ApplyFixedArity,
    ];

    /// The name the host calls this function by.
    pub fn name(self) -> &'static str {
        match self {
            Export::GetNewAgentId => "getNewAgentId",
            Export::AddAgentId => "addAgentId",
            Export::Store => "store",
            Export::Get => "get",
            Export::GetAll => "getAll",
            Export::MakeObject => "makeObject",
            Export::Assert => "assert",
            Export::NameFunction => "nameFunction",
            Export::RenderAsciiTable => "renderAsciiTable",
            Export::MkAgent => "mkAgent",
            Export::ApplyFixedArity => "applyFixedArity",
        }
    }
}

impl fmt::Display for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Export {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Export::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| HostError::UnknownFunction(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// HostError
// ---------------------------------------------------------------------------

/// An error raised to the host. `Display` gives the message; [`code`] gives
/// a stable machine-readable kind.
///
/// [`code`]: HostError::code
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{0} is not an exported function")]
    UnknownFunction(String),

    #[error("{function}: argument {index} must be {expected}")]
    InvalidArgument {
        function: Export,
        index: usize,
        expected: &'static str,
    },

    #[error("{0} is not a function")]
    NotCallable(String),
}

/// Machine-readable error codes returned by [`HostError::code`].
pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const ASSERTION_FAILED: &str = "assertion_failed";
    pub const UNSUPPORTED_ARITY: &str = "unsupported_arity";
    pub const AGENT_IDS_EXHAUSTED: &str = "agent_ids_exhausted";
    pub const UNTAGGABLE_VALUE: &str = "untaggable_value";
    pub const INVALID_TABLE: &str = "invalid_table";
    pub const UNKNOWN_FUNCTION: &str = "unknown_function";
    pub const INVALID_ARGUMENT: &str = "invalid_argument";
    pub const NOT_CALLABLE: &str = "not_callable";
}

impl HostError {
    pub fn code(&self) -> &'static str {
        match self {
            HostError::Registry(_) => codes::NOT_FOUND,
            HostError::Core(CoreError::Assertion(_)) => codes::ASSERTION_FAILED,
            HostError::Core(CoreError::UnsupportedArity(_)) => codes::UNSUPPORTED_ARITY,
            HostError::Core(CoreError::UntaggableValue { .. }) => codes::UNTAGGABLE_VALUE,
            HostError::Core(CoreError::AgentIdsExhausted(_)) => codes::AGENT_IDS_EXHAUSTED,
            HostError::Core(CoreError::EmptyTable | CoreError::RaggedTable { .. }) => {
                codes::INVALID_TABLE
            }
            HostError::UnknownFunction(_) => codes::UNKNOWN_FUNCTION,
            HostError::InvalidArgument { .. } => codes::INVALID_ARGUMENT,
            HostError::NotCallable(_) => codes::NOT_CALLABLE,
        }
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Library state for one embedding interpreter.
///
/// Holds `Rc` handles, so it is confined to the thread that created it.
#[derive(Debug)]
pub struct Host {
    config: HostConfig,
    agents: AgentIdAllocator,
    registry: LiveRegistry,
}

impl Default for Host {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}

impl Host {
    pub fn new(config: HostConfig) -> Self {
        Self {
            agents: AgentIdAllocator::starting_after(config.agent_id_offset),
            registry: LiveRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn agents(&self) -> &AgentIdAllocator {
        &self.agents
    }

    pub fn registry(&self) -> &LiveRegistry {
        &self.registry
    }

    /// Call the export named `function` with positional `args`.
    ///
    /// Missing trailing arguments read as `undefined`; extra ones are ignored.
    pub fn call(&mut self, function: &str, args: &[Value]) -> Result<Value, HostError> {
        let export: Export = function.parse()?;
        tracing::trace!(function = %export, args = args.len(), "host call");
        let result = self.dispatch(export, args);
        if let Err(e) = &result {
            tracing::debug!(function = %export, code = e.code(), error = %e, "host call failed");
        }
        result
    }

    fn dispatch(&mut self, export: Export, args: &[Value]) -> Result<Value, HostError> {
        match export {
            Export::GetNewAgentId => Ok(self.agents.next_agent_id()?.into()),

            Export::AddAgentId => {
                let items = array_arg(export, args, 0)?;
                let id = agent_id_arg(export, args, 1)?;
                Ok(Value::array(tag_with_agent_id(&items, id)?))
            }

            Export::Store => {
                let type_name = string_arg(export, args, 0)?;
                let name = string_arg(export, args, 1)?;
                self.registry.store(type_name, name, arg(args, 2));
                Ok(Value::Undefined)
            }

            Export::Get => {
                let type_name = string_arg(export, args, 0)?;
                let name = string_arg(export, args, 1)?;
                Ok(self.registry.get(&type_name, &name)?)
            }

            Export::GetAll => {
                let type_name = string_arg(export, args, 0)?;
                Ok(self.registry.get_all(&type_name)?)
            }

            Export::MakeObject => Ok(make_object(&arg(args, 0), &arg(args, 1))),

            Export::Assert => {
                let message = match arg(args, 1) {
                    Value::Undefined => String::new(),
                    m => m.to_display_string(),
                };
                assert_invariant(arg(args, 0).is_truthy(), message)?;
                Ok(Value::Undefined)
            }

            Export::NameFunction => {
                let name = string_arg(export, args, 0)?;
                let f = function_arg(export, args, 1)?;
                let named = Value::function(HostFunction::Named(name_function(
                    name,
                    f.callable(),
                )));
                named.set_prop(NAMED_FN_PROP, arg(args, 1));
                Ok(named)
            }

            Export::RenderAsciiTable => {
                let rows = array_arg(export, args, 0)?
                    .iter()
                    .map(|row| {
                        row.array_items()
                            .ok_or_else(|| invalid(export, 0, "an array of arrays"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let table = render_ascii_table_padded(&rows, self.config.table_padding)?;
                Ok(Value::String(table))
            }

            Export::MkAgent => {
                let fields = arg(args, 0);
                let obj = fields
                    .as_object()
                    .ok_or_else(|| invalid(export, 0, "an object"))?;
                {
                    let mut obj = obj.borrow_mut();
                    if !matches!(obj.kind, ObjectKind::Plain | ObjectKind::Agent) {
                        return Err(invalid(export, 0, "a plain object"));
                    }
                    obj.kind = ObjectKind::Agent;
                    obj.props.insert(IS_AGENT_FIELD.to_string(), Value::Bool(true));
                }
                Ok(fields)
            }

            Export::ApplyFixedArity => {
                let f = function_arg(export, args, 0)?;
                let list_value = arg(args, 1);
                let list = match list_value.as_object() {
                    Some(obj) if matches!(obj.borrow().kind, ObjectKind::Array(_)) => {
                        Rc::clone(obj)
                    }
                    _ => return Err(invalid(export, 1, "an array")),
                };
                let bound = apply_fixed_arity(move |a: &[Value]| f.call(a), list)?;
                Ok(Value::function(HostFunction::new(move |_: &[Value]| bound())))
            }
        }
    }
}

// --- helpers -----------------------------------------------------------------

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

fn invalid(function: Export, index: usize, expected: &'static str) -> HostError {
    HostError::InvalidArgument {
        function,
        index,
        expected,
    }
}

fn string_arg(function: Export, args: &[Value], index: usize) -> Result<String, HostError> {
    arg(args, index)
        .as_string()
        .ok_or_else(|| invalid(function, index, "a string"))
}

fn array_arg(function: Export, args: &[Value], index: usize) -> Result<Vec<Value>, HostError> {
    arg(args, index)
        .array_items()
        .ok_or_else(|| invalid(function, index, "an array"))
}

fn function_arg(function: Export, args: &[Value], index: usize) -> Result<HostFunction, HostError> {
    arg(args, index)
        .as_function()
        .ok_or_else(|| invalid(function, index, "a function"))
}

fn agent_id_arg(function: Export, args: &[Value], index: usize) -> Result<AgentId, HostError> {
    match arg(args, index) {
        Value::Number(n) if n >= 1.0 && n <= MAX_AGENT_ID as f64 && n.fract() == 0.0 => {
            Ok(AgentId::new(n as u64))
        }
        _ => Err(invalid(function, index, "a positive integer agent id")),
    }
}

// A key array zips against the value array (a string value is indexed by
// character); a scalar key produces a one-entry object.
fn make_object(keys: &Value, values: &Value) -> Value {
    let props: Props = match keys.array_items() {
        Some(keys) => {
            let values = match values {
                Value::String(s) => s.chars().map(|c| Value::String(c.to_string())).collect(),
                other => other.array_items().unwrap_or_default(),
            };
            make_record(keys.iter().map(Value::to_display_string), values)
        }
        None => Props::from([(keys.to_display_string(), values.clone())]),
    };
    Value::plain(props)
}

// --- tests -------------------------------------------------------------------
