//! Support library for Rational Speech Act models written in WebPPL.
//!
//! Models running inside the WebPPL interpreter call into this crate to
//! allocate agent identities, tag utterances with the agent that produced
//! them, file named objects (agents, priors, named functions) in a registry,
//! and render small text tables. Everything is synchronous and in memory;
//! there is **no I/O**, so the crate compiles to native Rust and to
//! WebAssembly unchanged.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`identity`] | [`AgentIdAllocator`], [`AgentId`], and [`tag_with_agent_id`] |
//! | [`registry`] | [`Registry`]: two-level (type, name) → value store; [`LiveRegistry`] for host values |
//! | [`record`] | [`make_record`], [`AgentRecord`], and the [`Displayable`] capability |
//! | [`function`] | [`NamedFunction`] and [`apply_fixed_arity`] |
//! | [`render`] | [`render_ascii_table`] |
//! | [`value`] | [`Value`]: the dynamic value model of the hosting DSL |
//! | [`host`] | [`Host`]: by-name call surface over all of the above |
//! | [`config`] | [`HostConfig`] |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use webppl_rsa::{AgentIdAllocator, Registry};
//!
//! let mut agents = AgentIdAllocator::new();
//! let mut registry = Registry::new();
//!
//! let speaker = agents.next_agent_id()?;   // 1
//! let listener = agents.next_agent_id()?;  // 2
//! registry.store("agent", "speaker", speaker);
//! registry.store("agent", "listener", listener);
//!
//! assert_eq!(registry.get("agent", "listener")?, &listener);
//! assert!(registry.get("agent", "pragmatic").is_err());
//! ```
//!
//! The library never installs a `tracing` subscriber; events at `trace` and
//! `debug` level are emitted for the embedding program to collect.

pub mod config;
pub mod error;
pub mod function;
pub mod host;
pub mod identity;
pub mod record;
pub mod registry;
pub mod render;
pub mod value;

pub use config::HostConfig;
pub use error::{assert_invariant, CoreError};
pub use function::{apply_fixed_arity, name_function, ArgList, NamedFunction, NAMED_FN_PROP};
pub use host::{Export, Host, HostError};
pub use identity::{
    tag_with_agent_id, AgentId, AgentIdAllocator, AGENT_ID_PROP, MAX_AGENT_ID,
};
pub use record::{make_record, mk_agent_record, AgentRecord, Displayable, IS_AGENT_FIELD};
pub use registry::{LiveRegistry, Registry, RegistryError};
pub use render::{render_ascii_table, render_ascii_table_padded};
pub use value::{HostFunction, Object, ObjectKind, Props, Value};
