//! # Cmdr Architecture
//!
//! Cmdr is a **command routing and argument parsing library**. This is not a
//! CLI application that happens to have some library code—it's an engine a
//! CLI binary plugs its commands into.
//!
//! ## The layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Binary (main.rs)                                           │
//! │  - Collects argv, registers commands, renders errors        │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Invoker (api.rs)                                           │
//! │  - Owns the registry, parses argv, dispatches to handlers   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine (registry.rs, parser.rs)                            │
//! │  - Staged registration compiled into a routing table        │
//! │  - Token state machine over a command's option schema       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Data (types.rs, option.rs, value.rs, arguments.rs)         │
//! │  - Type masks, option descriptors, tagged values, results   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Registration is a two-phase commit
//!
//! Command methods are *staged* first (`register_method`), then *claimed and
//! validated* when their handler commits (`register_handler`). This mirrors
//! declaration environments where method-level registration side effects run
//! before the enclosing group's, so the method↔handler relationship can only
//! be checked at commit time. The commit composes the final route keys
//! (`create`/`c` × `component`/`c` → `create-component`/`cc`) and rejects
//! every collision—nothing is ever silently overwritten.
//!
//! ## Parsing is deterministic
//!
//! One `parse()` call resolves the command from the leading token, pre-scans
//! single-dash flag groups, then consumes the rest: `--option` tokens with
//! type-directed value coercion, positionals in declaration order, and an
//! optional trailing args collector behind a literal `--`. Coercion tries
//! value kinds in a fixed priority order so `"1"` against an
//! integer-or-boolean option is always the integer `1`.
//!
//! ## Key principle: no I/O in the core
//!
//! From `api.rs` inward, code takes regular Rust arguments, returns
//! `Result`, and never touches stdout/stderr or the process lifecycle.
//!
//! ## Module overview
//!
//! - [`api`]: The invoker facade—parse and dispatch
//! - [`registry`]: Staged registration and the routing table
//! - [`parser`]: The argv state machine
//! - [`arguments`]: Immutable parse results
//! - [`option`]: Option descriptors and their validation
//! - [`value`]: Tagged values and coercion
//! - [`types`]: Type masks and token grammars
//! - [`error`]: Error types

pub mod api;
pub mod arguments;
pub mod error;
pub mod option;
pub mod parser;
pub mod registry;
pub mod types;
pub mod value;
