//! # stay-engine
//!
//! Reconciles several booking feeds for one rental property into a single
//! authoritative per-night availability calendar, honoring operator BLOCK /
//! UNBLOCK directives.
//!
//! The pipeline is deterministic: identical feeds, directives, configuration and
//! anchor date always produce byte-identical output.
//!
//! ## Modules
//!
//! - [`feed`]: booking feed payload → reservations
//! - [`dedup`]: collapse the same stay reported by several sources
//! - [`buffer`]: prep-time intervals around reservations
//! - [`directive`]: manual calendar → BLOCK / UNBLOCK directives
//! - [`resolver`]: one category per night, by fixed priority
//! - [`emitter`]: resolved nights → calendar payload
//! - [`pipeline`]: the synchronous end-to-end run over fetched payloads
//! - [`orchestrator`]: concurrent fetching, single-flight runs, persistence
//! - [`editor`]: single-night edits of the manual calendar
//! - [`source`] / [`store`]: fetch and storage boundaries
//! - [`config`], [`model`], [`error`]

pub mod buffer;
pub mod config;
pub mod dedup;
pub mod directive;
pub mod editor;
pub mod emitter;
pub mod error;
pub mod feed;
pub mod model;
pub mod orchestrator;
pub mod pipeline;
pub mod resolver;
pub mod source;
pub mod store;

pub use buffer::expand_buffers;
pub use config::{FeedConfig, SyncConfig};
pub use dedup::{deduplicate, Deduplicated};
pub use directive::{parse_directives, ParsedDirectives};
pub use editor::DirectiveBook;
pub use emitter::{emit_import, emit_master, night_runs, CalendarMeta, NightRun};
pub use error::SyncError;
pub use feed::{parse_feed, ParsedFeed};
pub use model::{
    BufferInterval, BufferKind, Directive, DirectiveKind, Label, NightCategory, NightState,
    Reservation, ResolutionWindow, Source,
};
pub use orchestrator::{fetch_all, FetchMode, Reconciler};
pub use pipeline::{reconcile_payloads, Counts, FeedPayload, Reconciliation, RunError, RunInputs};
pub use resolver::{block_applies_to, resolve, unblock_applies_to, NightMap, Resolution};
pub use source::{FeedSource, FileFeed};
pub use store::{CalendarStore, FileStore, MemoryStore, StoreKey};
