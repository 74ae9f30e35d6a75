//! # ics-core
//!
//! Pure-Rust decoder and encoder for **iCalendar (RFC 5545)** payloads, scoped to
//! what booking platforms actually publish: `VCALENDAR` containers holding
//! `VEVENT` records with all-day or timed boundaries.
//!
//! ## Quick start
//!
//! ```rust
//! use ics_core::{decode, encode};
//!
//! let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:1\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
//! let calendars = decode(ics).unwrap();
//! assert_eq!(calendars[0].children("VEVENT").count(), 1);
//! assert_eq!(encode(&calendars[0]).unwrap(), ics);
//! ```
//!
//! ## Modules
//!
//! - [`decoder`]: payload → [`Component`] tree, with per-line diagnostics
//! - [`encoder`]: [`Component`] tree → payload (CRLF, 75-octet folding)
//! - [`value`]: `DATE` / `DATE-TIME` interpretation
//! - [`types`]: [`Component`] and [`Property`]
//! - [`error`]: Error types

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod types;
pub mod value;

pub use decoder::{decode, decode_bytes, decode_with_diagnostics, Decoded, Diagnostic};
pub use encoder::{encode, escape_text};
pub use error::IcsError;
pub use types::{Component, Property};
pub use value::{date_property, format_date, parse_date, DateValue};
