//! Client-side exchange state.
//!
//! The front end owns a [`MessageStore`] (per-message text/audio
//! lifecycle plus the shared current-expression slot) and drives it
//! through an [`ExchangeReader`], which turns raw network chunks into
//! typed events. Transport is the caller's concern; these types never
//! touch the network.

pub mod exchange;
pub mod messages;

pub use exchange::{CaptionRotator, ExchangeReader};
pub use messages::{AudioStatus, ExchangeHandle, Message, MessageStore, APOLOGY_TEXT};
