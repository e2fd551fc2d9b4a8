//! # Formats Module
//!
//! Binary encoding for stored records.
//!
//! This module contains:
//! - the record envelope (format version byte + postcard body)
//!
//! Note: the store itself only sees opaque bytes. Everything that knows how a
//! record is laid out lives here.

mod persistence;

pub use persistence::*;
