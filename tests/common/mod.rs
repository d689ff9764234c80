//! Common test utilities and helpers.
//!
//! - PDF fixtures with text at known positions
//! - transcript builders that place word boxes over that text
//! - assertions over the text layer of written PDFs

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
pub mod transcripts;

pub use assertions::*;
pub use fixtures::*;
pub use transcripts::*;

use std::sync::{Mutex, MutexGuard};

// MuPDF keeps global state; serialize every test that touches it.
static MUPDF_LOCK: Mutex<()> = Mutex::new(());

pub fn mupdf_lock() -> MutexGuard<'static, ()> {
    MUPDF_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
