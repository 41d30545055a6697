//! Pipeline stages for article-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step. Stages run
//! strictly in sequence within one conversion; only the rendering engine
//! is shared between conversions.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ extract ──▶ render
//! (HTTP)    (html5ever)  (Chromium → PDF)
//! ```
//!
//! 1. [`fetch`]    — download the page with status-classified retry/backoff;
//!    the only stage with network I/O
//! 2. [`extract`]  — locate title, byline and body in the parsed DOM
//! 3. [`sanitize`] — strip page chrome and presentation from the body
//! 4. [`render`]   — compose the print page and export it through the
//!    shared engine

pub mod extract;
pub mod fetch;
pub mod render;
pub mod sanitize;
