//! Definition lookup for PMD music macro language.
//!
//! Given a document and a position, [`query::Lookup`] finds the line that
//! defines the instrument (`@12`) or variable (`!lead`) referenced there,
//! following `#Include` and `#FFFile` directives across files. SSG envelope
//! and rhythm parts are answered from fixed tables in [`tables`].

pub mod config;
pub mod diagnostics;
pub mod directive;
pub mod document;
pub mod error;
pub mod instrument;
pub mod logging;
pub mod number;
pub mod query;
pub mod tables;
pub mod types;
pub mod variable;
pub mod walker;
