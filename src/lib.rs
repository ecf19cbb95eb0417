//! *Write the body first, worry about the preamble later.*
//!
//! This crate writes LaTeX documents out of a generic document model: sections, tables,
//! figures and figure series, code, math, citations, and styled text.
//!
//! # Ideology
//! A document is never stored as a tree. Elements are opened and closed in stack order on a
//! [`Document`], and every open or close immediately writes its markup into the body. That means
//! the body can go straight into a file, through any [`std::fmt::Write`] sink.
//!
//! The catch is the preamble: which packages a document needs is only known once the whole body
//! has been written. So each element declares which optional features it uses (see [`flags`]),
//! the document collects them, and when it is [finished](Document::finish) the preamble gets
//! written into a separate file that the main one `\input`s. Only what was actually used ends up
//! in there.
//!
//! Turning the result into a PDF is left to an external LaTeX installation (see [`toolchain`]).
//! If that fails, the document is still there, and you'll get a warning about it.
//!
//! ### Experiments
//! The [`experiment`] module loads benchmark results (dimensions, instances, and log files of
//! runs) that documents are usually written about.
//!
//! ```no_run
//! use texdoc::{Config, DocumentBuilder, DocumentClass, Element};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut document = DocumentBuilder::new()
//!     .class(DocumentClass::article())
//!     .main_file("out/report.tex")
//!     .config(Config::default().resolve())
//!     .build()?;
//! let section = document.open(Element::Section { label: None })?;
//! document.with(Element::SectionTitle, |d| d.text("Results"))?;
//! document.text("Nothing to see yet.")?;
//! document.close(section)?;
//! let report = document.finish()?;
//! println!("preamble is at {}", report.preamble_file.display());
//! # Ok(())
//! # }
//! ```

pub mod class;
pub mod config;
/// Types describing document elements and the values they carry
pub mod data;
pub mod document;
pub mod experiment;
pub mod flags;
pub mod gen;
pub mod path_engine;
pub mod resources;
pub mod toolchain;
/// This module houses "utility-like" writers
pub mod util;

/// Reexports
pub use class::{DocumentClass, SectionLevel};
pub use config::{Config, GraphicFormat, ResolvedConfig};
pub use data::{
    Alignment, CellSpan, ColorStyle, Element, ElementKind, FloatSize, Label, MathSymbol,
    ReferenceMode, TextStyle,
};
pub use document::{BuildError, Document, DocumentBuilder, DocumentReport, ElementHandle};
pub use flags::{Feature, UsageFlags};
pub use gen::GenerationError;
pub use toolchain::{Dependency, FileType, LatexToolchain, Toolchain, ToolchainError};
