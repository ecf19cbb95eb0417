//! Process-wide settings, resolved once at startup and handed to every document.

use std::{path::PathBuf, sync::Arc};

use smart_default::SmartDefault;

use crate::toolchain::{LatexToolchain, Toolchain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GraphicFormat {
    #[default]
    Pdf,
    Png,
    Jpeg,
    /// needs the `latex` + `dvips` route, where long URLs don't break by themselves
    Eps,
}

impl GraphicFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(GraphicFormat::Pdf),
            "png" => Some(GraphicFormat::Png),
            "jpg" | "jpeg" => Some(GraphicFormat::Jpeg),
            "eps" => Some(GraphicFormat::Eps),
            _ => None,
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            GraphicFormat::Pdf => "pdf",
            GraphicFormat::Png => "png",
            GraphicFormat::Jpeg => "jpg",
            GraphicFormat::Eps => "eps",
        }
    }

    pub const fn needs_url_breaking(self) -> bool {
        matches!(self, GraphicFormat::Eps)
    }
}

#[derive(Debug, Clone, PartialEq, SmartDefault)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToolchainConfig {
    #[default("pdflatex".to_owned())]
    pub program: String,
    /// run after the first pass when the document cites anything
    #[default(Some("bibtex".to_owned()))]
    pub bibtex: Option<String>,
    /// compiler passes, so references settle
    #[default(2)]
    pub passes: usize,
}

#[derive(Debug, Clone, PartialEq, SmartDefault)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    pub graphic_format: GraphicFormat,
    /// whether finishing a document also compiles it
    pub compile: bool,
    pub toolchain: ToolchainConfig,
    /// BibTeX database for citations, relative to the document folder
    pub bibliography: Option<PathBuf>,
    #[default("plain".to_owned())]
    pub bibliography_style: String,
}

/// Something that may not be there on this machine
#[derive(Clone)]
pub enum Availability<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> std::fmt::Debug for Availability<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::Available(_) => f.write_str("Available"),
            Availability::Unavailable { reason } => write!(f, "Unavailable ({reason})"),
        }
    }
}

impl<T> Availability<T> {
    pub fn as_available(&self) -> Option<&T> {
        match self {
            Availability::Available(t) => Some(t),
            Availability::Unavailable { .. } => None,
        }
    }
}

/// [`Config`] with everything looked up that has to be looked up on this machine
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    pub toolchain: Availability<Arc<dyn Toolchain>>,
}

impl Config {
    /// Looks up the external toolchain. Never fails: a missing compiler is recorded as such.
    pub fn resolve(self) -> ResolvedConfig {
        let toolchain = if self.compile {
            match LatexToolchain::discover(&self.toolchain) {
                Availability::Available(toolchain) => {
                    Availability::Available(Arc::new(toolchain) as Arc<dyn Toolchain>)
                }
                Availability::Unavailable { reason } => {
                    log::warn!("Documents will not be compiled: {reason}");
                    Availability::Unavailable { reason }
                }
            }
        } else {
            Availability::Unavailable {
                reason: "compilation was not requested".to_owned(),
            }
        };
        ResolvedConfig {
            config: self,
            toolchain,
        }
    }

    /// Resolves with a toolchain supplied by the caller
    pub fn resolve_with(self, toolchain: Arc<dyn Toolchain>) -> ResolvedConfig {
        ResolvedConfig {
            config: self,
            toolchain: Availability::Available(toolchain),
        }
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Config::default().resolve()
    }
}
