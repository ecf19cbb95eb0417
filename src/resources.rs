//! Setup snippets and style packages shipped inside the library.
//!
//! `.tex` snippets are written straight into the preamble, `.sty` packages are copied next to
//! the document and required from there.

use std::{
    collections::HashMap,
    fmt::{self, Write},
    fs,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;

use crate::toolchain::{Dependency, FileType};

pub const FONT_SETUP: &str = "fontSetup.tex";
pub const COLOR_SETUP: &str = "colorSetup.tex";
pub const TABLE_SETUP: &str = "tableSetup.tex";
pub const LISTING_SETUP: &str = "listingSetup.tex";
pub const FIGURE_SERIES: &str = "figureSeries.sty";
pub const TEXT_UNDERLINE: &str = "textUnderline.sty";
pub const ORDINAL_COUNTER: &str = "ordinalCounter.sty";
pub const ALPHA_COUNTER: &str = "alphaCounter.sty";

const BUNDLED_LICENSE: &str =
    "The bundled LaTeX packages are distributed under the LaTeX Project Public License 1.3c.";

#[derive(Debug)]
pub struct Resource {
    pub name: &'static str,
    /// shown once when the resource is copied into a document folder
    pub license: Option<&'static str>,
    pub text: String,
}

static BUNDLE: Lazy<HashMap<&'static str, Resource>> = Lazy::new(|| {
    macro_rules! bundled {
        ($($name:ident => $file:literal, $license:expr;)*) => {
            [$(Resource {
                name: $name,
                license: $license,
                text: reprocess(include_str!(concat!("bundled/", $file))),
            }),*]
        };
    }

    bundled! {
        FONT_SETUP => "fontSetup.tex", None;
        COLOR_SETUP => "colorSetup.tex", None;
        TABLE_SETUP => "tableSetup.tex", None;
        LISTING_SETUP => "listingSetup.tex", None;
        FIGURE_SERIES => "figureSeries.sty", Some(BUNDLED_LICENSE);
        TEXT_UNDERLINE => "textUnderline.sty", Some(BUNDLED_LICENSE);
        ORDINAL_COUNTER => "ordinalCounter.sty", Some(BUNDLED_LICENSE);
        ALPHA_COUNTER => "alphaCounter.sty", Some(BUNDLED_LICENSE);
    }
    .into_iter()
    .map(|resource| (resource.name, resource))
    .collect()
});

pub fn resource(name: &str) -> Option<&'static Resource> {
    BUNDLE.get(name)
}

/// Trims every line and drops the empty ones.
///
/// A line ending in `%` continues on the next one, so that `%` is kept even if it was
/// followed by whitespace.
pub fn reprocess(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        result.push_str(line);
        result.push('\n');
    }
    result
}

/// Writes a bundled snippet into the preamble
pub fn write_snippet<W: Write + ?Sized>(name: &str, output: &mut W) -> fmt::Result {
    match resource(name) {
        Some(resource) => output.write_str(&resource.text),
        None => {
            log::warn!("Bundled snippet {name} is missing, skipping it");
            Ok(())
        }
    }
}

/// Package name a `.sty` resource is required by
pub fn package_name(name: &str) -> &str {
    name.strip_suffix(".sty").unwrap_or(name)
}

/// Copies bundled packages into a document folder, remembering what the document now depends on
#[derive(Debug)]
pub struct ResourceCopier<'d> {
    folder: PathBuf,
    dependencies: &'d mut Vec<Dependency>,
    /// licenses of everything copied so far, each once
    licenses: Vec<&'static str>,
}

impl<'d> ResourceCopier<'d> {
    pub fn new(folder: impl Into<PathBuf>, dependencies: &'d mut Vec<Dependency>) -> Self {
        Self {
            folder: folder.into(),
            dependencies,
            licenses: Vec::new(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Copies every named resource. Returns the ones that ended up in the folder
    /// (including those that already were there); failures are logged and skipped.
    pub fn copy(&mut self, names: &[&str]) -> Vec<&'static str> {
        let mut available = Vec::with_capacity(names.len());

        for &name in names {
            let Some(resource) = resource(name) else {
                log::warn!("Bundled resource {name} is missing, documents requiring it won't compile");
                continue;
            };
            let destination = self.folder.join(resource.name);
            match destination.try_exists() {
                Ok(true) => {
                    log::warn!(
                        "{} already exists, assuming it was put there on purpose",
                        destination.display()
                    );
                }
                Ok(false) => {
                    if let Err(err) = fs::write(&destination, &resource.text) {
                        log::warn!("Could not copy {name} to {}: {err}", destination.display());
                        continue;
                    }
                    log::debug!("Copied {name} to {}", destination.display());
                    if let Some(license) = resource.license {
                        if !self.licenses.contains(&license) {
                            self.licenses.push(license);
                        }
                    }
                }
                Err(err) => {
                    log::warn!("Could not check {}: {err}", destination.display());
                    continue;
                }
            }
            self.register(destination);
            available.push(resource.name);
        }
        available
    }

    /// Logs the licenses of the copied packages, once for all [`copy`](Self::copy) calls,
    /// and returns them
    pub fn finish(self) -> Vec<&'static str> {
        if !self.licenses.is_empty() {
            log::info!("{}", self.licenses.join("\n"));
        }
        self.licenses
    }

    fn register(&mut self, path: PathBuf) {
        if !self.dependencies.iter().any(|dep| dep.path == path) {
            self.dependencies.push(Dependency {
                path,
                kind: FileType::Style,
            });
        }
    }
}
