//! Everything about file paths a document refers to.

use std::path::{Component, Path, PathBuf};

/// Suffix of the auxiliary preamble file, inserted before the main file's extension
pub const PREAMBLE_SUFFIX: &str = "_preamble";

#[derive(Debug, derive_more::From)]
pub enum VariantError {
    Io(std::io::Error), // missing permissions, or broken symbolic links
    #[from(ignore)]
    NotExist, // file does not in fact exist in the filesystem
    #[from(ignore)]
    NotAFile, // path resolves to a directory, not a file
}

impl std::fmt::Display for VariantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariantError::Io(err) => write!(f, "{err}"),
            VariantError::NotExist => f.write_str("does not exist"),
            VariantError::NotAFile => f.write_str("is not a file"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("{} is not inside the document folder {}", .path.display(), .folder.display())]
    NotUnderFolder { path: PathBuf, folder: PathBuf },
    #[error("{} is the document folder itself, not a file in it", .0.display())]
    EmptyRelative(PathBuf),
    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),
}

/// `report.tex` becomes `report_preamble.tex`, in the same folder
pub fn preamble_path(main_file: &Path) -> Result<PathBuf, PathError> {
    let stem = main_file
        .file_stem()
        .ok_or_else(|| PathError::NoFileName(main_file.to_owned()))?;
    let mut name = stem.to_os_string();
    name.push(PREAMBLE_SUFFIX);
    if let Some(extension) = main_file.extension() {
        name.push(".");
        name.push(extension);
    }
    Ok(main_file.with_file_name(name))
}

/// Path of `target` relative to `folder`, always written with `/`, as LaTeX wants it.
///
/// Fails if `target` is outside of `folder`, or is `folder` itself.
pub fn relative_reference(
    folder: &Path,
    target: &Path,
    strip_extension: bool,
) -> Result<String, PathError> {
    let relative = pathdiff::diff_paths(target, folder).ok_or_else(|| PathError::NotUnderFolder {
        path: target.to_owned(),
        folder: folder.to_owned(),
    })?;
    let relative = if strip_extension {
        relative.with_extension("")
    } else {
        relative
    };

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::NotUnderFolder {
                    path: target.to_owned(),
                    folder: folder.to_owned(),
                })
            }
        }
    }
    if parts.is_empty() {
        return Err(PathError::EmptyRelative(target.to_owned()));
    }
    Ok(parts.join("/"))
}

/// A graphic as the document will use it
#[derive(Debug)]
pub struct ResolvedGraphic {
    pub absolute: PathBuf,
    /// why the file can't be used, if it can't
    pub problem: Option<VariantError>,
}

pub trait PathEngine: std::fmt::Debug {
    /// Resolves a graphic given by the caller, relative paths against `folder`
    fn graphic(&self, folder: &Path, path: &Path) -> ResolvedGraphic;
}

pub use checked::Engine as CheckedEngine;
pub use primitive::Engine as PrimitiveEngine;

mod checked {
    use std::path::Path;

    use super::{PathEngine, ResolvedGraphic, VariantError};

    /// Resolves paths and checks the files are there
    #[derive(Debug, Default)]
    pub struct Engine;

    macro_rules! path_error {
        ($path:ident) => {
            match $path.try_exists() {
                Err(io) => Some(VariantError::Io(io)),
                Ok(false) => Some(VariantError::NotExist),
                Ok(true) if !$path.is_file() => Some(VariantError::NotAFile),
                Ok(true) => None,
            }
        };
    }

    impl PathEngine for Engine {
        fn graphic(&self, folder: &Path, path: &Path) -> ResolvedGraphic {
            let absolute = folder.join(path);
            let problem = path_error!(absolute);
            ResolvedGraphic { absolute, problem }
        }
    }
}

mod primitive {
    use std::path::Path;

    use super::{PathEngine, ResolvedGraphic};

    /// Takes every path as it is
    #[derive(Debug, Default)]
    pub struct Engine;

    impl PathEngine for Engine {
        fn graphic(&self, folder: &Path, path: &Path) -> ResolvedGraphic {
            ResolvedGraphic {
                absolute: folder.join(path),
                problem: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_next_to_main() {
        // arrange
        let main = Path::new("out/report.tex");

        // act
        let preamble = preamble_path(main).unwrap();

        // assert
        assert_eq!(preamble, Path::new("out/report_preamble.tex"));
    }

    #[test]
    fn preamble_without_extension() {
        let preamble = preamble_path(Path::new("report")).unwrap();
        assert_eq!(preamble, Path::new("report_preamble"));
    }

    #[test]
    fn relative_uses_forward_slashes() {
        // arrange
        let folder = Path::new("/doc");
        let target = Path::new("/doc/graphics/plots/ert.pdf");

        // act
        let with_extension = relative_reference(folder, target, false).unwrap();
        let without = relative_reference(folder, target, true).unwrap();

        // assert
        assert_eq!(with_extension, "graphics/plots/ert.pdf");
        assert_eq!(without, "graphics/plots/ert");
    }

    #[test]
    fn relative_outside_folder_fails() {
        let result = relative_reference(Path::new("/doc"), Path::new("/elsewhere/x.pdf"), false);
        assert!(matches!(result, Err(PathError::NotUnderFolder { .. })));
    }

    #[test]
    fn relative_to_itself_fails() {
        let result = relative_reference(Path::new("/doc"), Path::new("/doc"), false);
        assert!(matches!(result, Err(PathError::EmptyRelative(_))));
    }

    #[test]
    fn checked_engine_reports_missing() {
        // arrange
        let folder = tempfile::tempdir().unwrap();
        std::fs::write(folder.path().join("there.pdf"), b"%PDF").unwrap();

        // act
        let there = CheckedEngine.graphic(folder.path(), Path::new("there.pdf"));
        let missing = CheckedEngine.graphic(folder.path(), Path::new("missing.pdf"));
        let directory = CheckedEngine.graphic(folder.path(), Path::new("."));

        // assert
        assert!(there.problem.is_none());
        assert!(matches!(missing.problem, Some(VariantError::NotExist)));
        assert!(matches!(directory.problem, Some(VariantError::NotAFile)));
    }
}
