//! Turning a finished document into a PDF with an external LaTeX installation.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
};

use crate::config::{Availability, GraphicFormat, ToolchainConfig};

/// What a file the document depends on is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// the main document
    Tex,
    /// markup pulled in with `\input`, like the preamble
    TexInclude,
    Style,
    Bibliography,
    Graphic(GraphicFormat),
}

impl FileType {
    /// Whether the toolchain needs to be told about files of this type
    pub const fn is_toolchain_input(self) -> bool {
        matches!(
            self,
            FileType::TexInclude | FileType::Style | FileType::Bibliography | FileType::Graphic(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub path: PathBuf,
    pub kind: FileType,
}

#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    #[error("Could not run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} failed with {status}:\n{log}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        log: String,
    },
    #[error("{} is needed for compilation, but is missing", .0.display())]
    MissingInput(PathBuf),
    #[error("{} doesn't name a file to compile", .0.display())]
    NotAFile(PathBuf),
}

pub trait Toolchain: std::fmt::Debug + Send + Sync {
    /// Compiles `main_file`. `dependencies` is what the document registered, the toolchain
    /// picks what concerns it. Returns whether the final artifact was produced.
    fn compile(&self, main_file: &Path, dependencies: &[Dependency]) -> Result<bool, ToolchainError>;
}

/// `pdflatex`, optionally `bibtex`, then `pdflatex` again until references settle
#[derive(Debug, Clone)]
pub struct LatexToolchain {
    program: PathBuf,
    bibtex: Option<PathBuf>,
    passes: usize,
}

/// Looks `program` up on `PATH`, unless it already is a path
/// Folder holding `main_file`; a bare file name lives in the working directory
pub fn document_folder(main_file: &Path) -> &Path {
    main_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

fn find_executable(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_owned());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).find_map(|folder| {
        let candidate = folder.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        let candidate = candidate.with_extension(std::env::consts::EXE_EXTENSION);
        candidate.is_file().then_some(candidate)
    })
}

impl LatexToolchain {
    /// Finds the configured executables once. A missing compiler makes the toolchain unavailable,
    /// a missing `bibtex` only disables bibliographies.
    pub fn discover(config: &ToolchainConfig) -> Availability<Self> {
        let Some(program) = find_executable(&config.program) else {
            return Availability::Unavailable {
                reason: format!("{} was not found on PATH", config.program),
            };
        };
        let bibtex = config.bibtex.as_deref().and_then(|bibtex| {
            let found = find_executable(bibtex);
            if found.is_none() {
                log::warn!("{bibtex} was not found on PATH, bibliographies won't be built");
            }
            found
        });
        log::debug!("Using {} for compilation", program.display());
        Availability::Available(Self {
            program,
            bibtex,
            passes: config.passes.max(1),
        })
    }

    fn run(&self, program: &Path, folder: &Path, args: &[&OsStr]) -> Result<(), ToolchainError> {
        let name = program.display().to_string();
        log::debug!("Running {name} in {}", folder.display());
        let output = Command::new(program)
            .args(args)
            .current_dir(folder)
            .output()
            .map_err(|source| ToolchainError::Spawn {
                program: name.clone(),
                source,
            })?;
        if output.status.success() {
            return Ok(());
        }
        // LaTeX reports on stdout, the tail is where the actual error is
        let log = String::from_utf8_lossy(&output.stdout);
        let tail: Vec<&str> = log.lines().rev().take(20).collect();
        Err(ToolchainError::Failed {
            program: name,
            status: output.status,
            log: tail.into_iter().rev().collect::<Vec<_>>().join("\n"),
        })
    }
}

impl Toolchain for LatexToolchain {
    fn compile(&self, main_file: &Path, dependencies: &[Dependency]) -> Result<bool, ToolchainError> {
        let folder = document_folder(main_file);
        let file_name = main_file
            .file_name()
            .ok_or_else(|| ToolchainError::NotAFile(main_file.to_owned()))?;
        let inputs = dependencies.iter().filter(|dep| dep.kind.is_toolchain_input());
        for dependency in inputs.clone() {
            if !dependency.path.is_file() {
                return Err(ToolchainError::MissingInput(dependency.path.clone()));
            }
        }

        let interaction = OsStr::new("-interaction=nonstopmode");
        let halt = OsStr::new("-halt-on-error");
        let latex_args = [interaction, halt, file_name];
        self.run(&self.program, folder, &latex_args)?;

        let cites = inputs.clone().any(|dep| dep.kind == FileType::Bibliography);
        if let (true, Some(bibtex)) = (cites, self.bibtex.as_deref()) {
            let stem = main_file.file_stem().unwrap_or(file_name);
            self.run(bibtex, folder, &[stem])?;
        }
        for _ in 1..self.passes {
            self.run(&self.program, folder, &latex_args)?;
        }

        Ok(main_file.with_extension("pdf").is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolchain_inputs() {
        assert!(FileType::Graphic(GraphicFormat::Png).is_toolchain_input());
        assert!(FileType::TexInclude.is_toolchain_input());
        assert!(!FileType::Tex.is_toolchain_input());
    }

    #[test]
    fn missing_program_not_found() {
        assert!(find_executable("surely-no-such-latex-compiler").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn finds_explicit_path() {
        // arrange
        let folder = tempfile::tempdir().unwrap();
        let program = folder.path().join("fakelatex");
        std::fs::write(&program, "#!/bin/sh\n").unwrap();

        // act
        let found = find_executable(program.to_str().unwrap());

        // assert
        assert_eq!(found, Some(program));
    }

    #[test]
    fn missing_input_is_reported() {
        // arrange
        let folder = tempfile::tempdir().unwrap();
        let toolchain = LatexToolchain {
            program: PathBuf::from("surely-no-such-latex-compiler"),
            bibtex: None,
            passes: 1,
        };
        let dependencies = [Dependency {
            path: folder.path().join("plot.pdf"),
            kind: FileType::Graphic(GraphicFormat::Pdf),
        }];

        // act
        let result = toolchain.compile(&folder.path().join("main.tex"), &dependencies);

        // assert
        assert!(matches!(result, Err(ToolchainError::MissingInput(_))));
    }

    #[test]
    fn spawn_failure_is_an_error() {
        // arrange
        let folder = tempfile::tempdir().unwrap();
        let toolchain = LatexToolchain {
            program: PathBuf::from("surely-no-such-latex-compiler"),
            bibtex: None,
            passes: 1,
        };

        // act
        let result = toolchain.compile(&folder.path().join("main.tex"), &[]);

        // assert
        assert!(matches!(result, Err(ToolchainError::Spawn { .. })));
    }

    #[test]
    fn bare_file_name_compiles_in_working_directory() {
        assert_eq!(document_folder(Path::new("report.tex")), Path::new("."));
        assert_eq!(document_folder(Path::new("out/report.tex")), Path::new("out"));
        assert_eq!(document_folder(Path::new("/report.tex")), Path::new("/"));
    }

    #[cfg(unix)]
    #[test]
    fn bare_file_name_runs_the_program() {
        // arrange
        let Some(program) = find_executable("true") else {
            return;
        };
        let toolchain = LatexToolchain {
            program,
            bibtex: None,
            passes: 2,
        };

        // act
        let result = toolchain.compile(Path::new("texdoc-no-such-report.tex"), &[]);

        // assert
        assert!(matches!(result, Ok(false)), "{result:?}");
    }
}
