//! Loading a whole experiment set: definitions first, then every log file under a folder.
//!
//! The folder is laid out as `<root>/<experiment>/<instance>/<run>.txt`. Every step is
//! attempted even if an earlier one failed; all failures are reported together.

use std::{
    fs,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use super::{
    log_scan::{scan, RunBuilder, ScanError},
    DefinitionError, Experiment, ExperimentSet, ExperimentSetBuilder,
};

/// Extensions of files holding runs
const RUN_EXTENSIONS: [&str; 2] = ["txt", "log"];

/// Walk depths of the folder layout below the root
const EXPERIMENT_DEPTH: usize = 1;
const INSTANCE_DEPTH: usize = 2;
const RUN_DEPTH: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum LoadFailure {
    #[error("Dimension setup: {0}")]
    Dimensions(DefinitionError),
    #[error("Instance setup: {0}")]
    Instances(DefinitionError),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Scan { path: PathBuf, source: ScanError },
    #[error("{}: there is no instance named {name}", .path.display())]
    UnknownInstance { path: PathBuf, name: String },
}

impl LoadFailure {
    fn walk(root: &Path, err: walkdir::Error) -> Self {
        LoadFailure::Io {
            path: err.path().unwrap_or(root).to_owned(),
            source: err.into(),
        }
    }
}

/// Everything that went wrong during one [`ExperimentLoader::load`]
#[derive(Debug, thiserror::Error)]
#[error("{} problems while loading experiments:\n{}", .failures.len(), .failures.iter().map(|f| f.to_string()).collect::<Vec<_>>().join("\n"))]
pub struct LoadError {
    pub failures: Vec<LoadFailure>,
}

type Setup = Box<dyn FnOnce(&mut ExperimentSetBuilder) -> Result<(), DefinitionError>>;

pub struct ExperimentLoader {
    root: PathBuf,
    dimensions: Option<Setup>,
    instances: Option<Setup>,
}

impl std::fmt::Debug for ExperimentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExperimentLoader")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_run_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| RUN_EXTENSIONS.contains(&ext))
}

impl ExperimentLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dimensions: None,
            instances: None,
        }
    }

    /// Declares the dimensions, through [`ExperimentSetBuilder::create_dimension`]
    pub fn dimensions<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut ExperimentSetBuilder) -> Result<(), DefinitionError> + 'static,
    {
        self.dimensions = Some(Box::new(setup));
        self
    }

    /// Declares the instances, through [`ExperimentSetBuilder::create_instance`]
    pub fn instances<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut ExperimentSetBuilder) -> Result<(), DefinitionError> + 'static,
    {
        self.instances = Some(Box::new(setup));
        self
    }

    pub fn load(self) -> Result<ExperimentSet, LoadError> {
        let mut builder = ExperimentSetBuilder::new();
        let mut failures = Vec::new();

        if let Some(setup) = self.dimensions {
            if let Err(err) = setup(&mut builder) {
                failures.push(LoadFailure::Dimensions(err));
            }
        }
        if let Some(setup) = self.instances {
            if let Err(err) = setup(&mut builder) {
                failures.push(LoadFailure::Instances(err));
            }
        }

        let mut experiment: Option<Experiment> = None;
        let mut entries = WalkDir::new(&self.root)
            .follow_links(false)
            .min_depth(EXPERIMENT_DEPTH)
            .max_depth(RUN_DEPTH)
            .sort_by_file_name()
            .into_iter();
        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    failures.push(LoadFailure::walk(&self.root, err));
                    continue;
                }
            };
            let path = entry.path();
            match entry.depth() {
                EXPERIMENT_DEPTH if entry.file_type().is_dir() => {
                    if let Some(done) = experiment.take() {
                        finish_experiment(&mut builder, done);
                    }
                    experiment = Some(Experiment {
                        name: file_name(path),
                        runs: Vec::new(),
                    });
                }
                INSTANCE_DEPTH if entry.file_type().is_dir() => {
                    let name = file_name(path);
                    if !builder.instances().iter().any(|known| known.name == name) {
                        failures.push(LoadFailure::UnknownInstance {
                            path: path.to_owned(),
                            name,
                        });
                        entries.skip_current_dir();
                    }
                }
                RUN_DEPTH if entry.file_type().is_file() && is_run_file(path) => {
                    let Some(experiment) = experiment.as_mut() else {
                        continue;
                    };
                    let instance = path.parent().map(file_name).unwrap_or_default();
                    let text = match fs::read_to_string(path) {
                        Ok(text) => text,
                        Err(source) => {
                            failures.push(LoadFailure::Io {
                                path: path.to_owned(),
                                source,
                            });
                            continue;
                        }
                    };
                    let mut run = RunBuilder::new(builder.dimensions(), instance.as_str());
                    match scan(&text, &mut run) {
                        Ok(()) => experiment.runs.push(run.finish()),
                        Err(source) => failures.push(LoadFailure::Scan {
                            path: path.to_owned(),
                            source,
                        }),
                    }
                }
                // stray files next to experiment or instance folders
                _ => {}
            }
        }
        if let Some(done) = experiment.take() {
            finish_experiment(&mut builder, done);
        }

        if failures.is_empty() {
            let set = builder.build();
            log::info!(
                "Loaded {} experiments with {} runs from {}",
                set.experiments.len(),
                set.experiments.iter().map(|e| e.runs.len()).sum::<usize>(),
                self.root.display()
            );
            Ok(set)
        } else {
            Err(LoadError { failures })
        }
    }
}

fn finish_experiment(builder: &mut ExperimentSetBuilder, experiment: Experiment) {
    log::debug!(
        "Experiment {} has {} runs",
        experiment.name,
        experiment.runs.len()
    );
    builder.add_experiment(experiment);
}

#[cfg(test)]
mod tests {
    use crate::experiment::NumberParser;

    use super::*;

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn loader(root: &Path) -> ExperimentLoader {
        ExperimentLoader::new(root)
            .dimensions(|builder| {
                let mut fes = builder.create_dimension();
                fes.name("FEs").parser(NumberParser::POSITIVE_INTEGER);
                fes.close()?;
                let mut f = builder.create_dimension();
                f.name("f").parser(NumberParser::NON_NEGATIVE_FLOAT);
                f.close()
            })
            .instances(|builder| {
                let mut eil51 = builder.create_instance();
                eil51.name("eil51").feature("n", 51, None);
                eil51.close()
            })
    }

    const RUN: &str = "SECTION_LOG_DATA\n1 600\n20 430\nSECTION_END\nSECTION_PARAMETERS\nseed: 1\nSECTION_END\n";

    #[test]
    fn loads_folder() {
        // arrange
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "ea/eil51/run1.txt", RUN);
        write(root.path(), "ea/eil51/run2.txt", RUN);
        write(root.path(), "ea/eil51/notes.md", "not a run");
        write(root.path(), "rls/eil51/run1.log", RUN);

        // act
        let set = loader(root.path()).load().unwrap();

        // assert
        assert_eq!(set.dimensions.len(), 2);
        assert_eq!(set.experiments.len(), 2);
        assert_eq!(set.experiments[0].name, "ea");
        assert_eq!(set.experiments[0].runs.len(), 2);
        assert_eq!(set.experiments[1].runs[0].points.len(), 2);
    }

    #[test]
    fn failures_are_aggregated() {
        // arrange
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "ea/eil51/good.txt", RUN);
        write(root.path(), "ea/eil51/bad.txt", "SECTION_LOG_DATA\n1\nSECTION_END\n");
        write(root.path(), "ea/kroA100/run.txt", RUN);
        let loader = loader(root.path()).instances(|builder| {
            let mut eil51 = builder.create_instance();
            eil51.name("eil51");
            eil51.close()?;
            builder.create_instance().close()
        });

        // act
        let err = loader.load().unwrap_err();

        // assert
        assert_eq!(err.failures.len(), 3, "{err}");
        assert!(err.failures.iter().any(|f| matches!(f, LoadFailure::Instances(_))));
        assert!(err.failures.iter().any(|f| matches!(f, LoadFailure::Scan { .. })));
        assert!(err
            .failures
            .iter()
            .any(|f| matches!(f, LoadFailure::UnknownInstance { name, .. } if name == "kroA100")));
    }

    #[test]
    fn layout_is_walked_in_name_order() {
        // arrange
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "README.md", "results of the ea and rls");
        write(root.path(), "rls/eil51/b.txt", RUN);
        write(root.path(), "rls/eil51/a.log", RUN);
        write(root.path(), "rls/notes.txt", RUN);
        write(root.path(), "ea/eil51/deeper/run.txt", RUN);
        write(root.path(), "ea/eil51/run.txt", RUN);

        // act
        let set = loader(root.path()).load().unwrap();

        // assert
        let names: Vec<_> = set.experiments.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["ea", "rls"]);
        assert_eq!(set.experiments[0].runs.len(), 1);
        assert_eq!(set.experiments[1].runs.len(), 2);
        assert!(set.experiments[1].runs.iter().all(|run| run.instance == "eil51"));
    }

    #[test]
    fn missing_root() {
        // arrange
        let root = tempfile::tempdir().unwrap();

        // act
        let err = loader(&root.path().join("nothing")).load().unwrap_err();

        // assert
        assert!(matches!(err.failures.as_slice(), [LoadFailure::Io { .. }]));
    }
}
