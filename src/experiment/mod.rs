//! Experiment data: the measured dimensions, the benchmark instances, and the runs recorded
//! for them in log files.
//!
//! Dimensions and instances are declared one at a time through scopes handed out by an
//! [`ExperimentSetBuilder`]. A scope only registers its definition when it is
//! [closed](DimensionScope::close); that is also where the definition gets validated.

pub mod loader;
pub mod log_scan;
pub mod number;

use std::collections::BTreeMap;

pub use loader::{ExperimentLoader, LoadError, LoadFailure};
pub use log_scan::{scan, RunBuilder, ScanError, ScanSink, ScanState};
pub use number::{Number, NumberParser, ParseNumberError};

/// Whether larger values of a dimension are better, worse, or just later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[default]
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DimensionKind {
    /// consumed runtime, measured in steps like function evaluations
    #[default]
    IterationCount,
    /// consumed runtime, measured by a clock
    RuntimeMillis,
    /// solution quality, meaning depends on the instance
    Quality,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimension {
    pub name: String,
    pub description: Option<String>,
    pub direction: Direction,
    pub kind: DimensionKind,
    pub parser: NumberParser,
}

/// A `(key, value, description)` fact about an instance
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceFeature {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instance {
    pub name: String,
    pub description: Option<String>,
    pub features: Vec<InstanceFeature>,
    /// known bounds on the best reachable quality, if there are any
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

impl Instance {
    pub fn feature(&self, key: &str) -> Option<&str> {
        self.features
            .iter()
            .find(|feature| feature.key == key)
            .map(|feature| feature.value.as_str())
    }
}

/// One run of an algorithm on an instance: its parameters and every logged data point
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Run {
    pub instance: String,
    pub parameters: BTreeMap<String, String>,
    /// one value per dimension, in dimension order
    pub points: Vec<Vec<Number>>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Experiment {
    pub name: String,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentSet {
    pub dimensions: Vec<Dimension>,
    pub instances: Vec<Instance>,
    pub experiments: Vec<Experiment>,
}

impl ExperimentSet {
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|instance| instance.name == name)
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|dimension| dimension.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("A {0} was closed without a name")]
    MissingName(&'static str),
    #[error("{0} is defined twice")]
    Duplicate(String),
    #[error("Dimension {0} has no number parser")]
    MissingParser(String),
    #[error("Dimension {0} accepts no value at all")]
    EmptyRange(String),
    #[error("Instance {instance} has feature {key} twice")]
    DuplicateFeature { instance: String, key: String },
    #[error("Instance {0} has a lower bound above its upper bound")]
    InvertedBounds(String),
}

/// Collects dimension and instance definitions into an [`ExperimentSet`]
#[derive(Debug, Default)]
pub struct ExperimentSetBuilder {
    set: ExperimentSet,
}

impl ExperimentSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_dimension(&mut self) -> DimensionScope<'_> {
        DimensionScope {
            owner: self,
            name: None,
            description: None,
            direction: Direction::default(),
            kind: DimensionKind::default(),
            parser: None,
            closed: false,
        }
    }

    pub fn create_instance(&mut self) -> InstanceScope<'_> {
        InstanceScope {
            owner: self,
            name: None,
            description: None,
            features: Vec::new(),
            lower_bound: None,
            upper_bound: None,
            closed: false,
        }
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.set.dimensions
    }

    pub fn instances(&self) -> &[Instance] {
        &self.set.instances
    }

    pub(crate) fn add_experiment(&mut self, experiment: Experiment) {
        match self
            .set
            .experiments
            .iter_mut()
            .find(|known| known.name == experiment.name)
        {
            Some(known) => known.runs.extend(experiment.runs),
            None => self.set.experiments.push(experiment),
        }
    }

    pub fn build(self) -> ExperimentSet {
        self.set
    }
}

/// Declares one dimension. Registered on [`DimensionScope::close`]; dropping it unclosed discards it.
#[derive(Debug)]
#[must_use = "a dimension is only registered once its scope is closed"]
pub struct DimensionScope<'b> {
    owner: &'b mut ExperimentSetBuilder,
    name: Option<String>,
    description: Option<String>,
    direction: Direction,
    kind: DimensionKind,
    parser: Option<NumberParser>,
    closed: bool,
}

impl DimensionScope<'_> {
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn direction(&mut self, direction: Direction) -> &mut Self {
        self.direction = direction;
        self
    }

    pub fn kind(&mut self, kind: DimensionKind) -> &mut Self {
        self.kind = kind;
        self
    }

    pub fn parser(&mut self, parser: NumberParser) -> &mut Self {
        self.parser = Some(parser);
        self
    }

    pub fn close(mut self) -> Result<(), DefinitionError> {
        self.closed = true;
        let name = self
            .name
            .take()
            .filter(|name| !name.trim().is_empty())
            .ok_or(DefinitionError::MissingName("dimension"))?;
        if self.owner.set.dimension(&name).is_some() {
            return Err(DefinitionError::Duplicate(name));
        }
        let Some(parser) = self.parser else {
            return Err(DefinitionError::MissingParser(name));
        };
        if parser.is_empty() {
            return Err(DefinitionError::EmptyRange(name));
        }
        log::debug!("Dimension {name} defined");
        self.owner.set.dimensions.push(Dimension {
            name,
            description: self.description.take(),
            direction: self.direction,
            kind: self.kind,
            parser,
        });
        Ok(())
    }
}

impl Drop for DimensionScope<'_> {
    fn drop(&mut self) {
        if !self.closed {
            log::warn!(
                "Dimension {} was never closed and is discarded",
                self.name.as_deref().unwrap_or("<unnamed>")
            );
        }
    }
}

/// Declares one instance. Registered on [`InstanceScope::close`]; dropping it unclosed discards it.
#[derive(Debug)]
#[must_use = "an instance is only registered once its scope is closed"]
pub struct InstanceScope<'b> {
    owner: &'b mut ExperimentSetBuilder,
    name: Option<String>,
    description: Option<String>,
    features: Vec<InstanceFeature>,
    lower_bound: Option<f64>,
    upper_bound: Option<f64>,
    closed: bool,
}

impl InstanceScope<'_> {
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn feature(
        &mut self,
        key: impl Into<String>,
        value: impl ToString,
        description: Option<&str>,
    ) -> &mut Self {
        self.features.push(InstanceFeature {
            key: key.into(),
            value: value.to_string(),
            description: description.map(str::to_owned),
        });
        self
    }

    pub fn lower_bound(&mut self, bound: f64) -> &mut Self {
        self.lower_bound = Some(bound);
        self
    }

    pub fn upper_bound(&mut self, bound: f64) -> &mut Self {
        self.upper_bound = Some(bound);
        self
    }

    pub fn close(mut self) -> Result<(), DefinitionError> {
        self.closed = true;
        let name = self
            .name
            .take()
            .filter(|name| !name.trim().is_empty())
            .ok_or(DefinitionError::MissingName("instance"))?;
        if self.owner.set.instance(&name).is_some() {
            return Err(DefinitionError::Duplicate(name));
        }
        for (i, feature) in self.features.iter().enumerate() {
            if self.features[..i].iter().any(|earlier| earlier.key == feature.key) {
                return Err(DefinitionError::DuplicateFeature {
                    instance: name,
                    key: feature.key.clone(),
                });
            }
        }
        if let (Some(lower), Some(upper)) = (self.lower_bound, self.upper_bound) {
            if lower > upper {
                return Err(DefinitionError::InvertedBounds(name));
            }
        }
        log::debug!("Instance {name} defined");
        self.owner.set.instances.push(Instance {
            name,
            description: self.description.take(),
            features: std::mem::take(&mut self.features),
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
        });
        Ok(())
    }
}

impl Drop for InstanceScope<'_> {
    fn drop(&mut self) {
        if !self.closed {
            log::warn!(
                "Instance {} was never closed and is discarded",
                self.name.as_deref().unwrap_or("<unnamed>")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_register_on_close() {
        // arrange
        let mut builder = ExperimentSetBuilder::new();

        // act
        let mut dimension = builder.create_dimension();
        dimension
            .name("FEs")
            .description("objective function evaluations")
            .kind(DimensionKind::IterationCount)
            .parser(NumberParser::POSITIVE_INTEGER);
        dimension.close().unwrap();
        let mut instance = builder.create_instance();
        instance
            .name("eil51")
            .feature("n", 51, Some("number of cities"))
            .feature("symmetric", true, None)
            .lower_bound(426.0);
        instance.close().unwrap();
        let set = builder.build();

        // assert
        assert_eq!(set.dimensions.len(), 1);
        assert_eq!(set.dimensions[0].parser, NumberParser::POSITIVE_INTEGER);
        let eil51 = set.instance("eil51").unwrap();
        assert_eq!(eil51.feature("n"), Some("51"));
        assert_eq!(eil51.feature("symmetric"), Some("true"));
        assert_eq!(eil51.lower_bound, Some(426.0));
    }

    #[test]
    fn unclosed_scope_is_discarded() {
        // arrange
        let mut builder = ExperimentSetBuilder::new();

        // act
        {
            let mut dimension = builder.create_dimension();
            dimension.name("lost").parser(NumberParser::NON_NEGATIVE_FLOAT);
        }

        // assert
        assert!(builder.dimensions().is_empty());
    }

    #[test]
    fn invalid_definitions() {
        // arrange
        let mut builder = ExperimentSetBuilder::new();
        let mut first = builder.create_dimension();
        first.name("time").parser(NumberParser::NON_NEGATIVE_INTEGER);
        first.close().unwrap();

        // act
        let unnamed = builder.create_dimension().close();
        let mut duplicate = builder.create_dimension();
        duplicate.name("time").parser(NumberParser::NON_NEGATIVE_INTEGER);
        let duplicate = duplicate.close();
        let mut unparsed = builder.create_dimension();
        unparsed.name("quality");
        let unparsed = unparsed.close();
        let mut empty = builder.create_dimension();
        empty.name("quality").parser(NumberParser::integer(5, 1));
        let empty = empty.close();
        let mut twice = builder.create_instance();
        twice.name("a280").feature("n", 280, None).feature("n", 281, None);
        let twice = twice.close();

        // assert
        assert_eq!(unnamed, Err(DefinitionError::MissingName("dimension")));
        assert_eq!(duplicate, Err(DefinitionError::Duplicate("time".to_owned())));
        assert_eq!(unparsed, Err(DefinitionError::MissingParser("quality".to_owned())));
        assert_eq!(empty, Err(DefinitionError::EmptyRange("quality".to_owned())));
        assert!(matches!(twice, Err(DefinitionError::DuplicateFeature { .. })));
        assert_eq!(builder.dimensions().len(), 1);
    }
}
