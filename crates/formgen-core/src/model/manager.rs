use log::debug;
use serde_json::Value;

use crate::error::{ModelError, ResolveError, ValidationError};

use super::file::ModelFile;
use super::graph::TypeGraph;
use super::instance::{InstanceGenerator, InstanceValidator};
use super::library::{SchemaLibrary, SynthesisOptions};
use super::types::ClassDeclaration;

/// Reference schema library backed by declarative model documents.
#[derive(Debug, Clone)]
pub struct ModelManager {
    graph: TypeGraph,
}

impl ModelManager {
    pub fn new(files: &[ModelFile]) -> Result<Self, ModelError> {
        let graph = TypeGraph::from_files(files)?;
        Ok(Self { graph })
    }

    pub fn from_graph(graph: TypeGraph) -> Self {
        Self { graph }
    }

    /// Load a single YAML or JSON model document.
    pub fn from_text(text: &str) -> Result<Self, ModelError> {
        Self::from_texts(&[text])
    }

    /// Load several documents into one graph; cross-namespace references resolve.
    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Result<Self, ModelError> {
        let files = texts
            .iter()
            .map(|t| super::from_text(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("loading {} model documents", files.len());
        Self::new(&files)
    }

    pub fn into_graph(self) -> TypeGraph {
        self.graph
    }
}

impl SchemaLibrary for ModelManager {
    fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    fn validate_instance(&self, instance: &Value) -> Result<(), ValidationError> {
        InstanceValidator::new(&self.graph).validate(instance).map(|_| ())
    }

    fn is_instance_of(&self, instance: &Value, fqn: &str) -> bool {
        let Some(target) = self.graph.class(fqn) else {
            return false;
        };
        InstanceValidator::new(&self.graph)
            .validate(instance)
            .is_ok_and(|class| self.graph.is_assignable_to(class, target))
    }

    fn synthesize(
        &self,
        decl: &ClassDeclaration,
        options: &SynthesisOptions,
    ) -> Result<Value, ModelError> {
        let owned = self
            .graph
            .class(&decl.fqn)
            .ok_or_else(|| ResolveError::TypeNotFound(decl.fqn.clone()))?;
        InstanceGenerator::new(&self.graph, *options).generate(owned)
    }
}
