use log::{debug, warn};
use serde_json::Value;

use crate::config::FormOptions;
use crate::error::{FormError, ModelError, PathError, SessionError};
use crate::form::{ChangeKind, EditValue, FieldAction, FormNode};
use crate::generator::FormGenerator;
use crate::model::{ClassDeclaration, ModelManager, SchemaLibrary};
use crate::path::{self, JsonPath};

/// Handle for one schema load; only the most recent ticket may commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    key: String,
}

impl LoadTicket {
    /// The schema or type key this load was requested for.
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was requested first; the result was dropped.
    Stale,
}

/// Owns the live instance and keeps its form tree in step with every edit.
#[derive(Debug)]
pub struct FormSession<L = ModelManager> {
    generator: FormGenerator<L>,
    selected: Option<String>,
    instance: Option<Value>,
    tree: Option<FormNode>,
    warning: Option<String>,
    load_generation: u64,
}

impl<L: SchemaLibrary> FormSession<L> {
    pub fn new(options: FormOptions) -> Self {
        Self::from_generator(FormGenerator::new(options))
    }

    pub fn with_library(library: L, options: FormOptions) -> Self {
        Self::from_generator(FormGenerator::with_library(library, options))
    }

    fn from_generator(generator: FormGenerator<L>) -> Self {
        Self {
            generator,
            selected: None,
            instance: None,
            tree: None,
            warning: None,
            load_generation: 0,
        }
    }

    pub fn generator(&self) -> &FormGenerator<L> {
        &self.generator
    }

    pub fn types(&self) -> Vec<&ClassDeclaration> {
        self.generator.types()
    }

    pub fn selected_type(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn instance(&self) -> Option<&Value> {
        self.instance.as_ref()
    }

    pub fn tree(&self) -> Option<&FormNode> {
        self.tree.as_ref()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Make `fqn` the edited type. The instance is replaced by a default one
    /// unless it already is an instance of `fqn`.
    pub fn select_type(&mut self, fqn: &str) -> Result<(), SessionError> {
        let previous = self.selected.replace(fqn.to_string());
        let keep = self
            .instance
            .as_ref()
            .is_some_and(|instance| self.generator.is_instance_of(instance, fqn));
        if keep {
            return self.rebuild();
        }

        match self.generator.generate_json(fqn) {
            Ok(instance) => {
                debug!("synthesized a new instance for {fqn}");
                self.instance = Some(instance);
                self.rebuild()
            }
            Err(e) if is_caller_error(&e) => {
                self.selected = previous;
                Err(e.into())
            }
            Err(e) => {
                self.downgrade(e);
                Ok(())
            }
        }
    }

    /// Replace the instance wholesale and rebuild.
    pub fn set_instance(&mut self, instance: Value) -> Result<(), SessionError> {
        let previous = self.instance.replace(instance);
        self.rebuild().inspect_err(|_| self.instance = previous)
    }

    pub fn on_field_change(
        &mut self,
        path: &JsonPath,
        kind: ChangeKind,
        edit: EditValue,
    ) -> Result<(), SessionError> {
        self.edit(|instance| path::write(instance, path, kind.coerce(edit)))
    }

    pub fn on_add_element(&mut self, path: &JsonPath, seed: Value) -> Result<(), SessionError> {
        self.edit(|instance| path::append_to_array(instance, path, seed))
    }

    pub fn on_remove_element(&mut self, path: &JsonPath, index: usize) -> Result<(), SessionError> {
        self.edit(|instance| path::remove_from_array(instance, path, index).map(drop))
    }

    /// Apply `change` and rebuild. The instance is rolled back if either step fails.
    fn edit(
        &mut self,
        change: impl FnOnce(&mut Value) -> Result<(), PathError>,
    ) -> Result<(), SessionError> {
        let instance = self.instance.as_mut().ok_or(SessionError::NoInstance)?;
        let previous = instance.clone();
        let result = change(instance)
            .map_err(SessionError::from)
            .and_then(|()| self.rebuild());
        if result.is_err() {
            self.instance = Some(previous);
        }
        result
    }

    /// Run a handler taken from the current tree.
    pub fn invoke(&mut self, action: &FieldAction, edit: Option<EditValue>) -> Result<(), SessionError> {
        match action {
            FieldAction::Change { path, kind } => {
                let edit = edit.ok_or(SessionError::MissingEditValue)?;
                self.on_field_change(path, *kind, edit)
            }
            FieldAction::Add { path, seed } => self.on_add_element(path, seed.clone()),
            FieldAction::Remove { path, index } => self.on_remove_element(path, *index),
        }
    }

    /// Revalidate the instance and build a fresh tree from it.
    ///
    /// Build failures become the warning and clear the tree; only errors in how
    /// the session was driven are returned.
    pub fn rebuild(&mut self) -> Result<(), SessionError> {
        let Some(fqn) = self.selected.as_deref() else {
            return Err(SessionError::NoTypeSelected);
        };
        let Some(instance) = self.instance.as_ref() else {
            return Err(SessionError::NoInstance);
        };

        let warning = self.generator.validate_instance(instance);
        match self.generator.generate_tree(fqn, instance) {
            Ok(tree) => {
                if let Some(ref message) = warning {
                    warn!("instance does not validate: {message}");
                }
                debug!("rebuilt form for {fqn}");
                self.warning = warning;
                self.tree = Some(tree);
                Ok(())
            }
            Err(e) if is_caller_error(&e) => Err(e.into()),
            Err(e) => {
                self.downgrade(e);
                Ok(())
            }
        }
    }

    /// Start a schema load for `key`, superseding any load still in flight.
    pub fn begin_load(&mut self, key: impl Into<String>) -> LoadTicket {
        self.load_generation += 1;
        LoadTicket {
            generation: self.load_generation,
            key: key.into(),
        }
    }

    /// Commit the result of a load started with [`begin_load`](Self::begin_load).
    ///
    /// A failed load leaves no schema loaded but keeps the instance and tree.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<L, ModelError>,
    ) -> Result<LoadOutcome, SessionError> {
        if ticket.generation != self.load_generation {
            warn!("discarding stale schema load for {}", ticket.key);
            return Ok(LoadOutcome::Stale);
        }

        let library = match result {
            Ok(library) => library,
            Err(e) => {
                warn!("schema load for {} failed: {e}", ticket.key);
                self.generator.set_library(None);
                return Err(e.into());
            }
        };
        self.generator.set_library(Some(library));
        debug!("loaded schema for {}", ticket.key);

        let selection = {
            let types = self.generator.types();
            match self.selected.as_deref() {
                Some(current) if types.iter().any(|t| t.fqn == current) => Some(current.to_string()),
                _ => types.first().map(|t| t.fqn.clone()),
            }
        };
        match selection {
            Some(fqn) => self.select_type(&fqn)?,
            None => {
                self.selected = None;
                self.tree = None;
            }
        }
        Ok(LoadOutcome::Applied)
    }

    fn downgrade(&mut self, error: FormError) {
        warn!("form generation failed: {error}");
        self.warning = Some(error.to_string());
        self.tree = None;
    }
}

impl FormSession<ModelManager> {
    /// Load a model document synchronously.
    pub fn load_from_text(&mut self, text: &str) -> Result<LoadOutcome, SessionError> {
        self.load_from_texts(&[text])
    }

    pub fn load_from_texts<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<LoadOutcome, SessionError> {
        let ticket = self.begin_load(format!("{} model documents", texts.len()));
        let result = ModelManager::from_texts(texts);
        self.complete_load(ticket, result)
    }
}

/// Errors caused by the request itself rather than by the schema or instance.
fn is_caller_error(error: &FormError) -> bool {
    matches!(
        error,
        FormError::NotLoaded
            | FormError::TypeNotFound(_)
            | FormError::EnumerationRoot { .. }
            | FormError::AbstractRoot { .. }
    )
}
