//! Record type ↔ document schema bindings.
//!
//! A record type is bound to at most one document schema, possibly in
//! several indexes. Each (record type, schema, index) triple is one
//! [`Binding`] with a deterministic id, which doubles as the dispatch uid of
//! its listeners.

use std::collections::HashMap;
use std::sync::RwLock;

use docsync_search::DocumentSchema;

use crate::error::IndexingError;

/// One record type bound to one schema in one index.
#[derive(Debug, Clone)]
pub struct Binding {
    id: String,
    record_type: String,
    index_name: String,
    schema: DocumentSchema,
}

impl Binding {
    pub fn new(record_type: &str, schema: DocumentSchema, index_name: &str) -> Self {
        Self {
            id: binding_id(record_type, &schema, index_name),
            record_type: record_type.to_string(),
            index_name: index_name.to_string(),
            schema,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }
}

/// Deterministic id for a (record type, schema, index) triple.
pub fn binding_id(record_type: &str, schema: &DocumentSchema, index_name: &str) -> String {
    format!("{}:{}:{}", record_type, schema.name(), index_name)
}

/// Index name used when none is given: the lowercased record type.
pub fn default_index_name(record_type: &str) -> String {
    record_type.to_lowercase()
}

#[derive(Default)]
struct RegistryState {
    schemas: HashMap<String, DocumentSchema>,
    bindings: HashMap<String, Binding>,
}

/// Process-wide table of bindings.
#[derive(Default)]
pub struct BindingRegistry {
    state: RwLock<RegistryState>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binding. Returns the existing binding when the same triple
    /// is already registered, and fails when the record type is bound to a
    /// different schema.
    pub fn register(&self, binding: Binding) -> Result<(Binding, bool), IndexingError> {
        let mut state = self
            .state
            .write()
            .map_err(|e| IndexingError::Registration(e.to_string()))?;

        if let Some(existing) = state.schemas.get(binding.record_type()) {
            if !existing.same_as(binding.schema()) {
                return Err(IndexingError::Registration(format!(
                    "Cannot register {} for {}: already registered to {}",
                    binding.schema().name(),
                    binding.record_type(),
                    existing.name()
                )));
            }
        }

        if let Some(existing) = state.bindings.get(binding.id()) {
            return Ok((existing.clone(), false));
        }

        state
            .schemas
            .entry(binding.record_type().to_string())
            .or_insert_with(|| binding.schema().clone());
        state
            .bindings
            .insert(binding.id().to_string(), binding.clone());
        Ok((binding, true))
    }

    /// Remove a binding. The record type keeps its schema while any other
    /// binding for it remains.
    pub fn unregister(&self, id: &str) -> Result<Option<Binding>, IndexingError> {
        let mut state = self
            .state
            .write()
            .map_err(|e| IndexingError::Registration(e.to_string()))?;

        let removed = state.bindings.remove(id);
        if let Some(binding) = &removed {
            let still_bound = state
                .bindings
                .values()
                .any(|b| b.record_type() == binding.record_type());
            if !still_bound {
                state.schemas.remove(binding.record_type());
            }
        }
        Ok(removed)
    }

    /// Schema bound to a record type.
    pub fn schema_for(&self, record_type: &str) -> Option<DocumentSchema> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.schemas.get(record_type).cloned())
    }

    pub fn get(&self, id: &str) -> Option<Binding> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.bindings.get(id).cloned())
    }

    /// Every binding of a record type, ordered by id.
    pub fn bindings_for(&self, record_type: &str) -> Vec<Binding> {
        let mut bindings: Vec<Binding> = self
            .state
            .read()
            .map(|state| {
                state
                    .bindings
                    .values()
                    .filter(|b| b.record_type() == record_type)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        bindings.sort_by(|a, b| a.id().cmp(b.id()));
        bindings
    }

    /// Every binding, ordered by id.
    pub fn all(&self) -> Vec<Binding> {
        let mut bindings: Vec<Binding> = self
            .state
            .read()
            .map(|state| state.bindings.values().cloned().collect())
            .unwrap_or_default();
        bindings.sort_by(|a, b| a.id().cmp(b.id()));
        bindings
    }
}
