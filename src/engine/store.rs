// src/engine/store.rs

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::plan::DataSlot;

/// Named data values produced during a run.
///
/// Keys are slot names; values are whatever the producing executor returned.
/// The store is only touched by the run loop between waves, so it needs no
/// locking: inputs are read before a wave is dispatched and outputs are
/// committed after the wave has joined.
#[derive(Debug, Clone, Default)]
pub struct OutputStore {
    values: BTreeMap<String, Value>,
}

impl OutputStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from an initial context object.
    ///
    /// Non-object contexts (including `null`) seed nothing.
    pub fn seeded(initial_context: Value) -> Self {
        let mut store = Self::new();
        match initial_context {
            Value::Object(map) => {
                store.values.extend(map);
            }
            Value::Null => {}
            other => {
                warn!(kind = json_kind(&other), "initial context is not an object; ignoring it");
            }
        }
        store
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Collect the values available for a step's declared inputs.
    ///
    /// Missing inputs are omitted rather than reported; a step whose producer
    /// failed still runs with whatever is present.
    pub fn resolve_inputs(&self, inputs: &[DataSlot]) -> BTreeMap<String, Value> {
        inputs
            .iter()
            .filter_map(|slot| {
                let value = self.values.get(&slot.name)?;
                Some((slot.name.clone(), value.clone()))
            })
            .collect()
    }

    /// Store a step's result under each of its declared outputs.
    ///
    /// When the result is an object holding the output's name, that member
    /// is stored; otherwise the whole result is stored. Rewriting a key that
    /// is already present keeps the latest value and logs a warning.
    pub fn commit(&mut self, step_id: &str, outputs: &[DataSlot], result: &Value) {
        for slot in outputs {
            let value = result.get(slot.name.as_str()).unwrap_or(result).clone();
            if self.values.insert(slot.name.clone(), value).is_some() {
                warn!(
                    step = %step_id,
                    output = %slot.name,
                    "output written more than once; keeping the latest value"
                );
            } else {
                debug!(step = %step_id, output = %slot.name, "output stored");
            }
        }
    }

    pub fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
