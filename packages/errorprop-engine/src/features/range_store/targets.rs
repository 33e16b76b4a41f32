//! Target labels and the per-label maximum error

use ahash::AHashMap as FastHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shared::ir::{Module, ValueKey};

/// Instrumentation labels of the module, looked up on every error write
#[derive(Debug, Clone, Default)]
pub struct TargetLabels {
    labels: FastHashMap<ValueKey, String>,
}

impl TargetLabels {
    pub fn from_module(module: &Module) -> Self {
        let mut labels = FastHashMap::new();
        for func in &module.functions {
            for inst in &func.insts {
                if let Some(label) = &inst.target {
                    labels.insert(ValueKey::Inst(func.id, inst.id), label.clone());
                }
            }
        }
        for global in &module.globals {
            if let Some(label) = &global.target {
                labels.insert(ValueKey::Global(global.id), label.clone());
            }
        }
        Self { labels }
    }

    pub fn label_of(&self, key: &ValueKey) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Worst absolute error observed per target label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetErrorAggregator {
    errors: BTreeMap<String, f64>,
}

impl TargetErrorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the label's error to `error` if it is larger
    pub fn update(&mut self, label: &str, error: f64) {
        match self.errors.get_mut(label) {
            Some(current) => *current = current.max(error),
            None => {
                self.errors.insert(label.to_string(), error);
            }
        }
    }

    pub fn merge(&mut self, other: &TargetErrorAggregator) {
        for (label, &error) in &other.errors {
            self.update(label, error);
        }
    }

    /// Error recorded for a label; 0 for labels never written
    pub fn error_for(&self, label: &str) -> f64 {
        self.errors.get(label).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.errors.iter().map(|(l, &e)| (l.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
