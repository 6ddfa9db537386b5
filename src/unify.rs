//! Column type unification.
//!
//! A [`ColumnAccumulator`] folds every value of one column into a running
//! class and a running maximum width. The first value fixes the class; any
//! later disagreement downgrades the column to text for good. Width is always
//! tracked so a late downgrade still knows how wide the text column must be.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::{ValueClass, classify};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "width", rename_all = "lowercase")]
pub enum InferredType {
    Integer,
    Float,
    Uuid,
    Timestamp,
    Text(usize),
}

impl InferredType {
    pub fn class(&self) -> ValueClass {
        match self {
            InferredType::Integer => ValueClass::Integer,
            InferredType::Float => ValueClass::Float,
            InferredType::Uuid => ValueClass::Uuid,
            InferredType::Timestamp => ValueClass::Timestamp,
            InferredType::Text(_) => ValueClass::Text,
        }
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferredType::Text(width) => write!(f, "text({width})"),
            other => f.write_str(other.class().as_str()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColumnAccumulator {
    observed: Option<ValueClass>,
    max_len: usize,
}

impl ColumnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(&mut self, value: &str) {
        let class = classify(value);
        self.max_len = self.max_len.max(value.chars().count());
        self.observed = match self.observed {
            None => Some(class),
            Some(current) if current == class => Some(current),
            Some(_) => Some(ValueClass::Text),
        };
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// A column that never saw a value is declared as the narrowest text.
    pub fn finish(&self) -> InferredType {
        match self.observed.unwrap_or(ValueClass::Text) {
            ValueClass::Integer => InferredType::Integer,
            ValueClass::Float => InferredType::Float,
            ValueClass::Uuid => InferredType::Uuid,
            ValueClass::Timestamp => InferredType::Timestamp,
            ValueClass::Text => InferredType::Text(self.max_len.max(1)),
        }
    }
}
