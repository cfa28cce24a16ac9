//! The recognized control set.

use crate::{Error, Result, Value, ValueKind, VariableSet};
use std::collections::BTreeMap;

/// The fixed set of variable names a panel recognizes, with the kind of
/// value each one holds.
///
/// Incoming sets are checked against the schema before they replace local
/// state: unknown names, missing names and kind mismatches all reject the
/// whole set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlSchema {
    kinds: BTreeMap<String, ValueKind>,
}

impl ControlSchema {
    /// Derives the schema from an initial set of values.
    pub fn from_set(set: &VariableSet) -> Self {
        Self {
            kinds: set
                .iter()
                .map(|(key, value)| (key.to_string(), value.kind()))
                .collect(),
        }
    }

    /// Returns the kind registered for `key`.
    pub fn kind_of(&self, key: &str) -> Option<ValueKind> {
        self.kinds.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Checks that `value` may be written at `key`. Non-finite numbers are
    /// refused since they cannot go on the wire.
    pub fn check_assignment(&self, key: &str, value: &Value) -> Result<()> {
        let expected = self
            .kind_of(key)
            .ok_or_else(|| Error::UnknownKey(key.to_string()))?;
        if value.kind() != expected {
            return Err(Error::KindMismatch {
                key: key.to_string(),
                expected,
            });
        }
        if !value.is_finite() {
            return Err(Error::InvalidValue(format!("{key} = {value}")));
        }
        Ok(())
    }

    /// Checks that `set` carries exactly the recognized keys with matching kinds.
    pub fn validate(&self, set: &VariableSet) -> Result<()> {
        for (key, value) in set.iter() {
            self.check_assignment(key, &value)?;
        }
        if let Some(missing) = self.kinds.keys().find(|k| !set.contains_key(k)) {
            return Err(Error::MissingKey(missing.clone()));
        }
        Ok(())
    }
}
