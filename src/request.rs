//! Per-request information handed to node lookups and mutations

use serde::{Deserialize, Serialize};

/// The field a lookup or mutation is resolving for.
///
/// The dynamic binding fills it from the resolver context; direct callers can
/// build one with [`RequestInfo::new`] or use the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    /// Name of the field being resolved, e.g. `node` or `introduceShip`.
    pub field_name: String,
    pub alias: Option<String>,
    /// Response path of the field. List indices are stringified.
    pub path: Vec<String>,
    /// Sub-fields selected on the result, with fragments flattened.
    pub selection: Vec<String>,
}

impl RequestInfo {
    pub fn new(field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        Self {
            path: vec![field_name.clone()],
            field_name,
            ..Self::default()
        }
    }

    /// Key of the field in the response: its alias, or its name.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.field_name)
    }

    /// Whether the client selected `field` on the result.
    pub fn selects(&self, field: &str) -> bool {
        self.selection.iter().any(|selected| selected == field)
    }
}
