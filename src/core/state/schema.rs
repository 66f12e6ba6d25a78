//! core::state::schema
//!
//! On-disk form of the workspace state.
//!
//! ```json
//! {
//!   "trunk_branch": "main",
//!   "managed_branches": {
//!     "fix-bug": { "name": "fix-bug", "parent": "main", "description": "fix bug" }
//!   }
//! }
//! ```
//!
//! Older writers emitted `"managed_branches": null` for an empty stack, so a
//! null or missing mapping reads as empty. Unknown fields are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::stack::{ManagedBranch, StackModel};
use crate::core::types::BranchName;

/// Serialized workspace state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Trunk; falls back to the configured default when absent.
    #[serde(default)]
    pub trunk_branch: Option<BranchName>,

    /// Managed branches keyed by name.
    #[serde(default)]
    pub managed_branches: Option<BTreeMap<String, ManagedBranch>>,
}

impl StateRecord {
    /// Snapshot a model for writing.
    pub fn from_model(model: &StackModel) -> Self {
        let branches = model
            .branches()
            .map(|b| (b.name.to_string(), b.clone()))
            .collect();
        Self {
            trunk_branch: Some(model.trunk().clone()),
            managed_branches: Some(branches),
        }
    }

    /// Rebuild the model, validating keys and parent chains.
    ///
    /// Returns a description of the first problem found.
    pub fn into_model(self, default_trunk: &BranchName) -> Result<StackModel, String> {
        let trunk = self.trunk_branch.unwrap_or_else(|| default_trunk.clone());
        let records = self.managed_branches.unwrap_or_default();

        for (key, record) in &records {
            if record.name.as_str() != key {
                return Err(format!(
                    "entry '{}' records a different branch name '{}'",
                    key, record.name
                ));
            }
        }

        StackModel::from_records(trunk, records.into_values()).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[test]
    fn parses_legacy_null_mapping() {
        let record: StateRecord =
            serde_json::from_str(r#"{"trunk_branch":"main","managed_branches":null}"#).unwrap();
        let model = record.into_model(&b("main")).unwrap();
        assert!(model.is_empty());
    }

    #[test]
    fn missing_trunk_uses_default() {
        let record: StateRecord = serde_json::from_str(r#"{"managed_branches":{}}"#).unwrap();
        let model = record.into_model(&b("develop")).unwrap();
        assert_eq!(model.trunk(), &b("develop"));
    }

    #[test]
    fn ignores_unknown_fields() {
        let record: Result<StateRecord, _> =
            serde_json::from_str(r#"{"trunk_branch":"main","extra":1}"#);
        assert!(record.is_ok());
    }

    #[test]
    fn rejects_key_name_mismatch() {
        let json = r#"{"trunk_branch":"main","managed_branches":{
            "a":{"name":"b","parent":"main","description":""}}}"#;
        let record: StateRecord = serde_json::from_str(json).unwrap();
        let err = record.into_model(&b("main")).unwrap_err();
        assert!(err.contains("'a'"));
    }

    #[test]
    fn rejects_invalid_branch_name() {
        let json = r#"{"trunk_branch":"main","managed_branches":{
            "a..b":{"name":"a..b","parent":"main","description":""}}}"#;
        assert!(serde_json::from_str::<StateRecord>(json).is_err());
    }

    #[test]
    fn rejects_cycle() {
        let json = r#"{"trunk_branch":"main","managed_branches":{
            "a":{"name":"a","parent":"b","description":""},
            "b":{"name":"b","parent":"a","description":""}}}"#;
        let record: StateRecord = serde_json::from_str(json).unwrap();
        let err = record.into_model(&b("main")).unwrap_err();
        assert!(err.contains("cycle"));
    }

    #[test]
    fn model_roundtrip() {
        let mut model = StackModel::new(b("main"));
        model.add_managed(b("a"), b("main"), "first").unwrap();
        model.add_managed(b("b"), b("a"), "second").unwrap();

        let json = serde_json::to_string(&StateRecord::from_model(&model)).unwrap();
        let parsed: StateRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.into_model(&b("other")).unwrap(), model);
    }
}
