//! Document checks applied where documents enter the engine.

use std::collections::HashSet;

use serde_json::Value;
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::TreeNode;
use crate::domain::tree;

/// Reject empty or duplicate ids and metadata values other than scalars or
/// lists of scalars.
#[instrument(level = "debug", skip_all, fields(root = %document.id))]
pub fn validate_document(document: &TreeNode) -> DomainResult<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for (_, node) in tree::iter(document) {
        if node.id.trim().is_empty() {
            return Err(DomainError::EmptyId);
        }
        if !seen.insert(node.id.as_str()) {
            return Err(DomainError::DuplicateId(node.id.clone()));
        }
        for (key, value) in &node.metadata {
            check_metadata_value(&node.id, key, value)?;
        }
    }
    Ok(())
}

fn check_metadata_value(id: &str, key: &str, value: &Value) -> DomainResult<()> {
    let invalid = |reason: &str| DomainError::InvalidMetadata {
        id: id.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    };
    match value {
        Value::Object(_) => Err(invalid("nested objects are not supported")),
        Value::Array(items) => {
            if items
                .iter()
                .any(|v| matches!(v, Value::Array(_) | Value::Object(_)))
            {
                Err(invalid("list items must be scalars"))
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}
