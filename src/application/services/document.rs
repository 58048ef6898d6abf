//! Document service
//!
//! Loads, validates and saves mind-map documents stored as JSON files.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::export::export_json;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt, JsonResultExt};
use crate::domain::{self, validate_document, NodeId, NodePatch, TreeNode};
use crate::infrastructure::traits::FileSystem;

/// Service for reading and writing documents.
pub struct DocumentService {
    fs: Arc<dyn FileSystem>,
}

impl DocumentService {
    /// Create a new document service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Parse and validate a document from JSON text.
    pub fn parse(&self, text: &str, path: &Path) -> ApplicationResult<TreeNode> {
        let document: TreeNode = serde_json::from_str(text).with_parse_context(path)?;
        validate_document(&document)?;
        Ok(document)
    }

    /// Read, parse and validate the document at `path`.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<TreeNode> {
        let text = self
            .fs
            .read_to_string(path)
            .with_path_context("read document", path)?;
        let document = self.parse(&text, path)?;
        debug!(
            "loaded {} nodes from {}",
            domain::count_nodes(&document),
            path.display()
        );
        Ok(document)
    }

    /// Write `document` as pretty JSON, replacing `path` atomically.
    #[instrument(level = "debug", skip(self, document))]
    pub fn save(&self, path: &Path, document: &TreeNode) -> ApplicationResult<()> {
        let mut json = export_json(document)?;
        json.push('\n');
        self.fs
            .write_atomic(path, &json)
            .with_path_context("write document", path)
    }

    /// Append `child` under `parent_id` in the stored document.
    pub fn add_child(
        &self,
        path: &Path,
        parent_id: &str,
        child: TreeNode,
    ) -> ApplicationResult<NodeId> {
        let document = Arc::new(self.load(path)?);
        if domain::find_by_id(&document, parent_id).is_none() {
            return Err(ApplicationError::NodeNotFound(parent_id.to_string()));
        }
        let child_id = child.id.clone();
        let updated = domain::insert_child(&document, parent_id, child);
        validate_document(&updated)?;
        self.save(path, &updated)?;
        Ok(child_id)
    }

    /// Merge `patch` into node `id` of the stored document.
    pub fn edit(&self, path: &Path, id: &str, patch: &NodePatch) -> ApplicationResult<TreeNode> {
        let document = Arc::new(self.load(path)?);
        if domain::find_by_id(&document, id).is_none() {
            return Err(ApplicationError::NodeNotFound(id.to_string()));
        }
        let updated = domain::replace_by_id(&document, id, patch);
        validate_document(&updated)?;
        self.save(path, &updated)?;
        Ok(TreeNode::clone(&updated))
    }
}
