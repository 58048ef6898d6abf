//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::DocumentService;
use crate::config::Settings;
use crate::domain::MindMapEngine;
use crate::domain::TreeNode;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Document load/save
    pub documents: DocumentService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let documents = DocumentService::new(Arc::clone(&fs));

        Self {
            settings,
            fs,
            documents,
        }
    }

    /// Engine over `document` using the configured geometry.
    pub fn engine(&self, document: TreeNode, global_expanded: bool) -> MindMapEngine {
        MindMapEngine::new(
            document,
            global_expanded,
            self.settings.layout.clone(),
            self.settings.viewport.clone(),
        )
    }
}
