//! Loading, validating and saving documents through the DocumentService

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;
use tempfile::TempDir;

use mindmap::application::services::DocumentService;
use mindmap::application::ApplicationError;
use mindmap::domain::{find_by_id, DomainError, NodePatch, TreeNode};
use mindmap::infrastructure::traits::RealFileSystem;
use mindmap::util::testing;

struct Workspace {
    _dir: TempDir,
    path: PathBuf,
    service: DocumentService,
}

#[fixture]
fn workspace() -> Workspace {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.json");
    fs::write(
        &path,
        json!({
            "id": "1",
            "label": "Root",
            "type": "root",
            "children": [
                {"id": "2", "label": "A", "type": "category",
                 "children": [{"id": "4", "label": "A.1", "type": "detail"}]},
                {"id": "3", "label": "B", "type": "category",
                 "metadata": {"tags": ["x", "y"], "weight": 2}}
            ]
        })
        .to_string(),
    )
    .unwrap();
    Workspace {
        _dir: dir,
        path,
        service: DocumentService::new(Arc::new(RealFileSystem)),
    }
}

#[rstest]
fn given_valid_file_when_loading_then_tree_parsed(workspace: Workspace) {
    let doc = workspace.service.load(&workspace.path).unwrap();

    assert_eq!(doc.id, "1");
    assert_eq!(doc.children.len(), 2);
    assert_eq!(find_by_id(&doc, "3").unwrap().metadata["weight"], json!(2));
}

#[test]
fn given_missing_file_when_loading_then_operation_failed_with_io_source() {
    let dir = TempDir::new().unwrap();
    let service = DocumentService::new(Arc::new(RealFileSystem));

    let err = service.load(&dir.path().join("absent.json")).unwrap_err();

    match err {
        ApplicationError::OperationFailed { context, source } => {
            assert!(context.contains("absent.json"));
            let io_err = source.downcast_ref::<io::Error>().unwrap();
            assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
        }
        other => panic!("expected OperationFailed, got {other:?}"),
    }
}

#[rstest]
#[case::not_json("{ nope")]
#[case::missing_id(r#"{"label": "Root"}"#)]
#[case::children_not_list(r#"{"id": "1", "children": {"id": "2"}}"#)]
fn given_malformed_json_when_loading_then_parse_error(#[case] content: &str) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, content).unwrap();
    let service = DocumentService::new(Arc::new(RealFileSystem));

    let err = service.load(&path).unwrap_err();

    assert!(
        matches!(&err, ApplicationError::Parse { path: p, .. } if *p == path),
        "got {err:?}"
    );
}

#[test]
fn given_duplicate_ids_when_loading_then_domain_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dup.json");
    fs::write(
        &path,
        r#"{"id": "1", "children": [{"id": "2"}, {"id": "2"}]}"#,
    )
    .unwrap();
    let service = DocumentService::new(Arc::new(RealFileSystem));

    let err = service.load(&path).unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::DuplicateId(ref id)) if id == "2"
    ));
}

#[test]
fn given_nested_metadata_object_when_loading_then_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("meta.json");
    fs::write(&path, r#"{"id": "1", "metadata": {"owner": {"name": "x"}}}"#).unwrap();
    let service = DocumentService::new(Arc::new(RealFileSystem));

    assert!(matches!(
        service.load(&path),
        Err(ApplicationError::Domain(DomainError::InvalidMetadata { .. }))
    ));
}

#[rstest]
fn given_document_when_saved_and_loaded_then_equal(workspace: Workspace) {
    let doc = workspace.service.load(&workspace.path).unwrap();
    let out = workspace.path.with_file_name("nested/copy.json");

    workspace.service.save(&out, &doc).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    let reloaded = workspace.service.load(&out).unwrap();

    assert_eq!(reloaded, doc);
    assert!(text.ends_with("}\n"));
    assert!(text.contains("\"type\": \"category\""));
}

#[rstest]
fn given_parent_when_adding_child_then_persisted(workspace: Workspace) {
    let child = TreeNode::new("5").with_label("B.1");

    let id = workspace
        .service
        .add_child(&workspace.path, "3", child)
        .unwrap();

    assert_eq!(id, "5");
    let doc = workspace.service.load(&workspace.path).unwrap();
    let parent = find_by_id(&doc, "3").unwrap();
    assert_eq!(parent.children.len(), 1);
    assert_eq!(parent.children[0].label.as_deref(), Some("B.1"));
}

#[rstest]
fn given_unknown_parent_when_adding_child_then_not_found_and_file_untouched(
    workspace: Workspace,
) {
    let before = fs::read_to_string(&workspace.path).unwrap();

    let err = workspace
        .service
        .add_child(&workspace.path, "99", TreeNode::new("5"))
        .unwrap_err();

    assert!(matches!(err, ApplicationError::NodeNotFound(ref id) if id == "99"));
    assert_eq!(fs::read_to_string(&workspace.path).unwrap(), before);
}

#[rstest]
fn given_existing_id_when_adding_child_then_duplicate_rejected(workspace: Workspace) {
    let err = workspace
        .service
        .add_child(&workspace.path, "3", TreeNode::new("4"))
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::DuplicateId(_))
    ));
}

#[rstest]
fn given_patch_when_editing_then_fields_merged_and_children_kept(workspace: Workspace) {
    let patch = NodePatch {
        summary: Some("first branch".into()),
        description: Some("longer text".into()),
        ..Default::default()
    };

    let edited = workspace.service.edit(&workspace.path, "2", &patch).unwrap();

    assert_eq!(edited.id, "1");
    let doc = workspace.service.load(&workspace.path).unwrap();
    let node = find_by_id(&doc, "2").unwrap();
    assert_eq!(node.label.as_deref(), Some("A"));
    assert_eq!(node.summary.as_deref(), Some("first branch"));
    assert_eq!(node.description.as_deref(), Some("longer text"));
    assert_eq!(node.children[0].id, "4");
}

#[rstest]
fn given_unknown_id_when_editing_then_not_found(workspace: Workspace) {
    let err = workspace
        .service
        .edit(&workspace.path, "ghost", &NodePatch::default())
        .unwrap_err();

    assert!(matches!(err, ApplicationError::NodeNotFound(_)));
}
