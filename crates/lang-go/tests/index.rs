use defscope_core::config::IndexConfig;
use defscope_core::model::Definition;
use defscope_core::outline::{NOTHING_ESCAPES, OutlineBuilder};
use defscope_core::pipeline::{IndexReport, Indexer};
use defscope_core::project::ProjectWalker;
use defscope_core::scope::ScopeEngine;
use defscope_core::store::{DefFilter, DefinitionStore, MemoryStore, Snapshot, UseFilter};
use defscope_go::GoPlugin;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

const GO_MOD: &str = "module example.com/app\n\ngo 1.22\n";

const X_GO: &str = r#"package a

import "fmt"

type Reader struct{}

func (r *Reader) Close() error { return nil }

type Writer struct{}

func (w *Writer) Close() error { return nil }

func Foo() {
	fmt.Println("foo")
}

func helper() {}
"#;

const Y_GO: &str = r#"package a

func useFoo() {
	Foo()
	helper()
}
"#;

const Z_GO: &str = r#"package b

import "example.com/app/a"

func Run() {
	a.Foo()
	r := &a.Reader{}
	r.Close()
}
"#;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn project(with_go_mod: bool) -> TempDir {
    let dir = tempdir().unwrap();
    if with_go_mod {
        write(dir.path(), "go.mod", GO_MOD);
    }
    write(dir.path(), "a/x.go", X_GO);
    write(dir.path(), "a/y.go", Y_GO);
    write(dir.path(), "b/z.go", Z_GO);
    dir
}

async fn index(root: &Path) -> (Arc<MemoryStore>, IndexReport) {
    let plugin = Arc::new(GoPlugin::new().unwrap());
    let store = Arc::new(MemoryStore::new());
    let report = Indexer::new(
        root,
        IndexConfig::default(),
        plugin.clone(),
        plugin,
        store.clone(),
    )
    .run()
    .await
    .unwrap();
    (store, report)
}

fn def(store: &MemoryStore, file: &str, identifier: &str, keywords: &[&str]) -> Definition {
    let mut found = store.find_defs(
        &DefFilter::new()
            .file(file)
            .identifier(identifier)
            .keywords(keywords.iter().map(|k| k.to_string()).collect::<Vec<_>>()),
    );
    assert_eq!(found.len(), 1, "{file} {identifier} {keywords:?}");
    found.remove(0)
}

#[tokio::test]
async fn test_scopes_widen_to_common_ancestor_of_users() {
    let dir = project(true);
    let (store, report) = index(dir.path()).await;
    assert_eq!(report.module_path.as_deref(), Some("example.com/app"));
    assert!(report.module_error.is_none());
    assert_eq!(report.files, 3);

    // used from a/y.go and b/z.go
    assert_eq!(def(&store, "a/x.go", "Foo", &["function"]).min_prefix, ".");
    // used from a sibling file only
    assert_eq!(def(&store, "a/x.go", "helper", &["function"]).min_prefix, "a");
    // never used elsewhere
    assert_eq!(def(&store, "a/y.go", "useFoo", &["function"]).min_prefix, "a/y.go");
    assert_eq!(def(&store, "b/z.go", "Run", &["function"]).min_prefix, "b/z.go");
}

#[tokio::test]
async fn test_receiver_keyword_separates_same_named_methods() {
    let dir = project(true);
    let (store, _) = index(dir.path()).await;
    assert_eq!(
        def(&store, "a/x.go", "Close", &["method", "Close", "Reader"]).min_prefix,
        "."
    );
    assert_eq!(
        def(&store, "a/x.go", "Close", &["method", "Close", "Writer"]).min_prefix,
        "a/x.go"
    );
    assert_eq!(def(&store, "a/x.go", "Reader", &["type"]).min_prefix, ".");
    assert_eq!(def(&store, "a/x.go", "Writer", &["type"]).min_prefix, "a/x.go");
}

#[tokio::test]
async fn test_dependency_edges_leave_scopes_alone() {
    let dir = project(true);
    let (store, _) = index(dir.path()).await;
    let deps = store.find_uses(&UseFilter::target().dependency(true));
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].dependency_path.as_deref(), Some("fmt"));
    assert_eq!(deps[0].target_identifier, "Println");
    assert_eq!(deps[0].using_identifier, "Foo");

    let before = store.all_defs();
    ScopeEngine::new(store.as_ref()).apply(&deps);
    assert_eq!(store.all_defs(), before);
}

#[tokio::test]
async fn test_rerunning_scope_fold_is_a_no_op() {
    let dir = project(true);
    let (store, _) = index(dir.path()).await;
    let before = store.all_defs();
    let report = ScopeEngine::new(store.as_ref()).apply(&store.all_uses());
    assert_eq!(report.widened, 0);
    assert_eq!(store.all_defs(), before);
}

#[tokio::test]
async fn test_missing_go_mod_keeps_file_local_scopes() {
    let dir = project(false);
    let (store, report) = index(dir.path()).await;
    assert!(report.module_error.is_some());
    assert!(report.module_path.is_none());
    assert!(store.def_count() > 0);
    assert_eq!(store.use_count(), 0);
    assert!(store.all_defs().iter().all(|d| d.min_prefix == d.rel_file));
}

#[tokio::test]
async fn test_outline_lists_escaping_summaries() {
    let dir = project(true);
    let (store, _) = index(dir.path()).await;
    let plugin = GoPlugin::new().unwrap();
    let walker = ProjectWalker::new(dir.path()).unwrap();
    let builder = OutlineBuilder::new(store.as_ref(), &walker, &plugin);

    let a = builder.render_node("a", true);
    assert!(a.contains("- a/x.go\n"), "{a}");
    assert!(a.contains("type Reader struct{}"));
    assert!(a.contains("func (r *Reader) Close() error"));
    assert!(a.contains("func Foo() {"));
    assert!(!a.contains("Writer"));
    assert!(!a.contains("helper"));

    // helper escapes its file but not its directory
    let x = builder.render_node("a/x.go", false);
    assert!(x.contains("func helper() {}"));

    assert!(builder.render_node("b", true).contains(NOTHING_ESCAPES));
    assert!(builder.render_node(".", true).contains(NOTHING_ESCAPES));
}

#[tokio::test]
async fn test_snapshot_round_trip_preserves_index() {
    let dir = project(true);
    let (store, report) = index(dir.path()).await;
    let path = dir.path().join("index.bin");
    Snapshot::capture(store.as_ref(), report.module_path.clone())
        .save(&path)
        .unwrap();

    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.module_path, report.module_path);
    let restored = loaded.into_store();
    assert_eq!(restored.all_defs(), store.all_defs());
    assert_eq!(restored.all_uses(), store.all_uses());
}
