use defscope_core::identity::{DefKind, tag};
use defscope_core::model::{ConstructRef, ContentRange, Definition, UsageEdge};
use defscope_core::path;
use defscope_core::scope::ScopeEngine;
use defscope_core::store::{DefinitionStore, MemoryStore, Snapshot};

fn func(file: &str, name: &str, line: usize) -> Definition {
    let range = ContentRange::new(line, line + 1, 0, 0);
    Definition::new(file, name, tag(DefKind::Function, name, None), range, range)
}

fn site(file: &str, name: &str) -> ConstructRef {
    ConstructRef::new(file, name, tag(DefKind::Function, name, None))
}

fn uses(target_file: &str, target: &str, users: &[&str]) -> Vec<UsageEdge> {
    users
        .iter()
        .map(|user| UsageEdge::internal(site(user, "user"), site(target_file, target)))
        .collect()
}

fn store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_defs(vec![
        func("svc/api/http/server.go", "Serve", 1),
        func("svc/api/http/server.go", "route", 5),
        func("svc/api/grpc/server.go", "Serve", 1),
        func("lib/util.go", "Clamp", 1),
    ]);
    store
}

fn edges() -> Vec<UsageEdge> {
    let mut edges = uses(
        "svc/api/http/server.go",
        "Serve",
        &["svc/api/http/mux.go", "svc/api/grpc/bridge.go"],
    );
    edges.extend(uses(
        "svc/api/http/server.go",
        "route",
        &["svc/api/http/mux.go"],
    ));
    edges.extend(uses("lib/util.go", "Clamp", &["svc/main.go", "cmd/tool/main.go"]));
    edges
}

fn scopes(store: &MemoryStore) -> Vec<(String, String, String)> {
    store
        .all_defs()
        .into_iter()
        .map(|d| (d.rel_file, d.identifier, d.min_prefix))
        .collect()
}

#[test]
fn test_min_prefix_is_lca_of_using_directories() {
    let store = store();
    let report = ScopeEngine::new(&store).apply(&edges());
    assert_eq!(report.not_found, 0);

    assert_eq!(
        scopes(&store),
        vec![
            ("lib/util.go".into(), "Clamp".into(), ".".into()),
            ("svc/api/grpc/server.go".into(), "Serve".into(), "svc/api/grpc/server.go".into()),
            ("svc/api/http/server.go".into(), "Serve".into(), "svc/api".into()),
            ("svc/api/http/server.go".into(), "route".into(), "svc/api/http".into()),
        ]
    );
}

#[test]
fn test_every_permutation_converges_to_the_same_scopes() {
    let reference = store();
    ScopeEngine::new(&reference).apply(&edges());
    let expected = scopes(&reference);

    let base = edges();
    for rotation in 0..base.len() {
        let mut order = base.clone();
        order.rotate_left(rotation);
        order.reverse();
        let store = store();
        for edge in &order {
            ScopeEngine::new(&store).apply_edge(edge);
        }
        assert_eq!(scopes(&store), expected, "rotation {rotation}");
    }
}

#[test]
fn test_escaping_definitions_per_tree_level() {
    let store = store();
    ScopeEngine::new(&store).apply(&edges());

    let names = |p: &str| -> Vec<String> {
        store
            .defs_escaping(p)
            .into_iter()
            .map(|d| format!("{}#{}", d.rel_file, d.identifier))
            .collect()
    };
    assert!(names(path::ROOT).is_empty());
    assert_eq!(names("lib"), vec!["lib/util.go#Clamp"]);
    assert!(names("svc").is_empty());
    assert!(names("svc/api").is_empty());
    assert_eq!(names("svc/api/http"), vec!["svc/api/http/server.go#Serve"]);
    assert_eq!(
        names("svc/api/http/server.go"),
        vec!["svc/api/http/server.go#Serve", "svc/api/http/server.go#route"]
    );
    assert!(names("svc/api/grpc").is_empty());
}

#[test]
fn test_corrupt_snapshot_means_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.bin");
    std::fs::write(&path, b"not a snapshot").unwrap();
    assert!(Snapshot::load(&path).unwrap().is_none());
    assert!(!path.exists());
}
