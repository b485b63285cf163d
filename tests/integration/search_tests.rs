use anyhow::Result;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

use gosymbols::extractor::DeclarationKind;
use gosymbols::indexing::{FailureStage, SearchOptions, SymbolSearch};
use gosymbols::{Config, SearchError, Symbol, SymbolKind};

use crate::helpers::test_utils::{write_file, write_scenario, DenyingFs, StubExtractor};

fn go_search() -> SymbolSearch {
    SymbolSearch::from_config(&Config::default())
}

fn names(symbols: &[Symbol]) -> Vec<String> {
    let mut names: Vec<String> = symbols.iter().map(|s| s.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_scenario_single_match() -> Result<()> {
    let dir = tempdir()?;
    write_scenario(dir.path());

    let report = go_search().run(dir.path(), "wid").await?;

    assert_eq!(report.symbols.len(), 1);
    let widget = &report.symbols[0];
    assert_eq!(widget.name, "Widget");
    assert_eq!(widget.kind, SymbolKind::Interface);
    assert_eq!(widget.package, "pkga");
    assert!(Path::new(&widget.path).ends_with("pkgA/a.go"));
    assert_eq!(widget.line, 4);
    assert_eq!(widget.character, 0);
    assert_eq!(report.packages, 2);

    Ok(())
}

#[tokio::test]
async fn test_empty_query_matches_everything() -> Result<()> {
    let dir = tempdir()?;
    write_scenario(dir.path());

    let report = go_search().run(dir.path(), "").await?;

    assert_eq!(names(&report.symbols), vec!["DoThing", "Gadget", "Widget"]);
    let kinds: Vec<_> = report
        .symbols
        .iter()
        .map(|s| (s.name.as_str(), s.kind))
        .collect();
    assert!(kinds.contains(&("DoThing", SymbolKind::Func)));
    assert!(kinds.contains(&("Gadget", SymbolKind::Type)));

    Ok(())
}

#[tokio::test]
async fn test_query_is_case_insensitive() -> Result<()> {
    let dir = tempdir()?;
    write_file(
        dir.path(),
        "lib/lib.go",
        "package lib\n\nfunc FooBar() {}\n\nfunc barFOO() {}\n\nfunc Baz() {}\n",
    );

    let report = go_search().run(dir.path(), "foo").await?;
    assert_eq!(names(&report.symbols), vec!["FooBar", "barFOO"]);

    let upper = go_search().run(dir.path(), "FOO").await?;
    assert_eq!(upper.symbols.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_src_layout_resolves_under_src() -> Result<()> {
    let dir = tempdir()?;
    write_scenario(&dir.path().join("src"));
    write_file(dir.path(), "pkg/ignored/x.go", "package ignored\n\nfunc Outside() {}\n");

    let report = go_search().run(dir.path(), "").await?;

    assert_eq!(names(&report.symbols), vec!["DoThing", "Gadget", "Widget"]);
    assert!(report
        .symbols
        .iter()
        .all(|s| Path::new(&s.path).starts_with(dir.path().join("src"))));

    Ok(())
}

#[tokio::test]
async fn test_excluded_directories_are_not_searched() -> Result<()> {
    let dir = tempdir()?;
    write_file(dir.path(), "pkg/ok.go", "package pkg\n\nfunc Visible() {}\n");
    write_file(dir.path(), ".hidden/h.go", "package hidden\n\nfunc Hidden() {}\n");
    write_file(dir.path(), "_old/o.go", "package old\n\nfunc Old() {}\n");
    write_file(dir.path(), "pkg/testdata/t.go", "package td\n\nfunc Fixture() {}\n");
    write_file(dir.path(), "builtin/b.go", "package builtin\n\nfunc Builtin() {}\n");
    write_file(dir.path(), "pkg/builtin/b.go", "package builtin\n\nfunc Nested() {}\n");

    let report = go_search().run(dir.path(), "").await?;

    assert_eq!(names(&report.symbols), vec!["Nested", "Visible"]);

    Ok(())
}

#[tokio::test]
async fn test_files_in_root_are_not_a_package() -> Result<()> {
    let dir = tempdir()?;
    write_file(dir.path(), "main.go", "package main\n\nfunc RootLevel() {}\n");

    let report = go_search().run(dir.path(), "").await?;

    assert!(report.symbols.is_empty());
    assert_eq!(report.packages, 0);
    assert_eq!(report.to_json()?, "[]");

    Ok(())
}

#[tokio::test]
async fn test_empty_tree_terminates() -> Result<()> {
    let dir = tempdir()?;

    let report = go_search().run(dir.path(), "anything").await?;

    assert!(report.symbols.is_empty());
    assert!(report.failures.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_single_file_without_matches() -> Result<()> {
    let dir = tempdir()?;
    write_file(dir.path(), "only/only.go", "package only\n\nfunc Lonely() {}\n");

    let report = go_search().run(dir.path(), "nomatch").await?;

    assert!(report.symbols.is_empty());
    assert_eq!(report.packages, 1);

    Ok(())
}

#[tokio::test]
async fn test_listing_failure_is_isolated() -> Result<()> {
    let dir = tempdir()?;
    write_scenario(dir.path());
    write_file(dir.path(), "locked/inner/x.go", "package inner\n\nfunc Secret() {}\n");

    let search = go_search().with_filesystem(Arc::new(DenyingFs {
        deny: dir.path().join("locked"),
    }));
    let report = search.run(dir.path(), "").await?;

    assert_eq!(names(&report.symbols), vec!["DoThing", "Gadget", "Widget"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].import_path, "locked");
    assert_eq!(report.failures[0].stage, FailureStage::Listing);
    // pkgA, pkgB and the locked directory itself
    assert_eq!(report.packages, 3);

    Ok(())
}

#[tokio::test]
async fn test_unreadable_src_root_fails() -> Result<()> {
    let dir = tempdir()?;
    std::fs::create_dir(dir.path().join("src"))?;

    let search = go_search().with_filesystem(Arc::new(DenyingFs {
        deny: dir.path().join("src"),
    }));
    let result = search.run(dir.path(), "").await;

    assert!(matches!(result, Err(SearchError::RootUnreadable { .. })));

    Ok(())
}

#[tokio::test]
async fn test_missing_root_fails() -> Result<()> {
    let dir = tempdir()?;

    let result = go_search().run(&dir.path().join("missing"), "").await;

    match result {
        Err(SearchError::RootUnreadable { path, .. }) => {
            assert_eq!(path, dir.path().join("missing"));
        }
        other => panic!("expected RootUnreadable, got {:?}", other.map(|r| r.symbols)),
    }

    Ok(())
}

#[tokio::test]
async fn test_same_position_different_kind_not_deduplicated() -> Result<()> {
    let dir = tempdir()?;
    std::fs::create_dir(dir.path().join("pkg"))?;

    let search = SymbolSearch::new(
        Arc::new(StubExtractor {
            declarations: vec![
                ("Handler".to_string(), DeclarationKind::Function),
                ("Handler".to_string(), DeclarationKind::TypeDeclaration),
            ],
        }),
        SearchOptions::default(),
    );
    let report = search.run(dir.path(), "handler").await?;

    assert_eq!(report.symbols.len(), 2);
    let first = &report.symbols[0];
    let second = &report.symbols[1];
    assert_eq!((&first.name, &first.path, first.line), (&second.name, &second.path, second.line));
    assert_ne!(first.kind, second.kind);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_progress_is_strictly_increasing() -> Result<()> {
    let dir = tempdir()?;
    for i in 0..30 {
        write_file(
            dir.path(),
            &format!("group{}/pkg{}/p.go", i % 3, i),
            &format!("package pkg{i}\n\nfunc Func{i}() {{}}\n"),
        );
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let options = SearchOptions {
        max_concurrent_listings: 2,
        max_concurrent_parses: 3,
        queue_capacity: 4,
    };
    let search = SymbolSearch::new(
        Arc::new(gosymbols::extractor::GoExtractor::default()),
        options,
    );

    let report = search
        .run_with_progress(
            dir.path(),
            "func",
            Arc::new(move |completed: usize, total: usize| {
                sink_seen.lock().unwrap().push((completed, total));
            }),
        )
        .await?;

    // 3 group directories plus 30 packages
    assert_eq!(report.packages, 33);
    assert_eq!(report.symbols.len(), 30);

    let seen = seen.lock().unwrap();
    let completed: Vec<usize> = seen.iter().map(|(c, _)| *c).collect();
    assert_eq!(completed, (1..=33).collect::<Vec<_>>());
    assert!(seen.iter().all(|(c, t)| c <= t && *t <= 33));
    assert_eq!(seen.last(), Some(&(33, 33)));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_are_independent() -> Result<()> {
    let first_dir = tempdir()?;
    let second_dir = tempdir()?;
    write_scenario(first_dir.path());
    write_file(second_dir.path(), "other/o.go", "package other\n\nfunc Elsewhere() {}\n");

    let search = go_search();
    let (first, second) = tokio::join!(
        search.run(first_dir.path(), ""),
        search.run(second_dir.path(), "")
    );

    assert_eq!(names(&first?.symbols), vec!["DoThing", "Gadget", "Widget"]);
    assert_eq!(names(&second?.symbols), vec!["Elsewhere"]);

    Ok(())
}

#[tokio::test]
async fn test_json_output_fields() -> Result<()> {
    let dir = tempdir()?;
    write_scenario(dir.path());

    let report = go_search().run(dir.path(), "gadget").await?;
    let value: serde_json::Value = serde_json::from_str(&report.to_json()?)?;

    let entry = &value[0];
    assert_eq!(entry["name"], "Gadget");
    assert_eq!(entry["kind"], "type");
    assert_eq!(entry["package"], "pkgb");
    assert_eq!(entry["line"], 2);
    assert_eq!(entry["character"], 0);
    assert!(entry["path"].as_str().unwrap().ends_with("b.go"));

    Ok(())
}
