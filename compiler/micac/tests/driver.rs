//! Load-graph and phase-ordering tests against real files.

use std::fs;
use std::path::PathBuf;

use mica_diagnostic::Severity;
use micac::{Workspace, WorkspaceOptions};

/// A scratch workspace directory, removed on drop.
struct Scratch {
    root: PathBuf,
}

impl Scratch {
    fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!("micac-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).expect("create scratch dir");
        Scratch { root }
    }

    fn file(&self, rel: &str, contents: &str) {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(path, contents).expect("write source file");
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn compile(scratch: &Scratch, files: &[&str]) -> (bool, Workspace) {
    let mut workspace = Workspace::new(&scratch.root, "test", WorkspaceOptions::default());
    for file in files {
        workspace.add_source_file(*file);
    }
    let ok = workspace.compile();
    (ok, workspace)
}

#[test]
fn single_file_compiles() {
    let scratch = Scratch::new("single");
    scratch.file("main.mica", "func main() -> Void { }");

    let (ok, workspace) = compile(&scratch, &["main.mica"]);
    assert!(ok, "{:?}", workspace.handler().collected());
    assert!(workspace.module().entry_point.is_some());
}

#[test]
fn load_graph_closes_over_directives() {
    let scratch = Scratch::new("loads");
    scratch.file(
        "main.mica",
        "#load \"lib/util.mica\"\nfunc main() -> Void { helper() }",
    );
    scratch.file("lib/util.mica", "func helper() -> Void { }");

    let (ok, workspace) = compile(&scratch, &["main.mica"]);
    assert!(ok, "{:?}", workspace.handler().collected());
    assert_eq!(workspace.module().units.len(), 2);
}

#[test]
fn loads_resolve_relative_to_including_file() {
    let scratch = Scratch::new("relative");
    scratch.file(
        "src/main.mica",
        "#load \"sub/helper.mica\"\nfunc main() -> Void { helper() }",
    );
    scratch.file("src/sub/helper.mica", "func helper() -> Void { }");

    let (ok, workspace) = compile(&scratch, &["src/main.mica"]);
    assert!(ok, "{:?}", workspace.handler().collected());
}

#[test]
fn repeated_load_is_silently_skipped() {
    let scratch = Scratch::new("diamond");
    scratch.file(
        "main.mica",
        "#load \"a.mica\"\n#load \"b.mica\"\nfunc main() -> Void { }",
    );
    scratch.file("a.mica", "#load \"shared.mica\"\nvar a: Int");
    scratch.file("b.mica", "#load \"shared.mica\"\nvar b: Int");
    scratch.file("shared.mica", "var shared: Int");

    let (ok, workspace) = compile(&scratch, &["main.mica"]);
    assert!(ok, "{:?}", workspace.handler().collected());
    // shared.mica parsed exactly once.
    assert_eq!(workspace.module().units.len(), 4);
}

#[test]
fn duplicate_initial_file_is_a_diagnostic() {
    let scratch = Scratch::new("duplicate");
    scratch.file("main.mica", "func main() -> Void { }");

    let (ok, workspace) = compile(&scratch, &["main.mica", "main.mica"]);
    assert!(!ok);
    let messages: Vec<String> = workspace
        .handler()
        .collected()
        .into_iter()
        .map(|d| d.message)
        .collect();
    assert!(messages.iter().any(|m| m.contains("twice")), "{messages:?}");
}

#[test]
fn missing_file_is_a_diagnostic() {
    let scratch = Scratch::new("missing");

    let (ok, workspace) = compile(&scratch, &["nope.mica"]);
    assert!(!ok);
    assert_eq!(workspace.handler().count(Severity::Error), 1);
}

#[test]
fn declarations_are_visible_across_units() {
    let scratch = Scratch::new("crossunit");
    // main.mica references a function declared in a later-parsed unit.
    scratch.file(
        "main.mica",
        "#load \"lib.mica\"\nfunc main() -> Void { var s: Settings\n configure(s) }",
    );
    scratch.file(
        "lib.mica",
        "struct Settings { var verbose: Bool }\nfunc configure(s: Settings) -> Void { }",
    );

    let (ok, workspace) = compile(&scratch, &["main.mica"]);
    assert!(ok, "{:?}", workspace.handler().collected());
}

#[test]
fn parse_errors_gate_resolution() {
    let scratch = Scratch::new("gate");
    // The undefined identifier would be a resolution error, but the parse
    // error must stop the pipeline first; only the parse error is reported.
    scratch.file("main.mica", "func main( -> Void { undefined_name }");

    let (ok, workspace) = compile(&scratch, &["main.mica"]);
    assert!(!ok);
    let messages: Vec<String> = workspace
        .handler()
        .collected()
        .into_iter()
        .map(|d| d.message)
        .collect();
    assert!(
        !messages.iter().any(|m| m.contains("unresolved")),
        "resolution ran despite parse errors: {messages:?}"
    );
}

#[test]
fn type_errors_fail_compilation() {
    let scratch = Scratch::new("typefail");
    scratch.file(
        "main.mica",
        "func main() -> Void { var x: Int = true }",
    );

    let (ok, workspace) = compile(&scratch, &["main.mica"]);
    assert!(!ok);
    assert!(workspace.handler().has_errors());
}

#[test]
fn diagnostics_render_with_file_positions() {
    let scratch = Scratch::new("render");
    scratch.file("main.mica", "func main() -> Void { var x: Int = missing }");

    let (_ok, workspace) = compile(&scratch, &["main.mica"]);
    let rendered = mica_diagnostic::emitter::render(
        &workspace.handler().collected(),
        workspace.source_map(),
    );
    assert!(rendered.contains("main.mica:1:"), "{rendered}");
}
