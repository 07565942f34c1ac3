//! The workspace: load-graph driver and phase orchestration.
//!
//! Parsing maintains a queue of files. Each dequeued file is read, lexed
//! with the next global span base and parsed into a source unit; every
//! `#load` directive it contains enqueues its target, interpreted relative
//! to the including file and then resolved against the workspace root. A
//! path already parsed is silently skipped when re-seen through the queue;
//! a duplicate initial file is a diagnostic. The parse phase terminates
//! when the queue drains.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::{debug, info_span};

use mica_diagnostic::{emitter, Handler, SourceMap};
use mica_ir::{pretty, AstArena, Module, NodeId, NodeKind, SharedInterner, Span};
use mica_parse::OperatorTable;
use mica_sema::{Resolver, ScopeTree};
use mica_typeck::TypeChecker;
use mica_types::TypeTable;

/// Driver options, mirrored from the CLI surface.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceOptions {
    /// Print each parsed source unit back as source and stop after parsing.
    pub dump_ast: bool,
    /// Print the scope tree after resolution.
    pub dump_scopes: bool,
    /// Stop after type checking (no back-end hand-off).
    pub check_only: bool,
    /// Entry-point function name. Defaults to `main`.
    pub entry_name: Option<String>,
}

/// Per-module compilation state and the load-graph queue.
pub struct Workspace {
    root: PathBuf,
    options: WorkspaceOptions,
    interner: SharedInterner,
    source_map: SourceMap,
    arena: AstArena,
    scopes: ScopeTree,
    types: TypeTable,
    handler: Handler,
    ops: OperatorTable,
    module: Module,
    /// Relative paths still to parse.
    queue: VecDeque<PathBuf>,
    /// Absolute paths ever enqueued; membership makes re-loads no-ops.
    seen: Vec<PathBuf>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, module_name: &str, options: WorkspaceOptions) -> Self {
        let interner = SharedInterner::new();
        let ops = OperatorTable::new(&interner);
        let types = TypeTable::new(interner.clone());
        let entry = options.entry_name.as_deref().unwrap_or("main");
        let module = Module::new(interner.intern(module_name), interner.intern(entry));
        Workspace {
            root: root.into(),
            options,
            interner,
            source_map: SourceMap::new(),
            arena: AstArena::new(),
            scopes: ScopeTree::new(),
            types,
            handler: Handler::new(),
            ops,
            module,
            queue: VecDeque::new(),
            seen: Vec::new(),
        }
    }

    /// Seed the queue with an initial source file (relative to the root).
    ///
    /// Adding the same file twice is a diagnostic.
    pub fn add_source_file(&mut self, path: impl Into<PathBuf>) {
        let rel = path.into();
        let abs = self.root.join(&rel);
        if self.seen.contains(&abs) {
            self.handler.error(
                Span::DUMMY,
                format!("cannot load source file at path '{}' twice", rel.display()),
            );
            return;
        }
        self.seen.push(abs);
        self.queue.push_back(rel);
    }

    /// Run all phases in order. Returns `true` when no Error or Critical
    /// diagnostic was reported.
    pub fn compile(&mut self) -> bool {
        {
            let _span = info_span!("parse").entered();
            self.parse_phase();
        }

        if self.options.dump_ast {
            for &unit in &self.module.units {
                print!("{}", pretty::print(&self.arena, &self.interner, unit));
            }
            return !self.handler.has_errors();
        }
        if self.handler.has_errors() {
            return false;
        }

        {
            let _span = info_span!("resolve").entered();
            Resolver::new(
                &mut self.arena,
                &mut self.scopes,
                &mut self.types,
                &self.interner,
                &self.handler,
            )
            .resolve_module(&self.module);
        }

        if self.options.dump_scopes {
            print!("{}", self.scopes.dump(&self.interner));
        }
        if self.handler.has_errors() {
            return false;
        }

        {
            let _span = info_span!("typecheck").entered();
            TypeChecker::new(
                &mut self.arena,
                &self.scopes,
                &mut self.types,
                &self.interner,
                &self.handler,
            )
            .check_module(&mut self.module);
        }

        !self.handler.has_errors()
    }

    fn parse_phase(&mut self) {
        while let Some(rel) = self.queue.pop_front() {
            let abs = self.root.join(&rel);
            let source = match std::fs::read_to_string(&abs) {
                Ok(source) => source,
                Err(_) => {
                    self.handler.error(
                        Span::DUMMY,
                        format!("file not found: '{}'", rel.display()),
                    );
                    continue;
                }
            };

            debug!(file = %rel.display(), bytes = source.len(), "parsing");
            let base = self
                .source_map
                .add_file(rel.display().to_string(), source.clone());
            let tokens = mica_lexer::lex(&source, base, &self.interner);
            let path_name = self.interner.intern(&rel.display().to_string());
            let unit = mica_parse::parse_source_unit(
                path_name,
                &tokens,
                &mut self.arena,
                &self.ops,
                &self.interner,
                &self.handler,
            );
            self.module.units.push(unit);
            self.perform_loads(unit, &rel);
        }
    }

    /// Enqueue the target of every `#load` directive in a freshly parsed
    /// unit. Targets resolve relative to the including file's directory,
    /// then against the workspace root.
    fn perform_loads(&mut self, unit: NodeId, including: &Path) {
        let NodeKind::SourceUnit { decls, .. } = self.arena.kind(unit) else {
            return;
        };
        let including_dir = including.parent().unwrap_or(Path::new("")).to_path_buf();

        for &decl in self.arena.list(decls).to_vec().iter() {
            let NodeKind::Load { path, .. } = self.arena.kind(decl) else {
                continue;
            };
            let rel = including_dir.join(self.interner.lookup(path));
            let abs = self.root.join(&rel);
            if self.seen.contains(&abs) {
                // Already parsed or queued through another route.
                continue;
            }
            debug!(file = %rel.display(), "discovered load");
            self.seen.push(abs);
            self.queue.push_back(rel);
        }
    }

    /// The diagnostic sink.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// The source map, for rendering diagnostics.
    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// The compiled module root (the back-end hand-off point).
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Render all collected diagnostics to stderr.
    pub fn report(&self) {
        emitter::emit(&self.handler.collected(), &self.source_map);
    }
}
