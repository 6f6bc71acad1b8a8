// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Source loading with `include`/`use` resolution
//!
//! Parsed files are memoized per absolute path and revalidated against the
//! file's modification time and size. A program keeps the resolved copies of
//! the files it included when it was parsed, so editing an included file only
//! shows up in includers that are themselves reparsed.

use super::grammar::parse_program;
use super::syntax::{Program, Stmt, StmtKind};
use crate::diagnostics::LogSink;
use crate::parser::ParseError;
use ahash::AHashMap;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;
use thiserror::Error;

/// Failure to load the top-level program; nested files only log
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}\n{source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

#[derive(Debug, Clone)]
struct CachedFile {
    program: Rc<Program>,
    modified: Option<SystemTime>,
    size: u64,
}

#[derive(Debug)]
pub struct Loader {
    search_paths: Vec<PathBuf>,
    packrat: bool,
    cache: RefCell<AHashMap<PathBuf, CachedFile>>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(vec![PathBuf::from(".")])
    }
}

impl Loader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            packrat: false,
            cache: RefCell::new(AHashMap::new()),
        }
    }

    /// Parse with the memoizing cache enabled
    pub fn with_packrat(mut self, packrat: bool) -> Self {
        self.packrat = packrat;
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Number of files currently memoized
    pub fn cached_files(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Parse `source` under the virtual file name `name` and resolve its includes
    pub fn load_source(&self, sink: &dyn LogSink, source: &str, name: &str) -> Result<Program, LoadError> {
        let path = PathBuf::from(name);
        let mut program = parse_program(source, Some(path.clone()), self.packrat)
            .map_err(|source| LoadError::Parse { path, source })?;

        let mut stack = Vec::new();
        self.resolve(sink, &mut program, &mut stack);
        Ok(program)
    }

    /// Load a file from disk, reusing the memoized parse when it is current
    pub fn load_file(&self, sink: &dyn LogSink, path: &Path) -> Result<Rc<Program>, LoadError> {
        let io_error = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let absolute = fs::canonicalize(path).map_err(io_error)?;
        let metadata = fs::metadata(&absolute).map_err(io_error)?;
        if let Some(program) = self.cached(&absolute, &metadata) {
            return Ok(program);
        }

        let text = fs::read_to_string(&absolute).map_err(io_error)?;
        let mut program = parse_program(&text, Some(absolute.clone()), self.packrat).map_err(|source| {
            LoadError::Parse {
                path: absolute.clone(),
                source,
            }
        })?;

        let mut stack = vec![absolute.clone()];
        self.resolve(sink, &mut program, &mut stack);
        Ok(self.store(absolute, &metadata, program))
    }

    /// First existing `name` in the includer's directory, then in the search paths
    pub fn find(&self, base: Option<&Path>, name: &str) -> Option<PathBuf> {
        let candidate = Path::new(name);
        if candidate.is_absolute() {
            return candidate.is_file().then(|| candidate.to_path_buf());
        }
        base.into_iter()
            .chain(self.search_paths.iter().map(PathBuf::as_path))
            .map(|dir| dir.join(candidate))
            .find(|p| p.is_file())
    }

    fn cached(&self, absolute: &Path, metadata: &fs::Metadata) -> Option<Rc<Program>> {
        let cache = self.cache.borrow();
        let entry = cache.get(absolute)?;
        if entry.modified == metadata.modified().ok() && entry.size == metadata.len() {
            tracing::debug!("loader cache hit for {}", absolute.display());
            Some(entry.program.clone())
        } else {
            None
        }
    }

    fn store(&self, absolute: PathBuf, metadata: &fs::Metadata, program: Program) -> Rc<Program> {
        let program = Rc::new(program);
        self.cache.borrow_mut().insert(
            absolute,
            CachedFile {
                program: program.clone(),
                modified: metadata.modified().ok(),
                size: metadata.len(),
            },
        );
        program
    }

    fn resolve(&self, sink: &dyn LogSink, program: &mut Program, stack: &mut Vec<PathBuf>) {
        let base = program
            .path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);
        self.resolve_statements(sink, base.as_deref(), &mut program.statements, stack);
    }

    fn resolve_statements(
        &self,
        sink: &dyn LogSink,
        base: Option<&Path>,
        statements: &mut [Stmt],
        stack: &mut Vec<PathBuf>,
    ) {
        for stmt in statements {
            self.resolve_statement(sink, base, stmt, stack);
        }
    }

    fn resolve_statement(&self, sink: &dyn LogSink, base: Option<&Path>, stmt: &mut Stmt, stack: &mut Vec<PathBuf>) {
        match &mut stmt.kind {
            StmtKind::Include { path, program } | StmtKind::Use { path, program } => {
                *program = self.load_nested(sink, base, path, stack);
            }
            StmtKind::Block(statements) => self.resolve_statements(sink, base, statements, stack),
            StmtKind::Instance { child, .. } => self.resolve_statement(sink, base, child, stack),
            StmtKind::Modified { stmt, .. } => self.resolve_statement(sink, base, stmt, stack),
            StmtKind::IfElse { then, otherwise, .. } => {
                self.resolve_statement(sink, base, then, stack);
                if let Some(otherwise) = otherwise {
                    self.resolve_statement(sink, base, otherwise, stack);
                }
            }
            StmtKind::ModuleDef(def) => {
                let def = Rc::make_mut(def);
                self.resolve_statement(sink, base, &mut def.body, stack);
            }
            _ => {}
        }
    }

    fn load_nested(
        &self,
        sink: &dyn LogSink,
        base: Option<&Path>,
        name: &str,
        stack: &mut Vec<PathBuf>,
    ) -> Option<Rc<Program>> {
        let Some(found) = self.find(base, name) else {
            sink.log(&format!("ERROR: Can't find file {}", name));
            return None;
        };
        let absolute = fs::canonicalize(&found).unwrap_or(found);
        if stack.contains(&absolute) {
            sink.log(&format!("ERROR: Recursive include of {}", absolute.display()));
            return None;
        }

        let metadata = match fs::metadata(&absolute) {
            Ok(metadata) => metadata,
            Err(e) => {
                sink.log(&format!("ERROR: Can't read file {}: {}", absolute.display(), e));
                return None;
            }
        };
        if let Some(program) = self.cached(&absolute, &metadata) {
            return Some(program);
        }

        let text = match fs::read_to_string(&absolute) {
            Ok(text) => text,
            Err(e) => {
                sink.log(&format!("ERROR: Can't read file {}: {}", absolute.display(), e));
                return None;
            }
        };
        let mut program = match parse_program(&text, Some(absolute.clone()), self.packrat) {
            Ok(program) => program,
            Err(e) => {
                sink.log(&format!("ERROR: Error in {}\n{}", absolute.display(), e.render(2)));
                return None;
            }
        };

        stack.push(absolute.clone());
        self.resolve(sink, &mut program, stack);
        stack.pop();
        Some(self.store(absolute, &metadata, program))
    }
}
