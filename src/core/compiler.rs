//! Query Compiler: extracts, validates and prints every query in the project.
//!
//! A compile pass is stateless apart from the schema cache: every file is read
//! and parsed again, and either every query compiles or the pass fails.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::{
    config::Config,
    core::{
        error::CompileError,
        file_scanner::{SourceFilter, scan_files},
        graphql::{
            CompilerContext, Document, ExecutableDefinition, Node, STANDARD_RULES, Schema,
            SchemaCache, apply_print_transforms, convert_document, print_root_with_fragments,
            validate,
        },
        locations::Locations,
        parsers::jsx::parse_jsx_source,
        tag::primary_tag,
    },
};

/// A printed root query and the file defining it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledQuery {
    pub name: String,
    pub path: PathBuf,
    pub text: String,
}

/// Compiled root queries keyed by the absolute path of their source file.
pub type CompiledQueries = BTreeMap<PathBuf, Vec<CompiledQuery>>;

/// Runs a whole-project compile pass.
pub trait CompileQueries: Send + Sync {
    fn compile_all(&self) -> Result<CompiledQueries, CompileError>;
}

/// The query document extracted from one source file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub document: Document,
}

#[derive(Debug)]
pub struct QueryCompiler {
    base_dir: PathBuf,
    schema: SchemaCache,
    filter: SourceFilter,
    tag: String,
}

impl QueryCompiler {
    pub fn new(locations: &Locations, config: &Config) -> Self {
        Self {
            base_dir: locations.base_dir.clone(),
            schema: SchemaCache::new(&locations.schema_path),
            filter: SourceFilter::new(&locations.base_dir, &config.extensions, &config.ignores),
            tag: config.tag_name.clone(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn filter(&self) -> &SourceFilter {
        &self.filter
    }

    pub fn load_schema(&self) -> Result<Arc<Schema>, CompileError> {
        Ok(self.schema.load()?)
    }

    /// Extract the first query document of every source file, in path order.
    pub fn parse_everything(&self) -> Result<Vec<SourceDocument>, CompileError> {
        let files = scan_files(&self.base_dir, &self.filter)?;

        let results: Vec<_> = files
            .par_iter()
            .map(|path| self.parse_file(path))
            .collect();

        let mut documents = Vec::new();
        for result in results {
            if let Some(document) = result? {
                documents.push(document);
            }
        }
        debug!(
            files = files.len(),
            documents = documents.len(),
            "extracted query documents"
        );
        Ok(documents)
    }

    fn parse_file(&self, path: &Path) -> Result<Option<SourceDocument>, CompileError> {
        let code = fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // Files that never mention the tag are not parsed.
        if !code.contains(&self.tag) {
            return Ok(None);
        }

        let parsed =
            parse_jsx_source(code, path, Arc::default()).map_err(|e| CompileError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let Some((tag, others)) = primary_tag(&parsed.module, &self.tag) else {
            return Ok(None);
        };
        if others > 0 {
            debug!(file = %path.display(), others, "ignoring other query tags");
        }
        let document = tag.document.map_err(|source| CompileError::Tag {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(SourceDocument {
            path: path.to_path_buf(),
            document,
        }))
    }
}

impl CompileQueries for QueryCompiler {
    fn compile_all(&self) -> Result<CompiledQueries, CompileError> {
        let schema = self.load_schema()?;
        let documents = self.parse_everything()?;
        compile_documents(&schema, &documents)
    }
}

/// Validate, convert and print a set of documents as one project.
pub fn compile_documents(
    schema: &Schema,
    documents: &[SourceDocument],
) -> Result<CompiledQueries, CompileError> {
    // Last definition wins; duplicates are rejected when building the context.
    let mut name_paths: HashMap<&str, &Path> = HashMap::new();
    let mut fragment_types = HashMap::new();
    for source in documents {
        for definition in &source.document.definitions {
            if let Some(name) = definition.name() {
                name_paths.insert(name, &source.path);
            }
            if let ExecutableDefinition::Fragment { name, definition } = definition {
                fragment_types.insert(
                    name.clone(),
                    definition.node.type_condition.node.on.node.to_string(),
                );
            }
        }
    }

    let mut context = CompilerContext::new();
    for source in documents {
        let violations = validate(schema, &source.document, &fragment_types, STANDARD_RULES);
        if !violations.is_empty() {
            return Err(CompileError::Validation {
                path: source.path.clone(),
                violations,
            });
        }
        let nodes = convert_document(schema, &source.document).map_err(|violations| {
            CompileError::Validation {
                path: source.path.clone(),
                violations,
            }
        })?;
        for node in nodes {
            context
                .add(node)
                .map_err(|violation| CompileError::Validation {
                    path: source.path.clone(),
                    violations: vec![violation],
                })?;
        }
    }

    let unknown = context.check_fragment_references();
    if let Some(&(owner, _)) = unknown.first() {
        let path = name_paths.get(owner).copied();
        let violations = unknown
            .into_iter()
            .filter(|(other, _)| name_paths.get(other).copied() == path)
            .map(|(_, violation)| violation)
            .collect();
        return Err(CompileError::Validation {
            path: path.map(Path::to_path_buf).unwrap_or_default(),
            violations,
        });
    }

    let print_context = apply_print_transforms(&context, schema);

    let mut compiled = CompiledQueries::new();
    for node in context.documents() {
        let Node::Root(root) = node else {
            continue;
        };
        let Some(path) = name_paths.get(root.name.as_str()) else {
            continue;
        };
        let Some(text) = print_root_with_fragments(&print_context, &root.name) else {
            continue;
        };
        compiled
            .entry(path.to_path_buf())
            .or_default()
            .push(CompiledQuery {
                name: root.name.clone(),
                path: path.to_path_buf(),
                text,
            });
    }
    Ok(compiled)
}

#[cfg(test)]
mod tests;
