//! Tag Extractor: page queries of a single source file.
//!
//! Only the first tagged template that is exported and assigned to a variable
//! is considered, the same one the compiler compiles. The compiled text is not
//! produced here: it is read back from the artifact the compiler generated for
//! the operation.

use std::{collections::BTreeMap, fs, path::Path};

use async_graphql_parser::types::OperationType;
use swc_ecma_ast::Module;
use tracing::debug;

use crate::core::{
    artifacts::artifact_path,
    error::ExtractError,
    graphql::ExecutableDefinition,
    parsers::jsx::parse_module_source,
    tag::primary_tag,
};

/// Identifier the page component assigns its query to.
pub const PAGE_QUERY_BINDING: &str = "pageQuery";

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Query tag identifier.
    pub tag: String,
    /// Extension of generated artifacts.
    pub generated_extension: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            tag: "graphql".to_string(),
            generated_extension: "graphql".to_string(),
        }
    }
}

/// Compiled query text keyed by the identifier it is assigned to.
///
/// Artifacts are read from disk on every call, never cached: in watch mode the
/// compiler may have just rewritten them.
pub fn extract_queries(
    module: &Module,
    file_path: &Path,
    options: &ExtractOptions,
) -> Result<BTreeMap<String, String>, ExtractError> {
    let mut queries = BTreeMap::new();

    let Some((tag, others)) = primary_tag(module, &options.tag) else {
        return Ok(queries);
    };
    if others > 0 {
        debug!(file = %file_path.display(), others, "ignoring other query tags");
    }

    let document = tag.document.map_err(|source| ExtractError::Tag {
        path: file_path.to_path_buf(),
        source,
    })?;
    let Some(binding) = tag.binding else {
        return Ok(queries);
    };

    let name = match document.first() {
        Some(ExecutableDefinition::Operation {
            name: Some(name),
            definition,
        }) if definition.node.ty == OperationType::Query => name.clone(),
        _ => return Ok(queries),
    };

    let path = artifact_path(file_path, &name, &options.generated_extension);
    let text = fs::read_to_string(&path).map_err(|source| ExtractError::MissingArtifact {
        name: name.clone(),
        path: path.clone(),
        source,
    })?;
    queries.insert(binding, text.trim().to_string());
    Ok(queries)
}

/// Read, parse and extract the queries of one file.
pub fn extract_file_queries(
    file_path: &Path,
    options: &ExtractOptions,
) -> Result<BTreeMap<String, String>, ExtractError> {
    let code = fs::read_to_string(file_path).map_err(|source| ExtractError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;
    let module = parse_module_source(code, file_path).map_err(|e| ExtractError::Parse {
        path: file_path.to_path_buf(),
        message: e.to_string(),
    })?;
    extract_queries(&module, file_path, options)
}

/// The compiled page query of a component file, if it exports one.
pub fn extract_page_query(
    file_path: &Path,
    options: &ExtractOptions,
) -> Result<Option<String>, ExtractError> {
    let mut queries = extract_file_queries(file_path, options)?;
    Ok(queries.remove(PAGE_QUERY_BINDING))
}

#[cfg(test)]
mod tests;
