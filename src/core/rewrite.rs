//! AST Tag Rewriter: replaces query-tagged templates with an inert string.
//!
//! Used by the build path, after the queries have been extracted and compiled.
//! Every tag in the module is checked and replaced, not just the first.

use async_graphql_parser::types::OperationType;
use swc_common::DUMMY_SP;
use swc_ecma_ast::{Expr, Lit, Module, Str};
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::core::{
    error::TagError,
    graphql::{Document, ExecutableDefinition},
    tag::{graphql_tag, is_query_tag},
};

/// String every query tag is replaced with.
pub const EXTRACTED_PLACEHOLDER: &str = "** extracted graphql fragment **";

/// Replace every query-tagged template in `module`.
///
/// Returns the number of replaced templates. On error the module may be
/// partially rewritten and should be discarded.
pub fn rewrite_module(module: &mut Module, tag: &str) -> Result<usize, TagError> {
    let mut rewriter = TagRewriter {
        tag,
        replaced: 0,
        error: None,
    };
    module.visit_mut_with(&mut rewriter);
    match rewriter.error {
        Some(err) => Err(err),
        None => Ok(rewriter.replaced),
    }
}

/// Check a tag's document the way the rewriter does, without rewriting.
pub fn check_tag_document(document: &Result<Document, TagError>) -> Result<(), TagError> {
    let document = document.as_ref().map_err(Clone::clone)?;
    if let Some(ExecutableDefinition::Operation { definition, .. }) = document.first() {
        match definition.node.ty {
            OperationType::Query => {}
            OperationType::Mutation => return Err(TagError::UnsupportedOperation("mutation")),
            OperationType::Subscription => {
                return Err(TagError::UnsupportedOperation("subscription"));
            }
        }
    }
    Ok(())
}

struct TagRewriter<'a> {
    tag: &'a str,
    replaced: usize,
    /// First error encountered; later tags are left alone.
    error: Option<TagError>,
}

impl VisitMut for TagRewriter<'_> {
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        if self.error.is_some() {
            return;
        }
        if let Expr::TaggedTpl(tpl) = &*expr
            && is_query_tag(tpl, self.tag)
        {
            if let Err(err) = check_tag_document(&graphql_tag(tpl)) {
                self.error = Some(err);
                return;
            }
            *expr = Expr::Lit(Lit::Str(Str {
                span: DUMMY_SP,
                value: EXTRACTED_PLACEHOLDER.into(),
                raw: None,
            }));
            self.replaced += 1;
            return;
        }
        expr.visit_mut_children_with(self);
    }
}
