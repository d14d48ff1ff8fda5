//! Locating tagged query templates in a parsed module.
//!
//! A match is a tagged template whose tag is the bare identifier configured as
//! the query tag (`graphql` by default). Each match records the variable it is
//! assigned to and whether it sits inside an exported declaration.

use swc_common::Span;
use swc_ecma_ast::{ExportDecl, Expr, Module, Pat, TaggedTpl, VarDeclarator};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::{
    error::TagError,
    graphql::{Document, parse_document},
};

/// Whether `tpl` is tagged with the identifier `tag`.
pub fn is_query_tag(tpl: &TaggedTpl, tag: &str) -> bool {
    matches!(&*tpl.tag, Expr::Ident(ident) if ident.sym.as_str() == tag)
}

/// Parse the text of a query-tagged template.
///
/// The template must be a single static section and must contain at least one
/// definition.
pub fn graphql_tag(tpl: &TaggedTpl) -> Result<Document, TagError> {
    let [quasi] = tpl.tpl.quasis.as_slice() else {
        return Err(TagError::Substitution);
    };
    let text = quasi.raw.as_str();
    if text.trim().is_empty() {
        return Err(TagError::Empty);
    }
    let document = parse_document(text).map_err(|err| TagError::Syntax(err.to_string()))?;
    if document.definitions.is_empty() {
        return Err(TagError::Empty);
    }
    Ok(document)
}

/// One query-tagged template found in a module.
#[derive(Debug, Clone)]
pub struct TagMatch {
    /// Identifier of the nearest enclosing variable declarator.
    pub binding: Option<String>,
    /// Whether the template is inside an exported declaration.
    pub exported: bool,
    pub span: Span,
    pub document: Result<Document, TagError>,
}

/// All query-tagged templates in `module`, in source order.
pub fn find_tags(module: &Module, tag: &str) -> Vec<TagMatch> {
    let mut collector = TagCollector {
        tag,
        export_depth: 0,
        bindings: Vec::new(),
        matches: Vec::new(),
    };
    module.visit_with(&mut collector);
    collector.matches
}

/// The template a module contributes to compilation and extraction: the first
/// exported one assigned to a variable.
///
/// Also returns how many other query tags the module holds; those are ignored.
pub fn primary_tag(module: &Module, tag: &str) -> Option<(TagMatch, usize)> {
    let matches = find_tags(module, tag);
    let others = matches.len().saturating_sub(1);
    matches
        .into_iter()
        .find(|found| found.exported && found.binding.is_some())
        .map(|found| (found, others))
}

struct TagCollector<'a> {
    tag: &'a str,
    export_depth: usize,
    /// Enclosing declarators, innermost last. `None` for destructuring patterns.
    bindings: Vec<Option<String>>,
    matches: Vec<TagMatch>,
}

impl Visit for TagCollector<'_> {
    fn visit_export_decl(&mut self, node: &ExportDecl) {
        self.export_depth += 1;
        node.visit_children_with(self);
        self.export_depth -= 1;
    }

    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        let binding = match &node.name {
            Pat::Ident(ident) => Some(ident.id.sym.to_string()),
            _ => None,
        };
        self.bindings.push(binding);
        node.visit_children_with(self);
        self.bindings.pop();
    }

    fn visit_tagged_tpl(&mut self, node: &TaggedTpl) {
        if is_query_tag(node, self.tag) {
            self.matches.push(TagMatch {
                binding: self.bindings.last().cloned().flatten(),
                exported: self.export_depth > 0,
                span: node.span,
                document: graphql_tag(node),
            });
        }
        node.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::parsers::jsx::parse_module_source;

    fn tags(code: &str) -> Vec<TagMatch> {
        let module = parse_module_source(code.to_string(), Path::new("src/pages/a.js")).unwrap();
        find_tags(&module, "graphql")
    }

    #[test]
    fn test_finds_exported_page_query() {
        let matches = tags(
            r#"
            import React from "react";
            export default function Page() { return <div />; }
            export const pageQuery = graphql`query PageA { site { title } }`;
            "#,
        );

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].binding.as_deref(), Some("pageQuery"));
        assert!(matches[0].exported);
        let document = matches[0].document.as_ref().unwrap();
        assert_eq!(document.first().unwrap().name(), Some("PageA"));
    }

    #[test]
    fn test_unexported_and_unbound_matches() {
        let matches = tags(
            r#"
            const local = graphql`query Local { site { title } }`;
            run(graphql`query Inline { site { title } }`);
            "#,
        );

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].binding.as_deref(), Some("local"));
        assert!(!matches[0].exported);
        assert_eq!(matches[1].binding, None);
    }

    #[test]
    fn test_nearest_declarator_wins() {
        let matches = tags(
            r#"
            export const outer = () => {
              const inner = graphql`query Nested { site { title } }`;
              return inner;
            };
            "#,
        );
        assert_eq!(matches[0].binding.as_deref(), Some("inner"));
        assert!(matches[0].exported);
    }

    #[test]
    fn test_other_tags_are_ignored() {
        let matches = tags(
            r#"
            export const style = css`color: red;`;
            export const member = lib.graphql`query A { site { title } }`;
            "#,
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn test_substitution_is_rejected() {
        let matches = tags(
            r#"export const q = graphql`query A { site { ...${fragment} } }`;"#,
        );
        assert_eq!(matches[0].document.as_ref().unwrap_err(), &TagError::Substitution);
    }

    #[test]
    fn test_empty_tag_is_rejected() {
        let matches = tags("export const q = graphql`  `;");
        assert_eq!(matches[0].document.as_ref().unwrap_err(), &TagError::Empty);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let matches = tags("export const q = graphql`query A { site { title }`;");
        assert!(matches!(
            matches[0].document.as_ref().unwrap_err(),
            TagError::Syntax(_)
        ));
    }

    #[test]
    fn test_primary_tag_skips_local_and_unbound_tags() {
        let module = parse_module_source(
            r#"
            const helper = graphql`query Helper { site { title } }`;
            export default register(graphql`query Inline { site { title } }`);
            export const pageQuery = graphql`query PageA { site { title } }`;
            "#
            .to_string(),
            Path::new("src/pages/a.js"),
        )
        .unwrap();

        let (found, others) = primary_tag(&module, "graphql").unwrap();
        assert_eq!(found.binding.as_deref(), Some("pageQuery"));
        assert_eq!(others, 2);
    }

    #[test]
    fn test_no_primary_tag_without_exported_binding() {
        let module = parse_module_source(
            "const helper = graphql`query Helper { site { title } }`;".to_string(),
            Path::new("src/pages/a.js"),
        )
        .unwrap();

        assert!(primary_tag(&module, "graphql").is_none());
    }
}
