use std::fs;

use pretty_assertions::assert_eq;
use tempfile::{TempDir, tempdir};

use super::*;
use crate::core::{
    artifacts::{ArtifactWriter, FsArtifactWriter},
    error::{SchemaError, TagError},
    extract::{ExtractOptions, extract_page_query},
};

const SCHEMA: &str = r#"
type Query {
  site: Site
  allPages(limit: Int): [Page]
}

type Site {
  title: String
  description: String
}

type Page {
  path: String
}
"#;

const PAGE_A: &str = r#"
import React from "react";

export default function PageA({ data }) {
  return <h1>{data.site.title}</h1>;
}

export const pageQuery = graphql`
  query PageA { site { title } }
`;
"#;

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let project = Self {
            dir: tempdir().unwrap(),
        };
        project.write(".cache/schema.graphql", SCHEMA);
        project
    }

    fn write(&self, path: &str, content: &str) {
        let path = self.dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn source(&self, path: &str) -> PathBuf {
        self.dir.path().join("src").join(path)
    }

    fn compiler(&self) -> QueryCompiler {
        let config = Config::default();
        QueryCompiler::new(&Locations::resolve(self.dir.path(), &config), &config)
    }
}

#[test]
fn test_compile_single_page_query() {
    let project = Project::new();
    project.write("src/pages/a.js", PAGE_A);

    let compiled = project.compiler().compile_all().unwrap();

    let page = project.source("pages/a.js");
    assert_eq!(
        compiled,
        CompiledQueries::from([(
            page.clone(),
            vec![CompiledQuery {
                name: "PageA".to_string(),
                path: page,
                text: "query PageA {\n  site {\n    title\n  }\n}\n".to_string(),
            }],
        )])
    );
}

#[test]
fn test_unknown_field_fails_validation() {
    let project = Project::new();
    project.write("src/pages/a.js", &PAGE_A.replace("title }", "titlex }"));

    let err = project.compiler().compile_all().unwrap_err();

    let CompileError::Validation { path, violations } = &err else {
        panic!("expected a validation error, got {err}");
    };
    assert_eq!(path, &project.source("pages/a.js"));
    assert_eq!(violations[0].rule, "FieldsOnCorrectType");
    assert!(err.to_string().contains("titlex"));
}

#[test]
fn test_compile_is_idempotent() {
    let project = Project::new();
    project.write("src/pages/a.js", PAGE_A);
    project.write(
        "src/pages/b.js",
        "export const pageQuery = graphql`query PageB { allPages(limit: 2) { path } }`;",
    );

    let compiler = project.compiler();
    let first = compiler.compile_all().unwrap();
    let second = compiler.compile_all().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

const PAGE_WITH_LOCAL_QUERY: &str = r#"
const helper = graphql`query Helper { site { description } }`;

export const pageQuery = graphql`
  query PageA { site { title } }
`;
"#;

#[test]
fn test_page_query_wins_over_earlier_local_tag() {
    let project = Project::new();
    project.write("src/pages/a.js", PAGE_WITH_LOCAL_QUERY);

    let compiled = project.compiler().compile_all().unwrap();

    let names: Vec<_> = compiled[&project.source("pages/a.js")]
        .iter()
        .map(|query| query.name.as_str())
        .collect();
    assert_eq!(names, vec!["PageA"]);
}

#[test]
fn test_compiled_page_query_is_extractable() {
    let project = Project::new();
    project.write("src/pages/a.js", PAGE_WITH_LOCAL_QUERY);
    let compiled = project.compiler().compile_all().unwrap();
    FsArtifactWriter::new("graphql").write_all(&compiled).unwrap();

    let query = extract_page_query(&project.source("pages/a.js"), &ExtractOptions::default())
        .unwrap();
    assert_eq!(
        query.as_deref(),
        Some("query PageA {\n  site {\n    title\n  }\n}")
    );
}

#[test]
fn test_duplicate_names_across_files_fail() {
    let project = Project::new();
    project.write("src/pages/a.js", PAGE_A);
    project.write("src/pages/b.js", PAGE_A);

    let err = project.compiler().compile_all().unwrap_err();
    assert_eq!(err.violations()[0].rule, "UniqueDefinitionNames");
    assert!(err.to_string().contains("PageA"));
}

#[test]
fn test_fragment_from_another_file_is_printed_with_root() {
    let project = Project::new();
    project.write(
        "src/components/site.js",
        "export const siteFields = graphql`fragment SiteInfo on Site { title description }`;",
    );
    project.write(
        "src/pages/a.js",
        "export const pageQuery = graphql`query PageA { site { ...SiteInfo } }`;",
    );

    let compiled = project.compiler().compile_all().unwrap();

    assert_eq!(compiled.len(), 1);
    let query = &compiled[&project.source("pages/a.js")][0];
    insta::assert_snapshot!(query.text, @r"
    query PageA {
      site {
        ...SiteInfo
      }
    }

    fragment SiteInfo on Site {
      title
      description
    }
    ");
}

#[test]
fn test_unknown_fragment_fails() {
    let project = Project::new();
    project.write(
        "src/pages/a.js",
        "export const pageQuery = graphql`query PageA { site { ...Missing } }`;",
    );

    let err = project.compiler().compile_all().unwrap_err();
    assert_eq!(err.violations()[0].rule, "KnownFragmentNames");
}

#[test]
fn test_one_invalid_file_fails_whole_pass() {
    let project = Project::new();
    project.write("src/pages/a.js", PAGE_A);
    project.write(
        "src/pages/b.js",
        "export const pageQuery = graphql`query PageB { site }`;",
    );

    let err = project.compiler().compile_all().unwrap_err();
    assert_eq!(err.violations()[0].rule, "ScalarLeafs");
}

#[test]
fn test_files_without_tag_are_not_parsed() {
    let project = Project::new();
    project.write("src/pages/a.js", PAGE_A);
    project.write("src/utils/broken.js", "export const = ;");

    assert_eq!(project.compiler().compile_all().unwrap().len(), 1);
}

#[test]
fn test_unparsable_file_with_tag_fails() {
    let project = Project::new();
    project.write("src/pages/a.js", "export const pageQuery = graphql`query A { site { title } }`");
    project.write("src/pages/b.js", "const graphql = ; export");

    let err = project.compiler().compile_all().unwrap_err();
    assert!(matches!(err, CompileError::Parse { .. }));
}

#[test]
fn test_substitution_fails_compile() {
    let project = Project::new();
    project.write(
        "src/pages/a.js",
        "export const pageQuery = graphql`query PageA { site { ${fields} } }`;",
    );

    let err = project.compiler().compile_all().unwrap_err();
    assert!(matches!(
        err,
        CompileError::Tag {
            source: TagError::Substitution,
            ..
        }
    ));
}

#[test]
fn test_malformed_schema_is_a_schema_error() {
    let project = Project::new();
    project.write(".cache/schema.graphql", "type Query {");
    project.write("src/pages/a.js", PAGE_A);

    let err = project.compiler().compile_all().unwrap_err();
    assert!(matches!(err, CompileError::Schema(SchemaError::Syntax(_))));
    assert!(err.to_string().starts_with("Error loading schema."));
}

#[test]
fn test_generated_artifacts_are_not_scanned() {
    let project = Project::new();
    project.write("src/pages/a.js", PAGE_A);
    project.write(
        "src/pages/__generated__/PageA.generated.js",
        "export const pageQuery = graphql`query PageA { site { title } }`;",
    );

    assert_eq!(project.compiler().compile_all().unwrap().len(), 1);
}

#[test]
fn test_compile_documents_keeps_definition_order() {
    let schema = Schema::parse(SCHEMA).unwrap();
    let documents = vec![SourceDocument {
        path: PathBuf::from("/proj/src/pages/a.js"),
        document: crate::core::graphql::parse_document(
            "query Second { site { title } }\nquery First { site { description } }",
        )
        .unwrap(),
    }];

    let compiled = compile_documents(&schema, &documents).unwrap();
    let names: Vec<_> = compiled[&PathBuf::from("/proj/src/pages/a.js")]
        .iter()
        .map(|query| query.name.as_str())
        .collect();
    assert_eq!(names, vec!["Second", "First"]);
}
