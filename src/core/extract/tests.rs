use std::{fs, path::PathBuf};

use pretty_assertions::assert_eq;
use tempfile::{TempDir, tempdir};

use super::*;
use crate::core::error::TagError;

const QUERY_TEXT: &str = "query PageA {\n  site {\n    title\n  }\n}\n";

struct Project {
    _dir: TempDir,
    page: PathBuf,
}

fn project(source: &str, artifacts: &[(&str, &str)]) -> Project {
    let dir = tempdir().unwrap();
    let pages = dir.path().join("src/pages");
    fs::create_dir_all(pages.join("__generated__")).unwrap();
    let page = pages.join("a.js");
    fs::write(&page, source).unwrap();
    for (name, text) in artifacts {
        fs::write(
            pages.join(format!("__generated__/{name}.generated.graphql")),
            text,
        )
        .unwrap();
    }
    Project { _dir: dir, page }
}

#[test]
fn test_extracts_page_query_from_artifact() {
    let project = project(
        r#"
        export default function Page({ data }) { return <h1>{data.site.title}</h1>; }
        export const pageQuery = graphql`
          query PageA { site { title } }
        `;
        "#,
        &[("PageA", QUERY_TEXT)],
    );

    let query = extract_page_query(&project.page, &ExtractOptions::default()).unwrap();
    assert_eq!(query.as_deref(), Some(QUERY_TEXT.trim()));
}

#[test]
fn test_artifact_is_read_fresh() {
    let project = project(
        "export const pageQuery = graphql`query PageA { site { title } }`;",
        &[("PageA", "query PageA { old }")],
    );
    let options = ExtractOptions::default();
    assert_eq!(
        extract_page_query(&project.page, &options).unwrap().as_deref(),
        Some("query PageA { old }")
    );

    let artifact = project
        .page
        .parent()
        .unwrap()
        .join("__generated__/PageA.generated.graphql");
    fs::write(&artifact, QUERY_TEXT).unwrap();
    assert_eq!(
        extract_page_query(&project.page, &options).unwrap().as_deref(),
        Some(QUERY_TEXT.trim())
    );
}

#[test]
fn test_missing_artifact_is_fatal() {
    let project = project("export const pageQuery = graphql`query PageA { site { title } }`;", &[]);

    let err = extract_page_query(&project.page, &ExtractOptions::default()).unwrap_err();
    let ExtractError::MissingArtifact { name, path, .. } = err else {
        panic!("expected a missing artifact error");
    };
    assert_eq!(name, "PageA");
    assert!(path.ends_with("__generated__/PageA.generated.graphql"));
}

#[test]
fn test_unexported_queries_are_ignored() {
    let project = project(
        "const pageQuery = graphql`query PageA { site { title } }`;",
        &[("PageA", QUERY_TEXT)],
    );
    let queries = extract_file_queries(&project.page, &ExtractOptions::default()).unwrap();
    assert!(queries.is_empty());
}

#[test]
fn test_non_query_operations_are_ignored() {
    let project = project(
        r#"
        export const doSave = graphql`mutation Save { save }`;
        "#,
        &[],
    );
    let queries = extract_file_queries(&project.page, &ExtractOptions::default()).unwrap();
    assert!(queries.is_empty());
}

#[test]
fn test_unbound_tag_is_dropped() {
    let project = project(
        "export default register(graphql`query PageA { site { title } }`);\nexport function f() { return graphql`query PageB { site { title } }`; }",
        &[("PageA", QUERY_TEXT)],
    );
    let queries = extract_file_queries(&project.page, &ExtractOptions::default()).unwrap();
    assert!(queries.is_empty());
}

#[test]
fn test_first_exported_tag_wins() {
    let project = project(
        r#"
        export const pageQuery = graphql`query PageA { site { title } }`;
        export const otherQuery = graphql`query PageB { site { title } }`;
        "#,
        &[("PageA", QUERY_TEXT), ("PageB", "query PageB")],
    );
    let queries = extract_file_queries(&project.page, &ExtractOptions::default()).unwrap();
    assert_eq!(queries.len(), 1);
    assert!(queries.contains_key("pageQuery"));
}

#[test]
fn test_substitution_is_an_error() {
    let project = project(
        "export const pageQuery = graphql`query PageA { ${fields} }`;",
        &[],
    );
    let err = extract_file_queries(&project.page, &ExtractOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        ExtractError::Tag {
            source: TagError::Substitution,
            ..
        }
    ));
}

#[test]
fn test_unparsable_file() {
    let project = project("export const = ;", &[]);
    let err = extract_file_queries(&project.page, &ExtractOptions::default()).unwrap_err();
    assert!(matches!(err, ExtractError::Parse { .. }));
}
