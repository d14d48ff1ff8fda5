use anyhow::Result;
use insta_cmd::assert_cmd_snapshot;
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::{CliTest, PAGE_A};

#[test]
fn test_compile_writes_artifacts() -> Result<()> {
    let test = CliTest::with_schema()?;
    test.write_file("src/pages/a.js", PAGE_A)?;

    assert_cmd_snapshot!(test.compile_command(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    src/pages/a.js
      ✓ PageA
    ✓ Compiled 1 query, wrote 1 artifact

    ----- stderr -----
    ");

    assert_eq!(
        test.read_file("src/pages/__generated__/PageA.generated.graphql")?,
        "query PageA {\n  site {\n    title\n  }\n}\n"
    );

    Ok(())
}

#[test]
fn test_second_compile_writes_nothing() -> Result<()> {
    let test = CliTest::with_schema()?;
    test.write_file("src/pages/a.js", PAGE_A)?;
    assert!(test.compile_command().output()?.status.success());

    assert_cmd_snapshot!(test.compile_command(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    src/pages/a.js
      ✓ PageA
    ✓ Compiled 1 query, wrote 0 artifacts

    ----- stderr -----
    ");

    Ok(())
}

#[test]
fn test_local_tag_does_not_replace_page_query() -> Result<()> {
    let test = CliTest::with_schema()?;
    test.write_file(
        "src/pages/a.js",
        &format!("const helper = graphql`query Helper {{ site {{ description }} }}`;\n{PAGE_A}"),
    )?;

    assert_cmd_snapshot!(test.compile_command(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    src/pages/a.js
      ✓ PageA
    ✓ Compiled 1 query, wrote 1 artifact

    ----- stderr -----
    ");

    assert!(
        !test
            .root()
            .join("src/pages/__generated__/Helper.generated.graphql")
            .exists()
    );

    Ok(())
}

#[test]
fn test_compile_json_output() -> Result<()> {
    let test = CliTest::with_schema()?;
    test.write_file("src/pages/a.js", PAGE_A)?;

    // Paths in the JSON are absolute, so compare fields instead of a snapshot.
    let output = test.compile_command().arg("--json").output()?;

    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(parsed[0]["name"], "PageA");
    assert_eq!(
        parsed[0]["text"],
        "query PageA {\n  site {\n    title\n  }\n}\n"
    );

    Ok(())
}

#[test]
fn test_validation_failure_exits_one() -> Result<()> {
    let test = CliTest::with_schema()?;
    test.write_file("src/pages/a.js", &PAGE_A.replace("title }", "titlex }"))?;

    assert_cmd_snapshot!(test.compile_command(), @r#"
    success: false
    exit_code: 1
    ----- stdout -----
    error: "Cannot query field "titlex" on type "Site"."  FieldsOnCorrectType
      --> src/pages/a.js
       = note: query line 2, column 24

    ✘ 1 problem

    ----- stderr -----
    "#);

    assert!(!test.root().join("src/pages/__generated__").exists());

    Ok(())
}

#[test]
fn test_missing_schema_is_an_error() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file("src/pages/a.js", PAGE_A)?;

    let output = test.compile_command().output()?;

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: Error loading schema from"), "{stderr}");
    assert!(stderr.contains(".cache/schema.graphql"));

    Ok(())
}

#[test]
fn test_schema_flag_overrides_config() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file("schema/site.graphql", crate::SCHEMA)?;
    test.write_file("app/pages/a.js", PAGE_A)?;

    assert_cmd_snapshot!(
        test.compile_command()
            .args(["--schema", "schema/site.graphql", "--source-root", "app"]),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    app/pages/a.js
      ✓ PageA
    ✓ Compiled 1 query, wrote 1 artifact

    ----- stderr -----
    "
    );

    assert!(
        test.root()
            .join("app/pages/__generated__/PageA.generated.graphql")
            .exists()
    );

    Ok(())
}
