use anyhow::Result;
use insta_cmd::assert_cmd_snapshot;

use crate::{CliTest, PAGE_A};

#[test]
fn test_clean_project() -> Result<()> {
    let test = CliTest::with_schema()?;
    test.write_file("src/pages/a.js", PAGE_A)?;
    test.write_file("src/utils.js", "export const add = (a, b) => a + b;")?;

    assert_cmd_snapshot!(test.check_command(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    ✓ Checked 1 query in 2 source files - no issues found

    ----- stderr -----
    ");

    assert!(!test.root().join("src/pages/__generated__").exists());

    Ok(())
}

#[test]
fn test_substitution_is_reported_once() -> Result<()> {
    let test = CliTest::with_schema()?;
    test.write_file(
        "src/pages/a.js",
        "export const pageQuery = graphql`query PageA { site { ...${fields} } }`;",
    )?;

    assert_cmd_snapshot!(test.check_command(), @r#"
    success: false
    exit_code: 1
    ----- stdout -----
    error: "Substitutions are not allowed in graphql fragments. Included fragments should be referenced as `...MyModule_foo`."  unsupported-tag
      --> src/pages/a.js

    ✘ 1 problem

    ----- stderr -----
    "#);

    Ok(())
}

#[test]
fn test_mutation_tag_is_reported() -> Result<()> {
    let test = CliTest::with_schema()?;
    test.write_file("src/pages/a.js", PAGE_A)?;
    test.write_file(
        "src/components/save.js",
        "export function save() { return graphql`mutation Save { save }`; }",
    )?;

    assert_cmd_snapshot!(test.check_command(), @r#"
    success: false
    exit_code: 1
    ----- stdout -----
    error: "Only `query` operations are supported, found `mutation`."  unsupported-tag
      --> src/components/save.js

    ✘ 1 problem

    ----- stderr -----
    "#);

    Ok(())
}

#[test]
fn test_help() -> Result<()> {
    let test = CliTest::new()?;

    assert_cmd_snapshot!(test.command().arg("--help"), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    Incremental extraction, compilation and change propagation for GraphQL page queries embedded in JS/TS sources

    Usage: pagequery [COMMAND]

    Commands:
      compile  Compile every page query and write generated artifacts
      check    Validate page queries and report unsupported query tags
      extract  Print the compiled page queries exported by one file
      watch    Watch sources and re-run pages whose query changed
      init     Initialize a new .pagequeryrc.json configuration file
      help     Print this message or the help of the given subcommand(s)

    Options:
      -h, --help     Print help
      -V, --version  Print version

    ----- stderr -----
    ");

    Ok(())
}

#[test]
fn test_config_ignores() -> Result<()> {
    let test = CliTest::with_schema()?;
    test.write_file(".pagequeryrc.json", r#"{ "ignores": ["**/legacy/**"] }"#)?;
    test.write_file("src/pages/a.js", PAGE_A)?;
    test.write_file(
        "src/legacy/old.js",
        "export const q = graphql`query Old { site { missing } }`;",
    )?;

    assert_cmd_snapshot!(test.check_command(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    ✓ Checked 1 query in 1 source file - no issues found

    ----- stderr -----
    ");

    Ok(())
}
