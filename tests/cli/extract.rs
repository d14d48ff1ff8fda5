use anyhow::Result;
use insta_cmd::assert_cmd_snapshot;
use pretty_assertions::assert_eq;

use crate::{CliTest, PAGE_A};

#[test]
fn test_extract_after_compile() -> Result<()> {
    let test = CliTest::with_schema()?;
    test.write_file("src/pages/a.js", PAGE_A)?;
    assert!(test.compile_command().output()?.status.success());

    assert_cmd_snapshot!(test.extract_command("src/pages/a.js"), @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    {
      "pageQuery": "query PageA {\n  site {\n    title\n  }\n}"
    }

    ----- stderr -----
    "#);

    Ok(())
}

#[test]
fn test_extract_without_artifact_fails() -> Result<()> {
    let test = CliTest::with_schema()?;
    test.write_file("src/pages/a.js", PAGE_A)?;

    let output = test.extract_command("src/pages/a.js").output()?;

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("PageA.generated.graphql"), "{stderr}");
    assert!(stderr.contains("the compiler has not run for this file"));

    Ok(())
}

#[test]
fn test_extract_file_without_query() -> Result<()> {
    let test = CliTest::with_schema()?;
    test.write_file("src/utils.js", "export const add = (a, b) => a + b;")?;

    assert_cmd_snapshot!(test.extract_command("src/utils.js"), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    {}

    ----- stderr -----
    ");

    Ok(())
}
