use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn integration_run() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("antlered-round")?;

    cmd.assert().failure().stderr(predicate::str::contains(
        "The following required arguments were not provided",
    ));

    Ok(())
}

#[test]
fn integration_round_family() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("antlered-round")?;

    cmd.arg("tests/data/family.owx");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ontologyIRI=\"http://example.com/family\""))
        .stdout(predicate::str::contains("ObjectPropertyChain"))
        .stdout(predicate::str::contains("f:hasGrandparent"));

    Ok(())
}
