//! End-to-end tests for the swagref binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::path::Path;

fn swagref() -> Command {
    Command::cargo_bin("swagref").unwrap()
}

fn write(dir: &Path, name: &str, body: &Value) -> String {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(body).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

fn petstore() -> Value {
    json!({
        "swagger": "2.0",
        "info": { "title": "Petstore", "version": "1.0.0" },
        "definitions": { "Pet": { "type": "object" } },
        "paths": { "/pets": { "get": { "responses": { "200": {
            "description": "ok",
            "schema": { "$ref": "#/definitions/Pet" }
        }}}}}
    })
}

mod resolve {
    use super::*;

    #[test]
    fn inline_output_has_no_refs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "petstore.json", &petstore());

        let output = swagref().args(["resolve", path.as_str()]).assert().success();
        let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
        let resolved: Value = serde_json::from_str(&stdout).unwrap();

        assert!(!stdout.contains("$ref"));
        assert_eq!(
            resolved["root"]["paths"]["/pets"]["get"]["responses"]["200"]["schema"],
            json!({ "type": "object" })
        );
    }

    #[test]
    fn preserving_mode_attaches_resolutions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "petstore.json", &petstore());

        let output = swagref()
            .args(["resolve", path.as_str(), "--mode", "preserving"])
            .assert()
            .success();
        let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
        let resolved: Value = serde_json::from_str(&stdout).unwrap();

        assert_eq!(resolved["mode"], "preserving");
        assert_eq!(
            resolved["resolutions"]["#/definitions/Pet"]["value"],
            json!({ "type": "object" })
        );
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "petstore.json", &petstore());

        swagref()
            .args(["resolve", path.as_str(), "--mode", "flatten"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown mode"));
    }

    #[test]
    fn pretty_and_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "petstore.json", &petstore());
        let out_path = dir.path().join("resolved.json");

        swagref()
            .args(["resolve", path.as_str(), "--pretty", "--output"])
            .arg(&out_path)
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        let written = std::fs::read_to_string(&out_path).unwrap();
        assert!(written.contains('\n'));
        let _: Value = serde_json::from_str(&written).unwrap();
    }

    #[test]
    fn missing_file_exits_3() {
        swagref()
            .args(["resolve", "/nonexistent/spec.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn broken_pointer_exits_2() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = petstore();
        doc["paths"]["/pets"]["get"]["responses"]["200"]["schema"] =
            json!({ "$ref": "#/definitions/Dog" });
        let path = write(dir.path(), "petstore.json", &doc);

        swagref()
            .args(["resolve", path.as_str()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("pointer not found"));
    }

    #[test]
    fn missing_external_file_exits_3() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = petstore();
        doc["paths"]["/pets"]["get"]["responses"]["200"]["schema"] =
            json!({ "$ref": "missing.json#/definitions/Pet" });
        let path = write(dir.path(), "petstore.json", &doc);

        swagref().args(["resolve", path.as_str()]).assert().code(3);
    }

    #[test]
    fn cycle_exits_2() {
        let dir = tempfile::tempdir().unwrap();
        let doc = json!({
            "swagger": "2.0",
            "definitions": {
                "A": { "items": { "$ref": "#/definitions/B" } },
                "B": { "items": { "$ref": "#/definitions/A" } }
            }
        });
        let path = write(dir.path(), "cyclic.json", &doc);

        swagref()
            .args(["resolve", path.as_str()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("cyclic reference"));
    }

    #[test]
    fn no_external_leaves_refs_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = petstore();
        doc["paths"]["/pets"]["get"]["responses"]["200"]["schema"] =
            json!({ "$ref": "missing.json#/definitions/Pet" });
        let path = write(dir.path(), "petstore.json", &doc);

        let output = swagref()
            .args(["resolve", path.as_str(), "--no-external"])
            .assert()
            .success();
        let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
        assert!(stdout.contains("missing.json#/definitions/Pet"));
    }

    #[test]
    fn external_file_refs_resolve() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "common.json",
            &json!({ "definitions": { "Error": { "type": "object" } } }),
        );
        let mut doc = petstore();
        doc["paths"]["/pets"]["get"]["responses"]["200"]["schema"] =
            json!({ "$ref": "common.json#/definitions/Error" });
        let path = write(dir.path(), "petstore.json", &doc);

        let output = swagref().args(["resolve", path.as_str()]).assert().success();
        let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
        let resolved: Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(
            resolved["root"]["paths"]["/pets"]["get"]["responses"]["200"]["schema"],
            json!({ "type": "object" })
        );
    }

    #[test]
    fn max_depth_flag() {
        let dir = tempfile::tempdir().unwrap();
        let doc = json!({
            "swagger": "2.0",
            "definitions": {
                "A": { "items": { "$ref": "#/definitions/B" } },
                "B": { "items": { "$ref": "#/definitions/C" } },
                "C": { "type": "integer" }
            }
        });
        let path = write(dir.path(), "chain.json", &doc);

        swagref()
            .args(["resolve", path.as_str(), "--max-depth", "1"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("maximum reference depth"));

        swagref()
            .args(["resolve", path.as_str(), "--max-depth", "8"])
            .assert()
            .success();
    }
}

mod check {
    use super::*;

    #[test]
    fn valid_directory_passes() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "petstore.json", &petstore());

        swagref()
            .args(["check"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("all passed"));
    }

    #[test]
    fn broken_ref_fails_with_code_1() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = petstore();
        doc["paths"]["/pets"]["get"]["responses"]["200"]["schema"] =
            json!({ "$ref": "#/definitions/Dog" });
        write(dir.path(), "petstore.json", &doc);

        swagref()
            .args(["check"])
            .arg(dir.path())
            .assert()
            .code(1)
            .stdout(predicate::str::contains("E003"));
    }

    #[test]
    fn json_format_output() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "petstore.json", &petstore());

        let output = swagref()
            .args(["check", "--format", "json"])
            .arg(dir.path())
            .assert()
            .success();
        let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
        let result: Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(result["files_checked"], 1);
        assert_eq!(result["errors"], 0);
    }

    #[test]
    fn strict_mode_fails_on_warnings() {
        let dir = tempfile::tempdir().unwrap();
        // Missing the version marker: warning only
        write(dir.path(), "spec.json", &json!({ "paths": {} }));

        swagref().args(["check"]).arg(dir.path()).assert().success();

        swagref()
            .args(["check", "--strict"])
            .arg(dir.path())
            .assert()
            .code(1)
            .stdout(predicate::str::contains("W001"));
    }

    #[test]
    fn missing_path_exits_2() {
        swagref()
            .args(["check", "/nonexistent/specs"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("path not found"));
    }

    #[test]
    fn quiet_suppresses_passing_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "petstore.json", &petstore());

        let output = swagref()
            .args(["check", "--quiet"])
            .arg(dir.path())
            .assert()
            .success();
        let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
        assert!(!stdout.contains("petstore.json"));
    }
}
