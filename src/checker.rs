//! Static checking of Swagger documents.
//!
//! Validates documents without building a full resolution graph:
//! - JSON syntax errors
//! - Broken `$ref` references (file not found, pointer not found)
//! - Malformed reference strings and wrong container locations
//! - Sibling keys alongside `$ref`
//!
//! Unlike resolution, checking collects every finding instead of failing
//! fast, and skips http(s) references rather than fetching them.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::fetcher::is_url;
use crate::location::{validate_internal, Context};
use crate::reference::canonicalize;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from checking.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/paths/~1pets/get/responses/200/schema")
    pub path: String,
    pub message: String,
}

/// Result of checking a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a checked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of checking a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl CheckResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Check a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
/// Returns aggregated results for all files.
pub fn check(path: &Path, strict: bool) -> CheckResult {
    let files = collect_document_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = check_file(file, path);
        total_errors += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        total_warnings += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    CheckResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Check a single Swagger document file.
pub fn check_file(file: &Path, base_path: &Path) -> FileResult {
    let mut diagnostics = Vec::new();

    let root: Value = match std::fs::read(file)
        .map_err(|e| e.to_string())
        .and_then(|bytes| serde_json::from_slice(&bytes).map_err(|e| e.to_string()))
    {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                code: "E001".to_string(),
                file: file.to_path_buf(),
                path: "/".to_string(),
                message: format!("syntax error: {}", e),
            });
            return FileResult {
                file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
                status: FileStatus::Error,
                diagnostics,
            };
        }
    };

    check_refs(&root, file, "", Context::Root, &root, &mut diagnostics);

    // Missing or wrong version marker (warning)
    if root.get("swagger") != Some(&Value::String("2.0".to_string())) {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            code: "W001".to_string(),
            file: file.to_path_buf(),
            path: "/".to_string(),
            message: "document missing \"swagger\": \"2.0\" field".to_string(),
        });
    }

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

/// Recursively check $ref values in a document.
fn check_refs(
    value: &Value,
    file: &Path,
    path: &str,
    ctx: Context,
    root: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_val)) = map.get("$ref") {
                let extras: Vec<String> = map
                    .keys()
                    .filter(|k| !matches!(k.as_str(), "$ref" | "description" | "summary"))
                    .cloned()
                    .collect();
                if !extras.is_empty() {
                    diagnostics.push(Diagnostic {
                        severity: Severity::Error,
                        code: "E006".to_string(),
                        file: file.to_path_buf(),
                        path: path.to_string(),
                        message: format!("sibling keys alongside $ref: {}", extras.join(", ")),
                    });
                }
                check_single_ref(ref_val, file, path, ctx, root, diagnostics);
            }

            for (key, val) in map {
                let child_path = format!("{}/{}", path, key);
                check_refs(val, file, &child_path, ctx.child_key(key), root, diagnostics);
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                let child_path = format!("{}/{}", path, i);
                check_refs(item, file, &child_path, ctx.child_index(), root, diagnostics);
            }
        }
        _ => {}
    }
}

/// Check a single $ref value.
fn check_single_ref(
    ref_val: &str,
    file: &Path,
    path: &str,
    ctx: Context,
    root: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let base = file.to_string_lossy();
    let reference = match canonicalize(&base, ref_val) {
        Ok(r) => r,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                code: "E004".to_string(),
                file: file.to_path_buf(),
                path: path.to_string(),
                message: e.to_string(),
            });
            return;
        }
    };

    if reference.is_internal_to(&base) {
        if let Some(kind) = ctx.ref_kind() {
            if let Err(e) = validate_internal(&reference, kind) {
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    code: "E005".to_string(),
                    file: file.to_path_buf(),
                    path: path.to_string(),
                    message: e.to_string(),
                });
                return;
            }
        }

        if let Some(pointer) = &reference.pointer {
            if pointer.evaluate(root).is_err() {
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    code: "E003".to_string(),
                    file: file.to_path_buf(),
                    path: path.to_string(),
                    message: format!("pointer not found: #{}", pointer),
                });
            }
        }
        return;
    }

    // Remote references can't be validated locally - skip silently
    if is_url(&reference.base) {
        return;
    }

    let target_path = Path::new(&reference.base);
    if !target_path.exists() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            code: "E002".to_string(),
            file: file.to_path_buf(),
            path: path.to_string(),
            message: format!("file not found: {}", reference.base),
        });
        return;
    }

    // If there's a pointer, check it resolves in the referenced file
    if let Some(pointer) = &reference.pointer {
        match std::fs::read(target_path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
        {
            Some(target_root) => {
                if pointer.evaluate(&target_root).is_err() {
                    diagnostics.push(Diagnostic {
                        severity: Severity::Error,
                        code: "E003".to_string(),
                        file: file.to_path_buf(),
                        path: path.to_string(),
                        message: format!("pointer not found in {}: #{}", reference.base, pointer),
                    });
                }
            }
            None => {
                // Unreadable target file is reported when that file itself
                // is checked, so don't duplicate
            }
        }
    }
}

/// Collect all .json files in a path (file or directory).
fn collect_document_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}
