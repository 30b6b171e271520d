//! Shared helpers for agecalc-eval integration tests.
//!
//! Every test runs the binary inside its own temp directory so the default
//! config and report paths never touch the real working tree.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// A fresh, empty working directory.
pub fn workdir() -> TempDir {
    TempDir::new().expect("failed to create temp dir")
}

/// Run `agecalc-eval` with `args` in `dir`, with logging disabled.
pub fn eval_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_agecalc-eval"))
        .args(args)
        .current_dir(dir)
        .env_remove("AGECALC_LOG")
        .env_remove("AGECALC_CONFIG")
        .output()
        .expect("failed to run agecalc-eval")
}

pub fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

pub fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

/// Write `xml` to the default report path under `dir`.
pub fn write_report(dir: &Path, xml: &str) {
    let path = dir.join("test-results/evaluation.xml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, xml).unwrap();
}

/// A JUnit document with one passing or failing test case per `(name, passed)`.
pub fn junit(classname: &str, cases: &[(&str, bool)]) -> String {
    let failures = cases.iter().filter(|(_, ok)| !ok).count();
    let mut xml = format!(
        "<testsuites><testsuite name=\"evaluation\" tests=\"{}\" failures=\"{failures}\" errors=\"0\" skipped=\"0\">",
        cases.len()
    );
    for (name, ok) in cases {
        if *ok {
            xml.push_str(&format!("<testcase classname=\"{classname}\" name=\"{name}\"/>"));
        } else {
            xml.push_str(&format!(
                "<testcase classname=\"{classname}\" name=\"{name}\"><failure message=\"mismatch\"/></testcase>"
            ));
        }
    }
    xml.push_str("</testsuite></testsuites>");
    xml
}
