// End-to-end tests for `colcheck verify` and `colcheck classify` on CSV
// files, driving the correction session through stdin.
//
// Run with: cargo test -p colcheck-cli --test verify_tests

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const DATA: &str = "\
Name,Postcode,Qty
Ada,SW1A 1AA,3
Grace,??,5
Linus,M1 1AE,x
Ken,n/a,2
";

const WIZARD: &str = r#"
name = "Address import"

[[columns]]
name = "Name"

[[columns]]
name = "Postcode"
expression = 'postcode ~ /^[A-Z]{1,2}[0-9][0-9A-Z]? ?[0-9][A-Z]{2}$/'
expected_type = "postcode"
example_value = "SW1A 1AA"

[[columns]]
name = "Qty"
expression = "integer : integer"
expected_type = "integer"
example_value = "12"
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self::with(DATA, WIZARD)
    }

    fn with(data: &str, wizard: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("data.csv"), data).unwrap();
        fs::write(dir.path().join("wizard.toml"), wizard).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn arg(&self, name: &str) -> String {
        self.path(name).to_string_lossy().into_owned()
    }

    /// Run with an isolated (missing) settings file and `stdin` piped in.
    fn run(&self, args: &[&str], stdin: &str) -> Output {
        let mut child = Command::new(env!("CARGO_BIN_EXE_colcheck"))
            .arg("--config")
            .arg(self.path("settings.json"))
            .args(args)
            .env_remove("RUST_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn colcheck");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(stdin.as_bytes())
            .unwrap();
        child.wait_with_output().expect("wait for colcheck")
    }

    fn verify(&self, extra: &[&str], stdin: &str) -> Output {
        let wizard = self.arg("wizard.toml");
        let csv = self.arg("data.csv");
        let mut args = vec!["verify", wizard.as_str(), "--csv", csv.as_str()];
        args.extend_from_slice(extra);
        self.run(&args, stdin)
    }
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// ===========================================================================
// verify --check
// ===========================================================================

#[test]
fn check_json_reports_each_verified_column() {
    let fx = Fixture::new();
    let out = fx.verify(&["--check", "--json"], "");

    assert_eq!(out.status.code(), Some(3), "stderr: {}", stderr(&out));
    let report: serde_json::Value = serde_json::from_str(stdout(&out).trim()).unwrap();
    assert_eq!(report["wizard"], "Address import");
    assert_eq!(report["needs_attention"], 2);
    assert_eq!(report["unavailable"], 0);

    let columns = report["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0]["column"], "Postcode");
    assert_eq!(columns[0]["status"], "attention");
    assert_eq!(columns[0]["verdict"]["error_count"], 2);
    assert_eq!(columns[1]["verdict"]["dominant_type"], "integer");
}

#[test]
fn check_passes_on_clean_table() {
    let fx = Fixture::with("Name,Postcode,Qty\nAda,SW1A 1AA,3\nKen,E1 6AN,2\n", WIZARD);
    let out = fx.verify(&["--check"], "");

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Wizard: Address import (2 column(s) checked)"));
    assert!(text.contains("successfully typed as postcode"));
    assert!(!text.contains("need attention"));
}

#[test]
fn check_reports_missing_column_as_unavailable() {
    let wizard = "name = \"w\"\n[[columns]]\nname = \"Town\"\nexpression = \"value\"\nexpected_type = \"town\"\n";
    let fx = Fixture::with(DATA, wizard);
    let out = fx.verify(&["--check"], "");

    assert_eq!(out.status.code(), Some(10));
    assert!(stdout(&out).contains("unknown column 'Town'"));
}

// ===========================================================================
// verify (interactive)
// ===========================================================================

#[test]
fn fixing_every_value_writes_corrected_csv() {
    let fx = Fixture::new();
    let output = fx.arg("fixed.csv");
    let input = "inspect\nset 2 EC1A 1BB\nset 4 E1 6AN\nfix\ninspect\nset 3 7\nfix\n";
    let out = fx.verify(&["--output", &output], input);

    assert!(out.status.success(), "stdout: {}\nstderr: {}", stdout(&out), stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("[1/2] Unexpected values"));
    assert!(text.contains("2 unexpected values have been detected in the column Postcode."));
    assert!(text.contains("Example value: SW1A 1AA"));
    assert!(text.contains("row 2: \"??\""));
    assert!(text.contains("row 4: \"n/a\""));
    assert!(text.contains("A maximum of 10 values are shown"));
    assert!(text.contains("1 unexpected value has been detected in the column Qty."));
    assert!(text.contains("All columns verified."));

    let fixed = fs::read_to_string(fx.path("fixed.csv")).unwrap();
    assert!(fixed.contains("Grace,EC1A 1BB,5"));
    assert!(fixed.contains("Ken,E1 6AN,2"));
    assert!(fixed.contains("Linus,M1 1AE,7"));
}

#[test]
fn accepting_keeps_values_as_they_are() {
    let fx = Fixture::new();
    let output = fx.arg("out.csv");
    let out = fx.verify(&["--output", &output], "accept\naccept\n");

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("[2/2] Unexpected values"));
    let written = fs::read_to_string(fx.path("out.csv")).unwrap();
    assert_eq!(written, DATA);
}

#[test]
fn partial_fix_shows_tip_on_next_inspect() {
    let fx = Fixture::new();
    let input = "inspect\nset 2 EC1A 1BB\nfix\ninspect\ndone\naccept\n";
    let out = fx.verify(&[], input);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("1 unexpected value has been detected in the column Postcode."));
    assert!(text.contains("If you have corrected all of the values properly"));
}

#[test]
fn undo_reverts_and_skips_output() {
    let fx = Fixture::new();
    let output = fx.arg("never.csv");
    let input = "inspect\nset 2 EC1A 1BB\nfix\nundo\n";
    let out = fx.verify(&["--output", &output], input);

    assert_eq!(out.status.code(), Some(4), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("Changes undone."));
    assert!(stderr(&out).contains("wizard 'Address import' was undone"));
    assert!(!fx.path("never.csv").exists());
}

#[test]
fn input_ending_early_leaves_values_unresolved() {
    let fx = Fixture::new();
    let out = fx.verify(&[], "inspect\n");

    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("input ended before every column was resolved"));
}

#[test]
fn bad_commands_are_reported_and_ignored() {
    let fx = Fixture::new();
    let input = "fix\nset 2 X\nrollback\ninspect\nset 1 X\nquit\n";
    let out = fx.verify(&[], input);

    assert_eq!(out.status.code(), Some(3));
    let text = stdout(&out);
    assert!(text.contains("'fix' is not available while presenting"));
    assert!(text.contains("'set' is only available while inspecting values"));
    assert!(text.contains("unknown command 'rollback'"));
    assert!(text.contains("row 1 is not listed"));
}

#[test]
fn clean_table_needs_no_input() {
    let fx = Fixture::with("Name,Postcode,Qty\nAda,SW1A 1AA,3\n", WIZARD);
    let output = fx.arg("out.csv");
    let out = fx.verify(&["--output", &output], "");

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "All columns verified.");
    assert!(fx.path("out.csv").exists());
}

// ===========================================================================
// Usage and input errors
// ===========================================================================

#[test]
fn invalid_wizard_file_exits_5() {
    let fx = Fixture::with(DATA, "name = \"w\"\n[[columns]]\nname = \"Qty\"\nexpression = \"value\"\n");
    let out = fx.verify(&["--check"], "");

    assert_eq!(out.status.code(), Some(5));
    assert!(stderr(&out).contains("has an expression but no expected_type"));
    assert!(stderr(&out).contains("hint:"));
}

#[test]
fn missing_csv_exits_6() {
    let fx = Fixture::new();
    let wizard = fx.arg("wizard.toml");
    let missing = fx.arg("missing.csv");
    let out = fx.run(&["verify", &wizard, "--csv", &missing, "--check"], "");

    assert_eq!(out.status.code(), Some(6));
}

#[test]
fn no_table_is_usage_error() {
    let fx = Fixture::new();
    let wizard = fx.arg("wizard.toml");
    let out = fx.run(&["verify", &wizard, "--check"], "");

    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("--csv FILE or --project ID"));
}

// ===========================================================================
// classify
// ===========================================================================

#[test]
fn classify_json_verdict() {
    let fx = Fixture::new();
    let csv = fx.arg("data.csv");
    let out = fx.run(
        &[
            "classify", "--csv", &csv, "--column", "Qty", "--expression", "integer : integer",
            "--expected", "integer", "--json",
        ],
        "",
    );

    assert_eq!(out.status.code(), Some(3));
    let verdict: serde_json::Value = serde_json::from_str(stdout(&out).trim()).unwrap();
    assert_eq!(verdict["reason"], "some_expected");
    assert_eq!(verdict["severity"], "warning");
    assert_eq!(verdict["dominant_type_count"], 3);
    assert_eq!(verdict["error_count"], 1);
    assert_eq!(verdict["total_rows"], 4);
}

#[test]
fn classify_clean_column_succeeds() {
    let fx = Fixture::new();
    let csv = fx.arg("data.csv");
    let out = fx.run(
        &["classify", "--csv", &csv, "--column", "Name", "--expression", "name : any", "--expected", "name"],
        "",
    );

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).starts_with("success: All values in the Name column successfully typed as name."));
}

// ===========================================================================
// config
// ===========================================================================

#[test]
fn config_init_writes_default_file() {
    let fx = Fixture::new();
    let out = fx.run(&["config", "--init"], "");

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("created"));
    assert!(text.contains("\"session.displayLimit\": 10"));
    assert!(fs::read_to_string(fx.path("settings.json")).unwrap().contains("// Correction session"));
}

#[test]
fn config_set_project_saves_settings() {
    let fx = Fixture::new();
    let out = fx.run(&["config", "--set-project", "1234"], "");
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let saved = fs::read_to_string(fx.path("settings.json")).unwrap();
    assert!(saved.contains("\"host.project\": \"1234\""));
}
