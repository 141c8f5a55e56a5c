use std::path::Path;

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Single-page PDF with one text line per entry.
fn write_pdf(path: &Path, lines: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 11.into()]));
        operations.push(Operation::new("Td", vec![60.into(), (760 - 16 * i as i64).into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        Content { operations }.encode().unwrap(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let invoices = dir.path().join("invoices");
        std::fs::create_dir(&invoices).unwrap();
        write_pdf(
            &invoices.join("a.pdf"),
            &["Invoice Number: INV-7", "Total Amount Due on 2024-01-01 USD 239.40"],
        );
        write_pdf(&invoices.join("b.PDF"), &["Total Amount: 12.00"]);
        Self { dir }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    /// A read-only folder, or `None` when permissions are not enforced
    /// (running as root).
    #[cfg(unix)]
    fn read_only_dir(&self, name: &str) -> Option<String> {
        use std::os::unix::fs::PermissionsExt;

        let dir = self.dir.path().join(name);
        std::fs::create_dir(&dir).unwrap();
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();
        std::fs::write(dir.join("check"), b"")
            .is_err()
            .then(|| dir.to_string_lossy().into_owned())
    }

    fn stdout(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).output().unwrap();
        assert!(output.status.success(), "{output:?}");
        String::from_utf8(output.stdout).unwrap()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("invsheet").unwrap();
        cmd.arg("--config").arg(self.path("config.json"));
        cmd
    }
}

#[test]
fn convert_appends_once() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["convert", &fx.path("invoices"), "-o", &fx.path("ledger")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 2 file(s)"))
        .stdout(predicate::str::contains("sheet 'PDF Files'"));
    assert!(fx.dir.path().join("ledger.xlsx").exists());

    fx.cmd()
        .args(["convert", &fx.path("invoices"), "-o", &fx.path("ledger.xlsx")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped 2 duplicate file(s)"));
}

#[test]
fn convert_new_sheet_and_list_sheets() {
    let fx = Fixture::new();
    let ledger = fx.path("ledger.xlsx");

    for _ in 0..2 {
        fx.cmd()
            .args(["convert", &fx.path("invoices"), "-o", &ledger, "--new-sheet"])
            .assert()
            .success();
    }

    assert_eq!(
        fx.stdout(&["sheets", &ledger]),
        "[Create New Sheet]\nPDF Files\nPDF Files 1\n"
    );
}

#[test]
fn convert_accepts_new_sheet_label_as_sheet_name() {
    let fx = Fixture::new();
    let ledger = fx.path("ledger.xlsx");

    for _ in 0..2 {
        fx.cmd()
            .args(["convert", &fx.path("invoices"), "-o", &ledger])
            .args(["--sheet", "[Create New Sheet]"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 row(s) appended"));
    }

    assert_eq!(
        fx.stdout(&["sheets", &ledger]),
        "[Create New Sheet]\nPDF Files\nPDF Files 1\n"
    );
}

#[cfg(unix)]
#[test]
fn convert_locked_output_uses_save_as() {
    let fx = Fixture::new();
    let Some(shared) = fx.read_only_dir("shared") else {
        return;
    };
    let locked = format!("{shared}/ledger.xlsx");

    fx.cmd()
        .args(["convert", &fx.path("invoices"), "-o", &locked])
        .args(["--save-as", &fx.path("alternate"), "--no-prompt"])
        .assert()
        .success()
        .stderr(predicate::str::contains("cannot be written"))
        .stdout(predicate::str::contains("Saving to"));

    assert!(!Path::new(&locked).exists());
    assert_eq!(
        fx.stdout(&["sheets", &fx.path("alternate.xlsx")]),
        "[Create New Sheet]\nPDF Files\n"
    );
}

#[cfg(unix)]
#[test]
fn convert_locked_output_without_prompt_fails() {
    let fx = Fixture::new();
    let Some(shared) = fx.read_only_dir("shared") else {
        return;
    };
    let locked = format!("{shared}/ledger.xlsx");

    fx.cmd()
        .args(["convert", &fx.path("invoices"), "-o", &locked, "--no-prompt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be written"));
    assert!(!Path::new(&locked).exists());
}

#[test]
fn convert_missing_folder_fails() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["convert", &fx.path("nowhere"), "-o", &fx.path("ledger.xlsx")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    assert!(!fx.dir.path().join("ledger.xlsx").exists());
}

#[test]
fn convert_writes_report() {
    let fx = Fixture::new();
    fx.cmd()
        .args([
            "convert",
            &fx.path("invoices"),
            "-o",
            &fx.path("ledger.xlsx"),
            "--report",
            &fx.path("report.json"),
        ])
        .assert()
        .success();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(fx.path("report.json")).unwrap()).unwrap();
    assert_eq!(report["outcome"]["appended"], 2);
    assert_eq!(report["records"][0]["values"][0], "239.40");
    assert!(report["generated_at"].is_string());
}

#[test]
fn amount_prints_total() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["amount", &fx.path("invoices/a.pdf")])
        .assert()
        .success()
        .stdout("239.40\n");
}

#[test]
fn extract_marks_missing_fields() {
    let fx = Fixture::new();
    fx.cmd()
        .args([
            "extract",
            &fx.path("invoices/a.pdf"),
            "-f",
            "Invoice Number",
            "-f",
            "Customer",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Invoice Number: INV-7"))
        .stdout(predicate::str::contains("⚠ Customer: N/A"));
}

#[test]
fn fields_json_for_single_file() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["fields", &fx.path("invoices/a.pdf"), "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Invoice Number\": \"INV-7\""));
}

#[test]
fn mapping_round_trip() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["mapping", "add", "Invoice Number", "Due Date"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Columns: PDF Filename | Invoice Number | Due Date | Path to Invoice",
        ));

    fx.cmd()
        .args(["mapping", "add", "Due Date"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already mapped"));

    fx.cmd()
        .args(["mapping", "remove", "Invoice Number"])
        .assert()
        .success();

    fx.cmd()
        .args(["mapping", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Due Date"));

    fx.cmd().args(["mapping", "clear"]).assert().success();
    fx.cmd()
        .args(["mapping", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Amount"));
}

#[test]
fn clear_keeps_sheet() {
    let fx = Fixture::new();
    let ledger = fx.path("ledger.xlsx");
    fx.cmd()
        .args(["convert", &fx.path("invoices"), "-o", &ledger])
        .assert()
        .success();

    fx.cmd()
        .args(["clear", &ledger, "--sheet", "PDF Files", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 2 row(s)"));

    fx.cmd()
        .args(["convert", &fx.path("invoices"), "-o", &ledger])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 row(s) appended"));
}

#[test]
fn sheets_missing_workbook_offers_only_new_sheet() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["sheets", &fx.path("absent.xlsx")])
        .assert()
        .success()
        .stdout("[Create New Sheet]\n")
        .stderr(predicate::str::contains("does not exist yet"));
}
