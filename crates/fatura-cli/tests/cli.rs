//! Command-line tests for the `fatura` binary.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const NFE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">
  <NFe><infNFe Id="NFe1">
    <ide><nNF>45123</nNF><dhEmi>2024-02-15T10:30:00-03:00</dhEmi></ide>
    <dest><CNPJ>12345678000190</CNPJ></dest>
    <det nItem="1"><prod><qCom>10.0000</qCom></prod></det>
    <det nItem="2"><prod><qCom>5.0000</qCom></prod></det>
    <total><ICMSTot><vICMS>186.22</vICMS><vNF>1234.56</vNF></ICMSTot></total>
  </infNFe></NFe>
</nfeProc>"#;

struct Setup {
    dir: TempDir,
    config: PathBuf,
}

impl Setup {
    /// Empty inbox plus a config file pointing everything into the temp dir.
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Faturas")).unwrap();

        let config = dir.path().join("config.json");
        let json = serde_json::json!({
            "pipeline": {
                "inbox_dir": dir.path().join("Faturas"),
                "processed_dir": dir.path().join("Lidos"),
                "ledger_path": dir.path().join("COPERGAS.xlsx"),
            }
        });
        fs::write(&config, json.to_string()).unwrap();

        Self { dir, config }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn put(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path("Faturas").join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn fatura(&self) -> Command {
        let mut cmd = Command::cargo_bin("fatura").unwrap();
        cmd.arg("--config").arg(&self.config);
        cmd
    }
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("fatura")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn ingest_empty_inbox() {
    let setup = Setup::new();

    setup
        .fatura()
        .arg("ingest")
        .assert()
        .success()
        .stdout(predicate::str::contains("No invoices found"));

    assert!(!setup.path("COPERGAS.xlsx").exists());
}

#[test]
fn ingest_missing_inbox_fails() {
    let setup = Setup::new();

    setup
        .fatura()
        .args(["ingest", "--inbox"])
        .arg(setup.path("nowhere"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Inbox directory not found"));
}

#[test]
fn ingest_xml_with_companion() {
    let setup = Setup::new();
    let xml = setup.put("45123.xml", NFE);
    let pdf = setup.put("45123.pdf", "not really a pdf");
    let summary = setup.path("summary.csv");

    setup
        .fatura()
        .arg("ingest")
        .arg("--summary")
        .arg(&summary)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 accepted"));

    assert!(setup.path("COPERGAS.xlsx").exists());
    assert!(!xml.exists());
    assert!(!pdf.exists());
    assert!(setup.path("Lidos/45123.xml").exists());
    assert!(setup.path("Lidos/45123.pdf").exists());

    let csv = fs::read_to_string(&summary).unwrap();
    assert!(csv.starts_with("filename,status,"));
    assert!(csv.contains("45123.xml,accepted,45123,15/02/2024,1234.56"));
}

#[test]
fn ingest_twice_reports_duplicate() {
    let setup = Setup::new();
    setup.put("45123.xml", NFE);
    setup.fatura().arg("ingest").assert().success();

    let again = setup.put("45123.xml", NFE);
    setup
        .fatura()
        .args(["ingest", "--kind", "xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 duplicates"))
        .stdout(predicate::str::contains("1 rows in ledger"));

    assert!(again.exists());
}

#[test]
fn redropped_pair_is_one_duplicate() {
    let setup = Setup::new();
    setup.put("45123.xml", NFE);
    setup.put("45123.pdf", "not really a pdf");
    setup.fatura().arg("ingest").assert().success();

    let xml = setup.put("45123.xml", NFE);
    let pdf = setup.put("45123.pdf", "not really a pdf");
    setup
        .fatura()
        .arg("ingest")
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 files"))
        .stdout(predicate::str::contains("0 accepted, 1 duplicates, 0 failed"))
        .stdout(predicate::str::contains("1 rows in ledger"));

    assert!(xml.exists());
    assert!(pdf.exists());
}

#[test]
fn rejected_file_does_not_fail_the_command() {
    let setup = Setup::new();
    let broken = setup.put("broken.xml", &NFE.replace("<dest><CNPJ>12345678000190</CNPJ></dest>", ""));

    setup
        .fatura()
        .arg("ingest")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 failed"))
        .stdout(predicate::str::contains("broken.xml: extraction failed: missing node dest/CNPJ"));

    assert!(broken.exists());
}

#[test]
fn inspect_xml_as_json() {
    let setup = Setup::new();
    let xml = setup.put("45123.xml", NFE);

    let output = setup
        .fatura()
        .args(["inspect", "--format", "json"])
        .arg(&xml)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["kind"], "xml");
    assert_eq!(report["complete"], true);
    assert_eq!(report["record"]["tax_id"], "12345678000190");
    assert_eq!(report["record"]["period_end"], "2024-02-29");
    assert!(xml.exists());
}

#[test]
fn inspect_text_summary() {
    let setup = Setup::new();
    let xml = setup.put("partial.xml", NFE);

    setup
        .fatura()
        .arg("inspect")
        .arg(&xml)
        .assert()
        .success()
        .stdout(predicate::str::contains("VALOR TOTAL"))
        .stdout(predicate::str::contains("1.234,56"))
        .stdout(predicate::str::contains("Complete"));
}

#[test]
fn inspect_unsupported_file_fails() {
    let setup = Setup::new();
    let txt = setup.put("notes.txt", "hello");

    setup
        .fatura()
        .arg("inspect")
        .arg(&txt)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file kind"));
}

#[test]
fn config_init_and_path() {
    let setup = Setup::new();
    let target = setup.path("conf/new.json");

    setup
        .fatura()
        .args(["config", "init", "--output"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(target.exists());

    setup
        .fatura()
        .args(["config", "init", "--output"])
        .arg(&target)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    setup
        .fatura()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"distributor\": \"COPERGÁS\""));

    setup
        .fatura()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.json"))
        .stdout(predicate::str::contains("exists"));
}
