//! End-to-end runs of the grit-sets binary.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn write_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

fn grit_sets(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_grit-sets"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("Failed to run grit-sets")
}

fn bim() -> NamedTempFile {
    write_file(&[
        "1\trs1\t0\t1501",
        "1\trs2\t0\t1801",
        "1\trs3\t0\t5501",
        "1\trs4\t0\t9001",
    ])
}

#[test]
fn test_sets_indexed() {
    let bim = bim();
    let sets = write_file(&["chr1 1001 2000 geneB", "chr1 5001 6000 geneA", "chr1 1 10 geneC"]);
    let output = grit_sets(&[
        "sets",
        "--ranges",
        sets.path().to_str().unwrap(),
        "--bim",
        bim.path().to_str().unwrap(),
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "geneA\t1\trs3\ngeneB\t1\trs1,rs2\ngeneC\t0\t.\n"
    );
}

#[test]
fn test_sets_pure_interval() {
    let sets = write_file(&["chr2 101 200 g", "chr2 150 300 g", "chr1 1 10 g"]);
    let output = grit_sets(&["sets", "--ranges", sets.path().to_str().unwrap()]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "g\t1\t1:0-10\ng\t2\t2:100-300\n"
    );
}

#[test]
fn test_filter_exclude() {
    let bim = bim();
    let ranges = write_file(&["1 1500 1900"]);
    let output = grit_sets(&[
        "filter",
        "--bim",
        bim.path().to_str().unwrap(),
        "--exclude",
        ranges.path().to_str().unwrap(),
        "--ibed0",
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "rs3\nrs4\n");
}

#[test]
fn test_filter_extract_with_border() {
    let bim = bim();
    let ranges = write_file(&["1 5600 8950"]);
    let output = grit_sets(&[
        "filter",
        "--bim",
        bim.path().to_str().unwrap(),
        "--extract",
        ranges.path().to_str().unwrap(),
        "--border",
        "100",
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "rs3\nrs4\n");
}

#[test]
fn test_malformed_input_exits_with_error() {
    let bim = bim();
    let sets = write_file(&["chr1 1001 2000 a", "chr1 2000 1000 a"]);
    let output = grit_sets(&[
        "sets",
        "--ranges",
        sets.path().to_str().unwrap(),
        "--bim",
        bim.path().to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: Line 2 of set file"), "{}", stderr);
}
