use salescan::process_file;
use tempfile::TempDir;

const SALESMAN_DATA: &str = "001ç1234567891234çDiegoç50000\n001ç3245678865434çRenatoç40000.99\n";
const CLIENT_DATA: &str =
    "002ç2345675434544345çJosedaSilvaçRural\n002ç2345675433444345çEduardoPereiraçRural\n";
const SALES_DATA: &str =
    "003ç10ç[1-10-100,2-30-2.50,3-40-3.10]çDiego\n003ç08ç[1-34-10,2-33-1.50,3-40-0.10]çRenato\n";

const EXPECTED_SUMMARY: &str =
    "001çAmountClientsç2\n002çAmountSalesmanç2\n003çMostExpensiveSaleç10\n004çWorstSalesmançRenato\n";

struct Fixture {
    input: TempDir,
    output: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            input: TempDir::new().expect("create input dir"),
            output: TempDir::new().expect("create output dir"),
        }
    }

    async fn write_input(&self, name: &str, content: &str) {
        tokio::fs::write(self.input.path().join(name), content)
            .await
            .expect("write input file");
    }

    async fn read_summary(&self, name: &str) -> String {
        tokio::fs::read_to_string(self.output.path().join(name))
            .await
            .expect("read summary file")
    }

    fn summary_exists(&self, name: &str) -> bool {
        self.output.path().join(name).exists()
    }
}

/// Complete file with all three record kinds produces the documented
/// four-line summary.
#[tokio::test]
async fn test_complete_file_summary() {
    let fixture = Fixture::new();
    let content = format!("{SALESMAN_DATA}{CLIENT_DATA}{SALES_DATA}");
    fixture.write_input("sales.dat", &content).await;

    let ok = process_file("sales.dat", fixture.input.path(), fixture.output.path()).await;
    assert!(ok, "file should be processed");

    assert_eq!(fixture.read_summary("sales.done.dat").await, EXPECTED_SUMMARY);
}

/// Duplicate identity lines collapse; duplicate sale lines accumulate.
#[tokio::test]
async fn test_repeated_lines() {
    let fixture = Fixture::new();
    let content = format!(
        "{SALESMAN_DATA}{SALESMAN_DATA}{CLIENT_DATA}{CLIENT_DATA}{SALES_DATA}{SALES_DATA}"
    );
    fixture.write_input("sales.dat", &content).await;

    let ok = process_file("sales.dat", fixture.input.path(), fixture.output.path()).await;
    assert!(ok, "file should be processed");

    // Same summary: sets collapse the duplicates, and doubling every sale
    // total preserves the ordering of both derived sale statistics.
    assert_eq!(fixture.read_summary("sales.done.dat").await, EXPECTED_SUMMARY);
}

/// Record order does not matter for any derived statistic.
#[tokio::test]
async fn test_interleaved_record_kinds() {
    let fixture = Fixture::new();
    let content = "003ç08ç[1-34-10,2-33-1.50,3-40-0.10]çRenato\n\
                   001ç1234567891234çDiegoç50000\n\
                   002ç2345675434544345çJosedaSilvaçRural\n\
                   003ç10ç[1-10-100,2-30-2.50,3-40-3.10]çDiego\n\
                   002ç2345675433444345çEduardoPereiraçRural\n\
                   001ç3245678865434çRenatoç40000.99\n";
    fixture.write_input("sales.dat", content).await;

    let ok = process_file("sales.dat", fixture.input.path(), fixture.output.path()).await;
    assert!(ok, "file should be processed");

    assert_eq!(fixture.read_summary("sales.done.dat").await, EXPECTED_SUMMARY);
}

#[tokio::test]
async fn test_nonexistent_file_writes_nothing() {
    let fixture = Fixture::new();

    let ok = process_file("ghost.dat", fixture.input.path(), fixture.output.path()).await;
    assert!(!ok, "missing file must fail");
    assert!(!fixture.summary_exists("ghost.done.dat"));
}

#[tokio::test]
async fn test_wrong_extension_writes_nothing() {
    let fixture = Fixture::new();
    fixture.write_input("sales.csv", SALESMAN_DATA).await;

    let ok = process_file("sales.csv", fixture.input.path(), fixture.output.path()).await;
    assert!(!ok, "wrong extension must fail");
    assert!(!fixture.summary_exists("sales.done.dat"));
}

/// A malformed line of a recognized kind fails the entire file, even when
/// every other line is valid.
#[tokio::test]
async fn test_malformed_known_line_fails_file() {
    let fixture = Fixture::new();
    let content = format!("{SALESMAN_DATA}001\n{CLIENT_DATA}{SALES_DATA}");
    fixture.write_input("sales.dat", &content).await;

    let ok = process_file("sales.dat", fixture.input.path(), fixture.output.path()).await;
    assert!(!ok, "malformed line must fail the whole file");
    assert!(!fixture.summary_exists("sales.done.dat"));
}

/// Unrecognized record codes are dropped without failing the file.
#[tokio::test]
async fn test_unrecognized_codes_succeed_with_empty_summary() {
    let fixture = Fixture::new();
    fixture
        .write_input("noise.dat", "999çfooçbar\n888ç[what-is-this]\n")
        .await;

    let ok = process_file("noise.dat", fixture.input.path(), fixture.output.path()).await;
    assert!(ok, "unknown codes are skipped, not errors");

    assert_eq!(
        fixture.read_summary("noise.done.dat").await,
        "001çAmountClientsç0\n002çAmountSalesmanç0\n003çMostExpensiveSaleç\n004çWorstSalesmanç\n"
    );
}

/// Failures are local to one file: a bad file does not affect a good one
/// processed through the same directories.
#[tokio::test]
async fn test_failure_is_local_to_one_file() {
    let fixture = Fixture::new();
    fixture.write_input("bad.dat", "001\n").await;
    fixture
        .write_input("good.dat", &format!("{SALESMAN_DATA}{CLIENT_DATA}{SALES_DATA}"))
        .await;

    assert!(!process_file("bad.dat", fixture.input.path(), fixture.output.path()).await);
    assert!(process_file("good.dat", fixture.input.path(), fixture.output.path()).await);

    assert!(!fixture.summary_exists("bad.done.dat"));
    assert_eq!(fixture.read_summary("good.done.dat").await, EXPECTED_SUMMARY);
}

/// Re-running the processor over unchanged input yields byte-identical
/// output.
#[tokio::test]
async fn test_reprocessing_is_idempotent() {
    let fixture = Fixture::new();
    let content = format!("{SALESMAN_DATA}{CLIENT_DATA}{SALES_DATA}");
    fixture.write_input("sales.dat", &content).await;

    assert!(process_file("sales.dat", fixture.input.path(), fixture.output.path()).await);
    let first = fixture.read_summary("sales.done.dat").await;

    assert!(process_file("sales.dat", fixture.input.path(), fixture.output.path()).await);
    let second = fixture.read_summary("sales.done.dat").await;

    assert_eq!(first, second);
}
