use crate::aggregate::{Aggregates, FileSummary};
use crate::record::{self, RecordError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};

/// Required extension for input files, matched case-insensitively.
pub const INPUT_EXTENSION: &str = "dat";

/// Suffix appended to the input file stem to name the summary file.
pub const OUTPUT_SUFFIX: &str = "done.dat";

/// Everything that can go wrong while processing one file.
///
/// None of these escape the [`FileProcessor::process`] boundary; they are
/// collapsed into a boolean failure signal there.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("input file does not exist: {0}")]
    NotFound(PathBuf),
    #[error("file '{0}' does not have the required .dat extension")]
    InvalidExtension(String),
    #[error("malformed record at line {line}: {source}")]
    InvalidFormat {
        line: u64,
        #[source]
        source: RecordError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Processes one flat data file: validate, scan line by line, derive the
/// summary statistics and write the companion summary file.
///
/// One instance per file; the aggregate state lives inside a single
/// [`FileProcessor::process`] call and is never shared across files.
pub struct FileProcessor {
    file_name: String,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl FileProcessor {
    pub fn new(
        file_name: impl Into<String>,
        input_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> Self {
        let file_name = file_name.into();
        debug!(file = %file_name, "New processor instance created");
        Self {
            file_name,
            input_dir: input_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Process the file end to end.
    ///
    /// Every failure path (missing file, wrong extension, malformed line,
    /// read or write error) is caught here and reported as `false`; details
    /// go to the log. A failed file leaves no summary at the final output
    /// path.
    pub async fn process(&self) -> bool {
        match self.run().await {
            Ok(summary) => {
                info!(
                    file = %self.file_name,
                    clients = summary.amount_of_clients,
                    salesmen = summary.amount_of_salesmen,
                    "File processed"
                );
                true
            }
            Err(e) => {
                error!(file = %self.file_name, error = %e, "File processing failed");
                false
            }
        }
    }

    async fn run(&self) -> Result<FileSummary, ProcessError> {
        // Validation happens before the scan, and the scan completes before
        // any output write is attempted, so failures never commit partial
        // output.
        self.validate().await?;
        let summary = self.scan().await?;
        self.write_summary(&summary).await?;
        Ok(summary)
    }

    /// Precondition checks: the input file exists and carries the required
    /// extension.
    async fn validate(&self) -> Result<(), ProcessError> {
        let input_path = self.input_path();
        if fs::metadata(&input_path).await.is_err() {
            return Err(ProcessError::NotFound(input_path));
        }

        let extension_ok = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(INPUT_EXTENSION));
        if !extension_ok {
            return Err(ProcessError::InvalidExtension(self.file_name.clone()));
        }

        Ok(())
    }

    /// Stream the file line by line, folding each recognized record into the
    /// aggregates. Any malformed line of a recognized kind aborts the whole
    /// file; unrecognized kinds are skipped.
    async fn scan(&self) -> Result<FileSummary, ProcessError> {
        let file = File::open(self.input_path()).await?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let mut aggregates = Aggregates::new();
        let mut line_number = 0u64;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            match record::parse_line(&line) {
                Ok(Some(record)) => aggregates.apply(record),
                Ok(None) => debug!(
                    file = %self.file_name,
                    line = line_number,
                    "Skipping unrecognized record line"
                ),
                Err(source) => {
                    return Err(ProcessError::InvalidFormat {
                        line: line_number,
                        source,
                    })
                }
            }
        }

        debug!(file = %self.file_name, lines = line_number, "Scan completed");
        Ok(aggregates.finish())
    }

    /// Write the rendered summary into the output directory.
    ///
    /// The content goes to a temporary path first and is renamed into place,
    /// so a reader of the output directory never observes a truncated
    /// summary file.
    async fn write_summary(&self, summary: &FileSummary) -> Result<(), ProcessError> {
        let output_path = self.output_path();
        let temp_path = self.output_dir.join(format!("{}.tmp", self.file_name));

        fs::write(&temp_path, summary.render()).await?;
        fs::rename(&temp_path, &output_path).await?;

        debug!(output = %output_path.display(), "Summary file written");
        Ok(())
    }

    fn input_path(&self) -> PathBuf {
        self.input_dir.join(&self.file_name)
    }

    /// Output path: the input name with its extension replaced by the
    /// `.done.dat` suffix, located in the output directory.
    fn output_path(&self) -> PathBuf {
        let stem = Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name);
        self.output_dir.join(format!("{stem}.{OUTPUT_SUFFIX}"))
    }
}

/// Process one file and report success.
///
/// The boolean-only boundary exists so that dispatched tasks never carry an
/// error past the worker; callers that need details get them from the log.
pub async fn process_file(
    file_name: &str,
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> bool {
    FileProcessor::new(file_name, input_dir, output_dir)
        .process()
        .await
}
