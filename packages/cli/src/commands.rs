//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use crime_report_cli_utils::{IndicatifProgress, MultiProgress};
use crime_report_extract::{ConfigError, Extraction, PipelineError};
use crime_report_fetch::FetchError;
use crime_report_store::archive::{self, ArchiveOutcome};
use crime_report_store::csv_export::{self, COMBINED_FILE};
use crime_report_store::{DataPaths, OutputKey, StoreError, WriteOutcome, manifest};

use crate::config::AppConfig;

/// Stem used for undated output when the download URL names no file.
const DOWNLOAD_STEM: &str = "crime_report";

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("input path does not exist: {}", .0.display())]
    MissingInput(PathBuf),
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Clean,
    /// Output was written but should be looked at by an operator.
    NeedsReview,
}

impl RunStatus {
    #[must_use]
    pub fn of(extraction: &Extraction, min_rows: usize) -> Self {
        if extraction.is_suspicious(min_rows) {
            Self::NeedsReview
        } else {
            Self::Clean
        }
    }

    #[must_use]
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Clean => ExitCode::SUCCESS,
            Self::NeedsReview => ExitCode::from(2),
        }
    }
}

/// Where and under which name a report is saved.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Names the output files instead of the extracted report date.
    pub date: Option<NaiveDate>,
    pub json_dir: PathBuf,
    pub pdf_dir: PathBuf,
    /// Lets an empty extraction replace an existing report.
    pub force: bool,
}

impl OutputOptions {
    #[must_use]
    pub fn new(
        paths: &DataPaths,
        date: Option<NaiveDate>,
        output_dir: Option<PathBuf>,
        force: bool,
    ) -> Self {
        Self {
            date,
            json_dir: output_dir.unwrap_or_else(|| paths.json_dir.clone()),
            pdf_dir: paths.pdf_dir.clone(),
            force,
        }
    }
}

/// The PDF to archive next to a saved report.
#[derive(Debug, Clone, Copy)]
pub enum ArchiveSource<'a> {
    File(&'a Path),
    Bytes(&'a [u8]),
}

/// Extracts the PDF at `pdf` and saves the report.
///
/// # Errors
///
/// Returns [`CommandError`] if the PDF cannot be opened or the output
/// cannot be written.
pub fn process(
    pdf: &Path,
    archive_pdf: bool,
    options: &OutputOptions,
    config: &AppConfig,
) -> Result<RunStatus, CommandError> {
    let extract_config = config.extract_config()?;
    let extraction = crime_report_extract::process_pdf(pdf, &extract_config)?;

    let stem = pdf
        .file_stem()
        .map_or_else(|| "report".to_owned(), |s| s.to_string_lossy().into_owned());
    let source = archive_pdf.then_some(ArchiveSource::File(pdf));
    save_extraction(&extraction, &stem, source, options)?;

    Ok(RunStatus::of(&extraction, extract_config.min_rows()))
}

/// Downloads the report, extracts it, and saves both the report and the
/// PDF.
///
/// # Errors
///
/// Returns [`CommandError`] if the download fails after retries, the bytes
/// are not a readable PDF, or the output cannot be written.
pub async fn fetch(
    url: Option<String>,
    options: &OutputOptions,
    config: &AppConfig,
    multi: &MultiProgress,
) -> Result<RunStatus, CommandError> {
    let extract_config = config.extract_config()?;
    let url = url.unwrap_or_else(|| config.fetch.url.clone());

    let progress = IndicatifProgress::download_bar(multi, "Downloading report");
    let bytes = crime_report_fetch::download_pdf(&url, &config.fetch, progress.as_ref()).await?;

    let stem = url_file_stem(&url);
    let extraction = crime_report_extract::process_pdf_bytes(
        &bytes,
        Some(&format!("{stem}.pdf")),
        &extract_config,
    )?;
    save_extraction(&extraction, &stem, Some(ArchiveSource::Bytes(&bytes)), options)?;

    Ok(RunStatus::of(&extraction, extract_config.min_rows()))
}

/// Writes the report JSON, archives the PDF if given, and refreshes the
/// manifest for dated reports. Returns the key the files were saved under.
///
/// # Errors
///
/// Returns [`CommandError::Store`] if any write fails.
pub fn save_extraction(
    extraction: &Extraction,
    source_stem: &str,
    archive_source: Option<ArchiveSource<'_>>,
    options: &OutputOptions,
) -> Result<OutputKey, CommandError> {
    let record = &extraction.record;
    match (options.date, record.report_date) {
        (Some(date), Some(found)) if date != found => {
            log::warn!("Using --date {date} although the report header reads {found}");
        }
        _ => {}
    }

    let key = OutputKey::for_report(options.date, record.report_date, source_stem);
    let json = crime_report_store::write_report(&options.json_dir, &key, record, options.force)?;

    let pdf = archive_source
        .map(|source| match source {
            ArchiveSource::File(path) => archive::archive_pdf(path, &options.pdf_dir, &key),
            ArchiveSource::Bytes(bytes) => {
                archive::archive_pdf_bytes(bytes, &options.pdf_dir, &key)
            }
        })
        .transpose()?;

    if key.is_dated() {
        manifest::update_manifest(&options.json_dir)?;
    } else {
        log::warn!(
            "No report date found; saved as {} and left out of the manifest",
            json.path().display()
        );
    }

    log_summary(extraction, &json, pdf.as_ref());
    Ok(key)
}

fn log_summary(extraction: &Extraction, json: &WriteOutcome, pdf: Option<&ArchiveOutcome>) {
    let record = &extraction.record;
    log::info!(
        "Report date: {}",
        record
            .report_date
            .map_or_else(|| "unknown".to_owned(), |d| d.to_string())
    );
    log::info!("Crime statistics records: {}", extraction.row_count());
    log::info!("Violent crimes: {}", record.summary.violent_crime_count);
    log::info!("Property crimes: {}", record.summary.property_crime_count);
    log::info!("Parse errors: {}", record.parse_errors.len());
    log::info!("Output JSON: {}", json.path().display());
    if let Some(pdf) = pdf {
        log::info!("Archived PDF: {}", pdf.path().display());
    }
}

/// Rebuilds `manifest.json` in `dir`.
///
/// # Errors
///
/// Returns [`CommandError::Store`] if the directory cannot be listed or the
/// manifest cannot be written.
pub fn rebuild_manifest(dir: &Path) -> Result<RunStatus, CommandError> {
    manifest::update_manifest(dir)?;
    Ok(RunStatus::Clean)
}

/// Exports stored reports to CSV.
///
/// With `combined`, every report in the input directory goes into one file.
/// Otherwise a directory input is exported file by file and a file input
/// on its own. A run that exports nothing needs review.
///
/// # Errors
///
/// Returns [`CommandError`] if the input does not exist or a conversion
/// fails.
pub fn csv(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    combined: bool,
    paths: &DataPaths,
) -> Result<RunStatus, CommandError> {
    let input = input.unwrap_or_else(|| paths.json_dir.clone());

    let exported = if combined {
        let json_dir = if input.is_dir() {
            input
        } else {
            log::warn!(
                "{} is not a directory; combining {} instead",
                input.display(),
                paths.json_dir.display()
            );
            paths.json_dir.clone()
        };
        let output = output.unwrap_or_else(|| paths.csv_dir.join(COMBINED_FILE));
        csv_export::export_combined(&json_dir, &output)?
    } else if input.is_dir() {
        let csv_dir = output.unwrap_or_else(|| paths.csv_dir.clone());
        csv_export::export_dir(&input, &csv_dir)?.files
    } else if input.is_file() {
        let output = output.unwrap_or_else(|| {
            let stem = input
                .file_stem()
                .map_or_else(|| "report".into(), |s| s.to_string_lossy());
            paths.csv_dir.join(format!("{stem}.csv"))
        });
        csv_export::export_report(&input, &output)?
    } else {
        return Err(CommandError::MissingInput(input));
    };

    Ok(if exported == 0 {
        RunStatus::NeedsReview
    } else {
        RunStatus::Clean
    })
}

/// File stem named by the last path segment of `url`, or
/// `crime_report` when the URL does not name a file.
fn url_file_stem(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let name = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    let stem = name
        .strip_suffix(".pdf")
        .or_else(|| name.strip_suffix(".PDF"))
        .unwrap_or(name);

    if stem.is_empty() || stem.contains(':') || stem.contains('.') {
        DOWNLOAD_STEM.to_owned()
    } else {
        stem.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use crime_report_extract::ExtractConfig;
    use crime_report_pdf::ReportDocument;
    use crime_report_store::manifest::MANIFEST_FILE;

    use super::*;

    const REPORT: &str = "\
Daily Crime Report
Sunday, February 8, 2026

Offense     Mon 2/2     Tue 2/3     Wed 2/4     7-Day Totals     YTD 26 1/1-2/8     YTD 25 1/1-2/8
Murder     0     1     0     1     9     7
Rape     0     0     1     1     4     6
Robbery     2     3     1     6     40     38
Burglary     1     2     0     3     25     31
Theft     4     4     5     13     120     98
";

    fn extract(text: &str) -> Extraction {
        let document = ReportDocument::from_pages(vec![text.to_owned()]).with_file_name("daily.pdf");
        crime_report_extract::extract_report(&document, &ExtractConfig::default())
    }

    fn options(root: &Path, date: Option<NaiveDate>, force: bool) -> OutputOptions {
        OutputOptions {
            date,
            json_dir: root.join("json"),
            pdf_dir: root.join("pdf"),
            force,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn clean_report_exits_zero_and_updates_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let extraction = extract(REPORT);
        assert_eq!(RunStatus::of(&extraction, 5), RunStatus::Clean);

        let options = options(dir.path(), None, false);
        let key = save_extraction(
            &extraction,
            "daily",
            Some(ArchiveSource::Bytes(b"%PDF")),
            &options,
        )
        .unwrap();

        assert_eq!(key, OutputKey::Dated(date(2026, 2, 8)));
        assert!(options.json_dir.join("20260208.json").is_file());
        assert!(options.pdf_dir.join("20260208.pdf").is_file());

        let manifest = std::fs::read_to_string(options.json_dir.join(MANIFEST_FILE)).unwrap();
        assert!(manifest.contains("\"latest\": \"20260208.json\""));
    }

    #[test]
    fn date_override_names_output_only() {
        let dir = tempfile::tempdir().unwrap();
        let extraction = extract(REPORT);
        let options = options(dir.path(), Some(date(2026, 2, 9)), false);

        let key = save_extraction(&extraction, "daily", None, &options).unwrap();
        assert_eq!(key, OutputKey::Dated(date(2026, 2, 9)));

        let saved =
            crime_report_store::read_report(&options.json_dir.join("20260209.json")).unwrap();
        assert_eq!(saved.report_date, Some(date(2026, 2, 8)));
        assert!(!options.pdf_dir.exists());
    }

    #[test]
    fn undated_report_stays_out_of_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let extraction = extract(&REPORT.replace("Sunday, February 8, 2026", ""));
        assert_eq!(RunStatus::of(&extraction, 5), RunStatus::NeedsReview);

        let options = options(dir.path(), None, false);
        let key = save_extraction(&extraction, "daily", None, &options).unwrap();

        assert_eq!(key, OutputKey::Undated("daily".to_owned()));
        assert!(options.json_dir.join("undated-daily.json").is_file());
        assert!(!options.json_dir.join(MANIFEST_FILE).exists());
    }

    #[test]
    fn short_or_noisy_reports_need_review() {
        let extraction = extract(REPORT);
        assert_eq!(RunStatus::of(&extraction, 6), RunStatus::NeedsReview);

        let noisy = extract(&REPORT.replace("Rape     0", "Rape     N/A"));
        assert_eq!(RunStatus::of(&noisy, 5), RunStatus::NeedsReview);
    }

    #[test]
    fn empty_extraction_keeps_existing_report_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let options = options(dir.path(), None, false);
        save_extraction(&extract(REPORT), "daily", None, &options).unwrap();
        let path = options.json_dir.join("20260208.json");
        let before = std::fs::read_to_string(&path).unwrap();

        let empty = extract("Daily Crime Report\nSunday, February 8, 2026\n");
        assert_eq!(empty.row_count(), 0);
        save_extraction(&empty, "daily", None, &options).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

        let forced = OutputOptions {
            force: true,
            ..options
        };
        save_extraction(&empty, "daily", None, &forced).unwrap();
        let saved = crime_report_store::read_report(&path).unwrap();
        assert!(saved.crime_statistics.is_empty());
    }

    #[test]
    fn csv_of_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths {
            json_dir: dir.path().join("json"),
            pdf_dir: dir.path().join("pdf"),
            csv_dir: dir.path().join("csv"),
        };
        let err = csv(Some(dir.path().join("nope.json")), None, false, &paths).unwrap_err();
        assert!(matches!(err, CommandError::MissingInput(_)));
    }

    #[test]
    fn csv_exports_saved_reports() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths {
            json_dir: dir.path().join("json"),
            pdf_dir: dir.path().join("pdf"),
            csv_dir: dir.path().join("csv"),
        };
        let options = OutputOptions::new(&paths, None, None, false);
        save_extraction(&extract(REPORT), "daily", None, &options).unwrap();

        assert_eq!(csv(None, None, false, &paths).unwrap(), RunStatus::Clean);
        assert!(paths.csv_dir.join("20260208.csv").is_file());

        assert_eq!(csv(None, None, true, &paths).unwrap(), RunStatus::Clean);
        assert!(paths.csv_dir.join(COMBINED_FILE).is_file());
    }

    #[test]
    fn derives_stem_from_download_url() {
        assert_eq!(url_file_stem("https://dailycrime.princegeorgescountymd.gov/"), "crime_report");
        assert_eq!(url_file_stem("https://example.gov/reports/daily.pdf?v=2"), "daily");
        assert_eq!(url_file_stem("https://example.gov/reports/Daily-Report.PDF"), "Daily-Report");
        assert_eq!(url_file_stem(""), "crime_report");
    }
}
