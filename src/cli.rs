use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use sweeper::codec::{FormatCodec, FormatKind, detect_format};
use sweeper::config::SweeperConfig;
use sweeper::error::SweeperError;
use sweeper::pipeline::{BatchReport, FileError, FileOutcome, Pipeline, PipelineRequest};
use sweeper::preview::TablePreview;
use sweeper::projection::ProjectionSpec;
use sweeper::table::SourceFile;

#[derive(Parser)]
#[command(name = "sweeper", version, about = "Clean and convert CSV and Excel files")]
pub struct Cli {
    /// Path to a JSON config file. Defaults to the platform config directory.
    #[arg(long, global = true, env = "SWEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also write daily log files (to the configured directory, or the
    /// platform data directory)
    #[arg(long, global = true)]
    pub log_to_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean files and convert them to CSV or Excel
    Convert {
        /// Input files (.csv or .xlsx)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format: csv or excel. Defaults to the request's target.
        #[arg(long)]
        to: Option<FormatKind>,

        /// Drop repeated rows, keeping the first
        #[arg(long)]
        remove_duplicates: bool,

        /// Fill missing numeric values with the column mean
        #[arg(long)]
        impute_means: bool,

        /// Columns to keep, in order (comma separated)
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// JSON pipeline request; flags given on the command line override it
        #[arg(long)]
        request: Option<PathBuf>,

        /// Directory for converted files
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Print a preview of each converted table
        #[arg(long)]
        preview: bool,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the shape, column kinds and first rows of a file
    Inspect {
        file: PathBuf,
    },
}

pub fn load_config(cli: &Cli) -> Result<SweeperConfig> {
    let mut config = SweeperConfig::load(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.log.level.clone_from(level);
    }
    if cli.log_to_file && config.log.directory.is_none() {
        config.log.directory = sweeper::logging::default_log_dir();
    }
    Ok(config)
}

pub fn run_command(command: Commands, config: &SweeperConfig) -> Result<()> {
    match command {
        Commands::Convert {
            files,
            to,
            remove_duplicates,
            impute_means,
            columns,
            request,
            out_dir,
            preview,
            json,
        } => {
            let mut request = match request {
                Some(path) => PipelineRequest::from_file(&path)?,
                None => PipelineRequest::default(),
            };
            request.cleaning.remove_duplicates |= remove_duplicates;
            request.cleaning.impute_numeric_means |= impute_means;
            request.preview |= preview;
            if let Some(target) = to {
                request.export.target = target;
            }
            if let Some(columns) = columns {
                request.projection = ProjectionSpec::Columns(columns);
            }
            handle_convert(&files, &request, &out_dir, json, config)
        }
        Commands::Inspect { file } => handle_inspect(&file, config),
    }
}

fn handle_convert(
    paths: &[PathBuf],
    request: &PipelineRequest,
    out_dir: &Path,
    json: bool,
    config: &SweeperConfig,
) -> Result<()> {
    let mut sources = Vec::with_capacity(paths.len());
    let mut unreadable = 0_usize;
    for path in paths {
        match SourceFile::from_path(path) {
            Ok(source) => sources.push(source),
            Err(e) => {
                tracing::warn!("Skipping {}: {e}", path.display());
                println!("✗ {}: {e}", path.display());
                unreadable += 1;
            }
        }
    }

    let mut report = Pipeline::new(config).run_uniform(&sources, request);
    guard_outputs(&mut report, paths, out_dir);

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    for artifact in report.artifacts() {
        let target = out_dir.join(&artifact.file_name);
        std::fs::write(&target, &artifact.bytes)
            .with_context(|| format!("Failed to write {}", target.display()))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, out_dir);
    }

    if report.converted_count() == 0 {
        anyhow::bail!(
            "No files converted ({} failed)",
            report.failed_count() + unreadable
        );
    }
    Ok(())
}

/// Turn conversions that would overwrite an input, or another output of
/// the same batch, into failures.
fn guard_outputs(report: &mut BatchReport, inputs: &[PathBuf], out_dir: &Path) {
    let inputs: HashSet<PathBuf> = inputs
        .iter()
        .filter_map(|p| p.canonicalize().ok())
        .collect();
    // Lower-cased: names differing only in case clash on some filesystems
    let mut claimed: HashMap<String, String> = HashMap::new();

    for outcome in &mut report.outcomes {
        let FileOutcome::Converted(converted) = &*outcome else {
            continue;
        };
        let source_name = converted.source_name.clone();
        let name = &converted.artifact.file_name;
        let target = out_dir.join(name);

        let conflict = if let Some(first) = claimed.get(&name.to_lowercase()) {
            Some(format!(
                "output {} is also produced by {first}",
                target.display()
            ))
        } else if target
            .canonicalize()
            .is_ok_and(|resolved| inputs.contains(&resolved))
        {
            Some(format!(
                "output {} would overwrite an input file",
                target.display()
            ))
        } else {
            claimed.insert(name.to_lowercase(), source_name.clone());
            None
        };

        if let Some(msg) = conflict {
            tracing::warn!(file = %source_name, "{msg}");
            let err = SweeperError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                msg,
            ));
            *outcome = FileOutcome::Failed(FileError::new(source_name, &err));
        }
    }
}

fn print_report(report: &BatchReport, out_dir: &Path) {
    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Converted(converted) => {
                let s = &converted.summary;
                println!(
                    "✓ {} → {} ({}, {} rows × {} cols, {} duplicates removed)",
                    converted.source_name,
                    out_dir.join(&converted.artifact.file_name).display(),
                    target_label(&converted.artifact.file_name),
                    s.rows_after,
                    s.columns_after,
                    s.duplicates_removed
                );
                for imputed in &s.imputed {
                    println!(
                        "    filled {} cell(s) in '{}' with mean {:.4}",
                        imputed.filled, imputed.name, imputed.mean
                    );
                }
                for name in &s.skipped_means {
                    println!("    '{name}' has no values; left unfilled");
                }
                if let Some(preview) = &converted.preview {
                    print_preview(preview);
                }
            }
            FileOutcome::Failed(err) => println!("✗ {err}"),
        }
    }
    println!("{}", report.summary());
}

fn target_label(file_name: &str) -> &'static str {
    detect_format(file_name).map_or("unknown", FormatKind::label)
}

fn print_preview(preview: &TablePreview) {
    println!(
        "    {} ({:.1} KB): {} rows × {} columns",
        preview.file_name, preview.size_kb, preview.row_count, preview.column_count
    );
    for (name, kind) in &preview.columns {
        println!("      {name}: {kind}");
    }
    if !preview.chart_columns.is_empty() {
        println!("    chart columns: {}", preview.chart_columns.join(", "));
    }
    println!("{}", preview.head);
}

fn handle_inspect(path: &Path, config: &SweeperConfig) -> Result<()> {
    let source = SourceFile::from_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let format = detect_format(source.name())?;
    let df = FormatCodec::from_config(config).decode(source.bytes(), format)?;
    let preview = TablePreview::build(&source, &df, config.preview_row_limit)?;

    println!("Format: {format}");
    print_preview(&preview);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(paths: &[PathBuf]) -> Result<BatchReport> {
        let sources = paths
            .iter()
            .map(|p| SourceFile::from_path(p))
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Pipeline::default().run_uniform(&sources, &PipelineRequest::default()))
    }

    #[test]
    fn test_output_over_input_is_a_failure() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("data.csv");
        std::fs::write(&input, "a,b\n1,\n1,\n2,5\n")?;

        let mut report = run(std::slice::from_ref(&input))?;
        guard_outputs(&mut report, std::slice::from_ref(&input), dir.path());

        assert_eq!(report.converted_count(), 0);
        let kinds: Vec<&str> = report.errors().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Io"]);
        assert_eq!(std::fs::read_to_string(&input)?, "a,b\n1,\n1,\n2,5\n");
        Ok(())
    }

    #[test]
    fn test_repeated_output_name_is_a_failure() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (first, second) = (dir.path().join("one"), dir.path().join("two"));
        std::fs::create_dir_all(&first)?;
        std::fs::create_dir_all(&second)?;
        let inputs = vec![first.join("a.csv"), second.join("a.csv")];
        for path in &inputs {
            std::fs::write(path, "x\n1\n")?;
        }
        let out_dir = dir.path().join("out");

        let mut report = run(&inputs)?;
        guard_outputs(&mut report, &inputs, &out_dir);

        assert_eq!(report.converted_count(), 1);
        let errors: Vec<&FileError> = report.errors().collect();
        assert_eq!(errors.len(), 1);
        assert!(errors.iter().all(|e| e.detail.contains("also produced by a.csv")));
        Ok(())
    }

    #[test]
    fn test_separate_out_dir_keeps_conversions() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("data.csv");
        std::fs::write(&input, "x\n1\n")?;

        let mut report = run(std::slice::from_ref(&input))?;
        guard_outputs(&mut report, std::slice::from_ref(&input), &dir.path().join("out"));
        assert_eq!(report.converted_count(), 1);
        Ok(())
    }

    #[test]
    fn test_log_to_file_uses_default_log_dir() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "{}")?;

        let cli = Cli::try_parse_from([
            "sweeper",
            "--config",
            config_path.to_str().unwrap_or_default(),
            "--log-to-file",
            "inspect",
            "data.csv",
        ])?;
        let config = load_config(&cli)?;
        assert_eq!(config.log.directory, sweeper::logging::default_log_dir());
        Ok(())
    }

    #[test]
    fn test_target_label() {
        assert_eq!(target_label("a.xlsx"), "Excel");
        assert_eq!(target_label("a.csv"), "CSV");
    }
}
