//! Quill code formatter CLI command

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use quill_formatter::{format_source, FormatConfig, FormatError, IndentStyle, NewlineStyle};

/// Verbosity level for formatter output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Suppress all non-error output
    Quiet,
    /// Normal output (default)
    #[default]
    Normal,
    /// Detailed output with timing and file info
    Verbose,
}

/// Arguments for the fmt command
pub struct FmtArgs {
    pub paths: Vec<String>,
    pub check: bool,
    pub stdout: bool,
    pub config_path: Option<PathBuf>,
    pub indent_size: Option<usize>,
    pub tabs: bool,
    pub max_width: Option<usize>,
    pub newline: Option<String>,
    pub verbosity: Verbosity,
}

/// Run the fmt command
pub fn run(args: FmtArgs) -> Result<()> {
    let start_time = std::time::Instant::now();

    // Config file first, CLI overrides on top
    let mut config = load_config(&args.config_path)?;
    if let Some(size) = args.indent_size {
        config.indent_size = size;
    }
    if args.tabs {
        config.indent_style = IndentStyle::Tabs;
    }
    if let Some(width) = args.max_width {
        config.max_width = width;
    }
    if let Some(ref newline) = args.newline {
        config.newline = match newline.as_str() {
            "lf" => NewlineStyle::Lf,
            "crlf" => NewlineStyle::Crlf,
            other => bail!("Unknown newline style '{other}' (expected 'lf' or 'crlf')"),
        };
    }

    let files = collect_files(&args.paths)?;

    if files.is_empty() {
        if args.verbosity != Verbosity::Quiet {
            eprintln!("No Quill files found");
        }
        return Ok(());
    }

    if args.verbosity == Verbosity::Verbose {
        eprintln!("Configuration:");
        eprintln!("  indent_size: {}", config.indent_size);
        eprintln!("  max_width: {}", config.max_width);
        if let Some(ref path) = args.config_path {
            eprintln!("  config_file: {}", path.display());
        }
        eprintln!("Processing {} file(s)...", files.len());
        eprintln!();
    }

    let mut had_errors = false;
    let mut unformatted_count = 0;
    let mut formatted_count = 0;
    let mut unchanged_count = 0;
    let total_files = files.len();

    for (index, file) in files.iter().enumerate() {
        let file_start = std::time::Instant::now();

        if args.verbosity == Verbosity::Verbose && total_files > 1 {
            eprint!("[{}/{}] {} ... ", index + 1, total_files, file.display());
        }

        let source = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;

        match format_source(&source, &config) {
            Ok(formatted) => {
                let changed = formatted != source;

                if args.stdout {
                    print!("{formatted}");
                } else if args.check {
                    if changed {
                        if args.verbosity == Verbosity::Verbose {
                            eprintln!("would reformat");
                        } else if args.verbosity == Verbosity::Normal {
                            eprintln!("Would reformat: {}", file.display());
                        }
                        unformatted_count += 1;
                    } else {
                        unchanged_count += 1;
                        if args.verbosity == Verbosity::Verbose {
                            eprintln!("ok");
                        }
                    }
                } else if changed {
                    std::fs::write(file, &formatted)
                        .with_context(|| format!("Failed to write {}", file.display()))?;

                    if args.verbosity == Verbosity::Verbose {
                        let elapsed = file_start.elapsed();
                        eprintln!("formatted ({:.2}ms)", elapsed.as_secs_f64() * 1000.0);
                    } else if args.verbosity == Verbosity::Normal {
                        eprintln!("Formatted: {}", file.display());
                    }
                    formatted_count += 1;
                } else {
                    unchanged_count += 1;
                    if args.verbosity == Verbosity::Verbose {
                        eprintln!("unchanged");
                    }
                }
            }
            Err(error) => {
                if args.verbosity == Verbosity::Verbose {
                    eprintln!("ERROR");
                }
                report_error(file, &error, &config);
                had_errors = true;
            }
        }
    }

    let total_elapsed = start_time.elapsed();

    if args.check {
        if unformatted_count > 0 {
            if args.verbosity != Verbosity::Quiet {
                eprintln!();
                eprintln!("{unformatted_count} file(s) would be reformatted");
            }
            std::process::exit(1);
        } else if args.verbosity != Verbosity::Quiet {
            eprintln!("All {} file(s) are formatted correctly", files.len());
        }
    } else if !args.stdout
        && args.verbosity != Verbosity::Quiet
        && (formatted_count > 0 || args.verbosity == Verbosity::Verbose)
    {
        eprintln!();
        if formatted_count > 0 {
            eprintln!("Formatted {formatted_count} file(s)");
        }
        if args.verbosity == Verbosity::Verbose {
            eprintln!(
                "Summary: {} formatted, {} unchanged, {} with errors",
                formatted_count,
                unchanged_count,
                total_files - formatted_count - unchanged_count
            );
            eprintln!("Total time: {:.2}ms", total_elapsed.as_secs_f64() * 1000.0);
        }
    }

    if had_errors {
        std::process::exit(1);
    }

    Ok(())
}

fn report_error(file: &Path, error: &FormatError, config: &FormatConfig) {
    eprintln!(
        "{}: {}",
        file.display(),
        error.localized_message(&config.locale)
    );
}

/// Load format configuration from a TOML file, or use defaults
fn load_config(config_path: &Option<PathBuf>) -> Result<FormatConfig> {
    match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            FormatConfig::from_toml(&content)
                .with_context(|| format!("Invalid config file: {}", path.display()))
        }
        None => Ok(FormatConfig::default()),
    }
}

/// Collect Quill source files from paths (handles directories recursively)
fn collect_files(paths: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path_str in paths {
        let path = Path::new(path_str);
        if path.is_dir() {
            collect_files_recursive(path, &mut files)?;
        } else {
            // any file explicitly passed is accepted
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "quill") {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_files_recurses_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("a.quill"), "1").unwrap();
        std::fs::write(nested.join("b.quill"), "2").unwrap();
        std::fs::write(nested.join("ignored.txt"), "3").unwrap();

        let mut files = collect_files(&[dir.path().to_string_lossy().into_owned()]).unwrap();
        files.sort();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "quill"));
    }

    #[test]
    fn test_explicit_file_is_accepted_regardless_of_extension() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("script.txt");
        std::fs::write(&file, "1 + 2").unwrap();

        let files = collect_files(&[file.to_string_lossy().into_owned()]).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_load_config_defaults_without_path() {
        let config = load_config(&None).unwrap();
        assert_eq!(config.indent_size, 4);
    }
}
