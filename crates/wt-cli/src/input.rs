//! Log-file discovery and reading.
//!
//! The core only sees already-split rows; everything filesystem-shaped
//! lives here.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use wt_core::RawSource;

/// Finds `*.txt` and `*.csv` files in a directory, sorted by name.
///
/// Errors when the directory does not exist or contains no log files,
/// matching how the tool is normally driven from an exports folder.
pub fn find_log_files(logs_dir: &Path) -> Result<Vec<PathBuf>> {
    if !logs_dir.is_dir() {
        bail!("logs directory not found: {}", logs_dir.display());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(logs_dir)
        .with_context(|| format!("failed to read {}", logs_dir.display()))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        bail!("no .txt or .csv files found in {}", logs_dir.display());
    }

    tracing::info!(count = files.len(), dir = %logs_dir.display(), "found log files");
    Ok(files)
}

/// Picks the cell delimiter from the header line: tab when present
/// (activity exports are TSV), comma otherwise.
fn detect_delimiter(header: &str) -> char {
    if header.contains('\t') { '\t' } else { ',' }
}

/// Reads one log file into a raw source for the core.
pub fn read_source(path: &Path) -> Result<RawSource> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input")
        .to_string();
    Ok(split_rows(name, &text))
}

/// Splits raw text into a header row and data rows.
fn split_rows(name: String, text: &str) -> RawSource {
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else {
        return RawSource {
            name,
            headers: Vec::new(),
            rows: Vec::new(),
        };
    };

    let delimiter = detect_delimiter(header_line);
    let headers = header_line
        .split(delimiter)
        .map(|cell| cell.trim().to_string())
        .collect();
    let rows = lines
        .map(|line| line.split(delimiter).map(ToString::to_string).collect())
        .collect();

    RawSource { name, headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn discovers_and_sorts_log_files() {
        let temp = tempfile::tempdir().unwrap();
        for name in ["b.csv", "a.txt", "notes.md"] {
            std::fs::File::create(temp.path().join(name)).unwrap();
        }

        let files = find_log_files(temp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.txt", "b.csv"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = find_log_files(Path::new("/nonexistent/logs")).unwrap_err();
        assert!(err.to_string().contains("logs directory not found"));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = find_log_files(temp.path()).unwrap_err();
        assert!(err.to_string().contains("no .txt or .csv files"));
    }

    #[test]
    fn reads_tab_separated_source() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("march.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Date/Time (UTC)\tUser\tAction").unwrap();
        writeln!(file, "2024-03-01 09:00:00\talice\tsave").unwrap();

        let source = read_source(&path).unwrap();
        assert_eq!(source.name, "march.txt");
        assert_eq!(source.headers, ["Date/Time (UTC)", "User", "Action"]);
        assert_eq!(source.rows, [["2024-03-01 09:00:00", "alice", "save"]]);
    }

    #[test]
    fn falls_back_to_comma_delimiter() {
        let source = split_rows(
            "a.csv".to_string(),
            "Timestamp,User\n2024-03-01 09:00:00,alice\n",
        );
        assert_eq!(source.headers, ["Timestamp", "User"]);
        assert_eq!(source.rows, [["2024-03-01 09:00:00", "alice"]]);
    }

    #[test]
    fn empty_file_yields_empty_source() {
        let source = split_rows("empty.txt".to_string(), "");
        assert!(source.headers.is_empty());
        assert!(source.rows.is_empty());
    }
}
