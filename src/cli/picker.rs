//! Interactive sales-file picker.
//!
//! Used when `salescast` (or `salescast dash`) is started without `-f`:
//! every `*.csv` below the current directory is listed and the user picks one
//! by number or types a path.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

const SEARCH_DEPTH: usize = 4;
const SKIPPED_DIRS: [&str; 4] = [".git", "target", "node_modules", "__pycache__"];

/// What the user typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Pick(PathBuf),
    Invalid(String),
    Quit,
}

/// Prompt on stdin/stdout until a valid sales CSV is chosen.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let files = discover_csv_files(Path::new("."));
    if files.is_empty() {
        return Err(AppError::usage(
            "No .csv files found. Provide one with `salescast dash -f <sales.csv>`.",
        ));
    }

    println!("Sales files ({}):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, display_path(path));
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Pick a file (1-{}), type a path, or q to quit: ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::usage(format!("Failed to write prompt: {e}")))?;

        let line = match lines.next() {
            Some(line) => line.map_err(|e| AppError::usage(format!("Failed to read input: {e}")))?,
            None => return Err(AppError::usage("No input received. Pass a sales file with -f.")),
        };

        match interpret(&line, &files) {
            Choice::Pick(path) => return Ok(path),
            Choice::Quit => return Err(AppError::usage("Canceled.")),
            Choice::Invalid(msg) => println!("{msg}"),
        }
    }
}

/// Map one line of prompt input to a choice.
pub fn interpret(input: &str, files: &[PathBuf]) -> Choice {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Choice::Quit;
    }

    if let Ok(n) = input.parse::<usize>() {
        return match n.checked_sub(1).and_then(|i| files.get(i)) {
            Some(path) => Choice::Pick(path.clone()),
            None => Choice::Invalid(format!("No file numbered {n}.")),
        };
    }

    match validate_csv_path(Path::new(input)) {
        Ok(path) => Choice::Pick(path),
        Err(err) => Choice::Invalid(err.message().to_string()),
    }
}

/// Check that `path` is an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.is_file() {
        return Err(AppError::usage(format!("Sales file not found: {}", path.display())));
    }
    if !has_csv_extension(path) {
        return Err(AppError::usage(format!("Expected a .csv file, got: {}", path.display())));
    }
    Ok(path.to_path_buf())
}

/// All `*.csv` files below `root`, sorted by display path.
pub fn discover_csv_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk(root, 0, &mut out);
    out.sort_by_key(|p| display_path(p));
    out
}

fn walk(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > SEARCH_DEPTH {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(kind) = entry.file_type() else {
            continue;
        };
        if kind.is_dir() {
            let name = entry.file_name();
            if !SKIPPED_DIRS.iter().any(|skip| name == *skip) {
                walk(&path, depth + 1, out);
            }
        } else if kind.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

pub fn display_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("salescast_picker_{name}_{}", std::process::id()));
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::create_dir_all(dir.join("target")).unwrap();
        dir
    }

    #[test]
    fn discovery_finds_nested_csvs_and_skips_build_dirs() {
        let dir = scratch_dir("discover");
        fs::write(dir.join("b.csv"), "x").unwrap();
        fs::write(dir.join("nested").join("a.CSV"), "x").unwrap();
        fs::write(dir.join("target").join("skip.csv"), "x").unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();

        let files = discover_csv_files(&dir);
        fs::remove_dir_all(&dir).ok();

        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.csv", "a.CSV"]);
    }

    #[test]
    fn numbers_pick_from_the_list() {
        let files = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        assert_eq!(interpret(" 2 ", &files), Choice::Pick(PathBuf::from("b.csv")));
        assert_eq!(interpret("0", &files), Choice::Invalid("No file numbered 0.".into()));
        assert_eq!(interpret("3", &files), Choice::Invalid("No file numbered 3.".into()));
        assert_eq!(interpret("Q", &files), Choice::Quit);
    }

    #[test]
    fn typed_paths_must_be_existing_csvs() {
        let dir = scratch_dir("typed");
        let csv = dir.join("sales.csv");
        let txt = dir.join("sales.txt");
        fs::write(&csv, "x").unwrap();
        fs::write(&txt, "x").unwrap();

        let picked = interpret(csv.to_str().unwrap(), &[]);
        let wrong_ext = interpret(txt.to_str().unwrap(), &[]);
        fs::remove_dir_all(&dir).ok();

        assert_eq!(picked, Choice::Pick(csv));
        assert!(matches!(wrong_ext, Choice::Invalid(msg) if msg.starts_with("Expected a .csv")));
        assert!(matches!(interpret("/nonexistent.csv", &[]), Choice::Invalid(_)));
    }
}
