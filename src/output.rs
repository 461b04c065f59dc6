use colored::Colorize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::pr::{ChangedFiles, PullRequestRef};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where a successful run publishes its results.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    /// Directory receiving files_created.json, files_updated.json and files_deleted.json
    pub dir: PathBuf,
    /// GitHub Actions step output file ($GITHUB_OUTPUT). Printed to stdout when unset.
    pub step_outputs: Option<PathBuf>,
}

/// Output name and JSON-encoded bucket, in emission order.
fn encode(changed: &ChangedFiles) -> Result<[(&'static str, String); 3], OutputError> {
    Ok([
        ("files_created", serde_json::to_string(&changed.created)?),
        ("files_updated", serde_json::to_string(&changed.updated)?),
        ("files_deleted", serde_json::to_string(&changed.deleted)?),
    ])
}

/// Publish the three buckets as step outputs and as JSON files.
///
/// Everything is encoded and the step output file opened before anything is
/// written. If a later write fails, files created so far are removed.
#[instrument(skip(changed, target), fields(count = changed.count()))]
pub fn emit(changed: &ChangedFiles, target: &OutputTarget) -> Result<(), OutputError> {
    let outputs = encode(changed)?;

    let mut lines = String::new();
    for (name, json) in &outputs {
        lines.push_str(&format!("{}={}\n", name, json));
    }

    let mut written = Vec::new();
    let step_file = match &target.step_outputs {
        Some(path) => {
            debug!(path = %path.display(), "opening step output file");
            let existed = path.exists();
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            if !existed {
                written.push(path.clone());
            }
            Some(file)
        }
        None => None,
    };

    if let Err(e) = write_results(&outputs, &lines, &target.dir, step_file, &mut written) {
        for path in &written {
            debug!(path = %path.display(), "removing partial result");
            fs::remove_file(path).ok();
        }
        return Err(e);
    }
    Ok(())
}

fn write_results(
    outputs: &[(&'static str, String); 3],
    lines: &str,
    dir: &Path,
    step_file: Option<File>,
    written: &mut Vec<PathBuf>,
) -> Result<(), OutputError> {
    for (name, json) in outputs {
        let path = dir.join(format!("{}.json", name));
        debug!(path = %path.display(), "writing bucket file");
        fs::write(&path, json)?;
        written.push(path);
    }

    match step_file {
        Some(mut file) => file.write_all(lines.as_bytes())?,
        None => {
            debug!("no step output file, printing outputs");
            print!("{}", lines);
        }
    }
    Ok(())
}

/// Print a short colored summary to stderr.
pub fn print_summary(changed: &ChangedFiles, pr: &PullRequestRef) {
    eprintln!();
    eprintln!(
        "PR #{} ({}/{}): {} of {} changed files selected",
        pr.number,
        pr.owner,
        pr.repo,
        changed.count(),
        pr.changed_files
    );
    print_bucket("created", &changed.created, |s| s.green().bold());
    print_bucket("updated", &changed.updated, |s| s.yellow().bold());
    print_bucket("deleted", &changed.deleted, |s| s.red().bold());
    eprintln!();
}

fn print_bucket(
    label: &str,
    files: &[String],
    paint: impl Fn(&str) -> colored::ColoredString,
) {
    eprintln!("═══ {} ({}) ═══", paint(label), files.len());
    for file in files {
        eprintln!("  • {}", file);
    }
}

/// Report a failed run the way GitHub Actions expects.
pub fn report_failure(message: &str) {
    println!("::error::{}", escape_annotation(message));
}

fn escape_annotation(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// The directory results go to when none is configured: $HOME, else the working directory.
pub fn default_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(".").to_path_buf())
}
