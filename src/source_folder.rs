//! Recursive source discovery, batch analysis, and report generation
//!
//! A `SourceFolder` owns one analysis pass: find the matching source files
//! under a root, parse them all, write the reports, and (when asked) rewrite
//! the files in place.

use crate::actions::RefactorAction;
use crate::error::Result;
use crate::logging::Progress;
use crate::reports::{FileReport, RunSummary};
use crate::source_file::{CallMatcher, SourceFile};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions treated as analyzable source.
const SOURCE_EXTENSIONS: &[&str] = &["cc", "cpp"];

/// A folder to be analyzed during one refactor pass.
pub struct SourceFolder {
    root: PathBuf,
    matcher: CallMatcher,
}

impl SourceFolder {
    pub fn new(root: &Path, function_names: &[&str]) -> Result<Self> {
        Ok(Self {
            root: root.to_path_buf(),
            matcher: CallMatcher::new(function_names)?,
        })
    }

    /// Locate source files under the root, recursively, skipping any file
    /// whose name is on the ignore list. Results are sorted for stable
    /// report ordering.
    pub fn find_files(&self, ignore: &[String]) -> Result<Vec<PathBuf>> {
        let mut all_files = Vec::new();
        collect_source_files(&self.root, &mut all_files)?;
        all_files.sort();

        let mut files_to_keep = Vec::new();
        for file in all_files {
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();
            if ignore.contains(&name) {
                tracing::info!(file = %name, "encountered ignored file, skipping");
                continue;
            }
            files_to_keep.push(file);
        }
        Ok(files_to_keep)
    }

    /// Parse every located file into a [`SourceFile`].
    pub fn analyze(&self, files: &[PathBuf]) -> Result<Vec<SourceFile>> {
        tracing::info!(count = files.len(), "processing files to identify function calls");
        let progress = Progress::new(files.len());
        let mut processed = Vec::with_capacity(files.len());
        for (i, path) in files.iter().enumerate() {
            processed.push(SourceFile::parse(path, &self.matcher)?);
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            progress.update(i + 1, name);
        }
        progress.done();
        Ok(processed)
    }

    /// Write all analysis outputs into the output directory, creating it if
    /// needed: a JSON group summary, a per-file parse tally, and the
    /// per-line call distributions.
    pub fn generate_reports(&self, files: &[SourceFile], output_dir: &Path) -> Result<()> {
        fs::create_dir_all(output_dir)?;
        self.generate_json_summary(files, &output_dir.join("results.json"))?;
        Self::generate_file_summary_csv(files, &output_dir.join("file_summary.csv"))?;
        Self::generate_line_details_csv(files, &output_dir.join("lines_summary.csv"))?;
        Self::generate_type_details_csv(files, &output_dir.join("types_summary.csv"))?;
        Ok(())
    }

    /// The JSON summary: per file, a content hash and every call group with
    /// its parsed arguments and line span.
    fn generate_json_summary(&self, files: &[SourceFile], output_file: &Path) -> Result<()> {
        tracing::info!("building JSON summary output");
        let progress = Progress::new(files.len());
        let mut reports: BTreeMap<String, FileReport> = BTreeMap::new();
        for (i, sf) in files.iter().enumerate() {
            reports.insert(
                sf.file_name(),
                FileReport {
                    source_hash: source_hash(&sf.original_text),
                    groups: sf.groups.iter().map(|g| g.to_json()).collect(),
                },
            );
            progress.update(i + 1, &sf.file_name());
        }
        progress.done();

        let summary = RunSummary {
            tool_version: crate::VERSION.to_string(),
            generated_at: Utc::now(),
            files: reports,
        };
        fs::write(output_file, serde_json::to_string_pretty(&summary)?)?;
        Ok(())
    }

    /// Per-file tally of successful and failed call parses. Primarily a
    /// debugging aid for the parser itself.
    fn generate_file_summary_csv(files: &[SourceFile], output_file: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(output_file)?;
        writer.write_record(["File", "Good", "Bad"])?;
        for sf in files {
            let good = sf.found_functions.iter().filter(|c| c.appears_successful).count();
            let bad = sf.found_functions.len() - good;
            writer.write_record([
                sf.path.display().to_string(),
                good.to_string(),
                bad.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// One column per file: the header row is the file name, each following
    /// row is the 0/1 call coverage of the corresponding source line.
    /// Shorter files pad out with empty cells.
    fn generate_line_details_csv(files: &[SourceFile], output_file: &Path) -> Result<()> {
        let columns: Vec<Vec<String>> = files
            .iter()
            .map(|sf| {
                let mut column = vec![sf.file_name()];
                column.extend(sf.function_distribution().iter().map(usize::to_string));
                column
            })
            .collect();
        Self::write_transposed_csv(&columns, output_file)
    }

    /// Same layout as the line details, but cells carry `call_type + 1` so
    /// the distribution of call kinds within each file can be plotted.
    fn generate_type_details_csv(files: &[SourceFile], output_file: &Path) -> Result<()> {
        let columns: Vec<Vec<String>> = files
            .iter()
            .map(|sf| {
                let mut column = vec![sf.file_name()];
                column.extend(sf.advanced_function_distribution().iter().map(usize::to_string));
                column
            })
            .collect();
        Self::write_transposed_csv(&columns, output_file)
    }

    fn write_transposed_csv(columns: &[Vec<String>], output_file: &Path) -> Result<()> {
        let depth = columns.iter().map(Vec::len).max().unwrap_or(0);
        let mut writer = csv::Writer::from_path(output_file)?;
        for row_index in 0..depth {
            let row: Vec<&str> = columns
                .iter()
                .map(|column| column.get(row_index).map_or("", String::as_str))
                .collect();
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Rewrite every analyzed file in place through the action's visitor.
    /// Make sure the repository is prepared for this: committed, clean.
    pub fn rewrite_files_in_place<A>(&self, files: &[SourceFile], action: &A) -> Result<()>
    where
        A: RefactorAction + ?Sized,
    {
        tracing::info!(count = files.len(), "fixing up files in place with new call text");
        let progress = Progress::new(files.len());
        for (i, sf) in files.iter().enumerate() {
            let new_text = if action.visits_each_group() {
                sf.text_with_groups_replaced(|group| action.visit_group(group))
            } else {
                sf.text_with_calls_replaced(|call| action.visit_call(call))
            };
            sf.write_text(&new_text)?;
            progress.update(i + 1, &sf.file_name());
        }
        progress.done();
        Ok(())
    }
}

/// Content hash recorded in the JSON summary, so downstream tooling can
/// notice when a file changed after analysis.
fn source_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("sha256:{}", hex::encode(&hasher.finalize()[..8]))
}

fn collect_source_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(()), // skip directories we can't read
    };
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_source_files(&path, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
        {
            out.push(path);
        }
    }
    Ok(())
}
