use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::summary::{format_file_size, ExportSummary};
use super::{sanitize_name, Accumulation, ExportError};
use crate::config::ExportFormat;

/// A file to be produced by a flush.
pub(super) struct Output {
    pub path: PathBuf,
    pub contents: String,
}

/// One path list per (library, tag) plus summary.txt.
pub(super) fn text_outputs(
    location: &Path,
    tags: &[String],
    acc: &Accumulation,
    generated_at: DateTime<Utc>,
) -> Vec<Output> {
    let mut outputs = Vec::new();

    for (library, buckets) in acc {
        for tag in tags {
            let contents = buckets
                .get(tag)
                .map(|files| files.iter().map(|f| format!("{}\n", f.path)).collect())
                .unwrap_or_default();
            outputs.push(Output {
                path: location
                    .join(library)
                    .join(format!("{}.txt", sanitize_name(tag))),
                contents,
            });
        }
    }

    let summary = ExportSummary::from_accumulation(acc);
    let listed: Vec<String> = outputs
        .iter()
        .map(|o| {
            o.path
                .strip_prefix(location)
                .unwrap_or(&o.path)
                .display()
                .to_string()
        })
        .collect();

    outputs.push(Output {
        path: location.join("summary.txt"),
        contents: render_summary(&summary, &listed, generated_at),
    });
    outputs
}

fn render_summary(summary: &ExportSummary, files: &[String], generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Labelarr Export Summary");
    let _ = writeln!(out, "=======================");
    let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out);

    let _ = writeln!(out, "Generated files:");
    for file in files {
        let _ = writeln!(out, "  {}", file);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Overall:");
    let _ = writeln!(out, "  Total files: {}", summary.total_files);
    let _ = writeln!(
        out,
        "  Total size: {} ({} bytes)",
        summary.total_size_formatted, summary.total_size
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Libraries:");
    for (library, stats) in &summary.libraries {
        let _ = writeln!(
            out,
            "  {}: {} files, {}",
            library, stats.files, stats.size_formatted
        );
        for (tag, tag_stats) in &stats.tags {
            let _ = writeln!(
                out,
                "    {}: {} files, {}",
                tag, tag_stats.files, tag_stats.size_formatted
            );
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Tag totals:");
    for (tag, stats) in &summary.tags {
        let _ = writeln!(
            out,
            "  {}: {} files, {} ({} bytes)",
            tag,
            stats.files,
            format_file_size(stats.size),
            stats.size
        );
    }
    out
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    generated_at: DateTime<Utc>,
    export_mode: &'static str,
    libraries: &'a Accumulation,
    summary: ExportSummary,
}

/// A single export.json document.
pub(super) fn json_outputs(
    location: &Path,
    format: ExportFormat,
    acc: &Accumulation,
    generated_at: DateTime<Utc>,
) -> Result<Vec<Output>, ExportError> {
    let document = ExportDocument {
        generated_at,
        export_mode: format.as_str(),
        libraries: acc,
        summary: ExportSummary::from_accumulation(acc),
    };
    let contents = serde_json::to_string_pretty(&document)
        .map_err(|e| ExportError::Serialization(e.to_string()))?;

    Ok(vec![Output {
        path: location.join("export.json"),
        contents,
    }])
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Stage every output next to its destination, then rename them all into
/// place.
///
/// A staging failure publishes nothing. Each rename is atomic but the set is
/// not: if a rename fails, outputs renamed before it stay published and the
/// remaining staged files are removed.
pub(super) fn write_all_atomic(outputs: &[Output]) -> Result<Vec<PathBuf>, ExportError> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(outputs.len());

    let stage = |output: &Output| -> Result<PathBuf, ExportError> {
        if let Some(parent) = output.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;
        }
        let tmp = staging_path(&output.path);
        fs::write(&tmp, &output.contents).map_err(|e| ExportError::io(&tmp, e))?;
        Ok(tmp)
    };

    for output in outputs {
        match stage(output) {
            Ok(tmp) => staged.push((tmp, &output.path)),
            Err(e) => {
                discard(&staged);
                return Err(e);
            }
        }
    }

    let mut written = Vec::with_capacity(staged.len());
    for (i, (tmp, target)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(tmp, target) {
            discard(&staged[i..]);
            return Err(ExportError::io(target, e));
        }
        written.push(target.to_path_buf());
    }
    Ok(written)
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}
