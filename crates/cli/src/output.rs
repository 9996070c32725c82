// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;
use tb_core::{JobHandle, JobId, JobResult, JobStatusReport};

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One-line summary of a job result, e.g. "failed: 10 passed, 2 failed (1.5s)".
pub fn format_result_summary(result: &JobResult) -> String {
    let mut out = result.status.to_string();
    if let Some(counts) = result.counts {
        out.push_str(&format!(": {} passed, {} failed", counts.passed, counts.failed));
        if counts.skipped > 0 {
            out.push_str(&format!(", {} skipped", counts.skipped));
        }
    }
    if let Some(ms) = result.duration_ms {
        out.push_str(&format!(" ({})", format_duration_ms(ms)));
    }
    out
}

/// "850ms", "1.5s", "2m05s"
pub fn format_duration_ms(ms: u64) -> String {
    match ms {
        0..=999 => format!("{ms}ms"),
        1_000..=59_999 => format!("{:.1}s", ms as f64 / 1000.0),
        _ => format!("{}m{:02}s", ms / 60_000, (ms % 60_000) / 1000),
    }
}

/// Print artifact content exactly, ending with a newline.
pub fn print_content(content: &str) {
    if content.is_empty() {
        return;
    }
    if content.ends_with('\n') {
        print!("{content}");
    } else {
        println!("{content}");
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct JobReportJson<'a> {
    job_id: &'a JobId,
    #[serde(flatten)]
    report: &'a JobStatusReport,
}

/// Print a raw status report for `tb job status`.
pub fn print_job_report(
    job: &JobId,
    report: &JobStatusReport,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Job {job}: {}", report.status);
            if let Some(result) = &report.result {
                println!("Result: {}", format_result_summary(result));
            }
            if let Some(logs) = &report.logs {
                println!("{logs}");
            }
        }
        OutputFormat::Json => print_json(&JobReportJson { job_id: job, report })?,
    }
    Ok(())
}

/// Final state of a job run by `tb job run`.
#[derive(Debug, Serialize)]
pub struct JobRunSummary {
    #[serde(flatten)]
    pub handle: JobHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    pub log: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

pub fn print_job_run(summary: &JobRunSummary, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            let handle = &summary.handle;
            println!("Job {} ({} {}): {}", handle.job_id, handle.kind, handle.owner, handle.status);
            if let Some(result) = &summary.result {
                println!("Result: {}", format_result_summary(result));
            }
            if !summary.log.is_empty() {
                println!("{}", summary.log);
            }
            if let Some(content) = &summary.content {
                print_content(content);
            }
        }
        OutputFormat::Json => print_json(summary)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
