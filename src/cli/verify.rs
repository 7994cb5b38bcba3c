//! `learnhub verify`: pre-build content check.
//!
//! Exit code 0 when every topic is clean, 1 on any error. Warnings are
//! reported but never fail the run.

use std::path::PathBuf;

use anyhow::Result;

use crate::verify::{verify_content_dir, VerifyReport};

/// Run verification and print the report
pub async fn execute(content_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let dir = match content_dir {
        Some(dir) => dir,
        None => crate::config::content_dir()?,
    };

    if !json {
        println!("🔍 Validating topics in {}...\n", dir.display());
    }

    let report = match verify_content_dir(&dir).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_report(report: &VerifyReport) {
    println!("📊 Validation Results:");
    println!("   Topics checked: {}", report.topics_checked);
    println!("   Valid: {}", report.valid);
    println!("   Errors: {}", report.errors.len());
    println!("   Warnings: {}", report.warnings.len());

    if !report.warnings.is_empty() {
        println!("\n⚠️  Warnings:");
        for warning in &report.warnings {
            println!("   - {}", warning);
        }
    }

    if report.has_errors() {
        println!("\n❌ Errors:");
        for (kind, issues) in report.errors_by_kind() {
            println!("\n   {} ({}):", kind, issues.len());
            for issue in issues {
                println!("   [{}] {}", issue.slug, issue.message);
            }
        }
        return;
    }

    println!("\n✅ All topics valid!");
}
