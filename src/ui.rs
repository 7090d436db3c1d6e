// UI layer: drives one run from the terminal. Prints the record table,
// asks for the password with `dialoguer` and walks the records through the
// portal client with an `indicatif` spinner.

use crate::api::{Portal, PortalClient};
use crate::cli::Cli;
use crate::envelope::{Envelope, EnvelopeCodes};
use crate::label::{Labeler, UploadRecord};
use crate::select::select_files;
use anyhow::{Context, Result};
use chrono::Local;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// How a run of uploads went.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub published: usize,
    pub failed: usize,
}

/// Select, label and upload according to the parsed command line.
pub fn run(cli: &Cli) -> Result<()> {
    let user = cli.user_name();
    let labeler = Labeler {
        host: cli.host_nickname(),
        user: user.clone(),
        home: resolve_home(dirs::home_dir()),
        upload_time: Local::now(),
        title_template: cli.title.clone(),
        publication_template: cli.publication.clone(),
    };
    labeler.validate()?;

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let files = match select_files(&cli.selection(), &cwd, labeler.home.as_deref()) {
        Ok(files) => files,
        Err(e) => {
            // Nothing to do is not a failure.
            println!("{}", e);
            return Ok(());
        }
    };

    let records = labeler.label_files(&files)?;
    print_summary(&records);

    if cli.dry_run {
        println!("Dry run: nothing uploaded.");
        return Ok(());
    }

    let password = prompt_password(&user, cli.portal)?;
    let client = PortalClient::for_portal(cli.portal).context("Failed to build HTTP client")?;
    let summary = upload_all(&client, &records, &user, &password, cli.codes());

    println!(
        "{} of {} file(s) published, {} failed.",
        summary.published,
        records.len(),
        summary.failed
    );
    Ok(())
}

/// Home directory with symlinks resolved, matching the canonical paths the
/// selector returns.
pub fn resolve_home(home: Option<PathBuf>) -> Option<PathBuf> {
    home.map(|h| fs::canonicalize(&h).unwrap_or(h))
}

/// Table of publication, title and file for every record.
pub fn format_summary(records: &[UploadRecord]) -> String {
    let files: Vec<String> = records.iter().map(|r| r.path.display().to_string()).collect();
    let fw = files.iter().map(String::len).max().unwrap_or(0);
    let tw = records.iter().map(|r| r.title.len()).max().unwrap_or(0);
    let pw = records.iter().map(|r| r.publication.len()).max().unwrap_or(0);

    let mut out = String::new();
    out.push_str(&"=".repeat(80));
    out.push('\n');
    for (record, file) in records.iter().zip(&files) {
        out.push_str(&format!(
            "{:pw$}   {:tw$}   {:fw$}\n",
            record.publication, record.title, file
        ));
    }
    out.push_str(&"-".repeat(80));
    out.push('\n');
    out.push_str(&format!("{:pw$}   {:tw$}   {:fw$}\n", "Publication", "QC Record", "File"));
    out.push_str(&"=".repeat(80));
    out.push('\n');
    out
}

pub fn print_summary(records: &[UploadRecord]) {
    print!("{}", format_summary(records));
}

/// Explain what is about to happen and read the password without echo.
fn prompt_password(user: &str, portal: Portal) -> Result<String> {
    println!(
        "Supply password to authorize upload to CSI portal {}@{}\n    \
         each [File] above to its individual record [QC Record] and attach it\n    \
         to [Publication].\n",
        user, portal
    );
    let password = Password::new()
        .with_prompt("Password")
        .interact()
        .context("Failed to read password")?;
    Ok(password)
}

/// Upload every record in order. A failure is printed and the loop moves on
/// to the next file.
pub fn upload_all(
    client: &PortalClient,
    records: &[UploadRecord],
    user: &str,
    password: &str,
    codes: EnvelopeCodes,
) -> UploadSummary {
    let mut summary = UploadSummary::default();

    for record in records {
        println!("File {} ...", record.path.display());
        match upload_one(client, record, user, password, codes) {
            Ok(body) => {
                println!("  ... CSX published with result:");
                println!("{}", body);
                summary.published += 1;
            }
            Err(e) => {
                warn!(path = %record.path.display(), error = %e, "upload failed");
                println!("  ... upload failed:");
                println!("{:#}", e);
                summary.failed += 1;
            }
        }
    }

    info!(
        published = summary.published,
        failed = summary.failed,
        "upload loop finished"
    );
    summary
}

fn upload_one(
    client: &PortalClient,
    record: &UploadRecord,
    user: &str,
    password: &str,
    codes: EnvelopeCodes,
) -> Result<String> {
    let payload = fs::read(&record.path)
        .with_context(|| format!("Failed to read {}", record.path.display()))?;
    println!("  ... CSX file read in and converted into base64");

    let filename = record
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let envelope = Envelope {
        username: user,
        password,
        friendly_title: &record.title,
        codes,
        filename: &filename,
        payload: &payload,
    };
    let xml = envelope.to_xml()?;
    println!("  ... REST envelope formed");

    // Spinner is shown while the request is in flight.
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Publishing...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = client.publish(xml);
    spinner.finish_and_clear();

    Ok(result?)
}
