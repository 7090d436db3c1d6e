//! Command-line argument definitions using clap

use clap::{ArgGroup, Parser};
use std::fs;
use std::path::PathBuf;

use crate::api::Portal;
use crate::envelope::{EnvelopeCodes, Status, Visibility, DEFAULT_CATEGORY};
use crate::label::{DEFAULT_PUBLICATION, DEFAULT_TITLE};
use crate::select::Selection;

/// Publish computations to CSI portal
#[derive(Parser, Debug)]
#[command(name = "csx2portal")]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("selection")
        .args(["csx_lasthere", "csx_files", "csx_within"])
        .multiple(false)
))]
pub struct Cli {
    /// Upload the most recent CSX in the current directory.
    /// This is the default when no other --csx-* argument is given.
    #[arg(long)]
    pub csx_lasthere: bool,

    /// CSX file(s) to upload, as file names, shell-expanded wildcards or
    /// quoted glob strings, e.g. --csx-files job1.csx proj/* 'proj2/*/*'
    #[arg(long, num_args = 1.., value_name = "FILE-or-STRING")]
    pub csx_files: Option<Vec<String>>,

    /// Directory within which to recursively seek CSX files to upload
    #[arg(long, value_name = "DIR", value_parser = readable_dir)]
    pub csx_within: Option<PathBuf>,

    /// Portal username (default: current OS user)
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,

    /// Portal on which to publish
    #[arg(long, value_enum, default_value_t = Portal::Cloud)]
    pub portal: Portal,

    /// Publication label template. Same placeholders as --title, e.g.
    /// 'water from {host} on {uploaddatetime}' puts every file in one
    /// publication, 'neverendingproject {num}' gives each its own.
    #[arg(long, default_value = DEFAULT_PUBLICATION)]
    pub publication: String,

    /// Nickname for the data computer (default: hostname up to the first dot)
    #[arg(long, value_name = "STRING")]
    pub host: Option<String>,

    /// Record title template. Placeholders: {host}, {user}, {job},
    /// {pathfromhome}, {filemoddatetime}, {uploaddatetime}, {num}.
    /// Use {{ and }} for literal braces.
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Numeric category code sent with every record
    #[arg(long, value_name = "CODE", default_value_t = DEFAULT_CATEGORY)]
    pub category: u32,

    /// Review status sent with every record
    #[arg(long, value_enum, default_value_t = Status::Preliminary)]
    pub status: Status,

    /// Visibility sent with every record
    #[arg(long, value_enum, default_value_t = Visibility::Public)]
    pub visibility: Visibility,

    /// Show what would be uploaded, then stop before asking for a password
    #[arg(long, default_value = "false")]
    pub dry_run: bool,
}

impl Cli {
    /// Which selection mode the flags ask for.
    pub fn selection(&self) -> Selection {
        if let Some(files) = &self.csx_files {
            Selection::Files(files.clone())
        } else if let Some(dir) = &self.csx_within {
            Selection::Within(dir.clone())
        } else {
            Selection::LastHere
        }
    }

    /// Portal user name, falling back to the OS user.
    pub fn user_name(&self) -> String {
        self.user.clone().unwrap_or_else(whoami::username)
    }

    /// Host nickname, falling back to the short hostname.
    pub fn host_nickname(&self) -> String {
        self.host.clone().unwrap_or_else(|| {
            whoami::fallible::hostname()
                .map(|h| short_hostname(&h))
                .unwrap_or_else(|_| "localhost".to_string())
        })
    }

    pub fn codes(&self) -> EnvelopeCodes {
        EnvelopeCodes {
            category: self.category,
            status: self.status,
            visibility: self.visibility,
        }
    }
}

/// Hostname up to the first dot.
pub fn short_hostname(hostname: &str) -> String {
    hostname.split('.').next().unwrap_or(hostname).to_string()
}

/// Validator for --csx-within: must be an existing, listable directory.
fn readable_dir(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if !path.is_dir() {
        return Err(format!("readable_dir:{} is not a valid path", s));
    }
    fs::read_dir(&path).map_err(|_| format!("readable_dir:{} is not a readable dir", s))?;
    Ok(path)
}
