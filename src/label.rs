// Label formatting: derives the per-file template context and renders the
// title and publication templates into upload records.

use crate::select::sort_paths;
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default `--title` template.
pub const DEFAULT_TITLE: &str = "{host}__{pathfromhome}__{job}";
/// Default `--publication` template.
pub const DEFAULT_PUBLICATION: &str = "{pathfromhome}";
/// Format used for both `filemoddatetime` and `uploaddatetime`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Placeholder names accepted in templates, in the order they are documented.
pub const PLACEHOLDERS: [&str; 7] = [
    "host",
    "user",
    "job",
    "pathfromhome",
    "filemoddatetime",
    "uploaddatetime",
    "num",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{0}}}' (expected one of: host, user, job, pathfromhome, filemoddatetime, uploaddatetime, num)")]
    UnknownPlaceholder(String),
    #[error("unclosed '{{' at byte {0}")]
    UnclosedBrace(usize),
    #[error("single '}}' at byte {0}; write '}}}}' for a literal brace")]
    StrayBrace(usize),
}

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("invalid template \"{template}\": {source}")]
    Template {
        template: String,
        #[source]
        source: TemplateError,
    },
    #[error("cannot read modification time of {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Values available to a template for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    pub host: String,
    pub user: String,
    pub pathfromhome: String,
    pub filemoddatetime: String,
    pub uploaddatetime: String,
    pub job: String,
    pub num: usize,
}

impl TemplateContext {
    fn lookup(&self, name: &str) -> Option<String> {
        let value = match name {
            "host" => self.host.clone(),
            "user" => self.user.clone(),
            "pathfromhome" => self.pathfromhome.clone(),
            "filemoddatetime" => self.filemoddatetime.clone(),
            "uploaddatetime" => self.uploaddatetime.clone(),
            "job" => self.job.clone(),
            "num" => self.num.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// Substitute `{name}` placeholders. `{{` and `}}` produce literal braces.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let start = i + 1;
                let end = template[start..]
                    .find('}')
                    .map(|off| start + off)
                    .ok_or(TemplateError::UnclosedBrace(i))?;
                let name = &template[start..end];
                let value = ctx
                    .lookup(name)
                    .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
                out.push_str(&value);
                while chars.peek().is_some_and(|(j, _)| *j <= end) {
                    chars.next();
                }
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(TemplateError::StrayBrace(i)),
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// A file with its rendered labels, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub path: PathBuf,
    pub title: String,
    pub publication: String,
}

/// Run-wide inputs to label rendering.
#[derive(Debug, Clone)]
pub struct Labeler {
    pub host: String,
    pub user: String,
    pub home: Option<PathBuf>,
    pub upload_time: DateTime<Local>,
    pub title_template: String,
    pub publication_template: String,
}

impl Labeler {
    /// Check both templates against a dummy context so a typo is reported
    /// before any file is touched.
    pub fn validate(&self) -> Result<(), LabelError> {
        let blank = TemplateContext {
            host: String::new(),
            user: String::new(),
            pathfromhome: String::new(),
            filemoddatetime: String::new(),
            uploaddatetime: String::new(),
            job: String::new(),
            num: 0,
        };
        for template in [&self.title_template, &self.publication_template] {
            render(template, &blank).map_err(|source| LabelError::Template {
                template: template.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Build the context for `path` given its modification time and index.
    pub fn context(&self, path: &Path, modified: DateTime<Local>, num: usize) -> TemplateContext {
        TemplateContext {
            host: self.host.clone(),
            user: self.user.clone(),
            pathfromhome: path_from_home(path, self.home.as_deref()),
            filemoddatetime: modified.format(TIMESTAMP_FORMAT).to_string(),
            uploaddatetime: self.upload_time.format(TIMESTAMP_FORMAT).to_string(),
            job: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            num,
        }
    }

    /// Render one record.
    pub fn record(
        &self,
        path: &Path,
        modified: DateTime<Local>,
        num: usize,
    ) -> Result<UploadRecord, LabelError> {
        let ctx = self.context(path, modified, num);
        let render_with = |template: &String| {
            render(template, &ctx).map_err(|source| LabelError::Template {
                template: template.clone(),
                source,
            })
        };
        Ok(UploadRecord {
            path: path.to_path_buf(),
            title: render_with(&self.title_template)?,
            publication: render_with(&self.publication_template)?,
        })
    }

    /// Sort `files`, number them from 0 and render a record for each.
    pub fn label_files(&self, files: &[PathBuf]) -> Result<Vec<UploadRecord>, LabelError> {
        let mut sorted = files.to_vec();
        sort_paths(&mut sorted);

        sorted
            .iter()
            .enumerate()
            .map(|(num, path)| {
                let modified = fs::metadata(path)
                    .and_then(|m| m.modified())
                    .map_err(|source| LabelError::Metadata {
                        path: path.clone(),
                        source,
                    })?;
                let record = self.record(path, DateTime::<Local>::from(modified), num)?;
                debug!(num, title = %record.title, publication = %record.publication, "labelled");
                Ok(record)
            })
            .collect()
    }
}

/// Directory of `path` relative to `home`, components joined with `-`.
/// Directories outside the home keep their `..` steps.
pub fn path_from_home(path: &Path, home: Option<&Path>) -> String {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let rel = match home {
        Some(home) => relative_to(dir, home),
        None => dir.to_path_buf(),
    };
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path: Vec<_> = path.components().collect();
    let base: Vec<_> = base.components().collect();
    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for c in &path[common..] {
        rel.push(c.as_os_str());
    }
    rel
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx() -> TemplateContext {
        TemplateContext {
            host: "myMac".into(),
            user: "johndoe".into(),
            pathfromhome: "sandbox-fakefs-proj1".into(),
            filemoddatetime: "2015-06-10T14:22:41".into(),
            uploaddatetime: "2015-06-11T09:00:00".into(),
            job: "dft-psivar".into(),
            num: 0,
        }
    }

    fn labeler(home: &str) -> Labeler {
        Labeler {
            host: "myMac".into(),
            user: "johndoe".into(),
            home: Some(PathBuf::from(home)),
            upload_time: Local.with_ymd_and_hms(2015, 6, 11, 9, 0, 0).unwrap(),
            title_template: DEFAULT_TITLE.into(),
            publication_template: DEFAULT_PUBLICATION.into(),
        }
    }

    #[test]
    fn renders_every_placeholder() {
        let out = render(
            "{host}__{user}__{pathfromhome}__{filemoddatetime}__{job}__{num}",
            &ctx(),
        )
        .unwrap();
        assert_eq!(
            out,
            "myMac__johndoe__sandbox-fakefs-proj1__2015-06-10T14:22:41__dft-psivar__0"
        );
        assert_eq!(
            render("water from {host} on {uploaddatetime}", &ctx()).unwrap(),
            "water from myMac on 2015-06-11T09:00:00"
        );
    }

    #[test]
    fn doubled_braces_are_literal() {
        assert_eq!(render("{{job}} {job}}}", &ctx()).unwrap(), "{job} dft-psivar}");
        assert_eq!(render("plain", &ctx()).unwrap(), "plain");
    }

    #[test]
    fn bad_templates_are_rejected() {
        assert_eq!(
            render("{jobname}", &ctx()),
            Err(TemplateError::UnknownPlaceholder("jobname".into()))
        );
        assert_eq!(render("ab{host", &ctx()), Err(TemplateError::UnclosedBrace(2)));
        assert_eq!(render("a}b", &ctx()), Err(TemplateError::StrayBrace(1)));
        assert_eq!(
            render("{num:03d}", &ctx()),
            Err(TemplateError::UnknownPlaceholder("num:03d".into()))
        );
    }

    #[test]
    fn path_from_home_joins_components() {
        let home = Path::new("/home/jd");
        assert_eq!(
            path_from_home(Path::new("/home/jd/linux/psi4/proj1/a.csx"), Some(home)),
            "linux-psi4-proj1"
        );
        assert_eq!(path_from_home(Path::new("/home/jd/a.csx"), Some(home)), "");
        assert_eq!(
            path_from_home(Path::new("/scratch/run/a.csx"), Some(home)),
            "..-..-scratch-run"
        );
        assert_eq!(path_from_home(Path::new("/scratch/run/a.csx"), None), "scratch-run");
    }

    #[test]
    fn record_uses_default_templates() {
        let lab = labeler("/home/jd");
        let modified = Local.with_ymd_and_hms(2015, 6, 10, 14, 22, 41).unwrap();
        let rec = lab
            .record(Path::new("/home/jd/sandbox/fakefs/proj1/nu_water_sp2.csx"), modified, 1)
            .unwrap();
        assert_eq!(rec.title, "myMac__sandbox-fakefs-proj1__nu_water_sp2");
        assert_eq!(rec.publication, "sandbox-fakefs-proj1");
    }

    #[test]
    fn rendering_is_repeatable() {
        let lab = labeler("/home/jd");
        let modified = Local.with_ymd_and_hms(2015, 6, 10, 12, 58, 13).unwrap();
        let path = Path::new("/home/jd/p/x.csx");
        assert_eq!(
            lab.record(path, modified, 3).unwrap(),
            lab.record(path, modified, 3).unwrap()
        );
    }

    #[test]
    fn validate_catches_typos_in_either_template() {
        let mut lab = labeler("/home/jd");
        assert!(lab.validate().is_ok());
        lab.publication_template = "{project}".into();
        assert!(matches!(
            lab.validate(),
            Err(LabelError::Template { source: TemplateError::UnknownPlaceholder(_), .. })
        ));
    }
}
