//! Loads the site configuration from a `site.yaml` project file and the
//! `theme.yaml` file in the views directory.

use crate::header::HeaderFormat;
use crate::post::PostFormat;
use crate::repository::Settings;
use anyhow::{anyhow, bail, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "site.yaml";

fn default_address() -> String {
    String::from("127.0.0.1:8080")
}

fn default_posts_dir() -> PathBuf {
    PathBuf::from("posts")
}

fn default_views_dir() -> PathBuf {
    PathBuf::from("views")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_post_extension() -> String {
    String::from(".md")
}

fn default_header_marker() -> String {
    String::from("---")
}

fn default_field_separator() -> String {
    String::from(": ")
}

#[derive(Deserialize)]
struct Project {
    #[serde(default)]
    title: String,

    #[serde(default)]
    slogan: String,

    #[serde(default)]
    notice: String,

    #[serde(default = "default_address")]
    address: String,

    #[serde(default = "default_posts_dir")]
    posts_dir: PathBuf,

    #[serde(default = "default_views_dir")]
    views_dir: PathBuf,

    #[serde(default = "default_static_dir")]
    static_dir: PathBuf,

    #[serde(default = "default_post_extension")]
    post_extension: String,

    #[serde(default = "default_header_marker")]
    header_marker: String,

    #[serde(default = "default_field_separator")]
    field_separator: String,

    #[serde(default)]
    threads: Option<usize>,
}

/// Lists the template files making up each page. Paths are relative to the
/// views directory; each page's files are concatenated into one template.
#[derive(Deserialize)]
struct Theme {
    home_template: Vec<PathBuf>,
    post_template: Vec<PathBuf>,
    about_template: Vec<PathBuf>,
    cv_template: Vec<PathBuf>,
}

/// Strings shown on every page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SiteInfo {
    pub title: String,
    pub slogan: String,
    pub notice: String,
}

/// The resolved site configuration. All paths are rooted at the directory
/// containing the project file.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: SiteInfo,
    pub address: String,
    pub posts_directory: PathBuf,
    pub static_directory: PathBuf,
    pub home_template: Vec<PathBuf>,
    pub post_template: Vec<PathBuf>,
    pub about_template: Vec<PathBuf>,
    pub cv_template: Vec<PathBuf>,
    pub post_format: PostFormat,
    pub threads: usize,
}

impl Config {
    /// Searches `dir` and its ancestors for a project file and loads the
    /// first one found.
    pub fn from_directory(dir: &Path, threads: Option<usize>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, threads)
                .map_err(|e| anyhow!("Loading configuration: {:#}", e))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, threads),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads a project file. `threads`, when given, overrides the project's
    /// `threads` setting.
    pub fn from_project_file(path: &Path, threads: Option<usize>) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = match path.parent() {
            None => bail!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            ),
            Some(project_root) => project_root,
        };

        if project.header_marker.trim().is_empty() {
            bail!("`header_marker` must not be blank");
        }
        if project.field_separator.trim().is_empty() {
            bail!("`field_separator` must contain a non-whitespace character");
        }

        let views_dir = project_root.join(&project.views_dir);
        let theme: Theme = serde_yaml::from_reader(open(&views_dir.join("theme.yaml"), "theme")?)?;
        let in_views = |files: Vec<PathBuf>| -> Vec<PathBuf> {
            files.iter().map(|relpath| views_dir.join(relpath)).collect()
        };

        Ok(Config {
            site: SiteInfo {
                title: project.title,
                slogan: project.slogan,
                notice: project.notice,
            },
            address: project.address,
            posts_directory: project_root.join(&project.posts_dir),
            static_directory: project_root.join(&project.static_dir),
            home_template: in_views(theme.home_template),
            post_template: in_views(theme.post_template),
            about_template: in_views(theme.about_template),
            cv_template: in_views(theme.cv_template),
            post_format: PostFormat {
                extension: project.post_extension,
                header: HeaderFormat {
                    // header lines are compared with trailing whitespace removed
                    marker: project.header_marker.trim().to_owned(),
                    separator: project.field_separator,
                },
            },
            threads: match threads.or(project.threads) {
                None => num_cpus::get(),
                Some(threads) => threads,
            },
        })
    }

    /// The repository settings derived from this configuration.
    pub fn repository_settings(&self) -> Settings {
        Settings {
            root: self.posts_directory.clone(),
            format: self.post_format.clone(),
            threads: self.threads,
        }
    }
}

fn open(path: &Path, kind: &str) -> Result<File> {
    match File::open(path) {
        Err(e) => Err(anyhow!("Opening {} file `{}`: {}", kind, path.display(), e)),
        Ok(file) => Ok(file),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const THEME: &str = "home_template: [base.html, home.html]
post_template: [base.html, post.html]
about_template: [base.html, about.html]
cv_template: [base.html, cv.html]
";

    fn project(yaml: &str) -> Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(PROJECT_FILE), yaml)?;
        std::fs::create_dir(dir.path().join("views"))?;
        std::fs::write(dir.path().join("views/theme.yaml"), THEME)?;
        Ok(dir)
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let dir = project("title: My Site\n")?;
        let config = Config::from_project_file(&dir.path().join(PROJECT_FILE), Some(3))?;
        assert_eq!("My Site", config.site.title);
        assert_eq!("", config.site.slogan);
        assert_eq!("127.0.0.1:8080", config.address);
        assert_eq!(dir.path().join("posts"), config.posts_directory);
        assert_eq!(dir.path().join("static"), config.static_directory);
        assert_eq!(
            vec![dir.path().join("views/base.html"), dir.path().join("views/home.html")],
            config.home_template
        );
        assert_eq!(PostFormat::default(), config.post_format);
        assert_eq!(3, config.threads);
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<()> {
        let dir = project(
            "posts_dir: content
post_extension: .markdown
header_marker: '+++'
field_separator: ' = '
threads: 2
",
        )?;
        let config = Config::from_project_file(&dir.path().join(PROJECT_FILE), None)?;
        let settings = config.repository_settings();
        assert_eq!(dir.path().join("content"), settings.root);
        assert_eq!(".markdown", settings.format.extension);
        assert_eq!("+++", settings.format.header.marker);
        assert_eq!(" = ", settings.format.header.separator);
        assert_eq!(2, settings.threads);
        Ok(())
    }

    #[test]
    fn test_marker_whitespace_trimmed() -> Result<()> {
        let dir = project("header_marker: '--- '\n")?;
        let config = Config::from_project_file(&dir.path().join(PROJECT_FILE), None)?;
        assert_eq!("---", config.post_format.header.marker);

        let parsed = crate::header::parse(
            b"---\nTitle: A\nDate: 2019-01-01\nExcerpt: B\n---\n",
            &config.post_format.header,
        )?;
        assert_eq!("A", parsed.header.title);
        Ok(())
    }

    #[test]
    fn test_blank_separator_rejected() -> Result<()> {
        let dir = project("field_separator: ' '\n")?;
        assert!(Config::from_project_file(&dir.path().join(PROJECT_FILE), None).is_err());
        Ok(())
    }

    #[test]
    fn test_from_directory_searches_ancestors() -> Result<()> {
        let dir = project("title: Found\n")?;
        let nested = dir.path().join("posts/2019");
        std::fs::create_dir_all(&nested)?;
        assert_eq!("Found", Config::from_directory(&nested, Some(1))?.site.title);
        Ok(())
    }
}
