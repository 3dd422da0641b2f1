//! Renders pages by applying gtmpl templates to template values built from
//! the catalog. Every page's value is a [`Value::Object`] with a `site` field
//! (see [`SiteInfo`]) plus page-specific fields:
//!
//! * home: `posts`, the post summaries in catalog order
//! * post: `item`, the post with its rendered `content`, and `newer`/`older`,
//!   the summaries of the neighboring posts (or nil)

use crate::catalog::Catalog;
use crate::config::{Config, SiteInfo};
use crate::markdown;
use crate::post::Post;
use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// The URL prefix for post images named in post headers.
pub const IMAGE_BASE_URL: &str = "/static/images/";

/// The parsed templates for every page.
pub struct Views {
    site: SiteInfo,
    home: Template,
    post: Template,
    about: Template,
    cv: Template,
}

impl Views {
    /// Loads and parses the templates listed in `config`.
    pub fn load(config: &Config) -> Result<Views> {
        Ok(Views {
            site: config.site.clone(),
            home: parse_template(config.home_template.iter())?,
            post: parse_template(config.post_template.iter())?,
            about: parse_template(config.about_template.iter())?,
            cv: parse_template(config.cv_template.iter())?,
        })
    }

    pub fn home(&self, catalog: &Catalog) -> Result<Vec<u8>> {
        let posts = catalog.posts().iter().map(|p| summarize(p)).collect();
        self.execute(&self.home, vec![("posts", Value::Array(posts))])
    }

    /// Renders a post page. The body is converted from markdown on every call.
    pub fn post(&self, catalog: &Catalog, post: &Post) -> Result<Vec<u8>> {
        let (newer, older) = catalog.neighbors(&post.url);
        let summary_or_nil = |p: Option<&std::sync::Arc<Post>>| match p {
            Some(p) => summarize(p),
            None => Value::Nil,
        };

        let mut item = summary_fields(post);
        item.insert(
            "content".to_owned(),
            Value::String(markdown::to_html(&post.body)),
        );
        self.execute(
            &self.post,
            vec![
                ("item", Value::Object(item)),
                ("newer", summary_or_nil(newer)),
                ("older", summary_or_nil(older)),
            ],
        )
    }

    pub fn about(&self) -> Result<Vec<u8>> {
        self.execute(&self.about, Vec::new())
    }

    pub fn cv(&self) -> Result<Vec<u8>> {
        self.execute(&self.cv, Vec::new())
    }

    fn execute(&self, template: &Template, fields: Vec<(&str, Value)>) -> Result<Vec<u8>> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("site".to_owned(), site_value(&self.site));
        for (key, value) in fields {
            m.insert(key.to_owned(), value);
        }

        let mut output = Vec::new();
        template.execute(&mut output, &Context::from(Value::Object(m))?)?;
        Ok(output)
    }
}

fn site_value(site: &SiteInfo) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), Value::String(site.title.clone()));
    m.insert("slogan".to_owned(), Value::String(site.slogan.clone()));
    m.insert("notice".to_owned(), Value::String(site.notice.clone()));
    Value::Object(m)
}

/// Converts a post into the value used by listings and neighbor links. The
/// body is left out.
fn summarize(post: &Post) -> Value {
    Value::Object(summary_fields(post))
}

fn summary_fields(post: &Post) -> HashMap<String, Value> {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), Value::String(post.title.clone()));
    m.insert("date".to_owned(), Value::String(post.raw_date.clone()));
    m.insert("iso_date".to_owned(), Value::String(post.date.iso8601()));
    m.insert("excerpt".to_owned(), Value::String(post.excerpt.clone()));
    m.insert("url".to_owned(), Value::String(post.url.clone()));
    m.insert(
        "image".to_owned(),
        match &post.image {
            Some(image) => Value::String(format!("{}{}", IMAGE_BASE_URL, image)),
            None => Value::Nil,
        },
    );
    m.insert("background".to_owned(), Value::String(background(post)));
    m
}

/// The CSS `background` value for a post card: the post's image, or a muted
/// color derived from the post URL when it has none. The color is stable
/// across requests and restarts.
fn background(post: &Post) -> String {
    match &post.image {
        Some(image) => format!("url('{}{}')", IMAGE_BASE_URL, image),
        None => {
            // FNV-1a
            let hash = post.url.bytes().fold(0x811c_9dc5_u32, |hash, b| {
                (hash ^ u32::from(b)).wrapping_mul(0x0100_0193)
            });
            format!(
                "rgb({},{},{}); filter: saturate(0.5)",
                hash & 0xff,
                (hash >> 8) & 0xff,
                (hash >> 16) & 0xff
            )
        }
    }
}

// Loads the template files, concatenates their contents, and parses the
// result into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

/// The result of a fallible rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or applying templates.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// An error during templating.
    Template(String),

    /// Returned for other I/O errors.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "Parsing template: {}", err),
            Error::Template(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Template(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}
