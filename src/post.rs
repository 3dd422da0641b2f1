//! Defines the [`Post`] type and the logic for parsing one post source file
//! into memory: [`crate::header`] splits and parses the header,
//! [`crate::date`] normalizes its date, and [`crate::locator`] derives the
//! post's URL.

use crate::date::{self, PostDate};
use crate::fs::Filesystem;
use crate::header::{self, HeaderFormat};
use crate::locator;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// A single parsed post. Posts are never mutated after parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    /// The path of the source file. Unique within a catalog.
    pub source_path: PathBuf,

    pub title: String,

    /// The date exactly as written in the header.
    pub raw_date: String,

    pub date: PostDate,

    pub excerpt: String,

    /// The post's image, relative to the site's image directory.
    pub image: Option<String>,

    /// The source file name less the post extension.
    pub slug: String,

    /// The canonical URL, `/posts/{YYYY}/{MM}/{slug}`.
    pub url: String,

    /// The markdown following the header. See [`crate::markdown::to_html`].
    pub body: String,
}

/// How post source files are recognized and split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostFormat {
    /// The post-file extension suffix, removed to form the slug.
    pub extension: String,

    pub header: HeaderFormat,
}

impl Default for PostFormat {
    fn default() -> Self {
        PostFormat {
            extension: String::from(".md"),
            header: HeaderFormat::default(),
        }
    }
}

impl Post {
    /// Reads and parses the post at `path`.
    pub fn load<F: Filesystem + ?Sized>(
        fs: &F,
        path: &Path,
        format: &PostFormat,
    ) -> Result<Post> {
        let contents = fs.read(path).map_err(Error::Read)?;
        Post::parse(path, &contents, format)
    }

    /// Parses a post from the contents of its source file. The header date is
    /// authoritative; the year and month directories the file sits in are not
    /// consulted.
    pub fn parse(path: &Path, contents: &[u8], format: &PostFormat) -> Result<Post> {
        let parsed = header::parse(contents, &format.header)?;
        let date = PostDate::parse(&parsed.header.date)?;
        let slug = locator::slug(path, &format.extension)?;
        Ok(Post {
            source_path: path.to_owned(),
            url: locator::canonical_url(&date, &slug),
            title: parsed.header.title,
            raw_date: parsed.header.date,
            date,
            excerpt: parsed.header.excerpt,
            image: parsed.header.image,
            slug,
            body: parsed.body.to_owned(),
        })
    }
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when the source file can't be read.
    Read(io::Error),

    /// Returned when the header block is malformed.
    Header(header::Error),

    /// Returned when the header date can't be normalized.
    Date(date::Error),

    /// Returned when no slug can be derived from the file name.
    Location(locator::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read(err) => write!(f, "reading post: {}", err),
            Error::Header(err) => err.fmt(f),
            Error::Date(err) => err.fmt(f),
            Error::Location(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read(err) => Some(err),
            Error::Header(err) => Some(err),
            Error::Date(err) => Some(err),
            Error::Location(err) => Some(err),
        }
    }
}

impl From<header::Error> for Error {
    /// Converts a [`header::Error`] into an [`Error`]. It allows us to use the
    /// `?` operator when parsing headers.
    fn from(err: header::Error) -> Error {
        Error::Header(err)
    }
}

impl From<date::Error> for Error {
    /// Converts a [`date::Error`] into an [`Error`].
    fn from(err: date::Error) -> Error {
        Error::Date(err)
    }
}

impl From<locator::Error> for Error {
    fn from(err: locator::Error) -> Error {
        Error::Location(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fs::MemFs;

    const HELLO: &str =
        "---\nTitle: Hello\nDate: 2019-01-05\nExcerpt: Test post\n---\n# Hello\n";

    #[test]
    fn test_parse_post() -> Result<()> {
        let path = Path::new("posts/2019/01/hello-world.md");
        let post = Post::parse(path, HELLO.as_bytes(), &PostFormat::default())?;
        assert_eq!(
            Post {
                source_path: PathBuf::from("posts/2019/01/hello-world.md"),
                title: String::from("Hello"),
                raw_date: String::from("2019-01-05"),
                date: PostDate {
                    year: 2019,
                    month: 1,
                    day: 5
                },
                excerpt: String::from("Test post"),
                image: None,
                slug: String::from("hello-world"),
                url: String::from("/posts/2019/01/hello-world"),
                body: String::from("# Hello\n"),
            },
            post
        );
        Ok(())
    }

    #[test]
    fn test_header_date_is_authoritative() -> Result<()> {
        let path = Path::new("posts/2018/12/hello-world.md");
        let post = Post::parse(path, HELLO.as_bytes(), &PostFormat::default())?;
        assert_eq!("/posts/2019/01/hello-world", post.url);
        Ok(())
    }

    #[test]
    fn test_parse_post_bad_date() {
        let input = "---\nTitle: Hello\nDate: 2019/01/05\nExcerpt: Test post\n---\n";
        assert!(matches!(
            Post::parse(
                Path::new("posts/2019/01/a.md"),
                input.as_bytes(),
                &PostFormat::default()
            ),
            Err(Error::Date(_))
        ));
    }

    #[test]
    fn test_load_unreadable() {
        let fs = MemFs::new()
            .file("posts/2019/01/a.md", HELLO)
            .unreadable("posts/2019/01/a.md");
        assert!(matches!(
            Post::load(&fs, Path::new("posts/2019/01/a.md"), &PostFormat::default()),
            Err(Error::Read(_))
        ));
    }
}
