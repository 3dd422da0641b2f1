//! Derives a post's slug and canonical URL, and maps request paths back onto
//! canonical URLs. A post stored at `posts/2019/01/hello-world.md` and dated
//! `2019-01-05` lives at `/posts/2019/01/hello-world`.

use crate::date::PostDate;
use std::fmt;
use std::path::{Path, PathBuf};

/// The path prefix shared by every canonical post URL.
pub const POSTS_PREFIX: &str = "/posts/";

/// Returns the file name of `path` with the `extension` suffix removed. The
/// match is exact and case-sensitive; a file name without the suffix is used
/// unmodified.
pub fn slug(path: &Path, extension: &str) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?;
    let slug = file_name.strip_suffix(extension).unwrap_or(file_name);
    if slug.is_empty() {
        return Err(Error::InvalidFileName(path.to_owned()));
    }
    Ok(slug.to_owned())
}

/// Builds `/posts/{YYYY}/{MM}/{slug}`.
pub fn canonical_url(date: &PostDate, slug: &str) -> String {
    format!(
        "{}{}/{}/{}",
        POSTS_PREFIX,
        date.year_segment(),
        date.month_segment(),
        slug
    )
}

/// Maps a lookup query onto the canonical URL it names, or `None` if the
/// query cannot name a post. Accepts the canonical URL itself plus the
/// variants a request path or a relative reference produce: a missing
/// leading `/` or `posts/` prefix and a trailing `/`.
///
/// For every post, `normalize_query(&canonical_url(date, slug))` is the
/// canonical URL itself.
pub fn normalize_query(query: &str) -> Option<String> {
    let query = query.trim().trim_end_matches('/');
    let query = query.trim_start_matches('/');
    let query = query.strip_prefix("posts/").unwrap_or(query);

    let mut segments = query.split('/');
    let (year, month, slug) = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(year), Some(month), Some(slug), None) => (year, month, slug),
        _ => return None,
    };
    if year.len() != 4
        || month.len() != 2
        || !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit())
    {
        return None;
    }

    if slug.is_empty() {
        return None;
    }

    Some(format!("{}{}/{}/{}", POSTS_PREFIX, year, month, slug))
}

/// Represents the result of deriving a post's location.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error deriving a post's location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Returned when a file name isn't valid UTF-8 or leaves an empty slug.
    InvalidFileName(PathBuf),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidFileName(path) => {
                write!(f, "invalid post file name: {:?}", path)
            }
        }
    }
}

impl std::error::Error for Error {}
