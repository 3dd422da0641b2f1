//! Splits a post source file into its header block and body, and parses the
//! header into a [`Header`]. A post file is structured as follows:
//!
//! 1. Opening marker line (`---`)
//! 2. Title line
//! 3. Date line
//! 4. Excerpt line
//! 5. Optional image line
//! 6. Closing marker line (`---`)
//! 7. Post body
//!
//! For example:
//!
//! ```md
//! ---
//! Title: Hello
//! Date: 2019-01-05
//! Excerpt: Test post
//! Image: hello.jpg
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! Header lines are positional: the key names are for the author's benefit
//! and are not checked. The value is everything after the field separator.

use std::fmt;

/// The delimiters of the header block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderFormat {
    /// The line that opens and closes the header block.
    pub marker: String,

    /// Separates a header line's key from its value.
    pub separator: String,
}

impl Default for HeaderFormat {
    fn default() -> Self {
        HeaderFormat {
            marker: String::from("---"),
            separator: String::from(": "),
        }
    }
}

/// The metadata parsed from a header block. The date is left raw; see
/// [`crate::date::PostDate::parse`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub title: String,
    pub date: String,
    pub excerpt: String,

    /// `None` when the header has no image line or the line has no value.
    pub image: Option<String>,
}

/// A parsed header and the body slice that follows it.
#[derive(Debug, PartialEq, Eq)]
pub struct Parsed<'a> {
    pub header: Header,
    pub body: &'a str,
}

/// Splits `input` into header and body and parses the header. Never panics
/// on malformed input; every problem is reported as an [`Error`].
pub fn parse<'a>(input: &'a [u8], format: &HeaderFormat) -> Result<Parsed<'a>> {
    let input = std::str::from_utf8(input).map_err(|_| Error::InvalidUtf8)?;
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let mut lines = input.split_inclusive('\n');
    let mut offset = match lines.next() {
        Some(line) if is_marker(line, &format.marker) => line.len(),
        _ => return Err(Error::MissingOpeningMarker),
    };

    let mut header_lines = Vec::new();
    loop {
        let line = lines.next().ok_or(Error::MissingClosingMarker)?;
        offset += line.len();
        if is_marker(line, &format.marker) {
            break;
        }
        header_lines.push(line.trim_end());
    }
    while header_lines.last() == Some(&"") {
        header_lines.pop();
    }

    Ok(Parsed {
        header: parse_fields(&header_lines, &format.separator)?,
        body: &input[offset..],
    })
}

fn is_marker(line: &str, marker: &str) -> bool {
    line.trim_end() == marker
}

fn parse_fields(lines: &[&str], separator: &str) -> Result<Header> {
    if lines.len() > Field::ALL.len() {
        return Err(Error::UnexpectedLine {
            line: line_number(Field::ALL.len()),
        });
    }

    let mut values = [""; 4];
    for (i, field) in Field::ALL.iter().enumerate() {
        match lines.get(i) {
            Some(line) => values[i] = field_value(line, *field, i, separator)?,
            None if *field == Field::Image => {}
            None => return Err(Error::MissingField(*field)),
        }
        if values[i].is_empty() && *field != Field::Image {
            return Err(Error::EmptyField(*field));
        }
    }

    let [title, date, excerpt, image] = values;
    Ok(Header {
        title: title.to_owned(),
        date: date.to_owned(),
        excerpt: excerpt.to_owned(),
        image: match image {
            "" => None,
            image => Some(image.to_owned()),
        },
    })
}

fn field_value<'a>(
    line: &'a str,
    field: Field,
    index: usize,
    separator: &str,
) -> Result<&'a str> {
    match line.split_once(separator) {
        Some((_, value)) if value.contains(separator) => {
            Err(Error::SeparatorInValue {
                field,
                line: line_number(index),
            })
        }
        Some((_, value)) => Ok(value.trim()),
        // editors strip trailing whitespace, so `Image:` is an empty value
        None if !separator.trim_end().is_empty()
            && line.ends_with(separator.trim_end()) =>
        {
            Ok("")
        }
        None => Err(Error::MissingSeparator {
            field,
            line: line_number(index),
        }),
    }
}

// Header line `index` is on file line `index + 2` (1-based, after the opening
// marker).
fn line_number(index: usize) -> usize {
    index + 2
}

/// A positional header field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Title,
    Date,
    Excerpt,
    Image,
}

impl Field {
    const ALL: [Field; 4] = [Field::Title, Field::Date, Field::Excerpt, Field::Image];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Field::Title => "title",
            Field::Date => "date",
            Field::Excerpt => "excerpt",
            Field::Image => "image",
        })
    }
}

/// Represents the result of a header parse.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a post header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Returned when the file isn't valid UTF-8.
    InvalidUtf8,

    /// Returned when the file doesn't begin with the marker line.
    MissingOpeningMarker,

    /// Returned when the opening marker was found but the closing one was
    /// missing.
    MissingClosingMarker,

    /// Returned when the header ends before a required field.
    MissingField(Field),

    /// Returned when a required field's value is empty.
    EmptyField(Field),

    /// Returned when a header line has no separator.
    MissingSeparator { field: Field, line: usize },

    /// Returned when a value contains the separator. There is no escaping
    /// convention, so these are rejected rather than guessed at.
    SeparatorInValue { field: Field, line: usize },

    /// Returned when the header has more lines than fields.
    UnexpectedLine { line: usize },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidUtf8 => write!(f, "post is not valid UTF-8"),
            Error::MissingOpeningMarker => {
                write!(f, "post must begin with a header marker line")
            }
            Error::MissingClosingMarker => {
                write!(f, "missing closing header marker line")
            }
            Error::MissingField(field) => {
                write!(f, "header is missing the {} line", field)
            }
            Error::EmptyField(field) => write!(f, "header {} is empty", field),
            Error::MissingSeparator { field, line } => write!(
                f,
                "line {}: header {} has no key/value separator",
                line, field
            ),
            Error::SeparatorInValue { field, line } => write!(
                f,
                "line {}: header {} value contains the key/value separator",
                line, field
            ),
            Error::UnexpectedLine { line } => {
                write!(f, "line {}: unexpected header line", line)
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    fn parse_str(input: &str) -> Result<Parsed> {
        parse(input.as_bytes(), &HeaderFormat::default())
    }

    #[test]
    fn test_parse_without_image() -> Result<()> {
        let parsed = parse_str(
            "---\nTitle: Hello\nDate: 2019-01-05\nExcerpt: Test post\n---\n# Hello\n",
        )?;
        assert_eq!(
            Header {
                title: String::from("Hello"),
                date: String::from("2019-01-05"),
                excerpt: String::from("Test post"),
                image: None,
            },
            parsed.header
        );
        assert_eq!("# Hello\n", parsed.body);
        Ok(())
    }

    #[test]
    fn test_parse_with_image() -> Result<()> {
        let parsed = parse_str(
            "---\nTitle: Hello\nDate: 2019-01-05\nExcerpt: Test post\nImage: hello.jpg\n---\nbody",
        )?;
        assert_eq!(Some(String::from("hello.jpg")), parsed.header.image);
        assert_eq!("body", parsed.body);
        Ok(())
    }

    #[test]
    fn test_empty_image_is_none() -> Result<()> {
        for image_line in &["Image: ", "Image:"] {
            let input = format!(
                "---\nTitle: Hello\nDate: 2019-01-05\nExcerpt: Test post\n{}\n---\n",
                image_line
            );
            assert_eq!(None, parse_str(&input)?.header.image);
        }
        Ok(())
    }

    #[test]
    fn test_trailing_blank_header_lines_ignored() -> Result<()> {
        let parsed = parse_str(
            "---\nTitle: Hello\nDate: 2019-01-05\nExcerpt: Test post\n\n  \n---\nbody",
        )?;
        assert_eq!("Test post", parsed.header.excerpt);
        assert_eq!(None, parsed.header.image);

        let parsed = parse_str(
            "---\nTitle: Hello\nDate: 2019-01-05\nExcerpt: Test post\nImage: a.jpg\n\n---\nbody",
        )?;
        assert_eq!(Some(String::from("a.jpg")), parsed.header.image);
        Ok(())
    }

    #[test]
    fn test_body_keeps_later_markers() -> Result<()> {
        let parsed = parse_str(
            "---\nTitle: Hello\nDate: 2019-01-05\nExcerpt: Test post\n---\nabove\n---\nbelow\n",
        )?;
        assert_eq!("above\n---\nbelow\n", parsed.body);
        Ok(())
    }

    #[test]
    fn test_crlf_and_bom() -> Result<()> {
        let parsed = parse_str(
            "\u{feff}---\r\nTitle: Hello\r\nDate: 2019-01-05\r\nExcerpt: Test post\r\n---\r\nbody",
        )?;
        assert_eq!("Hello", parsed.header.title);
        assert_eq!("2019-01-05", parsed.header.date);
        assert_eq!("body", parsed.body);
        Ok(())
    }

    #[test]
    fn test_custom_format() -> Result<()> {
        let format = HeaderFormat {
            marker: String::from("+++"),
            separator: String::from(" = "),
        };
        let parsed = parse(
            b"+++\ntitle = Hello\ndate = 2019-01-05\nexcerpt = Test post\n+++\nbody",
            &format,
        )?;
        assert_eq!("Test post", parsed.header.excerpt);
        Ok(())
    }

    #[test]
    fn test_missing_opening_marker() {
        assert_eq!(
            Err(Error::MissingOpeningMarker),
            parse_str("Title: Hello\nDate: 2019-01-05\nExcerpt: Test\n---\nbody")
        );
        assert_eq!(Err(Error::MissingOpeningMarker), parse_str(""));
    }

    #[test]
    fn test_missing_closing_marker() {
        assert_eq!(
            Err(Error::MissingClosingMarker),
            parse_str("---\nTitle: Hello\nDate: 2019-01-05\nExcerpt: Test post\nbody")
        );
        assert_eq!(Err(Error::MissingClosingMarker), parse_str("---"));
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(
            Err(Error::MissingField(Field::Excerpt)),
            parse_str("---\nTitle: Hello\nDate: 2019-01-05\n---\nbody")
        );
        assert_eq!(
            Err(Error::MissingField(Field::Title)),
            parse_str("---\n---\nbody")
        );
    }

    #[test]
    fn test_empty_required_field() {
        assert_eq!(
            Err(Error::EmptyField(Field::Title)),
            parse_str("---\nTitle:\nDate: 2019-01-05\nExcerpt: Test post\n---\n")
        );
    }

    #[test]
    fn test_missing_separator() {
        assert_eq!(
            Err(Error::MissingSeparator {
                field: Field::Date,
                line: 3
            }),
            parse_str("---\nTitle: Hello\nDate 2019-01-05\nExcerpt: Test post\n---\n")
        );
    }

    #[test]
    fn test_separator_in_value() {
        assert_eq!(
            Err(Error::SeparatorInValue {
                field: Field::Title,
                line: 2
            }),
            parse_str("---\nTitle: Rust: a review\nDate: 2019-01-05\nExcerpt: Test\n---\n")
        );
    }

    #[test]
    fn test_too_many_lines() {
        assert_eq!(
            Err(Error::UnexpectedLine { line: 6 }),
            parse_str(
                "---\nTitle: Hello\nDate: 2019-01-05\nExcerpt: Test\nImage: a.jpg\nand more\n---\n"
            )
        );
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(
            Err(Error::InvalidUtf8),
            parse(b"---\nTitle: \xff\n---\n", &HeaderFormat::default())
        );
    }
}
