//! Defines the [`Post`] type and the logic for loading posts from source
//! files into memory. A post source file is a YAML header block, a
//! separator line of two or more dashes, and a markdown body:
//!
//! ```md
//! title: Hello, world!
//! date: 2021-04-16
//! tags: [greet]
//! ----
//! # Hello
//!
//! World
//! ```
//!
//! Loading validates the required headers (`title` and `date`), collecting
//! every violation rather than stopping at the first so an author sees all
//! of them in one run. Validation failures are reported as
//! [`Error::Invalid`]; the decision to abort the process belongs to the
//! caller.

use std::{
    ffi::OsStr,
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use url::Url;
use walkdir::WalkDir;

use crate::date::PostDate;
use crate::markdown;
use crate::slug::slugify;

/// One parsed content item: header metadata plus the rendered HTML body.
#[derive(Clone, Debug, Serialize)]
pub struct Post {
    /// The source file the post was loaded from. Not exposed to templates.
    #[serde(skip)]
    pub source_path: PathBuf,

    /// The post's title. Required.
    pub title: String,

    /// The post's publication date. Required.
    pub date: PostDate,

    /// The post's tags, in declaration order. Hidden tags are removed
    /// during aggregation.
    pub tags: Vec<String>,

    /// The URL path segment for the post, either declared in the header or
    /// derived from the title. Manually declared slugs are taken as-is.
    pub slug: String,

    /// The post's language. Absent until aggregation fills in the site
    /// default for posts that don't declare one.
    pub language: Option<String>,

    /// The template the post renders with, overriding the site default.
    #[serde(skip)]
    pub template: Option<String>,

    /// The full author-supplied header mapping, including keys this
    /// generator has no opinion about. Exposed to templates wholesale.
    pub header: Mapping,

    /// The post's body, already converted to HTML.
    pub content: String,

    /// The site-relative URL of the post page: `/YYYY/MM/DD/<slug>/`.
    pub relative_url: String,

    /// The post's absolute URL. Filled in during aggregation by joining
    /// the site base URL with [`Post::relative_url`].
    pub absolute_url: Option<Url>,

    /// Where the post page lands relative to the output root:
    /// `YYYY/MM/DD/<slug>/index.html`.
    #[serde(skip)]
    pub file_path: PathBuf,
}

impl Post {
    /// Looks up a header value by dotted path (`"author.name"` resolves
    /// the `author` key, then `name` within it). Returns `None` when any
    /// segment is missing or the intermediate value isn't a mapping; a
    /// failed lookup is an ordinary condition, not an error.
    pub fn header_get(&self, path: &str) -> Option<&Value> {
        let mut current: Option<&Value> = None;
        for segment in path.split('.') {
            current = Some(match current {
                None => get(&self.header, segment)?,
                Some(Value::Mapping(m)) => {
                    m.get(&Value::String(segment.to_owned()))?
                }
                Some(_) => return None,
            });
        }
        current
    }
}

/// Loads a single [`Post`] from a source file.
pub fn load(source_path: &Path) -> Result<Post> {
    use std::io::Read;
    let mut contents = String::new();
    match File::open(source_path)
        .and_then(|mut f| f.read_to_string(&mut contents))
    {
        Ok(_) => parse(source_path, &contents),
        Err(e) => Err(Error::Annotated(
            format!("loading post `{}`", source_path.display()),
            Box::new(Error::Io(e)),
        )),
    }
}

/// Parses a [`Post`] from the contents of a source file. `source_path`
/// identifies the origin for diagnostics and the validation report.
pub fn parse(source_path: &Path, input: &str) -> Result<Post> {
    match parse_inner(source_path, input) {
        Err(e @ Error::Invalid(_)) => Err(e),
        Err(e) => Err(Error::Annotated(
            format!("parsing post `{}`", source_path.display()),
            Box::new(e),
        )),
        ok => ok,
    }
}

fn parse_inner(source_path: &Path, input: &str) -> Result<Post> {
    let (header_block, body_block) = split_document(input)?;
    let header: Mapping = if header_block.trim().is_empty() {
        Mapping::new()
    } else {
        serde_yaml::from_str(header_block)?
    };

    // Collect *all* violations before failing so authors see every
    // problem with a post in a single run.
    let mut violations = Vec::new();
    let title = match require(source_path, &header, "title", &mut violations)
    {
        Some(value) => match scalar_string(value).filter(|t| !t.is_empty()) {
            Some(title) => title,
            None => {
                violations.push(Violation::new(
                    source_path,
                    "title",
                    "must be a non-empty string",
                ));
                String::new()
            }
        },
        None => String::new(),
    };
    let date = require(source_path, &header, "date", &mut violations)
        .and_then(|value| match scalar_string(value) {
            Some(s) => match s.parse::<PostDate>() {
                Ok(date) => Some(date),
                Err(e) => {
                    violations.push(Violation::new(
                        source_path,
                        "date",
                        &format!("not a valid date: {}", e),
                    ));
                    None
                }
            },
            None => {
                violations.push(Violation::new(
                    source_path,
                    "date",
                    "must be a date scalar",
                ));
                None
            }
        });
    if !violations.is_empty() {
        return Err(Error::Invalid(violations));
    }
    let date = date.unwrap(); // any None pushed a violation above

    let tags = match get(&header, "tags") {
        Some(Value::Sequence(seq)) => {
            seq.iter().filter_map(scalar_string).collect()
        }
        _ => Vec::new(),
    };
    let slug = match get(&header, "slug").and_then(scalar_string) {
        Some(slug) => slug,
        None => slugify(&title),
    };
    let content = markdown::to_html(body_block, &md_exts(&header))?;

    let relative_url = format!(
        "/{:04}/{:02}/{:02}/{}/",
        date.year(),
        date.month(),
        date.day(),
        slug,
    );
    let file_path = PathBuf::from(format!(
        "{:04}/{:02}/{:02}/{}/index.html",
        date.year(),
        date.month(),
        date.day(),
        slug,
    ));

    Ok(Post {
        source_path: source_path.to_owned(),
        title,
        date,
        tags,
        slug,
        language: get(&header, "language").and_then(scalar_string),
        template: get(&header, "template").and_then(scalar_string),
        header,
        content,
        relative_url,
        absolute_url: None,
        file_path,
    })
}

/// Searches `dir` recursively for post source files (extension `.md`,
/// visited in file-name order so date ties stay deterministic) and loads
/// each one. Validation failures from every file are merged into a single
/// [`Error::Invalid`]; any structural failure aborts immediately.
pub fn load_posts(dir: &Path) -> Result<Vec<Post>> {
    let mut posts = Vec::new();
    let mut violations = Vec::new();
    for result in WalkDir::new(dir).sort_by_file_name() {
        let entry = result?;
        if entry.file_type().is_file()
            && entry.path().extension() == Some(OsStr::new("md"))
        {
            match load(entry.path()) {
                Ok(post) => posts.push(post),
                Err(Error::Invalid(mut v)) => violations.append(&mut v),
                Err(e) => return Err(e),
            }
        }
    }
    if !violations.is_empty() {
        return Err(Error::Invalid(violations));
    }
    Ok(posts)
}

/// Splits a source file into its header and body blocks at the first line
/// consisting of two or more dashes and nothing else.
fn split_document(input: &str) -> Result<(&str, &str)> {
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(|c| c == '\n' || c == '\r');
        if trimmed.len() >= 2 && trimmed.bytes().all(|b| b == b'-') {
            return Ok((&input[..offset], &input[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(Error::MissingSeparator)
}

fn get<'a>(header: &'a Mapping, key: &str) -> Option<&'a Value> {
    header.get(&Value::String(key.to_owned()))
}

/// Checks that `field` is present and non-null, recording a [`Violation`]
/// otherwise.
fn require<'a>(
    source_path: &Path,
    header: &'a Mapping,
    field: &'static str,
    violations: &mut Vec<Violation>,
) -> Option<&'a Value> {
    match get(header, field) {
        None => {
            violations.push(Violation::new(source_path, field, "missing"));
            None
        }
        Some(Value::Null) => {
            violations.push(Violation::new(source_path, field, "null"));
            None
        }
        Some(value) => Some(value),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Resolves the `md_exts` header, which accepts either a single name or a
/// list of names.
fn md_exts(header: &Mapping) -> Vec<String> {
    match get(header, "md_exts") {
        Some(Value::Sequence(seq)) => {
            seq.iter().filter_map(scalar_string).collect()
        }
        Some(value) => scalar_string(value).into_iter().collect(),
        None => Vec::new(),
    }
}

/// One required-header validation failure in one post.
#[derive(Debug)]
pub struct Violation {
    /// The source file the violation was found in.
    pub source_path: PathBuf,

    /// The header field that failed validation.
    pub field: &'static str,

    /// Why the field failed validation.
    pub reason: String,
}

impl Violation {
    fn new(source_path: &Path, field: &'static str, reason: &str) -> Self {
        Violation {
            source_path: source_path.to_owned(),
            field,
            reason: reason.to_owned(),
        }
    }
}

impl fmt::Display for Violation {
    /// Displays a [`Violation`] as a one-line diagnostic.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: required header `{}` is {}",
            self.source_path.display(),
            self.field,
            self.reason,
        )
    }
}

/// Represents the result of a [`Post`]-load operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Post`].
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file has no separator line (two or more
    /// dashes on a line of their own) between header and body.
    MissingSeparator,

    /// Returned when one or more required headers are missing or null.
    /// Holds every violation found, across all loaded posts.
    Invalid(Vec<Violation>),

    /// Returned when there was an error parsing the header block as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when the body couldn't be converted to HTML.
    Markdown(markdown::Error),

    /// Returned for I/O errors reading source files.
    Io(std::io::Error),

    /// Returned for errors walking the posts directory.
    WalkDir(walkdir::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingSeparator => {
                write!(f, "Missing `--` separator between header and body")
            }
            Error::Invalid(violations) => {
                for (i, violation) in violations.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    violation.fmt(f)?;
                }
                Ok(())
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::Markdown(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingSeparator => None,
            Error::Invalid(_) => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::Markdown(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for header deserialization.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<markdown::Error> for Error {
    /// Converts a [`markdown::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for body conversion.
    fn from(err: markdown::Error) -> Error {
        Error::Markdown(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator while walking the posts directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
