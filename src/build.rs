//! Exports the [`build_site`] function which stitches together the
//! high-level steps of building the output static site: loading the posts
//! ([`crate::post`]), aggregating cross-post state ([`crate::aggregate`]),
//! and rendering every output page ([`crate::write`]).

use std::fmt;

use tera::Tera;

use crate::aggregate::{aggregate, Error as AggregateError};
use crate::config::Project;
use crate::filters;
use crate::post::{load_posts, Error as LoadError};
use crate::write::{Error as WriteError, Writer};

/// Builds the site from a resolved [`Project`]. This calls into
/// [`load_posts`], [`aggregate`], and [`Writer::write_site`] which do the
/// heavy-lifting; this function wires them together in order: load, then
/// aggregate exactly once, then render from the immutable result.
pub fn build_site(project: &Project) -> Result<()> {
    let posts = load_posts(&project.posts_directory)?;
    let aggregate = aggregate(posts, &project.site)?;

    let mut tera = Tera::new(
        &format!("{}/**/*", project.templates_directory.display()),
    )?;
    // Post bodies are already HTML; templates embed them verbatim.
    tera.autoescape_on(Vec::new());
    filters::register(&mut tera);

    Writer::new(project, &aggregate, tera).write_site()?;
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during post loading,
/// aggregation, template parsing, and rendering/writing.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading posts, including collected
    /// required-header validation failures
    /// ([`crate::post::Error::Invalid`]).
    Load(LoadError),

    /// Returned for errors aggregating cross-post state.
    Aggregate(AggregateError),

    /// Returned for errors parsing the template directory.
    Template(tera::Error),

    /// Returned for errors writing pages to disk.
    Write(WriteError),
}

impl Error {
    /// True when the error is a collected set of post-validation
    /// failures, whose [`fmt::Display`] is one diagnostic per line.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Load(LoadError::Invalid(_)))
    }
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Load(err) => err.fmt(f),
            Error::Aggregate(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Load(err) => Some(err),
            Error::Aggregate(err) => Some(err),
            Error::Template(err) => Some(err),
            Error::Write(err) => Some(err),
        }
    }
}

impl From<LoadError> for Error {
    /// Converts [`LoadError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: LoadError) -> Error {
        Error::Load(err)
    }
}

impl From<AggregateError> for Error {
    /// Converts [`AggregateError`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: AggregateError) -> Error {
        Error::Aggregate(err)
    }
}

impl From<tera::Error> for Error {
    /// Converts [`tera::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: tera::Error) -> Error {
        Error::Template(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
