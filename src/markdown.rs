//! The markup collaborator: converts post bodies from markdown to HTML
//! with a configurable set of syntax extensions.

use pulldown_cmark::{html, Options, Parser};
use std::fmt;

/// The extensions enabled for every post regardless of its `md_exts`
/// header: tables, footnotes, and strikethrough.
fn base_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

fn resolve(name: &str) -> Result<Options, Error> {
    match name {
        "tables" => Ok(Options::ENABLE_TABLES),
        "footnotes" => Ok(Options::ENABLE_FOOTNOTES),
        "strikethrough" => Ok(Options::ENABLE_STRIKETHROUGH),
        "tasklists" => Ok(Options::ENABLE_TASKLISTS),
        "smart-punctuation" => Ok(Options::ENABLE_SMART_PUNCTUATION),
        _ => Err(Error::UnknownExtension(name.to_owned())),
    }
}

/// Converts `markdown` into an HTML string. `extensions` holds the
/// extension names declared in the post's `md_exts` header; they are
/// enabled on top of the base set. An unrecognized name is an error
/// rather than being skipped, since it usually means a typo in a header.
pub fn to_html(markdown: &str, extensions: &[String]) -> Result<String, Error> {
    let mut options = base_options();
    for name in extensions {
        options.insert(resolve(name)?);
    }

    let mut body = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut body, Parser::new_ext(markdown, options));
    Ok(body)
}

/// Represents an error converting markdown to HTML.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post's `md_exts` header names an extension this
    /// generator doesn't know about.
    UnknownExtension(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownExtension(name) => {
                write!(f, "Unknown markdown extension `{}`", name)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_to_html_basic() -> Result<(), Error> {
        assert_eq!(
            "<h1>Hello</h1>\n<p>World</p>\n",
            to_html("# Hello\n\nWorld", &[])?
        );
        Ok(())
    }

    #[test]
    fn test_to_html_base_extensions_always_on() -> Result<(), Error> {
        // Strikethrough is part of the base set; no `md_exts` required.
        assert_eq!("<p><del>gone</del></p>\n", to_html("~~gone~~", &[])?);
        Ok(())
    }

    #[test]
    fn test_to_html_declared_extension() -> Result<(), Error> {
        let rendered = to_html("- [x] done", &[String::from("tasklists")])?;
        assert!(rendered.contains("checkbox"), "got: {}", rendered);
        Ok(())
    }

    #[test]
    fn test_to_html_unknown_extension() {
        match to_html("hi", &[String::from("wikilinks")]) {
            Err(Error::UnknownExtension(name)) => {
                assert_eq!("wikilinks", name)
            }
            other => panic!("expected UnknownExtension, got {:?}", other),
        }
    }
}
