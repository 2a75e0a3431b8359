//! Responsible for templating and writing the output HTML tree from the
//! aggregated site state. Four independent passes, each reading the same
//! read-only [`Aggregate`]:
//!
//! 1. Root pages: files directly under `content/`, rendered as standalone
//!    template strings into the output root.
//! 2. Posts: one page per post at `YYYY/MM/DD/<slug>/index.html`, with
//!    chronological prev/next neighbors in context.
//! 3. Archive: one page per year and one per month under `archive/`.
//! 4. Tags: the configured page set per tag under `tag/`, for public and
//!    hidden tags alike (hidden tags just aren't linked anywhere).
//!
//! A finishing step symlinks `static` in the output tree to the source
//! static-assets directory. The whole writer is single-threaded by
//! design: directory creation is memoized check-then-create and would
//! race if the passes ever ran concurrently.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs::{read_dir, read_to_string, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};
use url::Url;

use crate::aggregate::Aggregate;
use crate::config::Project;
use crate::date::PostDate;

/// Renders and writes every output page. See the module docs for the
/// passes.
pub struct Writer<'a> {
    project: &'a Project,
    aggregate: &'a Aggregate,
    tera: Tera,

    /// The context shared by post, archive, and tag pages: the `site`
    /// object and the full sorted `posts` list.
    base_context: Context,

    /// Directories already confirmed to exist, so each is checked and
    /// created at most once.
    seen_dirs: HashSet<PathBuf>,
}

/// The `site` object every non-root page sees: the configured base URL
/// and language, the computed update/copyright fields, tag weights for
/// cloud sizing, and every unrecognized `site.yaml` key.
#[derive(Serialize)]
struct SiteContext<'a> {
    base_url: &'a Url,
    language: &'a str,
    update_date: PostDate,
    copyright_period: &'a str,
    tag_min: usize,
    tag_max: usize,
    tags: BTreeMap<&'a str, usize>,
    hidden_tags: &'a HashSet<String>,
    #[serde(flatten)]
    extra: &'a BTreeMap<String, serde_yaml::Value>,
}

impl<'a> Writer<'a> {
    pub fn new(
        project: &'a Project,
        aggregate: &'a Aggregate,
        tera: Tera,
    ) -> Writer<'a> {
        let site = SiteContext {
            base_url: &project.site.base_url,
            language: &project.site.language,
            update_date: aggregate.update_date,
            copyright_period: &aggregate.copyright_period,
            tag_min: aggregate.tag_min,
            tag_max: aggregate.tag_max,
            tags: aggregate
                .tag_index
                .iter()
                .map(|(tag, bucket)| (tag.as_str(), bucket.len()))
                .collect(),
            hidden_tags: &project.site.hidden_tags,
            extra: &project.site.extra,
        };
        let mut base_context = Context::new();
        base_context.insert("site", &site);
        base_context.insert("posts", &aggregate.posts);
        Writer {
            project,
            aggregate,
            tera,
            base_context,
            seen_dirs: HashSet::new(),
        }
    }

    /// Runs all four passes and the static-assets finishing step.
    pub fn write_site(&mut self) -> Result<()> {
        self.write_root_pages()?;
        self.write_posts()?;
        self.write_archive()?;
        self.write_tags()?;
        self.link_static()?;
        Ok(())
    }

    /// Renders every regular file directly under the content root as a
    /// standalone template string (not a named template) into the same
    /// relative name at the output root. The context exposes only the
    /// page's own absolute URL.
    fn write_root_pages(&mut self) -> Result<()> {
        let project = self.project;
        for result in read_dir(&project.content_directory)? {
            let entry = result?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let contents = read_to_string(entry.path())?;

            let mut context = Context::new();
            context
                .insert("absolute_url", &project.site.base_url.join(&name)?);
            let rendered = self.tera.render_str(&contents, &context)?;
            let path = project.output_directory.join(&name);
            self.write_file(&path, &rendered)?;
        }
        Ok(())
    }

    /// Renders one page per post, in sorted order, with the
    /// chronologically previous and next posts in context when they
    /// exist. Each post renders with its own declared template if it has
    /// one, else the site default.
    fn write_posts(&mut self) -> Result<()> {
        let project = self.project;
        let posts = &self.aggregate.posts;
        for (i, post) in posts.iter().enumerate() {
            let mut context = self.base_context.clone();
            context.insert("post", post);
            context.insert(
                "prev",
                &match i {
                    0 => None,
                    _ => posts.get(i - 1),
                },
            );
            context.insert("next", &posts.get(i + 1));

            let template = post
                .template
                .as_deref()
                .unwrap_or(&project.site.post_template);
            let rendered = self.tera.render(template, &context)?;
            let path = project.output_directory.join(&post.file_path);
            self.write_file(&path, &rendered)?;
        }
        Ok(())
    }

    /// Renders `archive/<year>/index.html` for every year in the
    /// calendar and `archive/<year>/<month>/index.html` (month
    /// zero-padded) for every month within it.
    fn write_archive(&mut self) -> Result<()> {
        let project = self.project;
        let aggregate = self.aggregate;
        for (year, months) in &aggregate.archive {
            let mut context = self.base_context.clone();
            context.insert("year", year);
            let rendered =
                self.tera.render(&project.site.year_template, &context)?;
            let path = project
                .output_directory
                .join(format!("archive/{}/index.html", year));
            self.write_file(&path, &rendered)?;

            for month in months.keys() {
                let mut context = self.base_context.clone();
                context.insert("year", year);
                context.insert("month", month);
                context.insert("month_name", &aggregate.month_names[month]);
                let rendered = self
                    .tera
                    .render(&project.site.month_template, &context)?;
                let path = project
                    .output_directory
                    .join(format!("archive/{}/{:02}/index.html", year, month));
                self.write_file(&path, &rendered)?;
            }
        }
        Ok(())
    }

    /// Renders the configured tag page set for every public tag, then for
    /// every hidden tag (same templates, hidden bucket).
    fn write_tags(&mut self) -> Result<()> {
        let aggregate = self.aggregate;
        for (tag, bucket) in &aggregate.tag_index {
            self.write_tag_pages(tag, bucket)?;
        }
        for (tag, bucket) in &aggregate.hidden_tag_index {
            self.write_tag_pages(tag, bucket)?;
        }
        Ok(())
    }

    fn write_tag_pages(&mut self, tag: &str, bucket: &[usize]) -> Result<()> {
        let project = self.project;
        let tag_posts = self.aggregate.bucket_posts(bucket);
        for (file_name, template) in project.site.tag_template.files() {
            let mut context = self.base_context.clone();
            context.insert("tag", tag);
            // The bucket shadows the site-wide post list for tag pages.
            context.insert("posts", &tag_posts);
            let rendered = self.tera.render(template, &context)?;
            let path = project
                .output_directory
                .join(format!("tag/{}/{}", tag, file_name));
            self.write_file(&path, &rendered)?;
        }
        Ok(())
    }

    /// Ensures `<output>/static` is a symbolic link to the source
    /// static-assets directory, creating it only if absent.
    fn link_static(&mut self) -> Result<()> {
        let output = self.project.output_directory.clone();
        let link = output.join("static");
        self.ensure_dir(&output)?;
        if std::fs::symlink_metadata(&link).is_err() {
            // Resolve the source so the link survives being read from
            // anywhere; fall back to the configured path if the static
            // directory doesn't exist yet.
            let source = std::fs::canonicalize(&self.project.static_directory)
                .unwrap_or_else(|_| self.project.static_directory.clone());
            symlink(&source, &link)?;
        }
        Ok(())
    }

    fn write_file(&mut self, path: &Path, contents: &str) -> Result<()> {
        use std::io::Write;
        if let Some(dir) = path.parent() {
            let dir = dir.to_owned();
            self.ensure_dir(&dir)?;
        }
        File::create(path)?.write_all(contents.as_bytes())?;
        Ok(())
    }

    fn ensure_dir(&mut self, dir: &Path) -> Result<()> {
        if self.seen_dirs.insert(dir.to_owned()) && !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn symlink(source: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn symlink(source: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(source, link)
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(tera::Error),

    /// An error joining a root page's URL onto the site base URL.
    UrlParse(url::ParseError),

    /// An error writing the output files.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<tera::Error> for Error {
    /// Converts a [`tera::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for fallible template operations.
    fn from(err: tera::Error) -> Error {
        Error::Template(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. This allows us to
    /// use the `?` operator when joining root page URLs.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}
