//! Site configuration and project directory layout. A project is a
//! directory containing a `site.yaml` plus the conventional input
//! directories:
//!
//! * `content/`: root pages, rendered straight into the output root
//! * `posts/`: post source files
//! * `templates/`: named templates
//! * `static/`: static assets, symlinked into the output tree
//!
//! Like the tool itself, configuration loading is forgiving about where
//! it's invoked: [`Project::from_directory`] walks parent directories
//! until it finds a `site.yaml`.

use anyhow::{anyhow, Context as _, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The settings read from `site.yaml`. Keys this generator doesn't
/// recognize collect in `extra` and pass through into template context
/// unchanged.
#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    /// The base URL the site will be served from. Post/tag/archive URLs
    /// are joined onto this.
    pub base_url: Url,

    /// The site's default language, applied to posts that don't declare
    /// their own.
    #[serde(default = "default_language")]
    pub language: String,

    /// The template posts render with unless they declare a `template`
    /// header of their own.
    pub post_template: String,

    /// The template for `archive/<year>/index.html` pages.
    pub year_template: String,

    /// The template for `archive/<year>/<month>/index.html` pages.
    pub month_template: String,

    /// The template(s) for tag pages; see [`TagTemplates`].
    pub tag_template: TagTemplates,

    /// Tags excluded from public listings. Hidden tags still get their own
    /// pages, they just aren't linked from anywhere public.
    #[serde(default)]
    pub hidden_tags: HashSet<String>,

    /// Everything else in `site.yaml`, passed through to templates.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_language() -> String {
    String::from("en")
}

/// The tag-page template configuration: either one template name (which
/// renders a single `index.html` per tag) or a mapping of output file
/// name to template name (so a tag can get, say, both an HTML index and a
/// feed).
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum TagTemplates {
    Single(String),
    Files(BTreeMap<String, String>),
}

impl TagTemplates {
    /// The `(output file name, template name)` pairs to render for every
    /// tag.
    pub fn files(&self) -> Vec<(&str, &str)> {
        match self {
            TagTemplates::Single(template) => {
                vec![("index.html", template.as_str())]
            }
            TagTemplates::Files(map) => map
                .iter()
                .map(|(file, template)| (file.as_str(), template.as_str()))
                .collect(),
        }
    }
}

/// A fully-resolved project: the parsed `site.yaml` plus every input and
/// output directory.
pub struct Project {
    pub site: SiteConfig,
    pub content_directory: PathBuf,
    pub posts_directory: PathBuf,
    pub templates_directory: PathBuf,
    pub static_directory: PathBuf,
    pub output_directory: PathBuf,
}

impl Project {
    /// Finds `site.yaml` in `dir` or the nearest parent directory and
    /// loads the project rooted there. `output_directory` defaults to
    /// `<project root>/_site`.
    pub fn from_directory(
        dir: &Path,
        output_directory: Option<PathBuf>,
    ) -> Result<Project> {
        let path = dir.join("site.yaml");
        if path.exists() {
            Project::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => {
                    Project::from_directory(parent, output_directory)
                }
                None => Err(anyhow!(
                    "Could not find `site.yaml` in any parent directory"
                )),
            }
        }
    }

    pub fn from_project_file(
        path: &Path,
        output_directory: Option<PathBuf>,
    ) -> Result<Project> {
        let file = File::open(path).with_context(|| {
            format!("Opening site file `{}`", path.display())
        })?;
        let site: SiteConfig = serde_yaml::from_reader(file)
            .with_context(|| format!("Parsing `{}`", path.display()))?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided site file path \
                 `{}`",
                path.display()
            )),
            Some(root) => Ok(Project {
                site,
                content_directory: root.join("content"),
                posts_directory: root.join("posts"),
                templates_directory: root.join("templates"),
                static_directory: root.join("static"),
                output_directory: output_directory
                    .unwrap_or_else(|| root.join("_site")),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_single_tag_template() -> Result<()> {
        let config: SiteConfig = serde_yaml::from_str(
            "base_url: https://example.org/\n\
             post_template: post.html\n\
             year_template: year.html\n\
             month_template: month.html\n\
             tag_template: tag.html\n",
        )?;
        assert_eq!(
            vec![("index.html", "tag.html")],
            config.tag_template.files(),
        );
        assert_eq!("en", config.language);
        assert!(config.hidden_tags.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_tag_template_mapping() -> Result<()> {
        let config: SiteConfig = serde_yaml::from_str(
            "base_url: https://example.org/\n\
             language: de\n\
             post_template: post.html\n\
             year_template: year.html\n\
             month_template: month.html\n\
             tag_template:\n\
             \x20 index.html: tag.html\n\
             \x20 feed.xml: tag-feed.xml\n\
             hidden_tags: [draft]\n\
             subtitle: a blog\n",
        )?;
        assert_eq!(
            vec![("feed.xml", "tag-feed.xml"), ("index.html", "tag.html")],
            config.tag_template.files(),
        );
        assert_eq!("de", config.language);
        assert!(config.hidden_tags.contains("draft"));
        // Unrecognized keys pass through.
        assert_eq!(
            Some(&serde_yaml::Value::String(String::from("a blog"))),
            config.extra.get("subtitle"),
        );
        Ok(())
    }
}
