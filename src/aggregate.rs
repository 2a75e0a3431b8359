//! Derives all cross-post state from the loaded posts and the site
//! configuration: chronological order, tag indexes (public and hidden),
//! the archive calendar, absolute URLs, and the copyright span. Runs
//! exactly once, after loading and before any rendering; the resulting
//! [`Aggregate`] is read-only for every rendering pass.

use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::Value;

use crate::config::SiteConfig;
use crate::date::PostDate;
use crate::post::Post;

/// A tag index: tag name to the positions of its posts within
/// [`Aggregate::posts`]. Bucket order is chronological because posts are
/// visited in sorted order while building the index.
pub type TagIndex = BTreeMap<String, Vec<usize>>;

/// The immutable bundle of aggregated site state consumed by every
/// rendering pass.
pub struct Aggregate {
    /// All posts, ascending by date. Ties keep file-name order (the order
    /// the loader produced).
    pub posts: Vec<Post>,

    /// The public tag index. Tags configured as hidden never appear here.
    pub tag_index: TagIndex,

    /// The hidden tag index. Only tags in the configured hidden set
    /// appear here.
    pub hidden_tag_index: TagIndex,

    /// The archive calendar: year, then month number, to post count.
    pub archive: BTreeMap<i32, BTreeMap<u32, usize>>,

    /// Month number to English month name, for every month that appears
    /// in the archive.
    pub month_names: BTreeMap<u32, String>,

    /// The smallest public tag bucket, for relative weighting (tag-cloud
    /// sizing). `usize::MAX` when there are no public tags.
    pub tag_min: usize,

    /// The largest public tag bucket. Zero when there are no public tags.
    pub tag_max: usize,

    /// The date of the chronologically last post.
    pub update_date: PostDate,

    /// The copyright span, first post year through last post year. A
    /// single-year site still renders as a span (`"2021 - 2021"`).
    pub copyright_period: String,
}

impl Aggregate {
    /// Resolves a tag bucket's indices into posts.
    pub fn bucket_posts(&self, bucket: &[usize]) -> Vec<&Post> {
        bucket.iter().map(|&i| &self.posts[i]).collect()
    }
}

/// Computes the [`Aggregate`] for `posts` under `config`. Takes ownership
/// of the posts; this is the only place they are mutated after loading
/// (absolute URLs, language defaults, hidden-tag removal).
pub fn aggregate(
    mut posts: Vec<Post>,
    config: &SiteConfig,
) -> Result<Aggregate> {
    if posts.is_empty() {
        return Err(Error::NoPosts);
    }

    // Ascending by date; `sort_by_key` is stable, so date ties keep the
    // loader's file-name order.
    posts.sort_by_key(|post| post.date);

    let update_date = posts[posts.len() - 1].date;
    let copyright_period =
        format!("{} - {}", posts[0].date.year(), update_date.year());

    for post in posts.iter_mut() {
        post.absolute_url = Some(config.base_url.join(&post.relative_url)?);
        if post.header_get("language").is_none() {
            post.header.insert(
                Value::String(String::from("language")),
                Value::String(config.language.clone()),
            );
        }
        if post.language.is_none() {
            post.language = Some(config.language.clone());
        }
    }

    let mut tag_index = TagIndex::new();
    let mut hidden_tag_index = TagIndex::new();
    for (i, post) in posts.iter_mut().enumerate() {
        let mut kept = Vec::with_capacity(post.tags.len());
        for tag in post.tags.drain(..) {
            if config.hidden_tags.contains(&tag) {
                hidden_tag_index.entry(tag).or_default().push(i);
            } else {
                tag_index.entry(tag.clone()).or_default().push(i);
                kept.push(tag);
            }
        }
        post.tags = kept;
    }

    let mut tag_min = usize::MAX;
    let mut tag_max = 0;
    for bucket in tag_index.values() {
        tag_min = tag_min.min(bucket.len());
        tag_max = tag_max.max(bucket.len());
    }

    let mut archive: BTreeMap<i32, BTreeMap<u32, usize>> = BTreeMap::new();
    let mut month_names = BTreeMap::new();
    for post in &posts {
        *archive
            .entry(post.date.year())
            .or_default()
            .entry(post.date.month())
            .or_insert(0) += 1;
        month_names
            .entry(post.date.month())
            .or_insert_with(|| post.date.month_name());
    }

    Ok(Aggregate {
        posts,
        tag_index,
        hidden_tag_index,
        archive,
        month_names,
        tag_min,
        tag_max,
        update_date,
        copyright_period,
    })
}

/// Represents the result of an aggregation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error aggregating site state.
#[derive(Debug)]
pub enum Error {
    /// Returned when there are no posts at all. Without posts there is no
    /// well-defined update date or copyright span, so this is a fatal
    /// precondition rather than an empty site.
    NoPosts,

    /// Returned when a post URL can't be joined onto the site base URL.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NoPosts => {
                write!(f, "Cannot aggregate an empty post collection")
            }
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NoPosts => None,
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to
    /// use the `?` operator when joining post URLs.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::TagTemplates;
    use crate::post;
    use std::collections::BTreeMap as Map;
    use std::path::Path;
    use url::Url;

    fn fixture_config(hidden: &[&str]) -> SiteConfig {
        SiteConfig {
            base_url: Url::parse("https://example.org/").unwrap(),
            language: String::from("en"),
            post_template: String::from("post.html"),
            year_template: String::from("year.html"),
            month_template: String::from("month.html"),
            tag_template: TagTemplates::Single(String::from("tag.html")),
            hidden_tags: hidden.iter().map(|t| String::from(*t)).collect(),
            extra: Map::new(),
        }
    }

    fn fixture_post(name: &str, date: &str, tags: &[&str]) -> Post {
        let input = format!(
            "title: {}\ndate: {}\ntags: [{}]\n--\nbody",
            name,
            date,
            tags.join(", "),
        );
        post::parse(Path::new(&format!("posts/{}.md", name)), &input)
            .unwrap()
    }

    #[test]
    fn test_aggregate_sorts_ascending() -> Result<()> {
        let aggregate = aggregate(
            vec![
                fixture_post("c", "2021-03-01", &[]),
                fixture_post("a", "2019-07-20", &[]),
                fixture_post("b", "2020-12-31", &[]),
            ],
            &fixture_config(&[]),
        )?;
        let titles: Vec<&str> =
            aggregate.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(vec!["a", "b", "c"], titles);
        for pair in aggregate.posts.windows(2) {
            assert!(pair[0].date <= pair[1].date);
        }
        Ok(())
    }

    #[test]
    fn test_aggregate_stable_on_date_ties() -> Result<()> {
        let aggregate = aggregate(
            vec![
                fixture_post("a", "2021-03-01", &[]),
                fixture_post("b", "2021-03-01", &[]),
                fixture_post("c", "2021-03-01", &[]),
            ],
            &fixture_config(&[]),
        )?;
        let titles: Vec<&str> =
            aggregate.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(vec!["a", "b", "c"], titles);
        Ok(())
    }

    #[test]
    fn test_aggregate_update_date_and_copyright() -> Result<()> {
        let aggregate = aggregate(
            vec![
                fixture_post("a", "2019-07-20", &[]),
                fixture_post("b", "2021-03-01", &[]),
            ],
            &fixture_config(&[]),
        )?;
        assert_eq!("2021-03-01", aggregate.update_date.to_string());
        assert_eq!("2019 - 2021", aggregate.copyright_period);
        Ok(())
    }

    #[test]
    fn test_aggregate_single_year_copyright_is_still_a_span() -> Result<()> {
        let aggregate = aggregate(
            vec![fixture_post("a", "2021-03-01", &[])],
            &fixture_config(&[]),
        )?;
        assert_eq!("2021 - 2021", aggregate.copyright_period);
        Ok(())
    }

    #[test]
    fn test_aggregate_absolute_urls_and_language() -> Result<()> {
        let aggregate = aggregate(
            vec![fixture_post("hello", "2021-04-16", &[])],
            &fixture_config(&[]),
        )?;
        let post = &aggregate.posts[0];
        assert_eq!(
            "https://example.org/2021/04/16/hello/",
            post.absolute_url.as_ref().unwrap().as_str(),
        );
        assert_eq!(Some("en"), post.language.as_deref());
        assert_eq!(
            Some(&Value::String(String::from("en"))),
            post.header_get("language"),
        );
        Ok(())
    }

    #[test]
    fn test_aggregate_tag_partition() -> Result<()> {
        let aggregate = aggregate(
            vec![
                fixture_post("a", "2020-01-01", &["rust", "draft"]),
                fixture_post("b", "2020-02-01", &["rust"]),
            ],
            &fixture_config(&["draft"]),
        )?;
        assert_eq!(
            vec![0, 1],
            aggregate.tag_index.get("rust").unwrap().clone(),
        );
        assert!(aggregate.tag_index.get("draft").is_none());
        assert_eq!(
            vec![0],
            aggregate.hidden_tag_index.get("draft").unwrap().clone(),
        );
        assert!(aggregate.hidden_tag_index.get("rust").is_none());
        // The hidden tag is stripped from the post's own tag list.
        assert_eq!(vec!["rust"], aggregate.posts[0].tags);
        Ok(())
    }

    #[test]
    fn test_aggregate_tag_weights() -> Result<()> {
        let aggregate = aggregate(
            vec![
                fixture_post("a", "2020-01-01", &["rust", "meta"]),
                fixture_post("b", "2020-02-01", &["rust"]),
            ],
            &fixture_config(&[]),
        )?;
        assert_eq!(1, aggregate.tag_min);
        assert_eq!(2, aggregate.tag_max);
        Ok(())
    }

    #[test]
    fn test_aggregate_no_tags_weight_sentinels() -> Result<()> {
        let aggregate = aggregate(
            vec![fixture_post("a", "2020-01-01", &[])],
            &fixture_config(&[]),
        )?;
        assert_eq!(usize::MAX, aggregate.tag_min);
        assert_eq!(0, aggregate.tag_max);
        Ok(())
    }

    #[test]
    fn test_aggregate_archive_counts() -> Result<()> {
        let posts = vec![
            fixture_post("a", "2020-01-10", &[]),
            fixture_post("b", "2020-01-20", &[]),
            fixture_post("c", "2020-11-05", &[]),
            fixture_post("d", "2021-04-16", &[]),
        ];
        let aggregate = aggregate(posts, &fixture_config(&[]))?;
        assert_eq!(2, aggregate.archive[&2020][&1]);
        assert_eq!(1, aggregate.archive[&2020][&11]);
        assert_eq!(1, aggregate.archive[&2021][&4]);
        assert_eq!("January", aggregate.month_names[&1]);
        assert_eq!("November", aggregate.month_names[&11]);

        // Per-year sums match the number of posts in that year.
        for (year, months) in &aggregate.archive {
            let total: usize = months.values().sum();
            let count = aggregate
                .posts
                .iter()
                .filter(|p| p.date.year() == *year)
                .count();
            assert_eq!(count, total);
        }
        Ok(())
    }

    #[test]
    fn test_aggregate_empty_collection() {
        match aggregate(Vec::new(), &fixture_config(&[])) {
            Err(Error::NoPosts) => {}
            _ => panic!("expected NoPosts"),
        }
    }
}
