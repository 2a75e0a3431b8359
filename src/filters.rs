//! The presentation helpers exposed to templates: date formatting, month
//! filtering, and text truncation. Each is a plain [`tera`] filter over
//! the serialized template values; dates travel through context as the
//! strings [`PostDate`] displays as, so the filters parse them back.

use std::collections::HashMap;

use tera::{Tera, Value};

use crate::date::PostDate;

/// Registers every filter on a template engine.
pub fn register(tera: &mut Tera) {
    tera.register_filter("rfc3339", rfc3339);
    tera.register_filter("readable_date", readable_date);
    tera.register_filter("short_date", short_date);
    tera.register_filter("filter_month", filter_month);
    tera.register_filter("shorten", shorten);
}

fn parse_date(value: &Value) -> tera::Result<PostDate> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("expected a date string"))?;
    s.parse().map_err(|e| {
        tera::Error::msg(format!("invalid date `{}`: {}", s, e))
    })
}

/// `{{ post.date | rfc3339 }}`: `2021-04-16` for bare dates,
/// `2021-04-16T09:30:00Z` for moments.
pub fn rfc3339(
    value: &Value,
    _args: &HashMap<String, Value>,
) -> tera::Result<Value> {
    Ok(Value::String(parse_date(value)?.rfc3339()))
}

/// `{{ post.date | readable_date }}`: `April 16, 2021`, with a 24-hour
/// time appended for moments.
pub fn readable_date(
    value: &Value,
    _args: &HashMap<String, Value>,
) -> tera::Result<Value> {
    Ok(Value::String(parse_date(value)?.human_readable()))
}

/// `{{ post.date | short_date }}`: `Apr 16`, no year.
pub fn short_date(
    value: &Value,
    _args: &HashMap<String, Value>,
) -> tera::Result<Value> {
    Ok(Value::String(parse_date(value)?.short()))
}

/// `{{ posts | filter_month(year=year, month=month) }}`: the posts whose
/// date falls in the given year and month, in input order.
pub fn filter_month(
    value: &Value,
    args: &HashMap<String, Value>,
) -> tera::Result<Value> {
    let posts = value
        .as_array()
        .ok_or_else(|| tera::Error::msg("expected a list of posts"))?;
    let year = args
        .get("year")
        .and_then(Value::as_i64)
        .ok_or_else(|| tera::Error::msg("missing `year` argument"))?;
    let month = args
        .get("month")
        .and_then(Value::as_u64)
        .ok_or_else(|| tera::Error::msg("missing `month` argument"))?;

    let kept = posts
        .iter()
        .filter(|post| {
            post.get("date")
                .map(|date| match parse_date(date) {
                    Ok(date) => {
                        i64::from(date.year()) == year
                            && u64::from(date.month()) == month
                    }
                    Err(_) => false,
                })
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    Ok(Value::Array(kept))
}

/// The marker appended to text truncated by [`shorten`].
const ELLIPSIS: &str = "...";

/// `{{ post.content | shorten(length=140) }}`: returns the value
/// unchanged if it fits, otherwise cuts it at `length` characters, backs
/// up to the last whitespace boundary (so words stay whole, unless the
/// very first word already exceeds the budget), and appends the marker.
/// The marker doesn't count against the budget, so output length is at
/// most `length + 3`.
pub fn shorten(
    value: &Value,
    args: &HashMap<String, Value>,
) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("expected a string"))?;
    let length = args
        .get("length")
        .and_then(Value::as_u64)
        .ok_or_else(|| tera::Error::msg("missing `length` argument"))?
        as usize;

    if text.chars().count() <= length {
        return Ok(Value::String(text.to_owned()));
    }

    let cut: String = text.chars().take(length).collect();
    let kept = match cut.rfind(char::is_whitespace) {
        Some(i) => cut[..i].trim_end(),
        None => cut.as_str(),
    };
    Ok(Value::String(format!("{}{}", kept, ELLIPSIS)))
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn no_args() -> HashMap<String, Value> {
        HashMap::new()
    }

    fn args(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (String::from(*k), v.clone()))
            .collect()
    }

    #[test]
    fn test_rfc3339() -> tera::Result<()> {
        assert_eq!(
            json!("2021-04-16"),
            rfc3339(&json!("2021-04-16"), &no_args())?,
        );
        assert_eq!(
            json!("2021-04-16T09:30:00Z"),
            rfc3339(&json!("2021-04-16T09:30:00"), &no_args())?,
        );
        Ok(())
    }

    #[test]
    fn test_readable_date() -> tera::Result<()> {
        assert_eq!(
            json!("April 16, 2021"),
            readable_date(&json!("2021-04-16"), &no_args())?,
        );
        assert_eq!(
            json!("April 16, 2021 09:30"),
            readable_date(&json!("2021-04-16T09:30:00"), &no_args())?,
        );
        Ok(())
    }

    #[test]
    fn test_short_date() -> tera::Result<()> {
        assert_eq!(
            json!("Apr 16"),
            short_date(&json!("2021-04-16"), &no_args())?,
        );
        Ok(())
    }

    #[test]
    fn test_bad_date_is_an_error() {
        assert!(rfc3339(&json!("yesterday"), &no_args()).is_err());
        assert!(rfc3339(&json!(42), &no_args()).is_err());
    }

    #[test]
    fn test_filter_month() -> tera::Result<()> {
        let posts = json!([
            { "title": "a", "date": "2020-01-10" },
            { "title": "b", "date": "2020-11-05" },
            { "title": "c", "date": "2020-01-20" },
            { "title": "d", "date": "2021-01-01" },
        ]);
        let kept = filter_month(
            &posts,
            &args(&[("year", json!(2020)), ("month", json!(1))]),
        )?;
        let titles: Vec<&str> = kept
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        // Input order is preserved.
        assert_eq!(vec!["a", "c"], titles);
        Ok(())
    }

    #[test]
    fn test_shorten_fits() -> tera::Result<()> {
        assert_eq!(
            json!("short"),
            shorten(&json!("short"), &args(&[("length", json!(10))]))?,
        );
        Ok(())
    }

    #[test]
    fn test_shorten_cuts_at_word_boundary() -> tera::Result<()> {
        let out = shorten(
            &json!("The quick brown fox jumps"),
            &args(&[("length", json!(10))]),
        )?;
        let out = out.as_str().unwrap().to_owned();
        assert_eq!("The quick...", out);
        assert!(out.ends_with(ELLIPSIS));
        assert!(out.chars().count() <= 10 + ELLIPSIS.chars().count());
        Ok(())
    }

    #[test]
    fn test_shorten_long_first_word() -> tera::Result<()> {
        // No whitespace before the cut, so the word itself is cut.
        assert_eq!(
            json!("incompr..."),
            shorten(
                &json!("incomprehensibilities abound"),
                &args(&[("length", json!(7))]),
            )?,
        );
        Ok(())
    }
}
