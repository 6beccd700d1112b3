use chrono::{DateTime, Local, TimeZone};
use serde::{de, Deserialize, Deserializer};
use std::{cmp::Ordering, fmt};

pub const LIST_DATE_FORMAT: &str = "%a %b %d %I:%M %p";
pub const SEARCH_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Article {
    pub time_added: Timestamp,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Article {
    pub fn matches(&self, query: &str) -> bool {
        format!("{} {}", self.url, self.title).contains(query)
    }
}

/// Seconds since the Unix epoch; the API sends either a string or a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timestamp(f64);

impl Timestamp {
    pub fn new(secs: f64) -> Self {
        Self(secs)
    }

    pub fn to_local(self) -> Option<DateTime<Local>> {
        let secs = self.0.trunc() as i64;
        let nanos = (self.0.fract() * 1e9) as u32;
        Local.timestamp_opt(secs, nanos).single()
    }

    pub fn format(self, pattern: &str) -> String {
        self.to_local()
            .map(|dt| dt.format(pattern).to_string())
            .unwrap_or_else(|| self.0.to_string())
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl de::Visitor<'_> for Visitor {
            type Value = Timestamp;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a unix timestamp as a number or string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Timestamp, E> {
                Ok(Timestamp::new(v as f64))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Timestamp, E> {
                Ok(Timestamp::new(v as f64))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Timestamp, E> {
                Ok(Timestamp::new(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Timestamp, E> {
                v.trim()
                    .parse::<f64>()
                    .map(Timestamp::new)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

/// Stable sort by `time_added`; ties keep their incoming order in both directions.
pub fn sort_by_time_added(articles: &mut [Article], reverse: bool) {
    if reverse {
        articles.sort_by(|a, b| b.time_added.total_cmp(&a.time_added));
    } else {
        articles.sort_by(|a, b| a.time_added.total_cmp(&b.time_added));
    }
}

pub fn search<'a>(articles: &'a [Article], query: &'a str) -> impl Iterator<Item = &'a Article> {
    articles.iter().filter(move |article| article.matches(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(time_added: f64, title: &str, url: &str) -> Article {
        Article {
            time_added: Timestamp::new(time_added),
            title: title.into(),
            url: url.into(),
        }
    }

    #[test]
    fn time_added_accepts_strings_and_numbers() {
        let from_str: Article =
            serde_json::from_str(r#"{"time_added":"1300000000","title":"A","url":"u"}"#).unwrap();
        let from_num: Article =
            serde_json::from_str(r#"{"time_added":1300000000,"title":"A","url":"u"}"#).unwrap();
        assert_eq!(from_str, from_num);

        let bad = serde_json::from_str::<Article>(r#"{"time_added":"soon"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn missing_title_and_url_default_to_empty() {
        let parsed: Article = serde_json::from_str(r#"{"time_added":"5"}"#).unwrap();
        assert_eq!(parsed, article(5.0, "", ""));
    }

    #[test]
    fn null_title_and_url_read_as_empty() {
        let parsed: Article =
            serde_json::from_str(r#"{"time_added":"5","title":null,"url":null}"#).unwrap();
        assert_eq!(parsed, article(5.0, "", ""));
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let mut articles = vec![
            article(20.0, "b", "1"),
            article(10.0, "a", "2"),
            article(20.0, "c", "3"),
        ];

        sort_by_time_added(&mut articles, false);
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);

        sort_by_time_added(&mut articles, true);
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c", "a"]);
    }

    #[test]
    fn search_matches_url_and_title_substring() {
        let articles = vec![
            article(1.0, "Bar", "http://x.com"),
            article(2.0, "Baz", "http://foo.com"),
        ];

        let found: Vec<_> = search(&articles, "foo").collect();
        assert_eq!(found, vec![&articles[1]]);

        assert_eq!(search(&articles, "Bar").count(), 1);
        assert_eq!(search(&articles, "bar").count(), 0);
        assert_eq!(search(&articles, "com Ba").count(), 2);
    }

    #[test]
    fn format_uses_local_time() {
        let ts = Timestamp::new(0.0);
        let expected = Local
            .timestamp_opt(0, 0)
            .single()
            .unwrap()
            .format(SEARCH_DATE_FORMAT)
            .to_string();
        assert_eq!(ts.format(SEARCH_DATE_FORMAT), expected);
    }
}
