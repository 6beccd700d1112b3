use crate::{
    article::Article,
    error::{Error, Result},
    settings::Settings,
};
use reqwest::{
    blocking::{Client, Response},
    StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_BASE_URL: &str = "https://readitlaterlist.com/v2/";
pub const RATE_LIMIT_PREFIX: &str = "x-limit";

/// The two requests the command handlers make.
pub trait Api {
    /// `GET {base_url}{method}` with filtered params and stored credentials.
    fn call(&self, method: &str, params: Params) -> Result<ApiResponse>;

    /// Plain GET of an arbitrary page, no credentials attached.
    fn fetch(&self, url: &str) -> Result<ApiResponse>;
}

#[derive(Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    settings: Settings,
}

impl ApiClient {
    pub fn new(base_url: &str, settings: Settings) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.to_string(),
            settings,
        })
    }

    fn send(&self, url: &str, query: &[(String, String)]) -> Result<ApiResponse> {
        let response = self.client.get(url).query(query).send()?;
        log::debug!("GET {} -> {}", url, response.status());
        ApiResponse::from_response(response)
    }
}

impl Api for ApiClient {
    fn call(&self, method: &str, params: Params) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, method);
        log::debug!(
            "Calling {} with {:?}",
            method,
            params.iter().map(|(name, _)| name).collect::<Vec<_>>()
        );
        self.send(&url, &build_query(&self.settings, params))
    }

    fn fetch(&self, url: &str) -> Result<ApiResponse> {
        self.send(url, &[])
    }
}

/// Drops falsy params, then lays every stored setting over the rest.
pub fn build_query(settings: &Settings, params: Params) -> Vec<(String, String)> {
    let mut query: BTreeMap<String, String> = params
        .0
        .into_iter()
        .filter(|(_, value)| value.is_truthy())
        .map(|(name, value)| (name, value.to_string()))
        .collect();

    query.extend(settings.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    query.into_iter().collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Text(String),
    Int(i64),
    Flag(bool),
    Absent,
}

impl Param {
    pub fn is_truthy(&self) -> bool {
        match self {
            Param::Text(s) => !s.is_empty(),
            Param::Int(n) => *n != 0,
            Param::Flag(b) => *b,
            Param::Absent => false,
        }
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Param::Text(s) => f.write_str(s),
            Param::Int(n) => write!(f, "{}", n),
            Param::Flag(b) => f.write_str(if *b { "1" } else { "0" }),
            Param::Absent => Ok(()),
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl From<u32> for Param {
    fn from(value: u32) -> Self {
        Param::Int(value.into())
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Flag(value)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Param::Absent, Into::into)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<(String, Param)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Param>) -> Self {
        self.0.push((name.to_string(), value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub ok: bool,
    pub status: StatusCode,
    pub headers: BTreeMap<String, String>,
    body: String,
    json: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: BTreeMap<String, String>, body: String) -> Self {
        let json = serde_json::from_str(&body).ok();
        Self {
            ok: status.is_success(),
            status,
            headers,
            body,
            json,
        }
    }

    fn from_response(response: Response) -> Result<Self> {
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text()?;
        Ok(Self::new(status, headers, body))
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Top-level field of a JSON object body.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.json.as_ref()?.get(name)
    }

    /// The remote's `status` header, or the HTTP status when it sent none.
    pub fn status_line(&self) -> String {
        self.headers
            .get("status")
            .cloned()
            .unwrap_or_else(|| self.status.to_string())
    }

    pub fn into_result(self) -> Result<Self> {
        if self.ok {
            Ok(self)
        } else {
            Err(Error::Remote(self.status_line()))
        }
    }

    /// Articles from the `list` result-set, in the order the remote sent them.
    pub fn articles(&self) -> Result<Vec<Article>> {
        let malformed = |reason: String| Error::MalformedResponse {
            method: "get".to_string(),
            reason,
        };

        let list = match self.field("list") {
            Some(list) => list,
            None if self.json().is_some() => return Ok(Vec::new()),
            None => return Err(malformed("body is not JSON".to_string())),
        };

        match list {
            Value::Object(items) => items
                .values()
                .map(|item| Article::deserialize(item).map_err(|e| malformed(e.to_string())))
                .collect(),
            // An empty result-set comes back as `[]` or `null`.
            Value::Array(items) if items.is_empty() => Ok(Vec::new()),
            Value::Null => Ok(Vec::new()),
            other => Err(malformed(format!("unexpected list: {}", other))),
        }
    }

    pub fn rate_limits(&self) -> Vec<RateLimit> {
        self.headers
            .iter()
            .filter(|(name, _)| name.starts_with(RATE_LIMIT_PREFIX))
            .map(|(name, value)| RateLimit {
                label: name
                    .get(RATE_LIMIT_PREFIX.len() + 1..)
                    .unwrap_or_default()
                    .split('-')
                    .collect::<Vec<_>>()
                    .join(" "),
                value: value.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    pub label: String,
    pub value: String,
}

impl std::fmt::Display for RateLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Settings {
        [("username", "alice"), ("password", "hunter2"), ("apikey", "k3y")]
            .into_iter()
            .collect()
    }

    fn response(status: u16, headers: &[(&str, &str)], body: &str) -> ApiResponse {
        ApiResponse::new(
            StatusCode::from_u16(status).unwrap(),
            headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body.to_string(),
        )
    }

    #[test]
    fn falsy_params_are_dropped() {
        let params = Params::new()
            .with("url", "http://example.com")
            .with("count", 0u32)
            .with("since", None::<i64>)
            .with("tags", "")
            .with("state", false)
            .with("page", 2i64);

        let query = build_query(&Settings::default(), params);

        assert_eq!(
            query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("url".to_string(), "http://example.com".to_string()),
            ]
        );
    }

    #[test]
    fn credentials_are_always_sent_and_win() {
        let params = Params::new()
            .with("count", 10u32)
            .with("username", "mallory");

        let query: BTreeMap<_, _> = build_query(&credentials(), params).into_iter().collect();

        assert_eq!(query.get("username").map(String::as_str), Some("alice"));
        assert_eq!(query.get("password").map(String::as_str), Some("hunter2"));
        assert_eq!(query.get("apikey").map(String::as_str), Some("k3y"));
        assert_eq!(query.get("count").map(String::as_str), Some("10"));

        let bare: BTreeMap<_, _> = build_query(&credentials(), Params::new())
            .into_iter()
            .collect();
        assert_eq!(bare.len(), 3);
    }

    #[test]
    fn non_json_body_is_not_an_error() {
        let res = response(200, &[], "<html>OK</html>");
        assert!(res.ok);
        assert!(res.json().is_none());
        assert_eq!(res.body(), "<html>OK</html>");
    }

    #[test]
    fn status_line_prefers_remote_header() {
        let res = response(401, &[("status", "401 Authentication failed")], "");
        assert!(!res.ok);
        assert_eq!(res.status_line(), "401 Authentication failed");

        let res = response(404, &[], "");
        assert_eq!(res.status_line(), "404 Not Found");

        match res.into_result() {
            Err(Error::Remote(line)) => assert_eq!(line, "404 Not Found"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn articles_parse_from_list_mapping() {
        let res = response(
            200,
            &[],
            r#"{"status":1,"list":{
                "7":{"item_id":"7","time_added":"1300000200","title":"Two","url":"http://b"},
                "3":{"item_id":"3","time_added":1300000100,"title":"One","url":"http://a"}
            }}"#,
        );

        let articles = res.articles().unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(res.field("status"), Some(&Value::from(1)));
        assert!(articles.iter().any(|a| a.title == "One" && a.url == "http://a"));
    }

    #[test]
    fn articles_keep_body_order() {
        let res = response(
            200,
            &[],
            r#"{"list":{
                "9":{"time_added":"5","title":"First","url":"u1"},
                "10":{"time_added":"5","title":"Second","url":"u2"}
            }}"#,
        );

        let titles: Vec<_> = res.articles().unwrap().into_iter().map(|a| a.title).collect();

        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn empty_list_shapes_yield_no_articles() {
        assert!(response(200, &[], r#"{"list":[]}"#).articles().unwrap().is_empty());
        assert!(response(200, &[], r#"{"list":null}"#).articles().unwrap().is_empty());
        assert!(response(200, &[], r#"{"status":2}"#).articles().unwrap().is_empty());
        assert!(matches!(
            response(200, &[], "nope").articles(),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn rate_limits_from_prefixed_headers() {
        let res = response(
            200,
            &[
                ("x-limit-user-remaining", "42"),
                ("content-type", "text/html"),
                ("x-limit-user-limit", "100"),
            ],
            "",
        );

        let lines: Vec<_> = res.rate_limits().iter().map(ToString::to_string).collect();

        assert_eq!(lines, vec!["user limit: 100", "user remaining: 42"]);
    }
}
