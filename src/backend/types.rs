//! Wire types for the SearXNG JSON API

use serde::{Deserialize, Serialize};
use std::fmt;

/// Time range filter accepted by the search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Day,
    Week,
    Month,
    Year,
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRange::Day => write!(f, "day"),
            TimeRange::Week => write!(f, "week"),
            TimeRange::Month => write!(f, "month"),
            TimeRange::Year => write!(f, "year"),
        }
    }
}

/// Parameters for one search call against `/search`
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub query: String,
    pub categories: Vec<String>,
    pub engines: Vec<String>,
    pub language: Option<String>,
    pub pageno: Option<u32>,
    pub time_range: Option<TimeRange>,
    /// Already coerced into the {0,1,2} domain by the caller
    pub safesearch: Option<u8>,
}

impl SearchParams {
    /// Build the query string pairs for this search
    ///
    /// `q` and `format=json` are always present; every optional parameter is
    /// included iff it was supplied and non-empty.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("q", self.query.clone()),
            ("format", "json".to_string()),
        ];
        if !self.categories.is_empty() {
            pairs.push(("categories", self.categories.join(",")));
        }
        if !self.engines.is_empty() {
            pairs.push(("engines", self.engines.join(",")));
        }
        if let Some(language) = self.language.as_deref().filter(|l| !l.is_empty()) {
            pairs.push(("language", language.to_string()));
        }
        if let Some(pageno) = self.pageno {
            pairs.push(("pageno", pageno.to_string()));
        }
        if let Some(time_range) = self.time_range {
            pairs.push(("time_range", time_range.to_string()));
        }
        if let Some(safesearch) = self.safesearch {
            pairs.push(("safesearch", safesearch.to_string()));
        }
        pairs
    }
}

/// One result record as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default, rename = "publishedDate")]
    pub published_date: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Body of a `/search` response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Absent field decodes as an empty vec, never null
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub number_of_results: Option<u64>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// One engine entry from the `/config` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInfo {
    pub name: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub shortcut: Option<String>,
    #[serde(default)]
    pub language_support: Option<bool>,
    #[serde(default)]
    pub paging: Option<bool>,
    #[serde(default)]
    pub safesearch: Option<bool>,
    #[serde(default)]
    pub time_range_support: Option<bool>,
}

/// Body of a `/config` response
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceConfig {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub engines: Vec<EngineInfo>,
    #[serde(default)]
    pub default_locale: Option<String>,
    #[serde(default)]
    pub locales: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub autocomplete: Option<String>,
    #[serde(default)]
    pub safe_search: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn query_pairs_always_contain_q_and_format() {
        let params = SearchParams {
            query: "news".to_string(),
            ..Default::default()
        };
        let pairs = params.query_pairs();
        assert_eq!(pairs[0], ("q", "news".to_string()));
        assert_eq!(pairs[1], ("format", "json".to_string()));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn query_pairs_include_all_supplied_parameters() {
        let params = SearchParams {
            query: "rust".to_string(),
            categories: vec!["it".to_string(), "science".to_string()],
            engines: vec!["duckduckgo".to_string()],
            language: Some("en".to_string()),
            pageno: Some(2),
            time_range: Some(TimeRange::Week),
            safesearch: Some(1),
        };
        let pairs = params.query_pairs();
        assert!(pairs.contains(&("categories", "it,science".to_string())));
        assert!(pairs.contains(&("engines", "duckduckgo".to_string())));
        assert!(pairs.contains(&("language", "en".to_string())));
        assert!(pairs.contains(&("pageno", "2".to_string())));
        assert!(pairs.contains(&("time_range", "week".to_string())));
        assert!(pairs.contains(&("safesearch", "1".to_string())));
    }

    #[rstest]
    #[case("categories")]
    #[case("engines")]
    #[case("language")]
    fn empty_optional_parameters_are_omitted(#[case] key: &str) {
        let params = SearchParams {
            query: "x".to_string(),
            categories: vec![],
            engines: vec![],
            language: Some(String::new()),
            ..Default::default()
        };
        assert!(params.query_pairs().iter().all(|(k, _)| *k != key));
    }

    #[rstest]
    #[case(TimeRange::Day, "day")]
    #[case(TimeRange::Week, "week")]
    #[case(TimeRange::Month, "month")]
    #[case(TimeRange::Year, "year")]
    fn time_range_renders_lowercase(#[case] range: TimeRange, #[case] expected: &str) {
        assert_eq!(range.to_string(), expected);
    }

    #[test]
    fn search_response_defaults_results_to_empty() {
        let response: SearchResponse = serde_json::from_str(r#"{"query":"abc"}"#).unwrap();
        assert!(response.results.is_empty());
    }

    #[test]
    fn search_result_reads_published_date_field() {
        let result: SearchResult = serde_json::from_str(
            r#"{"title":"A","url":"http://x","publishedDate":"2024-01-01"}"#,
        )
        .unwrap();
        assert_eq!(result.published_date.as_deref(), Some("2024-01-01"));
    }
}
