//! Result payload produced by a finished query.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Keys under which the candidate list may appear, in order of preference.
///
/// The team flow emits `recommended_companies`, the single-agent flow emits
/// `companies`. Both are the same logical field.
const COMPANY_KEYS: [&str; 2] = ["recommended_companies", "companies"];

/// Structured result of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultPayload(Map<String, Value>);

impl ResultPayload {
    /// Wrap a parsed JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Raw access to a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// All top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the payload has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Project summary written by the executor.
    pub fn summary(&self) -> Option<&str> {
        self.first_str(&["project_summary", "summary"])
    }

    /// Methodology notes, emitted by the document analysis team.
    pub fn methodology(&self) -> Option<&str> {
        self.first_str(&["analysis_methodology"])
    }

    /// Requirements extracted from the request.
    pub fn requirements(&self) -> Vec<String> {
        ["project_requirements", "requirements"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_array))
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Null => None,
                        other => Some(other.to_string()),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Candidate companies, whichever alias carries them.
    ///
    /// A non-empty list wins over an empty one; entries that are not objects
    /// are skipped.
    pub fn companies(&self) -> Vec<Company> {
        let lists: Vec<&Vec<Value>> = COMPANY_KEYS
            .iter()
            .filter_map(|key| self.0.get(*key).and_then(Value::as_array))
            .collect();

        let chosen = lists
            .iter()
            .find(|list| !list.is_empty())
            .or_else(|| lists.first());

        chosen
            .map(|list| {
                list.iter()
                    .filter_map(|entry| Company::deserialize(entry).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Consume and return the inner map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
    }
}

/// A candidate company recommended for the project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub rank: Option<u32>,

    #[serde(default)]
    pub website: Option<String>,

    /// Score out of 10.
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: Option<f64>,

    #[serde(default)]
    pub location: Option<String>,

    /// Fit classification, e.g. "High", "Medium", "Low".
    #[serde(default)]
    pub project_fit: Option<String>,

    #[serde(default)]
    pub specialization: Option<String>,

    #[serde(default)]
    pub suitability_reason: Option<String>,

    #[serde(default)]
    pub notable_experience: Option<String>,
}

/// Accept `8`, `8.5`, `"8"` or `"8/10"`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s
            .split('/')
            .next()
            .and_then(|head| head.trim().parse::<f64>().ok()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> ResultPayload {
        match value {
            Value::Object(map) => ResultPayload::new(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_companies_from_either_alias() {
        let single = payload(json!({"companies": [{"name": "Acme", "rating": 8}]}));
        let team = payload(json!({"recommended_companies": [{"name": "Atlas", "rating": 9}]}));

        assert_eq!(single.companies()[0].name, "Acme");
        assert_eq!(single.companies()[0].rating, Some(8.0));
        assert_eq!(team.companies()[0].name, "Atlas");
    }

    #[test]
    fn test_non_empty_alias_wins() {
        let both = payload(json!({
            "recommended_companies": [],
            "companies": [{"name": "Acme"}]
        }));
        assert_eq!(both.companies().len(), 1);
    }

    #[test]
    fn test_company_fields() {
        let p = payload(json!({"companies": [{
            "name": "Acme",
            "rank": 1,
            "website": "https://acme.example",
            "rating": "7/10",
            "location": "Casablanca",
            "project_fit": "High",
            "specialization": "Offices",
            "suitability_reason": "Local presence",
            "notable_experience": "HQ tower",
            "unexpected": true
        }, "not an object"]}));

        let companies = p.companies();
        assert_eq!(companies.len(), 1);
        let acme = &companies[0];
        assert_eq!(acme.rank, Some(1));
        assert_eq!(acme.rating, Some(7.0));
        assert_eq!(acme.project_fit.as_deref(), Some("High"));
        assert_eq!(acme.location.as_deref(), Some("Casablanca"));
    }

    #[test]
    fn test_summary_and_requirements() {
        let p = payload(json!({
            "project_summary": "Two-floor office",
            "project_requirements": ["Steel frame", "HVAC", null],
            "analysis_methodology": "Desk research"
        }));

        assert_eq!(p.summary(), Some("Two-floor office"));
        assert_eq!(p.requirements(), vec!["Steel frame", "HVAC"]);
        assert_eq!(p.methodology(), Some("Desk research"));
    }

    #[test]
    fn test_missing_fields() {
        let p = payload(json!({}));
        assert!(p.is_empty());
        assert!(p.companies().is_empty());
        assert!(p.requirements().is_empty());
        assert_eq!(p.summary(), None);
    }
}
