use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

// One problem found in the disclosure package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub issue: String,
    pub severity: Severity,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub estimated_cost: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: String,
    pub priority: Severity,
    #[serde(default)]
    pub timeframe: String,
}

/// Structured analysis of one document.
///
/// Top-level fields default to empty so a leniently repaired reply can still be
/// represented; completeness is checked on the raw JSON before conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub property_address: String,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub summary: String,
}

// Analyze endpoint request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub file_content: Option<String>,
}

// Extract endpoint response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub file_name: Option<String>,
    pub content_type: String,
    pub text: String,
    pub characters: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_uses_camel_case_keys() {
        let result = AnalysisResult {
            property_address: "1 Elm St".to_string(),
            issues: vec![Issue {
                issue: "Roof damage".to_string(),
                severity: Severity::High,
                details: "Multiple leaks".to_string(),
                estimated_cost: "$5,000".to_string(),
            }],
            recommendations: vec![],
            summary: "Needs work".to_string(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["propertyAddress"], "1 Elm St");
        assert_eq!(value["issues"][0]["estimatedCost"], "$5,000");
        assert_eq!(value["issues"][0]["severity"], "High");
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let parsed: Result<Issue, _> =
            serde_json::from_str(r#"{"issue":"x","severity":"Critical"}"#);
        assert!(parsed.is_err());
    }
}
