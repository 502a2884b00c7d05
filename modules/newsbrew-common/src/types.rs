use serde::{Deserialize, Serialize};

/// Review state of a published article. Stored as text; absence of a
/// row value means the article has not been reviewed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approved" => Some(ReviewStatus::Approved),
            "rejected" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for publishing a new article. The store assigns the id and
/// the publication timestamp; neither is accepted from the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub headline: String,
    pub summary: Option<String>,
    pub story: String,
    pub haiku: Option<String>,
    pub bias: Option<String>,
    pub bias_align: Option<String>,
    pub bias_score: Option<String>,
    pub quality_score: Option<String>,
    pub cited: Option<serde_json::Value>,
    pub topic: Option<String>,
    pub category: Option<String>,
    pub image_data: Option<String>,
    pub image_haiku: Option<String>,
}

/// Optional field updates applied together with a review decision.
/// Only fields that are present are written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdates {
    pub category: Option<String>,
    pub topic: Option<String>,
    pub bias_score: Option<String>,
    pub quality_score: Option<String>,
    pub summary: Option<String>,
}

/// Parse a numeric-as-text score column value. Non-numeric or empty
/// values yield None rather than an error.
pub fn parse_score(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_status_roundtrip() {
        assert_eq!(ReviewStatus::parse("approved"), Some(ReviewStatus::Approved));
        assert_eq!(ReviewStatus::parse("rejected"), Some(ReviewStatus::Rejected));
        assert_eq!(ReviewStatus::Approved.as_str(), "approved");
        assert_eq!(ReviewStatus::parse("pending"), None);
        assert_eq!(ReviewStatus::parse("Approved"), None);
    }

    #[test]
    fn parse_score_accepts_numeric_text() {
        assert_eq!(parse_score(Some("7.5")), Some(7.5));
        assert_eq!(parse_score(Some(" -0.25 ")), Some(-0.25));
        assert_eq!(parse_score(Some("42")), Some(42.0));
    }

    #[test]
    fn parse_score_rejects_junk() {
        assert_eq!(parse_score(Some("")), None);
        assert_eq!(parse_score(Some("n/a")), None);
        assert_eq!(parse_score(Some("7.5.1")), None);
        assert_eq!(parse_score(None), None);
    }
}
