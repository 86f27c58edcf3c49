//! Public protocol structs for WebSocket and HTTP endpoints (serde ready), plus the
//! boundary validation applied to incoming grants.

use serde::{Deserialize, Serialize};

use crate::config::GrantPolicy;
use crate::domain::{ExperienceLogEntry, ExperienceSource, Level, UserExperienceSummary};

const MAX_ID_LEN: usize = 128;
const MAX_DESCRIPTION_LEN: usize = 500;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    GetLevels,
    GetSummary {
        #[serde(rename = "userId")]
        user_id: String,
    },
    GrantXp {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(flatten)]
        grant: GrantXpIn,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Levels {
        levels: Vec<Level>,
    },
    Summary {
        summary: SummaryOut,
    },
    Granted {
        grant: GrantOut,
    },
    Error {
        message: String,
    },
}

/// Flat wire form of `UserExperienceSummary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryOut {
    pub user_id: String,
    pub total_xp: u64,
    pub current_level: Level,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_level: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_remaining: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<u8>,
    pub max_level_reached: bool,
}

pub fn summary_out(s: &UserExperienceSummary) -> SummaryOut {
    SummaryOut {
        user_id: s.user_id.clone(),
        total_xp: s.total_xp,
        current_level: s.current_level.clone(),
        next_level: s.next.as_ref().map(|n| n.level.clone()),
        xp_remaining: s.next.as_ref().map(|n| n.xp_remaining),
        progress_percentage: s.next.as_ref().map(|n| n.progress_percentage),
        max_level_reached: s.is_max_level(),
    }
}

//
// Boundary validation
//

/// One failed field check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self { field: field.to_string(), message: message.into() }
    }
}

pub fn validate_user_id(user_id: &str) -> Result<(), Vec<FieldError>> {
    if user_id.is_empty() || user_id.len() > MAX_ID_LEN {
        return Err(vec![FieldError::new("user_id", format!("must be 1..={MAX_ID_LEN} bytes"))]);
    }
    if user_id.chars().any(char::is_whitespace) {
        return Err(vec![FieldError::new("user_id", "must not contain whitespace")]);
    }
    Ok(())
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Clone, Deserialize)]
pub struct GrantXpIn {
    #[serde(alias = "sourceType")]
    pub source_type: ExperienceSource,
    #[serde(default, alias = "sourceId")]
    pub source_id: Option<String>,
    pub xp: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl GrantXpIn {
    /// Collects every failing field rather than stopping at the first.
    pub fn validate(&self, policy: &GrantPolicy) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.source_type == ExperienceSource::Reversal {
            errors.push(FieldError::new("source_type", "reversal entries are created through the reversal endpoint"));
        }
        if self.xp == 0 {
            errors.push(FieldError::new("xp", "must be non-zero"));
        } else if self.xp.unsigned_abs() > policy.max_entry_xp {
            errors.push(FieldError::new("xp", format!("absolute value must not exceed {}", policy.max_entry_xp)));
        }
        if let Some(source_id) = &self.source_id {
            if source_id.is_empty() || source_id.len() > MAX_ID_LEN {
                errors.push(FieldError::new("source_id", format!("must be 1..={MAX_ID_LEN} bytes when present")));
            }
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                errors.push(FieldError::new("description", format!("must be at most {MAX_DESCRIPTION_LEN} characters")));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Serialize)]
pub struct GrantOut {
    pub entry: ExperienceLogEntry,
    pub summary: SummaryOut,
    pub previous_level: u32,
    pub levels_gained: i64,
    pub leveled_up: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReversalIn {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct HistoryOut {
    pub user_id: String,
    pub total_xp: i64,
    pub entries: Vec<ExperienceLogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceLevelsIn {
    pub levels: Vec<Level>,
}

#[derive(Serialize)]
pub struct LevelsOut {
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub user_id: String,
    pub total_xp: u64,
    pub level: u32,
    pub title: String,
}

#[derive(Serialize)]
pub struct LeaderboardOut {
    pub entries: Vec<LeaderboardRow>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub levels: usize,
    pub max_level: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(source_type: ExperienceSource, xp: i64) -> GrantXpIn {
        GrantXpIn { source_type, source_id: None, xp, description: None }
    }

    #[test]
    fn accepts_plain_grant() {
        assert!(grant(ExperienceSource::QuizCompleted, 25).validate(&GrantPolicy::default()).is_ok());
        assert!(grant(ExperienceSource::AdminAdjustment, -25).validate(&GrantPolicy::default()).is_ok());
    }

    #[test]
    fn reports_every_bad_field() {
        let g = GrantXpIn {
            source_type: ExperienceSource::Reversal,
            source_id: Some(String::new()),
            xp: 0,
            description: Some("x".repeat(MAX_DESCRIPTION_LEN + 1)),
        };
        let errors = g.validate(&GrantPolicy::default()).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["source_type", "xp", "source_id", "description"]);
    }

    #[test]
    fn caps_grant_size() {
        let policy = GrantPolicy { max_entry_xp: 100, ..Default::default() };
        assert!(grant(ExperienceSource::QuizCompleted, 100).validate(&policy).is_ok());
        assert!(grant(ExperienceSource::QuizCompleted, 101).validate(&policy).is_err());
        assert!(grant(ExperienceSource::AdminAdjustment, -101).validate(&policy).is_err());
        assert!(grant(ExperienceSource::AdminAdjustment, i64::MIN).validate(&policy).is_err());
    }

    #[test]
    fn user_id_rules() {
        assert!(validate_user_id("user-42").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("has space").is_err());
        assert!(validate_user_id(&"u".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn parses_camel_case_ws_grant() {
        let raw = r#"{"type":"grant_xp","userId":"u1","sourceType":"chapter_completed","sourceId":"ch-9","xp":40}"#;
        match serde_json::from_str::<ClientWsMessage>(raw).unwrap() {
            ClientWsMessage::GrantXp { user_id, grant } => {
                assert_eq!(user_id, "u1");
                assert_eq!(grant.source_type, ExperienceSource::ChapterCompleted);
                assert_eq!(grant.source_id.as_deref(), Some("ch-9"));
                assert_eq!(grant.xp, 40);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }
}
