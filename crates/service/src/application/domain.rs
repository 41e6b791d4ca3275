use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::application::{Attachment, AttachmentKind, ApplicationStatus, Round, RoundStatus};

/// Create input. A non-empty `rounds` list replaces the default pipeline
/// verbatim; otherwise the five default stages are created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationInput {
    pub company_name: String,
    pub role: String,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub rounds: Option<Vec<RoundInput>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Caller-supplied round; id and status are filled in when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub status: Option<RoundStatus>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RoundInput {
    pub fn into_round(self) -> Round {
        Round {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name: self.name,
            status: self.status.unwrap_or_default(),
            date: self.date,
            notes: self.notes,
        }
    }
}

/// Caller-supplied attachment record for wholesale replacement on update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<FixedOffset>>,
}

impl AttachmentInput {
    pub fn into_attachment(self) -> Attachment {
        Attachment {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            kind: self.kind,
            filename: self.filename,
            url: self.url,
            uploaded_at: self.uploaded_at.unwrap_or_else(|| Utc::now().into()),
        }
    }
}

/// Partial update. Only the listed fields are mergeable; `id`, `ownerId`
/// and timestamps are never caller-writable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationInput {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rounds: Option<Vec<RoundInput>>,
    #[serde(default)]
    pub attachments: Option<Vec<AttachmentInput>>,
}
