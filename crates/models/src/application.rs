use chrono::NaiveDate;
use sea_orm::{entity::prelude::*, FromJsonQueryResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;
use crate::user;

/// Round names auto-created when an application is opened without an
/// explicit pipeline, in display order.
pub const DEFAULT_PIPELINE: [&str; 5] = ["Screening", "OA", "Technical", "HR", "Offer"];

/// Overall state of a tracked application. Stored as its display string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ApplicationStatus {
    #[default]
    #[sea_orm(string_value = "Applied")]
    Applied,
    #[sea_orm(string_value = "In Process")]
    #[serde(rename = "In Process")]
    InProcess,
    #[sea_orm(string_value = "Offered")]
    Offered,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

impl ApplicationStatus {
    /// Parse the wire string; `None` for anything outside the closed set.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Applied" => Some(Self::Applied),
            "In Process" => Some(Self::InProcess),
            "Offered" => Some(Self::Offered),
            "Rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::InProcess => "In Process",
            Self::Offered => "Offered",
            Self::Rejected => "Rejected",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    #[default]
    Pending,
    Passed,
    Failed,
}

impl RoundStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(Self::Pending),
            "Passed" => Some(Self::Passed),
            "Failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Attachment slot; the UI surfaces one card per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Resume,
    Jd,
}

impl AttachmentKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "resume" => Some(Self::Resume),
            "jd" => Some(Self::Jd),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::Jd => "jd",
        }
    }
}

/// One interview stage, embedded in its application. The id is stable and
/// unique within the owning application only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub status: RoundStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Round {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: RoundStatus::Pending,
            date: None,
            notes: None,
        }
    }
}

/// Ordered round collection persisted as a JSONB document on the
/// application row. Stored order is insertion order; children are
/// addressed by id equality, not position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Rounds(pub Vec<Round>);

impl Rounds {
    /// The five-stage default pipeline, each round Pending.
    pub fn default_pipeline() -> Self {
        Self(DEFAULT_PIPELINE.iter().copied().map(Round::new).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Round> {
        self.0.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Round> {
        self.0.iter_mut().find(|r| r.id == id)
    }

    pub fn push(&mut self, round: Round) {
        self.0.push(round);
    }

    /// Remove the round with the given id; reports whether it existed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.0.len();
        self.0.retain(|r| r.id != id);
        self.0.len() != before
    }

    /// Dashboard ordering: default pipeline names first in their fixed
    /// order (first occurrence wins), then custom-named rounds in stored
    /// order. Stored order itself is never rewritten.
    pub fn display_order(&self) -> Vec<&Round> {
        let mut ordered: Vec<&Round> = DEFAULT_PIPELINE
            .iter()
            .filter_map(|name| self.0.iter().find(|r| r.name == *name))
            .collect();
        ordered.extend(self.0.iter().filter(|r| !DEFAULT_PIPELINE.contains(&r.name.as_str())));
        ordered
    }
}

/// Stored file reference, embedded in its application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub filename: String,
    pub url: String,
    pub uploaded_at: DateTimeWithTimeZone,
}

/// Attachment collection persisted as a JSONB document. Accumulates;
/// the newest entry of a kind is the "current" one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Attachments(pub Vec<Attachment>);

impl Attachments {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Attachment> {
        self.0.iter().find(|a| a.id == id)
    }

    pub fn push(&mut self, attachment: Attachment) {
        self.0.push(attachment);
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.0.len();
        self.0.retain(|a| a.id != id);
        self.0.len() != before
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "application")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub company_name: String,
    pub role: String,
    pub status: ApplicationStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub rounds: Rounds,
    #[sea_orm(column_type = "JsonBinary")]
    pub attachments: Attachments,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Owner,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Owner => Entity::belongs_to(user::Entity)
                .from(Column::OwnerId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_company_name(company_name: &str) -> Result<(), errors::ModelError> {
    if company_name.trim().is_empty() {
        return Err(errors::ModelError::Validation("companyName required".into()));
    }
    Ok(())
}

pub fn validate_role(role: &str) -> Result<(), errors::ModelError> {
    if role.trim().is_empty() {
        return Err(errors::ModelError::Validation("role required".into()));
    }
    Ok(())
}
