use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorKind {
    User,
    Assistant,
}

impl AuthorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One chat message as the backend speaks it. `id` is absent on an
/// optimistic message that the server has not confirmed yet.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: Option<String>,
    #[serde(rename = "sent_By")]
    pub sent_by: AuthorKind,
    pub message_content: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Build the locally-authored message that is rendered before the
    /// server echoes it back.
    pub fn optimistic(user_id: Option<String>, body: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id,
            sent_by: AuthorKind::User,
            message_content: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// One bounded batch of historical messages plus whatever pagination
/// metadata the backend chose to include.
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    pub items: Vec<Message>,
    pub total_pages: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "plantSpecies", default)]
    pub plant_species: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// What the backend hands out after a successful sign-in lookup or a
/// completed registration: a token plus the user record it belongs to.
#[derive(Debug, Clone)]
pub struct AuthLogin {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Plant {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "dateOfPlanting")]
    pub date_of_planting: DateTime<Utc>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthLog {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// URL of the uploaded photo the diagnosis was run against.
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(rename = "dateOfDiagnosis")]
    pub date_of_diagnosis: DateTime<Utc>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Diagnosis text produced behind the endpoint; not computed here.
    #[serde(default)]
    pub diagnosis: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(rename = "isCompleted", default)]
    pub is_completed: bool,
    pub plant_name: String,
}

impl Task {
    pub fn is_pending(&self) -> bool {
        !self.is_completed
    }
}

/// Registration payload for the onboarding flow. The photo travels as a
/// multipart file part when present.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub email: String,
    pub name: String,
    pub plant_species: Vec<String>,
    pub photo: Option<UploadFile>,
}

#[derive(Debug, Clone)]
pub struct NewPlant {
    pub name: String,
    pub species: String,
    pub date_of_planting: DateTime<Utc>,
    pub comment: Option<String>,
    pub photo: Option<UploadFile>,
}

#[derive(Debug, Clone)]
pub struct NewHealthLog {
    pub plant_id: String,
    pub name: String,
    pub date_of_diagnosis: DateTime<Utc>,
    pub comment: Option<String>,
    pub photo: Option<UploadFile>,
}

#[derive(Debug, Serialize, Clone)]
pub struct NewTask {
    pub user_id: String,
    pub name: String,
    pub plant_name: String,
}

/// An image attachment held in memory until the upload request is built.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
