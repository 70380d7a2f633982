use reqwest::Client as HttpClient;
use reqwest::multipart;
use serde_json::Value;

use crate::api::error::Error;
use crate::api::models::{
    AuthLogin, HealthLog, Message, MessagePage, NewHealthLog, NewPlant, NewProfile, NewTask,
    Plant, Task, UploadFile, User,
};
use crate::session::Session;

pub struct ApiClient {
    pub http: HttpClient,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    pub fn new() -> Self {
        Self {
            http: HttpClient::new(),
        }
    }

    fn base_api(base_url: &str) -> String {
        let trimmed = base_url.trim_end_matches('/');
        if trimmed.ends_with("/api") {
            trimmed.to_string()
        } else {
            format!("{}/api", trimmed)
        }
    }

    fn with_auth(req: reqwest::RequestBuilder, session: &Session) -> reqwest::RequestBuilder {
        match session.token.as_deref() {
            Some(t) => req.header("Authorization", format!("Bearer {}", t)),
            None => req,
        }
    }

    /// The user id every owner-scoped endpoint is keyed on. Absent id means
    /// the session never completed sign-in, which the backend would answer
    /// with a 401 anyway.
    fn require_owner(session: &Session) -> Result<&str, Error> {
        session.user_id.as_deref().ok_or(Error::Auth(401))
    }

    async fn expect_success(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(Error::from_status(resp.status()))
        }
    }

    /// Look up an existing account by e-mail during sign-in. A 404 is not a
    /// failure: it means the account does not exist yet and the caller
    /// should route to onboarding.
    pub async fn user_by_email(
        &self,
        base_url: &str,
        email: &str,
    ) -> Result<Option<AuthLogin>, Error> {
        let endpoint = format!("{}/user/getUserByEmailAuth/{}", Self::base_api(base_url), email);
        let resp = self.http.get(&endpoint).send().await?;
        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        let resp = Self::expect_success(resp).await?;
        let json: Value = resp.json().await?;
        parse_auth_login(&json, "user").map(Some)
    }

    /// Complete onboarding: registers the account and returns the token the
    /// backend minted for it.
    pub async fn register(&self, base_url: &str, profile: NewProfile) -> Result<AuthLogin, Error> {
        let endpoint = format!("{}/auth/register", Self::base_api(base_url));
        let mut form = multipart::Form::new()
            .text("email", profile.email)
            .text("name", profile.name);
        for species in profile.plant_species {
            form = form.text("plantSpecies", species);
        }
        form = attach_photo(form, "selectedFile", profile.photo);

        let resp = self.http.post(&endpoint).multipart(form).send().await?;
        let resp = Self::expect_success(resp).await?;
        let json: Value = resp.json().await?;
        parse_auth_login(&json, "newUser")
    }

    pub async fn current_user(&self, session: &Session) -> Result<User, Error> {
        let owner = Self::require_owner(session)?;
        let endpoint = format!("{}/user/getUser/{}", Self::base_api(&session.backend_url), owner);
        let resp = Self::with_auth(self.http.get(&endpoint), session).send().await?;
        let resp = Self::expect_success(resp).await?;
        let json: Value = resp.json().await?;
        serde_json::from_value(json).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Fetch one page of the owner's message history. Page 1 is the most
    /// recent page; older history lives at higher page numbers. The backend
    /// answers either `{ data: [...], totalPages: n }` or a bare array, so
    /// both shapes are accepted.
    pub async fn messages_page(
        &self,
        session: &Session,
        page: u32,
        limit: u32,
    ) -> Result<MessagePage, Error> {
        let owner = Self::require_owner(session)?;
        let endpoint = format!(
            "{}/messages/by-owner/{}?page={}&limit={}",
            Self::base_api(&session.backend_url),
            owner,
            page,
            limit
        );
        let resp = Self::with_auth(self.http.get(&endpoint), session).send().await?;
        let resp = Self::expect_success(resp).await?;
        let json: Value = resp.json().await?;
        parse_message_page(json)
    }

    /// Post a message and return the server-confirmed echo. The echo may
    /// carry a server-assigned id and an adjusted timestamp, and for chats
    /// with the assistant it may be the assistant's reply itself.
    pub async fn send_message(&self, session: &Session, msg: &Message) -> Result<Message, Error> {
        let endpoint = format!("{}/messages", Self::base_api(&session.backend_url));
        let resp = Self::with_auth(self.http.post(&endpoint), session)
            .json(msg)
            .send()
            .await?;
        let resp = Self::expect_success(resp).await?;
        let json: Value = resp.json().await?;
        serde_json::from_value(json).map_err(|e| Error::Decode(e.to_string()))
    }

    pub async fn plants(&self, session: &Session) -> Result<Vec<Plant>, Error> {
        let owner = Self::require_owner(session)?;
        let endpoint = format!(
            "{}/plant/getPlantsByUserId/{}",
            Self::base_api(&session.backend_url),
            owner
        );
        let resp = Self::with_auth(self.http.get(&endpoint), session).send().await?;
        let resp = Self::expect_success(resp).await?;
        let json: Value = resp.json().await?;
        parse_list(json)
    }

    pub async fn plant(&self, session: &Session, plant_id: &str) -> Result<Plant, Error> {
        let endpoint = format!(
            "{}/plant/getPlant/{}",
            Self::base_api(&session.backend_url),
            plant_id
        );
        let resp = Self::with_auth(self.http.get(&endpoint), session).send().await?;
        let resp = Self::expect_success(resp).await?;
        let json: Value = resp.json().await?;
        serde_json::from_value(json).map_err(|e| Error::Decode(e.to_string()))
    }

    pub async fn create_plant(&self, session: &Session, plant: NewPlant) -> Result<Plant, Error> {
        let owner = Self::require_owner(session)?;
        let endpoint = format!("{}/plant/createPlant", Self::base_api(&session.backend_url));
        let mut form = multipart::Form::new()
            .text("user_id", owner.to_string())
            .text("name", plant.name)
            .text("species", plant.species)
            .text("dateOfPlanting", plant.date_of_planting.to_rfc3339());
        if let Some(comment) = plant.comment {
            form = form.text("comment", comment);
        }
        form = attach_photo(form, "image", plant.photo);

        let resp = Self::with_auth(self.http.post(&endpoint), session)
            .multipart(form)
            .send()
            .await?;
        let resp = Self::expect_success(resp).await?;
        let json: Value = resp.json().await?;
        serde_json::from_value(json).map_err(|e| Error::Decode(e.to_string()))
    }

    pub async fn health_logs_by_plant(
        &self,
        session: &Session,
        plant_id: &str,
    ) -> Result<Vec<HealthLog>, Error> {
        let endpoint = format!(
            "{}/healthlog/getHealthLogsByPlantId/{}",
            Self::base_api(&session.backend_url),
            plant_id
        );
        let resp = Self::with_auth(self.http.get(&endpoint), session).send().await?;
        let resp = Self::expect_success(resp).await?;
        let json: Value = resp.json().await?;
        parse_list(json)
    }

    /// Upload a checkup photo and create the log. The image analysis runs
    /// behind the endpoint; the returned record carries its diagnosis text.
    pub async fn create_health_log(
        &self,
        session: &Session,
        log: NewHealthLog,
    ) -> Result<HealthLog, Error> {
        let owner = Self::require_owner(session)?;
        let endpoint = format!(
            "{}/healthlog/createHealthLog",
            Self::base_api(&session.backend_url)
        );
        let mut form = multipart::Form::new()
            .text("user_id", owner.to_string())
            .text("plant_id", log.plant_id)
            .text("name", log.name)
            .text("dateOfDiagnosis", log.date_of_diagnosis.to_rfc3339());
        if let Some(comment) = log.comment {
            form = form.text("comment", comment);
        }
        form = attach_photo(form, "image", log.photo);

        let resp = Self::with_auth(self.http.post(&endpoint), session)
            .multipart(form)
            .send()
            .await?;
        let resp = Self::expect_success(resp).await?;
        let json: Value = resp.json().await?;
        serde_json::from_value(json).map_err(|e| Error::Decode(e.to_string()))
    }

    pub async fn tasks(&self, session: &Session) -> Result<Vec<Task>, Error> {
        let owner = Self::require_owner(session)?;
        let endpoint = format!(
            "{}/task/getTasksByUserId/{}",
            Self::base_api(&session.backend_url),
            owner
        );
        let resp = Self::with_auth(self.http.get(&endpoint), session).send().await?;
        let resp = Self::expect_success(resp).await?;
        let json: Value = resp.json().await?;
        parse_list(json)
    }

    /// Tasks still waiting to be done; completed ones are filtered out on
    /// the client, the backend returns everything.
    pub async fn pending_tasks(&self, session: &Session) -> Result<Vec<Task>, Error> {
        let mut tasks = self.tasks(session).await?;
        tasks.retain(Task::is_pending);
        Ok(tasks)
    }

    pub async fn create_task(&self, session: &Session, task: &NewTask) -> Result<Task, Error> {
        let endpoint = format!(
            "{}/task/createNewTask",
            Self::base_api(&session.backend_url)
        );
        let resp = Self::with_auth(self.http.post(&endpoint), session)
            .json(task)
            .send()
            .await?;
        let resp = Self::expect_success(resp).await?;
        let json: Value = resp.json().await?;
        serde_json::from_value(json).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Marking a task done deletes it; there is no separate completion
    /// endpoint on this backend.
    pub async fn delete_task(&self, session: &Session, task_id: &str) -> Result<(), Error> {
        let endpoint = format!(
            "{}/task/deleteTask/{}",
            Self::base_api(&session.backend_url),
            task_id
        );
        let resp = Self::with_auth(self.http.delete(&endpoint), session).send().await?;
        Self::expect_success(resp).await?;
        Ok(())
    }
}

fn attach_photo(form: multipart::Form, field: &str, photo: Option<UploadFile>) -> multipart::Form {
    match photo {
        Some(file) => {
            let part = multipart::Part::bytes(file.bytes).file_name(file.file_name);
            form.part(field.to_string(), part)
        }
        None => form,
    }
}

/// Pull the `{ token, <user_key>: {...} }` pair out of an auth response.
/// The sign-in lookup nests the account under `user`, registration under
/// `newUser`.
fn parse_auth_login(json: &Value, user_key: &str) -> Result<AuthLogin, Error> {
    let token = json
        .get("token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Decode("token missing from auth response".into()))?
        .to_string();
    let user_json = json
        .get(user_key)
        .cloned()
        .ok_or_else(|| Error::Decode(format!("{} missing from auth response", user_key)))?;
    let user: User = serde_json::from_value(user_json).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(AuthLogin { token, user })
}

/// Accept either `{ data: [...], totalPages: n }` or a bare `[...]` body.
fn parse_message_page(json: Value) -> Result<MessagePage, Error> {
    let total_pages = json
        .get("totalPages")
        .and_then(Value::as_u64)
        .map(|n| n as u32);
    let items_json = if json.is_array() {
        json
    } else if let Some(data) = json.get("data").cloned() {
        data
    } else {
        return Err(Error::Decode(
            "message page is neither array nor data-wrapped".into(),
        ));
    };
    let items: Vec<Message> =
        serde_json::from_value(items_json).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(MessagePage { items, total_pages })
}

/// Same tolerance for the list endpoints: some answer bare arrays, some
/// wrap them in `data`.
fn parse_list<T: serde::de::DeserializeOwned>(json: Value) -> Result<Vec<T>, Error> {
    let items_json = if json.is_array() {
        json
    } else if let Some(data) = json.get("data").cloned() {
        data
    } else {
        return Err(Error::Decode(
            "list response is neither array nor data-wrapped".into(),
        ));
    };
    serde_json::from_value(items_json).map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::AuthorKind;
    use serde_json::json;

    #[test]
    fn base_api_appends_once() {
        assert_eq!(ApiClient::base_api("https://x.dev"), "https://x.dev/api");
        assert_eq!(ApiClient::base_api("https://x.dev/"), "https://x.dev/api");
        assert_eq!(ApiClient::base_api("https://x.dev/api"), "https://x.dev/api");
    }

    #[test]
    fn message_page_accepts_data_wrapper() {
        let json = json!({
            "data": [{
                "_id": "m1",
                "user_id": "u1",
                "sent_By": "user",
                "message_content": "hi",
                "createdAt": "2024-05-01T10:00:00Z"
            }],
            "totalPages": 4
        });
        let page = parse_message_page(json).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, Some(4));
        assert_eq!(page.items[0].sent_by, AuthorKind::User);
    }

    #[test]
    fn message_page_accepts_bare_array() {
        let json = json!([{
            "user_id": null,
            "sent_By": "assistant",
            "message_content": "hello",
            "createdAt": "2024-05-01T10:00:05Z"
        }]);
        let page = parse_message_page(json).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, None);
        assert!(page.items[0].id.is_none());
    }

    #[test]
    fn message_page_rejects_objects_without_data() {
        let err = parse_message_page(json!({"weird": true})).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn auth_login_reads_nested_user() {
        let json = json!({
            "token": "tok",
            "user": {
                "_id": "u1",
                "name": "Ada",
                "email": "ada@example.com",
                "plantSpecies": ["Fern"],
                "createdAt": "2024-01-01T00:00:00Z"
            }
        });
        let login = parse_auth_login(&json, "user").unwrap();
        assert_eq!(login.token, "tok");
        assert_eq!(login.user.id, "u1");
    }

    #[test]
    fn missing_owner_maps_to_auth_error() {
        let session = Session::default();
        assert!(matches!(
            ApiClient::require_owner(&session),
            Err(Error::Auth(401))
        ));
    }
}
