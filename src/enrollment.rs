use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const SERVICE: &str = "flexge";

/// A student as reported by the enrollment platform. The platform owns this
/// record; nothing here is persisted locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub last_access: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct StudentPage {
    #[serde(default)]
    docs: Vec<StudentRecord>,
}

/// Grammar topic a student has studied, with the error rate the platform
/// measured for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudiedGrammar {
    pub name: String,
    pub error_percentage: f64,
}

/// Per-student access mutation. The remote side treats repeated applications
/// of the same action as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessAction {
    Enable,
    Disable,
}

impl AccessAction {
    fn as_path(self) -> &'static str {
        match self {
            AccessAction::Enable => "enable",
            AccessAction::Disable => "disable",
        }
    }
}

/// Client for the Flexge partner API (student enrollment platform).
#[derive(Clone)]
pub struct FlexgeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FlexgeClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create Flexge client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Fetches one page of the student list.
    ///
    /// `Ok(None)` means a successful response with no documents, i.e. the end
    /// of pagination. A non-success status is a `RemoteApi` error and is not
    /// folded into end-of-data, so callers can tell a transient fetch failure
    /// apart from list exhaustion.
    pub async fn list_students(&self, page: u32) -> Result<Option<Vec<StudentRecord>>, AppError> {
        let url = format!("{}/students?page={}", self.base_url, page);
        tracing::debug!("Fetching student page {} from Flexge", page);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }

        let page_data: StudentPage = response
            .json()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if page_data.docs.is_empty() {
            Ok(None)
        } else {
            Ok(Some(page_data.docs))
        }
    }

    /// Finds a student by email with a linear page walk, case-insensitive.
    ///
    /// O(total students / page size); acceptable for the small datasets this
    /// system serves. The partner API offers no filtered query, so all call
    /// sites go through here rather than baking the scan in themselves.
    pub async fn find_student_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StudentRecord>, AppError> {
        let needle = email.trim();
        let mut page = 1;
        while let Some(students) = self.list_students(page).await? {
            if let Some(student) = students
                .into_iter()
                .find(|s| s.email.eq_ignore_ascii_case(needle))
            {
                return Ok(Some(student));
            }
            page += 1;
        }
        Ok(None)
    }

    /// Enables or disables a student's access.
    pub async fn set_student_access(
        &self,
        student_id: &str,
        action: AccessAction,
    ) -> Result<(), AppError> {
        let url = format!("{}/students/{}", self.base_url, action.as_path());
        tracing::info!("Applying '{}' to student {}", action.as_path(), student_id);

        let response = self
            .client
            .patch(&url)
            .header("x-api-key", &self.api_key)
            .json(&json!({ "students": [student_id] }))
            .send()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }

        Ok(())
    }

    /// Lists the grammar topics a student has studied, with error rates.
    pub async fn list_studied_grammars(
        &self,
        student_id: &str,
    ) -> Result<Vec<StudiedGrammar>, AppError> {
        let url = format!(
            "{}/students/{}/studied-grammars?page=1",
            self.base_url, student_id
        );
        tracing::debug!("Fetching studied grammars for student {}", student_id);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }

        let grammars: Vec<StudiedGrammar> = response
            .json()
            .await
            .map_err(|e| AppError::remote(SERVICE, e))?;

        Ok(grammars)
    }
}

async fn remote_failure(response: reqwest::Response) -> AppError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    AppError::RemoteApi {
        service: SERVICE,
        status,
        body,
    }
}
