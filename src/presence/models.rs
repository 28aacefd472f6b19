use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Employee identifier as the roster reports it; numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmployeeKey {
    Number(i64),
    Text(String),
}

impl fmt::Display for EmployeeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmployeeKey::Number(n) => write!(f, "{n}"),
            EmployeeKey::Text(s) => f.write_str(s),
        }
    }
}

/// One roster line. Times are bare UTC strings; overtime figures are
/// computed by the service and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    #[serde(rename = "Matricule")]
    pub matricule: EmployeeKey,
    #[serde(rename = "Nom", default)]
    pub surname: String,
    #[serde(rename = "Prenom", default)]
    pub given_name: String,
    #[serde(rename = "Emploi", default)]
    pub post: String,
    #[serde(default)]
    pub entry_time: Option<String>,
    #[serde(default)]
    pub exit_time: Option<String>,
    #[serde(default)]
    pub daily_overtime: Option<String>,
    #[serde(default)]
    pub daily_amount: Option<serde_json::Value>,
    #[serde(default)]
    pub overtime: Option<String>,
    #[serde(default)]
    pub overtime_amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// One prior mark from an employee's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "Nom", default)]
    pub surname: String,
    #[serde(rename = "Prenom", default)]
    pub given_name: String,
    #[serde(default)]
    pub entry_time: Option<String>,
    #[serde(default)]
    pub exit_time: Option<String>,
    #[serde(default)]
    pub overtime: Option<String>,
    #[serde(default)]
    pub overtime_amount: Option<f64>,
}

/// Raw body of `POST /api/mark_presence/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkPresenceResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub entry_time: Option<String>,
    #[serde(default)]
    pub exit_time: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// FastAPI puts `HTTPException` text here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl MarkPresenceResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkStatus {
    Ok,
    Error,
}

/// Outcome of one presence submission. Entry/exit come from the server only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceMarkResult {
    pub status: MarkStatus,
    pub entry_time: Option<String>,
    pub exit_time: Option<String>,
    pub message: Option<String>,
    #[serde(skip)]
    pub failure: Option<ScanError>,
}

impl PresenceMarkResult {
    pub fn marked(entry_time: Option<String>, exit_time: Option<String>) -> Self {
        Self {
            status: MarkStatus::Ok,
            entry_time,
            exit_time,
            message: None,
            failure: None,
        }
    }

    pub fn failed(error: ScanError) -> Self {
        Self {
            status: MarkStatus::Error,
            entry_time: None,
            exit_time: None,
            message: Some(error.to_string()),
            failure: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == MarkStatus::Ok
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TimezoneBody<'a> {
    pub timezone: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PasswordBody<'a> {
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct StatusBody {
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_decodes_numeric_and_text_keys() {
        let json = r#"{"data":[
            {"Matricule": 12, "Nom": "Rakoto", "Prenom": "Jean", "Emploi": "Caissier",
             "entry_time": "2024-01-01 08:00:00", "exit_time": null,
             "daily_overtime": "0H30", "daily_amount": 2500, "overtime": "3H10",
             "overtime_amount": 15000},
            {"Matricule": "EMP-7", "Nom": "Rabe", "Prenom": "Lova", "Emploi": "Agent"}
        ]}"#;

        let envelope: DataEnvelope<EmployeeRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.len(), 2);
        assert_eq!(envelope.data[0].matricule, EmployeeKey::Number(12));
        assert_eq!(envelope.data[0].exit_time, None);
        assert_eq!(envelope.data[0].overtime_amount, Some(15000.0));
        assert_eq!(envelope.data[1].matricule.to_string(), "EMP-7");
        assert_eq!(envelope.data[1].entry_time, None);
    }

    #[test]
    fn missing_data_is_an_empty_roster() {
        let envelope: DataEnvelope<EmployeeRecord> = serde_json::from_str("{}").unwrap();
        assert!(envelope.data.is_empty());
    }

    #[test]
    fn mark_response_tolerates_fastapi_errors() {
        let body: MarkPresenceResponse =
            serde_json::from_str(r#"{"detail": "Employé introuvable"}"#).unwrap();
        assert!(!body.is_ok());
        assert_eq!(body.detail.as_deref(), Some("Employé introuvable"));
    }

    #[test]
    fn failed_result_carries_the_error_text() {
        let result = PresenceMarkResult::failed(ScanError::ApplicationError("already marked".into()));
        assert!(!result.is_ok());
        assert_eq!(result.message.as_deref(), Some("already marked"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json.get("failure").is_none());
    }
}
