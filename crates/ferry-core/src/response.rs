//! JSON response envelope used by front ends

use serde::Serialize;

use crate::{ErrorKind, FerryError};

/// `{success, message, data?, count?, error?}` envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: Option<T>, count: u64) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            count: Some(count),
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: &FerryError) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            count: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let resp = ApiResponse::success("Retrieved tables successfully", Some(vec!["a"]), 1);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 1);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failure_envelope() {
        let err = FerryError::NotFound("data.csv".into());
        let resp: ApiResponse<()> = ApiResponse::failure("Failed to get file schema", &err);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Not found: data.csv");
        assert_eq!(json["error_kind"], "not_found");
        assert!(json.get("data").is_none());
    }
}
