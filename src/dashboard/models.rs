use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backup::BackupInfo;
use crate::records::Record;

/// Reply to a public form submission
#[derive(Serialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: String,
    pub id: Value,
}

/// Reply to a single-record delete
#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub data: Record,
}

/// Batch delete request
#[derive(Deserialize)]
pub struct BatchDeleteRequest {
    #[serde(default)]
    pub ids: Vec<Value>,
}

#[derive(Serialize)]
pub struct BatchDeleteResponse {
    pub deleted: usize,
    pub message: String,
}

/// Import request: an array of records, appended unless `replace` is set
#[derive(Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub replace: bool,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub imported: usize,
    pub total: usize,
    pub message: String,
}

#[derive(Serialize)]
pub struct BackupResponse {
    pub success: bool,
    pub message: String,
    pub data: BackupInfo,
}

#[derive(Serialize)]
pub struct BackupListResponse {
    pub success: bool,
    pub data: Vec<BackupInfo>,
}

/// Query parameters for trends
#[derive(Deserialize)]
pub struct TrendsQuery {
    pub days: Option<String>,
}

/// Query parameters for search
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub course: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Query parameters for export
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub format: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub course: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Stringify ids sent by the dashboard; numbers and strings are both accepted.
pub fn id_keys(ids: &[Value]) -> Vec<String> {
    ids.iter()
        .filter_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_delete_request_mixed_ids() {
        let req: BatchDeleteRequest =
            serde_json::from_str(r#"{"ids":[1760000000000,"abc",null,""]}"#).unwrap();
        assert_eq!(id_keys(&req.ids), ["1760000000000", "abc"]);
    }

    #[test]
    fn test_batch_delete_request_defaults_empty() {
        let req: BatchDeleteRequest = serde_json::from_str("{}").unwrap();
        assert!(req.ids.is_empty());
    }

    #[test]
    fn test_import_request_defaults() {
        let req: ImportRequest = serde_json::from_str(r#"{"data":[{"id":1}]}"#).unwrap();
        assert!(!req.replace);
        assert!(req.data.is_array());

        let req: ImportRequest = serde_json::from_str("{}").unwrap();
        assert!(req.data.is_null());
    }

    #[test]
    fn test_search_query_camel_case() {
        let query: SearchQuery =
            serde_json::from_value(json!({"q": "li", "dateFrom": "2026-10-01"})).unwrap();
        assert_eq!(query.q.as_deref(), Some("li"));
        assert_eq!(query.date_from.as_deref(), Some("2026-10-01"));
        assert!(query.date_to.is_none());
    }

    #[test]
    fn test_submission_response_serialization() {
        let json = serde_json::to_string(&SubmissionResponse {
            success: true,
            message: "ok".to_string(),
            id: json!(42),
        })
        .unwrap();
        assert_eq!(json, r#"{"success":true,"message":"ok","id":42}"#);
    }
}
