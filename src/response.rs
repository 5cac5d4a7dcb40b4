//! Wire envelopes exchanged with the backend on mutations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reply to create (POST) and update (PUT): `{status: "success", item: {id, ...}}` or an error envelope.
#[derive(Debug, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub item: Option<Value>,
}

impl SaveResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }

    /// `item.id`, when present.
    pub fn item_id(&self) -> Option<&Value> {
        self.item.as_ref().and_then(|i| i.get("id")).filter(|v| !v.is_null())
    }
}

/// Reply to deleting one resource.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
}

/// Body of the bulk-delete request.
#[derive(Debug, Serialize)]
pub struct DeleteManyRequest<'a, T: Serialize> {
    pub ids: &'a [T],
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_response_success_and_item_id() {
        let r: SaveResponse = serde_json::from_value(json!({"status": "success", "item": {"id": 4}})).unwrap();
        assert!(r.is_success());
        assert_eq!(r.item_id(), Some(&json!(4)));

        let r: SaveResponse = serde_json::from_value(json!({"status": "error", "message": "nope"})).unwrap();
        assert!(!r.is_success());
        assert!(r.item_id().is_none());
    }

    #[test]
    fn delete_envelopes() {
        let r: DeleteResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!r.success);
        let body = serde_json::to_value(DeleteManyRequest { ids: &[1, 2] }).unwrap();
        assert_eq!(body, json!({"ids": [1, 2]}));
    }
}
