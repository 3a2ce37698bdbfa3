use crate::user::UserProfile;
use serde::{Deserialize, Serialize};

/// Body of a successful login or registration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: UserProfile,
    /// Token lifetime in seconds.
    #[serde(default, alias = "expiresInSeconds")]
    pub expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserRole;

    #[test]
    fn test_parse_login_response() {
        let raw = r#"{
            "accessToken": "abc.def",
            "tokenType": "Bearer",
            "expiresIn": 7200,
            "user": {
                "id": "7",
                "email": "owner@salon.test",
                "name": "Owner",
                "phoneNumber": "555-0199",
                "role": "ADMIN"
            }
        }"#;

        let response: AuthResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(response.access_token, "abc.def");
        assert_eq!(response.token_type.as_deref(), Some("Bearer"));
        assert_eq!(response.expires_in, Some(7200));
        assert_eq!(response.user.role, UserRole::Admin);
    }

    #[test]
    fn test_optional_fields_default() {
        let raw = r#"{
            "accessToken": "tok",
            "user": {"email":"c@d.e","name":"C","phoneNumber":"2","role":"CUSTOMER"}
        }"#;

        let response: AuthResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(response.token_type, None);
        assert_eq!(response.expires_in, None);
    }
}
