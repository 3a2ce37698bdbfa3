use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Staff and customer roles known to the salon backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Manager,
    FrontDesk,
    Technician,
    Customer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Manager => "MANAGER",
            UserRole::FrontDesk => "FRONT_DESK",
            UserRole::Technician => "TECHNICIAN",
            UserRole::Customer => "CUSTOMER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown user role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for UserRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "ADMIN" => Ok(UserRole::Admin),
            "MANAGER" => Ok(UserRole::Manager),
            "FRONT_DESK" => Ok(UserRole::FrontDesk),
            "TECHNICIAN" => Ok(UserRole::Technician),
            "CUSTOMER" => Ok(UserRole::Customer),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// Snapshot of the signed-in user as returned by login/registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    pub name: String,
    pub phone_number: String,
    pub role: UserRole,
}

/// Partial profile refresh. `None` fields keep their previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl UserProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.email.is_none()
            && self.name.is_none()
            && self.phone_number.is_none()
            && self.role.is_none()
    }

    /// Shallow merge over `current`.
    pub fn apply_to(&self, current: &UserProfile) -> UserProfile {
        UserProfile {
            id: self.id.clone().or_else(|| current.id.clone()),
            email: self.email.clone().unwrap_or_else(|| current.email.clone()),
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            phone_number: self
                .phone_number
                .clone()
                .unwrap_or_else(|| current.phone_number.clone()),
            role: self.role.unwrap_or(current.role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> UserProfile {
        UserProfile {
            id: Some("42".to_string()),
            email: "jane@example.com".to_string(),
            name: "Jane Doe".to_string(),
            phone_number: "555-0100".to_string(),
            role: UserRole::FrontDesk,
        }
    }

    #[test]
    fn test_profile_wire_format() {
        let json = serde_json::to_value(jane()).unwrap();

        assert_eq!(json["phoneNumber"], "555-0100");
        assert_eq!(json["role"], "FRONT_DESK");
        assert_eq!(json["id"], "42");
    }

    #[test]
    fn test_profile_without_id() {
        let raw = r#"{"email":"a@b.c","name":"A","phoneNumber":"1","role":"CUSTOMER"}"#;
        let profile: UserProfile = serde_json::from_str(raw).unwrap();

        assert_eq!(profile.id, None);
        assert_eq!(profile.role, UserRole::Customer);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let raw = r#"{"email":"a@b.c","name":"A","phoneNumber":"1","role":"OWNER"}"#;
        assert!(serde_json::from_str::<UserProfile>(raw).is_err());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("front-desk".parse::<UserRole>(), Ok(UserRole::FrontDesk));
        assert_eq!(" Technician ".parse::<UserRole>(), Ok(UserRole::Technician));
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_update_is_shallow_merge() {
        let update = UserProfileUpdate {
            name: Some("New Name".to_string()),
            role: Some(UserRole::Manager),
            ..Default::default()
        };

        let merged = update.apply_to(&jane());

        assert_eq!(merged.name, "New Name");
        assert_eq!(merged.role, UserRole::Manager);
        assert_eq!(merged.email, "jane@example.com");
        assert_eq!(merged.id, Some("42".to_string()));
        assert!(!update.is_empty());
        assert!(UserProfileUpdate::default().is_empty());
    }
}
