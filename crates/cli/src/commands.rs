use anyhow::{bail, Context};
use chrono::Duration;
use clap::Args;
use salon_models::{AuthResponse, UserProfile, UserProfileUpdate, UserRole};
use salon_session::{ProfileLookup, SessionState, SessionStore};
use salon_storage::KeyValueStore;
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Access token issued by the backend
    #[arg(long, required_unless_present = "response_json")]
    pub token: Option<String>,

    /// Credential scheme (defaults to Bearer)
    #[arg(long, default_value = "")]
    pub token_type: String,

    /// User profile as JSON
    #[arg(long, required_unless_present = "response_json")]
    pub user_json: Option<String>,

    /// Token lifetime in seconds
    #[arg(long, allow_hyphen_values = true)]
    pub expires_in: Option<i64>,

    /// Whole login/registration response body as JSON
    #[arg(long, conflicts_with_all = ["token", "user_json", "expires_in"])]
    pub response_json: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateUserArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone_number: Option<String>,

    #[arg(long)]
    pub role: Option<UserRole>,
}

impl From<&UpdateUserArgs> for UserProfileUpdate {
    fn from(args: &UpdateUserArgs) -> Self {
        Self {
            id: None,
            email: args.email.clone(),
            name: args.name.clone(),
            phone_number: args.phone_number.clone(),
            role: args.role,
        }
    }
}

pub fn login<S: KeyValueStore>(store: &SessionStore<S>, args: &LoginArgs) -> anyhow::Result<ExitCode> {
    let response = match &args.response_json {
        Some(raw) => serde_json::from_str::<AuthResponse>(raw).context("Invalid response JSON")?,
        None => {
            let (Some(token), Some(user_json)) = (&args.token, &args.user_json) else {
                bail!("--token and --user-json are required without --response-json");
            };
            let user: UserProfile =
                serde_json::from_str(user_json).context("Invalid user profile JSON")?;
            AuthResponse {
                access_token: token.clone(),
                token_type: Some(args.token_type.clone()),
                user,
                expires_in: args.expires_in,
            }
        }
    };

    if response.access_token.is_empty() {
        bail!("Refusing to store an empty access token");
    }

    store.store_auth_response(&response)?;
    if store.is_degraded() {
        tracing::warn!("Session storage is unavailable; the session was not persisted");
    }

    println!("Logged in as {} ({})", response.user.email, response.user.role);
    Ok(ExitCode::SUCCESS)
}

pub fn status<S: KeyValueStore>(store: &SessionStore<S>) -> anyhow::Result<ExitCode> {
    let state = store.state()?;
    println!("state:      {}", describe_state(state));

    match store.lookup_user()? {
        ProfileLookup::Present(user) => {
            println!("user:       {} <{}> ({})", user.name, user.email, user.role);
        }
        ProfileLookup::Absent => println!("user:       -"),
        ProfileLookup::Corrupt(reason) => println!("user:       unreadable ({})", reason),
    }

    if state != SessionState::Anonymous {
        println!("token type: {}", store.token_type()?);
    }
    if let Some(expires_at) = store.expires_at()? {
        println!("expires at: {}", expires_at.to_rfc3339());
    }
    if let Some(remaining) = store.time_remaining()? {
        println!("remaining:  {}", format_remaining(remaining));
    }

    Ok(ExitCode::SUCCESS)
}

pub fn header<S: KeyValueStore>(store: &SessionStore<S>) -> anyhow::Result<ExitCode> {
    match store.auth_header()? {
        Some(value) => {
            println!("{}", value);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No usable session; send the request unauthenticated");
            Ok(ExitCode::FAILURE)
        }
    }
}

pub fn update_user<S: KeyValueStore>(
    store: &SessionStore<S>,
    args: &UpdateUserArgs,
) -> anyhow::Result<ExitCode> {
    let update = UserProfileUpdate::from(args);
    if update.is_empty() {
        bail!("Nothing to update; pass at least one field");
    }

    match store.update_user_data(&update)? {
        Some(user) => {
            println!("Updated {} <{}> ({})", user.name, user.email, user.role);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No stored profile to update");
            Ok(ExitCode::FAILURE)
        }
    }
}

pub fn logout<S: KeyValueStore>(store: &SessionStore<S>) -> anyhow::Result<ExitCode> {
    store
        .clear_session()
        .context("Logout did not reach session storage; the stored session is still present")?;
    println!("Logged out");
    Ok(ExitCode::SUCCESS)
}

fn describe_state(state: SessionState) -> &'static str {
    match state {
        SessionState::Active => "active",
        SessionState::Expired => "expired",
        SessionState::Anonymous => "anonymous",
    }
}

fn format_remaining(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salon_session::SessionConfig;
    use salon_storage::{DisabledStore, MemoryStore};

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::seconds(42)), "42s");
        assert_eq!(format_remaining(Duration::seconds(125)), "2m 05s");
        assert_eq!(format_remaining(Duration::seconds(3723)), "1h 02m 03s");
        assert_eq!(format_remaining(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_login_then_logout() {
        let store = SessionStore::new(MemoryStore::new(), SessionConfig::default());
        let args = LoginArgs {
            token: Some("tok".to_string()),
            token_type: String::new(),
            user_json: Some(
                r#"{"email":"desk@salon.test","name":"Desk","phoneNumber":"1","role":"FRONT_DESK"}"#
                    .to_string(),
            ),
            expires_in: Some(60),
            response_json: None,
        };

        login(&store, &args).unwrap();
        assert_eq!(store.auth_header().unwrap(), Some("Bearer tok".to_string()));

        logout(&store).unwrap();
        assert!(!store.has_valid_session().unwrap());
    }

    #[test]
    fn test_logout_fails_when_storage_is_unavailable() {
        let store = SessionStore::new(DisabledStore, SessionConfig::default());

        let err = logout(&store).unwrap_err();

        assert!(err.to_string().contains("still present"));
        assert!(store.is_degraded());
    }

    #[test]
    fn test_login_rejects_empty_token() {
        let store = SessionStore::new(MemoryStore::new(), SessionConfig::default());
        let args = LoginArgs {
            token: None,
            token_type: String::new(),
            user_json: None,
            expires_in: None,
            response_json: Some(
                r#"{"accessToken":"","user":{"email":"a@b.c","name":"A","phoneNumber":"1","role":"ADMIN"}}"#
                    .to_string(),
            ),
        };

        assert!(login(&store, &args).is_err());
        assert_eq!(store.access_token().unwrap(), None);
    }

    #[test]
    fn test_update_args_convert() {
        let args = UpdateUserArgs {
            name: Some("Renamed".to_string()),
            email: None,
            phone_number: None,
            role: Some(UserRole::Technician),
        };

        let update = UserProfileUpdate::from(&args);
        assert_eq!(update.name.as_deref(), Some("Renamed"));
        assert_eq!(update.role, Some(UserRole::Technician));
        assert!(update.email.is_none());
    }
}
