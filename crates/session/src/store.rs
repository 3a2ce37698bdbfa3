use crate::clock::{Clock, SystemClock};
use crate::config::{SessionConfig, StoragePolicy, DEFAULT_TOKEN_TYPE};
use crate::error::Result;
use crate::events::{SessionEvent, SessionNotifier};
use chrono::{DateTime, Duration, Utc};
use salon_models::{AuthResponse, UserProfile, UserProfileUpdate};
use salon_storage::{storage_key, KeyValueStore, MemoryStore, StorageError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Fully qualified storage keys for one session namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    pub access_token: String,
    pub token_type: String,
    pub user_data: String,
    pub token_expiry: String,
}

impl SessionKeys {
    pub fn new(prefix: &str) -> Self {
        Self {
            access_token: storage_key(prefix, "access_token"),
            token_type: storage_key(prefix, "token_type"),
            user_data: storage_key(prefix, "user_data"),
            token_expiry: storage_key(prefix, "token_expiry"),
        }
    }

    fn all(&self) -> [&str; 4] {
        [
            self.access_token.as_str(),
            self.token_type.as_str(),
            self.user_data.as_str(),
            self.token_expiry.as_str(),
        ]
    }
}

/// Result of reading the stored profile. Reads never fail on bad data;
/// `Corrupt` keeps the reason around for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileLookup {
    Present(UserProfile),
    Absent,
    Corrupt(String),
}

impl ProfileLookup {
    pub fn into_profile(self) -> Option<UserProfile> {
        match self {
            ProfileLookup::Present(profile) => Some(profile),
            ProfileLookup::Absent | ProfileLookup::Corrupt(_) => None,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, ProfileLookup::Corrupt(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Token present and not yet expired.
    Active,
    /// A token is stored but its expiry is missing or has passed.
    Expired,
    /// Nothing stored.
    Anonymous,
}

/// All four session fields read back together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn auth_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Single source of truth for the authenticated session, persisted in a
/// [`KeyValueStore`] under four namespaced keys.
///
/// Expiry is compared against the clock on every call; nothing is cached.
pub struct SessionStore<S> {
    backend: S,
    fallback: MemoryStore,
    degraded: AtomicBool,
    keys: SessionKeys,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    notifier: SessionNotifier,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S, config: SessionConfig) -> Self {
        Self {
            backend,
            fallback: MemoryStore::new(),
            degraded: AtomicBool::new(false),
            keys: SessionKeys::new(&config.key_prefix),
            config,
            clock: Arc::new(SystemClock),
            notifier: SessionNotifier::default(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Share change notifications with other stores over the same storage.
    pub fn with_notifier(mut self, notifier: SessionNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.notifier.subscribe()
    }

    /// True once the backend failed and the session moved to memory.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Persist a new session, replacing any previous one. An empty
    /// `token_type` is stored as `Bearer`; a missing lifetime uses the
    /// configured default.
    pub fn store_session(
        &self,
        access_token: &str,
        token_type: &str,
        user: &UserProfile,
        lifetime_seconds: Option<i64>,
    ) -> Result<()> {
        let token_type = if token_type.trim().is_empty() {
            DEFAULT_TOKEN_TYPE
        } else {
            token_type
        };
        let expires_at = self.expiry_for(lifetime_seconds);
        let user_data = serde_json::to_string(user)?;
        let expiry = expires_at.timestamp_millis().to_string();

        let keys = &self.keys;
        self.with_storage(|store| {
            store.set_many(&[
                (keys.access_token.as_str(), access_token),
                (keys.token_type.as_str(), token_type),
                (keys.user_data.as_str(), user_data.as_str()),
                (keys.token_expiry.as_str(), expiry.as_str()),
            ])
        })?;

        tracing::debug!("Stored session for {} (expires {})", user.email, expires_at);
        self.notifier.publish(SessionEvent::Stored {
            email: user.email.clone(),
        });
        Ok(())
    }

    /// Store the body of a successful login or registration call.
    pub fn store_auth_response(&self, response: &AuthResponse) -> Result<()> {
        self.store_session(
            &response.access_token,
            response.token_type.as_deref().unwrap_or_default(),
            &response.user,
            response.expires_in,
        )
    }

    /// Remove all four fields. Safe to call with nothing stored.
    ///
    /// The removal always goes to the backend, even after the store has
    /// degraded to memory, and a backend failure is returned under either
    /// policy: a logout that left the token in durable storage must not look
    /// successful. The in-memory copy is cleared regardless, so this store
    /// reads as logged out afterwards.
    pub fn clear_session(&self) -> Result<()> {
        let keys = self.keys.all();
        self.fallback.remove_many(&keys)?;

        if let Err(e) = self.backend.remove_many(&keys) {
            tracing::error!("Session removal did not reach storage: {}", e);
            if self.config.storage_policy == StoragePolicy::DegradeToMemory {
                self.mark_degraded(&e);
            }
            return Err(e.into());
        }

        tracing::debug!("Cleared session");
        self.notifier.publish(SessionEvent::Cleared);
        Ok(())
    }

    /// Merge `update` over the stored profile. Leaves token and expiry alone.
    /// Returns the merged profile, or `None` when there was no usable profile
    /// to update.
    pub fn update_user_data(&self, update: &UserProfileUpdate) -> Result<Option<UserProfile>> {
        let current = match self.lookup_user()? {
            ProfileLookup::Present(profile) => profile,
            ProfileLookup::Absent | ProfileLookup::Corrupt(_) => {
                tracing::debug!("No stored profile to update");
                return Ok(None);
            }
        };

        let merged = update.apply_to(&current);
        let user_data = serde_json::to_string(&merged)?;
        // Only overwrite a profile that is still there; a logout in between wins
        let written = self.with_storage(|store| store.replace(&self.keys.user_data, &user_data))?;
        if !written {
            tracing::debug!("Session cleared before profile update was written");
            return Ok(None);
        }

        tracing::debug!("Updated stored profile for {}", merged.email);
        self.notifier.publish(SessionEvent::ProfileUpdated);
        Ok(Some(merged))
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Raw stored token, with no expiry check.
    pub fn access_token(&self) -> Result<Option<String>> {
        self.with_storage(|store| store.get(&self.keys.access_token))
    }

    /// Stored scheme without the `Bearer` fallback.
    pub fn stored_token_type(&self) -> Result<Option<String>> {
        self.with_storage(|store| store.get(&self.keys.token_type))
    }

    pub fn token_type(&self) -> Result<String> {
        Ok(self
            .stored_token_type()?
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()))
    }

    pub fn lookup_user(&self) -> Result<ProfileLookup> {
        let Some(raw) = self.with_storage(|store| store.get(&self.keys.user_data))? else {
            return Ok(ProfileLookup::Absent);
        };

        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(profile) => Ok(ProfileLookup::Present(profile)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable stored profile: {}", e);
                Ok(ProfileLookup::Corrupt(e.to_string()))
            }
        }
    }

    /// Stored profile; corrupt data reads as `None`.
    pub fn user(&self) -> Result<Option<UserProfile>> {
        Ok(self.lookup_user()?.into_profile())
    }

    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.with_storage(|store| store.get(&self.keys.token_expiry))? else {
            return Ok(None);
        };

        let parsed = raw
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        if parsed.is_none() {
            tracing::warn!("Ignoring unreadable token expiry {:?}", raw);
        }
        Ok(parsed)
    }

    /// Canonical "is logged in" check. No side effects.
    pub fn has_valid_session(&self) -> Result<bool> {
        if !self.has_token()? {
            return Ok(false);
        }
        Ok(match self.expires_at()? {
            Some(expires_at) => self.clock.now() < expires_at,
            None => false,
        })
    }

    /// True when no expiry is stored or it has passed. Does not look at the
    /// token, so "never logged in" also reads as expired.
    pub fn is_token_expired(&self) -> Result<bool> {
        Ok(match self.expires_at()? {
            Some(expires_at) => self.clock.now() >= expires_at,
            None => true,
        })
    }

    /// `"<type> <token>"`, only while the token exists and has not expired.
    pub fn auth_header(&self) -> Result<Option<String>> {
        let Some(token) = self.access_token()?.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        if self.is_token_expired()? {
            return Ok(None);
        }
        Ok(Some(format!("{} {}", self.token_type()?, token)))
    }

    /// Time left before expiry, or `None` when absent or already expired.
    pub fn time_remaining(&self) -> Result<Option<Duration>> {
        if !self.has_token()? {
            return Ok(None);
        }
        Ok(self
            .expires_at()?
            .map(|expires_at| expires_at - self.clock.now())
            .filter(|remaining| *remaining > Duration::zero()))
    }

    pub fn state(&self) -> Result<SessionState> {
        if self.has_valid_session()? {
            Ok(SessionState::Active)
        } else if self.has_token()? {
            Ok(SessionState::Expired)
        } else {
            Ok(SessionState::Anonymous)
        }
    }

    /// All four fields, or `None` if any of them is missing or unreadable.
    /// Does not check expiry.
    pub fn session(&self) -> Result<Option<Session>> {
        let access_token = self.access_token()?;
        let user = self.lookup_user()?;
        let expires_at = self.expires_at()?;

        match (access_token, user, expires_at) {
            (Some(access_token), ProfileLookup::Present(user), Some(expires_at)) => {
                Ok(Some(Session {
                    access_token,
                    token_type: self.token_type()?,
                    user,
                    expires_at,
                }))
            }
            (None, ProfileLookup::Absent, None) => Ok(None),
            (token, user, expiry) => {
                tracing::warn!(
                    "Incomplete session in storage: token={}, profile={}, expiry={}",
                    token.is_some(),
                    match user {
                        ProfileLookup::Present(_) => "present",
                        ProfileLookup::Absent => "absent",
                        ProfileLookup::Corrupt(_) => "corrupt",
                    },
                    expiry.is_some()
                );
                Ok(None)
            }
        }
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn has_token(&self) -> Result<bool> {
        Ok(self.access_token()?.is_some_and(|t| !t.is_empty()))
    }

    fn expiry_for(&self, lifetime_seconds: Option<i64>) -> DateTime<Utc> {
        let lifetime = match lifetime_seconds {
            Some(seconds) => Duration::try_seconds(seconds).unwrap_or(if seconds < 0 {
                Duration::MIN
            } else {
                Duration::MAX
            }),
            None => self.config.default_lifetime,
        };

        let now = self.clock.now();
        now.checked_add_signed(lifetime).unwrap_or(if lifetime < Duration::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
    }

    /// Run `op` against the active backend, applying the storage policy
    /// when the backend fails.
    fn with_storage<T, F>(&self, op: F) -> Result<T>
    where
        F: Fn(&dyn KeyValueStore) -> salon_storage::Result<T>,
    {
        if self.is_degraded() {
            return Ok(op(&self.fallback)?);
        }

        match op(&self.backend) {
            Ok(value) => Ok(value),
            Err(e) => match self.config.storage_policy {
                StoragePolicy::FailLoudly => Err(e.into()),
                StoragePolicy::DegradeToMemory => {
                    self.mark_degraded(&e);
                    Ok(op(&self.fallback)?)
                }
            },
        }
    }

    fn mark_degraded(&self, err: &StorageError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(
                "Session storage failed, keeping session in memory from now on: {}",
                err
            );
        }
    }
}
