pub mod auth;
pub mod user;

// Re-export commonly used types
pub use auth::AuthResponse;
pub use user::{ParseRoleError, UserProfile, UserProfileUpdate, UserRole};
