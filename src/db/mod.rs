//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email reservations (keyed by normalized address)
    pub const USER_EMAILS: &str = "user_emails";
}
