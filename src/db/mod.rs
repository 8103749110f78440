//! Database layer (MongoDB).

pub mod mongo;

pub use mongo::UserStore;

/// Collection names as constants.
pub mod collections {
    /// One document per user, keyed by `firebaseUID`
    pub const USERS: &str = "users";
}
