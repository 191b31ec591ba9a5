//! bucketlist/crates/bl-core/src/lib.rs
//!
//! Visibility rules, moderation banner projection and the backend ports
//! they are evaluated against.

pub mod error;
pub mod models;
pub mod moderation;
pub mod scope;
pub mod traits;
pub mod visibility;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;

    #[test]
    fn test_anonymous_viewer_is_never_an_owner() {
        let owner = UserId::new();
        assert!(!Viewer::Anonymous.is(owner));
        assert!(Viewer::Account(owner).is(owner));
        assert_eq!(Viewer::Anonymous.id(), None);
    }

    #[test]
    fn test_privacy_level_parsing_is_case_insensitive() {
        assert_eq!(" Friends ".parse::<PrivacyLevel>().unwrap(), PrivacyLevel::Friends);
        assert!("".parse::<PrivacyLevel>().is_err());
        assert!("mutual".parse::<Relationship>().is_err());
    }
}
