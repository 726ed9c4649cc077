//! Random nicknames for users who do not pick one.

/// Generate a two-word nickname like `blithe-otter`.
#[must_use]
pub fn generate() -> String {
    petname::Petnames::default().generate_one(2, "-")
}
