//! Display-identity derivation from blessing names.
//!
//! A blessing like `idp/alice@example.com/laptop` contains an email-shaped
//! component; that component is the user's display name. Multiple client
//! instances carrying the same blessing therefore present as one member.

/// The first `/`-separated component of the blessing containing exactly one
/// `@`, if any. The detection is deliberately crude.
pub fn short_name(blessing: &str) -> Option<&str> {
    blessing
        .split('/')
        .find(|part| part.matches('@').count() == 1)
}

/// Display identity for a set of blessings: the first short name found,
/// the first blessing verbatim when none of them has one, or `"unknown"`
/// for an empty set.
pub fn first_short_name(blessings: &[String]) -> String {
    if blessings.is_empty() {
        return "unknown".to_string();
    }
    blessings
        .iter()
        .find_map(|b| short_name(b))
        .unwrap_or(&blessings[0])
        .to_string()
}
