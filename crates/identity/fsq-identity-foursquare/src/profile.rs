//! Normalized view over the Foursquare user document.

use serde_json::Value;

/// Flattened profile extracted from the `response.user` document.
///
/// Every field is optional: the provider omits what the user has not set,
/// and one missing field never disturbs the others. The full user document
/// is kept verbatim in `raw` so hosts can map attributes this view does not
/// surface.
#[derive(Debug, Clone, Default)]
pub struct FoursquareProfile {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub home_city: Option<String>,
    pub bio: Option<String>,
    pub photo: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub raw: Value,
}

impl FoursquareProfile {
    pub fn from_user(user: Value) -> Self {
        // The contact block is its own sub-document; read it independently
        // so a missing or partial block degrades only its own fields.
        let contact = user.get("contact");

        Self {
            id: string_field(&user, "id"),
            first_name: string_field(&user, "firstName"),
            last_name: string_field(&user, "lastName"),
            gender: string_field(&user, "gender"),
            home_city: string_field(&user, "homeCity"),
            bio: string_field(&user, "bio"),
            photo: string_field(&user, "photo"),
            phone: contact.and_then(|c| string_field(c, "phone")),
            email: contact.and_then(|c| string_field(c, "email")),
            twitter: contact.and_then(|c| string_field(c, "twitter")),
            facebook: contact.and_then(|c| string_field(c, "facebook")),
            raw: user,
        }
    }

    /// Display name derived from the first and last names, skipping
    /// whichever is absent.
    pub fn display_name(&self) -> String {
        let mut parts = Vec::new();
        if let Some(first) = self.first_name.as_deref().filter(|s| !s.trim().is_empty()) {
            parts.push(first);
        }
        if let Some(last) = self.last_name.as_deref().filter(|s| !s.trim().is_empty()) {
            parts.push(last);
        }
        parts.join(" ")
    }

    /// Public profile page for this user.
    pub fn link(&self) -> Option<String> {
        self.id
            .as_ref()
            .map(|id| format!("https://foursquare.com/user/{id}"))
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        // Numbers and nested documents are kept as their JSON text.
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_a_complete_user_document() {
        let profile = FoursquareProfile::from_user(json!({
            "id": "42",
            "firstName": "A",
            "lastName": "B",
            "gender": "none",
            "homeCity": "Berlin",
            "bio": "hello",
            "contact": {
                "phone": "555-0100",
                "email": "a.b@example.com",
                "twitter": "ab",
                "facebook": "100042"
            }
        }));

        assert_eq!(profile.id.as_deref(), Some("42"));
        assert_eq!(profile.display_name(), "A B");
        assert_eq!(profile.email.as_deref(), Some("a.b@example.com"));
        assert_eq!(profile.phone.as_deref(), Some("555-0100"));
        assert_eq!(
            profile.link().as_deref(),
            Some("https://foursquare.com/user/42")
        );
    }

    #[test]
    fn partial_contact_block_keeps_sibling_fields() {
        let profile = FoursquareProfile::from_user(json!({
            "id": "42",
            "contact": {
                "email": "a.b@example.com",
                "twitter": "ab",
                "facebook": "100042"
            }
        }));

        assert_eq!(profile.phone, None);
        assert_eq!(profile.email.as_deref(), Some("a.b@example.com"));
        assert_eq!(profile.twitter.as_deref(), Some("ab"));
        assert_eq!(profile.facebook.as_deref(), Some("100042"));
    }

    #[test]
    fn missing_contact_block_degrades_to_empty_fields() {
        let profile = FoursquareProfile::from_user(json!({
            "id": "42",
            "firstName": "A"
        }));

        assert_eq!(profile.phone, None);
        assert_eq!(profile.email, None);
        assert_eq!(profile.twitter, None);
        assert_eq!(profile.facebook, None);
        assert_eq!(profile.display_name(), "A");
    }

    #[test]
    fn numeric_and_nested_fields_become_text() {
        let profile = FoursquareProfile::from_user(json!({
            "id": 42,
            "photo": { "prefix": "https://irs0.4sqi.net/img/user/", "suffix": "/photo.jpg" }
        }));

        assert_eq!(profile.id.as_deref(), Some("42"));
        assert!(profile.photo.unwrap().contains("prefix"));
    }

    #[test]
    fn raw_document_is_retained_verbatim() {
        let user = json!({ "id": "42", "badges": { "count": 3 } });
        let profile = FoursquareProfile::from_user(user.clone());

        assert_eq!(profile.raw, user);
    }
}
