//! Authenticated user profile

use serde::{Deserialize, Serialize};

/// Profile of the user owning the configured API token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Me {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_me_deserialize() {
        let json = r#"{"name": "Orga Person", "email": "orga@example.org"}"#;
        let me: Me = serde_json::from_str(json).unwrap();
        assert_eq!(me.email, "orga@example.org");
        assert!(me.locale.is_none());
    }
}
