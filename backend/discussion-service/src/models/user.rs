use serde::{Deserialize, Serialize};

/// Platform account of the caller, as carried by the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformUser {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl PlatformUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role("admin")
    }
}
