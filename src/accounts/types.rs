use serde::{Deserialize, Serialize};

/// Which account store an identity was resolved from.
///
/// Serialized with the display names the chat log stores for `userType`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccountKind {
    Volunteer,
    #[serde(rename = "NGO")]
    Ngo,
}

impl AccountKind {
    /// Role string carried in bearer tokens.
    pub fn role(&self) -> &'static str {
        match self {
            AccountKind::Volunteer => "volunteer",
            AccountKind::Ngo => "ngo",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub availability: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ngo {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub mission_statement: String,
    #[serde(default)]
    pub areas_of_operation: String,
}

/// An authenticated user, resolved once per connection or request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub kind: AccountKind,
}
