use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend user identifier. The API has served both numeric and string ids.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UserId::Number(id) => write!(f, "{}", id),
            UserId::Text(id) => f.write_str(id),
        }
    }
}

/// Profile of the logged-in user as returned by `/auth/login` and `/users/me`.
///
/// Fields the client does not interpret are kept in `extra` so the persisted
/// profile matches what the server sent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(
        rename = "userID",
        alias = "id",
        alias = "userId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<UserId>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(
        rename = "phoneNumber",
        alias = "phone",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn new(first_name: String, last_name: String, email: String, role: Role) -> Self {
        UserProfile {
            id: None,
            first_name,
            last_name,
            email,
            role,
            phone: None,
            extra: Map::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
