use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,

    /// Fixed at registration; profile updates never send it.
    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,

    pub role: Role,

    /// Storage-relative path, resolved against the storage URL.
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    EventOrganizer,
    User,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::EventOrganizer => "Event Organizer",
            Role::User => "User",
        }
    }
}

/// Data of a successful `POST /auth/login`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        let role: Role = serde_json::from_str("\"event_organizer\"").unwrap();

        assert_eq!(role, Role::EventOrganizer);
        assert_eq!(role.label(), "Event Organizer");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_optional_fields() {
        let user: User = serde_json::from_str(
            r#"{"id":1,"name":"Budi","email":"budi@example.com","role":"user"}"#,
        )
        .unwrap();

        assert_eq!(user.phone, None);
        assert_eq!(user.profile_picture, None);
    }
}
