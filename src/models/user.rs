use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Publisher,
    Admin,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Publisher => "publisher",
            Role::Admin => "admin",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "publisher" => Ok(Role::Publisher),
            "admin" => Ok(Role::Admin),
            "guest" => Ok(Role::Guest),
            other => Err(format!("unknown role `{}`", other)),
        }
    }
}

/// The signed-in account as reported by `GET /user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_user() {
        let user: User = serde_json::from_str(
            r#"{"id": 3, "name": "Ada", "email": "ada@example.com", "role": "publisher"}"#,
        )
        .unwrap();
        assert_eq!(user.role, Role::Publisher);
        assert_eq!(user.name, "Ada");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = serde_json::from_str::<User>(
            r#"{"id": 3, "name": "Ada", "email": "ada@example.com", "role": "root"}"#,
        );
        assert!(result.is_err());
        assert!("root".parse::<Role>().is_err());
    }
}
