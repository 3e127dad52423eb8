use authz::{Principal, PrincipalId, Role};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A stored account, without its password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: PrincipalId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
}

impl UserRecord {
    pub fn principal(&self) -> Principal {
        Principal::persisted(self.id, self.role)
    }
}

/// Input for creating an account. `password` is the plain secret; only its
/// hash is stored.
#[derive(Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Partial account update. Blank strings count as not provided.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub role: Option<Role>,
}

fn default_role() -> Role {
    Role::Admin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults_to_admin_and_hides_password() {
        let user: NewUser = serde_json::from_str(
            r#"{"name":"Ann","username":"ann","email":"ann@example.com","password":"hunter2"}"#,
        )
        .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(!format!("{:?}", user).contains("hunter2"));
    }

    #[test]
    fn test_record_principal() {
        let record = UserRecord {
            id: 4,
            name: "Root".to_string(),
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            role: Role::Super,
            created_at: NaiveDateTime::default(),
        };
        let principal = record.principal();
        assert_eq!(principal.id(), Some(4));
        assert_eq!(principal.role(), Role::Super);
    }
}
