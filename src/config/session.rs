use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BillingError, Result};

/// Roles issued by the clinic backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    /// Parent or guardian of a child under care
    Pai,
    Psicologo,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Admin => "ADMIN",
            Role::Pai => "PAI",
            Role::Psicologo => "PSICOLOGO",
            Role::User => "USER",
        };
        f.write_str(label)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "PAI" => Ok(Role::Pai),
            "PSICOLOGO" => Ok(Role::Psicologo),
            "USER" => Ok(Role::User),
            other => Err(format!(
                "unknown role '{other}' (expected ADMIN, PAI, PSICOLOGO or USER)"
            )),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionUser {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
}

/// Persisted auth state (session.toml)
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: SessionUser) -> Self {
        Self {
            token: Some(token.into()),
            user: Some(user),
        }
    }

    /// Token for the Authorization header. Fails before any request is built.
    pub fn bearer(&self) -> Result<&str> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(BillingError::NotAuthenticated),
        }
    }

    pub fn viewer(&self) -> Viewer {
        Viewer {
            id: self.user.as_ref().map(|u| u.id),
            role: self.user.as_ref().map(|u| u.role),
        }
    }
}

/// Who is looking at the invoice list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewer {
    pub id: Option<u64>,
    pub role: Option<Role>,
}

impl Viewer {
    pub fn new(id: u64, role: Role) -> Self {
        Self {
            id: Some(id),
            role: Some(role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_requires_non_empty_token() {
        assert!(matches!(
            Session::default().bearer(),
            Err(BillingError::NotAuthenticated)
        ));

        let blank = Session {
            token: Some("   ".to_string()),
            user: None,
        };
        assert!(matches!(blank.bearer(), Err(BillingError::NotAuthenticated)));
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("pai".parse::<Role>(), Ok(Role::Pai));
        assert_eq!(" Admin ".parse::<Role>(), Ok(Role::Admin));
        assert!("guardian".parse::<Role>().is_err());
    }

    #[test]
    fn session_round_trips_through_toml() {
        let session = Session::new(
            "abc",
            SessionUser {
                id: 7,
                name: Some("Ana".to_string()),
                email: None,
                role: Role::Pai,
            },
        );
        let text = toml::to_string_pretty(&session).unwrap();
        assert!(text.contains("role = \"PAI\""));

        let parsed: Session = toml::from_str(&text).unwrap();
        assert_eq!(parsed.bearer().unwrap(), "abc");
        assert_eq!(parsed.viewer(), Viewer::new(7, Role::Pai));
    }
}
