//! User entity, roles and preferences

use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Well-known preference keys
pub mod preference {
    pub const LANGUAGE: &str = "language";
    pub const TIMEZONE: &str = "timezone";
    pub const HOURLY_RATE: &str = "hourly_rate";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Teamlead,
    Admin,
    SuperAdmin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "ROLE_USER"),
            Role::Teamlead => write!(f, "ROLE_TEAMLEAD"),
            Role::Admin => write!(f, "ROLE_ADMIN"),
            Role::SuperAdmin => write!(f, "ROLE_SUPER_ADMIN"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ROLE_USER" | "USER" => Ok(Role::User),
            "ROLE_TEAMLEAD" | "TEAMLEAD" => Ok(Role::Teamlead),
            "ROLE_ADMIN" | "ADMIN" => Ok(Role::Admin),
            "ROLE_SUPER_ADMIN" | "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    /// Login name, unique
    pub username: String,
    pub email: String,
    /// Display name
    pub alias: Option<String>,
    pub account_number: Option<String>,
    pub enabled: bool,
    pub roles: Vec<Role>,
    /// Password digest; never a plain password
    pub password: String,
    pub preferences: BTreeMap<String, String>,
}

impl User {
    pub const MAX_USERNAME_LEN: usize = 180;
    pub const MAX_ACCOUNT_NUMBER_LEN: usize = 30;

    /// A new enabled user with the default role and a password nobody can log in with
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            email: email.into(),
            alias: None,
            account_number: None,
            enabled: true,
            roles: vec![Role::User],
            password: unusable_password(),
            preferences: BTreeMap::new(),
        }
    }

    /// Display name, falling back to the username
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.username)
    }

    pub fn preference(&self, key: &str) -> Option<&str> {
        self.preferences.get(key).map(String::as_str)
    }

    pub fn set_preference(&mut self, key: &str, value: impl Into<String>) {
        self.preferences.insert(key.to_string(), value.into());
    }

    pub fn timezone(&self) -> Option<&str> {
        self.preference(preference::TIMEZONE)
    }

    /// Store a salted digest of `plain` as the password
    pub fn set_plain_password(&mut self, plain: &str) {
        let salt = random_token(16);
        self.password = format!("sha256${}${}", salt, digest(&salt, plain));
    }

    /// Check `plain` against the stored digest
    pub fn verify_password(&self, plain: &str) -> bool {
        let mut parts = self.password.splitn(3, '$');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("sha256"), Some(salt), Some(hash)) => digest(salt, plain) == hash,
            _ => false,
        }
    }
}

/// A password value that no digest can ever match
pub fn unusable_password() -> String {
    format!("!{}", random_token(40))
}

fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn digest(salt: &str, plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(plain.as_bytes());
    format!("{:x}", hasher.finalize())
}
