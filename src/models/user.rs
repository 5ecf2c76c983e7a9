use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
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

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    #[sqlx(rename = "user_id")]
    pub id: String,
    #[sqlx(rename = "user_name")]
    pub name: String,
    #[sqlx(rename = "user_email")]
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

/// Partial update of the editable user fields. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub position: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdate {
    /// Keeps only the fields that differ from `current`.
    pub fn changes_from(&self, current: &User) -> UserUpdate {
        UserUpdate {
            position: self
                .position
                .clone()
                .filter(|value| current.position.as_deref() != Some(value.as_str())),
            profile_image_url: self
                .profile_image_url
                .clone()
                .filter(|value| current.profile_image_url.as_deref() != Some(value.as_str())),
            role: self.role.filter(|role| *role != current.role),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.profile_image_url.is_none() && self.role.is_none()
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.position.is_some() {
            fields.push("position");
        }
        if self.profile_image_url.is_some() {
            fields.push("profileImageUrl");
        }
        if self.role.is_some() {
            fields.push("role");
        }
        fields
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(position) = &self.position {
            user.position = Some(position.clone());
        }
        if let Some(url) = &self.profile_image_url {
            user.profile_image_url = Some(url.clone());
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}
