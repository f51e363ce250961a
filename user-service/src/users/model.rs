//! User entity and its input types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;

/// Upper bound accepted for `age`
pub const MAX_AGE: u32 = 150;

/// A stored user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Store-assigned identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Age in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Free-form role label, e.g. `admin`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Document> for User {
    type Error = serde_json::Error;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        serde_json::from_value(Value::Object(document))
    }
}

/// Body of a create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Age in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Role label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl NewUser {
    /// Create input with the required fields
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age: None,
            role: None,
        }
    }

    /// Set the age
    #[must_use]
    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Set the role
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Validate the input, returning an error message if invalid
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        if let Some(role) = &self.role {
            validate_role(role)?;
        }
        Ok(())
    }

    /// Document to insert
    pub fn into_document(self) -> Result<Document, serde_json::Error> {
        to_document(&self)
    }
}

/// Body of an update request
///
/// Only the fields that are present are written; everything else on the
/// stored user is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New age
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// New role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UserPatch {
    /// Validate each present field, returning an error message if invalid
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        if let Some(role) = &self.role {
            validate_role(role)?;
        }
        Ok(())
    }

    /// Whether the patch sets any field
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.age.is_none() && self.role.is_none()
    }

    /// Field changes to merge into the stored document
    pub fn into_changes(self) -> Result<Document, serde_json::Error> {
        to_document(&self)
    }
}

fn to_document<T: Serialize>(value: &T) -> Result<Document, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Document::new()),
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), String> {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return Err("email must contain '@'".to_string());
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(format!("email '{}' is not a valid address", email));
    }
    if email.contains(char::is_whitespace) {
        return Err("email must not contain whitespace".to_string());
    }
    Ok(())
}

fn validate_age(age: u32) -> Result<(), String> {
    if age > MAX_AGE {
        return Err(format!("age must be at most {}", MAX_AGE));
    }
    Ok(())
}

fn validate_role(role: &str) -> Result<(), String> {
    if role.trim().is_empty() {
        return Err("role must not be empty".to_string());
    }
    Ok(())
}
