//! Users and Authentication Payloads
//!
//! The client does not implement authentication logic; these are passthrough
//! shapes for the gateway's auth and user-management endpoints.

use serde::{Deserialize, Serialize};

/// Role of an account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Repartidor,
}

impl Default for Role {
    fn default() -> Self {
        Role::Repartidor
    }
}

/// A user record from the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Account role
    #[serde(default)]
    pub role: Role,
    /// Store this user is permanently assigned to, when any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<i64>,
}

/// Wire payload of `POST /auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Wire payload of `POST /auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Response of a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Authenticated user
    pub user: User,
    /// Bearer token, when the deployment issues one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}
