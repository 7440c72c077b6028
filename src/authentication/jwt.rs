use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::schema::{User, UserRole, Uuid};
use crate::error::{ApiError, Error};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    pub username: String,
    pub user_role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Uuid, username: String, role: UserRole) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(1)).timestamp();

        Self {
            user_id: id,
            username,
            user_role: role,
            iat,
            exp,
        }
    }
}

/// Per-request identity. Passed explicitly into every action that needs the
/// acting user; `Option<SessionData>` marks an anonymous caller.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

impl Into<SessionData> for JwtSessionData {
    fn into(self) -> SessionData {
        SessionData {
            user_id: self.user_id,
            username: self.username,
            is_admin: self.user_role == UserRole::Admin,
        }
    }
}

fn session_key() -> Hmac<Sha256> {
    let secret = std::env::var("SESSION_KEY").unwrap_or_else(|_| String::from("secret"));
    Hmac::new_from_slice(secret.as_bytes()).unwrap()
}

pub fn generate_jwt_session(user: &User) -> String {
    let key = session_key();
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role.to_owned());

    claims.sign_with_key(&key).unwrap()
}

pub fn verify_jwt_session(token: String) -> Result<JwtSessionData, Error> {
    let key = session_key();

    token
        .verify_with_key(&key)
        .map_err(|_| ApiError::InvalidSession.new("Invalid session; Invalid token"))
        .map(|session: JwtSessionData| {
            let now = Local::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(ApiError::InvalidSession.new("Invalid session; Token expired"));
            }
            return Ok(session);
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            username: String::from("kokki"),
            email: String::from("kokki@example.com"),
            first_name: String::from("Kaisa"),
            last_name: String::from("Kokki"),
            role: UserRole::User,
        }
    }

    #[test]
    fn session_round_trip() {
        let token = generate_jwt_session(&user());
        let session = verify_jwt_session(token).unwrap();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "kokki");
        assert_eq!(session.user_role, UserRole::User);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let mut token = generate_jwt_session(&user());
        token.push('x');

        let error = verify_jwt_session(token).unwrap_err();
        assert_eq!(error.code, 401);
    }

    #[test]
    fn session_data_carries_admin_flag() {
        let mut admin = user();
        admin.role = UserRole::Admin;

        let session = verify_jwt_session(generate_jwt_session(&admin)).unwrap();
        let data: SessionData = session.into();
        assert!(data.is_admin);

        let session = verify_jwt_session(generate_jwt_session(&user())).unwrap();
        let data: SessionData = session.into();
        assert!(!data.is_admin);
    }
}
