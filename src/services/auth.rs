use serde::Deserialize;
use sha3::{Digest, Sha3_256};

use crate::{
    data_types::user::{User, UserInput},
    db::{users::UserRepository, DocumentStore},
    error::AppError,
    general_helpers::new_id,
};

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub img_url: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Stored as `salt$hex(sha3_256(salt || password))`.
pub fn hash_password(password: &str) -> String {
    let salt = new_id();
    format!("{salt}${}", digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, password) == expected,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            users: UserRepository::new(store),
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<User, AppError> {
        tracing::debug!(
            username = %request.username,
            fullname = %request.fullname,
            "signup"
        );

        if request.username.is_empty() || request.password.is_empty() || request.fullname.is_empty()
        {
            return Err(AppError::Validation(
                "fullname, username and password are required!".into(),
            ));
        }

        if self.users.get_by_username(&request.username).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "username {} is already taken",
                request.username
            )));
        }

        self.users
            .add(UserInput {
                username: Some(request.username),
                password: Some(hash_password(&request.password)),
                fullname: Some(request.fullname),
                img_url: request.img_url,
                mentions: Some(Vec::new()),
                boards: None,
            })
            .await
    }

    pub async fn login(&self, request: LoginRequest) -> Result<User, AppError> {
        tracing::debug!(username = %request.username, "login");

        let invalid = || AppError::Unauthorized("Invalid username or password".into());
        let user = self
            .users
            .get_by_username(&request.username)
            .await?
            .ok_or_else(invalid)?;

        match user.password.as_deref() {
            Some(stored) if verify_password(&request.password, stored) => {
                Ok(user.without_password())
            }
            _ => Err(invalid()),
        }
    }
}
