use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{data_types::board::Member, db::Keys, traits::Document};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub username: String,
    /// Salted digest; stripped before a user leaves the repository, except for login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
    #[serde(default)]
    pub boards: Vec<Value>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub txt: String,
    #[serde(default)]
    pub by_member: Option<Member>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub is_read: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Allow-listed fields for creating or updating a user.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<Mention>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boards: Option<Vec<Value>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UserFilter {
    pub txt: Option<String>,
}

impl User {
    pub fn mini(&self) -> Member {
        Member {
            id: self.id.clone(),
            fullname: self.fullname.clone(),
            img_url: self.img_url.clone(),
        }
    }

    pub fn without_password(mut self) -> Self {
        self.password = None;
        self
    }

    pub fn matches(&self, filter: &UserFilter) -> bool {
        let Some(txt) = filter.txt.as_deref().filter(|txt| !txt.is_empty()) else {
            return true;
        };
        let txt = txt.to_lowercase();

        self.username.to_lowercase().contains(&txt) || self.fullname.to_lowercase().contains(&txt)
    }
}

impl Document for User {
    const COLLECTION: &'static str = Keys::USERS_KEY;

    fn ident(&self) -> &str {
        &self.id
    }
}
