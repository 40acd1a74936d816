use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    db::Keys,
    general_helpers::{current_timestamp, deserialize_optional_timestamp},
    traits::Document,
};

/// Colors of the six label slots every new board starts with.
pub const DEFAULT_LABEL_COLORS: [(&str, &str); 6] = [
    ("l101", "#61bd4f"),
    ("l102", "#FF9F1A"),
    ("l103", "#eb5a46"),
    ("l104", "#C377E0"),
    ("l105", "#344563"),
    ("l106", "#FF78CB"),
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default = "empty_object")]
    pub style: Value,
    #[serde(default)]
    pub is_starred: bool,
    #[serde(default)]
    pub created_by: Option<Member>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_archive: bool,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_archive: bool,
    #[serde(default)]
    pub is_done: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<i64>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Label {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub color: String,
}

/// The slice of a user embedded in boards, cards and activities.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub txt: String,
    #[serde(default)]
    pub by_member: Option<Member>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub card: ActivityCard,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Card reference on an activity; serializes as `{}` when the activity is not about a card.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ActivityCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Fields a caller may supply when creating a board. Anything else in the body is ignored.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewBoard {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub style: Option<Value>,
    #[serde(default)]
    pub created_by: Option<Member>,
}

/// Top-level board fields to overwrite. Absent fields keep their stored value, present
/// sequences replace the stored sequence wholesale.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct BoardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_starred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Member>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Label>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Member>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<Activity>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BoardPatch {
    /// The provided fields as a flat object, never carrying the document id.
    pub fn into_fields(self) -> Result<Map<String, Value>, serde_json::Error> {
        let mut fields = match serde_json::to_value(self)? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        fields.remove("_id");
        Ok(fields)
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(default)]
    pub txt: String,
    #[serde(default)]
    pub by_member: Option<Member>,
    #[serde(default)]
    pub card: Option<ActivityCardRef>,
    #[serde(default)]
    pub group_id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ActivityCardRef {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

impl NewActivity {
    pub fn into_activity(self, created_at: i64) -> Activity {
        Activity {
            txt: self.txt,
            by_member: self.by_member,
            created_at,
            card: self
                .card
                .map(|card| ActivityCard {
                    id: Some(card.id),
                    title: Some(card.title),
                })
                .unwrap_or_default(),
            group_id: self.group_id,
            extra: Map::new(),
        }
    }
}

impl Board {
    /// Builds the document `add` persists: only title, style and creator come from the caller.
    pub fn from_new(new_board: NewBoard) -> Self {
        Board {
            id: String::new(),
            title: new_board.title,
            created_at: current_timestamp(),
            style: new_board.style.unwrap_or_else(empty_object),
            is_starred: false,
            members: new_board.created_by.iter().cloned().collect(),
            created_by: new_board.created_by,
            groups: Vec::new(),
            labels: default_labels(),
            activities: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl Document for Board {
    const COLLECTION: &'static str = Keys::BOARDS_KEY;

    fn ident(&self) -> &str {
        &self.id
    }
}

pub fn default_labels() -> Vec<Label> {
    DEFAULT_LABEL_COLORS
        .iter()
        .map(|(id, color)| Label {
            id: (*id).to_string(),
            title: String::new(),
            color: (*color).to_string(),
        })
        .collect()
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
