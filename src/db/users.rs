use serde_json::Value;

use crate::{
    data_types::user::{Mention, User, UserFilter, UserInput},
    error::AppError,
    general_helpers::{current_timestamp, new_id},
    traits::Document,
};

use super::{find_one_typed, find_typed, insert_typed, update_typed, Criteria, DocumentStore};

pub struct UserRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> UserRepository<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    pub async fn query(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        let users = find_typed::<User>(self.store, &Criteria::all())
            .await
            .inspect_err(|err| tracing::error!("cannot find users: {err}"))?;

        Ok(users
            .into_iter()
            .filter(|user| user.matches(filter))
            .map(User::without_password)
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<User, AppError> {
        find_one_typed::<User>(self.store, &Criteria::by_id(id))
            .await
            .inspect_err(|err| tracing::error!("while finding user {id}: {err}"))?
            .map(User::without_password)
            .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
    }

    /// Keeps the stored password digest, for credential checks only.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        find_one_typed::<User>(self.store, &Criteria::all().field("username", username))
            .await
            .inspect_err(|err| tracing::error!("while finding user {username}: {err}"))
            .map_err(AppError::from)
    }

    pub async fn add(&self, input: UserInput) -> Result<User, AppError> {
        let user = User {
            id: String::new(),
            username: input
                .username
                .ok_or_else(|| AppError::Validation("username is required".into()))?,
            password: input.password,
            fullname: input.fullname.unwrap_or_default(),
            img_url: input.img_url,
            mentions: input.mentions.unwrap_or_default(),
            boards: input.boards.unwrap_or_default(),
            created_at: Some(current_timestamp()),
        };

        let user = insert_typed(self.store, user)
            .await
            .inspect_err(|err| tracing::error!("cannot insert user: {err}"))?;

        Ok(user.without_password())
    }

    /// Overwrites the provided allow-listed fields. A new username must not belong to another user.
    pub async fn update(&self, id: &str, input: UserInput) -> Result<User, AppError> {
        if let Some(username) = &input.username {
            if let Some(owner) = self.get_by_username(username).await? {
                if owner.id != id {
                    return Err(AppError::Conflict(format!(
                        "username {username} is already taken"
                    )));
                }
            }
        }

        let fields = match serde_json::to_value(input) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Default::default(),
            Err(err) => return Err(AppError::Validation(format!("invalid user: {err}"))),
        };

        update_typed::<User>(self.store, &Criteria::by_id(id), fields)
            .await
            .inspect_err(|err| tracing::error!("cannot update user {id}: {err}"))?
            .map(User::without_password)
            .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
    }

    pub async fn remove(&self, id: &str) -> Result<(), AppError> {
        self.store
            .delete_one(User::COLLECTION, &Criteria::by_id(id))
            .await
            .inspect_err(|err| tracing::error!("cannot remove user {id}: {err}"))?;
        Ok(())
    }

    /// Puts `mention` at the head of the user's mentions, stamping id and time when missing.
    pub async fn add_mention(&self, user_id: &str, mut mention: Mention) -> Result<User, AppError> {
        let user = self.get_by_id(user_id).await?;

        if mention.id.is_empty() {
            mention.id = new_id();
        }
        if mention.created_at == 0 {
            mention.created_at = current_timestamp();
        }

        let mut mentions = user.mentions;
        mentions.insert(0, mention);

        self.update(
            user_id,
            UserInput {
                mentions: Some(mentions),
                ..Default::default()
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;
    use crate::db::MemoryStore;

    fn input(username: &str, fullname: &str) -> UserInput {
        UserInput {
            username: Some(username.into()),
            password: Some("salt$digest".into()),
            fullname: Some(fullname.into()),
            ..Default::default()
        }
    }

    fn mention(txt: &str) -> Mention {
        Mention {
            id: String::new(),
            txt: txt.into(),
            by_member: None,
            board_id: Some("b1".into()),
            card_id: None,
            created_at: 0,
            is_read: false,
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn passwords_only_leave_through_username_lookup() -> Result<(), AppError> {
        let store = MemoryStore::new();
        let repo = UserRepository::new(&store);

        let added = repo.add(input("ada", "Ada Lovelace")).await?;
        assert!(added.password.is_none());
        assert!(added.created_at.is_some());

        assert!(repo.get_by_id(&added.id).await?.password.is_none());
        assert!(repo.query(&UserFilter::default()).await?[0].password.is_none());

        let with_secret = repo.get_by_username("ada").await?.unwrap();
        assert_eq!(with_secret.password.as_deref(), Some("salt$digest"));
        assert!(repo.get_by_username("nobody").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn query_filters_by_text() -> Result<(), AppError> {
        let store = MemoryStore::new();
        let repo = UserRepository::new(&store);
        repo.add(input("ada", "Ada Lovelace")).await?;
        repo.add(input("alan", "Alan Turing")).await?;

        let found = repo
            .query(&UserFilter {
                txt: Some("TURING".into()),
            })
            .await?;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "alan");
        Ok(())
    }

    #[tokio::test]
    async fn update_touches_only_provided_fields() -> Result<(), AppError> {
        let store = MemoryStore::new();
        let repo = UserRepository::new(&store);
        let ada = repo.add(input("ada", "Ada Lovelace")).await?;

        let updated = repo
            .update(
                &ada.id,
                UserInput {
                    img_url: Some("https://img/ada.png".into()),
                    ..Default::default()
                },
            )
            .await?;

        assert_eq!(updated.fullname, "Ada Lovelace");
        assert_eq!(updated.img_url.as_deref(), Some("https://img/ada.png"));
        let stored = repo.get_by_username("ada").await?.unwrap();
        assert_eq!(stored.password.as_deref(), Some("salt$digest"));
        Ok(())
    }

    #[tokio::test]
    async fn rename_to_taken_username_conflicts() -> Result<(), AppError> {
        let store = MemoryStore::new();
        let repo = UserRepository::new(&store);
        let ada = repo.add(input("ada", "Ada Lovelace")).await?;
        let bob = repo.add(input("bob", "Bob")).await?;

        let rename = |username: &str| UserInput {
            username: Some(username.into()),
            ..Default::default()
        };

        assert!(matches!(
            repo.update(&bob.id, rename("ada")).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(repo.get_by_id(&bob.id).await?.username, "bob");
        assert_eq!(repo.get_by_username("ada").await?.map(|u| u.id), Some(ada.id.clone()));

        assert_eq!(repo.update(&ada.id, rename("ada")).await?.username, "ada");
        assert_eq!(repo.update(&bob.id, rename("robert")).await?.username, "robert");
        Ok(())
    }

    #[tokio::test]
    async fn mentions_are_prepended_and_stamped() -> Result<(), AppError> {
        let store = MemoryStore::new();
        let repo = UserRepository::new(&store);
        let ada = repo.add(input("ada", "Ada")).await?;

        repo.add_mention(&ada.id, mention("first")).await?;
        let user = repo.add_mention(&ada.id, mention("second")).await?;

        let texts: Vec<_> = user.mentions.iter().map(|m| m.txt.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);
        assert!(user.mentions.iter().all(|m| !m.id.is_empty() && m.created_at > 0));

        assert!(matches!(
            repo.add_mention("ghost", mention("x")).await,
            Err(AppError::NotFound(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn remove_is_silent() -> Result<(), AppError> {
        let store = MemoryStore::new();
        let repo = UserRepository::new(&store);
        let ada = repo.add(input("ada", "Ada")).await?;

        repo.remove(&ada.id).await?;
        repo.remove(&ada.id).await?;

        assert!(matches!(repo.get_by_id(&ada.id).await, Err(AppError::NotFound(_))));
        Ok(())
    }
}
