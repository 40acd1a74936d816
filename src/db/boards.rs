use chrono::Utc;

use crate::{
    data_types::board::{Board, BoardPatch, Card, NewBoard},
    error::AppError,
    services::{
        archive::archived_cards,
        dashboard::{compute_dashboard, DashboardStats},
        filter::{filter_board, BoardFilter},
    },
    session::RequestContext,
    traits::Document,
};

use super::{find_one_typed, find_typed, insert_typed, update_typed, Criteria, DocumentStore};

pub struct BoardRepository<'a> {
    store: &'a dyn DocumentStore,
    enforce_ownership: bool,
}

impl<'a> BoardRepository<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            enforce_ownership: false,
        }
    }

    /// Restricts `remove` to the board's creator unless the caller is an admin.
    pub fn with_ownership_check(mut self, enforce: bool) -> Self {
        self.enforce_ownership = enforce;
        self
    }

    pub async fn query(&self) -> Result<Vec<Board>, AppError> {
        find_typed::<Board>(self.store, &Criteria::all())
            .await
            .inspect_err(|err| tracing::error!("cannot find boards: {err}"))
            .map_err(AppError::from)
    }

    /// Fetches a board, narrowing its cards only when `filter` has an active predicate.
    pub async fn get_by_id(&self, id: &str, filter: Option<&BoardFilter>) -> Result<Board, AppError> {
        let board = find_one_typed::<Board>(self.store, &Criteria::by_id(id))
            .await
            .inspect_err(|err| tracing::error!("error while finding board {id}: {err}"))?
            .ok_or_else(|| AppError::NotFound(format!("board {id} not found")))?;

        match filter {
            Some(filter) if !filter.is_empty() => Ok(filter_board(&board, filter)),
            _ => Ok(board),
        }
    }

    pub async fn add(&self, new_board: NewBoard) -> Result<Board, AppError> {
        if new_board.title.trim().is_empty() {
            return Err(AppError::Validation("board title is required".into()));
        }

        let board = insert_typed(self.store, Board::from_new(new_board))
            .await
            .inspect_err(|err| tracing::error!("cannot insert board: {err}"))?;

        tracing::debug!(board_id = %board.id, title = %board.title, "board created");
        Ok(board)
    }

    pub async fn update(&self, id: &str, patch: BoardPatch) -> Result<Board, AppError> {
        let fields = patch
            .into_fields()
            .map_err(|err| AppError::Validation(format!("invalid board: {err}")))?;

        update_typed::<Board>(self.store, &Criteria::by_id(id), fields)
            .await
            .inspect_err(|err| tracing::error!("cannot update board {id}: {err}"))?
            .ok_or_else(|| AppError::NotFound(format!("board {id} not found")))
    }

    /// Deletes by id. Nothing matching is not an error.
    pub async fn remove(&self, id: &str, context: &RequestContext) -> Result<(), AppError> {
        let mut criteria = Criteria::by_id(id);

        if self.enforce_ownership && !context.is_admin {
            let user_id = context.user_id.as_deref().ok_or_else(|| {
                AppError::Unauthorized("login required to remove a board".into())
            })?;
            criteria = criteria.field("createdBy._id", user_id);
        }

        let removed = self
            .store
            .delete_one(Board::COLLECTION, &criteria)
            .await
            .inspect_err(|err| tracing::error!("cannot remove board {id}: {err}"))?;

        if !removed {
            tracing::debug!(board_id = %id, "remove matched no board");
        }
        Ok(())
    }

    /// Dashboard over the unfiltered board.
    pub async fn dashboard(&self, id: &str) -> Result<DashboardStats, AppError> {
        let board = self.get_by_id(id, None).await?;
        Ok(compute_dashboard(&board, Utc::now()))
    }

    pub async fn archived_cards(&self, id: &str) -> Result<Vec<Card>, AppError> {
        let board = self.get_by_id(id, None).await?;
        Ok(archived_cards(&board))
    }
}
