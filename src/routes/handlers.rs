use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    data_types::{
        board::{Board, BoardPatch, Card, NewActivity, NewBoard},
        user::{Mention, User, UserFilter, UserInput},
    },
    db::users::UserRepository,
    error::JsonResult,
    general_helpers::current_timestamp,
    services::{
        auth::{hash_password, AuthService, LoginRequest, SignupRequest},
        dashboard::DashboardStats,
        filter::BoardFilter,
    },
    session::RequestContext,
};

use super::{
    extract::{AppJson, AppQuery},
    AppState,
};

#[derive(Serialize)]
pub struct Message {
    msg: &'static str,
}

#[derive(Deserialize)]
pub struct UpdateBoardBody {
    board: BoardPatch,
    #[serde(default)]
    activity: Option<NewActivity>,
}

pub async fn get_boards(State(state): State<AppState>) -> JsonResult<Vec<Board>> {
    Ok(Json(state.boards().query().await?))
}

/// `?txt=&labels=&members=`; list parameters repeat or take comma separated ids.
pub async fn get_board_by_id(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    AppQuery(params): AppQuery<Vec<(String, String)>>,
) -> JsonResult<Board> {
    let filter = BoardFilter::from_query_pairs(params);
    Ok(Json(state.boards().get_by_id(&board_id, Some(&filter)).await?))
}

pub async fn get_archived_cards(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> JsonResult<Vec<Card>> {
    Ok(Json(state.boards().archived_cards(&board_id).await?))
}

pub async fn get_dashboard_data(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> JsonResult<DashboardStats> {
    Ok(Json(state.boards().dashboard(&board_id).await?))
}

pub async fn add_board(
    State(state): State<AppState>,
    context: RequestContext,
    AppJson(mut new_board): AppJson<NewBoard>,
) -> JsonResult<Board> {
    if new_board.created_by.is_none() {
        if let Some(user_id) = &context.user_id {
            let creator = UserRepository::new(state.store.as_ref())
                .get_by_id(user_id)
                .await?;
            new_board.created_by = Some(creator.mini());
        }
    }

    Ok(Json(state.boards().add(new_board).await?))
}

pub async fn update_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    AppJson(body): AppJson<UpdateBoardBody>,
) -> JsonResult<Board> {
    let boards = state.boards();
    let mut patch = body.board;

    if let Some(activity) = body.activity {
        let mut activities = match patch.activities.take() {
            Some(activities) => activities,
            None => boards.get_by_id(&board_id, None).await?.activities,
        };
        activities.insert(0, activity.into_activity(current_timestamp()));
        patch.activities = Some(activities);
    }

    Ok(Json(boards.update(&board_id, patch).await?))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    context: RequestContext,
) -> JsonResult<Message> {
    state.boards().remove(&board_id, &context).await?;
    Ok(Json(Message {
        msg: "Deleted successfully",
    }))
}

pub async fn get_users(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<UserFilter>,
) -> JsonResult<Vec<User>> {
    Ok(Json(state.users().query(&filter).await?))
}

pub async fn get_user(State(state): State<AppState>, Path(user_id): Path<String>) -> JsonResult<User> {
    Ok(Json(state.users().get_by_id(&user_id).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppJson(mut input): AppJson<UserInput>,
) -> JsonResult<User> {
    if let Some(password) = input.password.take().filter(|password| !password.is_empty()) {
        input.password = Some(hash_password(&password));
    }

    Ok(Json(state.users().update(&user_id, input).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> JsonResult<Message> {
    state.users().remove(&user_id).await?;
    Ok(Json(Message {
        msg: "Deleted successfully",
    }))
}

pub async fn add_user_mention(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppJson(mention): AppJson<Mention>,
) -> JsonResult<User> {
    Ok(Json(state.users().add_mention(&user_id, mention).await?))
}

pub async fn signup(
    State(state): State<AppState>,
    AppJson(request): AppJson<SignupRequest>,
) -> JsonResult<User> {
    Ok(Json(
        AuthService::new(state.store.as_ref()).signup(request).await?,
    ))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> JsonResult<User> {
    Ok(Json(AuthService::new(state.store.as_ref()).login(request).await?))
}
