use crate::data_types::board::{Board, Card};

/// Archived cards of live groups, in board order. Cards of archived groups stay hidden.
pub fn archived_cards(board: &Board) -> Vec<Card> {
    board
        .groups
        .iter()
        .filter(|group| !group.is_archive)
        .flat_map(|group| group.cards.iter().filter(|card| card.is_archive))
        .cloned()
        .collect()
}
