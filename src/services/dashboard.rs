use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{data_types::board::Board, general_helpers::millis_to_datetime};

use super::label::find_label;

#[derive(Serialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub groups_count: usize,
    pub cards_count: usize,
    pub overdue_count: usize,
    pub tasks_per_member: BTreeMap<String, usize>,
    pub tasks_per_label: BTreeMap<String, usize>,
    pub tasks: Vec<ScheduledTask>,
    /// Label ids referenced by counted cards that the board does not define.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_label_ids: Vec<String>,
}

/// A dated card, shaped for timeline rendering.
#[derive(Serialize, Debug, PartialEq)]
pub struct ScheduledTask {
    pub id: String,
    pub name: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Aggregates the active part of `board`: non-archived cards inside non-archived groups.
pub fn compute_dashboard(board: &Board, now: DateTime<Utc>) -> DashboardStats {
    let now = now.timestamp_millis();
    let mut stats = DashboardStats {
        tasks_per_label: board
            .labels
            .iter()
            .map(|label| (label.title.clone(), 0))
            .collect(),
        ..Default::default()
    };

    for group in board.groups.iter().filter(|group| !group.is_archive) {
        stats.groups_count += 1;

        for card in group.cards.iter().filter(|card| !card.is_archive) {
            stats.cards_count += 1;

            if let Some(due_date) = card.due_date {
                if !card.is_done && due_date < now {
                    stats.overdue_count += 1;
                }
                stats.tasks.push(ScheduledTask {
                    id: card.id.clone(),
                    name: card.title.clone(),
                    start: card.created_at.and_then(millis_to_datetime),
                    end: millis_to_datetime(due_date),
                });
            }

            for member in &card.members {
                *stats
                    .tasks_per_member
                    .entry(member.fullname.clone())
                    .or_insert(0) += 1;
            }

            for label_id in &card.label_ids {
                match find_label(&board.labels, label_id) {
                    Some(label) => {
                        *stats.tasks_per_label.entry(label.title.clone()).or_insert(0) += 1;
                    }
                    None => {
                        tracing::warn!(
                            board_id = %board.id,
                            card_id = %card.id,
                            label_id = %label_id,
                            "card references a label the board does not define, skipping"
                        );
                        stats.unresolved_label_ids.push(label_id.clone());
                    }
                }
            }
        }
    }

    stats
}
