use std::collections::HashSet;

use crate::data_types::board::{Board, Card};

/// Card filter for a single board view. `None` means the predicate is inactive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardFilter {
    pub txt: Option<String>,
    pub label_ids: Option<HashSet<String>>,
    pub member_ids: Option<HashSet<String>>,
}

impl BoardFilter {
    /// Builds a filter from query pairs. List keys may repeat or hold comma separated
    /// values, so a lone scalar becomes a one-element set.
    pub fn from_query_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut filter = BoardFilter::default();

        for (key, value) in pairs {
            match key.as_str() {
                "txt" => filter.txt = Some(value).filter(|txt| !txt.is_empty()),
                "labels" | "labelIds" => extend_set(&mut filter.label_ids, &value),
                "members" | "memberIds" => extend_set(&mut filter.member_ids, &value),
                _ => {}
            }
        }

        filter
    }

    pub fn is_empty(&self) -> bool {
        self.txt.is_none() && self.label_ids.is_none() && self.member_ids.is_none()
    }

    pub fn accepts(&self, card: &Card) -> bool {
        if card.is_archive {
            return false;
        }

        if let Some(txt) = &self.txt {
            if !card.title.to_lowercase().contains(&txt.to_lowercase()) {
                return false;
            }
        }

        if let Some(label_ids) = &self.label_ids {
            if !card.label_ids.iter().any(|id| label_ids.contains(id)) {
                return false;
            }
        }

        if let Some(member_ids) = &self.member_ids {
            if !card.members.iter().any(|member| member_ids.contains(&member.id)) {
                return false;
            }
        }

        true
    }
}

fn extend_set(set: &mut Option<HashSet<String>>, value: &str) {
    let ids = value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from);

    let mut ids = ids.peekable();
    if ids.peek().is_some() {
        set.get_or_insert_with(HashSet::new).extend(ids);
    }
}

/// Copy of `board` whose groups only keep the cards `filter` accepts. Groups are never dropped.
pub fn filter_board(board: &Board, filter: &BoardFilter) -> Board {
    let mut filtered = board.clone();

    for group in &mut filtered.groups {
        group.cards.retain(|card| filter.accepts(card));
    }

    filtered
}
