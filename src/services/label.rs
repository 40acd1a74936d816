use crate::data_types::board::Label;

pub fn find_label<'a>(labels: &'a [Label], label_id: &str) -> Option<&'a Label> {
    labels.iter().find(|label| label.id == label_id)
}
