//! "Label the feeling (without labels)": select an item, listen, then drop it
//! into one of two unnamed clusters. Nothing is scored.

use serde_json::{Value, json};

use super::content::FeelingsItem;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cluster {
    A,
    B,
}

impl Cluster {
    /// Name used in analytics events.
    pub fn event_name(self) -> &'static str {
        match self {
            Cluster::A => "left",
            Cluster::B => "right",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Cluster::A => "Cluster A",
            Cluster::B => "Cluster B",
        }
    }
}

pub struct FeelingsBoard {
    items: Vec<FeelingsItem>,
    left: Vec<usize>,
    right: Vec<usize>,
    selected: Option<usize>,
}

impl FeelingsBoard {
    pub fn new(items: Vec<FeelingsItem>) -> Self {
        Self {
            items,
            left: Vec::new(),
            right: Vec::new(),
            selected: None,
        }
    }

    fn is_placed(&self, idx: usize) -> bool {
        self.left.contains(&idx) || self.right.contains(&idx)
    }

    /// Items not yet dropped into a cluster, in content order.
    pub fn available(&self) -> impl Iterator<Item = &FeelingsItem> {
        self.items
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.is_placed(*i))
            .map(|(_, item)| item)
    }

    pub fn cluster(&self, which: Cluster) -> impl Iterator<Item = &FeelingsItem> {
        let idxs = match which {
            Cluster::A => &self.left,
            Cluster::B => &self.right,
        };
        idxs.iter().map(|&i| &self.items[i])
    }

    pub fn selected(&self) -> Option<&FeelingsItem> {
        self.selected.map(|i| &self.items[i])
    }

    /// Selects an available item by id. Placed or unknown ids are ignored.
    pub fn select(&mut self, id: &str) -> Option<&FeelingsItem> {
        let idx = self.items.iter().position(|item| item.id == id)?;
        if self.is_placed(idx) {
            return None;
        }
        self.selected = Some(idx);
        Some(&self.items[idx])
    }

    /// Moves the selected item into `which` and returns the drop event props.
    pub fn drop_selected(&mut self, which: Cluster) -> Option<Value> {
        let idx = self.selected.take()?;
        match which {
            Cluster::A => self.left.push(idx),
            Cluster::B => self.right.push(idx),
        }
        Some(json!({ "to": which.event_name(), "id": self.items[idx].id }))
    }

    pub fn is_done(&self) -> bool {
        self.left.len() + self.right.len() == self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::content::Modality;

    fn item(id: &str) -> FeelingsItem {
        FeelingsItem {
            id: id.into(),
            alt: format!("{id} sound"),
            modality: Modality::Audio,
            src: Some(format!("audio/{id}.m4a")),
        }
    }

    #[test]
    fn dropped_items_leave_the_pool() {
        let mut board = FeelingsBoard::new(vec![item("rain"), item("hum"), item("bells")]);
        assert!(board.drop_selected(Cluster::A).is_none());
        board.select("hum").unwrap();
        let props = board.drop_selected(Cluster::B).unwrap();
        assert_eq!(props, json!({ "to": "right", "id": "hum" }));
        let left: Vec<&str> = board.available().map(|i| i.id.as_str()).collect();
        assert_eq!(left, vec!["rain", "bells"]);
        assert_eq!(board.cluster(Cluster::B).count(), 1);
        assert!(board.select("hum").is_none());
        assert!(board.selected().is_none());
    }

    #[test]
    fn done_when_everything_is_placed() {
        let mut board = FeelingsBoard::new(vec![item("a"), item("b")]);
        board.select("a");
        board.drop_selected(Cluster::A);
        board.select("b");
        board.drop_selected(Cluster::A);
        assert!(board.is_done());
        assert_eq!(board.available().count(), 0);
    }
}
