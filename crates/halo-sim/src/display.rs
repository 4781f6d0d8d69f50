//! Terminal rendering for one simulated node's observation lines.

use halo_protocol::DisplaySink;

/// Prints each upserted line prefixed with the node's name. The keyed
/// upsert collapses to plain prints on a scrolling terminal; dedup of
/// repeats is enough to keep the output readable.
pub struct TermDisplay {
    node: String,
    last: Option<(String, String)>,
}

impl TermDisplay {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            last: None,
        }
    }
}

impl DisplaySink for TermDisplay {
    fn show(&mut self, key: &str, line: &str) {
        let entry = (key.to_string(), line.to_string());
        if self.last.as_ref() == Some(&entry) {
            return;
        }
        println!("[{}] {line}", self.node);
        self.last = Some(entry);
    }

    fn clear_all(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_repeats_are_collapsed() {
        let mut display = TermDisplay::new("n0");
        display.show("k", "line");
        display.show("k", "line");
        display.show("k", "other");
        assert_eq!(display.last, Some(("k".to_string(), "other".to_string())));
    }
}
