use std::collections::HashSet;

/// Columns of the filter overlay grid.
pub const GRID_COLUMNS: usize = 3;

/// Source filter state. Grid cell 0 is "All", cell `i` is `sources[i - 1]`.
/// Cells flow top-to-bottom, then left-to-right.
#[derive(Debug, Clone, Default)]
pub struct FilterBar {
    sources: Vec<String>,
    active: HashSet<String>,
    pub cursor: usize,
}

impl FilterBar {
    pub fn new(sources: Vec<String>) -> Self {
        Self {
            sources,
            active: HashSet::new(),
            cursor: 0,
        }
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn total_items(&self) -> usize {
        1 + self.sources.len()
    }

    pub fn rows(&self) -> usize {
        self.total_items().div_ceil(GRID_COLUMNS)
    }

    /// Label of grid cell `idx`.
    pub fn item(&self, idx: usize) -> Option<&str> {
        match idx {
            0 => Some("All"),
            i => self.sources.get(i - 1).map(String::as_str),
        }
    }

    pub fn is_item_active(&self, idx: usize) -> bool {
        match idx {
            0 => self.active.is_empty(),
            i => self
                .sources
                .get(i - 1)
                .map(|s| self.active.contains(s))
                .unwrap_or(false),
        }
    }

    pub fn toggle(&mut self, source: &str) {
        if !self.active.remove(source) {
            self.active.insert(source.to_string());
        }
    }

    /// Toggle the source with this 1-based number. Returns false when out of range.
    pub fn toggle_number(&mut self, n: usize) -> bool {
        match n.checked_sub(1).and_then(|i| self.sources.get(i)).cloned() {
            Some(source) => {
                self.toggle(&source);
                true
            }
            None => false,
        }
    }

    /// Toggle the cell under the cursor; "All" clears the selection.
    pub fn toggle_cursor(&mut self) {
        if self.cursor == 0 {
            self.select_all();
        } else if let Some(source) = self.sources.get(self.cursor - 1).cloned() {
            self.toggle(&source);
        }
    }

    pub fn select_all(&mut self) {
        self.active.clear();
    }

    /// Active sources in configured order; empty means all sources.
    pub fn active_sources(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter(|s| self.active.contains(*s))
            .cloned()
            .collect()
    }

    pub fn active_label(&self) -> String {
        if self.active.is_empty() {
            "All".to_string()
        } else {
            self.active_sources().join(", ")
        }
    }

    /// Label for the collapsed bar, shortened to "(+N more)" when the
    /// joined names do not fit in `max_width` columns.
    pub fn collapsed_label(&self, max_width: usize) -> String {
        if self.active.is_empty() {
            return "All sources".to_string();
        }
        let names = self.active_sources();
        let full = names.join(", ");
        if max_width == 0 || full.chars().count() <= max_width {
            return full;
        }
        let mut label = String::new();
        for (i, name) in names.iter().enumerate() {
            let sep = if i > 0 { ", " } else { "" };
            let remaining = names.len() - i - 1;
            let more = format!(" (+{} more)", remaining);
            let candidate_len = label.chars().count() + sep.len() + name.chars().count() + more.len();
            if candidate_len > max_width {
                return if i == 0 {
                    format!("({} sources)", names.len())
                } else {
                    format!("{}, (+{} more)", label, remaining + 1)
                };
            }
            label.push_str(sep);
            label.push_str(name);
        }
        label
    }

    fn position(&self) -> (usize, usize, usize) {
        let rows = self.rows().max(1);
        (rows, self.cursor / rows, self.cursor % rows)
    }

    pub fn down(&mut self) {
        let (rows, col, row) = self.position();
        let next = col * rows + row + 1;
        if row + 1 < rows && next < self.total_items() {
            self.cursor = next;
        }
    }

    pub fn up(&mut self) {
        let (rows, col, row) = self.position();
        if row > 0 {
            self.cursor = col * rows + row - 1;
        }
    }

    pub fn left(&mut self) {
        let (rows, col, row) = self.position();
        if col > 0 {
            self.cursor = (col - 1) * rows + row;
        }
    }

    pub fn right(&mut self) {
        let (rows, col, row) = self.position();
        let next = (col + 1) * rows + row;
        if col + 1 < GRID_COLUMNS && next < self.total_items() {
            self.cursor = next;
        }
    }
}
