use std::collections::HashSet;

use ratatui::widgets::ListState;

use livescroll_news::{Article, FetchState, SchedulerStats};

pub struct App {
    /// Articles on screen, newest first.
    pub items: Vec<Article>,
    /// URLs already on screen.  The feed repeats itself every poll, so the
    /// view collapses repeats even though the session history keeps them.
    seen: HashSet<String>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last poll status message.
    pub status: String,
    /// Shown in the list border.
    pub title: String,
}

impl App {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            list_state: ListState::default(),
            quit: false,
            status: "Starting…".into(),
            title: format!(" News: {} ", keywords.join(", ")),
        }
    }

    /// Merge newly delivered articles, collapse repeats, and re-sort.
    pub fn merge_items(&mut self, new_items: impl IntoIterator<Item = Article>) {
        for item in new_items {
            let key = if item.url.is_empty() {
                item.title.clone()
            } else {
                item.url.clone()
            };
            if self.seen.insert(key) {
                self.items.push(item);
            }
        }
        // Newest first; undated articles sink to the bottom.
        self.items.sort_by(|a, b| b.published().cmp(&a.published()));
    }

    /// Refresh the status line from the adapter's counters.
    pub fn update_status(&mut self, state: Option<&FetchState>, stats: Option<SchedulerStats>) {
        let Some(state) = state else {
            self.status = "Starting…".into();
            return;
        };

        let mut status = format!("{} calls", state.call_count);
        if let Some(stats) = stats {
            status.push_str(&format!(", {} skipped", stats.skipped));
        }
        if let Some(err) = &state.last_error {
            status.push_str(&format!("  Error: {err}"));
        }
        self.status = status;
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.items.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(self.items.len() - 1));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use livescroll_news::FetchError;

    pub(crate) fn make_item(url: &str, title: &str, published: &str) -> Article {
        Article {
            title: title.to_string(),
            url: url.to_string(),
            published_at: published.to_string(),
            ..Article::default()
        }
    }

    pub(crate) fn sample_items() -> Vec<Article> {
        vec![
            make_item("https://e.com/1", "Old", "2024-01-01T00:00:00Z"),
            make_item("https://e.com/2", "Mid", "2025-06-01T00:00:00Z"),
            make_item("https://e.com/3", "New", "2026-01-01T00:00:00Z"),
        ]
    }

    fn app() -> App {
        App::new(&["india".to_string()])
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn new_app_starts_empty() {
        let app = app();
        assert!(app.items.is_empty());
        assert!(!app.quit);
        assert!(app.list_state.selected().is_none());
        assert_eq!(app.title, " News: india ");
    }

    // -- merge_items ---------------------------------------------------------

    #[test]
    fn merge_items_inserts_and_sorts_newest_first() {
        let mut app = app();
        app.merge_items(sample_items());

        assert_eq!(app.items.len(), 3);
        assert_eq!(app.items[0].title, "New");
        assert_eq!(app.items[1].title, "Mid");
        assert_eq!(app.items[2].title, "Old");
    }

    #[test]
    fn merge_items_collapses_repeated_urls() {
        let mut app = app();
        app.merge_items(vec![make_item("https://e.com/dup", "First", "2025-01-01T00:00:00Z")]);
        app.merge_items(vec![
            make_item("https://e.com/dup", "Second copy", "2025-01-02T00:00:00Z"),
            make_item("https://e.com/new", "New item", "2025-01-03T00:00:00Z"),
        ]);

        assert_eq!(app.items.len(), 2);
        assert!(app.items.iter().any(|i| i.url == "https://e.com/dup" && i.title == "First"));
    }

    #[test]
    fn undated_items_sort_last() {
        let mut app = app();
        app.merge_items(vec![
            make_item("https://e.com/a", "Undated", ""),
            make_item("https://e.com/b", "Dated", "2025-01-01T00:00:00Z"),
        ]);
        assert_eq!(app.items[0].title, "Dated");
        assert_eq!(app.items[1].title, "Undated");
    }

    #[test]
    fn merge_items_handles_empty_input() {
        let mut app = app();
        app.merge_items(Vec::new());
        assert!(app.items.is_empty());
    }

    // -- status --------------------------------------------------------------

    #[test]
    fn status_reports_calls_skips_and_errors() {
        let mut app = app();
        let state = FetchState {
            call_count: 4,
            last_error: Some(FetchError::EmptyArticles),
            ..FetchState::default()
        };
        let stats = SchedulerStats {
            fired: 6,
            completed: 5,
            skipped: 1,
        };

        app.update_status(Some(&state), Some(stats));

        assert!(app.status.starts_with("4 calls, 1 skipped"));
        assert!(app.status.contains("no articles present"));
    }

    #[test]
    fn status_before_first_session() {
        let mut app = app();
        app.status = "stale".into();
        app.update_status(None, None);
        assert_eq!(app.status, "Starting…");
    }

    // -- navigation ----------------------------------------------------------

    #[test]
    fn navigation_on_empty_is_noop() {
        let mut app = app();
        app.select_next();
        app.select_previous();
        app.select_first();
        app.select_last();
        assert!(app.list_state.selected().is_none());
    }

    #[test]
    fn select_next_starts_at_zero_then_advances_and_clamps() {
        let mut app = app();
        app.merge_items(sample_items());

        app.select_next();
        assert_eq!(app.list_state.selected(), Some(0));
        app.select_next();
        app.select_next();
        app.select_next();
        assert_eq!(app.list_state.selected(), Some(2));
    }

    #[test]
    fn select_previous_moves_up_and_clamps() {
        let mut app = app();
        app.merge_items(sample_items());

        app.select_last();
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(1));
        app.select_previous();
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn select_first_and_last_jump() {
        let mut app = app();
        app.merge_items(sample_items());

        app.select_last();
        assert_eq!(app.list_state.selected(), Some(2));
        app.select_first();
        assert_eq!(app.list_state.selected(), Some(0));
    }
}
