use super::*;

/// The state of the search input and its suggestion list.
///
/// Edits below the minimum length never produce a query. Focus-navigation
/// and committing both write the suggestion's underlying `data` value into
/// the input, never its display label.
pub struct Autocomplete {
    value: String,
    min_length: usize,
    suggestions: Vec<Suggestion>,
    highlighted: Option<usize>,
    open: bool,
}

impl Autocomplete {
    pub fn new(min_length: usize) -> Self {
        Self {
            value: String::new(),
            min_length,
            suggestions: vec![],
            highlighted: None,
            open: false,
        }
    }

    /// The literal input value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The suggestions currently offered, in server order.
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Whether the suggestion list is showing.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Appends one typed character. Returns the term to query, if the input
    /// now clears the minimum length.
    pub fn push_char(&mut self, c: char) -> Option<String> {
        self.value.push(c);
        self.after_edit()
    }

    /// Removes the last character. Returns the term to query, if any.
    pub fn backspace(&mut self) -> Option<String> {
        self.value.pop();
        self.after_edit()
    }

    fn after_edit(&mut self) -> Option<String> {
        self.highlighted = None;

        if self.value.chars().count() >= self.min_length {
            Some(self.value.clone())
        } else {
            self.open = false;
            self.suggestions.clear();
            None
        }
    }

    /// Shows the suggestions of a response. The fetcher guarantees only
    /// current-generation responses ever arrive here.
    pub fn apply_response(&mut self, response: &SearchResponse) {
        match &response.result {
            Ok(suggestions) => {
                self.suggestions = suggestions.clone();
                self.highlighted = None;
                self.open = !self.suggestions.is_empty();
            }
            Err(e) => {
                log::warn!("Search for '{}' failed. Reason:\r\n{}", response.term, e);
                self.suggestions.clear();
                self.highlighted = None;
                self.open = false;
            }
        }
    }

    /// Moves the keyboard focus one suggestion down and previews its
    /// underlying value in the input.
    pub fn focus_next(&mut self) {
        if !self.open || self.suggestions.is_empty() {
            return;
        }
        let next = match self.highlighted {
            Some(i) => (i + 1) % self.suggestions.len(),
            None => 0,
        };
        self.focus(next);
    }

    /// Moves the keyboard focus one suggestion up and previews its
    /// underlying value in the input.
    pub fn focus_prev(&mut self) {
        if !self.open || self.suggestions.is_empty() {
            return;
        }
        let prev = match self.highlighted {
            Some(0) | None => self.suggestions.len() - 1,
            Some(i) => i - 1,
        };
        self.focus(prev);
    }

    fn focus(&mut self, index: usize) {
        self.highlighted = Some(index);
        // The preview already inserts the data value, not the label.
        self.value = self.suggestions[index].data.clone();
    }

    /// Commits the highlighted suggestion, writing its `data` value into the
    /// input and closing the list.
    pub fn commit(&mut self) -> Option<Suggestion> {
        self.highlighted.and_then(|i| self.commit_at(i))
    }

    /// Commits the suggestion at `index` (pointer selection).
    pub fn commit_at(&mut self, index: usize) -> Option<Suggestion> {
        let suggestion = self.suggestions.get(index)?.clone();
        self.value = suggestion.data.clone();
        self.suggestions.clear();
        self.highlighted = None;
        self.open = false;
        Some(suggestion)
    }

    /// Closes the suggestion list without committing.
    pub fn dismiss(&mut self) {
        self.open = false;
        self.highlighted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme_response(id: u64) -> SearchResponse {
        SearchResponse {
            id,
            term: "ac".into(),
            result: Ok(vec![
                Suggestion {
                    label: "Acme Corp (company)".into(),
                    data: "42".into(),
                },
                Suggestion {
                    label: "Acton (city)".into(),
                    data: "acton".into(),
                },
            ]),
        }
    }

    #[test]
    fn no_query_below_the_minimum_length() {
        let mut ac = Autocomplete::new(2);

        assert_eq!(ac.push_char('a'), None);
        assert!(!ac.is_open());
    }

    #[test]
    fn one_query_per_edit_with_the_current_term() {
        let mut ac = Autocomplete::new(2);

        assert_eq!(ac.push_char('a'), None);
        assert_eq!(ac.push_char('c'), Some("ac".into()));
        assert_eq!(ac.push_char('m'), Some("acm".into()));
        assert_eq!(ac.backspace(), Some("ac".into()));
        assert_eq!(ac.backspace(), None);
    }

    #[test]
    fn committing_inserts_the_data_value() {
        let mut ac = Autocomplete::new(2);
        ac.push_char('a');
        ac.push_char('c');
        ac.apply_response(&acme_response(1));

        let taken = ac.commit_at(0).unwrap();

        assert_eq!(taken.label, "Acme Corp (company)");
        assert_eq!(ac.value(), "42");
        assert!(!ac.is_open());
    }

    #[test]
    fn focus_navigation_previews_the_data_value() {
        let mut ac = Autocomplete::new(2);
        ac.push_char('a');
        ac.push_char('c');
        ac.apply_response(&acme_response(1));

        ac.focus_next();
        assert_eq!(ac.highlighted(), Some(0));
        assert_eq!(ac.value(), "42");

        ac.focus_next();
        assert_eq!(ac.value(), "acton");

        ac.focus_prev();
        assert_eq!(ac.value(), "42");
    }

    #[test]
    fn keyboard_commit_follows_the_focused_suggestion() {
        let mut ac = Autocomplete::new(2);
        ac.push_char('a');
        ac.push_char('c');
        ac.apply_response(&acme_response(1));

        ac.focus_next();
        ac.focus_next();
        let taken = ac.commit().unwrap();

        assert_eq!(taken.data, "acton");
        assert_eq!(ac.value(), "acton");
    }

    #[test]
    fn failed_responses_leave_the_list_empty() {
        let mut ac = Autocomplete::new(2);
        ac.push_char('a');
        ac.push_char('c');
        ac.apply_response(&acme_response(1));
        assert!(ac.is_open());

        ac.apply_response(&SearchResponse {
            id: 2,
            term: "acm".into(),
            result: Err(SearchError::Http(500)),
        });

        assert!(!ac.is_open());
        assert!(ac.suggestions().is_empty());
    }

    #[test]
    fn shrinking_below_the_threshold_closes_the_list() {
        let mut ac = Autocomplete::new(2);
        ac.push_char('a');
        ac.push_char('c');
        ac.apply_response(&acme_response(1));
        assert!(ac.is_open());

        ac.backspace();

        assert!(!ac.is_open());
        assert!(ac.suggestions().is_empty());
    }
}
