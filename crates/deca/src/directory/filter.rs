//! Incremental substring filter over an already rendered list.
//!
//! `change` applies immediately. Keystrokes are debounced: each one bumps a
//! token, and only the timer carrying the latest token may apply, and only
//! if the text differs from what the list is currently filtered by.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    /// Items whose visibility changed: `(index, shown)`.
    pub toggled: Vec<(usize, bool)>,
    pub shown: usize,
}

impl FilterUpdate {
    pub fn no_match(&self) -> bool {
        self.shown == 0
    }
}

#[derive(Debug)]
pub struct LiveFilter {
    haystacks: Vec<String>,
    shown: Vec<bool>,
    last_filter: String,
    key_token: u64,
}

impl LiveFilter {
    /// One searchable text per list item, in list order.
    pub fn new(search_texts: impl IntoIterator<Item = String>) -> Self {
        let haystacks: Vec<String> = search_texts.into_iter().map(|text| text.to_lowercase()).collect();
        let shown = vec![true; haystacks.len()];
        Self {
            haystacks,
            shown,
            last_filter: String::new(),
            key_token: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.haystacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.haystacks.is_empty()
    }

    pub fn is_shown(&self, index: usize) -> bool {
        self.shown.get(index).copied().unwrap_or(false)
    }

    pub fn shown_count(&self) -> usize {
        self.shown.iter().filter(|shown| **shown).count()
    }

    /// Filter on `change`, and on a settled keystroke.
    pub fn apply(&mut self, text: &str) -> FilterUpdate {
        self.last_filter = text.to_owned();
        let needle = text.to_lowercase();
        let mut update = FilterUpdate::default();
        for (index, haystack) in self.haystacks.iter().enumerate() {
            let matches = haystack.contains(&needle);
            if self.shown[index] != matches {
                self.shown[index] = matches;
                update.toggled.push((index, matches));
            }
            if matches {
                update.shown += 1;
            }
        }
        update
    }

    /// Register a keystroke; schedule [`Self::settle`] with the returned
    /// token after the debounce delay.
    pub fn keystroke(&mut self) -> u64 {
        self.key_token = self.key_token.wrapping_add(1);
        self.key_token
    }

    /// Debounce timer fired. `None` when a later keystroke superseded it or
    /// the text is what the list is already filtered by.
    pub fn settle(&mut self, token: u64, text: &str) -> Option<FilterUpdate> {
        if token != self.key_token || text == self.last_filter {
            return None;
        }
        Some(self.apply(text))
    }
}
