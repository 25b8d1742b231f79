//! Per-item results for batch operations. A failed item never aborts
//! the batch, it is recorded next to the successes instead.

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<T> {
    Completed(T),
    Failed { item: String, error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<T> {
    outcomes: Vec<ItemOutcome<T>>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&mut self, value: T) {
        self.outcomes.push(ItemOutcome::Completed(value));
    }

    pub fn failed(&mut self, item: impl Into<String>, error: impl Into<String>) {
        self.outcomes.push(ItemOutcome::Failed {
            item: item.into(),
            error: error.into(),
        });
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn outcomes(&self) -> &[ItemOutcome<T>] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &T> {
        self.outcomes.iter().filter_map(|o| match o {
            ItemOutcome::Completed(v) => Some(v),
            ItemOutcome::Failed { .. } => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|o| match o {
            ItemOutcome::Completed(_) => None,
            ItemOutcome::Failed { error, .. } => Some(error.as_str()),
        })
    }

    /// Split into successes and error strings, both in original order.
    pub fn into_parts(self) -> (Vec<T>, Vec<String>) {
        let mut ok = Vec::new();
        let mut errors = Vec::new();
        for outcome in self.outcomes {
            match outcome {
                ItemOutcome::Completed(v) => ok.push(v),
                ItemOutcome::Failed { error, .. } => errors.push(error),
            }
        }
        (ok, errors)
    }
}
