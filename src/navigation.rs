use std::sync::{Mutex, PoisonError};

use crate::ports::navigator::Navigator;

/// In-memory location history. The last entry is the current location.
#[derive(Debug)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl History {
    pub fn new(start: &str) -> Self {
        Self {
            entries: Mutex::new(vec![start.to_string()]),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for History {
    fn navigate(&self, to: &str) {
        tracing::debug!(to, "Navigating");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(to.to_string());
    }

    fn current(&self) -> String {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }
}
