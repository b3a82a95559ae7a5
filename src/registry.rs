// SPDX: CC0-1.0

use std::sync::Arc;

// the ordered set of available expression sources and the selected one;
// the host cycles the selection and reads `current`
#[derive(Clone, Debug)]
pub struct Registry {
    exprs: Vec<Arc<String>>,
    current: usize,
}

impl Registry {
    pub fn new(exprs: Vec<Arc<String>>) -> Option<Self> {
        if exprs.is_empty() {
            None
        } else {
            Some(Self { exprs, current: 0 })
        }
    }

    // one expression per line; blank lines are skipped
    pub fn from_lines(listing: &str) -> Option<Self> {
        Self::new(
            listing
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| Arc::new(String::from(line)))
                .collect(),
        )
    }

    pub fn current(&self) -> &Arc<String> {
        &self.exprs[self.current]
    }

    pub const fn selected(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Arc<String>> {
        self.exprs.iter()
    }

    pub fn cycle_next(&mut self) {
        self.current = (self.current + 1) % self.exprs.len();
    }

    pub fn cycle_prev(&mut self) {
        self.current = (self.current + self.exprs.len() - 1) % self.exprs.len();
    }
}
