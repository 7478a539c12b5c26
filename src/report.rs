//! Human-readable listing of the resolved middleware map.
//!
//! ```text
//! [ login|I18n ] => I18n.i18nController.setLanguage
//! [ login ]      => admin.adminController.login
//! [ nil ]        => admin.adminController.status
//! ```

use std::fmt;
use std::sync::Arc;

use crate::route::RouteKey;

/// One line per registered action, in route order.
#[derive(Clone, Debug)]
pub struct Report {
    entries: Vec<(RouteKey, Arc<[String]>)>,
}

impl Report {
    pub(crate) fn new(entries: Vec<(RouteKey, Arc<[String]>)>) -> Self {
        Self { entries }
    }

    /// The formatted lines, middleware lists padded to a common width.
    pub fn lines(&self) -> Vec<String> {
        let lists: Vec<String> = self
            .entries
            .iter()
            .map(|(_, middlewares)| format_list(middlewares))
            .collect();
        let width = lists.iter().map(String::len).max().unwrap_or(0);

        lists
            .iter()
            .zip(&self.entries)
            .map(|(list, (route, _))| format!("{list:<width$} => {route}"))
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&RouteKey, &[String])> {
        self.entries.iter().map(|(route, m)| (route, &**m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

fn format_list(middlewares: &[String]) -> String {
    if middlewares.is_empty() {
        "[ nil ]".to_owned()
    } else {
        format!("[ {} ]", middlewares.join("|"))
    }
}
