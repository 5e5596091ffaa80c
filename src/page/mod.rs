//! Page seam: the browser window around the document
//!
//! Alerts, confirmations, reloads, navigation, cookies and the current date
//! are side effects the console never performs itself; it asks a [`Page`].
//! [`RecordingPage`] records them instead, for tests and headless use.

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

pub trait Page {
    /// Blocking notice shown to the user
    fn alert(&self, message: &str);

    /// Yes/no question; `true` means the user agreed
    fn confirm(&self, message: &str) -> bool;

    /// Full reload of the current page
    fn reload(&self);

    fn navigate(&self, url: &str);

    fn cookie(&self, name: &str) -> Option<String>;

    /// Today's date in the user's timezone
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A side effect requested through [`Page`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEffect {
    Alert(String),
    Confirm(String),
    Reload,
    Navigate(String),
}

/// Records every effect; confirmations are answered from a queue
#[derive(Debug, Default)]
pub struct RecordingPage {
    effects: RefCell<Vec<PageEffect>>,
    answers: RefCell<VecDeque<bool>>,
    cookies: HashMap<String, String>,
    today: Option<NaiveDate>,
}

impl RecordingPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Pin [`Page::today`] to a fixed date
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Answer the next confirmation with `answer` (unanswered ones say yes)
    pub fn answer_confirm(&self, answer: bool) {
        self.answers.borrow_mut().push_back(answer);
    }

    pub fn effects(&self) -> Vec<PageEffect> {
        self.effects.borrow().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.effects
            .borrow()
            .iter()
            .filter_map(|e| match e {
                PageEffect::Alert(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn reload_count(&self) -> usize {
        self.effects
            .borrow()
            .iter()
            .filter(|e| matches!(e, PageEffect::Reload))
            .count()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.effects
            .borrow()
            .iter()
            .filter_map(|e| match e {
                PageEffect::Navigate(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.effects.borrow_mut().clear();
    }
}

impl Page for RecordingPage {
    fn alert(&self, message: &str) {
        self.effects
            .borrow_mut()
            .push(PageEffect::Alert(message.to_string()));
    }

    fn confirm(&self, message: &str) -> bool {
        self.effects
            .borrow_mut()
            .push(PageEffect::Confirm(message.to_string()));
        self.answers.borrow_mut().pop_front().unwrap_or(true)
    }

    fn reload(&self) {
        self.effects.borrow_mut().push(PageEffect::Reload);
    }

    fn navigate(&self, url: &str) {
        self.effects
            .borrow_mut()
            .push(PageEffect::Navigate(url.to_string()));
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
