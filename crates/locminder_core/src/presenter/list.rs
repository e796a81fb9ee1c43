//! Reminder list presenter.

use crate::model::outcome::Outcome;
use crate::model::reminder::Reminder;
use crate::repo::reminder_repo::ReminderRepository;
use crate::store::ReminderStore;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderListViewState {
    pub reminders: Vec<Reminder>,
    pub loading: bool,
    /// Error text to show once; cleared by `dismiss_snackbar`.
    pub snackbar: Option<String>,
    pub show_no_data: bool,
}

pub struct ReminderListPresenter<S: ReminderStore + 'static> {
    repo: ReminderRepository<S>,
    state: watch::Sender<ReminderListViewState>,
}

impl<S: ReminderStore + 'static> ReminderListPresenter<S> {
    pub fn new(repo: ReminderRepository<S>) -> Self {
        let (state, _) = watch::channel(ReminderListViewState::default());
        Self { repo, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<ReminderListViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ReminderListViewState {
        self.state.borrow().clone()
    }

    /// Loads all reminders. On failure the current list is kept and the
    /// error message is surfaced through `snackbar`.
    pub async fn load_reminders(&self) {
        self.state.send_modify(|state| state.loading = true);
        let outcome = self.repo.get_reminders().await;
        self.state.send_modify(|state| {
            state.loading = false;
            match outcome {
                Outcome::Success(reminders) => state.reminders = reminders,
                Outcome::Error(message) => state.snackbar = Some(message),
            }
            state.show_no_data = state.reminders.is_empty();
        });
    }

    pub fn dismiss_snackbar(&self) {
        self.state.send_if_modified(|state| state.snackbar.take().is_some());
    }
}
