mod support;

use locminder_core::presenter::list::ReminderListPresenter;
use locminder_core::presenter::save::{
    MessageAction, MessageDuration, SaveReminderPresenter, SaveReminderViewState,
    MESSAGE_ENTER_TITLE, MESSAGE_LOCATION_REQUIRED, MESSAGE_PERMISSION_DENIED,
    MESSAGE_REMINDER_SAVED, MESSAGE_SELECT_LOCATION,
};
use locminder_core::store::memory::INJECTED_FAILURE_MESSAGE;
use locminder_core::{
    ActivationOutcome, CancelScope, MemoryReminderStore, Reminder, ReminderId,
    ReminderRepository, ReminderStore, SettingsState, StoreResult,
};
use std::sync::{mpsc, Arc, Mutex};
use support::{reminder, FakePermissions, FakeSettings, Harness, DENIED};

/// Store whose `get_all` blocks until the test releases it.
struct GatedStore {
    inner: MemoryReminderStore,
    release: Mutex<mpsc::Receiver<()>>,
}

impl ReminderStore for GatedStore {
    fn save(&self, reminder: &Reminder) -> StoreResult<()> {
        self.inner.save(reminder)
    }

    fn get_all(&self) -> StoreResult<Vec<Reminder>> {
        let _ = self.release.lock().unwrap().recv();
        self.inner.get_all()
    }

    fn get_by_id(&self, id: &str) -> StoreResult<Option<Reminder>> {
        self.inner.get_by_id(id)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        self.inner.delete(id)
    }

    fn delete_all(&self) -> StoreResult<Vec<ReminderId>> {
        self.inner.delete_all()
    }
}

fn fill_draft(presenter: &SaveReminderPresenter<Arc<MemoryReminderStore>>) {
    presenter.set_title(Some("Buy milk".to_string()));
    presenter.set_description(Some("two litres".to_string()));
    presenter.select_location(Some("Corner shop".to_string()), 11.0, 11.0);
}

#[tokio::test]
async fn list_loads_sorted_reminders() {
    let store = MemoryReminderStore::with_reminders([reminder("b"), reminder("a")]);
    let presenter = ReminderListPresenter::new(ReminderRepository::new(store));

    presenter.load_reminders().await;

    let state = presenter.snapshot();
    let ids: Vec<_> = state.reminders.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(!state.loading);
    assert!(!state.show_no_data);
    assert_eq!(state.snackbar, None);
}

#[tokio::test]
async fn empty_list_shows_no_data() {
    let presenter = ReminderListPresenter::new(ReminderRepository::new(MemoryReminderStore::new()));

    presenter.load_reminders().await;

    let state = presenter.snapshot();
    assert!(state.reminders.is_empty());
    assert!(state.show_no_data);
}

#[tokio::test]
async fn failed_load_surfaces_snackbar_and_keeps_list() {
    let store = Arc::new(MemoryReminderStore::with_reminders([reminder("a")]));
    let presenter = ReminderListPresenter::new(ReminderRepository::new(Arc::clone(&store)));
    presenter.load_reminders().await;

    store.set_return_error(true);
    presenter.load_reminders().await;

    let state = presenter.snapshot();
    assert_eq!(state.snackbar.as_deref(), Some(INJECTED_FAILURE_MESSAGE));
    assert_eq!(state.reminders.len(), 1);
    assert!(!state.loading);

    presenter.dismiss_snackbar();
    assert_eq!(presenter.snapshot().snackbar, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn loading_is_visible_while_the_store_is_busy() {
    let (release, gate) = mpsc::channel();
    let store = GatedStore {
        inner: MemoryReminderStore::with_reminders([reminder("a")]),
        release: Mutex::new(gate),
    };
    let presenter = Arc::new(ReminderListPresenter::new(ReminderRepository::new(store)));
    let mut states = presenter.subscribe();

    let loader = Arc::clone(&presenter);
    let load = tokio::spawn(async move { loader.load_reminders().await });

    states.wait_for(|state| state.loading).await.unwrap();
    assert!(presenter.snapshot().reminders.is_empty());

    release.send(()).unwrap();
    load.await.unwrap();

    let state = presenter.snapshot();
    assert!(!state.loading);
    assert_eq!(state.reminders.len(), 1);
}

#[tokio::test]
async fn save_without_title_asks_for_title() {
    let harness = Harness::granted();
    let presenter = SaveReminderPresenter::new(Arc::clone(&harness.registrar));
    presenter.select_location(None, 11.0, 11.0);

    assert!(presenter.save(&CancelScope::new().token()).await.is_none());

    let state = presenter.snapshot();
    assert_eq!(state.message.unwrap().text, MESSAGE_ENTER_TITLE);
    assert!(!state.loading);
    assert_eq!(harness.geofencing.add_calls(), 0);
}

#[tokio::test]
async fn save_without_location_asks_for_location() {
    let harness = Harness::granted();
    let presenter = SaveReminderPresenter::new(Arc::clone(&harness.registrar));
    presenter.set_title(Some("Buy milk".to_string()));

    assert!(presenter.save(&CancelScope::new().token()).await.is_none());
    assert_eq!(
        presenter.snapshot().message.unwrap().text,
        MESSAGE_SELECT_LOCATION
    );
}

#[tokio::test]
async fn successful_save_reports_saved_reminder() {
    let harness = Harness::granted();
    let presenter = SaveReminderPresenter::new(Arc::clone(&harness.registrar));
    fill_draft(&presenter);

    let activation = presenter.save(&CancelScope::new().token()).await.unwrap();

    assert_eq!(activation.outcome, ActivationOutcome::Registered);
    let state = presenter.snapshot();
    assert_eq!(state.saved.as_deref(), Some(activation.reminder_id.as_str()));
    assert_eq!(state.message.unwrap().text, MESSAGE_REMINDER_SAVED);
    assert!(!state.loading);

    let stored = harness.repo.get_reminder(&activation.reminder_id).await.success().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Buy milk"));
    assert_eq!(stored.location_name.as_deref(), Some("Corner shop"));
}

#[tokio::test]
async fn denied_permission_offers_settings() {
    let harness = Harness::new(FakePermissions::new(DENIED, DENIED), FakeSettings::satisfied());
    let presenter = SaveReminderPresenter::new(Arc::clone(&harness.registrar));
    fill_draft(&presenter);

    presenter.save(&CancelScope::new().token()).await.unwrap();

    let message = presenter.snapshot().message.unwrap();
    assert_eq!(message.text, MESSAGE_PERMISSION_DENIED);
    assert_eq!(message.duration, MessageDuration::Indefinite);
    assert_eq!(message.action, Some(MessageAction::OpenSettings));
    assert_eq!(presenter.snapshot().saved, None);
}

#[tokio::test]
async fn settings_retry_reuses_the_pending_reminder() {
    let harness = Harness::new(
        FakePermissions::granted(),
        FakeSettings::answering(vec![SettingsState::Unresolvable]),
    );
    let presenter = SaveReminderPresenter::new(Arc::clone(&harness.registrar));
    fill_draft(&presenter);
    let scope = CancelScope::new();

    let first = presenter.save(&scope.token()).await.unwrap();
    assert_eq!(first.outcome, ActivationOutcome::SettingsUnsatisfied);
    let message = presenter.snapshot().message.unwrap();
    assert_eq!(message.text, MESSAGE_LOCATION_REQUIRED);
    assert_eq!(message.action, Some(MessageAction::RetrySettings));

    let retried = presenter.retry_settings(&scope.token()).await.unwrap();
    assert_eq!(retried.outcome, ActivationOutcome::Registered);
    assert_eq!(retried.reminder_id, first.reminder_id);
    assert!(presenter.retry_settings(&scope.token()).await.is_none());
}

#[tokio::test]
async fn platform_failure_is_reported_with_its_message() {
    let harness = Harness::granted();
    harness.store.set_return_error(true);
    let presenter = SaveReminderPresenter::new(Arc::clone(&harness.registrar));
    fill_draft(&presenter);

    presenter.save(&CancelScope::new().token()).await.unwrap();

    let message = presenter.snapshot().message.unwrap();
    assert_eq!(
        message.text,
        format!("An exception occurred: {INJECTED_FAILURE_MESSAGE}")
    );
    assert_eq!(message.duration, MessageDuration::Long);

    presenter.dismiss_message();
    assert_eq!(presenter.snapshot().message, None);
}

#[tokio::test]
async fn cancelled_save_publishes_no_outcome() {
    let harness = Harness::granted();
    let presenter = SaveReminderPresenter::new(Arc::clone(&harness.registrar));
    fill_draft(&presenter);
    let scope = CancelScope::new();
    scope.cancel();

    let activation = presenter.save(&scope.token()).await.unwrap();

    assert_eq!(activation.outcome, ActivationOutcome::Cancelled);
    let state = presenter.snapshot();
    assert_eq!(state.message, None);
    assert_eq!(state.saved, None);
    assert_eq!(state.draft.title.as_deref(), Some("Buy milk"));
}

#[tokio::test]
async fn clearing_resets_the_draft() {
    let harness = Harness::granted();
    let presenter = SaveReminderPresenter::new(Arc::clone(&harness.registrar));
    fill_draft(&presenter);

    presenter.on_clear();

    assert_eq!(presenter.snapshot(), SaveReminderViewState::default());
}
