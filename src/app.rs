use crate::core::clock::{Clock, SystemClock};
use crate::core::logging::init_logging;
use crate::core::settings::load_settings;
use crate::shared::notify::{LogNotifier, NoDesktopNotifier, Notifier, Severity};
use crate::shared::paths::get_log_dir;
use crate::tasks::commands::{tasks_get_stats, TaskState};
use crate::tasks::reminders::{ReminderAlerts, ReminderScheduler, SchedulerConfig};
use crate::tasks::storage::{FileStore, TaskRepository};
use crate::tasks::store::TaskStore;
use crate::tasks::SharedStore;
use std::sync::Arc;

/// Runs the task engine until Ctrl-C.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Logging first, so settings and storage problems are recorded.
    let _logging_guards = init_logging(&get_log_dir())?;

    let settings = load_settings();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    let data_dir = settings.data_dir();
    tracing::info!(target: "system", data_dir = %data_dir.display(), "Starting taskdeck");

    let repository = TaskRepository::new(Arc::new(FileStore::new(data_dir)));
    let opened = TaskStore::open(repository, clock.clone());
    if let Some(e) = &opened.storage_error {
        notifier.notify(
            &format!("Could not load saved tasks: {}", e),
            Severity::Warning,
            settings.toast_duration(),
        );
    }
    let store = Arc::new(SharedStore::new(opened.into_value()));

    let alerts = ReminderAlerts::new(notifier.clone(), Arc::new(NoDesktopNotifier))
        .toast_duration(settings.reminder_toast_duration());
    let (scheduler, handle) = ReminderScheduler::new(
        store.clone(),
        alerts,
        clock,
        SchedulerConfig::from_settings(&settings),
    );
    store.write().set_reminder_handle(handle);

    let state = TaskState::new(store, notifier).toast_duration(settings.toast_duration());
    let stats = tasks_get_stats(&state);
    tracing::info!(
        target: "tasks",
        total = stats.total,
        pending = stats.pending,
        completed = stats.completed,
        "Tasks ready"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(scheduler.run(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(target: "system", "Failed to listen for Ctrl-C: {}", e);
        }
    }));

    tracing::info!(target: "system", "Shutting down");
    Ok(())
}
