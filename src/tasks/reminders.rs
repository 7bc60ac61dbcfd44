//! Reminder delivery.
//!
//! Two paths reach the user:
//! - one-shot registrations, sent by the store when a task gets a future
//!   reminder and fired at that time;
//! - a periodic sweep that catches any open task whose reminder is within the
//!   tolerance window of "now", which also covers reminders whose one-shot was
//!   lost to a restart.
//!
//! A one-shot is checked against the store when it fires and is dropped if the
//! task is gone, completed, or now has a different reminder. Each
//! `(task, reminder)` pair is delivered at most once per scheduler lifetime.

use super::types::Task;
use super::SharedStore;
use crate::core::clock::{until_local, Clock};
use crate::core::settings::AppSettings;
use crate::shared::notify::{DesktopNotifier, Notifier, Severity};
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

/// Title of the OS-level reminder notification.
pub const REMINDER_TITLE: &str = "Task Reminder";

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_REMINDER_TOAST_DURATION: Duration = Duration::from_millis(10000);

/// Request to alert about `task_id` at `fire_at` (local wall-clock time).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub task_id: String,
    pub fire_at: NaiveDateTime,
}

/// Sending side used by the store to register one-shot reminders.
#[derive(Debug, Clone)]
pub struct ReminderHandle {
    tx: mpsc::UnboundedSender<Registration>,
}

impl ReminderHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Registration>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Returns false when the scheduler has shut down.
    pub fn register(&self, task_id: &str, fire_at: NaiveDateTime) -> bool {
        self.tx
            .send(Registration {
                task_id: task_id.to_string(),
                fire_at,
            })
            .is_ok()
    }
}

/// Fans a reminder out to the in-app and desktop notifiers.
pub struct ReminderAlerts {
    notifier: Arc<dyn Notifier>,
    desktop: Arc<dyn DesktopNotifier>,
    toast_duration: Duration,
}

impl ReminderAlerts {
    pub fn new(notifier: Arc<dyn Notifier>, desktop: Arc<dyn DesktopNotifier>) -> Self {
        Self {
            notifier,
            desktop,
            toast_duration: DEFAULT_REMINDER_TOAST_DURATION,
        }
    }

    pub fn toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = duration;
        self
    }

    pub fn emit(&self, task: &Task) {
        self.notifier.notify(
            &format!("Reminder: {}", task.title),
            Severity::Info,
            self.toast_duration,
        );

        if self.desktop.permission_granted() {
            self.desktop.show(REMINDER_TITLE, &task.title);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    pub sweep_interval: Duration,
    /// Maximum distance between "now" and a reminder for the sweep to report it.
    pub tolerance: chrono::Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            tolerance: chrono::Duration::minutes(1),
        }
    }
}

impl SchedulerConfig {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            sweep_interval: settings.sweep_interval(),
            tolerance: settings.reminder_tolerance(),
        }
    }
}

/// Open tasks whose reminder lies within `tolerance` of `now`, either side.
pub fn due_reminders(
    tasks: &[Task],
    now: NaiveDateTime,
    tolerance: chrono::Duration,
) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| !task.is_completed())
        .filter(|task| {
            task.reminder.is_some_and(|at| {
                let distance = if now >= at { now - at } else { at - now };
                distance <= tolerance
            })
        })
        .collect()
}

/// What happened to a reminder that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    Delivered,
    AlreadyDelivered,
    /// The task is gone, completed, or its reminder changed since registration.
    Stale,
}

struct PendingReminder {
    fire_at: NaiveDateTime,
    deadline: Instant,
}

pub struct ReminderScheduler {
    store: Arc<SharedStore>,
    alerts: ReminderAlerts,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    registrations: mpsc::UnboundedReceiver<Registration>,
    registrations_open: bool,
    /// At most one pending one-shot per task; a newer registration replaces the older.
    pending: HashMap<String, PendingReminder>,
    delivered: HashSet<(String, NaiveDateTime)>,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<SharedStore>,
        alerts: ReminderAlerts,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> (Self, ReminderHandle) {
        let (handle, registrations) = ReminderHandle::channel();

        let scheduler = Self {
            store,
            alerts,
            clock,
            config,
            registrations,
            registrations_open: true,
            pending: HashMap::new(),
            delivered: HashSet::new(),
        };

        (scheduler, handle)
    }

    /// Main event loop. Runs until `shutdown` resolves.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            target: "reminders",
            interval_secs = self.config.sweep_interval.as_secs(),
            "Reminder scheduler started"
        );

        let mut sweep_timer = tokio::time::interval(self.config.sweep_interval);
        sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            let next_deadline = self.next_deadline();

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(
                        target: "reminders",
                        pending = self.pending_count(),
                        "Reminder scheduler stopping"
                    );
                    break;
                }
                registration = self.registrations.recv(), if self.registrations_open => {
                    match registration {
                        Some(registration) => self.register(registration),
                        None => {
                            tracing::debug!(target: "reminders", "Registration channel closed");
                            self.registrations_open = false;
                        }
                    }
                }
                _ = sleep_until_next(next_deadline) => {
                    self.fire_expired();
                }
                _ = sweep_timer.tick() => {
                    self.sweep();
                }
            }
        }
    }

    /// Arms a one-shot. Registering a task again supersedes its previous one-shot.
    pub fn register(&mut self, registration: Registration) {
        let delay = until_local(&self.clock.now(), registration.fire_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        // The task's reminder was set again; earlier deliveries no longer count.
        self.delivered.retain(|(id, _)| id != &registration.task_id);

        let pending = PendingReminder {
            fire_at: registration.fire_at,
            deadline: Instant::now() + delay,
        };

        match self.pending.insert(registration.task_id.clone(), pending) {
            Some(previous) if previous.fire_at != registration.fire_at => tracing::debug!(
                target: "reminders",
                id = %registration.task_id,
                previous = %previous.fire_at,
                "Superseded pending reminder"
            ),
            _ => {}
        }

        tracing::debug!(
            target: "reminders",
            id = %registration.task_id,
            fire_at = %registration.fire_at,
            delay_secs = delay.as_secs(),
            "Reminder registered"
        );
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Fires a one-shot after checking it against the current task state.
    pub fn fire(&mut self, registration: &Registration) -> FireOutcome {
        let task = self.store.read().get(&registration.task_id).cloned();

        match task {
            Some(task) if !task.is_completed() && task.reminder == Some(registration.fire_at) => {
                self.deliver(&task)
            }
            _ => {
                tracing::debug!(
                    target: "reminders",
                    id = %registration.task_id,
                    "Suppressed stale reminder"
                );
                FireOutcome::Stale
            }
        }
    }

    /// Alerts every open task whose reminder is within tolerance of now.
    /// Returns how many alerts went out.
    pub fn sweep(&mut self) -> usize {
        let now = self.clock.now().naive_local();

        let due: Vec<Task> = {
            let store = self.store.read();
            let tasks = store.list();

            // Forget deliveries for tasks that are gone or were given a new reminder.
            self.delivered.retain(|(id, at)| {
                tasks
                    .iter()
                    .any(|task| &task.id == id && task.reminder == Some(*at))
            });

            due_reminders(tasks, now, self.config.tolerance)
                .into_iter()
                .cloned()
                .collect()
        };

        let delivered = due
            .iter()
            .filter(|task| self.deliver(task) == FireOutcome::Delivered)
            .count();

        tracing::trace!(target: "reminders", due = due.len(), delivered, "Sweep finished");
        delivered
    }

    fn deliver(&mut self, task: &Task) -> FireOutcome {
        let Some(at) = task.reminder else {
            return FireOutcome::Stale;
        };

        if !self.delivered.insert((task.id.clone(), at)) {
            tracing::trace!(target: "reminders", id = %task.id, "Reminder already delivered");
            return FireOutcome::AlreadyDelivered;
        }

        tracing::info!(target: "reminders", id = %task.id, at = %at, "Delivering reminder");
        self.alerts.emit(task);
        FireOutcome::Delivered
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|pending| pending.deadline).min()
    }

    fn fire_expired(&mut self) {
        let now = Instant::now();
        let expired: Vec<Registration> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(task_id, pending)| Registration {
                task_id: task_id.clone(),
                fire_at: pending.fire_at,
            })
            .collect();

        for registration in expired {
            self.pending.remove(&registration.task_id);
            self.fire(&registration);
        }
    }
}

async fn sleep_until_next(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
