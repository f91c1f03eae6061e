//! Brief Scheduler
//!
//! Drives the brief lifecycle without manual intervention:
//! - expiry sweep: complete expired briefs, renew them for auto-generating guilds
//! - daily generation: one brief per auto-generating guild whose channel is idle
//! - custom timers: per-channel cron schedules, replaced on re-registration
//!
//! Each timer is its own task. A tick runs to completion before that timer
//! computes its next fire time, so a timer never overlaps itself. `stop()`
//! signals every timer; a tick already running finishes normally.

use chrono::{DateTime, Local};
use machine_core::config::SchedulerConfig;
use machine_core::{Brief, Result, ServerSettings};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::cron::CronSchedule;
use crate::manager::{BriefManager, BriefRequest};
use crate::settings::SettingsStore;

const EXPIRY_TIMER: &str = "check-expired";
const DAILY_TIMER: &str = "daily-brief";

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Briefs completed because they expired.
    pub completed: usize,
    /// Briefs created by this tick.
    pub created: usize,
    /// Items that failed and were skipped.
    pub failed: usize,
}

#[derive(Debug, Clone)]
enum Job {
    ExpirySweep,
    DailyGeneration,
    Custom {
        channel_id: String,
        duration_hours: u32,
    },
}

struct Timer {
    schedule: CronSchedule,
    shutdown: watch::Sender<bool>,
    _task: JoinHandle<()>,
}

/// The work a timer performs; cheap to clone into timer tasks.
#[derive(Clone)]
struct Jobs {
    manager: Arc<BriefManager>,
    settings: Arc<SettingsStore>,
}

pub struct BriefScheduler {
    jobs: Jobs,
    config: SchedulerConfig,
    timers: Mutex<HashMap<String, Timer>>,
}

impl BriefScheduler {
    pub fn new(
        manager: Arc<BriefManager>,
        settings: Arc<SettingsStore>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            jobs: Jobs { manager, settings },
            config,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Start the expiry sweep and daily generation timers.
    pub async fn start(&self) -> Result<()> {
        let sweep: CronSchedule = self.config.expiry_sweep.parse()?;
        let daily: CronSchedule = self.config.daily_generation.parse()?;

        self.register(EXPIRY_TIMER, sweep, Job::ExpirySweep).await;
        self.register(DAILY_TIMER, daily, Job::DailyGeneration).await;
        tracing::info!(
            "Brief scheduler started (sweep '{}', daily '{}')",
            self.config.expiry_sweep,
            self.config.daily_generation
        );
        Ok(())
    }

    /// Cancel every timer, custom ones included.
    pub async fn stop(&self) {
        let mut timers = self.timers.lock().await;
        for (_, timer) in timers.drain() {
            let _ = timer.shutdown.send(true);
        }
        tracing::info!("Brief scheduler stopped");
    }

    /// Issue a brief in `channel_id` on every match of `cron_expr`.
    ///
    /// Registering the same channel again replaces its previous timer.
    pub async fn schedule_custom_brief(
        &self,
        channel_id: &str,
        cron_expr: &str,
        duration_hours: u32,
    ) -> Result<()> {
        let schedule: CronSchedule = cron_expr.parse()?;
        let job = Job::Custom {
            channel_id: channel_id.to_string(),
            duration_hours,
        };
        self.register(&custom_timer_name(channel_id), schedule, job)
            .await;
        tracing::info!("Custom brief scheduled for channel {} ({})", channel_id, cron_expr);
        Ok(())
    }

    /// Remove a channel's custom timer. Returns false if there was none.
    pub async fn unschedule_custom_brief(&self, channel_id: &str) -> bool {
        match self.timers.lock().await.remove(&custom_timer_name(channel_id)) {
            Some(timer) => {
                let _ = timer.shutdown.send(true);
                true
            }
            None => false,
        }
    }

    /// Registered timers as `(name, cron expression)`, sorted by name.
    pub async fn timers(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .timers
            .lock()
            .await
            .iter()
            .map(|(name, t)| (name.clone(), t.schedule.to_string()))
            .collect();
        out.sort();
        out
    }

    pub async fn run_expiry_sweep(&self) -> TickReport {
        self.jobs.expiry_sweep().await
    }

    pub async fn run_daily_generation(&self) -> TickReport {
        self.jobs.daily_generation().await
    }

    async fn register(&self, name: &str, schedule: CronSchedule, job: Job) {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_timer(
            name.to_string(),
            schedule.clone(),
            job,
            self.jobs.clone(),
            shutdown_rx,
        ));
        let timer = Timer {
            schedule,
            shutdown,
            _task: task,
        };
        if let Some(previous) = self.timers.lock().await.insert(name.to_string(), timer) {
            let _ = previous.shutdown.send(true);
            tracing::debug!("Replaced timer {}", name);
        }
    }
}

fn custom_timer_name(channel_id: &str) -> String {
    format!("custom-{}", channel_id)
}

async fn run_timer(
    name: String,
    schedule: CronSchedule,
    job: Job,
    jobs: Jobs,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut last: Option<DateTime<Local>> = None;
    loop {
        let now = Local::now();
        // A sleep may end before the wall clock reaches `next`; never fire
        // the same minute twice.
        let from = match last {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        let Some(next) = schedule.next_after(&from) else {
            tracing::warn!("Timer {} has no future run for '{}'", name, schedule);
            return;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::debug!("Timer {} next run at {}", name, next);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.changed() => return,
        }

        last = Some(next);
        let report = jobs.run(&job).await;
        tracing::debug!("Timer {} tick finished: {:?}", name, report);

        if *shutdown.borrow() {
            return;
        }
    }
}

impl Jobs {
    async fn run(&self, job: &Job) -> TickReport {
        match job {
            Job::ExpirySweep => self.expiry_sweep().await,
            Job::DailyGeneration => self.daily_generation().await,
            Job::Custom {
                channel_id,
                duration_hours,
            } => self.custom(channel_id, *duration_hours).await,
        }
    }

    async fn expiry_sweep(&self) -> TickReport {
        let mut report = TickReport::default();
        let expired = self.manager.get_expired_briefs().await;
        if !expired.is_empty() {
            tracing::info!("Found {} expired briefs", expired.len());
        }

        for brief in expired {
            if let Err(e) = self.manager.complete_brief(&brief.id).await {
                tracing::warn!("Could not complete expired brief {}: {}", brief.id, e);
                report.failed += 1;
                continue;
            }
            report.completed += 1;

            let Some(settings) = self.settings_for(&brief).await else {
                continue;
            };
            if !settings.auto_generate_briefs {
                continue;
            }

            let request = BriefRequest::for_guild(&settings, &brief.channel_id);
            match self.manager.create(request).await {
                Ok(new_brief) => {
                    report.created += 1;
                    tracing::info!(
                        "Auto-generated brief {} for channel {}",
                        new_brief.id,
                        brief.channel_id
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        "Failed to auto-generate brief for channel {}: {}",
                        brief.channel_id,
                        e
                    );
                }
            }
        }
        report
    }

    async fn daily_generation(&self) -> TickReport {
        let mut report = TickReport::default();

        for settings in self.settings.all().await {
            if !settings.auto_generate_briefs {
                continue;
            }
            let Some(channel_id) = settings.channel() else {
                continue;
            };
            if !self.manager.active_in_channel(channel_id).await.is_empty() {
                continue;
            }

            let request = BriefRequest::for_guild(&settings, channel_id);
            match self.manager.create(request).await {
                Ok(_) => {
                    report.created += 1;
                    tracing::info!("Daily brief generated for server {}", settings.guild_id);
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        "Failed to generate daily brief for server {}: {}",
                        settings.guild_id,
                        e
                    );
                }
            }
        }
        report
    }

    async fn custom(&self, channel_id: &str, duration_hours: u32) -> TickReport {
        let mut request = match self.settings.find_by_channel(channel_id).await {
            Some(settings) => BriefRequest::for_guild(&settings, channel_id),
            None => BriefRequest::new(channel_id, duration_hours),
        };
        request.duration_hours = duration_hours;

        match self.manager.create(request).await {
            Ok(_) => TickReport {
                created: 1,
                ..Default::default()
            },
            Err(e) => {
                tracing::error!(
                    "Failed to create custom scheduled brief for channel {}: {}",
                    channel_id,
                    e
                );
                TickReport {
                    failed: 1,
                    ..Default::default()
                }
            }
        }
    }

    /// Settings governing renewal of `brief`: its guild when recorded,
    /// otherwise the guild whose configured channel it was posted in.
    async fn settings_for(&self, brief: &Brief) -> Option<ServerSettings> {
        if let Some(guild_id) = brief.guild_id.as_deref() {
            if let Some(settings) = self.settings.find(guild_id).await {
                return Some(settings);
            }
        }
        self.settings.find_by_channel(&brief.channel_id).await
    }
}
