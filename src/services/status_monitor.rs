use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::status::{self, LectureStatus};

/// Periodic sweep over the schedule: re-derives every lecture's status and
/// logs the ones that just went live. Classification itself stays in
/// `status`; this only re-invokes it on an interval.
pub struct StatusMonitor {
    db: SqlitePool,
    interval: Duration,
    last_seen: HashMap<String, LectureStatus>,
}

#[derive(Debug, Serialize)]
pub struct SweepStats {
    pub upcoming: usize,
    pub live: usize,
    pub completed: usize,
    pub went_live: usize,
}

impl StatusMonitor {
    pub fn new(db: SqlitePool, interval_secs: u64) -> Self {
        Self {
            db,
            interval: Duration::from_secs(interval_secs),
            last_seen: HashMap::new(),
        }
    }

    /// Sweep in an endless loop at the configured interval.
    pub async fn start(mut self) {
        info!("Starting status monitor (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match self.sweep().await {
                Ok(stats) => {
                    info!(
                        "Status sweep - upcoming: {}, live: {}, completed: {}",
                        stats.upcoming, stats.live, stats.completed
                    );
                }
                Err(e) => {
                    warn!("Status sweep failed: {:?}", e);
                }
            }
        }
    }

    pub async fn sweep(&mut self) -> Result<SweepStats, AppError> {
        let now = chrono::Utc::now();
        let lectures = repository::fetch_lectures(&self.db).await?;

        let mut stats = SweepStats {
            upcoming: 0,
            live: 0,
            completed: 0,
            went_live: 0,
        };

        for lecture in lectures {
            let Some(scheduled) = status::parse_timestamp(&lecture.scheduled_time) else {
                warn!(
                    "lecture {} has an unreadable schedule: {}",
                    lecture.id, lecture.scheduled_time
                );
                continue;
            };

            let current = status::classify(scheduled, now);
            match current {
                LectureStatus::Upcoming => stats.upcoming += 1,
                LectureStatus::Live => stats.live += 1,
                LectureStatus::Completed => stats.completed += 1,
            }

            let previous = self.last_seen.insert(lecture.id.clone(), current);
            if current == LectureStatus::Live && previous != Some(LectureStatus::Live) {
                stats.went_live += 1;
                info!("Lecture live now: {} ({})", lecture.title, lecture.id);
            }
        }

        Ok(stats)
    }
}
