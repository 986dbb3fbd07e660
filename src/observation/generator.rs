//! Observation task generation, daily caching and completion

use chrono::{DateTime, Local, Utc};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    ActiveTasks, CompletedObservation, ObservationStats, ObservationTask, TaskGenerationConfig,
    TaskHistoryEntry, TaskOrganism, GENERIC_ORGANISM,
};
use crate::catalog::templates::fill_organism;
use crate::catalog::{Catalog, ObservationTemplate};
use crate::config::TasksConfig;
use crate::storage::{self, keys, KeyValueStore};
use crate::types::{Difficulty, Season};

/// Local calendar date the daily set is keyed by
fn local_date(now: DateTime<Utc>) -> String {
    now.with_timezone(&Local).date_naive().format("%Y-%m-%d").to_string()
}

pub struct TaskGenerator {
    store: Arc<dyn KeyValueStore>,
    catalog: Arc<Catalog>,
    config: TasksConfig,
}

impl TaskGenerator {
    pub fn new(store: Arc<dyn KeyValueStore>, catalog: Arc<Catalog>, config: TasksConfig) -> Self {
        Self { store, catalog, config }
    }

    pub async fn task_history(&self) -> Vec<TaskHistoryEntry> {
        storage::load_or_default(self.store.as_ref(), keys::OBSERVATION_TASK_HISTORY).await
    }

    pub async fn completed_observations(&self) -> Vec<CompletedObservation> {
        storage::load_or_default(self.store.as_ref(), keys::COMPLETED_OBSERVATIONS).await
    }

    /// The cached daily set, whatever day it belongs to
    pub async fn active_tasks(&self) -> Option<ActiveTasks> {
        match storage::read_json(self.store.as_ref(), keys::ACTIVE_OBSERVATION_TASKS).await {
            Ok(active) => active,
            Err(e) => {
                warn!("Ignoring unreadable task cache: {}", e);
                None
            }
        }
    }

    pub async fn generate_tasks(&self, config: &TaskGenerationConfig) -> Vec<ObservationTask> {
        self.generate_tasks_at(config, Utc::now()).await
    }

    pub async fn generate_tasks_at(&self, config: &TaskGenerationConfig, now: DateTime<Utc>) -> Vec<ObservationTask> {
        let history = self.task_history().await;
        let mut rng = rand::rng();
        self.plan_tasks(config, &history, now, &mut rng)
    }

    /// One generation pass over the catalog templates.
    ///
    /// Templates are filtered by season, difficulty and category, shuffled,
    /// then taken in order while skipping (category, focus) pairs still in
    /// their cooldown unless `include_expired` is set.
    pub fn plan_tasks<R: Rng + ?Sized>(
        &self,
        config: &TaskGenerationConfig,
        history: &[TaskHistoryEntry],
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<ObservationTask> {
        let season = Season::from_date(now.with_timezone(&Local).date_naive());
        let cooldown = self.config.cooldown();

        let mut candidates: Vec<&ObservationTemplate> = self
            .catalog
            .templates()
            .iter()
            .filter(|t| t.in_season(season))
            .filter(|t| config.admits(t.difficulty, t.category))
            .collect();
        candidates.shuffle(rng);

        let mut tasks = Vec::new();
        for template in candidates {
            if tasks.len() >= config.count {
                break;
            }
            let cooling_down = history.iter().any(|entry| {
                entry.category == template.category
                    && entry.focus == template.focus
                    && now - entry.last_completed_at < cooldown
            });
            if cooling_down && !config.include_expired {
                debug!("Skipping template {} during cooldown", template.id);
                continue;
            }
            tasks.push(self.instantiate(template, now, rng));
        }
        tasks
    }

    fn instantiate<R: Rng + ?Sized>(
        &self,
        template: &ObservationTemplate,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> ObservationTask {
        let organism = if template.requires_organism {
            self.catalog
                .species_in(template.category)
                .choose(rng)
                .map(|species| TaskOrganism {
                    taxon_id: species.id,
                    common_name: species.common_name.clone(),
                    scientific_name: species.scientific_name.clone(),
                })
        } else {
            None
        };
        let name = organism
            .as_ref()
            .map(|o| o.common_name.as_str())
            .unwrap_or(GENERIC_ORGANISM);

        ObservationTask {
            id: Uuid::new_v4().to_string(),
            template_id: template.id.clone(),
            category: template.category,
            focus: template.focus,
            difficulty: template.difficulty,
            title: fill_organism(&template.title, name),
            description: fill_organism(&template.description, name),
            points: template.difficulty.task_points(),
            organism,
            created_at: now,
            expires_at: now + self.config.expiry(),
        }
    }

    pub async fn daily_tasks(&self) -> Vec<ObservationTask> {
        self.daily_tasks_at(Utc::now()).await
    }

    /// Today's set from the cache, or a freshly composed and cached blend
    pub async fn daily_tasks_at(&self, now: DateTime<Utc>) -> Vec<ObservationTask> {
        let today = local_date(now);
        if let Some(active) = self.active_tasks().await {
            if active.date == today {
                return active.tasks;
            }
            debug!("Discarding task set from {}", active.date);
        }

        let history = self.task_history().await;
        let tasks = {
            let mut rng = rand::rng();
            self.compose_daily(&history, now, &mut rng)
        };

        info!("Generated {} observation tasks for {}", tasks.len(), today);
        let active = ActiveTasks {
            tasks: tasks.clone(),
            date: today,
        };
        storage::save_logged(self.store.as_ref(), keys::ACTIVE_OBSERVATION_TASKS, &active).await;
        tasks
    }

    /// The easy/medium/hard blend; tiers are disjoint so no template repeats
    pub fn compose_daily<R: Rng + ?Sized>(
        &self,
        history: &[TaskHistoryEntry],
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<ObservationTask> {
        let blend = [
            (Difficulty::Easy, self.config.daily_easy),
            (Difficulty::Medium, self.config.daily_medium),
            (Difficulty::Hard, self.config.daily_hard),
        ];
        blend
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .flat_map(|(difficulty, count)| {
                self.plan_tasks(&TaskGenerationConfig::exactly(difficulty, count), history, now, rng)
            })
            .collect()
    }

    /// Drop the cached set and compose a new one
    pub async fn refresh_tasks(&self) -> Vec<ObservationTask> {
        self.refresh_tasks_at(Utc::now()).await
    }

    pub async fn refresh_tasks_at(&self, now: DateTime<Utc>) -> Vec<ObservationTask> {
        storage::remove_logged(self.store.as_ref(), keys::ACTIVE_OBSERVATION_TASKS).await;
        self.daily_tasks_at(now).await
    }

    pub async fn complete_task(
        &self,
        task: &ObservationTask,
        observation_text: &str,
        location: &str,
        photo_ref: Option<String>,
    ) -> CompletedObservation {
        self.complete_task_at(task, observation_text, location, photo_ref, Utc::now())
            .await
    }

    /// Record what the learner saw, start the cooldown for the task's
    /// (category, focus) pair and drop it from the active set
    pub async fn complete_task_at(
        &self,
        task: &ObservationTask,
        observation_text: &str,
        location: &str,
        photo_ref: Option<String>,
        now: DateTime<Utc>,
    ) -> CompletedObservation {
        let store = self.store.as_ref();

        let completed = CompletedObservation {
            id: Uuid::new_v4().to_string(),
            task_id: task.id.clone(),
            observation_text: observation_text.to_string(),
            location: location.to_string(),
            completed_at: now,
            photo_ref,
            verified: false,
        };
        let mut observations = self.completed_observations().await;
        observations.push(completed.clone());
        storage::save_logged(store, keys::COMPLETED_OBSERVATIONS, &observations).await;

        let mut history = self.task_history().await;
        match history
            .iter_mut()
            .find(|entry| entry.category == task.category && entry.focus == task.focus)
        {
            Some(entry) => {
                entry.task_id = task.template_id.clone();
                entry.last_completed_at = now;
                entry.completion_count += 1;
            }
            None => history.push(TaskHistoryEntry {
                task_id: task.template_id.clone(),
                category: task.category,
                focus: task.focus,
                last_completed_at: now,
                completion_count: 1,
            }),
        }
        storage::save_logged(store, keys::OBSERVATION_TASK_HISTORY, &history).await;

        if let Some(mut active) = self.active_tasks().await {
            let before = active.tasks.len();
            active.tasks.retain(|t| t.id != task.id);
            if active.tasks.len() != before {
                storage::save_logged(store, keys::ACTIVE_OBSERVATION_TASKS, &active).await;
            }
        }

        info!("Completed observation task {} ({})", task.id, task.template_id);
        completed
    }

    pub async fn observation_stats(&self) -> ObservationStats {
        let observations = self.completed_observations().await;
        let history = self.task_history().await;

        let mut stats = ObservationStats {
            total: observations.len(),
            verified: observations.iter().filter(|o| o.verified).count(),
            ..Default::default()
        };
        for entry in &history {
            *stats.by_category.entry(entry.category).or_insert(0) += entry.completion_count as usize;
        }
        stats
    }
}
