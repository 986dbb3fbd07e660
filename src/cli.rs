//! CLI interface for nature-quest

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::{self, Config};
use crate::observation::{TaskGenerationConfig, TaskGenerator};
use crate::profile::{LearnerProfile, ProfileSource, StoredProfile};
use crate::progression::{ExperimentStatus, ObservationInput, ProgressionEngine, ResolvedSteps};
use crate::storage::{FileStore, KeyValueStore};
use crate::taxa::{INaturalistClient, MinIntervalGate, TaxonCache};
use crate::types::{Difficulty, TaskCategory};

#[derive(Parser)]
#[command(name = "nature-quest")]
#[command(about = "Weekly science experiments and daily nature observations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show progress, points and streak (default when no command given)
    Status,
    /// Show the next experiment to do
    Next,
    /// List the curriculum with each experiment's status
    Experiments,
    /// Show the steps of an experiment for the learner's age group
    Steps {
        /// Experiment id
        id: String,
    },
    /// Mark an experiment as done
    Complete {
        /// Experiment id
        id: String,
        /// What happened
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Rating from 1 to 5
        #[arg(short, long, default_value = "5")]
        rating: u8,
        /// Reference to a photo of the result
        #[arg(long)]
        photo: Option<String>,
    },
    /// List earned badges
    Badges,
    /// Show today's observation tasks
    Tasks {
        /// Throw away today's tasks and generate new ones
        #[arg(long, conflicts_with_all = ["category", "max_difficulty", "count", "include_recent"])]
        refresh: bool,
        /// Generate extra tasks in these categories instead of showing today's
        #[arg(short, long)]
        category: Vec<String>,
        /// Hardest difficulty for extra tasks (easy, medium, hard, expert)
        #[arg(long)]
        max_difficulty: Option<String>,
        /// Number of extra tasks
        #[arg(short = 'n', long, default_value = "3")]
        count: usize,
        /// Include activities done recently
        #[arg(long)]
        include_recent: bool,
    },
    /// Record an observation for one of today's tasks
    Observe {
        /// Task id (a unique prefix is enough)
        task_id: String,
        /// What you saw
        #[arg(short, long)]
        text: String,
        /// Where you saw it
        #[arg(short, long, default_value = "")]
        location: String,
        /// Reference to a photo
        #[arg(long)]
        photo: Option<String>,
    },
    /// List recorded observations
    Observations,
    /// Look up species by name
    Species {
        /// Name to search for
        query: String,
        /// Maximum results to return
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
    /// Show or update the learner profile
    Profile {
        /// Age group label, e.g. "6-7"
        #[arg(long)]
        age_group: Option<String>,
        /// Nickname
        #[arg(long)]
        nickname: Option<String>,
    },
    /// Forget all experiment progress
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show configuration
    Config {
        /// Print the config file path only
        #[arg(long)]
        path: bool,
    },
}

/// Engines wired to the configured store and catalog
struct App {
    engine: ProgressionEngine,
    tasks: TaskGenerator,
    profile: StoredProfile,
    taxa: Option<Arc<TaxonCache>>,
}

impl App {
    fn build(config: &Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::from_config(config)?);
        let catalog = Arc::new(Catalog::load(config)?);

        let taxa = if config.species.enabled {
            let client = INaturalistClient::new(&config.species)
                .context("Failed to build species reference client")?;
            Some(Arc::new(TaxonCache::new(
                store.clone(),
                Arc::new(client),
                MinIntervalGate::new(config.species.min_interval()),
            )))
        } else {
            None
        };

        let profiles: Arc<dyn ProfileSource> = Arc::new(StoredProfile::new(store.clone()));
        let mut engine = ProgressionEngine::new(store.clone(), catalog.clone(), profiles)
            .with_default_points(config.progression.default_points);
        if let Some(taxa) = &taxa {
            engine = engine.with_taxa(taxa.clone());
        }

        Ok(Self {
            engine,
            tasks: TaskGenerator::new(store.clone(), catalog, config.tasks.clone()),
            profile: StoredProfile::new(store),
            taxa,
        })
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let app = App::build(&config)?;

    match cli.command {
        None | Some(Commands::Status) => show_status(&app).await?,
        Some(Commands::Next) => show_next(&app).await?,
        Some(Commands::Experiments) => {
            for entry in app.engine.experiment_statuses().await {
                let marker = match entry.status {
                    ExperimentStatus::Completed => "✓",
                    ExperimentStatus::Available => "→",
                    ExperimentStatus::Locked => " ",
                };
                let experiment = &entry.experiment;
                println!(
                    "{} Week {:>2}  {:<22} {} ({})",
                    marker, experiment.week, experiment.id, experiment.title, experiment.difficulty
                );
            }
        }
        Some(Commands::Steps { id }) => {
            let resolved = app
                .engine
                .resolve_steps(&id)
                .await
                .with_context(|| format!("Unknown experiment: {}", id))?;
            print_steps(&resolved);
        }
        Some(Commands::Complete { id, notes, rating, photo }) => {
            if !(1..=5).contains(&rating) {
                bail!("Rating must be between 1 and 5");
            }
            let input = ObservationInput {
                notes,
                rating,
                photo_ref: photo,
            };
            let result = app.engine.complete_experiment(&id, input).await;
            if !result.success {
                println!("'{}' is already completed.", id);
                return Ok(());
            }
            println!("Completed '{}': +{} points", id, result.points_earned);
            for badge in &result.new_badges {
                println!("  New badge! {} {} - {}", badge.icon, badge.name, badge.description);
            }
        }
        Some(Commands::Badges) => {
            let progress = app.engine.progress().await;
            if progress.badges.is_empty() {
                println!("No badges yet. Complete an experiment to earn your first!");
            }
            for badge in &progress.badges {
                println!(
                    "{} {:<24} {}  ({})",
                    badge.icon,
                    badge.name,
                    badge.description,
                    badge.earned_at.format("%Y-%m-%d")
                );
            }
        }
        Some(Commands::Tasks { refresh, category, max_difficulty, count, include_recent }) => {
            let tasks = if !category.is_empty() || max_difficulty.is_some() || include_recent {
                let config = generation_config(&category, max_difficulty.as_deref(), count, include_recent)?;
                app.tasks.generate_tasks(&config).await
            } else if refresh {
                app.tasks.refresh_tasks().await
            } else {
                app.tasks.daily_tasks().await
            };
            if tasks.is_empty() {
                println!("No observation tasks found.");
            }
            for task in &tasks {
                println!(
                    "[{}] {} ({}, {} points)",
                    short_id(&task.id),
                    task.title,
                    task.difficulty,
                    task.points
                );
                println!("    {}", task.description);
            }
        }
        Some(Commands::Observe { task_id, text, location, photo }) => {
            let active = app.tasks.daily_tasks().await;
            let matches: Vec<_> = active.iter().filter(|t| t.id.starts_with(&task_id)).collect();
            let task = match matches.as_slice() {
                [task] => *task,
                [] => bail!("No active task matches '{}'", task_id),
                _ => bail!("'{}' matches more than one task", task_id),
            };
            let completed = app.tasks.complete_task(task, &text, &location, photo).await;
            println!("Recorded observation {} for '{}'", short_id(&completed.id), task.title);
        }
        Some(Commands::Observations) => {
            let observations = app.tasks.completed_observations().await;
            for observation in &observations {
                println!(
                    "{}  {}  {}",
                    observation.completed_at.format("%Y-%m-%d"),
                    if observation.location.is_empty() { "-" } else { &observation.location },
                    observation.observation_text
                );
            }
            let stats = app.tasks.observation_stats().await;
            println!();
            println!("Total: {} ({} verified)", stats.total, stats.verified);
            for (category, count) in &stats.by_category {
                println!("  {:<12} {}", category.to_string(), count);
            }
        }
        Some(Commands::Species { query, limit }) => {
            let Some(taxa) = &app.taxa else {
                bail!("Species lookups are disabled in the configuration");
            };
            let results = taxa.search(&query, limit).await;
            if results.is_empty() {
                println!("No species found for '{}'", query);
            }
            for record in &results {
                println!("{:>8}  {} ({})", record.id, record.display_name(), record.scientific_name);
            }
        }
        Some(Commands::Profile { age_group, nickname }) => {
            let mut profile = app.profile.get().await.unwrap_or_default();
            if age_group.is_none() && nickname.is_none() {
                if profile.age_group.is_empty() {
                    println!("No profile yet. Set one with --age-group.");
                } else {
                    println!("Age group: {}", profile.age_group);
                    println!("Nickname:  {}", profile.nickname);
                }
                return Ok(());
            }
            if let Some(age_group) = age_group {
                profile.age_group = age_group;
            }
            if let Some(nickname) = nickname {
                profile.nickname = nickname;
            }
            save_profile(&app.profile, &profile).await?;
            println!("Profile saved.");
        }
        Some(Commands::Reset { yes }) => {
            if !yes {
                use std::io::Write;
                print!("This forgets all experiment progress. Continue? [y/N] ");
                std::io::stdout().flush()?;
                let mut answer = String::new();
                std::io::stdin().read_line(&mut answer)?;
                if !answer.trim().eq_ignore_ascii_case("y") {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            app.engine.reset().await;
            println!("Progress reset.");
        }
        Some(Commands::Config { path }) => {
            if path {
                println!("{}", config::config_path()?.display());
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

async fn show_status(app: &App) -> Result<()> {
    let progress = app.engine.progress().await;
    let total = app.engine.eligible_experiments().await.len();

    println!("Nature Quest Progress");
    println!("=====================");
    println!("Week: {}", progress.current_week);
    println!("Experiments: {}/{}", progress.total_completed, total);
    println!("Points: {}", progress.total_points);
    println!("Streak: {}", progress.streak);
    println!("Badges: {}", progress.badges.len());
    if !progress.unlocked_categories.is_empty() {
        println!("Categories: {}", progress.unlocked_categories.join(", "));
    }
    Ok(())
}

async fn show_next(app: &App) -> Result<()> {
    let Some(current) = app.engine.current_experiment().await else {
        println!("You finished the whole curriculum!");
        return Ok(());
    };
    let experiment = &current.experiment;

    println!("Week {}: {} [{}]", experiment.week, experiment.title, experiment.id);
    println!("{}", experiment.description);
    println!("Difficulty: {}  Points: {}", experiment.difficulty, experiment.points);
    if let Some(taxon) = &current.taxon {
        println!("Featured organism: {}", taxon.name);
        if let Some(summary) = &taxon.summary {
            println!("  {}", summary);
        }
    }
    if !experiment.materials.is_empty() {
        println!();
        println!("Materials:");
        for item in &experiment.materials {
            println!("  - {}", item);
        }
    }
    if let Some(resolved) = app.engine.resolve_steps(&experiment.id).await {
        println!();
        print_steps(&resolved);
    }
    if !experiment.safety_notes.is_empty() {
        println!();
        println!("Safety:");
        for note in &experiment.safety_notes {
            println!("  ! {}", note);
        }
    }
    Ok(())
}

fn print_steps(resolved: &ResolvedSteps) {
    match &resolved.variant {
        Some(variant) => println!("Steps ({} version, about {}):", variant, resolved.estimated_time),
        None => println!("Steps (about {}):", resolved.estimated_time),
    }
    for (i, step) in resolved.steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
}

fn generation_config(
    categories: &[String],
    max_difficulty: Option<&str>,
    count: usize,
    include_expired: bool,
) -> Result<TaskGenerationConfig> {
    let categories = categories
        .iter()
        .map(|c| TaskCategory::parse(c).with_context(|| format!("Unknown category: {}", c)))
        .collect::<Result<Vec<_>>>()?;
    let max_difficulty = match max_difficulty {
        Some(d) => Difficulty::parse(d).with_context(|| format!("Unknown difficulty: {}", d))?,
        None => Difficulty::Expert,
    };
    Ok(TaskGenerationConfig {
        categories: if categories.is_empty() { None } else { Some(categories) },
        max_difficulty,
        min_difficulty: None,
        include_expired,
        count,
    })
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

async fn save_profile(store: &StoredProfile, profile: &LearnerProfile) -> Result<()> {
    if !store.save(profile).await {
        bail!("Failed to save profile");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complete_command() {
        let cli = Cli::try_parse_from(["nature-quest", "complete", "rainbow-milk", "-n", "swirly", "-r", "4"]).unwrap();
        match cli.command {
            Some(Commands::Complete { id, notes, rating, photo }) => {
                assert_eq!(id, "rainbow-milk");
                assert_eq!(notes, "swirly");
                assert_eq!(rating, 4);
                assert!(photo.is_none());
            }
            _ => panic!("expected complete command"),
        }
    }

    #[test]
    fn test_refresh_rejects_filter_flags() {
        for extra in [["--category", "birds"], ["--max-difficulty", "hard"]] {
            let args = ["nature-quest", "tasks", "--refresh", extra[0], extra[1]];
            assert!(Cli::try_parse_from(args).is_err());
        }
        assert!(Cli::try_parse_from(["nature-quest", "tasks", "--refresh", "--include-recent"]).is_err());

        match Cli::try_parse_from(["nature-quest", "tasks", "--refresh"]).unwrap().command {
            Some(Commands::Tasks { refresh, category, .. }) => {
                assert!(refresh);
                assert!(category.is_empty());
            }
            _ => panic!("expected tasks command"),
        }
    }

    #[test]
    fn test_generation_config_from_flags() {
        let config = generation_config(&["birds".into(), "Sky".into()], Some("medium"), 4, false).unwrap();
        assert_eq!(config.categories, Some(vec![TaskCategory::Birds, TaskCategory::Sky]));
        assert_eq!(config.max_difficulty, Difficulty::Medium);
        assert_eq!(config.count, 4);

        let config = generation_config(&[], None, 2, true).unwrap();
        assert!(config.categories.is_none());
        assert_eq!(config.max_difficulty, Difficulty::Expert);
        assert!(config.include_expired);

        assert!(generation_config(&["dragons".into()], None, 1, false).is_err());
        assert!(generation_config(&[], Some("impossible"), 1, false).is_err());
    }
}
