//! Vacancy harvester CLI
//!
//! `run` harvests once, `schedule` keeps harvesting on the configured cron,
//! `skills` prints the key-skill report from the last detail snapshot.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use harvester::{
    count_key_skills, start_scheduler, Config, HarvestSettings, Harvester, SnapshotKind,
};
use hh_client::{Employment, Experience, HhClient, Schedule, VacancyDetail, VacancyQuery};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "harvester")]
#[command(about = "Harvest HeadHunter vacancies into JSON snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest once and exit
    Run {
        #[command(flatten)]
        query: QueryArgs,
        /// Take full records from the published snapshot instead of fetching them
        #[arg(long)]
        use_cache: bool,
    },

    /// Harvest on the configured cron until interrupted
    Schedule {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long)]
        use_cache: bool,
        /// Also run once immediately
        #[arg(long)]
        now: bool,
    },

    /// Print key-skill frequencies from the stored detail snapshot
    Skills {
        /// Number of skills to show
        #[arg(long, default_value = "20")]
        top: usize,
    },
}

/// Overrides for the configured query.
#[derive(Args)]
struct QueryArgs {
    /// Free-text search
    #[arg(long)]
    text: Option<String>,
    /// noExperience, between1And3, between3And6, moreThan6
    #[arg(long)]
    experience: Option<Experience>,
    /// full, part, project, volunteer, probation
    #[arg(long)]
    employment: Option<Employment>,
    /// fullDay, shift, flexible, remote, flyInFlyOut
    #[arg(long = "schedule-type")]
    schedule: Option<Schedule>,
    /// Recency window in days (max 30)
    #[arg(long)]
    period: Option<u32>,
    /// Page size (max 100)
    #[arg(long)]
    per_page: Option<u32>,
}

impl QueryArgs {
    fn resolve(&self, base: &VacancyQuery) -> Result<VacancyQuery> {
        let query = VacancyQuery::builder()
            .text(self.text.clone().unwrap_or_else(|| base.text().to_string()))
            .experience(self.experience.or(base.experience()))
            .employment(self.employment.or(base.employment()))
            .schedule(self.schedule.or(base.schedule()))
            .period(self.period.unwrap_or(base.period()))
            .per_page(self.per_page.unwrap_or(base.per_page()))
            .build();
        query.validate().context("Invalid query")?;
        Ok(query)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,harvester=debug,hh_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Run { query, use_cache } => {
            let query = query.resolve(&config.query)?;
            let harvester = build_harvester(&config)?;

            let report = harvester
                .run_once(&query, use_cache)
                .await
                .context("Harvest failed")?;

            println!(
                "Vacancies: {} (pages {})",
                report.summaries.len(),
                report.summaries.completeness
            );
            println!(
                "Full records: {} ({})",
                report.details.len(),
                report.details.completeness
            );
            for failure in &report.summaries.failures {
                let page = failure.page.unwrap_or_default();
                println!("  page {} skipped: {}", page, failure.message);
            }
            for failure in &report.details.failures {
                let id = failure.id.as_deref().unwrap_or("?");
                println!("  vacancy {} skipped: {}", id, failure.message);
            }
            println!("Snapshots in {}", harvester.store().dir().display());
        }

        Commands::Schedule {
            query,
            use_cache,
            now,
        } => {
            let query = query.resolve(&config.query)?;
            let harvester = Arc::new(build_harvester(&config)?);

            if now {
                let job = Arc::clone(&harvester).job(query.clone(), use_cache);
                job().await;
            }

            let mut scheduler =
                start_scheduler(Arc::clone(&harvester), query, use_cache, &config.schedule)
                    .await
                    .context("Failed to start scheduler")?;

            tracing::info!(schedule = %config.schedule, "Waiting for scheduled runs (Ctrl-C to stop)");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;

            tracing::info!("Shutting down scheduler");
            scheduler
                .shutdown()
                .await
                .map_err(|e| anyhow::anyhow!("Scheduler shutdown failed: {}", e))?;
        }

        Commands::Skills { top } => {
            let harvester = build_harvester(&config)?;
            let details: Vec<VacancyDetail> = harvester
                .store()
                .load_items(SnapshotKind::Details)
                .await
                .context("No detail snapshot; run `harvester run` first")?;

            println!("Top key skills across {} vacancies:", details.len());
            for skill in count_key_skills(&details).into_iter().take(top) {
                println!("{:>6}  {}", skill.count, skill.name);
            }
        }
    }

    Ok(())
}

fn build_harvester(config: &Config) -> Result<Harvester<HhClient>> {
    let client = HhClient::new(&config.endpoint)
        .context("HH_VACANCIES_ENDPOINT is not a valid URL")?
        .with_user_agent(&config.user_agent);
    Ok(Harvester::new(client, HarvestSettings::from(config)))
}
