mod config;
mod plan_cmds;
mod routine_cmds;
mod serve_cmd;
mod student_cmds;

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use studyweek_core::regenerate::RegenerationConfig;
use studyweek_db::models::CognitiveType;
use studyweek_db::pool;

use config::StudyweekConfig;

#[derive(Parser)]
#[command(name = "studyweek", about = "Weekly study-plan scheduling engine")]
struct Cli {
    /// Database URL (overrides STUDYWEEK_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a studyweek config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/studyweek")]
        db_url: String,
        /// API key for the plan proposer endpoint
        #[arg(long)]
        api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database if needed and apply migrations
    DbInit,
    /// Serve the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Student profiles and habit logs
    Student {
        #[command(subcommand)]
        command: StudentCommands,
    },
    /// Show a student's weekly availability
    Availability {
        /// Student ID
        student_id: Uuid,
    },
    /// Weekly plans and tasks
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Weekly routine (time blocks)
    Routine {
        #[command(subcommand)]
        command: RoutineCommands,
    },
}

#[derive(Subcommand)]
pub enum StudentCommands {
    /// Register a student
    Add {
        #[arg(long)]
        name: String,
        /// School grade
        #[arg(long)]
        grade: i32,
        #[arg(long, default_value_t = 1)]
        semester: i32,
        /// Comma-separated subjects (e.g. "math,english")
        #[arg(long, value_delimiter = ',')]
        subjects: Vec<String>,
        /// Learning style: speed_first, precision_first or burst_study
        #[arg(long, default_value = "speed_first")]
        style: CognitiveType,
    },
    /// Record a problem-solving habit summary for one subject
    Habit {
        /// Student ID
        student_id: Uuid,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        summary: String,
        /// Comma-separated habit tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Generate and store a seven-day plan
    Create {
        /// Student ID
        student_id: Uuid,
        /// First day of the week (default: next Monday)
        #[arg(long)]
        start_date: Option<NaiveDate>,
    },
    /// List day plans with their tasks
    Show {
        /// Student ID
        student_id: Uuid,
        /// Earliest date (inclusive)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest date (inclusive)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Mark a task done
    Done {
        /// Task ID
        task_id: Uuid,
        /// Reopen the task instead
        #[arg(long)]
        reopen: bool,
    },
}

#[derive(Subcommand)]
pub enum RoutineCommands {
    /// Replace the routine from a TOML file and regenerate affected plans
    Update {
        /// Student ID
        student_id: Uuid,
        /// Path to the routine TOML file
        file: PathBuf,
    },
}

/// Execute the `studyweek init` command: write config file.
fn cmd_init(db_url: &str, api_key: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        proposer: config::ProposerSection {
            api_key,
            ..config::ProposerSection::default()
        },
    };

    let path = config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    if has_key {
        println!("  proposer.api_key = (set)");
    } else {
        println!(
            "  proposer.api_key not set; export {} before generating plans",
            config::ENV_PROPOSER_API_KEY
        );
    }
    println!();
    println!("Next: run `studyweek db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `studyweek db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = StudyweekConfig::resolve(cli_db_url)?;

    println!("Initializing studyweek database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("studyweek db-init complete.");
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            api_key,
            force,
        } => {
            cmd_init(&db_url, api_key, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = StudyweekConfig::resolve(cli.database_url.as_deref())?;
            let proposer = resolved.build_proposer()?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let state =
                serve_cmd::AppState::new(db_pool.clone(), proposer, resolved.proposer_timeout);
            let result = serve_cmd::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
        Commands::Student { command } => {
            let resolved = StudyweekConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = student_cmds::run_student_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Availability { student_id } => {
            let resolved = StudyweekConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = routine_cmds::run_availability(&db_pool, student_id).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let resolved = StudyweekConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = match command {
                PlanCommands::Create {
                    student_id,
                    start_date,
                } => match resolved.build_proposer() {
                    Ok(proposer) => {
                        plan_cmds::cmd_create(
                            &db_pool,
                            proposer.as_ref(),
                            student_id,
                            start_date,
                            today(),
                            resolved.proposer_timeout,
                        )
                        .await
                    }
                    Err(e) => Err(e),
                },
                PlanCommands::Show {
                    student_id,
                    from,
                    to,
                } => plan_cmds::cmd_show(&db_pool, student_id, from, to).await,
                PlanCommands::Done { task_id, reopen } => {
                    plan_cmds::cmd_done(&db_pool, task_id, reopen).await
                }
            };
            db_pool.close().await;
            result?;
        }
        Commands::Routine {
            command: RoutineCommands::Update { student_id, file },
        } => {
            let resolved = StudyweekConfig::resolve(cli.database_url.as_deref())?;
            let proposer = resolved.build_proposer()?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let config = RegenerationConfig {
                proposer_timeout: resolved.proposer_timeout,
            };
            let result = routine_cmds::run_routine_update(
                &db_pool,
                proposer.as_ref(),
                student_id,
                &file,
                today(),
                &config,
            )
            .await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_plan_create_with_start_date() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "studyweek",
            "plan",
            "create",
            &id.to_string(),
            "--start-date",
            "2026-10-19",
        ])
        .unwrap();
        match cli.command {
            Commands::Plan {
                command:
                    PlanCommands::Create {
                        student_id,
                        start_date,
                    },
            } => {
                assert_eq!(student_id, id);
                assert_eq!(start_date, NaiveDate::from_ymd_opt(2026, 10, 19));
            }
            _ => panic!("expected plan create"),
        }
    }

    #[test]
    fn parses_student_add_subjects_and_style() {
        let cli = Cli::try_parse_from([
            "studyweek",
            "student",
            "add",
            "--name",
            "Mina",
            "--grade",
            "2",
            "--subjects",
            "math,english",
            "--style",
            "burst_study",
        ])
        .unwrap();
        match cli.command {
            Commands::Student {
                command:
                    StudentCommands::Add {
                        subjects, style, semester, ..
                    },
            } => {
                assert_eq!(subjects, vec!["math", "english"]);
                assert_eq!(style, CognitiveType::BurstStudy);
                assert_eq!(semester, 1);
            }
            _ => panic!("expected student add"),
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(Cli::try_parse_from(["studyweek", "availability", "not-a-uuid"]).is_err());
    }
}
