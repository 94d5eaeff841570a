use clap::{Parser, Subcommand};
use sea_orm::{Database, DbErr};
use sea_orm_migration::MigratorTrait;

use migration::Migrator;

#[derive(Parser, Debug)]
#[command(name = "migration")]
#[command(about = "Apply or inspect the Tally schema migrations")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./tally.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Option<Step>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Apply pending migrations (the default).
    Up {
        /// Apply at most this many.
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations.
    Down {
        /// Roll back this many; defaults to one.
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop every table and reapply all migrations.
    Fresh,
    /// List applied and pending migrations.
    Status,
}

async fn apply(db: &sea_orm::DatabaseConnection, step: Step) -> Result<(), DbErr> {
    match step {
        Step::Up { steps } => Migrator::up(db, steps).await,
        Step::Down { steps } => Migrator::down(db, Some(steps)).await,
        Step::Fresh => Migrator::fresh(db).await,
        Step::Status => Migrator::status(db).await,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let step = cli.command.unwrap_or(Step::Up { steps: None });

    let db = Database::connect(&cli.database_url).await?;
    apply(&db, step).await?;
    println!("{step:?} finished on {}", cli.database_url);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_is_the_default_step() {
        let cli = Cli::try_parse_from(["migration"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn down_rolls_back_one_step_unless_told_otherwise() {
        let cli = Cli::try_parse_from(["migration", "down"]).unwrap();
        assert_eq!(cli.command, Some(Step::Down { steps: 1 }));

        let cli = Cli::try_parse_from(["migration", "down", "--steps", "3"]).unwrap();
        assert_eq!(cli.command, Some(Step::Down { steps: 3 }));
    }

    #[tokio::test]
    async fn fresh_then_status_on_memory_database() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        apply(&db, Step::Fresh).await.unwrap();
        apply(&db, Step::Status).await.unwrap();
        apply(&db, Step::Down { steps: 3 }).await.unwrap();
        apply(&db, Step::Up { steps: None }).await.unwrap();
    }
}
