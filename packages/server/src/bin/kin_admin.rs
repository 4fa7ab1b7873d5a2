//! Operator CLI
//!
//! Runs migrations, bootstraps the first super admin and mints bearer
//! tokens for admins (sign-in itself lives with the identity provider).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kin_core::common::utils::is_valid_email;
use kin_core::common::GlobalRole;
use kin_core::domains::admin_users::models::{AdminUser, CreateAdminUser};
use kin_core::domains::auth::{JwtService, DEFAULT_TOKEN_TTL_HOURS};
use kin_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "kin-admin")]
#[command(about = "Operator tasks for the Cognitive Kin API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Create a super admin, or promote an existing admin to one
    Bootstrap {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
    },

    /// Print a bearer token for an existing admin
    Token {
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = DEFAULT_TOKEN_TTL_HOURS)]
        hours: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,kin_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Migrate => {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            println!("Migrations applied");
        }
        Commands::Bootstrap { email, name } => {
            let user = bootstrap(&email, name, &pool).await?;
            println!("{} <{}> is a super admin ({})", user.display_name, user.email, user.id);
        }
        Commands::Token { email, hours } => {
            if hours <= 0 {
                bail!("--hours must be positive");
            }
            let user = AdminUser::find_by_email(&email, &pool)
                .await?
                .with_context(|| format!("No admin user with email {}", email))?;

            let jwt = JwtService::new(&config.jwt_secret, config.jwt_issuer.clone());
            let token = jwt.create_token(user.id, &user.email, chrono::Duration::hours(hours))?;
            println!("{}", token);
        }
    }

    Ok(())
}

async fn bootstrap(email: &str, name: Option<String>, pool: &PgPool) -> Result<AdminUser> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        bail!("{} is not a valid email address", email);
    }

    if let Some(existing) = AdminUser::find_by_email(&email, pool).await? {
        if existing.role == GlobalRole::SuperAdmin {
            return Ok(existing);
        }
        let promoted = AdminUser::update_role(existing.id, GlobalRole::SuperAdmin, pool)
            .await?
            .context("Admin user disappeared while promoting")?;
        tracing::info!(user_id = %promoted.id, "Promoted admin user to super admin");
        return Ok(promoted);
    }

    let display_name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());

    let created = AdminUser::create(
        CreateAdminUser {
            email,
            display_name,
            role: GlobalRole::SuperAdmin,
        },
        pool,
    )
    .await?;
    tracing::info!(user_id = %created.id, "Created super admin");
    Ok(created)
}
