use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use scholaris::cli::seeder::{SeedConfig, clear_all, seed_all};
use scholaris::cli::{check_db, check_permissions, create_system_admin};
use scholaris_db::{DatabaseConfig, PgPool, init_db_pool};

#[derive(Parser)]
#[command(name = "scholaris-cli")]
#[command(about = "Scholaris CLI - Administrative tools for Scholaris", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new system administrator account
    CreateSysadmin {
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        #[arg(short = 'l', long)]
        last_name: Option<String>,

        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake schools, classes and users
    Seed {
        #[arg(short = 's', long, default_value = "3")]
        schools: usize,

        #[arg(long, default_value = "6")]
        classes: usize,

        /// Students per class; each gets a parent account
        #[arg(long, default_value = "25")]
        students: usize,

        #[arg(long, default_value = "8")]
        teachers: usize,
    },
    /// Remove seeded data (real accounts and system admins are kept)
    ClearSeed,
    /// Connect and print masked connection details and the server version
    CheckDb,
    /// Check that the connected role can create and drop tables
    CheckPerm,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let config = DatabaseConfig::from_env()?;
    let pool = init_db_pool(&config)
        .await
        .context("failed to connect to database")?;

    match command {
        Commands::CreateSysadmin {
            first_name,
            last_name,
            email,
            password,
        } => handle_create_sysadmin(&pool, first_name, last_name, email, password).await,
        Commands::Seed {
            schools,
            classes,
            students,
            teachers,
        } => {
            let config = SeedConfig {
                schools,
                classes_per_school: classes,
                students_per_class: students,
                teachers_per_school: teachers,
                ..SeedConfig::default()
            };
            seed_all(&pool, config).await
        }
        Commands::ClearSeed => clear_all(&pool).await,
        Commands::CheckDb => {
            let report = check_db(&pool, &config.url).await?;
            println!("✅ Connected to {}", report.target);
            println!("   Database: {}", report.database);
            println!("   User: {}", report.current_user);
            println!("   Server: {}", report.server_version);
            Ok(())
        }
        Commands::CheckPerm => {
            check_permissions(&pool).await?;
            println!("✅ Role can create, write and drop tables");
            Ok(())
        }
    }
}

fn prompt(value: Option<String>, label: &str) -> anyhow::Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::new().with_prompt(label).interact_text()?),
    }
}

async fn handle_create_sysadmin(
    pool: &PgPool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let first_name = prompt(first_name, "First name")?;
    let last_name = prompt(last_name, "Last name")?;
    let email = prompt(email, "Email address")?;
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    create_system_admin(pool, &first_name, &last_name, &email, &password).await?;

    println!("\n✅ System admin created successfully!");
    println!("   Email: {}", email);
    println!("   Name: {} {}", first_name, last_name);
    Ok(())
}
