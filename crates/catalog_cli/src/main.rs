//! Command-line smoke checks for the catalog core.
//!
//! Without `--db` (or `CATALOG_DB_PATH`) every run works on a fresh
//! in-memory database seeded with the demo catalog.

use catalog_core::{
    core_version, init_logging_from_config, open_db, open_db_in_memory, seed_demo_catalog,
    Argon2PasswordHasher, AuthService, CatalogConfig, CategoryService, Connection, PageRequest,
    ProductService, Sort, SqliteCategoryRepository, SqliteProductRepository,
    SqliteRoleRepository, SqliteTransactionManager, SqliteUserRepository,
};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "catalog_cli")]
#[command(about = "Catalog core smoke checks", version)]
struct Args {
    /// SQLite database file; in-memory demo catalog when omitted
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the core version
    Version,
    /// Apply pending schema migrations
    Migrate,
    /// Insert the demo catalog
    Seed,
    /// List all categories
    Categories,
    /// List one page of products
    Products {
        #[arg(default_value_t = 0)]
        page: u32,
        /// Page size; defaults to CATALOG_PAGE_SIZE or 12
        size: Option<u32>,
        /// Sort as `property` or `property,asc|desc`
        sort: Option<Sort>,
    },
    /// Look a user up by email
    User { email: String },
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", json!({ "status": "error", "error": err.to_string() }));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = CatalogConfig::from_env()?;
    if args.db.is_some() {
        config.db_path = args.db;
    }
    init_logging_from_config(&config)?;

    if let Command::Version = args.command {
        println!("{}", json!({ "version": core_version() }));
        return Ok(());
    }
    if let Command::Seed = args.command {
        ensure_seed_target(&config)?;
    }

    let conn = open_connection(&config)?;
    let tx = SqliteTransactionManager::new(&conn);

    match args.command {
        Command::Version => {}
        Command::Migrate => {
            let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
            println!("{}", json!({ "status": "ok", "schemaVersion": version }));
        }
        Command::Seed => {
            seed_demo_catalog(&conn)?;
            println!("{}", json!({ "status": "ok" }));
        }
        Command::Categories => {
            let service = CategoryService::new(SqliteCategoryRepository::new(&conn), tx);
            for category in service.find_all()? {
                println!("{}", serde_json::to_string(&category)?);
            }
        }
        Command::Products { page, size, sort } => {
            let service = ProductService::new(
                SqliteProductRepository::new(&conn),
                SqliteCategoryRepository::new(&conn),
                tx,
            );
            let request = PageRequest {
                page,
                size: size.unwrap_or(config.default_page_size),
                sort,
            };
            println!("{}", serde_json::to_string(&service.find_all_paged(&request)?)?);
        }
        Command::User { email } => {
            let service = AuthService::new(
                SqliteUserRepository::new(&conn),
                SqliteRoleRepository::new(&conn),
                tx,
                Argon2PasswordHasher::new(),
            );
            let principal = service.load_user_by_username(&email)?;
            println!(
                "{}",
                json!({
                    "id": principal.id(),
                    "username": principal.username(),
                    "authorities": principal.authorities(),
                })
            );
        }
    }
    Ok(())
}

/// `seed` only makes sense against a file; the in-memory catalog is
/// seeded on open.
fn ensure_seed_target(config: &CatalogConfig) -> Result<(), Box<dyn Error>> {
    if config.db_path.is_none() {
        return Err("seed requires --db or CATALOG_DB_PATH; the in-memory catalog is already seeded".into());
    }
    Ok(())
}

fn open_connection(config: &CatalogConfig) -> Result<Connection, Box<dyn Error>> {
    match &config.db_path {
        Some(path) => {
            info!("event=cli_open module=cli status=ok mode=file");
            Ok(open_db(path)?)
        }
        None => {
            let conn = open_db_in_memory()?;
            seed_demo_catalog(&conn)?;
            Ok(conn)
        }
    }
}
