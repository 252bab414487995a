//! Command-line front end for the newsdesk store.
//!
//! # Responsibility
//! - Parse arguments and dispatch to `newsdesk_core` services.
//! - Map failures to exit codes: 2 for invalid input, 1 for everything else.

mod commands;

use clap::{Parser, Subcommand};
use commands::CliError;
use newsdesk_core::NewsdeskConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "newsdesk", version, about = "Editorial desk: redactors, topics and articles")]
struct Cli {
    /// SQLite database file (overrides NEWSDESK_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Register a new redactor
    Register {
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        years: Option<i64>,
        #[arg(long)]
        password: String,
        /// Repeated password; defaults to `--password`
        #[arg(long)]
        password_confirm: Option<String>,
    },
    /// Add a topic if it does not exist yet
    TopicAdd { name: String },
    /// Publish a new article as `--as`
    ArticleCreate {
        #[command(flatten)]
        article: ArticleArgs,
    },
    /// Rewrite an article the acting redactor co-authors
    ArticleUpdate {
        id: uuid::Uuid,
        #[command(flatten)]
        article: ArticleArgs,
    },
    /// Delete an article the acting redactor co-authors
    ArticleDelete {
        id: uuid::Uuid,
        /// Acting redactor username
        #[arg(long = "as")]
        actor: String,
    },
    /// List articles, newest first
    ArticleList {
        /// Topic name, case-insensitive
        #[arg(long)]
        category: Option<String>,
        /// Matches title, author names and keywords
        #[arg(long)]
        query: Option<String>,
        /// Only articles co-authored by this username; excludes the filters above
        #[arg(long, conflicts_with_all = ["category", "query"])]
        author: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Delete a redactor and every article they authored alone
    RedactorDelete { username: String },
}

#[derive(clap::Args)]
struct ArticleArgs {
    /// Acting redactor username
    #[arg(long = "as")]
    actor: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    content: String,
    /// Topic name; created when absent
    #[arg(long)]
    topic: String,
    /// Comma-separated keywords
    #[arg(long, default_value = "")]
    keywords: String,
    /// Co-author username, repeatable
    #[arg(long = "author")]
    authors: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let result = load_config(cli.db).and_then(|config| run(&config, cli.command));

    match result {
        Ok(()) => {}
        Err(CliError::Validation(errors)) => {
            for error in errors.errors() {
                eprintln!("{}: {}", error.field, error.message);
            }
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

fn load_config(db: Option<PathBuf>) -> Result<NewsdeskConfig, CliError> {
    let mut config = NewsdeskConfig::from_env()?;
    if let Some(path) = db {
        config.db_path = path;
    }
    if let Some(log_dir) = config.log_dir.as_deref() {
        newsdesk_core::init_logging(&config.log_level, log_dir).map_err(CliError::Other)?;
    }
    Ok(config)
}

fn run(config: &NewsdeskConfig, command: Commands) -> Result<(), CliError> {
    let conn = newsdesk_core::open_db(&config.db_path)?;
    let desk = commands::Desk::new(&conn, config)?;

    match command {
        Commands::Migrate => {
            println!("schema ready at {}", config.db_path.display());
            Ok(())
        }
        Commands::Register {
            username,
            first_name,
            last_name,
            years,
            password,
            password_confirm,
        } => desk.register(newsdesk_core::Registration {
            username,
            first_name,
            last_name,
            years_of_experience: years,
            password2: password_confirm.unwrap_or_else(|| password.clone()),
            password1: password,
        }),
        Commands::TopicAdd { name } => desk.topic_add(&name),
        Commands::ArticleCreate { article } => desk.article_create(article.into()),
        Commands::ArticleUpdate { id, article } => desk.article_update(id, article.into()),
        Commands::ArticleDelete { id, actor } => desk.article_delete(id, &actor),
        Commands::ArticleList {
            category,
            query,
            author,
            page,
        } => desk.article_list(category, query, author.as_deref(), page),
        Commands::RedactorDelete { username } => desk.redactor_delete(&username),
    }
}

impl From<ArticleArgs> for commands::ArticleInput {
    fn from(value: ArticleArgs) -> Self {
        Self {
            actor: value.actor,
            title: value.title,
            content: value.content,
            topic: value.topic,
            keywords: value.keywords,
            co_authors: value.authors,
        }
    }
}
