//! foodsearch: Food search with filters and per-user search history.
//!
//! Usage:
//!   foodsearch user create --email <email>   # Register a user
//!   foodsearch --user <id> search <term>     # Filtered search
//!   foodsearch --user <id> suggest [term]    # Autocomplete, or history when blank
//!   foodsearch --user <id> history list      # Show recent searches
//!
//! API credentials come from FOODSEARCH_APP_ID / FOODSEARCH_APP_KEY.

use clap::{Args, Parser, Subcommand};
use foodsearch::commands::{self, CreateUserInput, HistoryAction};
use foodsearch::db::{Database, UserStore};
use foodsearch::services::{
    DietaryFlags, EdamamClient, FilterConfiguration, FoodSearchService, NutritionApi, UserSession,
};
use foodsearch::{ApiConfig, SearchConfig};
use serde::Serialize;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "foodsearch")]
#[command(about = "Food search with nutrition filters and search history")]
#[command(version)]
struct Cli {
    /// Database path (default: ~/.cache/foodsearch/users.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// User the command runs as
    #[arg(long, global = true, env = "FOODSEARCH_USER")]
    user: Option<String>,

    /// Print JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    /// Maximum nutrient lookups in flight per search
    #[arg(long, global = true, default_value = "4")]
    concurrency: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for foods or meals
    Search {
        /// Search term
        term: String,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Suggest completions; with no term, list recent searches
    Suggest {
        /// Partial term
        #[arg(default_value = "")]
        term: String,
    },

    /// Re-fetch one food at one measure
    Detail {
        /// Food id from a search result
        food_id: String,

        /// Measure URI from a search result
        measure_uri: String,

        /// Measure label from a search result
        measure: String,

        /// Display name
        #[arg(long, default_value = "")]
        name: String,
    },

    /// Manage search history
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommand,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List recent searches
    List,
    /// Remove one term
    Remove { term: String },
    /// Remove every term
    Clear,
}

#[derive(Subcommand)]
enum UserCommand {
    /// Register a new user
    Create {
        #[arg(long)]
        email: String,

        /// Explicit id (generated when omitted)
        #[arg(long, default_value = "")]
        id: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        /// Daily calorie goal
        #[arg(long, default_value = "0")]
        calorie_goal: f64,
    },
    /// Show the current user
    Show,
}

#[derive(Args)]
struct FilterArgs {
    /// Load the filter from a JSON file (other filter flags are ignored)
    #[arg(long)]
    filter: Option<PathBuf>,

    /// Return meals instead of ingredients
    #[arg(long)]
    meals: bool,

    #[arg(long)]
    min_calories: Option<f64>,
    #[arg(long)]
    max_calories: Option<f64>,
    #[arg(long)]
    min_fat: Option<f64>,
    #[arg(long)]
    max_fat: Option<f64>,
    #[arg(long)]
    min_sugar: Option<f64>,
    #[arg(long)]
    max_sugar: Option<f64>,

    /// Required diet labels, e.g. vegan,dairy-free
    #[arg(long, value_delimiter = ',')]
    diet: Vec<String>,
}

impl FilterArgs {
    fn into_configuration(self) -> anyhow::Result<FilterConfiguration> {
        if let Some(path) = self.filter {
            let text = std::fs::read_to_string(&path)?;
            return Ok(serde_json::from_str(&text)?);
        }

        let mut dietary = DietaryFlags::empty();
        for name in &self.diet {
            dietary |= DietaryFlags::parse_name(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown diet label: '{name}'"))?;
        }

        let base = if self.meals {
            FilterConfiguration::meals()
        } else {
            FilterConfiguration::ingredients()
        };

        Ok(base
            .with_calories(self.min_calories, self.max_calories)
            .with_fat(self.min_fat, self.max_fat)
            .with_sugar(self.min_sugar, self.max_sugar)
            .require(dietary))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Log to stderr only; stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("foodsearch=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let db_path = cli.db.unwrap_or_else(foodsearch::default_db_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store: Arc<dyn UserStore> = Arc::new(Database::open(&db_path)?);

    let color = !cli.json && std::io::stdout().is_terminal();
    let mut out = std::io::stdout().lock();
    let search_config = SearchConfig {
        max_concurrent_lookups: cli.concurrency,
    };

    match cli.command {
        Commands::User {
            action:
                UserCommand::Create {
                    email,
                    id,
                    first_name,
                    last_name,
                    calorie_goal,
                },
        } => {
            let input = CreateUserInput {
                id,
                email,
                first_name,
                last_name,
                calorie_goal,
            };
            let result = commands::execute_create_user(store, input)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            emit(&mut out, cli.json, &result, |w| {
                foodsearch::fmt::fmt_user(w, &result, color)
            })?;
        }

        Commands::User {
            action: UserCommand::Show,
        } => {
            let session = session(&store, cli.user.as_deref()).await?;
            let result = commands::execute_show_user(&session).await;
            emit(&mut out, cli.json, &result, |w| {
                foodsearch::fmt::fmt_user(w, &result, color)
            })?;
        }

        Commands::History { action } => {
            let session = session(&store, cli.user.as_deref()).await?;
            // History never reaches the API; credentials are optional here.
            let api_config = ApiConfig::from_env().unwrap_or_else(|_| ApiConfig::new("", ""));
            let service = service(api_config, &store, search_config)?;
            let action = match action {
                HistoryCommand::List => HistoryAction::List,
                HistoryCommand::Remove { term } => HistoryAction::Remove(term),
                HistoryCommand::Clear => HistoryAction::Clear,
            };
            let result = commands::execute_history(&service, &session, action)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            emit(&mut out, cli.json, &result, |w| {
                foodsearch::fmt::fmt_history(w, &result, color)
            })?;
        }

        Commands::Search { term, filter } => {
            let session = session(&store, cli.user.as_deref()).await?;
            let service = service(ApiConfig::from_env()?, &store, search_config)?;
            let input = commands::SearchInput {
                term,
                filter: Some(filter.into_configuration()?),
            };
            let result = commands::execute_search(&service, &session, input)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            emit(&mut out, cli.json, &result, |w| {
                foodsearch::fmt::fmt_search(w, &result, color)
            })?;
        }

        Commands::Suggest { term } => {
            let session = session(&store, cli.user.as_deref()).await?;
            let api_config = if term.trim().is_empty() {
                ApiConfig::from_env().unwrap_or_else(|_| ApiConfig::new("", ""))
            } else {
                ApiConfig::from_env()?
            };
            let service = service(api_config, &store, search_config)?;
            let input = commands::SuggestInput { term };
            let result = commands::execute_suggest(&service, &session, input)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            emit(&mut out, cli.json, &result, |w| {
                foodsearch::fmt::fmt_suggest(w, &result, color)
            })?;
        }

        Commands::Detail {
            food_id,
            measure_uri,
            measure,
            name,
        } => {
            let service = service(ApiConfig::from_env()?, &store, search_config)?;
            let input = commands::DetailInput {
                food_id,
                measure_uri,
                measure,
                name,
            };
            let result = commands::execute_detail(&service, input)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            emit(&mut out, cli.json, &result, |w| {
                foodsearch::fmt::fmt_detail(w, &result, color)
            })?;
        }
    }

    out.flush()?;
    Ok(())
}

async fn session(store: &Arc<dyn UserStore>, user: Option<&str>) -> anyhow::Result<UserSession> {
    let id = user.ok_or_else(|| anyhow::anyhow!("--user is required for this command"))?;
    commands::open_session(Arc::clone(store), id)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

fn service(
    api_config: ApiConfig,
    store: &Arc<dyn UserStore>,
    config: SearchConfig,
) -> anyhow::Result<FoodSearchService> {
    let api: Arc<dyn NutritionApi> = Arc::new(EdamamClient::new(api_config)?);
    Ok(FoodSearchService::with_config(api, Arc::clone(store), config))
}

fn emit<W: Write, T: Serialize>(
    w: &mut W,
    json: bool,
    value: &T,
    human: impl FnOnce(&mut W) -> std::io::Result<()>,
) -> anyhow::Result<()> {
    if json {
        writeln!(w, "{}", serde_json::to_string_pretty(value)?)?;
    } else {
        human(w)?;
    }
    Ok(())
}
