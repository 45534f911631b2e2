use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlchat::logging::init_logging;
use sqlchat::repl::{render_schema, write_turn};
use sqlchat::{
    Config, ConfigOverrides, IdentifierStyle, InteractiveRepl, OutputFormat, SchemaIntrospector,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sqlchat")]
#[command(about = "Ask a PostgreSQL database questions in plain language", long_about = None)]
struct Cli {
    /// YAML config file
    #[arg(long, global = true, env = "SQLCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// PostgreSQL connection string
    #[arg(long, global = true, env = "DB_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Google Generative AI API key
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long, global = true, env = "SQLCHAT_MODEL")]
    model: Option<String>,

    /// Send every question to the model, even with no schema overlap
    #[arg(long, global = true)]
    no_relevance_check: bool,

    /// Refuse to run anything but read-only SQL
    #[arg(long, global = true)]
    read_only: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question
    Ask {
        question: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Interactive session
    Repl {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the tables and columns of the public schema
    Schema,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            database_url: self.database_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            no_relevance_check: self.no_relevance_check,
            read_only: self.read_only,
        }
    }

    async fn execute(self) -> anyhow::Result<()> {
        let config = Config::load(self.config.as_deref(), self.overrides())
            .context("loading configuration")?;

        match self.command {
            Commands::Ask { question, format } => {
                let pipeline = config.build_pipeline()?;
                let turn = pipeline.ask(&question).await;
                write_turn(&mut std::io::stdout(), &turn, format)?;
                if !turn.is_success() {
                    std::process::exit(1);
                }
            }
            Commands::Repl { format } => {
                let pipeline = config.build_pipeline()?;
                InteractiveRepl::new(pipeline).with_format(format).run().await?;
            }
            Commands::Schema => {
                let database = config.build_database()?;
                let schema = SchemaIntrospector::new(IdentifierStyle::Plain)
                    .introspect(database.as_ref())
                    .await
                    .context("ERROR reading schema")?;
                println!("{}", render_schema(&schema));
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    cli.execute().await
}
