//! CLI interface for startup-box

use clap::{Parser, Subcommand, ValueEnum};
use anyhow::Result;
use std::path::PathBuf;

use crate::agents::knowledge::{Feedback, FeedbackKind, KnowledgeEntry, SourceType, DEFAULT_KNOWLEDGE_CONFIDENCE};
use crate::config::{self, InvokerMode};

#[derive(Parser)]
#[command(name = "startup-box")]
#[command(about = "Route startup tasks to specialist AI agents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a request, run the recommended agents and show their output
    Run {
        /// What you need help with (prompted for when omitted)
        task: Option<String>,
        /// Show credits and conversation ids
        #[arg(short, long)]
        verbose: bool,
        /// Save the full report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Classify a request without running any agents
    Classify {
        task: Option<String>,
        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Break a request into numbered subtasks
    Decompose {
        task: Option<String>,
    },
    /// Configure the gateway, models and agents
    Config {
        /// Set the LLM gateway API key
        #[arg(long)]
        set_api_key: Option<String>,
        /// Remove the stored API key
        #[arg(long)]
        delete_api_key: bool,
        /// Set the bearer token for remote agent functions
        #[arg(long)]
        set_functions_token: Option<String>,
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Set model for a role (usage: --set-model role model_id)
        #[arg(long, value_names = &["role", "model"], num_args = 2)]
        set_model: Option<Vec<String>>,
        /// Where agents run
        #[arg(long, value_enum)]
        agent_mode: Option<AgentModeArg>,
        /// Base URL of the agent functions (remote mode)
        #[arg(long)]
        functions_url: Option<String>,
        /// Print the default configuration file
        #[arg(long)]
        print_default: bool,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
    /// Show the credit balance
    Credits {
        /// Restore the starting balance
        #[arg(long)]
        reset: bool,
    },
    /// Show recent activity
    Activity {
        /// Clear the activity feed
        #[arg(long)]
        clear: bool,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the conversation each agent will continue
    Conversations {
        /// Start every agent's conversation over
        #[arg(long)]
        clear: bool,
    },
    /// Write to the shared knowledge base
    Knowledge {
        #[command(subcommand)]
        command: KnowledgeCommands,
    },
    /// Rate an agent decision so future outputs follow your preferences
    Feedback {
        /// Id of the logged decision
        decision_id: String,
        #[arg(value_enum)]
        rating: FeedbackArg,
        /// Preference this rating teaches (e.g. tagline_style)
        #[arg(long)]
        preference_type: Option<String>,
        /// The output you picked
        #[arg(long)]
        selected_output: Option<String>,
    },
}

#[derive(Subcommand)]
enum KnowledgeCommands {
    /// Store a fact, or update the existing one for the same entity and category
    Add {
        /// The fact itself
        content: String,
        /// Company or competitor the fact is about
        #[arg(long)]
        entity: String,
        /// e.g. pricing, features, funding
        #[arg(long)]
        category: String,
        #[arg(long, value_enum, default_value = "market-research")]
        source_type: SourceTypeArg,
        /// Where the fact was found
        #[arg(long)]
        url: Option<String>,
        /// Confidence between 0 and 1
        #[arg(long, default_value_t = DEFAULT_KNOWLEDGE_CONFIDENCE)]
        confidence: f32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AgentModeArg {
    Remote,
    Llm,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceTypeArg {
    Competitor,
    MarketResearch,
    UserPreference,
}

impl From<SourceTypeArg> for SourceType {
    fn from(arg: SourceTypeArg) -> Self {
        match arg {
            SourceTypeArg::Competitor => SourceType::Competitor,
            SourceTypeArg::MarketResearch => SourceType::MarketResearch,
            SourceTypeArg::UserPreference => SourceType::UserPreference,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FeedbackArg {
    Positive,
    Negative,
    Neutral,
}

impl From<FeedbackArg> for FeedbackKind {
    fn from(arg: FeedbackArg) -> Self {
        match arg {
            FeedbackArg::Positive => FeedbackKind::Positive,
            FeedbackArg::Negative => FeedbackKind::Negative,
            FeedbackArg::Neutral => FeedbackKind::Neutral,
        }
    }
}

impl From<AgentModeArg> for InvokerMode {
    fn from(arg: AgentModeArg) -> Self {
        match arg {
            AgentModeArg::Remote => InvokerMode::Remote,
            AgentModeArg::Llm => InvokerMode::Llm,
        }
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { task, verbose, output } => {
            crate::orchestrator::cli::run_orchestrator(task, verbose, output).await?;
        }
        Commands::Classify { task, json } => {
            crate::orchestrator::cli::classify_only(task, json).await?;
        }
        Commands::Decompose { task } => {
            crate::orchestrator::cli::decompose_only(task).await?;
        }
        Commands::Config {
            set_api_key,
            delete_api_key,
            set_functions_token,
            show,
            set_model,
            agent_mode,
            functions_url,
            print_default,
            reset,
        } => {
            let mut handled = false;

            if reset {
                config::reset_config()?;
                handled = true;
            }
            if let Some(key) = set_api_key {
                config::set_api_key(&key)?;
                handled = true;
            }
            if delete_api_key {
                crate::security::delete_api_key()?;
                println!("API key removed.");
                handled = true;
            }
            if let Some(token) = set_functions_token {
                crate::security::keyring::set_functions_token(&token)?;
                println!("Functions token stored securely.");
                handled = true;
            }
            if let Some(args) = set_model {
                if let [role, model] = args.as_slice() {
                    config::set_model(role, model)?;
                }
                handled = true;
            }
            if let Some(mode) = agent_mode {
                config::set_agent_mode(mode.into(), functions_url.as_deref())?;
                handled = true;
            } else if functions_url.is_some() {
                anyhow::bail!("--functions-url is only used together with --agent-mode");
            }
            if print_default {
                println!("{}", config::default_config_toml());
                handled = true;
            }
            if show || !handled {
                config::show_config()?;
            }
        }
        Commands::Credits { reset } => {
            crate::orchestrator::cli::credits(reset)?;
        }
        Commands::Activity { clear, json } => {
            crate::orchestrator::cli::activity(clear, json)?;
        }
        Commands::Conversations { clear } => {
            crate::orchestrator::cli::conversations(clear)?;
        }
        Commands::Knowledge { command } => match command {
            KnowledgeCommands::Add {
                content,
                entity,
                category,
                source_type,
                url,
                confidence,
            } => {
                let entry = KnowledgeEntry::new(content, source_type.into(), entity, category)
                    .with_source_url(url)
                    .with_confidence(confidence);
                crate::orchestrator::cli::store_knowledge(&entry).await?;
            }
        },
        Commands::Feedback {
            decision_id,
            rating,
            preference_type,
            selected_output,
        } => {
            let feedback = Feedback::new(decision_id, rating.into())
                .with_preference(preference_type, selected_output.map(serde_json::Value::String));
            crate::orchestrator::cli::send_feedback(&feedback).await?;
        }
    }

    Ok(())
}
