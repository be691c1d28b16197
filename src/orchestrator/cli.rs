//! Orchestrator CLI - run, classify and decompose from the terminal, plus
//! knowledge and feedback calls to the hosted functions

use crate::agents::knowledge::{Feedback, KnowledgeEntry};
use crate::agents::RemoteAgentInvoker;
use crate::config::{self, Config};
use crate::orchestrator::{Orchestrator, RunReport, SessionContext, TaskAnalysis};
use crate::types::{ActivityStatus, AgentId};
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Build the orchestrator from the saved config and keyring
fn load_orchestrator(config: &Config) -> Result<Orchestrator> {
    let api_key = crate::security::get_api_key()?;
    Orchestrator::from_config(config, &api_key, crate::security::functions_token())
}

/// Client for the hosted functions, whichever agent mode is configured
fn functions_client(config: &Config) -> Result<RemoteAgentInvoker> {
    if config.agents.functions_url.is_empty() {
        anyhow::bail!("agents.functions_url is not set. Run 'startup-box config --agent-mode remote --functions-url URL' first.");
    }
    let mut client = RemoteAgentInvoker::new(
        &config.agents.functions_url,
        Duration::from_secs(config.agents.timeout_secs),
    )?;
    if let Some(token) = crate::security::functions_token() {
        client = client.with_token(token);
    }
    Ok(client)
}

fn read_task(task: Option<String>) -> Result<String> {
    match task {
        Some(task) => Ok(task.trim().to_string()),
        None => {
            println!("What do you need help with?");
            print!("> ");
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            Ok(input.trim().to_string())
        }
    }
}

fn load_session(config: &Config) -> Result<(SessionContext, PathBuf)> {
    let path = config::session_path()?;
    let session = SessionContext::load(&path, config.session.initial_credits, config.session.activity_capacity)?;
    Ok((session, path))
}

fn print_analysis(analysis: &TaskAnalysis) {
    println!("\n📊 Task Analysis:");
    println!("   Intent:     {}", analysis.intent);
    println!("   Complexity: {}", analysis.complexity);
    println!("   Confidence: {}%", analysis.confidence);
    println!("   Est. time:  {}", analysis.estimated_time);
    println!("   Model:      {}", analysis.recommended_model);
    if !analysis.suggested_workflow.is_empty() {
        println!("   Workflow:   {}", analysis.suggested_workflow);
    }

    if analysis.recommended_agents.is_empty() {
        println!("\n   No agents recommended.");
    } else {
        println!("\n🤖 Agent Team:");
        for (i, agent) in analysis.recommended_agents.iter().enumerate() {
            let profile = agent.profile();
            println!("   {}. {} ({})", i + 1, profile.label, profile.description);
            if let Some(subtask) = analysis.subtask_for(i) {
                println!("      Task: {}", subtask);
            }
        }
    }

    if let Some(subtasks) = &analysis.subtasks {
        if subtasks.len() > analysis.recommended_agents.len() {
            println!("\n   {} subtasks without an agent:", subtasks.len() - analysis.recommended_agents.len());
            for subtask in &subtasks[analysis.recommended_agents.len()..] {
                println!("      - {}", subtask);
            }
        }
    }
}

fn print_report(report: &RunReport, verbose: bool) {
    if let Some(err) = &report.decomposition_error {
        println!("\n⚠️  {}", err);
        println!("   Agents ran on the original request.");
    }

    let result = &report.result;
    if result.results.is_empty() {
        return;
    }

    println!("\n📊 Agent Results:");
    println!("{}", "─".repeat(60));
    for result in &result.results {
        let status = if result.is_completed() { "✅" } else { "❌" };
        println!("\n{} {}", status, result.agent.profile().label);
        if verbose {
            if let Some(id) = &result.conversation_id {
                println!("   Conversation: {}", id);
            }
            println!("{}", result.output);
        } else {
            println!("{}", result.deliverable());
        }
    }
    println!("\n{}", "─".repeat(60));
    println!("   {} completed, {} failed", result.completed(), result.failed());
}

fn print_progress(agent: AgentId, status: ActivityStatus) {
    match status {
        ActivityStatus::InProgress => println!("⏳ {} working...", agent.profile().label),
        ActivityStatus::Completed => println!("✅ {} done", agent.profile().label),
        ActivityStatus::Failed => println!("❌ {} failed", agent.profile().label),
    }
}

/// Run the full pipeline for one request
pub async fn run_orchestrator(task: Option<String>, verbose: bool, output: Option<PathBuf>) -> Result<()> {
    let task = read_task(task)?;
    if task.is_empty() {
        println!("❌ No task provided. Exiting.");
        return Ok(());
    }

    let config = Config::load()?;
    let orchestrator = load_orchestrator(&config)?;
    let (mut session, session_path) = load_session(&config)?;

    if verbose {
        println!("📋 Task: {}", task);
        println!("   Credits: {}\n", session.credits());
    }

    println!("🔍 Analyzing task...");
    let outcome = orchestrator.run(&mut session, &task, &print_progress).await;

    // Credits and activity changed even if the run failed
    session.save(&session_path)?;
    debug!("Session saved to {:?}", session_path);

    let report = outcome?;
    print_analysis(&report.result.analysis);
    print_report(&report, verbose);

    if let Some(path) = output {
        report.save(&path).with_context(|| format!("Failed to write report to {:?}", path))?;
        println!("\n💾 Report saved to {}", path.display());
    }

    println!("\n💳 Credits remaining: {}", session.credits());
    Ok(())
}

/// Classify a request without dispatching any agents
pub async fn classify_only(task: Option<String>, json: bool) -> Result<()> {
    let task = read_task(task)?;
    let config = Config::load()?;
    let analysis = load_orchestrator(&config)?.classify_intent(&task).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis);
    }
    Ok(())
}

/// Break a request into subtasks
pub async fn decompose_only(task: Option<String>) -> Result<()> {
    let task = read_task(task)?;
    let config = Config::load()?;
    let subtasks = load_orchestrator(&config)?.decompose_task(&task).await?;

    if subtasks.is_empty() {
        println!("No subtasks returned.");
    }
    for (i, subtask) in subtasks.iter().enumerate() {
        println!("{}. {}", i + 1, subtask);
    }
    Ok(())
}

/// Show or reset the credit balance
pub fn credits(reset: bool) -> Result<()> {
    let config = Config::load()?;
    let (mut session, path) = load_session(&config)?;
    if reset {
        session.reset_credits();
        session.save(&path)?;
        println!("Credits reset to {}", session.credits());
    } else {
        println!("💳 Credits remaining: {}", session.credits());
    }
    Ok(())
}

/// Show recent activity, newest first
pub fn activity(clear: bool, json: bool) -> Result<()> {
    let config = Config::load()?;
    let (session, path) = load_session(&config)?;

    if clear {
        session.activity().clear();
        session.save(&path)?;
        println!("Activity cleared.");
        return Ok(());
    }

    let entries = session.activity().entries();
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No activity yet.");
    }
    for entry in entries {
        println!(
            "{}  [{:<11}] {}: {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.status.as_str(),
            entry.agent,
            entry.title
        );
    }
    Ok(())
}

/// List or forget the conversation ids agents continue between runs
pub fn conversations(clear: bool) -> Result<()> {
    let config = Config::load()?;
    let (mut session, path) = load_session(&config)?;

    if clear {
        session.clear_conversations();
        session.save(&path)?;
        println!("Conversations cleared. Agents will start fresh.");
        return Ok(());
    }

    let mut threads: Vec<_> = session
        .conversations()
        .iter()
        .map(|(agent, id)| (agent.to_string(), id.clone()))
        .collect();
    threads.sort();
    if threads.is_empty() {
        println!("No conversations yet.");
    }
    for (agent, id) in threads {
        println!("{:<15} {}", agent, id);
    }
    Ok(())
}

/// Store a fact in the knowledge base
pub async fn store_knowledge(entry: &KnowledgeEntry) -> Result<()> {
    let config = Config::load()?;
    let client = functions_client(&config)?;
    let stored = client.store_knowledge(entry).await?;
    println!("📚 Knowledge {} ({}): {} - {}", stored.action, stored.knowledge_id, entry.entity_name, entry.category);
    Ok(())
}

/// Rate a logged agent decision
pub async fn send_feedback(feedback: &Feedback) -> Result<()> {
    let config = Config::load()?;
    let client = functions_client(&config)?;
    let message = client.send_feedback(feedback).await?;
    println!("👍 {}", message);
    Ok(())
}
