//! LineWeave CLI binary: ask the production-line agent from the command line.
//!
//! One-shot: `lineweave -m "where is the bottleneck?"`. Add `--stream` for
//! phase steps and incremental answer text, `--mock` to run fully offline
//! (scripted LLM + demo tool fixtures), `--interactive` for a REPL-style
//! loop on one conversation thread.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_stream::StreamExt;

use lineweave::{
    AgentConfig, AgentEvent, ChatOpenAI, InMemoryConversationStore, LineAgent, LlmClient,
    MockLlm, MockToolSource, SqliteConversationStore, StaticPromptSource, YamlPromptSource,
};

/// Default prompt catalog, embedded at compile time, parsed at runtime.
const DEFAULT_PROMPTS_YAML: &str = include_str!("../prompts/default_prompts.yaml");

#[derive(Parser, Debug)]
#[command(name = "lineweave")]
#[command(about = "LineWeave — ask the production-line agent from the CLI")]
struct Args {
    /// User question (or pass as positional arguments)
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Positional args: the question when -m/--message is not used
    #[arg(trailing_var_arg = true)]
    rest: Vec<String>,

    /// Thread ID for conversation continuity
    #[arg(long, value_name = "ID")]
    thread_id: Option<String>,

    /// SQLite memory database path
    #[arg(long, value_name = "PATH", default_value = "data/memory.sqlite")]
    db: PathBuf,

    /// Keep memory in-process only (no SQLite file)
    #[arg(long)]
    ephemeral: bool,

    /// Prompt catalog YAML (defaults to the embedded catalog)
    #[arg(long, value_name = "PATH")]
    prompts: Option<PathBuf>,

    /// Offline demo: scripted LLM replies + canned production fixtures
    #[arg(long)]
    mock: bool,

    /// Stream phase steps and answer chunks as they happen
    #[arg(short, long)]
    stream: bool,

    /// Interactive: after each answer, prompt for the next question
    #[arg(short, long)]
    interactive: bool,

    /// Completion model name
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    model: String,

    /// Verbose: print the run timeline and confidence after the answer
    #[arg(short, long)]
    verbose: bool,
}

/// A scripted conversation that exercises the whole pipeline offline.
fn demo_llm() -> MockLlm {
    MockLlm::with_replies([
        // validate
        r#"{"status": "valid", "is_safe": true, "is_clear": true, "is_relevant": true, "reason": "production question"}"#,
        // understand
        r#"{"primary_intent": "Line overview", "entities": [], "constraints": [], "requires_live_data": true, "confidence": 0.9, "summary": "overview of the line"}"#,
        // plan (unused on the ReAct path, kept for parity when --mock is
        // combined with AGENT_REACT_ENABLED=false)
        r#"{"tool_plan": [{"name": "get_production_metrics", "args": {}, "purpose": "metrics", "priority": 1}], "execution_strategy": "sequential"}"#,
        // react round 1
        "Thought: I should look at the overall metrics first.\nAction: get_production_metrics\nAction Input: {}",
        // react round 2
        "Thought: Throughput is below target; find the bottleneck.\nAction: find_bottleneck\nAction Input: {}",
        // react round 3
        "Thought: I have enough to answer.\nAction: finish\nAction Input: {\"answer\": \"The line is at 94.7% efficiency; ST003 (Painting) is the bottleneck due to a maintenance window.\"}",
        // synthesis
        "The line is running at 94.7% efficiency (1184/1250 units). The current bottleneck is ST003 (Painting), which is in a planned maintenance window until 10:00. Quality rate is healthy at 98.2%.\n\nSuggested actions:\n- Re-sequence work away from ST003 until maintenance completes\n- Review the 23 minutes of downtime on the morning shift",
    ])
}

fn build_agent(args: &Args) -> Result<LineAgent, Box<dyn Error>> {
    let prompt_source: Box<dyn lineweave::PromptSource> = match &args.prompts {
        Some(path) => Box::new(YamlPromptSource::load(path)?),
        None => Box::new(StaticPromptSource::from_yaml_str(DEFAULT_PROMPTS_YAML)?),
    };

    let llm: Arc<dyn LlmClient> = if args.mock {
        Arc::new(demo_llm())
    } else {
        Arc::new(ChatOpenAI::from_env(&args.model)?.with_temperature(0.2))
    };

    let store: Arc<dyn lineweave::ConversationStore> = if args.ephemeral {
        Arc::new(InMemoryConversationStore::new())
    } else {
        Arc::new(SqliteConversationStore::new(&args.db)?)
    };

    let agent = LineAgent::new(
        llm,
        Arc::new(MockToolSource::with_demo_tools()),
        store,
        prompt_source.as_ref(),
        AgentConfig::from_env(),
    )?;
    Ok(agent)
}

fn print_state_summary(state: &lineweave::AgentRunState) {
    eprintln!("--- timeline ---");
    for entry in &state.timeline {
        eprintln!("[{}] {}", entry.phase, entry.message);
    }
    if let Some(ref validation) = state.output_validation {
        eprintln!(
            "--- confidence: {:.2}, complete: {} ---",
            validation.confidence, validation.is_complete
        );
    }
}

async fn ask_plain(
    agent: &LineAgent,
    question: &str,
    thread_id: Option<String>,
    verbose: bool,
) -> Result<Option<String>, Box<dyn Error>> {
    let state = agent.run(question, thread_id).await?;
    println!("{}", state.answer().unwrap_or_default());
    if verbose {
        print_state_summary(&state);
    }
    Ok(Some(state.thread_id.clone()))
}

async fn ask_stream(
    agent: &LineAgent,
    question: &str,
    thread_id: Option<String>,
    verbose: bool,
) -> Result<Option<String>, Box<dyn Error>> {
    use std::io::Write;

    let mut events = agent.stream(question, thread_id);
    let mut final_thread = None;
    while let Some(event) = events.next().await {
        match event {
            AgentEvent::Step { phase, message, .. } => {
                eprintln!("[{}] {}", phase, message);
            }
            AgentEvent::AnswerStart => {}
            AgentEvent::AnswerChunk { text } => {
                print!("{}", text);
                std::io::stdout().flush()?;
            }
            AgentEvent::AnswerEnd => {
                println!();
            }
            AgentEvent::Error { message } => {
                return Err(message.into());
            }
            AgentEvent::Final { state } => {
                if verbose {
                    print_state_summary(&state);
                }
                final_thread = Some(state.thread_id.clone());
            }
        }
    }
    Ok(final_thread)
}

async fn read_line_from_stdin() -> Result<Option<String>, Box<dyn Error>> {
    use tokio::io::{AsyncBufReadExt, BufReader};
    let mut line = String::new();
    let mut reader = BufReader::new(tokio::io::stdin());
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let agent = build_agent(&args)?;

    let first_question = args
        .message
        .clone()
        .or_else(|| {
            if args.rest.is_empty() {
                None
            } else {
                Some(args.rest.join(" "))
            }
        });

    let mut thread_id = args.thread_id.clone();
    let mut question = match first_question {
        Some(q) => q,
        None if args.interactive => {
            eprint!("you> ");
            match read_line_from_stdin().await? {
                Some(q) if !q.is_empty() => q,
                _ => return Ok(()),
            }
        }
        None => {
            eprintln!("No question given. Try: lineweave -m \"where is the bottleneck?\"");
            return Ok(());
        }
    };

    loop {
        let returned_thread = if args.stream {
            ask_stream(&agent, &question, thread_id.clone(), args.verbose).await?
        } else {
            ask_plain(&agent, &question, thread_id.clone(), args.verbose).await?
        };
        // Keep the whole interactive session on one conversation thread.
        if thread_id.is_none() {
            thread_id = returned_thread;
        }

        if !args.interactive {
            break;
        }
        eprint!("you> ");
        match read_line_from_stdin().await? {
            Some(next) if !next.is_empty() && next != "exit" && next != "quit" => {
                question = next;
            }
            _ => break,
        }
    }

    Ok(())
}
