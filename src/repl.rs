use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::{Config as RlConfig, DefaultEditor};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::mpsc;
use worklog_core::types::{AgentEvent, Message};
use worklog_core::{AgentLoop, Config, Conversation, ToolRegistry};

const BANNER: &str = r#"
  ╔═══════════════════════════════════════════╗
  ║              worklog chat                 ║
  ║   Ask about your work, get reports        ║
  ╚═══════════════════════════════════════════╝

  Ask things like "what did I do yesterday?" or
  "write my standup notes".
  Commands:
    /tools         - List available tools
    /clear         - Clear conversation history
    /help          - Show this help
    /exit          - Quit
"#;

/// Run the interactive chat session.
pub async fn run(config: Config, tool_registry: Arc<ToolRegistry>) -> Result<()> {
    println!("{}", BANNER);
    println!(
        "  Model: {}  |  Endpoint: {}",
        config.provider.model, config.provider.api_base
    );
    println!();

    let mut conversation = Conversation::new();

    let rl_config = RlConfig::builder().auto_add_history(true).build();
    let history_path = Config::config_dir().join("repl_history.txt");
    let mut rl = DefaultEditor::with_config(rl_config)?;
    let _ = rl.load_history(&history_path);

    loop {
        let prompt = "\x1b[1;36mworklog\x1b[0m \x1b[1;32m❯\x1b[0m ";

        match rl.readline(prompt) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }

                if input.starts_with('/') {
                    if !handle_command(input, &mut conversation, &tool_registry) {
                        break; // /exit
                    }
                    continue;
                }

                conversation.push(Message::user(input));
                let messages: Vec<Message> = conversation.messages().to_vec();

                let (tx, mut rx) = mpsc::unbounded_channel::<AgentEvent>();

                // Run the agent and consume its events concurrently.
                let agent_handle = tokio::spawn({
                    let provider = config.provider.clone();
                    let tool_registry = tool_registry.clone();
                    async move {
                        let agent = AgentLoop::new(provider, tool_registry);
                        agent.run(&messages, tx).await
                    }
                });

                print!("\x1b[1;33massistant\x1b[0m: ");
                let _ = io::stdout().flush();
                while let Some(event) = rx.recv().await {
                    match event {
                        AgentEvent::ContentChunk(token) => {
                            print!("{}", token);
                            let _ = io::stdout().flush();
                        }
                        AgentEvent::ToolCallStart { name, .. } => {
                            println!("\n  \x1b[0;35m⚡ Calling tool: {}\x1b[0m", name);
                        }
                        AgentEvent::ToolResult(output) => {
                            let status = if output.is_error {
                                "\x1b[0;31m✗\x1b[0m"
                            } else {
                                "\x1b[0;32m✓\x1b[0m"
                            };
                            let preview: String = output.content.chars().take(200).collect();
                            let suffix = if output.content.chars().count() > 200 {
                                "..."
                            } else {
                                ""
                            };
                            println!("  {} {}{}", status, preview.replace('\n', "\n    "), suffix);
                            print!("\x1b[1;33massistant\x1b[0m: ");
                            let _ = io::stdout().flush();
                        }
                        AgentEvent::Done(_) => {
                            // Final message already streamed via content chunks.
                        }
                        AgentEvent::Error(e) => {
                            println!("\n\x1b[0;31mError: {}\x1b[0m", e);
                        }
                    }
                }
                println!();

                match agent_handle.await {
                    Ok(Ok(transcript)) => {
                        // Keep tool calls and results in the history so
                        // follow-ups can reference already-fetched data.
                        for message in transcript {
                            conversation.push(message);
                        }
                    }
                    Ok(Err(e)) => {
                        eprintln!("\x1b[0;31mAssistant error: {}\x1b[0m", e);
                    }
                    Err(e) => {
                        eprintln!("\x1b[0;31mTask error: {}\x1b[0m", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.save_history(&history_path);

    Ok(())
}

/// Handle a slash command. Returns `true` to continue the loop, `false`
/// to exit.
fn handle_command(
    input: &str,
    conversation: &mut Conversation,
    tool_registry: &ToolRegistry,
) -> bool {
    match input.split_whitespace().next().unwrap_or("") {
        "/exit" | "/quit" | "/q" => {
            println!("Goodbye!");
            return false;
        }
        "/clear" => {
            conversation.clear();
            println!("Conversation history cleared.");
        }
        "/tools" => {
            let names = tool_registry.list_names();
            println!("  Available tools ({}):", names.len());
            for name in names {
                if let Some(tool) = tool_registry.get(name) {
                    println!("    • {} - {}", name, tool.description());
                }
            }
        }
        "/help" => {
            println!("{}", BANNER);
        }
        other => {
            println!("Unknown command: {}. Type /help for commands.", other);
        }
    }
    true
}
