use anyhow::Result;
use owo_colors::OwoColorize;
use sentinel_gateway::AiGateway;
use sentinel_gateway::CodeSubmission;
use sentinel_gateway::GatewayError;
use sentinel_gateway::GatewayStats;
use std::io::Write;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Exit,
    Clear,
    Stats,
    Feedback {
        helpful: bool,
        comments: Option<String>,
    },
    Code {
        filename: String,
    },
    Ask(&'a str),
    Invalid(&'static str),
}

fn parse_command(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => return Command::Empty,
        "exit" => return Command::Exit,
        "clear" => return Command::Clear,
        "stats" => return Command::Stats,
        "feedback" => return Command::Invalid("usage: feedback <yes|no> [comments]"),
        _ => {}
    }

    if let Some(rest) = trimmed.strip_prefix("feedback ") {
        let mut parts = rest.trim_start().splitn(2, char::is_whitespace);
        let helpful = match parts.next() {
            Some("yes") => true,
            Some("no") => false,
            _ => return Command::Invalid("usage: feedback <yes|no> [comments]"),
        };
        let comments = parts
            .next()
            .map(str::trim)
            .filter(|comment| !comment.is_empty())
            .map(str::to_string);
        return Command::Feedback { helpful, comments };
    }

    if let Some(rest) = trimmed.strip_prefix("CODE:") {
        let filename = rest.trim();
        if filename.is_empty() {
            return Command::Invalid("usage: CODE:<filename> followed by code lines");
        }
        return Command::Code {
            filename: filename.to_string(),
        };
    }

    Command::Ask(trimmed)
}

fn print_prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_stats(stats: &GatewayStats) {
    println!("{}", "Session stats".bold());
    println!("  exchanges: {}", stats.exchanges);
    println!(
        "  feedback: {} entries, {:.1}% accepted",
        stats.feedback_count, stats.acceptance_rate
    );
    if let Some(task) = &stats.current_task {
        println!("  current task: {task}");
    }
    if !stats.code_context.is_empty() {
        println!("  code context:");
        for (filename, entry) in &stats.code_context {
            println!(
                "    {filename}: {} functions, {} classes, {} imports",
                entry.functions.len(),
                entry.classes.len(),
                entry.imports.len()
            );
        }
    }
    if !stats.preferred_libraries.is_empty() {
        println!(
            "  preferred libraries: {}",
            stats.preferred_libraries.join(", ")
        );
    }
    for (construct, styles) in &stats.naming_counts {
        for (style, count) in styles {
            println!("  {construct:?} naming {}: {count}", style.label());
        }
    }
}

/// Interactive assistant loop. The session opens with the welcome message
/// and treats the first line as the user's name.
pub async fn run(gateway: Arc<AiGateway>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", gateway.welcome().await);
    print_prompt();
    let Some(name) = lines.next_line().await? else {
        return Ok(());
    };
    let name = name.trim();
    if !name.is_empty() {
        println!("{}", gateway.set_user_name(name).await);
    }

    let mut pending_code: Option<CodeSubmission> = None;

    loop {
        print_prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_command(&line) {
            Command::Empty => {}
            Command::Exit => {
                println!("Goodbye!");
                break;
            }
            Command::Clear => {
                gateway.clear_history().await;
                println!("Conversation history and code context cleared.");
            }
            Command::Stats => print_stats(&gateway.stats().await),
            Command::Feedback { helpful, comments } => {
                match gateway.last_suggestion_id().await {
                    None => println!("No suggestion to rate yet."),
                    Some(id) => match gateway.provide_feedback(&id, helpful, comments).await {
                        Ok(()) => println!("Thanks for the feedback!"),
                        Err(err) => println!("{err}"),
                    },
                }
            }
            Command::Code { filename } => {
                println!("Enter the code for {filename}; finish with an empty line.");
                let mut code = String::new();
                loop {
                    let Some(code_line) = lines.next_line().await? else {
                        break;
                    };
                    if code_line.trim().is_empty() {
                        break;
                    }
                    code.push_str(&code_line);
                    code.push('\n');
                }
                println!("Code context for {filename} will be attached to your next question.");
                pending_code = Some(CodeSubmission { filename, code });
            }
            Command::Invalid(message) => println!("{message}"),
            Command::Ask(text) => match gateway.ask(text, pending_code.take()).await {
                Ok(reply) => {
                    println!("{}", reply.text);
                    if reply.suggestion_id.is_some() {
                        println!(
                            "{}",
                            "Rate this suggestion with: feedback <yes|no> [comments]".dimmed()
                        );
                    }
                }
                Err(GatewayError::Inference(err)) => {
                    println!("{}", format!("Inference failed: {err}").red());
                }
                Err(err) => println!("{err}"),
            },
        }
    }

    Ok(())
}
