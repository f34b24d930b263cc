//! `synaxarion ask`: single-question or interactive chat mode.

use std::io::Write;

use synaxarion_agent::{RouterReply, Services, Session};
use synaxarion_config::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    if config.provider == "openai" && !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    SYNAXARION_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY     = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let model = config.model.clone();
    let services = Services::from_config(config)?;
    let router = services.router();
    let mut session = Session::new();

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let reply = router.process(&mut session, &msg).await?;
        eprint!("\r              \r");
        print_trace(&reply);
        println!("{}", reply.response);
        return Ok(());
    }

    println!();
    println!("  Synaxarion: Interactive Mode");
    println!();
    println!("  Model:     {model}");
    println!("  Experts:   {}", router.tools().names().join(", "));
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }
        if !query.is_empty() {
            eprint!("  ...");
            match router.process(&mut session, query).await {
                Ok(reply) => {
                    eprint!("\r     \r");
                    println!();
                    print_trace(&reply);
                    for line in reply.response.lines() {
                        println!("  Synaxarion > {line}");
                    }
                    println!();
                }
                // The session keeps its last good history.
                Err(e) => {
                    eprint!("\r     \r");
                    eprintln!("  [Error] {e}");
                    println!();
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Go in peace.");
    println!();

    Ok(())
}

fn print_trace(reply: &RouterReply) {
    for step in &reply.trace {
        let status = if step.success { "ok" } else { "failed" };
        eprintln!("  [{}: {status}] {}", step.tool, step.arguments);
    }
}
