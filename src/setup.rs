use anyhow::Result;
use std::io::{self, Write};
use worklog_core::Config;
use worklog_sources::{browser, calendar, github, linear, slack};

/// Interactive credential setup. Empty input keeps the existing value,
/// so re-running the wizard only overwrites what the user types.
pub async fn run(mut config: Config) -> Result<()> {
    println!();
    println!("╔═══════════════════════════════════════════╗");
    println!("║            worklog setup                  ║");
    println!("╚═══════════════════════════════════════════╝");
    println!();
    println!("Press Enter to keep an existing value unchanged.");
    println!();

    println!("1. GitHub");
    println!("   Create a personal access token at https://github.com/settings/tokens");
    println!("   (needs 'repo' scope for private repositories).");
    config.github_token = prompt_secret("   GitHub token", config.github_token.take())?;
    config.github_username = prompt_plain("   GitHub username", config.github_username.take())?;
    println!();

    println!("2. Google Calendar");
    println!("   Paste an OAuth access token with calendar.readonly scope.");
    config.google_access_token =
        prompt_secret("   Google access token", config.google_access_token.take())?;
    println!();

    println!("3. Chrome");
    config.chrome_profile = prompt_plain(
        "   Chrome profile name [Default]",
        config.chrome_profile.take().or_else(|| Some("Default".into())),
    )?;
    println!();

    println!("4. Slack");
    println!("   Paste a user OAuth token (xoxp-...) with search:read scope.");
    config.slack_token = prompt_secret("   Slack token", config.slack_token.take())?;
    println!();

    println!("5. Linear");
    println!("   Create a personal API key at https://linear.app/settings/api");
    config.linear_api_key = prompt_secret("   Linear API key", config.linear_api_key.take())?;
    println!();

    println!("6. AI provider (OpenAI-compatible)");
    if let Some(base) = prompt_plain(
        &format!("   API base URL [{}]", config.provider.api_base),
        None,
    )? {
        config.provider.api_base = base;
    }
    if let Some(model) = prompt_plain(&format!("   Model [{}]", config.provider.model), None)? {
        config.provider.model = model;
    }
    config.provider.api_key = prompt_secret("   API key", config.provider.api_key.take())?;
    println!();

    config.save()?;
    println!("Saved configuration to {}", Config::default_path().display());
    println!();

    if confirm("Test connections now?")? {
        test_connections(&config).await;
    }

    Ok(())
}

async fn test_connections(config: &Config) {
    println!();
    println!("Testing connections...");
    report("GitHub", github::test_connection(config).await);
    report("Google Calendar", calendar::test_connection(config).await);
    report("Chrome history", browser::test_access(config));
    report("Slack", slack::test_connection(config).await);
    report("Linear", linear::test_connection(config).await);
    println!();
}

fn report(service: &str, ok: bool) {
    if ok {
        println!("  \x1b[0;32m✓\x1b[0m {}", service);
    } else {
        println!("  \x1b[0;31m✗\x1b[0m {} (not configured or unreachable)", service);
    }
}

/// Prompt for a non-secret value. Returns the typed value, or `current`
/// when the user just hits Enter.
fn prompt_plain(label: &str, current: Option<String>) -> Result<Option<String>> {
    let hint = match current.as_deref() {
        Some(v) if !v.is_empty() => " (set)",
        _ => "",
    };
    print!("{}{}: ", label, hint);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    if input.is_empty() {
        Ok(current)
    } else {
        Ok(Some(input.to_string()))
    }
}

/// Prompt for a secret without echoing it.
fn prompt_secret(label: &str, current: Option<String>) -> Result<Option<String>> {
    let hint = match current.as_deref() {
        Some(v) if !v.is_empty() => " (set)",
        _ => "",
    };
    let input = rpassword::prompt_password(format!("{}{}: ", label, hint))?;
    let input = input.trim();
    if input.is_empty() {
        Ok(current)
    } else {
        Ok(Some(input.to_string()))
    }
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N]: ", question);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
