use clap::{Parser, Subcommand};
use outreach::{api, Orchestrator, Settings};
use outreach_browser::{interactive_login, LeadSearch, Network, Site, SiteProfile};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "outreach")]
#[command(about = "Cold-outreach campaign service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Run browsers in headless mode
    #[arg(long)]
    headless: bool,

    /// Persona YAML (defaults to the built-in one)
    #[arg(long, value_name = "FILE")]
    persona: Option<PathBuf>,

    /// Resume text file
    #[arg(long, value_name = "FILE", default_value = "resume.txt")]
    resume: PathBuf,

    /// Directory with site profile overrides
    #[arg(long, value_name = "DIR")]
    profiles: Option<PathBuf>,

    /// Directory for saved browser cookies
    #[arg(long, value_name = "DIR", default_value = ".cookies")]
    cookie_dir: PathBuf,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,

    /// Validate configuration without serving
    #[arg(long)]
    check: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Log in to a site by hand and save its cookies
    Login {
        /// lead-search or network
        site: Site,
    },
}

#[tokio::main]
async fn main() -> outreach::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!("Could not load .env: {}", e);
        }
    }

    let mut settings = Settings::from_env();
    settings.persona_path = cli.persona.clone();
    settings.resume_path = cli.resume.clone();
    settings.profile_dir = cli.profiles.clone();
    settings.cookie_dir = cli.cookie_dir.clone();
    settings.headless = cli.headless;
    settings.validate()?;

    if let Some(Command::Login { site }) = cli.command {
        return login(&settings, site).await;
    }

    if cli.check {
        return check(&settings);
    }

    let orchestrator = Arc::new(Orchestrator::from_settings(&settings)?);
    let app = api::router(api::AppState::new(
        orchestrator,
        settings.network_configured(),
    ));

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Cold Outreach API listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn login(settings: &Settings, site: Site) -> outreach::Result<()> {
    let profile = SiteProfile::resolve(site, settings.profile_dir.as_deref())?;
    let options = settings.browser_options(site);

    println!("Opening {} in a browser window.", profile.login_url);
    println!("Log in, then press Enter here to save the session.");

    let ready = async {
        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = stdin.read_line(&mut line).await {
            warn!("Could not read stdin: {}", e);
        }
    };

    let saved = interactive_login(&profile, &options, ready).await?;
    println!(
        "Saved {} cookies to {}",
        saved,
        settings.cookie_jar(site).display()
    );
    Ok(())
}

fn check(settings: &Settings) -> outreach::Result<()> {
    let profiles = settings.profile_dir.as_deref();
    let lead = SiteProfile::resolve(Site::LeadSearch, profiles)?;
    LeadSearch::new(lead.clone())?;
    let network = SiteProfile::resolve(Site::Network, profiles)?;
    Network::new(network.clone())?;

    let persona = match &settings.persona_path {
        Some(path) => outreach::Persona::load(path)?,
        None => outreach::Persona::builtin()?,
    };

    println!("Config valid");
    println!("  Persona: {}", persona.sender_name);
    println!("  Gemini keys: {}", settings.gemini_keys.len());
    println!("  SMTP providers:");
    for provider in settings.smtp_providers() {
        println!("    - {} ({}:{})", provider.name, provider.host, provider.port);
    }
    println!("  Network account: {}", settings.network_email.as_deref().unwrap_or("-"));
    println!("  Profiles: {}, {}", lead.name, network.name);
    for site in [Site::LeadSearch, Site::Network] {
        let jar = settings.cookie_jar(site);
        let state = if jar.exists() { "saved" } else { "none" };
        println!("  Cookies ({}): {} [{}]", site, jar.display(), state);
    }
    let chrome = eoka::stealth::patcher::find_chrome().is_ok();
    println!("  Chrome: {}", if chrome { "found" } else { "not found" });
    if !settings.resume_path.exists() {
        println!("  Resume: {} not found, canned paragraphs only", settings.resume_path.display());
    }
    Ok(())
}
