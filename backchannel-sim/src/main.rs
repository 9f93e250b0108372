use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use tracing::info;

use backchannel::effects::Effects;
use backchannel::moderation::types::{ConditionCategory, Praise, Role, RoleAction};
use backchannel::{
    BackchannelClient, BackchannelConfig, LoopbackRoom, MemberId, MemoryModeration,
    ModerationBackend,
};

const OWNER: MemberId = 1001;
const SUBJECT: MemberId = 1002;
const STRANGER: MemberId = 1003;

#[derive(Parser)]
#[command(name = "backchannel-sim")]
#[command(version)]
#[command(about = "Run backchannel clients against an in-process chat room")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Owner, subject and stranger exchanging queries in one room.
    Demo(DemoArgs),
    /// Print the effective configuration as TOML.
    Config(ConfigArgs),
}

#[derive(Parser)]
struct ConfigArgs {
    #[arg(long, env = "BACKCHANNEL_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Parser)]
struct DemoArgs {
    #[arg(long, env = "BACKCHANNEL_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `query_timeout_ms` from the config file.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Number of permission checks the owner sends at once.
    #[arg(long, default_value = "4")]
    parallel_queries: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo(args) => run_demo(args).await,
        Commands::Config(args) => print_config(args),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<BackchannelConfig> {
    match path {
        Some(path) => BackchannelConfig::load(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(BackchannelConfig::default()),
    }
}

fn print_config(args: ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

struct SimMember {
    backend: Arc<MemoryModeration>,
    client: BackchannelClient,
}

fn join(room: &LoopbackRoom, id: MemberId, name: &str, config: &BackchannelConfig) -> Result<SimMember> {
    let host = room.join(id, name);
    let backend = Arc::new(MemoryModeration::new(id));
    let client = BackchannelClient::new(host, backend.clone(), backend.clone(), config.clone())?;
    Ok(SimMember { backend, client })
}

async fn run_demo(args: DemoArgs) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(timeout_ms) = args.timeout_ms {
        config.query_timeout_ms = timeout_ms;
    }
    config.validate()?;

    let room = LoopbackRoom::new();
    let owner = join(&room, OWNER, "Olive", &config)?;
    let subject = join(&room, SUBJECT, "Sam", &config)?;
    let stranger = join(&room, STRANGER, "Stan", &config)?;
    subject.backend.add_owner(OWNER, "Olive");

    owner
        .client
        .register_change_subscriber(Arc::new(|origin: MemberId| {
            info!("[Sim] owner saw a change from {}", origin);
        }));
    let curses = subject.backend.clone();
    subject
        .client
        .register_effect_contributor(Arc::new(move |effects: &mut Effects| {
            if let Some(data) = curses.conditions(SUBJECT, ConditionCategory::Curses) {
                for group in data.conditions.keys() {
                    effects.push(format!("cursed:{}", group));
                }
            }
        }));

    for member in [&owner, &subject, &stranger] {
        member.client.start();
    }
    subject.client.spawn_effect_loop();

    let proxy = owner.client.character(SUBJECT)?;
    println!("[Sim] owner's level over {}: {:?}", proxy.name(), proxy.get_my_access_level().await?);

    let added = proxy
        .edit_role(Role::Mistress, RoleAction::Add, STRANGER)
        .await?;
    println!("[Sim] owner adds {} as mistress: {}", STRANGER, added);
    let roles = proxy.get_roles().await?;
    println!(
        "[Sim] roles: {} owner(s), {} mistress(es)",
        roles.owners.len(),
        roles.mistresses.len()
    );

    println!(
        "[Sim] praise sent: {}",
        proxy.praise(Praise::Praise, Some("kept every rule")).await?
    );
    println!("[Sim] curse ItemArms: {}", proxy.curse_item("ItemArms", Some(true)).await?);

    tokio::time::sleep(config.effect_rebuild_interval() + Duration::from_millis(100)).await;
    println!(
        "[Sim] subject effects after rebuild: {:?}",
        subject.client.player().effects().markers
    );

    let checks = ["log_view_normal", "log_praise", "curses_limited", "rules_normal"];
    let results = join_all(
        checks
            .iter()
            .cycle()
            .take(args.parallel_queries)
            .map(|permission| proxy.get_permission_access(permission)),
    )
    .await;
    for (permission, result) in checks.iter().cycle().zip(results) {
        println!("[Sim] permission {}: {:?}", permission, result);
    }

    let stranger_view = stranger.client.character(SUBJECT)?.get_log_entries().await;
    match stranger_view {
        Ok(entries) => println!("[Sim] mistress reads {} log entries", entries.len()),
        Err(e) => println!("[Sim] mistress log read refused: {}", e),
    }

    room.leave(SUBJECT);
    println!(
        "[Sim] after subject left, owner sees {} character(s)",
        owner.client.all_characters_in_room().len()
    );

    for member in [&owner, &subject, &stranger] {
        member.client.unload();
    }
    Ok(())
}
