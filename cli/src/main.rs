//! `chief`: command-line client for the DSChief governance contract.

mod config;
mod shutdown;

use anyhow::{bail, Context};
use chief_governance::slate::read_slate;
use chief_governance::{
    discover_voters, etched_slates, Chief, ChiefReader, TallyAggregator, VotePicks,
    VoteProxyFactory,
};
use chief_rpc::JsonRpcClient;
use chief_types::{Address, MkrAmount, SlateId, TxHash};
use chief_utils::{init_logging, LogFormat};
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ChiefConfig;
use crate::shutdown::ShutdownController;

#[derive(Parser)]
#[command(name = "chief", about = "DSChief governance client")]
struct Cli {
    /// Ethereum JSON-RPC endpoint.
    #[arg(long, env = "CHIEF_RPC_URL")]
    rpc_url: Option<String>,

    /// Address of the chief contract.
    #[arg(long, env = "CHIEF_ADDRESS")]
    chief: Option<Address>,

    /// Address of the vote-proxy factory.
    #[arg(long, env = "CHIEF_PROXY_FACTORY")]
    proxy_factory: Option<Address>,

    /// Node-managed account that sends write calls.
    #[arg(long, env = "CHIEF_FROM")]
    from: Option<Address>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CHIEF_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CHIEF_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Vote-proxy factory commands.
    Proxy {
        #[command(subcommand)]
        action: ProxyAction,
    },
    #[command(flatten)]
    Chief(ChiefCommand),
}

#[derive(clap::Subcommand)]
enum ChiefCommand {
    /// Compute the deposit-weighted vote tally for every candidate.
    Tally,
    /// Print the current hat.
    Hat,
    /// Print the total approvals of a candidate.
    Approvals { candidate: Address },
    /// Print the MKR locked by a voter.
    Deposits { voter: Address },
    /// List every address that ever locked MKR.
    Voters,
    /// List every etched slate.
    Slates,
    /// Print the candidates of a slate.
    Slate { id: SlateId },
    /// Lock MKR into the chief.
    Lock { amount: MkrAmount },
    /// Free MKR from the chief.
    Free { amount: MkrAmount },
    /// Vote for a list of candidates, or for an etched slate with --slate.
    Vote {
        #[arg(long, conflicts_with = "candidates")]
        slate: Option<SlateId>,
        candidates: Vec<Address>,
    },
    /// Etch a slate of candidates.
    Etch { candidates: Vec<Address> },
    /// Lift a candidate to the hat.
    Lift { candidate: Address },
}

#[derive(clap::Subcommand)]
enum ProxyAction {
    /// Find the vote proxy a wallet belongs to, as its hot or cold side.
    Lookup { wallet: Address },
    /// From the cold wallet: propose a link to a hot wallet.
    InitiateLink { hot: Address },
    /// From the hot wallet: accept the link proposed by a cold wallet.
    ApproveLink { cold: Address },
    /// Break the sender's link.
    BreakLink,
}

impl Cli {
    /// Layer CLI flags and env vars over `base`.
    fn apply(&self, base: ChiefConfig) -> ChiefConfig {
        ChiefConfig {
            rpc_url: self.rpc_url.clone().unwrap_or(base.rpc_url),
            chief_address: self.chief.or(base.chief_address),
            proxy_factory_address: self.proxy_factory.or(base.proxy_factory_address),
            from_account: self.from.or(base.from_account),
            log_level: self.log_level.clone().unwrap_or(base.log_level),
            log_format: self
                .log_format
                .as_deref()
                .map(LogFormat::from_name)
                .unwrap_or(base.log_format),
            tally: base.tally,
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_tx(hash: TxHash) -> anyhow::Result<()> {
    print_json(&json!({ "tx": hash }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => ChiefConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ChiefConfig::default(),
    };
    let config = cli.apply(file_config);
    init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::debug!(path = %path.display(), "loaded config file");
    }

    let mut client = JsonRpcClient::new(config.rpc_url.clone())?;
    if let Some(from) = config.from_account {
        client = client.with_sender(from);
    }
    let client = Arc::new(client);

    match cli.command {
        Command::Proxy { action } => {
            let Some(address) = config.proxy_factory_address else {
                bail!("no proxy factory address: pass --proxy-factory or set proxy_factory_address");
            };
            run_proxy(action, VoteProxyFactory::new(client, address)).await
        }
        Command::Chief(command) => run_chief(command, &config, client).await,
    }
}

async fn run_chief(
    command: ChiefCommand,
    config: &ChiefConfig,
    client: Arc<JsonRpcClient>,
) -> anyhow::Result<()> {
    let Some(chief_address) = config.chief_address else {
        bail!("no chief address: pass --chief or set chief_address");
    };
    let chief = Arc::new(Chief::new(client.clone(), chief_address));
    tracing::debug!(rpc = client.url(), chief = %chief_address, "connected");

    match command {
        ChiefCommand::Tally => {
            let aggregator = TallyAggregator::new(chief, client, config.tally.clone());
            let shutdown = Arc::new(ShutdownController::new());
            let cancel = shutdown.subscribe();
            let signals = {
                let shutdown = shutdown.clone();
                tokio::spawn(async move { shutdown.wait_for_signal().await })
            };
            let tally = aggregator.vote_tally_until(cancel).await;
            signals.abort();
            print_json(&tally?)
        }
        ChiefCommand::Hat => print_json(&json!({ "hat": chief.hat().await? })),
        ChiefCommand::Approvals { candidate } => print_json(&json!({
            "candidate": candidate,
            "approvals": chief.approvals(&candidate).await?,
        })),
        ChiefCommand::Deposits { voter } => print_json(&json!({
            "voter": voter,
            "deposits": chief.deposits(&voter).await?,
        })),
        ChiefCommand::Voters => print_json(&discover_voters(&*client, chief_address).await?),
        ChiefCommand::Slates => print_json(&etched_slates(&*client, chief_address).await?),
        ChiefCommand::Slate { id } => {
            let (candidates, end) = read_slate(&*chief, &id, config.tally.max_slate_len).await;
            tracing::debug!(slate = %id, ?end, "slate read finished");
            print_json(&json!({ "slate": id, "candidates": candidates }))
        }
        ChiefCommand::Lock { amount } => print_tx(chief.lock(amount).await?),
        ChiefCommand::Free { amount } => print_tx(chief.free(amount).await?),
        ChiefCommand::Vote { slate, candidates } => {
            let picks = match slate {
                Some(slate) => VotePicks::Slate(slate),
                None => VotePicks::Candidates(candidates),
            };
            print_tx(chief.vote(picks).await?)
        }
        ChiefCommand::Etch { candidates } => print_tx(chief.etch(candidates).await?),
        ChiefCommand::Lift { candidate } => print_tx(chief.lift(candidate).await?),
    }
}

async fn run_proxy(
    action: ProxyAction,
    factory: VoteProxyFactory<JsonRpcClient>,
) -> anyhow::Result<()> {
    match action {
        ProxyAction::Lookup { wallet } => print_json(&factory.get_vote_proxy(&wallet).await?),
        ProxyAction::InitiateLink { hot } => print_tx(factory.initiate_link(&hot).await?),
        ProxyAction::ApproveLink { cold } => print_tx(factory.approve_link(&cold).await?),
        ProxyAction::BreakLink => print_tx(factory.break_link().await?),
    }
}
