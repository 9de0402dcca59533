use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ftoken_common::{capabilities, Address, Amount, RoleId, SnapshotStore, TokenError, TokenEvent, TokenResult};
use ftoken_token::export;
use ftoken_token::format::{
    describe_event, format_address, format_amount, parse_address, parse_amount, parse_interface, parse_role,
};
use ftoken_token::{EventObserver, FungibleToken, SharedToken, TokenConfig};
use log::{info, LevelFilter};
use serde_json::json;

#[derive(Parser)]
#[command(name = "ftoken", version, about = "Pausable, burnable fungible token ledger")]
struct Cli {
    /// Snapshot file holding the token state
    #[arg(long, default_value = "ftoken.state")]
    state: PathBuf,

    /// Account the call is made as (32-byte hex)
    #[arg(long)]
    caller: Option<String>,

    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Append emitted events to this CBOR sequence file
    #[arg(long)]
    events_cbor: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new token; the deployer gets the admin role and initial supply
    Init(InitArgs),
    Balance { account: String },
    Allowance { owner: String, spender: String },
    Info,
    /// Non-zero balances
    Holders,
    Transfer { to: String, amount: String },
    Approve { spender: String, amount: String },
    IncreaseAllowance { spender: String, amount: String },
    DecreaseAllowance { spender: String, amount: String },
    TransferFrom { from: String, to: String, amount: String },
    Mint { to: String, amount: String },
    Burn { amount: String },
    BurnFrom { account: String, amount: String },
    Pause,
    Unpause,
    GrantRole { role: String, account: String },
    RevokeRole { role: String, account: String },
    RenounceRole(RenounceArgs),
    /// Capability tag (e.g. `burnable`) or 4-byte hex interface id
    Supports { interface: String },
    /// Print events recorded in the --events-cbor file
    Events,
}

#[derive(Parser)]
struct InitArgs {
    deployer: String,

    /// JSON token configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overwrite an existing state file
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
struct RenounceArgs {
    role: String,

    /// Must repeat the caller's own address
    #[arg(long)]
    confirm: String,
}

/// Collects committed events for printing and export
#[derive(Default)]
struct Collector {
    events: Mutex<Vec<TokenEvent>>,
}

impl EventObserver for Collector {
    fn on_event(&self, event: &TokenEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

impl Collector {
    fn take(&self) -> Vec<TokenEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level.into())
        .parse_default_env()
        .init();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let store = SnapshotStore::new(&cli.state);

    match &cli.command {
        Commands::Init(args) => handle_init(&cli, &store, args),
        Commands::Events => handle_events(&cli),
        Commands::Balance { account } => {
            let token = load(&store)?;
            let account = parse_address(account)?;
            print_amount(&cli, "balance", token.balance_of(&account));
            Ok(())
        }
        Commands::Allowance { owner, spender } => {
            let token = load(&store)?;
            let value = token.allowance(&parse_address(owner)?, &parse_address(spender)?);
            print_amount(&cli, "allowance", value);
            Ok(())
        }
        Commands::Info => {
            let token = load(&store)?;
            print_info(&cli, &token);
            Ok(())
        }
        Commands::Holders => {
            let token = load(&store)?;
            print_holders(&cli, &token);
            Ok(())
        }
        Commands::Supports { interface } => {
            let id = parse_interface(interface)?;
            let supported = capabilities::supports_interface(id);
            if cli.output == OutputFormat::Json {
                println!("{}", json!({ "interface": format!("0x{}", hex::encode(id)), "supported": supported }));
            } else {
                println!("{}", supported);
            }
            Ok(())
        }
        command => {
            let call = Call::parse(command)?;
            let caller = caller(&cli)?;
            let token = load(&store)?;
            let (token, events) = commit(token, caller, &call)?;
            report(&cli, &events)?;
            store.save(&token.snapshot())?;
            Ok(())
        }
    }
}

/// A parsed state-changing call
enum Call {
    Transfer { to: Address, amount: Amount },
    Approve { spender: Address, amount: Amount },
    IncreaseAllowance { spender: Address, amount: Amount },
    DecreaseAllowance { spender: Address, amount: Amount },
    TransferFrom { from: Address, to: Address, amount: Amount },
    Mint { to: Address, amount: Amount },
    Burn { amount: Amount },
    BurnFrom { account: Address, amount: Amount },
    Pause,
    Unpause,
    GrantRole { role: RoleId, account: Address },
    RevokeRole { role: RoleId, account: Address },
    RenounceRole { role: RoleId, confirmation: Address },
}

impl Call {
    fn parse(command: &Commands) -> Result<Self> {
        let call = match command {
            Commands::Transfer { to, amount } => Call::Transfer {
                to: parse_address(to)?,
                amount: parse_amount(amount)?,
            },
            Commands::Approve { spender, amount } => Call::Approve {
                spender: parse_address(spender)?,
                amount: parse_amount(amount)?,
            },
            Commands::IncreaseAllowance { spender, amount } => Call::IncreaseAllowance {
                spender: parse_address(spender)?,
                amount: parse_amount(amount)?,
            },
            Commands::DecreaseAllowance { spender, amount } => Call::DecreaseAllowance {
                spender: parse_address(spender)?,
                amount: parse_amount(amount)?,
            },
            Commands::TransferFrom { from, to, amount } => Call::TransferFrom {
                from: parse_address(from)?,
                to: parse_address(to)?,
                amount: parse_amount(amount)?,
            },
            Commands::Mint { to, amount } => Call::Mint {
                to: parse_address(to)?,
                amount: parse_amount(amount)?,
            },
            Commands::Burn { amount } => Call::Burn { amount: parse_amount(amount)? },
            Commands::BurnFrom { account, amount } => Call::BurnFrom {
                account: parse_address(account)?,
                amount: parse_amount(amount)?,
            },
            Commands::Pause => Call::Pause,
            Commands::Unpause => Call::Unpause,
            Commands::GrantRole { role, account } => Call::GrantRole {
                role: parse_role(role)?,
                account: parse_address(account)?,
            },
            Commands::RevokeRole { role, account } => Call::RevokeRole {
                role: parse_role(role)?,
                account: parse_address(account)?,
            },
            Commands::RenounceRole(args) => Call::RenounceRole {
                role: parse_role(&args.role)?,
                confirmation: parse_address(&args.confirm)?,
            },
            _ => bail!("not a state-changing command"),
        };
        Ok(call)
    }

    fn apply(&self, token: &mut FungibleToken, caller: Address) -> TokenResult<()> {
        match *self {
            Call::Transfer { to, amount } => token.transfer(caller, to, amount),
            Call::Approve { spender, amount } => token.approve(caller, spender, amount),
            Call::IncreaseAllowance { spender, amount } => {
                token.increase_allowance(caller, spender, amount).map(drop)
            }
            Call::DecreaseAllowance { spender, amount } => {
                token.decrease_allowance(caller, spender, amount).map(drop)
            }
            Call::TransferFrom { from, to, amount } => token.transfer_from(caller, from, to, amount),
            Call::Mint { to, amount } => token.mint(caller, to, amount),
            Call::Burn { amount } => token.burn(caller, amount),
            Call::BurnFrom { account, amount } => token.burn_from(caller, account, amount),
            Call::Pause => token.pause(caller),
            Call::Unpause => token.unpause(caller),
            Call::GrantRole { role, account } => {
                if !token.grant_role(caller, role, account)? {
                    info!("{} already holds {}", format_address(&account), role);
                }
                Ok(())
            }
            Call::RevokeRole { role, account } => {
                if !token.revoke_role(caller, role, account)? {
                    info!("{} does not hold {}", format_address(&account), role);
                }
                Ok(())
            }
            Call::RenounceRole { role, confirmation } => {
                token.renounce_role(caller, role, confirmation).map(drop)
            }
        }
    }
}

/// Apply one call through a shared token and collect what it committed
fn commit(token: FungibleToken, caller: Address, call: &Call) -> Result<(FungibleToken, Vec<TokenEvent>)> {
    let shared = SharedToken::new(token);
    let collector = Arc::new(Collector::default());
    shared.subscribe(collector.clone());

    shared.execute(|t| call.apply(t, caller)).map_err(rejection)?;
    Ok((shared.into_inner(), collector.take()))
}

fn rejection(err: TokenError) -> anyhow::Error {
    anyhow!("{} [{}]", err, err.code())
}

fn handle_init(cli: &Cli, store: &SnapshotStore, args: &InitArgs) -> Result<()> {
    if store.exists() && !args.force {
        bail!("{} already exists; pass --force to overwrite", store.path().display());
    }

    let config = match &args.config {
        Some(path) => TokenConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => TokenConfig::default(),
    };
    let deployer = parse_address(&args.deployer)?;

    let mut token = FungibleToken::with_config(&config, deployer).map_err(rejection)?;
    let events = token.drain_events();
    report(cli, &events)?;
    store.save(&token.snapshot())?;

    info!("initialized {} ({}) at {}", token.name(), token.symbol(), store.path().display());
    Ok(())
}

fn handle_events(cli: &Cli) -> Result<()> {
    let path = cli
        .events_cbor
        .as_ref()
        .ok_or_else(|| anyhow!("--events-cbor is required"))?;
    let records = export::read_events(path)?;

    if cli.output == OutputFormat::Json {
        let lines: Vec<_> = records
            .iter()
            .map(|r| json!({ "sequence": r.sequence, "event": describe_event(&r.event) }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        for record in &records {
            println!("#{} {}", record.sequence, describe_event(&record.event));
        }
    }
    Ok(())
}

fn load(store: &SnapshotStore) -> Result<FungibleToken> {
    let snapshot = store
        .load()
        .with_context(|| format!("loading state from {}", store.path().display()))?;
    Ok(FungibleToken::from_snapshot(snapshot))
}

fn caller(cli: &Cli) -> Result<Address> {
    let raw = cli
        .caller
        .as_deref()
        .ok_or_else(|| anyhow!("--caller is required for state-changing commands"))?;
    Ok(parse_address(raw)?)
}

/// Print committed events and append them to the export file
fn report(cli: &Cli, events: &[TokenEvent]) -> Result<()> {
    if cli.output == OutputFormat::Json {
        let lines: Vec<_> = events.iter().map(describe_event).collect();
        println!("{}", json!({ "events": lines }));
    } else {
        for event in events {
            println!("{}", describe_event(event));
        }
    }

    if let Some(path) = &cli.events_cbor {
        export::append_events(path, events)?;
    }
    Ok(())
}

fn print_amount(cli: &Cli, label: &str, amount: Amount) {
    if cli.output == OutputFormat::Json {
        println!("{}", json!({ label: amount.to_string(), "formatted": format_amount(amount) }));
    } else {
        println!("{}", format_amount(amount));
    }
}

fn print_info(cli: &Cli, token: &FungibleToken) {
    let admins: Vec<String> = token.role_members(RoleId::ADMIN).iter().map(format_address).collect();
    let capabilities: Vec<&str> = capabilities::SUPPORTED
        .iter()
        .filter(|(cap, _)| token.supports_capability(*cap))
        .map(|(cap, _)| cap.tag())
        .collect();

    if cli.output == OutputFormat::Json {
        let info = json!({
            "name": token.name(),
            "symbol": token.symbol(),
            "decimals": token.decimals(),
            "total_supply": token.total_supply().to_string(),
            "paused": token.paused(),
            "holders": token.holders().len(),
            "admins": admins,
            "capabilities": capabilities,
        });
        println!("{}", info);
    } else {
        println!("name:         {}", token.name());
        println!("symbol:       {}", token.symbol());
        println!("decimals:     {}", token.decimals());
        println!("total supply: {}", format_amount(token.total_supply()));
        println!("paused:       {}", token.paused());
        println!("holders:      {}", token.holders().len());
        println!("admins:       {}", admins.join(", "));
        println!("capabilities: {}", capabilities.join(", "));
    }
}

fn print_holders(cli: &Cli, token: &FungibleToken) {
    let holders = token.holders();
    if cli.output == OutputFormat::Json {
        let rows: Vec<_> = holders
            .iter()
            .map(|(account, balance)| json!({ "account": format_address(account), "balance": balance.to_string() }))
            .collect();
        println!("{}", json!(rows));
    } else {
        for (account, balance) in &holders {
            println!("{} {}", format_address(account), format_amount(*balance));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftoken_common::constants::token;
    use std::path::Path;

    fn deployer() -> String {
        "01".repeat(32)
    }

    fn alice() -> String {
        "02".repeat(32)
    }

    fn cli(state: &Path, args: &[&str]) -> Cli {
        let mut argv = vec!["ftoken".to_string(), "--state".to_string(), state.display().to_string()];
        argv.extend(args.iter().map(|arg| arg.to_string()));
        Cli::parse_from(argv)
    }

    fn stored(state: &Path) -> FungibleToken {
        FungibleToken::from_snapshot(SnapshotStore::new(state).load().unwrap())
    }

    #[test]
    fn test_init_transfer_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("token.state");
        let events = dir.path().join("events.cbor");
        let events_arg = events.display().to_string();

        run(cli(&state, &["--events-cbor", &events_arg, "init", &deployer()])).unwrap();
        run(cli(
            &state,
            &["--caller", &deployer(), "--events-cbor", &events_arg, "transfer", &alice(), "2.5"],
        ))
        .unwrap();

        let token = stored(&state);
        let alice_addr = parse_address(&alice()).unwrap();
        assert_eq!(token.balance_of(&alice_addr), 2 * token::ONE + token::ONE / 2);
        assert_eq!(token.total_supply(), token::INITIAL_SUPPLY);
        assert!(token.check_invariants());

        let records = export::read_events(&events).unwrap();
        assert_eq!(records.iter().map(|r| r.sequence).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(
            records[1].event,
            TokenEvent::Transfer {
                from: parse_address(&deployer()).unwrap(),
                to: alice_addr,
                amount: 2 * token::ONE + token::ONE / 2,
            }
        );
    }

    #[test]
    fn test_rejected_call_leaves_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("token.state");
        run(cli(&state, &["init", &deployer()])).unwrap();
        let before = stored(&state).snapshot();

        let err = run(cli(&state, &["--caller", &alice(), "mint", &alice(), "1"])).unwrap_err();
        assert!(err.to_string().contains("E020_UNAUTHORIZED"));
        assert_eq!(stored(&state).snapshot(), before);
    }

    #[test]
    fn test_pause_and_roles_persist() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("token.state");
        run(cli(&state, &["init", &deployer()])).unwrap();

        run(cli(&state, &["--caller", &deployer(), "grant-role", "admin", &alice()])).unwrap();
        run(cli(&state, &["--caller", &alice(), "pause"])).unwrap();

        let token = stored(&state);
        assert!(token.paused());
        assert!(token.has_role(RoleId::ADMIN, &parse_address(&alice()).unwrap()));

        let err = run(cli(&state, &["--caller", &deployer(), "transfer", &alice(), "1"])).unwrap_err();
        assert!(err.to_string().contains("E032_OPERATION_PAUSED"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("token.state");
        run(cli(&state, &["init", &deployer()])).unwrap();
        run(cli(&state, &["--caller", &deployer(), "burn", "10"])).unwrap();

        assert!(run(cli(&state, &["init", &alice()])).is_err());
        assert_eq!(stored(&state).total_supply(), token::INITIAL_SUPPLY - 10 * token::ONE);

        run(cli(&state, &["init", &alice(), "--force"])).unwrap();
        assert_eq!(stored(&state).total_supply(), token::INITIAL_SUPPLY);
    }

    #[test]
    fn test_init_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("token.state");
        let config = dir.path().join("token.json");
        std::fs::write(&config, r#"{ "name": "Gold", "symbol": "GLD", "initial_supply": 500 }"#).unwrap();
        let config_arg = config.display().to_string();

        run(cli(&state, &["init", &deployer(), "--config", &config_arg])).unwrap();

        let token = stored(&state);
        assert_eq!(token.symbol(), "GLD");
        assert_eq!(token.total_supply(), 500);
    }

    #[test]
    fn test_arguments_checked_before_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("absent.state");

        let err = run(cli(&state, &["--caller", &deployer(), "transfer", &alice(), "1.x"])).unwrap_err();
        assert!(err.to_string().contains("invalid amount"));

        let err = run(cli(&state, &["transfer", &alice(), "1"])).unwrap_err();
        assert!(err.to_string().contains("--caller"));
        assert!(!state.exists());
    }

    #[test]
    fn test_supports_needs_no_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("absent.state");

        run(cli(&state, &["supports", "pausable"])).unwrap();
        run(cli(&state, &["supports", "0x01ffc9a7"])).unwrap();
        assert!(run(cli(&state, &["supports", "mintable"])).is_err());
    }
}
