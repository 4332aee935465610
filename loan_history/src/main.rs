use std::{env, process::ExitCode};

use alloy_primitives::Address;
use eyre::{bail, WrapErr};
use loan_history::{
    config::Config, AddressRegistry, EthersLedger, JsonFileRegistry, LoanBoard, LoanHistory,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:
  loan-history fetch <wallet>
  loan-history register <wallet> <contract>
  loan-history list <wallet>";

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let registry = JsonFileRegistry::new(config.registry_path.clone());
    let args: Vec<String> = env::args().skip(1).collect();

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["fetch", wallet] => {
            let identity = _address(wallet)?;
            let ledger = match config.rpc_url.as_deref() {
                Some(url) => Some(EthersLedger::connect(url)?),
                None => {
                    warn!("LOAN_HISTORY_RPC_URL not set, no ledger to query");
                    None
                }
            };
            let history = LoanHistory::new(ledger, &registry)
                .with_fold_order(config.fold_order)
                .with_call_timeout(config.call_timeout);

            let board = LoanBoard::new();
            history.refresh(&board, Some(identity)).await;
            let view = board.snapshot();
            if let Some(error) = view.error {
                bail!(error);
            }
            println!("{}", serde_json::to_string_pretty(&view.loans)?);
        }
        ["register", wallet, contract] => {
            let identity = _address(wallet)?;
            let contract = _address(contract)?;
            if registry.append(identity, contract)? {
                info!(%identity, %contract, "contract registered");
            } else {
                info!(%identity, %contract, "contract already registered");
            }
        }
        ["list", wallet] => {
            let identity = _address(wallet)?;
            for contract in registry.addresses(identity)? {
                println!("{contract}");
            }
        }
        _ => {
            eprintln!("{USAGE}");
            return Ok(ExitCode::from(2));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn _address(s: &str) -> eyre::Result<Address> {
    s.parse::<Address>().wrap_err_with(|| format!("`{s}` is not an address"))
}
