use std::collections::HashMap;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};
use ethers::{
    providers::{Http, JsonRpcClient, Middleware, Provider},
    types::{
        transaction::eip2718::TypedTransaction, BlockNumber, Filter, TransactionRequest, H160,
        U256 as RpcU256, U64,
    },
};
use eyre::bail;
use tracing::trace;

use crate::{
    events::{ArgValue, RawEvent, INativeLoan},
    history::LedgerSource,
};

/// Name given to logs whose topic matches none of the loan events.
pub const UNKNOWN_EVENT: &str = "Unknown";

/// [`LedgerSource`] over a JSON-RPC node.
#[derive(Clone, Debug)]
pub struct EthersLedger<P = Http> {
    provider: Provider<P>,
}

impl EthersLedger<Http> {
    pub fn connect(rpc_url: &str) -> eyre::Result<Self> {
        Ok(Self::from_provider(Provider::<Http>::try_from(rpc_url)?))
    }
}

impl<P: JsonRpcClient> EthersLedger<P> {
    pub fn from_provider(provider: Provider<P>) -> Self {
        Self { provider }
    }

    async fn _call(&self, contract: Address, data: Vec<u8>) -> eyre::Result<Vec<u8>> {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(_h160(contract))
            .data(data)
            .into();
        let out = self.provider.call(&tx, None).await?;
        Ok(out.to_vec())
    }

    async fn _block_timestamp(&self, block: u64) -> eyre::Result<u64> {
        let Some(header) = self.provider.get_block(BlockNumber::Number(U64::from(block))).await? else {
            return Ok(0);
        };
        if header.timestamp > RpcU256::from(u64::MAX) {
            bail!("block {block} timestamp {} does not fit in u64", header.timestamp);
        }
        Ok(header.timestamp.low_u64())
    }
}

impl<P: JsonRpcClient> LedgerSource for EthersLedger<P> {
    async fn query_events(&self, contract: Address) -> eyre::Result<Vec<RawEvent>> {
        let logs = self.provider.get_logs(&log_filter(contract)).await?;

        let mut timestamps: HashMap<u64, u64> = HashMap::new();
        let mut records = Vec::with_capacity(logs.len());
        for log in logs {
            let block_timestamp = match log.block_number.map(|n| n.as_u64()) {
                Some(n) => match timestamps.get(&n) {
                    Some(ts) => *ts,
                    None => {
                        let ts = self._block_timestamp(n).await?;
                        timestamps.insert(n, ts);
                        ts
                    }
                },
                None => 0,
            };
            let topics: Vec<B256> = log.topics.iter().map(|t| B256::from(t.0)).collect();
            let mut record = decode_log(&topics, &log.data, Address::from(log.address.0))?;
            record.block_timestamp = block_timestamp;
            records.push(record);
        }
        Ok(records)
    }

    async fn total_due(&self, contract: Address) -> eyre::Result<U256> {
        let out = self._call(contract, INativeLoan::totalDueCall {}.abi_encode()).await?;
        Ok(INativeLoan::totalDueCall::abi_decode_returns(&out, true)?._0)
    }

    async fn due_date(&self, contract: Address) -> eyre::Result<U256> {
        let out = self._call(contract, INativeLoan::dueDateCall {}.abi_encode()).await?;
        Ok(INativeLoan::dueDateCall::abi_decode_returns(&out, true)?._0)
    }
}

/// Every log of `contract`, from genesis to the latest block.
pub(crate) fn log_filter(contract: Address) -> Filter {
    Filter::new()
        .address(_h160(contract))
        .from_block(BlockNumber::Earliest)
        .to_block(BlockNumber::Latest)
}

/// Decodes one log against the loan contract ABI.
///
/// The returned record carries a zero timestamp; the caller fills it in from
/// the containing block.
pub fn decode_log(topics: &[B256], data: &[u8], address: Address) -> eyre::Result<RawEvent> {
    use INativeLoan::{Funded, FullyRepaid, LoanTaken, PartialRepayment, PenaltyApplied};

    let topic0 = topics.first().copied().unwrap_or_default();
    let raw = topics.iter().copied();

    let record = if topic0 == Funded::SIGNATURE_HASH {
        let ev = Funded::decode_raw_log(raw, data, true)?;
        RawEvent::new("Funded", address, 0)
            .with_arg("amount", ArgValue::Uint(ev.amount))
            .with_arg("interestAmount", ArgValue::Uint(ev.interestAmount))
            .with_arg("totalAmount", ArgValue::Uint(ev.totalAmount))
    } else if topic0 == LoanTaken::SIGNATURE_HASH {
        let ev = LoanTaken::decode_raw_log(raw, data, true)?;
        RawEvent::new("LoanTaken", address, 0)
            .with_arg("borrower", ArgValue::Address(ev.borrower))
            .with_arg("amount", ArgValue::Uint(ev.amount))
    } else if topic0 == PartialRepayment::SIGNATURE_HASH {
        let ev = PartialRepayment::decode_raw_log(raw, data, true)?;
        RawEvent::new("PartialRepayment", address, 0)
            .with_arg("payer", ArgValue::Address(ev.payer))
            .with_arg("amount", ArgValue::Uint(ev.amount))
    } else if topic0 == FullyRepaid::SIGNATURE_HASH {
        let ev = FullyRepaid::decode_raw_log(raw, data, true)?;
        RawEvent::new("FullyRepaid", address, 0)
            .with_arg("payer", ArgValue::Address(ev.payer))
            .with_arg("amount", ArgValue::Uint(ev.amount))
    } else if topic0 == PenaltyApplied::SIGNATURE_HASH {
        let ev = PenaltyApplied::decode_raw_log(raw, data, true)?;
        RawEvent::new("PenaltyApplied", address, 0)
            .with_arg("penaltyAmount", ArgValue::Uint(ev.penaltyAmount))
    } else {
        trace!(%address, topic = %topic0, "unrecognised log");
        RawEvent::new(UNKNOWN_EVENT, address, 0)
            .with_arg("topic", ArgValue::Text(topic0.to_string()))
            .with_arg("data", ArgValue::Text(format!("0x{}", hex::encode(data))))
    };
    Ok(record)
}

fn _h160(address: Address) -> H160 {
    H160::from_slice(address.as_slice())
}
