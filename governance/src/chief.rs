//! The DSChief contract: typed reads behind [`ChiefReader`], pass-through writes.

use async_trait::async_trait;
use chief_rpc::{CallReader, TxSender};
use chief_types::{Address, MkrAmount, SlateId, TxHash};
use ethabi::ParamType;
use std::sync::Arc;

use crate::abi;
use crate::error::ChiefError;

/// Read-only view of the chief contract.
#[async_trait]
pub trait ChiefReader: Send + Sync {
    /// Address of the chief contract (used to filter its logs).
    fn address(&self) -> Address;

    /// MKR currently locked by `voter`.
    async fn deposits(&self, voter: &Address) -> Result<MkrAmount, ChiefError>;

    /// Slate currently chosen by `voter`; zero if the voter never voted.
    async fn votes(&self, voter: &Address) -> Result<SlateId, ChiefError>;

    /// Candidate at `index` of `slate`. Fails past the end of the slate.
    async fn slates(&self, slate: &SlateId, index: u64) -> Result<Address, ChiefError>;

    /// Total MKR approving `candidate`.
    async fn approvals(&self, candidate: &Address) -> Result<MkrAmount, ChiefError>;

    /// The current leader.
    async fn hat(&self) -> Result<Address, ChiefError>;
}

#[async_trait]
impl<T: ChiefReader + ?Sized> ChiefReader for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn deposits(&self, voter: &Address) -> Result<MkrAmount, ChiefError> {
        (**self).deposits(voter).await
    }

    async fn votes(&self, voter: &Address) -> Result<SlateId, ChiefError> {
        (**self).votes(voter).await
    }

    async fn slates(&self, slate: &SlateId, index: u64) -> Result<Address, ChiefError> {
        (**self).slates(slate, index).await
    }

    async fn approvals(&self, candidate: &Address) -> Result<MkrAmount, ChiefError> {
        (**self).approvals(candidate).await
    }

    async fn hat(&self) -> Result<Address, ChiefError> {
        (**self).hat().await
    }
}

/// What a `vote` call selects: an explicit candidate list or an etched slate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VotePicks {
    Candidates(Vec<Address>),
    Slate(SlateId),
}

/// A state-changing chief call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChiefCall {
    Etch(Vec<Address>),
    Lift(Address),
    Vote(VotePicks),
    Lock(MkrAmount),
    Free(MkrAmount),
}

fn address_array(addresses: &[Address]) -> ethabi::Token {
    ethabi::Token::Array(addresses.iter().map(abi::address_token).collect())
}

impl ChiefCall {
    /// ABI calldata for this call. Amounts are already in wei.
    pub fn encode(&self) -> Vec<u8> {
        let address_list = ParamType::Array(Box::new(ParamType::Address));
        match self {
            ChiefCall::Etch(candidates) => {
                abi::encode_call("etch", &[address_list], &[address_array(candidates)])
            }
            ChiefCall::Lift(candidate) => abi::encode_call(
                "lift",
                &[ParamType::Address],
                &[abi::address_token(candidate)],
            ),
            ChiefCall::Vote(VotePicks::Candidates(candidates)) => {
                abi::encode_call("vote", &[address_list], &[address_array(candidates)])
            }
            ChiefCall::Vote(VotePicks::Slate(slate)) => abi::encode_call(
                "vote",
                &[ParamType::FixedBytes(32)],
                &[abi::slate_token(slate)],
            ),
            ChiefCall::Lock(amount) => {
                abi::encode_call("lock", &[ParamType::Uint(256)], &[abi::amount_token(*amount)])
            }
            ChiefCall::Free(amount) => {
                abi::encode_call("free", &[ParamType::Uint(256)], &[abi::amount_token(*amount)])
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChiefCall::Etch(_) => "etch",
            ChiefCall::Lift(_) => "lift",
            ChiefCall::Vote(_) => "vote",
            ChiefCall::Lock(_) => "lock",
            ChiefCall::Free(_) => "free",
        }
    }
}

/// The chief contract at `address`, reached through transport `T`.
pub struct Chief<T> {
    transport: Arc<T>,
    address: Address,
}

impl<T> Chief<T> {
    pub fn new(transport: Arc<T>, address: Address) -> Self {
        Self { transport, address }
    }
}

impl<T: CallReader> Chief<T> {
    async fn read(&self, data: Vec<u8>) -> Result<Vec<u8>, ChiefError> {
        Ok(self.transport.call(&self.address, &data).await?)
    }
}

#[async_trait]
impl<T: CallReader> ChiefReader for Chief<T> {
    fn address(&self) -> Address {
        self.address
    }

    async fn deposits(&self, voter: &Address) -> Result<MkrAmount, ChiefError> {
        let data = abi::encode_call("deposits", &[ParamType::Address], &[abi::address_token(voter)]);
        abi::decode_amount("deposits", &self.read(data).await?)
    }

    async fn votes(&self, voter: &Address) -> Result<SlateId, ChiefError> {
        let data = abi::encode_call("votes", &[ParamType::Address], &[abi::address_token(voter)]);
        abi::decode_slate("votes", &self.read(data).await?)
    }

    async fn slates(&self, slate: &SlateId, index: u64) -> Result<Address, ChiefError> {
        let data = abi::encode_call(
            "slates",
            &[ParamType::FixedBytes(32), ParamType::Uint(256)],
            &[abi::slate_token(slate), ethabi::Token::Uint(index.into())],
        );
        abi::decode_address("slates", &self.read(data).await?)
    }

    async fn approvals(&self, candidate: &Address) -> Result<MkrAmount, ChiefError> {
        let data = abi::encode_call(
            "approvals",
            &[ParamType::Address],
            &[abi::address_token(candidate)],
        );
        abi::decode_amount("approvals", &self.read(data).await?)
    }

    async fn hat(&self) -> Result<Address, ChiefError> {
        let data = abi::encode_call("hat", &[], &[]);
        abi::decode_address("hat", &self.read(data).await?)
    }
}

impl<T: TxSender> Chief<T> {
    /// Submit `call` to the chief and return the transaction hash.
    pub async fn send(&self, call: ChiefCall) -> Result<TxHash, ChiefError> {
        tracing::debug!(method = call.name(), chief = %self.address, "sending chief call");
        Ok(self
            .transport
            .send_transaction(&self.address, &call.encode())
            .await?)
    }

    pub async fn etch(&self, candidates: Vec<Address>) -> Result<TxHash, ChiefError> {
        self.send(ChiefCall::Etch(candidates)).await
    }

    pub async fn lift(&self, candidate: Address) -> Result<TxHash, ChiefError> {
        self.send(ChiefCall::Lift(candidate)).await
    }

    pub async fn vote(&self, picks: VotePicks) -> Result<TxHash, ChiefError> {
        self.send(ChiefCall::Vote(picks)).await
    }

    pub async fn lock(&self, amount: MkrAmount) -> Result<TxHash, ChiefError> {
        self.send(ChiefCall::Lock(amount)).await
    }

    pub async fn free(&self, amount: MkrAmount) -> Result<TxHash, ChiefError> {
        self.send(ChiefCall::Free(amount)).await
    }
}
