//! Vote proxies: a contract that lets a hot wallet vote with MKR held by a
//! cold wallet. The factory records the link in both directions.

use chief_rpc::{CallReader, TxSender};
use chief_types::{Address, TxHash};
use ethabi::ParamType;
use serde::Serialize;
use std::sync::Arc;

use crate::abi;
use crate::error::ChiefError;

/// A deployed vote proxy and the two wallets it links.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VoteProxy {
    pub proxy: Address,
    pub hot: Address,
    pub cold: Address,
}

/// The vote-proxy factory at `address`.
pub struct VoteProxyFactory<T> {
    transport: Arc<T>,
    address: Address,
}

impl<T> VoteProxyFactory<T> {
    pub fn new(transport: Arc<T>, address: Address) -> Self {
        Self { transport, address }
    }
}

impl<T: CallReader> VoteProxyFactory<T> {
    async fn read_address(
        &self,
        to: &Address,
        method: &'static str,
        params: &[ParamType],
        args: &[ethabi::Token],
    ) -> Result<Address, ChiefError> {
        let data = abi::encode_call(method, params, args);
        let ret = self.transport.call(to, &data).await?;
        abi::decode_address(method, &ret)
    }

    /// Proxy whose hot wallet is `hot`; zero if none.
    pub async fn hot_map(&self, hot: &Address) -> Result<Address, ChiefError> {
        self.read_address(
            &self.address,
            "hotMap",
            &[ParamType::Address],
            &[abi::address_token(hot)],
        )
        .await
    }

    /// Proxy whose cold wallet is `cold`; zero if none.
    pub async fn cold_map(&self, cold: &Address) -> Result<Address, ChiefError> {
        self.read_address(
            &self.address,
            "coldMap",
            &[ParamType::Address],
            &[abi::address_token(cold)],
        )
        .await
    }

    /// Read the wallets linked by the proxy contract at `proxy`.
    pub async fn proxy_info(&self, proxy: Address) -> Result<VoteProxy, ChiefError> {
        let hot = self.read_address(&proxy, "hot", &[], &[]).await?;
        let cold = self.read_address(&proxy, "cold", &[], &[]).await?;
        Ok(VoteProxy { proxy, hot, cold })
    }

    /// The proxy `wallet` belongs to, as either its hot or its cold side.
    pub async fn get_vote_proxy(&self, wallet: &Address) -> Result<Option<VoteProxy>, ChiefError> {
        let mut proxy = self.hot_map(wallet).await?;
        if proxy.is_zero() {
            proxy = self.cold_map(wallet).await?;
        }
        if proxy.is_zero() {
            return Ok(None);
        }
        self.proxy_info(proxy).await.map(Some)
    }
}

impl<T: TxSender> VoteProxyFactory<T> {
    async fn send(&self, data: Vec<u8>) -> Result<TxHash, ChiefError> {
        Ok(self.transport.send_transaction(&self.address, &data).await?)
    }

    /// Sent by the cold wallet: propose a link to `hot`.
    pub async fn initiate_link(&self, hot: &Address) -> Result<TxHash, ChiefError> {
        self.send(abi::encode_call(
            "initiateLink",
            &[ParamType::Address],
            &[abi::address_token(hot)],
        ))
        .await
    }

    /// Sent by the hot wallet: accept the link proposed by `cold`, deploying the proxy.
    pub async fn approve_link(&self, cold: &Address) -> Result<TxHash, ChiefError> {
        self.send(abi::encode_call(
            "approveLink",
            &[ParamType::Address],
            &[abi::address_token(cold)],
        ))
        .await
    }

    /// Sent by either wallet: dissolve the sender's link.
    pub async fn break_link(&self) -> Result<TxHash, ChiefError> {
        self.send(abi::encode_call("breakLink", &[], &[])).await
    }
}
