//! Tests for the ABI-backed chief and vote-proxy bindings against a scripted
//! transport.

use chief_governance::abi::{self, address_token, slate_token};
use chief_governance::slate::read_slate;
use chief_governance::{
    etched_slates, Chief, ChiefReader, SlateEnd, VotePicks, VoteProxy, VoteProxyFactory,
    ETCH_EVENT,
};
use chief_nullables::{NullChief, NullTransport, SentTransaction};
use chief_rpc::LogEntry;
use chief_types::{Address, MkrAmount, SlateId};
use ethabi::{ParamType, Token};
use std::sync::Arc;

const CHIEF: [u8; 20] = [0xc1; 20];
const FACTORY: [u8; 20] = [0xfa; 20];

fn addr(byte: u8) -> Address {
    Address::new([byte; 20])
}

fn chief_with(transport: &Arc<NullTransport>) -> Chief<NullTransport> {
    Chief::new(transport.clone(), Address::new(CHIEF))
}

fn returns_address(address: Address) -> Vec<u8> {
    ethabi::encode(&[address_token(&address)])
}

fn by_address(method: &str, arg: Address) -> Vec<u8> {
    abi::encode_call(method, &[ParamType::Address], &[address_token(&arg)])
}

fn slate_entry(slate: &SlateId, index: u64) -> Vec<u8> {
    abi::encode_call(
        "slates",
        &[ParamType::FixedBytes(32), ParamType::Uint(256)],
        &[slate_token(slate), Token::Uint(index.into())],
    )
}

#[tokio::test]
async fn reads_decode_contract_returns() {
    let transport = Arc::new(NullTransport::new());
    let chief_address = Address::new(CHIEF);
    let voter = addr(0xa);
    let slate = SlateId::new([7; 32]);
    let deposit = MkrAmount::parse("12.5").unwrap();

    transport.respond(
        chief_address,
        by_address("deposits", voter),
        ethabi::encode(&[abi::amount_token(deposit)]),
    );
    transport.respond(
        chief_address,
        by_address("votes", voter),
        ethabi::encode(&[slate_token(&slate)]),
    );
    transport.respond(
        chief_address,
        abi::encode_call("hat", &[], &[]),
        returns_address(addr(0x11)),
    );
    transport.respond(
        chief_address,
        by_address("approvals", addr(0x11)),
        ethabi::encode(&[abi::amount_token(MkrAmount::from_whole(40_000))]),
    );

    let chief = chief_with(&transport);
    assert_eq!(chief.deposits(&voter).await.unwrap(), deposit);
    assert_eq!(chief.votes(&voter).await.unwrap(), slate);
    assert_eq!(chief.hat().await.unwrap(), addr(0x11));
    assert_eq!(
        chief.approvals(&addr(0x11)).await.unwrap(),
        MkrAmount::from_whole(40_000)
    );
    assert_eq!(transport.calls().len(), 4);
    assert!(transport.calls().iter().all(|(to, _)| *to == chief_address));
}

#[tokio::test]
async fn malformed_return_is_a_decode_error() {
    let transport = Arc::new(NullTransport::new());
    transport.respond(
        Address::new(CHIEF),
        abi::encode_call("hat", &[], &[]),
        vec![0x01, 0x02],
    );

    let err = chief_with(&transport).hat().await.unwrap_err();
    assert!(matches!(
        err,
        chief_governance::ChiefError::Decode { method: "hat", .. }
    ));
    assert!(!err.is_revert());
}

#[tokio::test]
async fn slate_read_ends_on_revert() {
    let transport = Arc::new(NullTransport::new());
    let slate = SlateId::new([3; 32]);
    for (index, candidate) in [addr(1), addr(2)].into_iter().enumerate() {
        transport.respond(
            Address::new(CHIEF),
            slate_entry(&slate, index as u64),
            returns_address(candidate),
        );
    }

    let chief = chief_with(&transport);
    let (candidates, end) = read_slate(&chief, &slate, 1024).await;
    assert_eq!(candidates, vec![addr(1), addr(2)]);
    assert_eq!(end, SlateEnd::Reverted);
    assert_eq!(transport.calls().len(), 3);
}

#[tokio::test]
async fn lock_sends_calldata_to_chief() {
    let transport = Arc::new(NullTransport::new());
    let chief = chief_with(&transport);

    let hash = chief.lock(MkrAmount::from_whole(2)).await.unwrap();
    assert!(!hash.is_zero());

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let SentTransaction { to, data } = &sent[0];
    assert_eq!(*to, Address::new(CHIEF));
    assert_eq!(hex::encode(&data[..4]), "dd467064");
    assert_eq!(
        ethabi::decode(&[ParamType::Uint(256)], &data[4..]).unwrap(),
        vec![Token::Uint(2_000_000_000_000_000_000u128.into())]
    );
}

#[tokio::test]
async fn writes_go_out_in_order() {
    let transport = Arc::new(NullTransport::new());
    let chief = chief_with(&transport);
    let slate = SlateId::new([9; 32]);

    chief.etch(vec![addr(1), addr(2)]).await.unwrap();
    chief.vote(VotePicks::Slate(slate)).await.unwrap();
    chief.lift(addr(1)).await.unwrap();
    chief.free(MkrAmount::from_whole(1)).await.unwrap();

    let selectors: Vec<String> = transport
        .sent()
        .iter()
        .map(|tx| hex::encode(&tx.data[..4]))
        .collect();
    let expected: Vec<String> = [
        ethabi::short_signature("etch", &[ParamType::Array(Box::new(ParamType::Address))]),
        ethabi::short_signature("vote", &[ParamType::FixedBytes(32)]),
        ethabi::short_signature("lift", &[ParamType::Address]),
        ethabi::short_signature("free", &[ParamType::Uint(256)]),
    ]
    .iter()
    .map(hex::encode)
    .collect();
    assert_eq!(selectors, expected);
}

fn proxy_transport(proxy: Address, hot: Address, cold: Address) -> Arc<NullTransport> {
    let transport = Arc::new(NullTransport::new());
    let factory = Address::new(FACTORY);
    for wallet in [hot, cold, addr(0x99)] {
        let (hot_hit, cold_hit) = if wallet == hot {
            (proxy, Address::ZERO)
        } else if wallet == cold {
            (Address::ZERO, proxy)
        } else {
            (Address::ZERO, Address::ZERO)
        };
        transport.respond(factory, by_address("hotMap", wallet), returns_address(hot_hit));
        transport.respond(factory, by_address("coldMap", wallet), returns_address(cold_hit));
    }
    transport.respond(proxy, abi::encode_call("hot", &[], &[]), returns_address(hot));
    transport.respond(proxy, abi::encode_call("cold", &[], &[]), returns_address(cold));
    transport
}

#[tokio::test]
async fn vote_proxy_found_from_either_wallet() {
    let (proxy, hot, cold) = (addr(0x50), addr(0x51), addr(0x52));
    let transport = proxy_transport(proxy, hot, cold);
    let factory = VoteProxyFactory::new(transport, Address::new(FACTORY));
    let expected = VoteProxy { proxy, hot, cold };

    assert_eq!(factory.get_vote_proxy(&hot).await.unwrap(), Some(expected));
    assert_eq!(factory.get_vote_proxy(&cold).await.unwrap(), Some(expected));
    assert_eq!(factory.get_vote_proxy(&addr(0x99)).await.unwrap(), None);
}

#[tokio::test]
async fn link_management_targets_factory() {
    let transport = Arc::new(NullTransport::new());
    let factory = VoteProxyFactory::new(transport.clone(), Address::new(FACTORY));

    factory.initiate_link(&addr(0x51)).await.unwrap();
    factory.approve_link(&addr(0x52)).await.unwrap();
    factory.break_link().await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|tx| tx.to == Address::new(FACTORY)));
    assert_eq!(sent[0].data, by_address("initiateLink", addr(0x51)));
    assert_eq!(sent[1].data, by_address("approveLink", addr(0x52)));
    assert_eq!(sent[2].data, abi::encode_call("breakLink", &[], &[]));
}

#[tokio::test]
async fn etched_slates_from_logs() {
    let chief = NullChief::new(Address::new(CHIEF));
    let topic0 = abi::event_topic(ETCH_EVENT, &[ParamType::FixedBytes(32)]);
    let first = SlateId::new([1; 32]);
    let second = SlateId::new([2; 32]);
    for slate in [first, second, first] {
        chief.push_log(LogEntry::new(
            Address::new(CHIEF),
            vec![topic0.clone(), slate.to_string()],
        ));
    }
    chief.push_log(LogEntry::new(Address::new(CHIEF), vec![topic0.clone()]));

    let slates = etched_slates(&chief, Address::new(CHIEF)).await.unwrap();
    assert_eq!(slates, vec![first, second]);
}
