//! Minimal ABI plumbing on top of `ethabi` for the handful of contract
//! methods this crate talks to.

use chief_types::{Address, MkrAmount, SlateId};
use ethabi::{ParamType, Token, Uint};

use crate::error::ChiefError;

/// Build calldata: 4-byte selector of `name(params)` followed by the encoded arguments.
pub fn encode_call(name: &str, params: &[ParamType], args: &[Token]) -> Vec<u8> {
    let mut data = ethabi::short_signature(name, params).to_vec();
    data.extend(ethabi::encode(args));
    data
}

/// `0x`-prefixed hex of an event's topic0 (keccak256 of its signature).
pub fn event_topic(name: &str, params: &[ParamType]) -> String {
    format!("0x{}", hex::encode(ethabi::long_signature(name, params).as_bytes()))
}

pub fn address_token(address: &Address) -> Token {
    Token::Address(ethabi::Address::from_slice(address.as_bytes()))
}

pub fn slate_token(slate: &SlateId) -> Token {
    Token::FixedBytes(slate.as_bytes().to_vec())
}

pub fn amount_token(amount: MkrAmount) -> Token {
    Token::Uint(Uint::from(amount.raw()))
}

fn decode_one(method: &'static str, kind: ParamType, data: &[u8]) -> Result<Token, ChiefError> {
    ethabi::decode(&[kind], data)
        .map_err(|e| ChiefError::Decode {
            method,
            reason: e.to_string(),
        })?
        .into_iter()
        .next()
        .ok_or(ChiefError::Decode {
            method,
            reason: "empty return data".into(),
        })
}

pub fn decode_address(method: &'static str, data: &[u8]) -> Result<Address, ChiefError> {
    decode_one(method, ParamType::Address, data)?
        .into_address()
        .map(|a| Address::new(a.to_fixed_bytes()))
        .ok_or(ChiefError::Decode {
            method,
            reason: "not an address".into(),
        })
}

pub fn decode_slate(method: &'static str, data: &[u8]) -> Result<SlateId, ChiefError> {
    let bytes = decode_one(method, ParamType::FixedBytes(32), data)?
        .into_fixed_bytes()
        .ok_or(ChiefError::Decode {
            method,
            reason: "not bytes32".into(),
        })?;
    let word: [u8; 32] = bytes.try_into().map_err(|_| ChiefError::Decode {
        method,
        reason: "bytes32 of wrong length".into(),
    })?;
    Ok(SlateId::new(word))
}

pub fn decode_amount(method: &'static str, data: &[u8]) -> Result<MkrAmount, ChiefError> {
    let value = decode_one(method, ParamType::Uint(256), data)?
        .into_uint()
        .ok_or(ChiefError::Decode {
            method,
            reason: "not a uint".into(),
        })?;
    if value.bits() > 128 {
        return Err(ChiefError::Decode {
            method,
            reason: format!("{value} exceeds u128"),
        });
    }
    Ok(MkrAmount::new(value.as_u128()))
}
