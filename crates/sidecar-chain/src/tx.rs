//! Transaction construction and signing scaffolding
//!
//! Builds protobuf transactions for broadcast. Only the handful of wire
//! types the sidecar needs are declared here; messages themselves come from
//! `osmosis-std` as protobuf `Any` values.

use cosmwasm_std::{Coin, Decimal, Uint128};
use osmosis_std::shim::Any;
use osmosis_std::types::cosmos::base::v1beta1::Coin as ProtoCoin;
use prost::Message;

use crate::clients::{ChainError, Keyring};

/// Direct sign mode as defined by the signing protocol.
pub const SIGN_MODE_DIRECT: i32 = 1;

/// Type url of the secp256k1 public key.
const SECP256K1_PUB_KEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";

/// Parameters carried into chain-side gas simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct TxFactory {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub gas_adjustment: f64,
}

/// Data identifying the signer of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerData {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
}

/// Builds the signer data for the given chain and account coordinates.
pub fn build_signer_data(chain_id: &str, account_number: u64, sequence: u64) -> SignerData {
    SignerData {
        chain_id: chain_id.to_string(),
        account_number,
        sequence,
    }
}

/// A single signature slot of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureV2 {
    pub pub_key: Vec<u8>,
    /// Empty until the transaction has been signed.
    pub signature: Vec<u8>,
    pub sequence: u64,
}

/// Creates a signature slot. A `None` signature produces the placeholder
/// used to make the transaction byte-addressable before signing.
pub fn build_signature(pub_key: Vec<u8>, signature: Option<Vec<u8>>, sequence: u64) -> SignatureV2 {
    SignatureV2 {
        pub_key,
        signature: signature.unwrap_or_default(),
        sequence,
    }
}

/// Calculates the fee amount from the base fee and the gas used, rounding up
/// to the nearest integer.
pub fn calculate_fee_amount(base_fee: Decimal, gas: u64) -> Uint128 {
    (base_fee * Decimal::from_ratio(gas, 1u64)).to_uint_ceil()
}

/// Mutable transaction under construction.
#[derive(Debug, Clone, Default)]
pub struct TxBuilder {
    msgs: Vec<Any>,
    memo: String,
    gas_limit: u64,
    fee_amount: Vec<Coin>,
    signatures: Vec<SignatureV2>,
}

impl TxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_msgs(&mut self, msgs: Vec<Any>) {
        self.msgs = msgs;
    }

    pub fn set_gas_limit(&mut self, gas_limit: u64) {
        self.gas_limit = gas_limit;
    }

    pub fn set_fee_amount(&mut self, fee_amount: Vec<Coin>) {
        self.fee_amount = fee_amount;
    }

    pub fn set_signatures(&mut self, signatures: Vec<SignatureV2>) {
        self.signatures = signatures;
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn fee_amount(&self) -> &[Coin] {
        &self.fee_amount
    }

    pub fn msgs(&self) -> &[Any] {
        &self.msgs
    }

    /// Signs the transaction in direct mode with the keyring's private key
    /// and replaces the placeholder signature with the real one.
    pub fn sign_with_keyring(
        &mut self,
        keyring: &dyn Keyring,
        signer_data: &SignerData,
    ) -> Result<(), ChainError> {
        let sign_doc = SignDoc {
            body_bytes: self.body_bytes(),
            auth_info_bytes: self.auth_info_bytes(),
            chain_id: signer_data.chain_id.clone(),
            account_number: signer_data.account_number,
        };

        let signature = keyring.sign(&sign_doc.encode_to_vec())?;

        self.signatures = vec![build_signature(
            keyring.pub_key_bytes(),
            Some(signature),
            signer_data.sequence,
        )];

        Ok(())
    }

    /// Encodes the signed transaction into broadcastable bytes.
    pub fn encode(&self) -> Vec<u8> {
        let raw = TxRaw {
            body_bytes: self.body_bytes(),
            auth_info_bytes: self.auth_info_bytes(),
            signatures: self
                .signatures
                .iter()
                .map(|signature| signature.signature.clone())
                .collect(),
        };
        raw.encode_to_vec()
    }

    fn body_bytes(&self) -> Vec<u8> {
        TxBody {
            messages: self.msgs.clone(),
            memo: self.memo.clone(),
            timeout_height: 0,
        }
        .encode_to_vec()
    }

    fn auth_info_bytes(&self) -> Vec<u8> {
        let signer_infos = self
            .signatures
            .iter()
            .map(|signature| SignerInfo {
                public_key: Some(Any {
                    type_url: SECP256K1_PUB_KEY_TYPE_URL.to_string(),
                    value: PubKey {
                        key: signature.pub_key.clone(),
                    }
                    .encode_to_vec(),
                }),
                mode_info: Some(ModeInfo {
                    single: Some(ModeInfoSingle {
                        mode: SIGN_MODE_DIRECT,
                    }),
                }),
                sequence: signature.sequence,
            })
            .collect();

        AuthInfo {
            signer_infos,
            fee: Some(Fee {
                amount: self
                    .fee_amount
                    .iter()
                    .map(|coin| ProtoCoin {
                        denom: coin.denom.clone(),
                        amount: coin.amount.to_string(),
                    })
                    .collect(),
                gas_limit: self.gas_limit,
                payer: String::new(),
                granter: String::new(),
            }),
        }
        .encode_to_vec()
    }
}

// Wire types for the transaction envelope. Field numbers follow the
// cosmos.tx.v1beta1 protobuf definitions.

#[derive(Clone, PartialEq, Message)]
struct TxBody {
    #[prost(message, repeated, tag = "1")]
    messages: Vec<Any>,
    #[prost(string, tag = "2")]
    memo: String,
    #[prost(uint64, tag = "3")]
    timeout_height: u64,
}

#[derive(Clone, PartialEq, Message)]
struct Fee {
    #[prost(message, repeated, tag = "1")]
    amount: Vec<ProtoCoin>,
    #[prost(uint64, tag = "2")]
    gas_limit: u64,
    #[prost(string, tag = "3")]
    payer: String,
    #[prost(string, tag = "4")]
    granter: String,
}

#[derive(Clone, PartialEq, Message)]
struct ModeInfoSingle {
    #[prost(int32, tag = "1")]
    mode: i32,
}

#[derive(Clone, PartialEq, Message)]
struct ModeInfo {
    #[prost(message, optional, tag = "1")]
    single: Option<ModeInfoSingle>,
}

#[derive(Clone, PartialEq, Message)]
struct SignerInfo {
    #[prost(message, optional, tag = "1")]
    public_key: Option<Any>,
    #[prost(message, optional, tag = "2")]
    mode_info: Option<ModeInfo>,
    #[prost(uint64, tag = "3")]
    sequence: u64,
}

#[derive(Clone, PartialEq, Message)]
struct AuthInfo {
    #[prost(message, repeated, tag = "1")]
    signer_infos: Vec<SignerInfo>,
    #[prost(message, optional, tag = "2")]
    fee: Option<Fee>,
}

#[derive(Clone, PartialEq, Message)]
struct SignDoc {
    #[prost(bytes = "vec", tag = "1")]
    body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    auth_info_bytes: Vec<u8>,
    #[prost(string, tag = "3")]
    chain_id: String,
    #[prost(uint64, tag = "4")]
    account_number: u64,
}

#[derive(Clone, PartialEq, Message)]
struct TxRaw {
    #[prost(bytes = "vec", tag = "1")]
    body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    auth_info_bytes: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    signatures: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
struct PubKey {
    #[prost(bytes = "vec", tag = "1")]
    key: Vec<u8>,
}
