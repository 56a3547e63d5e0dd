// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Decoding of signed Wormhole VAAs and token bridge transfer payloads.
//!
//! Signatures are carried along untouched, they are verified on chain by the
//! token bridge when the transfer is completed.

use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use router_relayer_utils::{Error, Result};

/// Size of one guardian signature entry: index byte + 65 bytes signature.
const SIGNATURE_LEN: usize = 66;

/// Token bridge payload id of a plain transfer.
pub const PAYLOAD_TRANSFER: u8 = 1;
/// Token bridge payload id of a transfer carrying an extra payload.
pub const PAYLOAD_TRANSFER_WITH_PAYLOAD: u8 = 3;

/// A guardian signature, kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianSignature {
    /// Index of the guardian in the guardian set.
    pub guardian_index: u8,
    /// Recoverable secp256k1 signature.
    pub signature: [u8; 65],
}

/// A decoded signed VAA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedVaa {
    /// VAA format version.
    pub version: u8,
    /// Guardian set that signed the body.
    pub guardian_set_index: u32,
    /// Guardian signatures over the body digest.
    pub signatures: Vec<GuardianSignature>,
    /// Observation time, seconds since the epoch.
    pub timestamp: u32,
    /// Emitter chosen nonce.
    pub nonce: u32,
    /// Wormhole chain id of the emitter.
    pub emitter_chain: u16,
    /// Emitter contract, left padded to 32 bytes.
    pub emitter_address: H256,
    /// Emitter sequence number.
    pub sequence: u64,
    /// Finality the guardians waited for.
    pub consistency_level: u8,
    /// Application payload.
    pub payload: Vec<u8>,
    body: Vec<u8>,
}

/// Token bridge transfer carried by a VAA payload.
///
/// `amount` and `fee` are truncated to at most 8 decimals by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    /// Token bridge payload id, 1 or 3.
    pub payload_id: u8,
    /// Transferred amount, at most 8 decimals.
    pub amount: U256,
    /// Token address on its origin chain, left padded to 32 bytes.
    pub token_address: H256,
    /// Wormhole chain id the token is native to.
    pub token_chain: u16,
    /// Recipient, left padded to 32 bytes.
    pub to: H256,
    /// Wormhole chain id the transfer targets.
    pub to_chain: u16,
    /// Relayer fee, only present on plain transfers.
    pub fee: Option<U256>,
    /// Sender, only present on transfers with payload.
    pub from_address: Option<H256>,
    /// Payload of a transfer with payload, empty otherwise.
    pub extra_payload: Vec<u8>,
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.buf.len());
        let Some(end) = end else {
            return Err(Error::InvalidVaa(format!(
                "unexpected end of input while reading {what}"
            )));
        };
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.array::<1>(what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        Ok(u16::from_be_bytes(self.array(what)?))
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array(what)?))
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        Ok(u64::from_be_bytes(self.array(what)?))
    }

    fn h256(&mut self, what: &str) -> Result<H256> {
        Ok(H256(self.array(what)?))
    }

    fn u256(&mut self, what: &str) -> Result<U256> {
        Ok(U256::from_big_endian(self.take(32, what)?))
    }

    fn rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }
}

impl SignedVaa {
    /// Decodes a `0x` prefixed (or bare) hex encoded signed VAA.
    pub fn from_hex(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let bytes = hex::decode(raw.strip_prefix("0x").unwrap_or(raw))
            .map_err(|e| Error::InvalidVaa(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// Decodes the VAA wire format.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let version = r.u8("version")?;
        if version != 1 {
            return Err(Error::InvalidVaa(format!(
                "unsupported version {version}"
            )));
        }
        let guardian_set_index = r.u32("guardian set index")?;
        let count = r.u8("signature count")? as usize;
        let mut signatures = Vec::with_capacity(count);
        for _ in 0..count {
            let entry = r.take(SIGNATURE_LEN, "signature")?;
            let mut signature = [0u8; 65];
            signature.copy_from_slice(&entry[1..]);
            signatures.push(GuardianSignature {
                guardian_index: entry[0],
                signature,
            });
        }

        let body = r.rest().to_vec();
        let mut b = Reader::new(&body);
        let timestamp = b.u32("timestamp")?;
        let nonce = b.u32("nonce")?;
        let emitter_chain = b.u16("emitter chain")?;
        let emitter_address = b.h256("emitter address")?;
        let sequence = b.u64("sequence")?;
        let consistency_level = b.u8("consistency level")?;
        let payload = b.rest().to_vec();

        Ok(Self {
            version,
            guardian_set_index,
            signatures,
            timestamp,
            nonce,
            emitter_chain,
            emitter_address,
            sequence,
            consistency_level,
            payload,
            body,
        })
    }

    /// The digest the token bridge keys completed transfers by,
    /// `keccak256(keccak256(body))`.
    pub fn digest(&self) -> H256 {
        H256(keccak256(keccak256(&self.body)))
    }

    /// Decodes the payload as a token bridge transfer.
    pub fn token_transfer(&self) -> Result<TokenTransfer> {
        TokenTransfer::decode(&self.payload)
    }
}

impl TokenTransfer {
    /// Decodes a token bridge transfer payload (ids 1 and 3).
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = Reader::new(payload);
        let payload_id = r.u8("payload id")?;
        if payload_id != PAYLOAD_TRANSFER
            && payload_id != PAYLOAD_TRANSFER_WITH_PAYLOAD
        {
            return Err(Error::InvalidVaa(format!(
                "not a token transfer, payload id {payload_id}"
            )));
        }
        let amount = r.u256("amount")?;
        let token_address = r.h256("token address")?;
        let token_chain = r.u16("token chain")?;
        let to = r.h256("recipient")?;
        let to_chain = r.u16("recipient chain")?;
        let (fee, from_address) = if payload_id == PAYLOAD_TRANSFER {
            (Some(r.u256("fee")?), None)
        } else {
            (None, Some(r.h256("sender")?))
        };
        let extra_payload = r.rest().to_vec();
        Ok(Self {
            payload_id,
            amount,
            token_address,
            token_chain,
            to,
            to_chain,
            fee,
            from_address,
            extra_payload,
        })
    }

    /// Origin token as a 20 bytes address (the last 20 bytes of the
    /// padded wormhole address).
    pub fn origin_asset(&self) -> Address {
        Address::from_slice(&self.token_address.as_bytes()[12..])
    }

    /// Recipient as a 20 bytes EVM address.
    pub fn recipient(&self) -> Address {
        Address::from_slice(&self.to.as_bytes()[12..])
    }
}

/// Test helpers building VAAs byte by byte.
#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn transfer_payload(amount: u64, to_chain: u16) -> Vec<u8> {
        let mut p = vec![PAYLOAD_TRANSFER];
        let mut word = [0u8; 32];
        U256::from(amount).to_big_endian(&mut word);
        p.extend_from_slice(&word);
        let mut token = [0u8; 32];
        token[12..].copy_from_slice(
            &hex::decode("337610d27c682e347c9cd60bd4b3b107c9d34ddd").unwrap(),
        );
        p.extend_from_slice(&token);
        p.extend_from_slice(&4u16.to_be_bytes());
        let mut to = [0u8; 32];
        to[31] = 0x42;
        p.extend_from_slice(&to);
        p.extend_from_slice(&to_chain.to_be_bytes());
        p.extend_from_slice(&[0u8; 32]);
        p
    }

    pub(crate) fn signed_vaa(payload: &[u8]) -> Vec<u8> {
        let mut v = vec![1u8];
        v.extend_from_slice(&3u32.to_be_bytes());
        v.push(1);
        v.push(0);
        v.extend_from_slice(&[7u8; 65]);
        v.extend_from_slice(&1_700_000_000u32.to_be_bytes());
        v.extend_from_slice(&0u32.to_be_bytes());
        v.extend_from_slice(&4u16.to_be_bytes());
        v.extend_from_slice(&[9u8; 32]);
        v.extend_from_slice(&42u64.to_be_bytes());
        v.push(15);
        v.extend_from_slice(payload);
        v
    }

    #[test]
    fn decodes_token_transfer_vaa() {
        let bytes = signed_vaa(&transfer_payload(10_000_000, 11));
        let vaa =
            SignedVaa::from_hex(&format!("0x{}", hex::encode(&bytes))).unwrap();
        assert_eq!(vaa.guardian_set_index, 3);
        assert_eq!(vaa.signatures.len(), 1);
        assert_eq!(vaa.emitter_chain, 4);
        assert_eq!(vaa.sequence, 42);
        assert_eq!(vaa.consistency_level, 15);

        let transfer = vaa.token_transfer().unwrap();
        assert_eq!(transfer.amount, U256::from(10_000_000u64));
        assert_eq!(transfer.to_chain, 11);
        assert_eq!(transfer.token_chain, 4);
        assert_eq!(
            format!("{:?}", transfer.origin_asset()),
            "0x337610d27c682e347c9cd60bd4b3b107c9d34ddd"
        );
        assert_eq!(transfer.fee, Some(U256::zero()));
    }

    #[test]
    fn digest_is_double_keccak_of_body() {
        let bytes = signed_vaa(&transfer_payload(1, 11));
        let vaa = SignedVaa::decode(&bytes).unwrap();
        // header is 1 + 4 + 1 + 66 bytes
        let body = &bytes[72..];
        assert_eq!(vaa.digest(), H256(keccak256(keccak256(body))));
    }

    #[test]
    fn rejects_truncated_input() {
        let bytes = signed_vaa(&transfer_payload(1, 11));
        let err = SignedVaa::decode(&bytes[..40]).unwrap_err();
        assert!(matches!(err, Error::InvalidVaa(_)));

        let vaa = SignedVaa::decode(&bytes[..bytes.len() - 40]).unwrap();
        assert!(vaa.token_transfer().is_err());
    }

    #[test]
    fn rejects_non_transfer_payload() {
        let mut payload = transfer_payload(1, 11);
        payload[0] = 2;
        let vaa = SignedVaa::decode(&signed_vaa(&payload)).unwrap();
        let err = vaa.token_transfer().unwrap_err();
        assert!(err.to_string().contains("payload id 2"));
    }
}
