use crate::config::{SubmissionConfig, TimeFn};
use crate::domain::payment::{Amount, Payment};
use crate::domain::ports::LedgerClient;
use crate::domain::transaction::TransactionEnvelope;
use crate::domain::wallet::{Wallet, decode_address};
use crate::error::{PaymentError, Result};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sha2::{Digest, Sha256};
use stellar_xdr::curr as xdr;
use stellar_xdr::curr::{Limits, WriteXdr};
use tracing::debug;

/// Stroops per Pi.
const STROOPS_PER_UNIT: i64 = 10_000_000;
/// Maximum fractional digits a payment amount can carry.
const AMOUNT_SCALE: u32 = 7;
/// `ENVELOPE_TYPE_TX` discriminant in the signature payload.
const ENVELOPE_TYPE_TX: u32 = 2;
const MEMO_TEXT_MAX: usize = 28;

/// Builds and signs the ledger transaction for an app-to-user payment.
#[derive(Clone)]
pub struct TransactionBuilder {
    config: SubmissionConfig,
    time_fn: TimeFn,
}

impl TransactionBuilder {
    pub fn new(config: SubmissionConfig, time_fn: TimeFn) -> Self {
        Self { config, time_fn }
    }

    /// Builds a signed envelope paying `payment.amount` to `payment.to_address`.
    ///
    /// The only I/O is the sequence number lookup on `ledger`.
    pub async fn build(
        &self,
        ledger: &dyn LedgerClient,
        wallet: &Wallet,
        payment: &Payment,
    ) -> Result<TransactionEnvelope> {
        if payment.from_address != wallet.address() {
            return Err(PaymentError::WalletMismatch {
                expected: payment.from_address.clone(),
                actual: wallet.address().to_string(),
            });
        }

        let amount = payment.amount.ok_or_else(|| PaymentError::missing("amount"))?;
        let amount = Amount::new(amount)?;
        if payment.identifier.trim().is_empty() {
            return Err(PaymentError::missing("identifier"));
        }
        let recipient = payment
            .to_address
            .as_deref()
            .filter(|addr| !addr.trim().is_empty())
            .ok_or_else(|| PaymentError::missing("recipient"))?;

        let destination = decode_address("recipient", recipient)?;
        let stroops = to_stroops(amount)?;
        let memo = memo_text(&payment.identifier)?;

        let current = ledger.account_sequence(wallet.address()).await?;
        let sequence = current
            .checked_add(1)
            .ok_or_else(|| PaymentError::Ledger("Sequence number overflow".to_string()))?;

        let min_time = (self.time_fn)();
        let max_time = min_time + self.config.submission_timeout().as_secs();

        debug!(
            payment_id = %payment.identifier,
            recipient,
            stroops,
            sequence,
            min_time,
            max_time,
            "building payment transaction"
        );

        let operation = xdr::Operation {
            source_account: None,
            body: xdr::OperationBody::Payment(xdr::PaymentOp {
                destination: xdr::MuxedAccount::Ed25519(xdr::Uint256(destination)),
                asset: xdr::Asset::Native,
                amount: stroops,
            }),
        };
        let operations: xdr::VecM<xdr::Operation, 100> = vec![operation]
            .try_into()
            .map_err(|_| PaymentError::Encoding("Failed to create operations vector".to_string()))?;

        let transaction = xdr::Transaction {
            source_account: xdr::MuxedAccount::Ed25519(xdr::Uint256(wallet.public_key())),
            fee: self.config.base_fee,
            seq_num: xdr::SequenceNumber(sequence),
            cond: xdr::Preconditions::Time(xdr::TimeBounds {
                min_time: xdr::TimePoint(min_time),
                max_time: xdr::TimePoint(max_time),
            }),
            memo,
            operations,
            ext: xdr::TransactionExt::V0,
        };

        let hash = transaction_hash(&payment.network, &transaction)?;
        let signed_xdr = sign_envelope(wallet, &transaction, &hash)?;

        Ok(TransactionEnvelope {
            payment_id: payment.identifier.clone(),
            transaction,
            hash: hex::encode(hash),
            signed_xdr,
            min_time,
            max_time,
        })
    }
}

fn to_stroops(amount: Amount) -> Result<i64> {
    let value: Decimal = amount.into();
    if value.normalize().scale() > AMOUNT_SCALE {
        return Err(PaymentError::invalid(
            "amount",
            format!("Amount {value} has more than {AMOUNT_SCALE} decimal places"),
        ));
    }
    value
        .checked_mul(Decimal::from(STROOPS_PER_UNIT))
        .and_then(|stroops| stroops.to_i64())
        .ok_or_else(|| PaymentError::invalid("amount", format!("Amount {value} is out of range")))
}

fn memo_text(identifier: &str) -> Result<xdr::Memo> {
    if identifier.len() > MEMO_TEXT_MAX {
        return Err(PaymentError::invalid(
            "identifier",
            format!("Identifier is longer than {MEMO_TEXT_MAX} bytes"),
        ));
    }
    let text: xdr::StringM<28> = identifier
        .as_bytes()
        .to_vec()
        .try_into()
        .map_err(|_| PaymentError::Encoding("Failed to encode memo".to_string()))?;
    Ok(xdr::Memo::Text(text))
}

/// SHA-256 of `network_id || ENVELOPE_TYPE_TX || transaction`, where the
/// network id is the hash of the network passphrase.
fn transaction_hash(network: &str, transaction: &xdr::Transaction) -> Result<[u8; 32]> {
    let network_id = Sha256::digest(network.as_bytes());
    let tx_xdr = transaction
        .to_xdr(Limits::none())
        .map_err(|e| PaymentError::Encoding(format!("Failed to encode transaction: {e}")))?;

    let mut hasher = Sha256::new();
    hasher.update(network_id);
    hasher.update(ENVELOPE_TYPE_TX.to_be_bytes());
    hasher.update(&tx_xdr);
    Ok(hasher.finalize().into())
}

fn sign_envelope(wallet: &Wallet, transaction: &xdr::Transaction, hash: &[u8; 32]) -> Result<String> {
    let signature = xdr::DecoratedSignature {
        hint: xdr::SignatureHint(wallet.signature_hint()),
        signature: xdr::Signature(
            wallet
                .sign(hash)
                .to_vec()
                .try_into()
                .map_err(|_| PaymentError::Encoding("Invalid signature length".to_string()))?,
        ),
    };
    let signatures: xdr::VecM<xdr::DecoratedSignature, 20> = vec![signature]
        .try_into()
        .map_err(|_| PaymentError::Encoding("Failed to create signatures vector".to_string()))?;

    let envelope = xdr::TransactionEnvelope::Tx(xdr::TransactionV1Envelope {
        tx: transaction.clone(),
        signatures,
    });
    let bytes = envelope
        .to_xdr(Limits::none())
        .map_err(|e| PaymentError::Encoding(format!("Failed to encode envelope: {e}")))?;

    Ok(BASE64.encode(bytes))
}
