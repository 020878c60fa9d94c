use stellar_xdr::curr as xdr;

/// A signed payment transaction, ready to be posted to the ledger.
///
/// Built once per submission cycle; every retry resubmits the same envelope so
/// the validity window never moves.
#[derive(Debug, Clone)]
pub struct TransactionEnvelope {
    /// Payment identifier carried in the text memo.
    pub payment_id: String,
    /// The unsigned transaction.
    pub transaction: xdr::Transaction,
    /// Hex-encoded transaction hash, which the ledger reports back as txid.
    pub hash: String,
    /// Base64 XDR of the signed `TransactionEnvelope`.
    pub signed_xdr: String,
    /// Earliest unix time the ledger may accept the transaction.
    pub min_time: u64,
    /// Latest unix time the ledger may accept the transaction.
    pub max_time: u64,
}

impl TransactionEnvelope {
    pub fn sequence(&self) -> i64 {
        self.transaction.seq_num.0
    }

    pub fn fee(&self) -> u32 {
        self.transaction.fee
    }

    /// True once `now` is past the validity window.
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.max_time
    }
}
