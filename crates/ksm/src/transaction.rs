//! Signed interbank transactions.
//!
//! A transaction is signed over its canonical string:
//!
//! ```text
//! FROM:<from>|TO:<to>|AMOUNT:<amount, two decimals>|DESC:<description>|TIMESTAMP:<epoch millis>
//! ```
//!
//! The record keeps both the individual fields and the canonical string, so
//! a verifier can check that the two still agree before checking the
//! signature.

use serde::{Deserialize, Serialize};

use ksm_core::Algorithm;

/// Builds the canonical string that is signed for a transaction.
///
/// # Example
///
/// ```
/// use ksm::transaction::canonical_transaction;
///
/// let s = canonical_transaction("vietcombank", "vietinbank", 1_000_000.0, "transfer", 1_700_000_000_000);
/// assert_eq!(
///     s,
///     "FROM:vietcombank|TO:vietinbank|AMOUNT:1000000.00|DESC:transfer|TIMESTAMP:1700000000000"
/// );
/// ```
#[must_use]
pub fn canonical_transaction(
    from: &str,
    to: &str,
    amount: f64,
    description: &str,
    timestamp: i64,
) -> String {
    let amount = format_amount(amount);
    format!("FROM:{from}|TO:{to}|AMOUNT:{amount}|DESC:{description}|TIMESTAMP:{timestamp}")
}

/// Formats `amount` with two decimals, rounding half away from zero.
///
/// Rounding works on the shortest decimal form of the value, so `0.125`
/// becomes `0.13` and `1.005` becomes `1.01` even though neither is exactly
/// representable.
fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let shortest = amount.abs().to_string();
    let (int_part, frac_part) = shortest.split_once('.').unwrap_or((shortest.as_str(), ""));
    let mut frac = frac_part.bytes().chain(std::iter::repeat(b'0'));

    let mut digits: Vec<u8> = int_part.bytes().collect();
    digits.extend(frac.by_ref().take(2));

    if frac.next().is_some_and(|d| d >= b'5') {
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }

    // Negative values that round to zero print without a sign.
    let negative = amount < 0.0 && digits.iter().any(|&d| d != b'0');
    let (whole, cents) = digits.split_at(digits.len() - 2);

    let mut out = String::with_capacity(digits.len() + 2);
    if negative {
        out.push('-');
    }
    out.extend(whole.iter().map(|&d| char::from(d)));
    out.push('.');
    out.extend(cents.iter().map(|&d| char::from(d)));
    out
}

/// A transaction signed by the sender's entity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    /// Sending entity; its key signs the transaction.
    pub from: String,
    /// Receiving entity.
    pub to: String,
    /// Transfer amount.
    pub amount: f64,
    /// Free-form description.
    pub description: String,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
    /// The canonical string that was signed.
    #[serde(rename = "transactionData")]
    pub canonical: String,
    /// Signature over `canonical`, base64 on the wire.
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
    /// Signature variant.
    pub algorithm: Algorithm,
    /// Fingerprint of the sender's public key at signing time.
    pub signer_fingerprint: String,
}

impl SignedTransaction {
    /// Recomputes the canonical string from the individual fields.
    #[must_use]
    pub fn recompute_canonical(&self) -> String {
        canonical_transaction(
            &self.from,
            &self.to,
            self.amount,
            &self.description,
            self.timestamp,
        )
    }

    /// Whether the stored canonical string matches the fields.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.canonical == self.recompute_canonical()
    }
}

pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
