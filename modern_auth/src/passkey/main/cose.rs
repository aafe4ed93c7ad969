use ciborium::value::{Integer, Value as CborValue};

use crate::passkey::errors::PasskeyError;

// COSE key map labels
const LABEL_KTY: i64 = 1;
const LABEL_ALG: i64 = 3;
const LABEL_CRV: i64 = -1;
const LABEL_X: i64 = -2;
const LABEL_Y: i64 = -3;

const KTY_EC2: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    /// Coordinate length in bytes.
    pub fn field_len(&self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }
}

/// EC2 public key decoded from its COSE encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct CosePublicKey {
    pub alg: i64,
    pub curve: EcCurve,
    pub x: Vec<u8>,
    pub y: Vec<u8>,
}

pub(crate) fn integer_to_i64(i: Integer) -> Option<i64> {
    i64::try_from(i128::from(i)).ok()
}

pub fn decode_cose_key(bytes: &[u8]) -> Result<CosePublicKey, PasskeyError> {
    let value: CborValue = ciborium::de::from_reader(bytes)
        .map_err(|e| PasskeyError::Decode(format!("Invalid COSE key CBOR: {e}")))?;
    cose_key_from_value(&value)
}

fn cose_key_from_value(value: &CborValue) -> Result<CosePublicKey, PasskeyError> {
    let CborValue::Map(map) = value else {
        return Err(PasskeyError::Decode("COSE key is not a map".to_string()));
    };

    let mut kty = None;
    let mut alg = None;
    let mut crv = None;
    let mut x = None;
    let mut y = None;

    for (k, v) in map {
        let Some(label) = k.as_integer().and_then(integer_to_i64) else {
            continue;
        };
        match (label, v) {
            (LABEL_KTY, CborValue::Integer(i)) => kty = integer_to_i64(*i),
            (LABEL_ALG, CborValue::Integer(i)) => alg = integer_to_i64(*i),
            (LABEL_CRV, CborValue::Integer(i)) => crv = integer_to_i64(*i),
            (LABEL_X, CborValue::Bytes(b)) => x = Some(b.clone()),
            (LABEL_Y, CborValue::Bytes(b)) => y = Some(b.clone()),
            _ => {}
        }
    }

    let kty = kty.ok_or_else(|| PasskeyError::Decode("COSE key missing kty".to_string()))?;
    if kty != KTY_EC2 {
        tracing::error!("Unsupported COSE key type: {}", kty);
        return Err(PasskeyError::UnsupportedKeyType(kty));
    }

    let curve = match crv {
        Some(1) => EcCurve::P256,
        Some(2) => EcCurve::P384,
        Some(3) => EcCurve::P521,
        other => {
            tracing::warn!("Unknown COSE curve {:?}, assuming P-256", other);
            EcCurve::P256
        }
    };

    let alg = alg.ok_or_else(|| PasskeyError::Decode("COSE key missing alg".to_string()))?;
    let x = x.ok_or_else(|| PasskeyError::Decode("COSE key missing x".to_string()))?;
    let y = y.ok_or_else(|| PasskeyError::Decode("COSE key missing y".to_string()))?;

    Ok(CosePublicKey { alg, curve, x, y })
}
