use ciborium::value::Value as CborValue;

use crate::passkey::errors::PasskeyError;
use crate::passkey::main::cose::{CosePublicKey, integer_to_i64};
use crate::passkey::main::signature::{signature_base, verify_signature};

fn get_sig_from_stmt(att_stmt: &[(CborValue, CborValue)]) -> Result<(i64, Vec<u8>), PasskeyError> {
    let mut alg: Option<i64> = None;
    let mut sig: Option<Vec<u8>> = None;

    for (key, value) in att_stmt {
        match (key, value) {
            (CborValue::Text(k), CborValue::Integer(a)) if k == "alg" => alg = integer_to_i64(*a),
            (CborValue::Text(k), CborValue::Bytes(s)) if k == "sig" => sig = Some(s.clone()),
            _ => {}
        }
    }

    match (alg, sig) {
        (Some(a), Some(s)) => Ok((a, s)),
        _ => Err(PasskeyError::Decode(
            "Missing algorithm or signature in attestation statement".to_string(),
        )),
    }
}

/// Verifies a packed attestation statement.
///
/// Only self attestation is accepted: the statement must be signed by the credential key
/// it introduces, with the same algorithm. A certificate chain (`x5c`) always fails.
pub(super) fn verify_packed_attestation(
    auth_data: &[u8],
    client_data_raw: &[u8],
    att_stmt: &[(CborValue, CborValue)],
    credential_key: &CosePublicKey,
) -> Result<(), PasskeyError> {
    let (alg, sig) = get_sig_from_stmt(att_stmt)?;

    let has_x5c = att_stmt
        .iter()
        .any(|(k, _)| matches!(k, CborValue::Text(k) if k == "x5c"));
    let has_ecdaa = att_stmt
        .iter()
        .any(|(k, _)| matches!(k, CborValue::Text(k) if k == "ecdaaKeyId"));

    match (has_x5c, has_ecdaa) {
        (false, false) => {
            tracing::debug!("Self attestation");
        }
        (true, false) => {
            tracing::error!("Packed attestation with certificate chain is not supported");
            return Err(PasskeyError::CertificateChainUnsupported);
        }
        (false, true) => {
            return Err(PasskeyError::UnsupportedAttestation(
                "ECDAA attestation not supported".to_string(),
            ));
        }
        (true, true) => {
            return Err(PasskeyError::Decode(
                "Invalid attestation: both x5c and ecdaaKeyId present".to_string(),
            ));
        }
    }

    if alg != credential_key.alg {
        tracing::error!(
            "Attestation alg {} does not match credential key alg {}",
            alg,
            credential_key.alg
        );
        return Err(PasskeyError::UnsupportedAlgorithm(alg));
    }

    let signed = signature_base(auth_data, client_data_raw);
    if !verify_signature(credential_key, &sig, &signed) {
        tracing::error!("Attestation signature invalid");
        return Err(PasskeyError::InvalidSignature);
    }

    Ok(())
}
