use ciborium::value::Value as CborValue;

use crate::passkey::errors::PasskeyError;

/// Authenticator data flag bits
pub(crate) mod flags {
    pub(crate) const UP: u8 = 1 << 0;
    pub(crate) const UV: u8 = 1 << 2;
    pub(crate) const BE: u8 = 1 << 3;
    pub(crate) const BS: u8 = 1 << 4;
    pub(crate) const AT: u8 = 1 << 6;
    pub(crate) const ED: u8 = 1 << 7;
}

const RP_ID_HASH_LEN: usize = 32;
const FIXED_LEN: usize = RP_ID_HASH_LEN + 1 + 4;
const AAGUID_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AttestedCredentialData {
    pub(crate) aaguid: [u8; AAGUID_LEN],
    pub(crate) credential_id: Vec<u8>,
    /// COSE encoded public key, exactly as it appeared
    pub(crate) public_key: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AuthenticatorData {
    pub(crate) rp_id_hash: [u8; RP_ID_HASH_LEN],
    pub(crate) flags: u8,
    pub(crate) sign_count: u32,
    pub(crate) attested_credential: Option<AttestedCredentialData>,
    pub(crate) extensions: Option<Vec<u8>>,
    pub(crate) raw: Vec<u8>,
}

impl AuthenticatorData {
    /// Parse the binary layout
    /// `rpIdHash(32) | flags(1) | signCount(4) | [attested credential data] | [extensions]`.
    pub(crate) fn parse(data: &[u8]) -> Result<Self, PasskeyError> {
        if data.len() < FIXED_LEN {
            return Err(PasskeyError::Decode(format!(
                "Authenticator data too short: {} bytes",
                data.len()
            )));
        }

        let mut rp_id_hash = [0u8; RP_ID_HASH_LEN];
        rp_id_hash.copy_from_slice(&data[..RP_ID_HASH_LEN]);
        let flags = data[RP_ID_HASH_LEN];
        let sign_count = u32::from_be_bytes([data[33], data[34], data[35], data[36]]);

        let mut parsed = Self {
            rp_id_hash,
            flags,
            sign_count,
            attested_credential: None,
            extensions: None,
            raw: data.to_vec(),
        };

        // Assertion case: nothing follows the counter
        if data.len() == FIXED_LEN {
            if parsed.has_flag(flags::AT) {
                return Err(PasskeyError::Decode(
                    "AT flag set but attested credential data is missing".to_string(),
                ));
            }
            if parsed.has_flag(flags::ED) {
                return Err(PasskeyError::Decode(
                    "ED flag set but extension data is missing".to_string(),
                ));
            }
            return Ok(parsed);
        }

        let mut rest = &data[FIXED_LEN..];

        if parsed.has_flag(flags::AT) {
            let (attested, remaining) = parse_attested_credential(rest)?;
            parsed.attested_credential = Some(attested);
            rest = remaining;
        }

        if parsed.has_flag(flags::ED) {
            if rest.is_empty() {
                return Err(PasskeyError::Decode(
                    "ED flag set but extension data is missing".to_string(),
                ));
            }
            parsed.extensions = Some(rest.to_vec());
        } else if !rest.is_empty() {
            return Err(PasskeyError::Decode(format!(
                "{} trailing bytes in authenticator data",
                rest.len()
            )));
        }

        tracing::debug!(
            "Authenticator data: flags={:#04x}, sign_count={}, attested={}",
            parsed.flags,
            parsed.sign_count,
            parsed.attested_credential.is_some()
        );

        Ok(parsed)
    }

    pub(crate) fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    pub(crate) fn is_user_present(&self) -> bool {
        self.has_flag(flags::UP)
    }

    pub(crate) fn is_user_verified(&self) -> bool {
        self.has_flag(flags::UV)
    }

    pub(crate) fn is_backup_eligible(&self) -> bool {
        self.has_flag(flags::BE)
    }

    pub(crate) fn is_backed_up(&self) -> bool {
        self.has_flag(flags::BS)
    }
}

fn parse_attested_credential(data: &[u8]) -> Result<(AttestedCredentialData, &[u8]), PasskeyError> {
    if data.len() < AAGUID_LEN + 2 {
        return Err(PasskeyError::Decode(
            "Attested credential data too short".to_string(),
        ));
    }

    let mut aaguid = [0u8; AAGUID_LEN];
    aaguid.copy_from_slice(&data[..AAGUID_LEN]);

    let id_len = u16::from_be_bytes([data[AAGUID_LEN], data[AAGUID_LEN + 1]]) as usize;
    let id_start = AAGUID_LEN + 2;
    let id_end = id_start + id_len;
    if id_len == 0 || data.len() < id_end {
        return Err(PasskeyError::Decode(format!(
            "Invalid credential id length: {id_len}"
        )));
    }
    let credential_id = data[id_start..id_end].to_vec();

    // The key has no length prefix; its end is wherever the CBOR item ends
    let key_bytes = &data[id_end..];
    let mut reader = key_bytes;
    let _: CborValue = ciborium::de::from_reader(&mut reader)
        .map_err(|e| PasskeyError::Decode(format!("Invalid credential public key: {e}")))?;
    let consumed = key_bytes.len() - reader.len();

    Ok((
        AttestedCredentialData {
            aaguid,
            credential_id,
            public_key: key_bytes[..consumed].to_vec(),
        },
        reader,
    ))
}

/// Render an AAGUID in the usual 8-4-4-4-12 form.
pub(crate) fn format_aaguid(aaguid: &[u8; AAGUID_LEN]) -> String {
    let hex: String = aaguid.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
