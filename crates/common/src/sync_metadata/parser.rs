use super::{types, Context, MatchPolicy, RecipientEntry, SyncMetadata};
use crate::crypto::{Iv, IV_SIZE};
use crate::fetch::{Access, FetchRequest};
use crate::keystore::{unwrap_key, KeyStore};
use crate::tlv::{DecodeError, Decoder};

/// A recipient entry borrowed from the input buffer
struct Entry<'a> {
    recipient: &'a str,
    wrapped_key: &'a [u8],
    iv: Option<Iv>,
}

/// Parse a sync metadata record on behalf of `ctx.identity`.
///
/// Finds the file name and the first recipient entry addressed to the
/// identity, then unwraps that entry's key through the key store. How much
/// of the rest of the record is validated depends on `ctx.policy`.
///
/// An identity with no entry gets a request with
/// [`Access::NotAuthorized`], not an error.
///
/// # Errors
///
/// * `DecodeError::SchemaMismatch` - the buffer is not a sync metadata record
/// * `DecodeError::MissingField` - no name, or an entry without id or key
/// * `DecodeError::KeyUnwrapFailed` - our entry was found but its key
///   could not be recovered
/// * any other `DecodeError` for malformed input
pub fn parse<K>(input: &[u8], ctx: &Context<'_, K>) -> Result<FetchRequest, DecodeError>
where
    K: KeyStore + ?Sized,
{
    let mut decoder = Decoder::new(input);
    let boundary = open_metadata(&mut decoder)?;
    let stop_early = ctx.policy == MatchPolicy::MatchAndStop;

    let mut name = None;
    let mut matched: Option<Entry<'_>> = None;

    while let Some(typ) = decoder.try_next_type(boundary)? {
        match typ {
            types::NAME => name = Some(read_utf8(&mut decoder, types::NAME)?),
            types::RECIPIENT_ENTRY if stop_early && matched.is_some() => {
                decoder.skip(types::RECIPIENT_ENTRY)?
            }
            types::RECIPIENT_ENTRY => {
                let entry = read_entry(&mut decoder)?;
                if matched.is_none() && entry.recipient == ctx.identity.name {
                    matched = Some(entry);
                }
            }
            actual => return Err(unrecognized(&decoder, actual)),
        }

        if stop_early && name.is_some() && matched.is_some() {
            decoder.skip_to_boundary(boundary)?;
        }
    }
    decoder.finish_nested(boundary)?;

    let name = name.ok_or(DecodeError::MissingField(types::NAME))?;
    let Some(entry) = matched else {
        tracing::debug!("{:?} has no entry for {:?}", name, ctx.identity.name);
        return Ok(FetchRequest::not_authorized(name));
    };

    let key = unwrap_key(entry.wrapped_key, &ctx.identity.key_name, ctx.key_store)?;
    tracing::debug!("recovered key for {:?} as {:?}", name, ctx.identity.name);
    Ok(FetchRequest::new(name, Access::Granted(key), entry.iv))
}

pub(super) fn decode_all(input: &[u8]) -> Result<SyncMetadata, DecodeError> {
    let mut decoder = Decoder::new(input);
    let boundary = open_metadata(&mut decoder)?;

    let mut name = None;
    let mut recipients = Vec::new();

    while let Some(typ) = decoder.try_next_type(boundary)? {
        match typ {
            types::NAME => name = Some(read_utf8(&mut decoder, types::NAME)?),
            types::RECIPIENT_ENTRY => {
                let entry = read_entry(&mut decoder)?;
                recipients.push(RecipientEntry {
                    recipient: entry.recipient.to_string(),
                    wrapped_key: entry.wrapped_key.to_vec(),
                    iv: entry.iv,
                });
            }
            actual => return Err(unrecognized(&decoder, actual)),
        }
    }
    decoder.finish_nested(boundary)?;

    Ok(SyncMetadata {
        name: name
            .ok_or(DecodeError::MissingField(types::NAME))?
            .to_string(),
        recipients,
    })
}

/// Open the outer record, reporting anything else as a schema mismatch
fn open_metadata(decoder: &mut Decoder<'_>) -> Result<usize, DecodeError> {
    match decoder.try_next_type(decoder.len())? {
        Some(actual) if actual != types::SYNC_METADATA => Err(DecodeError::SchemaMismatch {
            expected: types::SYNC_METADATA,
            actual,
        }),
        _ => decoder.read_nested_start(types::SYNC_METADATA),
    }
}

fn read_entry<'a>(decoder: &mut Decoder<'a>) -> Result<Entry<'a>, DecodeError> {
    let boundary = decoder.read_nested_start(types::RECIPIENT_ENTRY)?;

    let mut recipient = None;
    let mut wrapped_key = None;
    let mut iv = None;

    while let Some(typ) = decoder.try_next_type(boundary)? {
        match typ {
            types::RECIPIENT_ID => recipient = Some(read_utf8(decoder, types::RECIPIENT_ID)?),
            types::WRAPPED_KEY => wrapped_key = Some(decoder.read_blob(types::WRAPPED_KEY)?),
            types::IV => {
                let bytes = decoder.read_blob(types::IV)?;
                let parsed = Iv::from_slice(bytes).map_err(|_| DecodeError::InvalidLength {
                    typ: types::IV,
                    expected: IV_SIZE,
                    actual: bytes.len(),
                })?;
                iv = Some(parsed);
            }
            actual => return Err(unrecognized(decoder, actual)),
        }
    }
    decoder.finish_nested(boundary)?;

    Ok(Entry {
        recipient: recipient.ok_or(DecodeError::MissingField(types::RECIPIENT_ID))?,
        wrapped_key: wrapped_key.ok_or(DecodeError::MissingField(types::WRAPPED_KEY))?,
        iv,
    })
}

fn read_utf8<'a>(decoder: &mut Decoder<'a>, typ: u64) -> Result<&'a str, DecodeError> {
    let bytes = decoder.read_blob(typ)?;
    std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8(typ))
}

fn unrecognized(decoder: &Decoder<'_>, actual: u64) -> DecodeError {
    DecodeError::UnrecognizedType {
        actual,
        offset: decoder.offset(),
    }
}
