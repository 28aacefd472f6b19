use crate::error::ScanError;

const FIELD_SEPARATOR: char = ';';
const KEY_SEPARATOR: char = ':';
const MATRICULE_KEY: &str = "matricule";

/// Pull the `matricule` value out of a `key:value;key:value` badge payload.
///
/// The first segment that starts with `matricule:` (leading whitespace and
/// case ignored) wins. Everything after its first `:` is the value, trimmed.
pub fn extract_matricule(raw: &str) -> Result<String, ScanError> {
    let value = raw
        .split(FIELD_SEPARATOR)
        .find_map(|segment| {
            let (key, value) = segment.trim_start().split_once(KEY_SEPARATOR)?;
            key.eq_ignore_ascii_case(MATRICULE_KEY).then_some(value)
        })
        .ok_or(ScanError::InvalidPayload)?;

    let value = value.trim();
    if value.is_empty() {
        return Err(ScanError::EmptyIdentity);
    }

    Ok(value.to_string())
}
