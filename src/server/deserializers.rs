use serde::{Deserialize, Deserializer};

// `?page=abc` falls back to the first page instead of rejecting the request,
// while a number too large for i64 is still a page past the end
pub fn deserialize_lenient_page<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|v| parse_page(v.trim())))
}

fn parse_page(value: &str) -> Option<i64> {
    if let Ok(page) = value.parse::<i64>() {
        return Some(page);
    }
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

// only an empty search term counts as absent, whitespace is searched as is
pub fn deserialize_search_term<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()))
}
