//! Header normalization.

use std::collections::BTreeMap;

/// Header name → value, ordered by name.
pub type HeaderMap = BTreeMap<String, String>;

/// Collapse ordered header pairs into a mapping.
///
/// Repeated names are last-write-wins: the later pair overwrites the earlier
/// value, so earlier values of a repeated header are lost.
pub fn normalize<I>(pairs: I) -> HeaderMap
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(name, value);
    }
    map
}

/// Compact JSON text for a header mapping.
pub fn to_json(headers: &HeaderMap) -> Result<String, serde_json::Error> {
    serde_json::to_string(headers)
}
