use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Deterministic fingerprint of a parameter set
///
/// Keys are sorted lexicographically and joined as `k=v` pairs with `|`
/// before hashing with SHA-256, so the result does not depend on the order
/// the parameters were supplied in. `None` values hash as empty strings.
pub fn hash_key<K, V, I>(parts: I) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
    I: IntoIterator<Item = (K, Option<V>)>,
{
    let mut pairs: Vec<(String, String)> = parts
        .into_iter()
        .map(|(k, v)| {
            let value = match v {
                Some(v) => v.as_ref().to_owned(),
                None => String::new(),
            };
            (k.as_ref().to_owned(), value)
        })
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let normalized = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("|");

    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// SHA-1 hex digest used for stable record identifiers
pub fn record_id(input: &str) -> String {
    hex::encode(Sha1::digest(input.as_bytes()))
}

/// Cache key builder
///
/// Every key is `{dataset}:{hash_key(params)}`.
pub struct CacheKey;

impl CacheKey {
    pub fn snap(bbox: &str, types: Option<&str>, limit: u32) -> String {
        let limit = limit.to_string();
        format!(
            "snap:{}",
            hash_key([
                ("bbox", Some(bbox)),
                ("types", types),
                ("limit", Some(limit.as_str())),
            ])
        )
    }

    pub fn counselors(lat: f64, lon: f64, radius: u32) -> String {
        format!(
            "hud:hc:{}",
            hash_key([
                ("lat", Some(lat.to_string())),
                ("lon", Some(lon.to_string())),
                ("radius", Some(radius.to_string())),
            ])
        )
    }

    pub fn fmr(fips: &str, year: i32) -> String {
        format!(
            "hud:fmr:{}",
            hash_key([("fips", Some(fips.to_string())), ("year", Some(year.to_string()))])
        )
    }

    pub fn laus(county_fips: &str, start: i32, end: i32) -> String {
        format!(
            "laus:{}",
            hash_key([
                ("countyFips", Some(county_fips.to_string())),
                ("start", Some(start.to_string())),
                ("end", Some(end.to_string())),
            ])
        )
    }

    pub fn geocode(query: &str) -> String {
        let normalized = query.trim().to_lowercase();
        format!("geocode:{}", hash_key([("q", Some(normalized))]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_key_order_independent() {
        let a = hash_key([("a", Some("1")), ("b", Some("2"))]);
        let b = hash_key([("b", Some("2")), ("a", Some("1"))]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hash_key_matches_sha256_of_normalized_form() {
        let expected = hex::encode(Sha256::digest(b"a=1|b="));
        assert_eq!(hash_key([("b", None), ("a", Some("1"))]), expected);
    }

    #[test]
    fn test_hash_key_value_sensitive() {
        let a = hash_key([("a", Some("1"))]);
        let b = hash_key([("a", Some("2"))]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_id_is_sha1_hex() {
        // Well-known SHA-1 of "abc"
        assert_eq!(record_id("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_cache_key_namespaces() {
        assert!(CacheKey::snap("-1,-1,1,1", None, 300).starts_with("snap:"));
        assert!(CacheKey::counselors(32.5, -90.1, 30).starts_with("hud:hc:"));
        assert!(CacheKey::fmr("28163", 2025).starts_with("hud:fmr:"));
        assert!(CacheKey::laus("28163", 2020, 2025).starts_with("laus:"));
        assert_eq!(CacheKey::geocode(" Yazoo City "), CacheKey::geocode("yazoo city"));
    }
}
