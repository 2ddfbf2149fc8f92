//! Address-list column encoding.
//!
//! Addresses are joined with `,` and nothing is escaped: an address that
//! itself contains a comma does not survive a round-trip. Changing that means
//! changing the on-disk format of existing caches.

pub fn encode_addresses(addrs: &[String]) -> String {
    addrs.join(",")
}

/// `""` decodes to an empty list, never to `[""]`.
pub fn decode_addresses(s: &str) -> Vec<String> {
    if s.is_empty() {
        return vec![];
    }
    s.split(',').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_plain_addresses() {
        let addrs = vec!["a@x.com".to_string(), "b@y.com".to_string()];
        let enc = encode_addresses(&addrs);
        assert_eq!(enc, "a@x.com,b@y.com");
        assert_eq!(decode_addresses(&enc), addrs);
    }

    #[test]
    fn empty_string_is_empty_list() {
        assert!(decode_addresses("").is_empty());
        assert_eq!(encode_addresses(&[]), "");
    }

    #[test]
    fn embedded_comma_splits() {
        let addrs = vec!["\"Doe, Jane\" <j@x.com>".to_string()];
        assert_eq!(decode_addresses(&encode_addresses(&addrs)).len(), 2);
    }
}
