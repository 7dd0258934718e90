use core::{
    fmt::{self, Write},
    str::FromStr,
};

use thiserror::Error;

pub const MAC_LEN: usize = 6;
/// Length of a MAC address rendered as `XX:XX:XX:XX:XX:XX`
pub const MAC_STR_LEN: usize = MAC_LEN * 3 - 1;

/// The reserved all-ones address. Frames sent here reach every listening node.
pub const BROADCAST_ADDRESS: MacAddress = MacAddress([0xFF; MAC_LEN]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacParseError {
    #[error("Expected 6 octets, found {0}")]
    WrongOctetCount(usize),
    #[error("Octet {0} is not a two digit hex number")]
    InvalidOctet(usize),
}

/// Hardware address of a radio endpoint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; MAC_LEN]);
impl MacAddress {
    pub const fn new(bytes: [u8; MAC_LEN]) -> Self {
        return Self(bytes);
    }

    pub fn as_bytes(&self) -> &[u8; MAC_LEN] {
        return &self.0;
    }

    pub fn to_str(&self) -> heapless::String<MAC_STR_LEN> {
        return mac_to_str(&self.0);
    }
}

impl From<[u8; MAC_LEN]> for MacAddress {
    fn from(bytes: [u8; MAC_LEN]) -> Self {
        return Self(bytes);
    }
}

impl From<MacAddress> for [u8; MAC_LEN] {
    fn from(address: MacAddress) -> Self {
        return address.0;
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{octet:02X}")?;
        }
        return Ok(());
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "MacAddress({self})");
    }
}

/// Strict parser for `XX:XX:XX:XX:XX:XX`. Hex digits may be either case.
impl FromStr for MacAddress {
    type Err = MacParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; MAC_LEN];
        let mut count = 0;
        for (i, octet) in s.split(':').enumerate() {
            if i >= MAC_LEN {
                return Err(MacParseError::WrongOctetCount(s.split(':').count()));
            }
            if octet.len() != 2 || !octet.bytes().all(|c| c.is_ascii_hexdigit()) {
                return Err(MacParseError::InvalidOctet(i));
            }
            bytes[i] = u8::from_str_radix(octet, 16).map_err(|_| MacParseError::InvalidOctet(i))?;
            count += 1;
        }
        if count != MAC_LEN {
            return Err(MacParseError::WrongOctetCount(count));
        }
        return Ok(Self(bytes));
    }
}

/// Formats a MAC address as uppercase colon-separated hex pairs, e.g. `AA:BB:CC:DD:EE:FF`.
pub fn mac_to_str(bytes: &[u8; MAC_LEN]) -> heapless::String<MAC_STR_LEN> {
    let mut out = heapless::String::new();
    // Capacity is exact, the write cannot fail
    let _ = write!(out, "{}", MacAddress(*bytes));
    return out;
}

/// Lenient MAC parser.
///
/// Reads up to six hex octets separated by `separator` into `target` and returns
/// how many octets were written. Parsing stops as soon as the separators run out,
/// so the bytes past the returned count keep whatever they held before the call.
///
/// Each octet is read like `strtoul(.., 16)`: leading whitespace and an optional
/// `0x` prefix are skipped, then hex digits are consumed until the first non-digit.
/// A field with no digits yields 0 and values wider than a byte keep their low byte
/// (saturating first, like `ULONG_MAX`). Use [`MacAddress::from_str`] to reject
/// malformed input instead.
pub fn str_to_mac(source: &str, separator: char, target: &mut [u8; MAC_LEN]) -> usize {
    let mut rest = source;
    for i in 0..MAC_LEN {
        target[i] = parse_leading_hex(rest);
        match rest.find(separator) {
            Some(pos) => rest = &rest[pos + separator.len_utf8()..],
            None => return i + 1,
        }
    }
    return MAC_LEN;
}

fn parse_leading_hex(field: &str) -> u8 {
    let field = field.trim_start();
    let field = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    let value = field
        .chars()
        .map_while(|c| c.to_digit(16))
        .fold(0u64, |acc, digit| acc.saturating_mul(16).saturating_add(digit as u64));
    return value as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [[u8; MAC_LEN]; 4] = [
        [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF],
        [0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        [0x24, 0x6F, 0x28, 0x0A, 0x1B, 0x9C],
        [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
    ];

    #[test]
    fn formats_uppercase_pairs() {
        let text = mac_to_str(&[0x24, 0x6f, 0x28, 0x0a, 0x1b, 0x9c]);
        assert_eq!(text.as_str(), "24:6F:28:0A:1B:9C");
        assert_eq!(text.len(), MAC_STR_LEN);
        assert_eq!(text.chars().filter(|c| *c == ':').count(), 5);
        assert!(!text.chars().any(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn display_matches_mac_to_str() {
        for sample in SAMPLES {
            let address = MacAddress::new(sample);
            assert_eq!(std::format!("{address}").as_str(), address.to_str().as_str());
        }
    }

    #[test]
    fn lenient_parse_recovers_formatted_address() {
        for sample in SAMPLES {
            let mut buf = [0x55u8; MAC_LEN];
            assert_eq!(str_to_mac(&mac_to_str(&sample), ':', &mut buf), MAC_LEN);
            assert_eq!(buf, sample);
        }
    }

    #[test]
    fn lenient_parse_recovers_every_octet_value() {
        for position in 0..MAC_LEN {
            for value in 0..=u8::MAX {
                let mut address = [0x5Au8; MAC_LEN];
                address[position] = value;
                let text = mac_to_str(&address);
                let mut buf = [0u8; MAC_LEN];
                assert_eq!(str_to_mac(&text, ':', &mut buf), MAC_LEN, "{text}");
                assert_eq!(buf, address, "{text}");
                assert_eq!(text.parse::<MacAddress>(), Ok(MacAddress(address)));

                let lower = text.to_ascii_lowercase();
                let mut buf = [0u8; MAC_LEN];
                assert_eq!(str_to_mac(&lower, ':', &mut buf), MAC_LEN, "{lower}");
                assert_eq!(buf, address, "{lower}");
            }
        }
    }

    #[test]
    fn lenient_parse_leaves_tail_untouched_on_short_input() {
        let mut buf = [1, 2, 3, 4, 5, 6];
        assert_eq!(str_to_mac("AA:BB", ':', &mut buf), 2);
        assert_eq!(buf, [0xAA, 0xBB, 3, 4, 5, 6]);
    }

    #[test]
    fn lenient_parse_handles_custom_separator_and_case() {
        let mut buf = [0u8; MAC_LEN];
        assert_eq!(str_to_mac("aa-bb-cc-dd-ee-ff", '-', &mut buf), MAC_LEN);
        assert_eq!(buf, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn lenient_parse_mirrors_strtoul_quirks() {
        let mut buf = [9u8; MAC_LEN];
        // Empty and non-hex fields become zero, wide fields keep the low byte
        assert_eq!(str_to_mac(":zz:1FF:0x10: 7:ABCDEFABCDEFABCDEFAB", ':', &mut buf), MAC_LEN);
        assert_eq!(buf, [0x00, 0x00, 0xFF, 0x10, 0x07, 0xFF]);
    }

    #[test]
    fn lenient_parse_ignores_octets_past_six() {
        let mut buf = [0u8; MAC_LEN];
        assert_eq!(str_to_mac("1:2:3:4:5:6:7:8", ':', &mut buf), MAC_LEN);
        assert_eq!(buf, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn strict_parse_accepts_both_cases() {
        let upper: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        let lower: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_bytes(), &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn strict_parse_rejects_malformed_input() {
        assert_eq!(
            "AA:BB".parse::<MacAddress>(),
            Err(MacParseError::WrongOctetCount(2))
        );
        assert_eq!(
            "AA:BB:CC:DD:EE:FF:00".parse::<MacAddress>(),
            Err(MacParseError::WrongOctetCount(7))
        );
        assert_eq!(
            "AA:BB:CC:DD:EE:GG".parse::<MacAddress>(),
            Err(MacParseError::InvalidOctet(5))
        );
        assert_eq!(
            "AA:BB:C:DD:EE:FF".parse::<MacAddress>(),
            Err(MacParseError::InvalidOctet(2))
        );
    }

    #[test]
    fn broadcast_is_all_ones() {
        assert_eq!(BROADCAST_ADDRESS.to_str().as_str(), "FF:FF:FF:FF:FF:FF");
        assert_ne!(MacAddress::new(SAMPLES[0]), BROADCAST_ADDRESS);
    }
}
