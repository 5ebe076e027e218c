//! CIDR parsing that keeps the caller's host address
//!
//! The usual CIDR reading of `10.32.0.5/12` is "the /12 network containing
//! 10.32.0.5". Here the caller is assigning that exact address inside a
//! container, so parsing must preserve `10.32.0.5` rather than normalize it
//! to the network base `10.32.0.0`.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnetwork::IpNetwork;

use crate::error::NetworkError;

/// A specific host address paired with its subnet mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRange(IpNetwork);

impl AddressRange {
    /// The host address exactly as supplied, not masked down.
    pub fn addr(&self) -> IpAddr {
        self.0.ip()
    }

    pub fn prefix(&self) -> u8 {
        self.0.prefix()
    }
}

impl FromStr for AddressRange {
    type Err = NetworkError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let network = IpNetwork::from_str(text).map_err(|e| NetworkError::InvalidCidr {
            text: text.to_string(),
            reason: e.to_string(),
        })?;
        Ok(AddressRange(network))
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0.ip(), self.0.prefix())
    }
}

/// Parses each text into an [`AddressRange`], in input order.
///
/// All-or-nothing: the first malformed text aborts the whole parse, naming
/// the offending input, and no partial list is returned.
pub fn parse_ranges<S: AsRef<str>>(texts: &[S]) -> Result<Vec<AddressRange>, NetworkError> {
    texts
        .iter()
        .map(|text| text.as_ref().parse())
        .collect()
}

/// Parses one whitespace-joined field of CIDR strings.
///
/// Used by hosts rewriting, where all ranges arrive in a single argument
/// slot. An empty field is an empty list, not an error.
pub fn parse_range_field(field: &str) -> Result<Vec<AddressRange>, NetworkError> {
    let tokens: Vec<&str> = field.split_whitespace().collect();
    parse_ranges(&tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_supplied_host_address() {
        let range: AddressRange = "10.32.0.5/12".parse().unwrap();
        assert_eq!(range.addr(), "10.32.0.5".parse::<IpAddr>().unwrap());
        assert_eq!(range.prefix(), 12);
        assert_eq!(range.to_string(), "10.32.0.5/12");
    }

    #[test]
    fn preserves_input_order() {
        let ranges =
            parse_ranges(&["10.0.0.2/24".to_string(), "10.0.0.1/24".to_string()]).unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].to_string(), "10.0.0.2/24");
        assert_eq!(ranges[1].to_string(), "10.0.0.1/24");
    }

    #[test]
    fn malformed_input_fails_without_partial_results() {
        let err = parse_ranges(&["10.0.0.1/24".to_string(), "bogus".to_string()]).unwrap_err();
        match err {
            NetworkError::InvalidCidr { text, .. } => assert_eq!(text, "bogus"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_string_is_not_a_cidr() {
        assert!(parse_ranges(&["".to_string()]).is_err());
    }

    #[test]
    fn splits_a_whitespace_joined_field() {
        let ranges = parse_range_field("10.0.0.1/24 10.0.0.2/24").unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].to_string(), "10.0.0.1/24");
        assert_eq!(ranges[1].to_string(), "10.0.0.2/24");
    }

    #[test]
    fn empty_field_is_an_empty_list() {
        assert!(parse_range_field("").unwrap().is_empty());
        assert!(parse_range_field("   ").unwrap().is_empty());
    }

    #[test]
    fn ipv6_ranges_parse() {
        let range: AddressRange = "fd00::5/64".parse().unwrap();
        assert_eq!(range.prefix(), 64);
        assert_eq!(range.addr(), "fd00::5".parse::<IpAddr>().unwrap());
    }
}
