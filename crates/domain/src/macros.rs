//! Macro for implementing Display and FromStr for wire-named enums
//!
//! Operation kinds and relationship statuses travel as fixed snake_case
//! strings (persisted queue entries, log fields, command arguments). This
//! macro keeps the string table in one place for both directions.
//!
//! # Example
//!
//! ```rust
//! use friendsync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Presence {
//!     Online,
//!     Away,
//! }
//!
//! impl_domain_status_conversions!(Presence {
//!     Online => "online",
//!     Away => "away",
//! });
//!
//! assert_eq!(Presence::Away.to_string(), "away");
//! assert_eq!("ONLINE".parse::<Presence>(), Ok(Presence::Online));
//! ```

/// Implements Display and FromStr traits for wire-named enums
///
/// This macro generates:
/// - Display trait: writes the mapped string
/// - FromStr trait: parses case-insensitive strings to enum variants
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => ::std::result::Result::Ok(Self::$variant),)+
                    _ => ::std::result::Result::Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::types::{FriendshipStatus, OperationKind};

    #[test]
    fn test_operation_kind_display_matches_wire_names() {
        assert_eq!(OperationKind::SendRequest.to_string(), "send_request");
        assert_eq!(OperationKind::CancelRequest.to_string(), "cancel_request");
        assert_eq!(OperationKind::Unblock.to_string(), "unblock");
    }

    #[test]
    fn test_fromstr_is_case_insensitive() {
        assert_eq!(OperationKind::from_str("ACCEPT").unwrap(), OperationKind::Accept);
        assert_eq!(FriendshipStatus::from_str("Request_Sent").unwrap(), FriendshipStatus::RequestSent);
    }

    mod shadowed_result {
        #[allow(unused_imports)]
        use crate::errors::Result;

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Presence {
            Online,
            Away,
        }

        crate::impl_domain_status_conversions!(Presence {
            Online => "online",
            Away => "away",
        });
    }

    /// Validates the generated impls ignore a crate `Result` alias in scope.
    #[test]
    fn test_expands_next_to_result_alias() {
        use shadowed_result::Presence;

        assert_eq!(Presence::Away.to_string(), "away");
        assert_eq!(Presence::from_str("ONLINE"), Ok(Presence::Online));
        assert!(Presence::from_str("busy").is_err());
    }

    #[test]
    fn test_fromstr_invalid() {
        let result = OperationKind::from_str("poke");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid OperationKind: poke"));
        assert!(FriendshipStatus::from_str("").is_err());
    }
}
