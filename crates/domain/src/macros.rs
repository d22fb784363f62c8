//! Macro for implementing name conversions on closed name enums
//!
//! Generates `as_str`, an `ALL` listing, `Display` and `FromStr` from a single
//! variant-to-name table so the allow-list and its parser cannot drift apart.
//!
//! # Example
//!
//! ```rust
//! use imds_tagger_domain::impl_field_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Region {
//!     West,
//!     East,
//! }
//!
//! impl_field_name_conversions!(Region {
//!     West => "west",
//!     East => "east",
//! });
//!
//! assert_eq!(Region::ALL.len(), 2);
//! assert_eq!("east".parse::<Region>(), Ok(Region::East));
//! ```

/// Implements `as_str`, `ALL`, `Display` and `FromStr` for a name enum.
///
/// Parsing is exact: names are case-sensitive, matching how they appear in
/// configuration and as tag keys.
#[macro_export]
macro_rules! impl_field_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$enum_name] = &[$(Self::$variant),+];

            /// The canonical name of this variant.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
