/// Closed token enum with an `Unknown` sentinel.
///
/// `FromStr` rejects anything outside the listed tokens with `DomainError::UnknownVariant`;
/// `from_stored` is the lenient decoder used for rows that were written by something else.
macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
            #[serde(rename = "unknown")]
            Unknown,
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                    Self::Unknown => "unknown",
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($token => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn from_stored(value: &str) -> Self {
                Self::parse(value).unwrap_or(Self::Unknown)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::errors::DomainError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::parse(value).ok_or_else(|| $crate::errors::DomainError::UnknownVariant {
                    kind: $label,
                    value: value.to_owned(),
                })
            }
        }
    };
}

pub mod bid;
pub mod decision;
pub mod feedback;
pub mod identity;
pub mod ids;
pub mod page;
pub mod tender;
