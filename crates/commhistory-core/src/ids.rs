use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! numeric_id {
    ($name:ident, $repr:ty, $prefix:literal) => {
        #[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($repr);

        impl $name {
            pub const fn new(raw: $repr) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> $repr {
                self.0
            }
        }

        impl From<$repr> for $name {
            fn from(raw: $repr) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, ":")).unwrap_or(s);
                raw.parse().map(Self)
            }
        }
    };
}

numeric_id!(EventId, i64, "event");
numeric_id!(GroupId, i64, "conversation");
numeric_id!(ContactId, u32, "contact");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_display_has_prefix() {
        assert_eq!(EventId::new(42).to_string(), "event:42");
    }

    #[test]
    fn group_id_display_has_prefix() {
        assert_eq!(GroupId::new(7).to_string(), "conversation:7");
    }

    #[test]
    fn from_str_accepts_prefixed_and_bare() {
        let prefixed: EventId = "event:12".parse().unwrap();
        let bare: EventId = "12".parse().unwrap();
        assert_eq!(prefixed, bare);
        assert_eq!(prefixed.get(), 12);
    }

    #[test]
    fn from_str_rejects_garbage() {
        assert!("event:abc".parse::<EventId>().is_err());
        assert!("contact:-1".parse::<ContactId>().is_err());
    }

    #[test]
    fn display_and_from_str_roundtrip() {
        let id = GroupId::new(-3);
        let parsed: GroupId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&ContactId::new(5)).unwrap();
        assert_eq!(json, "5");
        let parsed: ContactId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.get(), 5);
    }
}
