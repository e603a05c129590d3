use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// A guild (server) on the chat platform
    GuildId
);
snowflake!(
    /// A user account
    UserId
);
snowflake!(
    /// A channel inside a guild
    ChannelId
);

impl UserId {
    /// Mention markup that pings the user when posted to a channel
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_mention() {
        assert_eq!(UserId(42).mention(), "<@42>");
    }

    #[test]
    fn test_ids_are_transparent_in_json() {
        let id: GuildId = serde_json::from_str("1234").unwrap();
        assert_eq!(id, GuildId(1234));
        assert_eq!(serde_json::to_string(&id).unwrap(), "1234");
    }
}
