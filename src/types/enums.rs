use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(Error::Validation(format!(
                        concat!("unknown ", stringify!($name), ": {}"),
                        other
                    ))),
                }
            }
        }
    };
}

string_enum! {
    /// Account role. Admins and moderators can reach the management surface.
    Role {
        User => "user",
        Admin => "admin",
        Moderator => "moderator",
    }
}

string_enum! {
    /// Account lifecycle state. Self-registration starts at `Inactive`;
    /// only `Active` accounts can log in.
    AccountStatus {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
        Pending => "pending",
    }
}

string_enum! {
    PostStatus {
        Draft => "draft",
        Published => "published",
        Scheduled => "scheduled",
        Archived => "archived",
    }
}

string_enum! {
    /// Comments start at `Pending`; only `Approved` ones are publicly visible.
    CommentStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Spam => "spam",
    }
}

string_enum! {
    /// AI provider family a configuration row belongs to.
    Provider {
        OpenAi => "openai",
        Perplexity => "perplexity",
        Image => "image",
    }
}
