// Shared identifiers and the change-notice vocabulary used across crates.
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("invalid subject: {0}")]
    InvalidSubject(String),
}

pub mod ids {
    // Strongly typed IDs to avoid mixing entity namespaces at compile time.
    use super::{Error, Result};
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;

    macro_rules! id_type {
        ($name:ident) => {
            #[derive(
                Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(i64);

            impl $name {
                // Wrap a store-assigned surrogate key.
                pub fn new(value: i64) -> Self {
                    Self(value)
                }

                // Expose the underlying integer for interoperability.
                pub fn value(&self) -> i64 {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = Error;

                fn from_str(input: &str) -> Result<Self> {
                    // Preserve the original input for clearer error messages.
                    let value = input
                        .parse::<i64>()
                        .map_err(|_| Error::InvalidId(input.into()))?;
                    Ok(Self(value))
                }
            }
        };
    }

    id_type!(MenuId);
    id_type!(ItemId);
    id_type!(ScreenId);
}

/// Opaque screen address handed to display clients.
///
/// Tokens are random UUIDv4 strings; they are never derivable from the
/// numeric screen id, so knowing one screen's token reveals nothing about
/// the others.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenToken(String);

impl ScreenToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of invalidation carried by a [`Notice`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MenuUpdated,
    ScreenUpdated,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::MenuUpdated => f.write_str("menu_updated"),
            EventKind::ScreenUpdated => f.write_str("screen_updated"),
        }
    }
}

/// Routing key for change notices.
///
/// Rendered as `menu:<id>` or `screen:<token>` on the wire. Fan-out is
/// always keyed by subject; there is no broadcast subject.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Subject {
    Menu(ids::MenuId),
    Screen(ScreenToken),
}

impl Subject {
    pub fn menu(id: ids::MenuId) -> Self {
        Subject::Menu(id)
    }

    pub fn screen(token: ScreenToken) -> Self {
        Subject::Screen(token)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Menu(id) => write!(f, "menu:{id}"),
            Subject::Screen(token) => write!(f, "screen:{token}"),
        }
    }
}

impl FromStr for Subject {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        match input.split_once(':') {
            Some(("menu", id)) => Ok(Subject::Menu(
                id.parse()
                    .map_err(|_| Error::InvalidSubject(input.into()))?,
            )),
            Some(("screen", token)) if !token.is_empty() => {
                Ok(Subject::Screen(ScreenToken::new(token)))
            }
            _ => Err(Error::InvalidSubject(input.into())),
        }
    }
}

impl Serialize for Subject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Subject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Content-free invalidation notice.
///
/// Carries only what changed, never the new state; receivers refetch from
/// the API, which keeps every refresh idempotent and self-healing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    #[serde(rename = "event_kind")]
    pub kind: EventKind,
    pub subject: Subject,
}

impl Notice {
    pub fn menu_updated(id: ids::MenuId) -> Self {
        Self {
            kind: EventKind::MenuUpdated,
            subject: Subject::Menu(id),
        }
    }

    pub fn screen_updated(token: ScreenToken) -> Self {
        Self {
            kind: EventKind::ScreenUpdated,
            subject: Subject::Screen(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ids::{ItemId, MenuId};
    use super::{Error, EventKind, Notice, ScreenToken, Subject};
    use std::str::FromStr;

    #[test]
    fn menu_id_round_trip() {
        // IDs should render and parse without loss.
        let id = MenuId::new(42);
        let parsed = MenuId::from_str(&id.to_string()).expect("parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn item_id_rejects_invalid_input() {
        let err = ItemId::from_str("not-a-number").expect_err("invalid");
        assert!(matches!(err, Error::InvalidId(s) if s == "not-a-number"));
    }

    #[test]
    fn tokens_are_unique_and_opaque() {
        let a = ScreenToken::generate();
        let b = ScreenToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn subject_renders_with_prefix() {
        assert_eq!(Subject::menu(MenuId::new(7)).to_string(), "menu:7");
        let token = ScreenToken::new("abc-123");
        assert_eq!(Subject::screen(token).to_string(), "screen:abc-123");
    }

    #[test]
    fn subject_parses_both_prefixes() {
        let menu = Subject::from_str("menu:7").expect("menu");
        assert_eq!(menu, Subject::Menu(MenuId::new(7)));
        let screen = Subject::from_str("screen:abc-123").expect("screen");
        assert_eq!(screen, Subject::Screen(ScreenToken::new("abc-123")));
    }

    #[test]
    fn subject_rejects_unknown_shapes() {
        for input in ["menu:", "menu:x", "screen:", "kiosk:1", "no-colon"] {
            let err = Subject::from_str(input).expect_err(input);
            assert!(matches!(err, Error::InvalidSubject(_)));
        }
    }

    #[test]
    fn notice_wire_shape() {
        let notice = Notice::menu_updated(MenuId::new(3));
        let json = serde_json::to_value(&notice).expect("json");
        assert_eq!(
            json,
            serde_json::json!({ "event_kind": "menu_updated", "subject": "menu:3" })
        );
        let back: Notice = serde_json::from_value(json).expect("parse");
        assert_eq!(back, notice);
    }

    #[test]
    fn event_kind_display_matches_wire_names() {
        assert_eq!(EventKind::MenuUpdated.to_string(), "menu_updated");
        assert_eq!(EventKind::ScreenUpdated.to_string(), "screen_updated");
    }
}
