//! Action identities of the MediaWiki action API.

/// HTTP verb used to submit an action.
///
/// The verb belongs to the action and is fixed at construction; nothing in a
/// builder chain can change it.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Verb {
    Get,
    Post,
}

/// A top-level operation selectable via the `action` parameter.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Action {
    Query,
    Parse,
    Edit,
    Delete,
    Login,
    Purge,
}

impl Action {
    /// Wire value of the `action` parameter.
    pub fn name(&self) -> &'static str {
        match *self {
            Self::Query => "query",
            Self::Parse => "parse",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Login => "login",
            Self::Purge => "purge",
        }
    }

    /// Read actions go over GET, write actions over POST.
    pub fn verb(&self) -> Verb {
        match *self {
            Self::Query | Self::Parse => Verb::Get,
            Self::Edit | Self::Delete | Self::Login | Self::Purge => Verb::Post,
        }
    }

    /// Top-level response keys that carry this action's result payload.
    ///
    /// Everything else in the response (`continue`, `warnings`,
    /// `batchcomplete`, `limits`, ...) counts as metadata.
    pub fn content_keys(&self) -> &'static [&'static str] {
        match *self {
            Self::Query => &["query"],
            Self::Parse => &["parse"],
            Self::Edit => &["edit"],
            Self::Delete => &["delete"],
            Self::Login => &["login"],
            Self::Purge => &["purge"],
        }
    }
}

impl ToString for Action {
    fn to_string(&self) -> String {
        self.name().to_string()
    }
}
