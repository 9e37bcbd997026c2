//! Parameter tables for the modelled slice of the action API.
//!
//! Everything in this module is data: which logical names a given action or
//! submodule understands, which wire key each name maps to, and which value
//! sets the API restricts them to. The builder walks these tables at call
//! time; see [`crate::builder::RequestBuilder::set`].

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::action::Action;

/// Value discipline of a single parameter.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ParamKind {
    /// Free-form scalar. Rewrites replace.
    Plain,
    /// Scalar restricted to a fixed value set.
    Enum(&'static [&'static str]),
    /// Pipe-joined list restricted to a fixed value set.
    List(&'static [&'static str]),
    /// Pipe-joined list with unrestricted values (titles, ids, namespaces).
    OpenList,
}

/// One parameter a table knows about: the logical name used in chained
/// calls, the wire key actually sent, and the value discipline.
#[derive(Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub key: &'static str,
    pub kind: ParamKind,
}

const fn plain(name: &'static str, key: &'static str) -> ParamSpec {
    ParamSpec { name, key, kind: ParamKind::Plain }
}

const fn enumerated(
    name: &'static str,
    key: &'static str,
    allowed: &'static [&'static str],
) -> ParamSpec {
    ParamSpec { name, key, kind: ParamKind::Enum(allowed) }
}

const fn list(
    name: &'static str,
    key: &'static str,
    allowed: &'static [&'static str],
) -> ParamSpec {
    ParamSpec { name, key, kind: ParamKind::List(allowed) }
}

const fn open_list(name: &'static str, key: &'static str) -> ParamSpec {
    ParamSpec { name, key, kind: ParamKind::OpenList }
}

/// A submodule token. Selecting certain `list`/`prop`/`meta` values grants
/// the builder the parameter table of the matching capability for the rest
/// of the chain.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Capability {
    Search,
    Backlinks,
    CategoryMembers,
    AllPages,
    RecentChanges,
    Revisions,
    Info,
    Tokens,
}

const FILTERREDIR: &[&str] = &["all", "redirects", "nonredirects"];
const SORT_DIRECTION: &[&str] = &["ascending", "descending"];
const TIME_DIRECTION: &[&str] = &["newer", "older"];
const WATCHLIST: &[&str] = &["watch", "unwatch", "preferences", "nochange"];

const SEARCH_PARAMS: &[ParamSpec] = &[
    plain("search", "srsearch"),
    enumerated("what", "srwhat", &["title", "text", "nearmatch"]),
    plain("limit", "srlimit"),
    plain("offset", "sroffset"),
    open_list("namespace", "srnamespace"),
    list(
        "prop",
        "srprop",
        &[
            "size",
            "wordcount",
            "timestamp",
            "snippet",
            "titlesnippet",
            "redirecttitle",
            "redirectsnippet",
            "sectiontitle",
            "sectionsnippet",
            "isfilematch",
            "categorysnippet",
        ],
    ),
    enumerated(
        "sort",
        "srsort",
        &[
            "relevance",
            "just_match",
            "none",
            "incoming_links_asc",
            "incoming_links_desc",
            "last_edit_asc",
            "last_edit_desc",
            "create_timestamp_asc",
            "create_timestamp_desc",
        ],
    ),
];

const BACKLINKS_PARAMS: &[ParamSpec] = &[
    plain("title", "bltitle"),
    plain("pageid", "blpageid"),
    open_list("namespace", "blnamespace"),
    enumerated("filterredir", "blfilterredir", FILTERREDIR),
    plain("limit", "bllimit"),
    plain("redirect", "blredirect"),
    enumerated("dir", "bldir", SORT_DIRECTION),
];

const CATEGORY_MEMBERS_PARAMS: &[ParamSpec] = &[
    plain("title", "cmtitle"),
    plain("pageid", "cmpageid"),
    list("type", "cmtype", &["page", "subcat", "file"]),
    open_list("namespace", "cmnamespace"),
    plain("limit", "cmlimit"),
    list(
        "prop",
        "cmprop",
        &["ids", "title", "sortkey", "sortkeyprefix", "type", "timestamp"],
    ),
    enumerated("sort", "cmsort", &["sortkey", "timestamp"]),
    enumerated("dir", "cmdir", &["asc", "desc", "ascending", "descending", "newer", "older"]),
    plain("start", "cmstart"),
    plain("end", "cmend"),
];

const ALL_PAGES_PARAMS: &[ParamSpec] = &[
    plain("prefix", "apprefix"),
    plain("namespace", "apnamespace"),
    plain("limit", "aplimit"),
    enumerated("filterredir", "apfilterredir", FILTERREDIR),
    enumerated("dir", "apdir", SORT_DIRECTION),
    plain("from", "apfrom"),
    plain("to", "apto"),
];

const RECENT_CHANGES_PARAMS: &[ParamSpec] = &[
    plain("limit", "rclimit"),
    open_list("namespace", "rcnamespace"),
    list("type", "rctype", &["edit", "new", "log", "categorize", "external"]),
    list(
        "show",
        "rcshow",
        &[
            "minor",
            "!minor",
            "bot",
            "!bot",
            "anon",
            "!anon",
            "redirect",
            "!redirect",
            "patrolled",
            "!patrolled",
            "unpatrolled",
        ],
    ),
    list(
        "prop",
        "rcprop",
        &[
            "user",
            "userid",
            "comment",
            "parsedcomment",
            "flags",
            "timestamp",
            "title",
            "ids",
            "sizes",
            "redirect",
            "patrolled",
            "loginfo",
            "tags",
            "sha1",
        ],
    ),
    enumerated("dir", "rcdir", TIME_DIRECTION),
    plain("start", "rcstart"),
    plain("end", "rcend"),
];

const REVISIONS_PARAMS: &[ParamSpec] = &[
    list(
        "prop",
        "rvprop",
        &[
            "ids",
            "flags",
            "timestamp",
            "user",
            "userid",
            "size",
            "slotsize",
            "sha1",
            "slotsha1",
            "contentmodel",
            "comment",
            "parsedcomment",
            "content",
            "tags",
            "roles",
        ],
    ),
    plain("limit", "rvlimit"),
    enumerated("dir", "rvdir", TIME_DIRECTION),
    plain("start", "rvstart"),
    plain("end", "rvend"),
    open_list("slots", "rvslots"),
    plain("user", "rvuser"),
    plain("excludeuser", "rvexcludeuser"),
];

const INFO_PARAMS: &[ParamSpec] = &[
    list(
        "prop",
        "inprop",
        &[
            "protection",
            "talkid",
            "watched",
            "watchers",
            "visitingwatchers",
            "notificationtimestamp",
            "subjectid",
            "associatedpage",
            "url",
            "preload",
            "displaytitle",
            "varianttitles",
        ],
    ),
    open_list("testactions", "intestactions"),
];

// meta=tokens parameters carry no prefix on the wire.
const TOKENS_PARAMS: &[ParamSpec] = &[list(
    "type",
    "type",
    &["createaccount", "csrf", "login", "patrol", "rollback", "userrights", "watch"],
)];

impl Capability {
    /// Parameter table this capability contributes to the chain.
    pub fn params(&self) -> &'static [ParamSpec] {
        match *self {
            Self::Search => SEARCH_PARAMS,
            Self::Backlinks => BACKLINKS_PARAMS,
            Self::CategoryMembers => CATEGORY_MEMBERS_PARAMS,
            Self::AllPages => ALL_PAGES_PARAMS,
            Self::RecentChanges => RECENT_CHANGES_PARAMS,
            Self::Revisions => REVISIONS_PARAMS,
            Self::Info => INFO_PARAMS,
            Self::Tokens => TOKENS_PARAMS,
        }
    }

    /// Maps a submodule selection (`list=search`, `prop=revisions`, ...) to
    /// the capability it grants, if the submodule is modelled at all.
    pub fn from_submodule(selector: &str, value: &str) -> Option<Capability> {
        match (selector, value) {
            ("list", "search") => Some(Self::Search),
            ("list", "backlinks") => Some(Self::Backlinks),
            ("list", "categorymembers") => Some(Self::CategoryMembers),
            ("list", "allpages") => Some(Self::AllPages),
            ("list", "recentchanges") => Some(Self::RecentChanges),
            ("prop", "revisions") => Some(Self::Revisions),
            ("prop", "info") => Some(Self::Info),
            ("meta", "tokens") => Some(Self::Tokens),
            _ => None,
        }
    }
}

const QUERY_PARAMS: &[ParamSpec] = &[
    open_list("titles", "titles"),
    open_list("pageids", "pageids"),
    open_list("revids", "revids"),
    list(
        "list",
        "list",
        &[
            "search",
            "backlinks",
            "categorymembers",
            "allpages",
            "recentchanges",
            "embeddedin",
            "exturlusage",
            "usercontribs",
        ],
    ),
    list(
        "prop",
        "prop",
        &[
            "revisions",
            "info",
            "categories",
            "links",
            "templates",
            "images",
            "extlinks",
            "pageprops",
        ],
    ),
    list("meta", "meta", &["tokens", "siteinfo", "userinfo"]),
    plain("export", "export"),
    plain("redirects", "redirects"),
    plain("continue", "continue"),
];

const PARSE_PARAMS: &[ParamSpec] = &[
    plain("page", "page"),
    plain("pageid", "pageid"),
    plain("oldid", "oldid"),
    plain("text", "text"),
    plain("title", "title"),
    plain("section", "section"),
    plain("contentmodel", "contentmodel"),
    plain("disablelimitreport", "disablelimitreport"),
    list(
        "prop",
        "prop",
        &[
            "text",
            "langlinks",
            "categories",
            "links",
            "templates",
            "images",
            "externallinks",
            "sections",
            "revid",
            "displaytitle",
            "iwlinks",
            "properties",
            "parsewarnings",
            "wikitext",
        ],
    ),
];

const EDIT_PARAMS: &[ParamSpec] = &[
    plain("title", "title"),
    plain("pageid", "pageid"),
    plain("section", "section"),
    plain("sectiontitle", "sectiontitle"),
    plain("text", "text"),
    plain("summary", "summary"),
    open_list("tags", "tags"),
    plain("minor", "minor"),
    plain("bot", "bot"),
    plain("baserevid", "baserevid"),
    plain("basetimestamp", "basetimestamp"),
    plain("starttimestamp", "starttimestamp"),
    plain("recreate", "recreate"),
    plain("createonly", "createonly"),
    plain("nocreate", "nocreate"),
    enumerated("watchlist", "watchlist", WATCHLIST),
    plain("md5", "md5"),
    plain("prependtext", "prependtext"),
    plain("appendtext", "appendtext"),
    plain("undo", "undo"),
    plain("undoafter", "undoafter"),
    plain("redirect", "redirect"),
    plain("token", "token"),
];

const DELETE_PARAMS: &[ParamSpec] = &[
    plain("title", "title"),
    plain("pageid", "pageid"),
    plain("reason", "reason"),
    open_list("tags", "tags"),
    plain("deletetalk", "deletetalk"),
    enumerated("watchlist", "watchlist", WATCHLIST),
    plain("oldimage", "oldimage"),
    plain("token", "token"),
];

const LOGIN_PARAMS: &[ParamSpec] = &[
    plain("name", "lgname"),
    plain("password", "lgpassword"),
    plain("token", "lgtoken"),
];

const PURGE_PARAMS: &[ParamSpec] = &[
    open_list("titles", "titles"),
    open_list("pageids", "pageids"),
    plain("forcelinkupdate", "forcelinkupdate"),
    plain("forcerecursivelinkupdate", "forcerecursivelinkupdate"),
    plain("redirects", "redirects"),
    plain("continue", "continue"),
];

/// Parameters every action accepts.
pub const GLOBAL_PARAMS: &[ParamSpec] = &[
    enumerated("format", "format", &["json", "xml", "php", "none"]),
    enumerated("formatversion", "formatversion", &["1", "2", "latest"]),
    plain("utf8", "utf8"),
    plain("maxlag", "maxlag"),
    enumerated("assert", "assert", &["anon", "user", "bot"]),
    plain("assertuser", "assertuser"),
    enumerated(
        "errorformat",
        "errorformat",
        &["bc", "html", "none", "plaintext", "raw", "wikitext"],
    ),
    plain("uselang", "uselang"),
    plain("requestid", "requestid"),
    plain("curtimestamp", "curtimestamp"),
];

lazy_static! {
    static ref BASE_PARAMS: HashMap<Action, &'static [ParamSpec]> = {
        let mut map: HashMap<Action, &'static [ParamSpec]> = HashMap::new();
        map.insert(Action::Query, QUERY_PARAMS);
        map.insert(Action::Parse, PARSE_PARAMS);
        map.insert(Action::Edit, EDIT_PARAMS);
        map.insert(Action::Delete, DELETE_PARAMS);
        map.insert(Action::Login, LOGIN_PARAMS);
        map.insert(Action::Purge, PURGE_PARAMS);
        map
    };
}

/// Action-level parameter table for `action`.
pub fn base_params(action: Action) -> &'static [ParamSpec] {
    BASE_PARAMS.get(&action).copied().unwrap_or(&[])
}
