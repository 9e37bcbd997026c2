//! The fluent request builder.
//!
//! A [`RequestBuilder`] is an immutable accumulator of request parameters.
//! Every chained call returns a new builder; the receiver is never touched,
//! so a failed call leaves the chain exactly where it was.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use url::Url;

use crate::action::{Action, Verb};
use crate::error::Error;
use crate::params::{self, Capability, ParamKind, ParamSpec};
use crate::response::ResponseEnvelope;
use crate::transport::{Transport, TransportError};

#[derive(Debug)]
pub enum BuildError {
    /// A value fell outside the fixed set a parameter allows.
    InvalidEnumValue { parameter: String, value: String },
    /// The base endpoint handed to [`RequestBuilder::to_url`] did not parse.
    Endpoint(url::ParseError),
}

impl StdError for BuildError {}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnumValue { parameter, value } => f.write_fmt(format_args!(
                "parameter \"{}\" does not accept value \"{}\"",
                parameter, value
            )),
            Self::Endpoint(e) => e.fmt(f),
        }
    }
}

impl From<url::ParseError> for BuildError {
    fn from(e: url::ParseError) -> Self {
        Self::Endpoint(e)
    }
}

/// Immutable, chainable request under construction.
///
/// The capability list records which submodule tables earlier calls have
/// activated. It only ever grows along a chain, and later entries shadow
/// earlier ones during [`set`](Self::set)/[`append`](Self::append) lookup,
/// so what a logical name means depends on what was selected before it:
///
/// ```
/// use mwaction::RequestBuilder;
///
/// let search = RequestBuilder::query()
///     .append("list", "search").unwrap()
///     .set("limit", 20).unwrap();
/// assert_eq!(search.to_parameter_map().get("srlimit").map(String::as_str), Some("20"));
///
/// let revisions = RequestBuilder::query()
///     .append("prop", "revisions").unwrap()
///     .set("limit", 20).unwrap();
/// assert_eq!(revisions.to_parameter_map().get("rvlimit").map(String::as_str), Some("20"));
/// ```
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    action: Action,
    params: HashMap<String, String>,
    capabilities: Vec<Capability>,
}

impl RequestBuilder {
    pub fn new(action: Action) -> Self {
        RequestBuilder { action, params: HashMap::new(), capabilities: Vec::new() }
    }

    pub fn query() -> Self {
        Self::new(Action::Query)
    }

    pub fn parse() -> Self {
        Self::new(Action::Parse)
    }

    pub fn edit() -> Self {
        Self::new(Action::Edit)
    }

    pub fn delete() -> Self {
        Self::new(Action::Delete)
    }

    pub fn login() -> Self {
        Self::new(Action::Login)
    }

    pub fn purge() -> Self {
        Self::new(Action::Purge)
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn verb(&self) -> Verb {
        self.action.verb()
    }

    /// Capabilities active on this builder, in activation order.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Sets `key` to `value` with replace semantics. No validation; the raw
    /// escape hatch for parameters the tables do not model.
    pub fn with_parameter<V: ToString>(&self, key: &str, value: V) -> Self {
        let mut params = self.params.clone();
        params.insert(key.to_string(), value.to_string());
        RequestBuilder { action: self.action, params, capabilities: self.capabilities.clone() }
    }

    /// Appends `value` to `key`, pipe-joining with any earlier value.
    ///
    /// Values containing `|` are not escaped and will corrupt the joined
    /// list; the wire format reserves that character.
    pub fn with_appended_parameter<V: ToString>(&self, key: &str, value: V) -> Self {
        let mut params = self.params.clone();
        let value = value.to_string();
        match params.get_mut(key) {
            Some(existing) => {
                existing.push('|');
                existing.push_str(&value);
            }
            None => {
                params.insert(key.to_string(), value);
            }
        }
        RequestBuilder { action: self.action, params, capabilities: self.capabilities.clone() }
    }

    /// Sets `key` to `value` after checking membership in `allowed`.
    pub fn with_enum_validated<V: ToString>(
        &self,
        key: &str,
        value: V,
        allowed: &[&str],
    ) -> Result<Self, BuildError> {
        let value = value.to_string();
        if allowed.iter().any(|a| *a == value) {
            Ok(self.with_parameter(key, value))
        } else {
            Err(BuildError::InvalidEnumValue { parameter: key.to_string(), value })
        }
    }

    /// Returns a builder with `capability` recorded. Idempotent.
    pub fn with_capability(&self, capability: Capability) -> Self {
        let mut capabilities = self.capabilities.clone();
        if !capabilities.contains(&capability) {
            capabilities.push(capability);
        }
        RequestBuilder { action: self.action, params: self.params.clone(), capabilities }
    }

    /// Sets the parameter known by the logical name `name`, resolving it
    /// against the active capability tables (newest first), then the
    /// action's own table, then the global table. Names nothing models fall
    /// through to [`with_parameter`](Self::with_parameter) unvalidated.
    ///
    /// Selecting a modelled submodule (`list=search`, `prop=revisions`, ...)
    /// also widens the capability set for the rest of the chain.
    pub fn set<V: ToString>(&self, name: &str, value: V) -> Result<Self, BuildError> {
        self.apply(name, value.to_string(), false)
    }

    /// Like [`set`](Self::set), but pipe-appends on list-typed parameters.
    pub fn append<V: ToString>(&self, name: &str, value: V) -> Result<Self, BuildError> {
        self.apply(name, value.to_string(), true)
    }

    fn resolve(&self, name: &str) -> Option<&'static ParamSpec> {
        // Later capabilities shadow earlier ones.
        for capability in self.capabilities.iter().rev() {
            if let Some(spec) = capability.params().iter().find(|s| s.name == name) {
                return Some(spec);
            }
        }
        params::base_params(self.action)
            .iter()
            .find(|s| s.name == name)
            .or_else(|| params::GLOBAL_PARAMS.iter().find(|s| s.name == name))
    }

    fn apply(&self, name: &str, value: String, append: bool) -> Result<Self, BuildError> {
        let spec = match self.resolve(name) {
            Some(spec) => spec,
            None => {
                return Ok(if append {
                    self.with_appended_parameter(name, value)
                } else {
                    self.with_parameter(name, value)
                });
            }
        };
        match spec.kind {
            ParamKind::Enum(allowed) | ParamKind::List(allowed) => {
                if !allowed.contains(&value.as_str()) {
                    return Err(BuildError::InvalidEnumValue {
                        parameter: spec.key.to_string(),
                        value,
                    });
                }
            }
            ParamKind::Plain | ParamKind::OpenList => {}
        }
        let appendable = matches!(spec.kind, ParamKind::List(_) | ParamKind::OpenList);
        let next = if append && appendable {
            self.with_appended_parameter(spec.key, &value)
        } else {
            self.with_parameter(spec.key, &value)
        };
        let next = match Capability::from_submodule(spec.key, &value) {
            Some(capability) => next.with_capability(capability),
            None => next,
        };
        Ok(next)
    }

    /// Accumulated parameters plus the `action` key. Pure.
    pub fn to_parameter_map(&self) -> HashMap<String, String> {
        let mut params = self.params.clone();
        params.insert("action".to_string(), self.action.name().to_string());
        params
    }

    /// Renders the request as a GET URL against `base`.
    pub fn to_url(&self, base: &str) -> Result<String, BuildError> {
        let url = Url::parse_with_params(base, self.to_parameter_map())?;
        Ok(url.into())
    }

    /// Submits the request over `transport`, GET or POST per the action's
    /// verb, and returns the raw response body.
    pub async fn perform<T: Transport>(&self, transport: &T) -> Result<String, TransportError> {
        let params = self.to_parameter_map();
        match self.action.verb() {
            Verb::Get => transport.get(&params).await,
            Verb::Post => transport.post(&params).await,
        }
    }

    /// Forces `format=json`, performs the request, and parses the body into
    /// a [`ResponseEnvelope`]. API-reported errors surface as
    /// [`crate::response::ApiError`].
    pub async fn build_response<T: Transport>(
        &self,
        transport: &T,
    ) -> Result<ResponseEnvelope, Error> {
        let raw = self.with_parameter("format", "json").perform(transport).await?;
        let envelope = ResponseEnvelope::parse(self.action, &raw)?;
        Ok(envelope)
    }

    /// Performs the request repeatedly, splicing each response's `continue`
    /// block back into the next request and folding the content together,
    /// until the API stops returning a continuation or `max_pages` is hit.
    pub async fn build_response_all<T: Transport>(
        &self,
        transport: &T,
        max_pages: Option<usize>,
    ) -> Result<ResponseEnvelope, Error> {
        let mut merged = self.with_parameter("continue", "").build_response(transport).await?;
        let mut pages = 1usize;
        while let Some(cont) = merged.continue_params() {
            if let Some(max) = max_pages {
                if pages >= max {
                    break;
                }
            }
            let mut next = self.clone();
            for (key, value) in cont {
                next = next.with_parameter(&key, value);
            }
            let envelope = next.build_response(transport).await?;
            pages += 1;
            merged.absorb(envelope);
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_parameter_replaces() {
        let builder = RequestBuilder::query().with_parameter("srsearch", "cat");
        let map = builder.to_parameter_map();
        assert_eq!(map.get("srsearch").map(String::as_str), Some("cat"));
        assert_eq!(map.get("action").map(String::as_str), Some("query"));

        let map = builder.with_parameter("srsearch", "dog").to_parameter_map();
        assert_eq!(map.get("srsearch").map(String::as_str), Some("dog"));
    }

    #[test]
    fn test_with_parameter_stringifies() {
        let map = RequestBuilder::query().with_parameter("srlimit", 20).to_parameter_map();
        assert_eq!(map.get("srlimit").map(String::as_str), Some("20"));
    }

    #[test]
    fn test_with_appended_parameter_joins_with_pipe() {
        let map = RequestBuilder::query()
            .with_appended_parameter("titles", "x")
            .with_appended_parameter("titles", "y")
            .to_parameter_map();
        assert_eq!(map.get("titles").map(String::as_str), Some("x|y"));
    }

    #[test]
    fn test_enum_validation_accepts_member() {
        let builder = RequestBuilder::query()
            .with_parameter("srsearch", "cat")
            .with_enum_validated("srwhat", "title", &["title", "text", "nearmatch"])
            .unwrap();
        let map = builder.to_parameter_map();
        assert_eq!(map.get("srsearch").map(String::as_str), Some("cat"));
        assert_eq!(map.get("srwhat").map(String::as_str), Some("title"));
        assert_eq!(map.get("action").map(String::as_str), Some("query"));
    }

    #[test]
    fn test_enum_validation_rejects_and_leaves_builder_untouched() {
        let builder = RequestBuilder::query().with_parameter("srsearch", "cat");
        let before = builder.to_parameter_map();

        let result = builder.with_enum_validated("dir", "sideways", &["newer", "older"]);
        match result {
            Err(BuildError::InvalidEnumValue { parameter, value }) => {
                assert_eq!(parameter, "dir");
                assert_eq!(value, "sideways");
            }
            other => panic!("expected InvalidEnumValue, got {:?}", other),
        }
        // The original chain is still usable and unchanged.
        assert_eq!(builder.to_parameter_map(), before);
    }

    #[test]
    fn test_order_independence_for_independent_keys() {
        let one = RequestBuilder::query()
            .with_parameter("a", 1)
            .with_parameter("b", 2)
            .to_parameter_map();
        let two = RequestBuilder::query()
            .with_parameter("b", 2)
            .with_parameter("a", 1)
            .to_parameter_map();
        assert_eq!(one, two);
    }

    #[test]
    fn test_capability_gated_dispatch() {
        let search = RequestBuilder::query()
            .append("list", "search")
            .unwrap()
            .set("limit", "20")
            .unwrap();
        assert_eq!(search.to_parameter_map().get("srlimit").map(String::as_str), Some("20"));
        assert_eq!(search.capabilities(), &[Capability::Search]);

        let revisions = RequestBuilder::query()
            .append("prop", "revisions")
            .unwrap()
            .set("limit", "20")
            .unwrap();
        assert_eq!(revisions.to_parameter_map().get("rvlimit").map(String::as_str), Some("20"));
        assert!(revisions.to_parameter_map().get("srlimit").is_none());
    }

    #[test]
    fn test_later_capability_shadows_earlier() {
        // Same method name, different wire key, decided by what came before.
        let builder = RequestBuilder::query()
            .append("list", "search")
            .unwrap()
            .append("prop", "revisions")
            .unwrap()
            .set("limit", "max")
            .unwrap();
        let map = builder.to_parameter_map();
        assert_eq!(map.get("rvlimit").map(String::as_str), Some("max"));
        assert!(map.get("srlimit").is_none());
        assert_eq!(builder.capabilities(), &[Capability::Search, Capability::Revisions]);
    }

    #[test]
    fn test_tokens_type_shadows_categorymembers_type() {
        let builder = RequestBuilder::query()
            .append("list", "categorymembers")
            .unwrap()
            .append("meta", "tokens")
            .unwrap()
            .append("type", "csrf")
            .unwrap();
        let map = builder.to_parameter_map();
        assert_eq!(map.get("type").map(String::as_str), Some("csrf"));
        assert!(map.get("cmtype").is_none());
    }

    #[test]
    fn test_dispatch_validates_against_capability_table() {
        let builder = RequestBuilder::query().append("list", "search").unwrap();
        let result = builder.set("what", "sideways");
        match result {
            Err(BuildError::InvalidEnumValue { parameter, value }) => {
                assert_eq!(parameter, "srwhat");
                assert_eq!(value, "sideways");
            }
            other => panic!("expected InvalidEnumValue, got {:?}", other),
        }
        // Membership passes through to the prefixed key.
        let map = builder.set("what", "title").unwrap().to_parameter_map();
        assert_eq!(map.get("srwhat").map(String::as_str), Some("title"));
    }

    #[test]
    fn test_dispatch_appends_on_list_params() {
        let map = RequestBuilder::query()
            .append("list", "categorymembers")
            .unwrap()
            .append("type", "page")
            .unwrap()
            .append("type", "file")
            .unwrap()
            .to_parameter_map();
        assert_eq!(map.get("cmtype").map(String::as_str), Some("page|file"));
    }

    #[test]
    fn test_dispatch_rejects_bad_submodule_value() {
        let result = RequestBuilder::query().append("list", "nosuchlist");
        assert!(matches!(result, Err(BuildError::InvalidEnumValue { .. })));
    }

    #[test]
    fn test_unmodelled_names_pass_through_raw() {
        let map = RequestBuilder::query().set("gsrsearch", "cat").unwrap().to_parameter_map();
        assert_eq!(map.get("gsrsearch").map(String::as_str), Some("cat"));
    }

    #[test]
    fn test_login_logical_names_map_to_lg_keys() {
        let map = RequestBuilder::login()
            .set("name", "Example")
            .unwrap()
            .set("password", "hunter2")
            .unwrap()
            .set("token", "abc+\\")
            .unwrap()
            .to_parameter_map();
        assert_eq!(map.get("lgname").map(String::as_str), Some("Example"));
        assert_eq!(map.get("lgpassword").map(String::as_str), Some("hunter2"));
        assert_eq!(map.get("lgtoken").map(String::as_str), Some("abc+\\"));
        assert_eq!(map.get("action").map(String::as_str), Some("login"));
    }

    #[test]
    fn test_edit_watchlist_enum() {
        assert!(RequestBuilder::edit().set("watchlist", "nochange").is_ok());
        assert!(matches!(
            RequestBuilder::edit().set("watchlist", "sometimes"),
            Err(BuildError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn test_verb_is_fixed_by_action() {
        assert_eq!(RequestBuilder::query().verb(), Verb::Get);
        assert_eq!(RequestBuilder::edit().verb(), Verb::Post);
    }

    #[test]
    fn test_to_url_renders_query_string() {
        let url = RequestBuilder::query()
            .with_parameter("srsearch", "cat")
            .to_url("https://en.wikipedia.org/w/api.php")
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let pairs: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs.get("action").map(String::as_str), Some("query"));
        assert_eq!(pairs.get("srsearch").map(String::as_str), Some("cat"));
    }

    #[test]
    fn test_to_url_rejects_bad_endpoint() {
        assert!(matches!(
            RequestBuilder::query().to_url("not a url"),
            Err(BuildError::Endpoint(_))
        ));
    }

    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned response bodies and records every parameter map it
    /// was handed, tagged with the verb used.
    struct ScriptedTransport {
        pages: Mutex<VecDeque<Result<String, u16>>>,
        seen: Mutex<Vec<(Verb, HashMap<String, String>)>>,
    }

    impl ScriptedTransport {
        fn new<I: IntoIterator<Item = serde_json::Value>>(pages: I) -> Self {
            ScriptedTransport {
                pages: Mutex::new(pages.into_iter().map(|p| Ok(p.to_string())).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            ScriptedTransport {
                pages: Mutex::new(VecDeque::from([Err(status)])),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn next(&self, verb: Verb, params: &HashMap<String, String>) -> Result<String, TransportError> {
            self.seen.lock().unwrap().push((verb, params.clone()));
            match self.pages.lock().unwrap().pop_front().expect("no more scripted pages") {
                Ok(body) => Ok(body),
                Err(status) => Err(TransportError::Status(status)),
            }
        }

        fn seen(&self) -> Vec<(Verb, HashMap<String, String>)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        async fn get(&self, params: &HashMap<String, String>) -> Result<String, TransportError> {
            self.next(Verb::Get, params)
        }

        async fn post(&self, params: &HashMap<String, String>) -> Result<String, TransportError> {
            self.next(Verb::Post, params)
        }
    }

    #[tokio::test]
    async fn test_perform_follows_action_verb() {
        let transport = ScriptedTransport::new([serde_json::json!({"query": {}})]);
        RequestBuilder::query().perform(&transport).await.unwrap();
        assert_eq!(transport.seen()[0].0, Verb::Get);

        let transport = ScriptedTransport::new([serde_json::json!({"edit": {}})]);
        RequestBuilder::edit().perform(&transport).await.unwrap();
        assert_eq!(transport.seen()[0].0, Verb::Post);
    }

    #[tokio::test]
    async fn test_perform_propagates_transport_error() {
        let transport = ScriptedTransport::failing(503);
        let result = RequestBuilder::query().perform(&transport).await;
        assert!(matches!(result, Err(TransportError::Status(503))));
    }

    #[tokio::test]
    async fn test_build_response_forces_json_format() {
        let transport = ScriptedTransport::new([serde_json::json!({"query": {}})]);
        let builder = RequestBuilder::query().with_parameter("format", "xml");
        builder.build_response(&transport).await.unwrap();
        let (_, params) = &transport.seen()[0];
        assert_eq!(params.get("format").map(String::as_str), Some("json"));
        // The builder itself keeps what the caller set.
        assert_eq!(
            builder.to_parameter_map().get("format").map(String::as_str),
            Some("xml")
        );
    }

    #[tokio::test]
    async fn test_build_response_surfaces_api_error() {
        let transport = ScriptedTransport::new([serde_json::json!({
            "error": { "code": "badtoken", "info": "Invalid token" }
        })]);
        let result = RequestBuilder::query().build_response(&transport).await;
        match result {
            Err(err) => {
                let api = err.api_error().expect("expected an API error");
                assert_eq!(api.code, "badtoken");
            }
            Ok(_) => panic!("expected an API error"),
        }
    }

    #[tokio::test]
    async fn test_build_response_all_follows_continuation() {
        let transport = ScriptedTransport::new([
            serde_json::json!({
                "continue": { "sroffset": 2, "continue": "-||" },
                "query": { "search": [ { "title": "A" }, { "title": "B" } ] }
            }),
            serde_json::json!({
                "batchcomplete": "",
                "query": { "search": [ { "title": "C" } ] }
            }),
        ]);
        let envelope = RequestBuilder::query()
            .append("list", "search")
            .unwrap()
            .set("search", "cat")
            .unwrap()
            .build_response_all(&transport, None)
            .await
            .unwrap();

        let results = envelope.content()["query"]["search"].as_array().unwrap();
        assert_eq!(results.len(), 3);

        let seen = transport.seen();
        assert_eq!(seen.len(), 2);
        // First request opens the continuation, second one resumes it.
        assert_eq!(seen[0].1.get("continue").map(String::as_str), Some(""));
        assert_eq!(seen[1].1.get("continue").map(String::as_str), Some("-||"));
        assert_eq!(seen[1].1.get("sroffset").map(String::as_str), Some("2"));
        assert_eq!(seen[1].1.get("srsearch").map(String::as_str), Some("cat"));
    }

    #[tokio::test]
    async fn test_build_response_all_respects_page_cap() {
        let endless = serde_json::json!({
            "continue": { "sroffset": 2, "continue": "-||" },
            "query": { "search": [ { "title": "A" } ] }
        });
        let transport = ScriptedTransport::new([endless.clone(), endless]);
        let envelope = RequestBuilder::query()
            .append("list", "search")
            .unwrap()
            .build_response_all(&transport, Some(2))
            .await
            .unwrap();
        assert_eq!(transport.seen().len(), 2);
        assert_eq!(envelope.content()["query"]["search"].as_array().unwrap().len(), 2);
    }
}
