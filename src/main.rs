extern crate clap;
extern crate tokio;
extern crate tracing;
extern crate tracing_subscriber;
extern crate serde_json;
extern crate mwaction;

use std::fs;
use serde_json::Value;
use mwaction::{HttpTransport, RequestBuilder, SiteProfile};
use tracing::{info_span, debug, info, error, Level, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;

mod arg;

/// The main function parses command line arguments and the site profile,
/// then runs exactly one query against the configured wiki.
#[tokio::main]
async fn main() {
    // set up subscriber
    #[cfg(debug_assertions)]
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).with_span_events(FmtSpan::CLOSE).init();
    #[cfg(not(debug_assertions))]
    tracing_subscriber::fmt().with_max_level(Level::INFO).with_span_events(FmtSpan::NONE).init();

    let args = info_span!(target: "bootstrap", "cli arg").in_scope(|| {
        debug!(target: "bootstrap", "parsing command line arguments");
        arg::build_argparse().get_matches()
    });

    let profile = info_span!(target: "bootstrap", "local config").in_scope(|| {
        info!(target: "bootstrap", "reading site profile");
        let raw = fs::read_to_string(args.value_of("site").unwrap()).expect("cannot open site profile file");
        let profile: SiteProfile = serde_json::from_str(&raw).expect("cannot parse site profile file");
        info!(target: "bootstrap", "read site profile success");
        profile
    });

    let transport = info_span!(target: "bootstrap", "transport init").in_scope(|| {
        info!(target: "bootstrap", "creating transport for \"{}\"", &profile.api);
        HttpTransport::from_profile(&profile).expect("cannot create transport for site profile")
    });

    if let Some(term) = args.value_of("search") {
        run_search(&transport, term).instrument(info_span!(target: "bootstrap", "search")).await;
    } else if let Some(title) = args.value_of("backlinks") {
        run_backlinks(&transport, title).instrument(info_span!(target: "bootstrap", "backlinks")).await;
    } else {
        error!(target: "bootstrap", "nothing to do, pass --search or --backlinks");
    }
}

async fn run_search(transport: &HttpTransport, term: &str) {
    info!(target: "bootstrap", "searching for \"{}\"", term);
    let builder = RequestBuilder::query()
        .append("list", "search").expect("list value rejected")
        .set("search", term).expect("search term rejected")
        .set("limit", 20).expect("search limit rejected");
    let envelope = builder.build_response(transport).await.expect("search query failed");
    let hits = envelope.content()
        .get("query")
        .and_then(|q| q.get("search"))
        .and_then(Value::as_array);
    if let Some(hits) = hits {
        for hit in hits {
            if let Some(title) = hit.get("title").and_then(Value::as_str) {
                println!("{}", title);
            }
        }
    }
}

async fn run_backlinks(transport: &HttpTransport, title: &str) {
    info!(target: "bootstrap", "listing backlinks of \"{}\"", title);
    let builder = RequestBuilder::query()
        .append("list", "backlinks").expect("list value rejected")
        .set("title", title).expect("page title rejected")
        .set("limit", "max").expect("backlink limit rejected");
    let envelope = builder.build_response_all(transport, None).await.expect("backlink query failed");
    let links = envelope.content()
        .get("query")
        .and_then(|q| q.get("backlinks"))
        .and_then(Value::as_array);
    if let Some(links) = links {
        for link in links {
            if let Some(title) = link.get("title").and_then(Value::as_str) {
                println!("{}", title);
            }
        }
    }
}
