use clap::{Command, Arg, crate_version};

pub fn build_argparse() -> Command<'static> {
    Command::new("mwaction")
        .about("Run a single MediaWiki action API query from the command line")
        .version(crate_version!())
        .args(&[
            Arg::new("site")
                .long("site")
                .required(true)
                .takes_value(true)
                .help("Path to the JSON file with the site profile"),
            Arg::new("search")
                .long("search")
                .takes_value(true)
                .conflicts_with("backlinks")
                .help("Full-text search term; prints the titles of matching pages"),
            Arg::new("backlinks")
                .long("backlinks")
                .takes_value(true)
                .help("Page title; prints the titles of pages linking to it")
        ])
}
