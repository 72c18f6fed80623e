use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "astrosearch",
    version,
    about = "catalogue name search with a cached name index",
    long_about = "astrosearch walks a catalogue's paginated collection endpoint, caches the resulting name index, and offers prefix autocompletion over it.\n\nExamples:\n  astrosearch -u https://gc.example.org/ -q \"ngc 1\"\n  astrosearch -u https://gc.example.org/ -s \"M13\"\n  astrosearch -u https://gc.example.org/ --interactive\n  astrosearch -u https://gc.example.org/ --refresh -o names.json\n\nTip: Use --config to persist the catalogue URL and cache settings."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the name index (or the suggestions for --query) to a file."
    )]
    pub output: Option<String>,

    #[arg(
        long = "of",
        visible_alias = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text, json or html (inferred from --output when omitted)."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Input",
        help = "Catalogue site URL or full collection URL."
    )]
    pub url: Option<String>,

    #[arg(
        long = "col",
        visible_alias = "collection",
        value_name = "PATH",
        help_heading = "Input",
        help = "Collection path joined onto --url (default /api/v1/catalogue/astro_object/)."
    )]
    pub collection: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.astrosearch/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'q',
        long = "q",
        visible_alias = "query",
        value_name = "TEXT",
        help_heading = "Search",
        help = "Print autocomplete candidates for TEXT."
    )]
    pub query: Option<String>,

    #[arg(
        short = 's',
        long = "sel",
        visible_alias = "select",
        value_name = "NAME",
        help_heading = "Search",
        help = "Print the navigation target for an exact name."
    )]
    pub select: Option<String>,

    #[arg(
        short = 'I',
        long = "it",
        visible_alias = "interactive",
        help_heading = "Search",
        help = "Read input values and :down/:up/:enter/:click N/:outside commands from stdin."
    )]
    pub interactive: bool,

    #[arg(
        long = "id",
        visible_alias = "input-id",
        value_name = "ID",
        help_heading = "Search",
        help = "DOM id of the search input (used in HTML output)."
    )]
    pub input_id: Option<String>,

    #[arg(
        long = "rf",
        visible_alias = "refresh",
        help_heading = "Cache",
        help = "Ignore the cached name index and refetch it."
    )]
    pub refresh: bool,

    #[arg(
        long = "nca",
        visible_alias = "no-cache",
        help_heading = "Cache",
        help = "Keep the name index in memory only."
    )]
    pub no_cache: bool,

    #[arg(
        long = "cd",
        visible_alias = "cache-dir",
        value_name = "DIR",
        help_heading = "Cache",
        help = "Directory holding cached name indexes (defaults to ~/.astrosearch/cache)."
    )]
    pub cache_dir: Option<String>,

    #[arg(
        long = "ck",
        visible_alias = "cache-key",
        value_name = "KEY",
        help_heading = "Cache",
        help = "Cache entry key (default astroObjectNames)."
    )]
    pub cache_key: Option<String>,

    #[arg(
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'x',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        help_heading = "HTTP",
        help = "Extra request header ('Key: Value')."
    )]
    pub header: Option<String>,

    #[arg(
        long = "mp",
        visible_alias = "max-pages",
        value_name = "N",
        help_heading = "HTTP",
        help = "Stop walking the collection after N pages."
    )]
    pub max_pages: Option<usize>,
}
