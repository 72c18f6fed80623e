use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(url) = args.url.as_deref() {
        reqwest::Url::parse(url.trim()).map_err(|_| format!("invalid --url '{url}'"))?;
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(max_pages) = args.max_pages {
        if max_pages == 0 {
            return Err("invalid max-pages, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    if let Some(raw) = args.format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --format '{raw}', expected text, json or html"));
        }
    }
    if args.no_cache && args.cache_dir.is_some() {
        return Err("use either --no-cache or --cache-dir, not both".to_string());
    }
    let modes = [args.query.is_some(), args.select.is_some(), args.interactive];
    if modes.iter().filter(|m| **m).count() > 1 {
        return Err("use only one of --query, --select or --interactive".to_string());
    }
    Ok(())
}
