use reqwest::Url;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::autocomplete::{AutocompleteController, Event, Key, Navigation, Navigator};
use crate::output;
use crate::utils;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Event(Event),
    Quit,
    Unknown(String),
}

/// Lines starting with `:` are commands, anything else replaces the input value.
/// `::text` types a literal `:text`.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(rest) = line.strip_prefix("::") {
        return Command::Event(Event::Input(format!(":{rest}")));
    }
    let Some(cmd) = line.strip_prefix(':') else {
        return Command::Event(Event::Input(line.to_string()));
    };
    let mut parts = cmd.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("down"), None) => Command::Event(Event::Key(Key::ArrowDown)),
        (Some("up"), None) => Command::Event(Event::Key(Key::ArrowUp)),
        (Some("enter"), None) => Command::Event(Event::Key(Key::Enter)),
        (Some("outside"), None) => Command::Event(Event::ClickOutside),
        (Some("input"), None) => Command::Event(Event::ClickInput),
        (Some("clear"), None) => Command::Event(Event::Input(String::new())),
        (Some("click"), Some(n)) => match n.parse::<usize>() {
            Ok(n) => Command::Event(Event::ClickCandidate(n)),
            Err(_) => Command::Unknown(line.to_string()),
        },
        (Some("quit"), None) | (Some("q"), None) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Prints navigation targets resolved against the catalogue site.
#[derive(Clone, Debug)]
pub struct TerminalNavigator {
    site: Url,
    pub last: Option<String>,
}

impl TerminalNavigator {
    pub fn new(site: Url) -> Self {
        Self { site, last: None }
    }

    pub fn resolve(&self, navigation: &Navigation) -> String {
        utils::resolve_target(&self.site, &navigation.target)
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&mut self, navigation: &Navigation) {
        let url = self.resolve(navigation);
        println!(":: {:<10}: {} -> {}", "Navigate", navigation.name, url);
        self.last = Some(url);
    }
}

pub fn print_state(controller: &AutocompleteController) {
    let rows = controller.suggestions();
    if rows.is_empty() {
        return;
    }
    for row in rows.iter() {
        println!("{}", output::format_suggestion_line(row));
    }
}

/// Feeds `reader` line by line into `controller` until EOF or `:quit`.
/// Returns the number of navigations performed.
pub async fn run_session<R, N>(
    controller: &mut AutocompleteController,
    reader: R,
    navigator: &mut N,
    echo: bool,
) -> usize
where
    R: AsyncBufRead + Unpin,
    N: Navigator,
{
    let mut navigations = 0usize;
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read session input, ending session");
                break;
            }
        };
        let event = match parse_command(&line) {
            Command::Event(event) => event,
            Command::Quit => break,
            Command::Unknown(raw) => {
                tracing::warn!(command = %raw, "unknown session command");
                continue;
            }
        };
        if let Some(navigation) = controller.handle(event) {
            navigator.navigate(&navigation);
            navigations += 1;
        }
        if echo {
            print_state(controller);
        }
    }
    navigations
}
