use std::sync::Arc;

use astrosearch::autocomplete::{ClickTarget, Document, Event, Key};
use astrosearch::index::NameIndex;

fn main() {
    let index: NameIndex = [
        ("NGC 104", "/catalogue/astro_object/ngc-104"),
        ("NGC 1049", "/catalogue/astro_object/ngc-1049"),
        ("NGC 1261", "/catalogue/astro_object/ngc-1261"),
        ("M13", "/catalogue/astro_object/m13"),
    ]
    .into_iter()
    .collect();
    let index = Arc::new(index);

    let mut document = Document::new();
    document.attach("globalSearch", index.clone());
    document.attach("sidebarSearch", index);

    document.dispatch("globalSearch", Event::Input("ngc 1".to_string()));
    document.dispatch("globalSearch", Event::Key(Key::ArrowDown));
    document.dispatch("globalSearch", Event::Key(Key::ArrowDown));
    if let Some(html) = document
        .controller("globalSearch")
        .and_then(|c| c.render_html())
    {
        println!("{html}");
    }

    document.dispatch("sidebarSearch", Event::Input("m".to_string()));
    println!("open: {:?}", document.open_lists());

    if let Some(nav) = document.click(ClickTarget::Row {
        input: "sidebarSearch".to_string(),
        index: 0,
    }) {
        println!("navigate: {} -> {}", nav.name, nav.target);
    }
    println!("open: {:?}", document.open_lists());
}
