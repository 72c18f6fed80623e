use astrosearch::runner::{CacheMode, Options, Runner};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(Options {
        url: "https://gc.example.org/".to_string(),
        cache: CacheMode::Directory("./.astrosearch-cache".to_string()),
        timeout_seconds: 5,
        max_pages: Some(50),
        ..Options::default()
    })?;
    let report = runner.load().await;

    println!("Collection: {}", runner.collection());
    println!("Origin: {:?}", report.origin);
    println!("Names: {}", report.index.len());
    for entry in report.index.entries().take(10) {
        println!("{}\t{}", entry.name, entry.target_url);
    }

    Ok(())
}
