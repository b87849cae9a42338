//! Run with: cargo run -p reelcast-detect --example detect
//!
//! Lists every title the platform title source can see.

fn main() {
    let titles = reelcast_detect::list_titles();

    if titles.is_empty() {
        println!("No titles detected.");
    } else {
        for title in &titles {
            println!("{:?}: {}", title.source, title.text);
            if let Some(url) = &title.url {
                println!("  URL: {url}");
            }
        }
    }
}
