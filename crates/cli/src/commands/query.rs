//! `synaxarion query`: retrieval only, no generation.

use synaxarion_agent::Services;

pub async fn run(
    text: &str,
    domain: Option<&str>,
    top_k: Option<usize>,
    scores: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let services = Services::from_config(config)?;

    let target = services
        .domain_or_default(domain)
        .ok_or_else(|| format!("Unknown domain: '{}'", domain.unwrap_or_default()))?;
    let store = &target.store;
    let top_k = top_k.unwrap_or_else(|| store.top_k());

    if !scores {
        println!("{}", store.query(text, top_k).await?);
        return Ok(());
    }

    if !store.is_initialized().await? {
        println!("{}", store.not_initialized_message());
        return Ok(());
    }

    let result = store.search(text, top_k).await?;
    for (rank, scored) in result.matches.iter().enumerate() {
        let meta = &scored.passage.metadata;
        println!(
            "{:>2}. {:.4}  {}  {}",
            rank + 1,
            scored.score,
            if meta.name.is_empty() { "-" } else { meta.name.as_str() },
            meta.source_url
        );
        println!("    {}", excerpt(&scored.passage.text, 160));
    }
    Ok(())
}

/// The first `max` characters of `text` on one line.
fn excerpt(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{cut}...")
    }
}
