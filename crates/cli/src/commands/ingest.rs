//! `synaxarion ingest`: scrape sources and rebuild domain indexes.

use synaxarion_agent::Services;

pub async fn run(domain: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let services = Services::from_config(config)?;

    let targets: Vec<_> = match domain.as_deref() {
        Some(name) => vec![
            services
                .domain(name)
                .ok_or_else(|| format!("Unknown domain: '{name}'"))?,
        ],
        None => services.domains().iter().collect(),
    };

    let fetcher = services.http_fetcher();
    let mut failed = 0;

    for target in targets {
        println!(
            "Ingesting {} ({} sources)...",
            target.config.name,
            target.config.sources.len()
        );
        match services.ingest(target, fetcher.clone()).await {
            Ok(report) => println!("   {report}"),
            Err(e) => {
                failed += 1;
                eprintln!("   [Error] {}: {e}", target.config.name);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} domain(s) failed to ingest").into());
    }
    Ok(())
}
