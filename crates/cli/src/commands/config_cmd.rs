//! `synaxarion config`: show or initialize the configuration.

use synaxarion_config::AppConfig;

pub async fn run(init: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");

    if init {
        if config_path.exists() {
            println!("Config already exists: {}", config_path.display());
        } else {
            std::fs::create_dir_all(AppConfig::config_dir())?;
            std::fs::write(&config_path, AppConfig::default_toml())?;
            println!("Created {}", config_path.display());
        }
        return Ok(());
    }

    let config = super::load_config()?;
    println!("Config:    {}", config_path.display());
    println!("Provider:  {}", config.provider);
    println!("Model:     {}", config.model);
    println!("Embedding: {}", config.embedding_model);
    println!("API key:   {}", if config.has_api_key() { "set" } else { "missing" });
    println!("Data dir:  {}", config.data_dir.display());
    println!("Gateway:   {}:{}", config.gateway.host, config.gateway.port);
    println!();
    for domain in &config.domains {
        let marker = if domain.name == config.default_domain { "*" } else { " " };
        println!(
            "{marker} {:<22} {:<26} {} sources -> {}",
            domain.name,
            domain.tool_name,
            domain.sources.len(),
            config.resolve(&domain.index_dir).display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = synaxarion_config::AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains(".synaxarion"));
    }
}
