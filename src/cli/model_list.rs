//! Model listing functionality
//!
//! Prints the built-in model catalog, grouped by category. The catalog is
//! compiled in, so no network or credentials are needed here.

use std::error::Error;

use crate::core::catalog;
use crate::core::config::Config;

pub fn list_models() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    println!("Available models");
    println!("================");
    println!();

    if let Some(default_model) = &config.default_model {
        println!("Default model: {default_model} (from config)");
        println!();
    }

    for category in catalog::categories() {
        let models = catalog::filter_models("", Some(category));
        if models.is_empty() {
            continue;
        }

        println!("{category}:");
        for model in models {
            let free_tag = if model.free { " [free]" } else { "" };
            println!("  {}{free_tag}", model.id);
            println!(
                "    {} ({}, {})",
                model.name,
                model.provider,
                model.context_label()
            );
        }
        println!();
    }

    println!("Start a chat with: chinwag -m <model-id>");
    Ok(())
}
