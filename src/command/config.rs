use anyhow::Result;

use crate::config::{ConfigStore, ParameterType};

pub fn run_config(store: &ConfigStore) -> Result<()> {
    println!("Working mode: {:?}", store.effective_working_mode());
    for param in store.parameters() {
        let value = match param.kind {
            ParameterType::Password => "********",
            _ => param.value.as_str(),
        };
        println!("  {} = {}", param.name, value);
    }
    Ok(())
}
