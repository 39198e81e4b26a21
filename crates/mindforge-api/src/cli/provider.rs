//! `mindforge providers`.

use crate::state::AppState;

/// Print registered providers, marking the default, and optionally the
/// provider a model string routes to.
pub fn list_providers(state: &AppState, model: Option<&str>) {
    let registry = state.dispatcher.registry();
    println!();
    for name in registry.list_names() {
        let marker = if name == registry.default_provider() { " (default)" } else { "" };
        println!("  {name}{marker}");
    }
    if let Some(model) = model {
        println!();
        println!("  '{model}' -> {}", registry.resolve(model));
    }
    println!();
}
