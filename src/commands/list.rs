//! List command implementation

use spitty_core::protocol::SUPPORTED_DEVICES;
use spitty_registry::{available_irqs, available_transports, BackendInfo};

fn print_backends(title: &str, backends: &[BackendInfo]) {
    println!("{}:", title);
    println!();
    if backends.is_empty() {
        println!("  none (recompile with features)");
    }
    for b in backends {
        if b.aliases.is_empty() {
            println!("  {:<12} - {}", b.name, b.description);
        } else {
            println!(
                "  {:<12} - {} (aliases: {})",
                b.name,
                b.description,
                b.aliases.join(", ")
            );
        }
    }
    println!();
}

/// List transports, interrupt sources and supported devices
pub fn list_backends() {
    print_backends("Transports", &available_transports());
    print_backends("Interrupt sources", &available_irqs());

    println!("Supported devices:");
    println!();
    for id in SUPPORTED_DEVICES {
        println!("  {}", id);
    }
}
