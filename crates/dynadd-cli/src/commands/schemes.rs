//! Schemes command implementation.

use console::style;

use dynadd_compile::Scheme;

/// Execute the schemes command.
pub fn execute() {
    println!("{}", style("Available decoupling schemes:").bold());
    println!();

    for scheme in Scheme::ALL {
        let source = if scheme.uses_pulses() {
            style("pulse").magenta()
        } else {
            style("gate").blue()
        };
        println!(
            "  {:<12} {:<6} {}",
            style(scheme.name()).green(),
            source,
            scheme.description()
        );
    }

    println!();
    println!(
        "Pulse schemes derive their pulses from the backend's calibrated {} schedule.",
        style("x").cyan()
    );
}
