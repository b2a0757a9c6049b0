//! The `templating` binary.

use std::process::ExitCode;

use templating_rs_cli::commands::register_builtin_commands;
use templating_rs_cli::CommandRegistry;

fn main() -> ExitCode {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);

    let matches = registry.build_cli().get_matches();
    let mut stdout = std::io::stdout().lock();

    match templating_rs_cli::run(&registry, &matches, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
