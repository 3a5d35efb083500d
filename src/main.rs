mod cli;

use colored::Colorize;

fn main() {
    cli::init_tracing();
    let command_line_interface = cli::CommandLineInterface::load();
    if let Err(error) = command_line_interface.run() {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(2);
    }
}
