pub mod cli;
pub mod decl;
pub mod diag;
pub mod emit;
pub mod ir;
pub mod lower;
pub mod resolve;

fn main() -> anyhow::Result<()> {
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
