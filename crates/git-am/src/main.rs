use std::process;

use clap::Parser;

use git_am::cli::Cli;
use git_am::external::SystemGit;

fn main() {
    let cli = Cli::parse();
    let tool = SystemGit;

    match git_am::run(&cli, &tool) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("fatal: {e}");
            process::exit(e.exit_code());
        }
    }
}
