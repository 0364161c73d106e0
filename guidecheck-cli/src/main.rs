// These Clippy lints are disabled because this is a CLI binary, not a library:
// - print_stderr: the final error is reported on stderr.
// - exit: Calling `std::process::exit()` is standard for CLI apps to signal failure to the shell.
#![allow(clippy::print_stderr, clippy::exit)]

/// Exit code for corpus-load failures and invalid configuration.
const EXIT_USAGE: i32 = 2;

fn main() {
    match guidecheck_cli::cli::run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(EXIT_USAGE);
        }
    }
}
