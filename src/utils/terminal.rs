//! Terminal output utilities
//!
//! Progress goes to stdout so it interleaves with the container's own
//! output; errors and warnings go to stderr.

use std::io::Write;

use console::style;

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{}: {}", style("error").red().bold(), message);
}

/// Print a progress line
pub fn print_step(message: &str) {
    println!("{}", message);
}

/// Print a progress prompt without a trailing newline, to be completed by
/// [`print_found`] or [`print_missing`]
pub fn print_prompt(message: &str) {
    print!("{} ", message);
    let _ = std::io::stdout().flush();
}

/// Complete a prompt with a positive answer
pub fn print_found() {
    println!("{}", style("found.").green());
}

/// Complete a prompt with a negative answer
pub fn print_missing() {
    println!("{}", style("not found!").yellow().bold());
}

/// Disable styled output on both streams
pub fn disable_colors() {
    console::set_colors_enabled(false);
    console::set_colors_enabled_stderr(false);
}
