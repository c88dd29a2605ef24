//! Binary entry point for `txdir`.

use std::process;

fn main() {
    if let Err(e) = txdir::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
