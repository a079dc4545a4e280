//! gallery-comments - photo gallery comment store
//!
//! ## Quick Start
//!
//! ```bash
//! # Create the data directory and seed catalog
//! gallery-comments init
//!
//! # Leave a guest comment on the root album
//! gallery-comments comment create --item 1 --guest-name Alice --text "Lovely"
//!
//! # Moderate it
//! gallery-comments comment update 1 --state spam
//! ```

mod commands;

fn main() {
    if let Err(err) = commands::run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
