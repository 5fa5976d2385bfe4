//! # Till Register Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Resolve and load the config file
//! 3. Build the checkout session and catalog
//! 4. Read commands from stdin until `quit` or end of input

fn main() {
    // The actual setup is in lib.rs for better testability
    if let Err(e) = till_register::run() {
        eprintln!("till-register: {}", e);
        std::process::exit(1);
    }
}
