//! nautilus-tmsu command line.

fn main() {
    if let Err(e) = nautilus_tmsu::cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
