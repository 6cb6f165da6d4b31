//! # Voxel World Entry Point
//!
//! Runs the headless engine through the library's `run()` function.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- config.json
//! ```

fn main() {
    if let Err(error) = voxel_world::run() {
        log::error!("{error}");
        eprintln!("voxel-world: {error}");
        std::process::exit(1);
    }
}
