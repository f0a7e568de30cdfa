fn main() {
    if let Err(e) = clips_lib::run() {
        eprintln!("clips: {}", e);
        std::process::exit(1);
    }
}
