fn main() {
    if let Err(err) = deepfocus_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
