fn main() {
    if let Err(err) = fragrance_analytics::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
