fn main() {
    if let Err(err) = type_probe::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
