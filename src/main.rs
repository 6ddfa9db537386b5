fn main() {
    if let Err(err) = csv_sqlgen::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
