fn main() {
    if let Err(err) = datadepth::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
