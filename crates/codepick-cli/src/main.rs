fn main() {
    if let Err(error) = codepick_cli::run() {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}
