fn main() -> Result<(), Box<dyn std::error::Error>> {
    multiplyr::cli::main()
}
