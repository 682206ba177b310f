fn main() {
    sprout::cli::start_cli();
}
