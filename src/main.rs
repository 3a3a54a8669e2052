use build_props::cli;

fn main() {
    std::process::exit(cli::run_cli());
}
