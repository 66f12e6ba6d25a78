fn main() {
    if let Err(err) = gtstack::cli::run() {
        gtstack::ui::output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
