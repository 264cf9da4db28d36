use console::style;

pub fn print_version() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "{} - version {}",
        style("Tutor CLI").bold().green(),
        style(version).bold()
    );
}
