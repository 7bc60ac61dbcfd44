fn main() {
    if let Err(e) = taskdeck_lib::run() {
        eprintln!("taskdeck: {}", e);
        std::process::exit(1);
    }
}
