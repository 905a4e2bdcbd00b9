use gridframe::run_from_env;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run_from_env() {
        eprintln!("error: {}", err.message);
        std::process::exit(1);
    }
}
