fn main() {
    env_logger::init();
    let exit_code = sm_cli::run_cli_from_args(std::env::args_os());
    std::process::exit(exit_code);
}
